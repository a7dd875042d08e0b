//! Data types shared by the reconciler, the submission mapper and the handler.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Parameters handed to a remote call. Insertion order is irrelevant.
pub type CallParameters = BTreeMap<String, Value>;

/// Values of a saved submission, keyed by form element key.
pub type SubmittedRecord = BTreeMap<String, Value>;

/// Which discovered fields are exposed on the form.
///
/// Each key maps to a flag: `1` to include the field, `0` to exclude it.
/// Host payloads are lenient, so booleans and numeric strings are accepted
/// when deserializing (`true` and `"1"` both mean include). Any other value
/// is kept as [`FieldSelection::UNTOUCHED`]: the key stays part of the
/// selection but is neither added nor removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>", into = "BTreeMap<String, u8>")]
pub struct FieldSelection(BTreeMap<String, u8>);

impl FieldSelection {
    /// Flag of a key that is selected neither for inclusion nor removal.
    pub const UNTOUCHED: u8 = 2;

    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag for `key`, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, enabled: bool) {
        self.0.insert(key.into(), u8::from(enabled));
    }

    /// Returns the raw flag, if the key is part of the selection at all.
    pub fn flag(&self, key: &str) -> Option<u8> {
        self.0.get(key).copied()
    }

    pub fn is_enabled(&self, key: &str) -> bool {
        self.flag(key) == Some(1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Keys flagged for inclusion.
    pub fn enabled(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(_, flag)| **flag == 1)
            .map(|(key, _)| key.as_str())
    }

    /// Keys flagged for removal.
    pub fn disabled(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(_, flag)| **flag == 0)
            .map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.0.iter().map(|(key, flag)| (key.as_str(), *flag))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, u8)> for FieldSelection {
    fn from_iter<I: IntoIterator<Item = (K, u8)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, flag)| (key.into(), flag.min(Self::UNTOUCHED)))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, Value>> for FieldSelection {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        Self(
            raw.into_iter()
                .map(|(key, value)| (key, selection_flag(&value)))
                .collect(),
        )
    }
}

impl From<FieldSelection> for BTreeMap<String, u8> {
    fn from(selection: FieldSelection) -> Self {
        selection.0
    }
}

fn selection_flag(value: &Value) -> u8 {
    let number = match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n == 1.0 => 1,
        Some(n) if n == 0.0 => 0,
        _ => FieldSelection::UNTOUCHED,
    }
}

/// Loose truthiness used for host-provided flags and identifiers.
///
/// `null`, `false`, `0`, `""` and `"0"` are falsy; everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => {
            let s = s.trim();
            !(s.is_empty() || s == "0")
        }
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// One `(value, label)` entry of a choice field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
}

impl ChoiceOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Remote description of one form processor field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,
}

impl FieldSpec {
    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }
}

/// Field descriptions keyed by field key, as discovered from the remote API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMetadata(BTreeMap<String, FieldSpec>);

impl FieldMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, spec: FieldSpec) {
        self.0.insert(key.into(), spec);
    }

    pub fn get(&self, key: &str) -> Option<&FieldSpec> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.0.iter().map(|(key, spec)| (key.as_str(), spec))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Title of every field, falling back to the key when none was sent.
    pub fn titles(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|(key, spec)| (key.clone(), spec.title.clone()))
            .collect()
    }

    /// Builds metadata from the `values` of a `getfields` response.
    ///
    /// Fields are keyed by their key in `values`, which is also the key the
    /// field selection uses; an entry's `name` is not consulted. Options
    /// arrive either as a `{value: label}` object or as a list of
    /// `{value, label}` records. Entries that are not objects are skipped.
    pub fn from_values(values: &Map<String, Value>) -> Self {
        let mut metadata = Self::new();
        for (key, entry) in values {
            let Some(entry) = entry.as_object() else {
                continue;
            };
            let title = entry
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or(key.as_str())
                .to_string();
            let options = entry.get("options").map(parse_options).unwrap_or_default();
            metadata.insert(key.as_str(), FieldSpec { title, options });
        }
        metadata
    }
}

fn parse_options(raw: &Value) -> Vec<ChoiceOption> {
    match raw {
        Value::Object(map) => map
            .iter()
            .map(|(value, label)| ChoiceOption::new(value.clone(), scalar_text(label)))
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(record) => {
                    let value = record.get("value").map(scalar_text)?;
                    let label = record
                        .get("label")
                        .map(scalar_text)
                        .unwrap_or_else(|| value.clone());
                    Some(ChoiceOption::new(value, label))
                }
                Value::Array(pair) if pair.len() == 2 => {
                    Some(ChoiceOption::new(scalar_text(&pair[0]), scalar_text(&pair[1])))
                }
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Renders a scalar JSON value as plain text (strings without quotes).
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Kind of a form element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    /// Free-text input.
    Textfield,
    /// Choice input with a fixed list of options.
    Select { options: Vec<ChoiceOption> },
    /// Container grouping nested elements.
    Fieldset {
        #[serde(default)]
        children: Vec<FormElement>,
    },
}

/// A field definition stored on a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormElement {
    pub key: String,
    pub title: String,
    #[serde(flatten)]
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl FormElement {
    pub fn text(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            title: key.clone(),
            key,
            kind: ElementKind::Textfield,
            default_value: None,
        }
    }

    pub fn select(key: impl Into<String>, options: Vec<ChoiceOption>) -> Self {
        let key = key.into();
        Self {
            title: key.clone(),
            key,
            kind: ElementKind::Select { options },
            default_value: None,
        }
    }

    pub fn fieldset(
        key: impl Into<String>,
        title: impl Into<String>,
        children: Vec<FormElement>,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            kind: ElementKind::Fieldset { children },
            default_value: None,
        }
    }

    /// Builds the element a selected field gets when it is first added.
    ///
    /// Fields with options become selects; anything else, including fields
    /// the metadata does not mention, becomes a text field.
    pub fn for_field(key: &str, spec: Option<&FieldSpec>) -> Self {
        match spec {
            Some(spec) if spec.has_options() => Self::select(key, spec.options.clone()),
            _ => Self::text(key),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, ElementKind::Textfield)
    }

    pub fn options(&self) -> Option<&[ChoiceOption]> {
        match &self.kind {
            ElementKind::Select { options } => Some(options),
            _ => None,
        }
    }

    pub fn children(&self) -> &[FormElement] {
        match &self.kind {
            ElementKind::Fieldset { children } => children,
            _ => &[],
        }
    }
}

/// Every element key in `elements`, including those nested in fieldsets.
pub fn flatten_keys(elements: &[FormElement]) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    collect_keys(elements, &mut keys);
    keys
}

fn collect_keys(elements: &[FormElement], keys: &mut BTreeSet<String>) {
    for element in elements {
        keys.insert(element.key.clone());
        collect_keys(element.children(), keys);
    }
}

/// Finds an element by key anywhere in the tree.
pub fn find_element_mut<'a>(
    elements: &'a mut [FormElement],
    key: &str,
) -> Option<&'a mut FormElement> {
    for element in elements.iter_mut() {
        if element.key == key {
            return Some(element);
        }
        if let ElementKind::Fieldset { children } = &mut element.kind {
            if let Some(found) = find_element_mut(children, key) {
                return Some(found);
            }
        }
    }
    None
}

/// Removes the element with `key` anywhere in the tree.
///
/// Returns whether an element was removed. Removing a fieldset removes its
/// children with it.
pub fn remove_element(elements: &mut Vec<FormElement>, key: &str) -> bool {
    if let Some(index) = elements.iter().position(|element| element.key == key) {
        elements.remove(index);
        return true;
    }
    elements.iter_mut().any(|element| match &mut element.kind {
        ElementKind::Fieldset { children } => remove_element(children, key),
        _ => false,
    })
}

/// How a form processor default parameter gets its value at render time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamBinding {
    #[default]
    None,
    /// Read the same-named query parameter of the current request.
    Url,
    /// Use the identifier of the current actor.
    CurrentUser,
}

impl ParamBinding {
    pub const ALL: [ParamBinding; 3] = [
        ParamBinding::None,
        ParamBinding::Url,
        ParamBinding::CurrentUser,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ParamBinding::None => "none",
            ParamBinding::Url => "url",
            ParamBinding::CurrentUser => "current_user",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ParamBinding::None => "None",
            ParamBinding::Url => "URL",
            ParamBinding::CurrentUser => "Current User",
        }
    }
}

impl fmt::Display for ParamBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A call prepared by the remote API client, ready to execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallHandle {
    pub connection: String,
    pub entity: String,
    pub action: String,
    pub params: CallParameters,
    pub options: CallParameters,
}

/// Envelope returned by every remote call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallResult {
    #[serde(default)]
    pub values: Value,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub is_error: i64,
    /// Any further top-level keys of the response.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CallResult {
    /// A successful result wrapping `values`.
    pub fn ok(values: Map<String, Value>) -> Self {
        Self {
            count: values.len() as i64,
            values: Value::Object(values),
            is_error: 0,
            extra: Map::new(),
        }
    }

    /// A failed result carrying the remote error message.
    pub fn error(message: impl Into<String>) -> Self {
        let mut extra = Map::new();
        extra.insert("error_message".to_string(), Value::String(message.into()));
        Self {
            values: Value::Null,
            count: 0,
            is_error: 1,
            extra,
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error != 0
    }

    pub fn error_message(&self) -> Option<&str> {
        self.extra.get("error_message").and_then(Value::as_str)
    }

    /// The `values` as a map. Lists are keyed by their index.
    pub fn values_map(&self) -> Map<String, Value> {
        match &self.values {
            Value::Object(map) => map.clone(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), item.clone()))
                .collect(),
            _ => Map::new(),
        }
    }
}
