//! Pre-filling form elements from the form processor's defaults lookup.

use crate::model::{
    find_element_mut, is_truthy, CallParameters, CallResult, FormElement, ParamBinding,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// What the current request knows about the visitor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    /// Query parameters of the current request.
    pub query: BTreeMap<String, String>,
    /// External identifier of the current actor, once resolved.
    pub actor_id: Option<Value>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_actor_id(mut self, actor_id: impl Into<Value>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    /// The actor id, unless it is unknown or empty.
    pub fn known_actor_id(&self) -> Option<&Value> {
        self.actor_id.as_ref().filter(|id| is_truthy(id))
    }
}

/// Resolves the parameters of the defaults lookup from the configured
/// bindings. Bindings whose source is empty are left out.
pub fn resolve_default_params(
    bindings: &BTreeMap<String, ParamBinding>,
    request: &RequestContext,
) -> CallParameters {
    let mut params = CallParameters::new();
    for (key, binding) in bindings {
        let value = match binding {
            ParamBinding::None => None,
            ParamBinding::Url => request
                .query
                .get(key)
                .filter(|value| !value.is_empty())
                .map(|value| Value::String(value.clone())),
            ParamBinding::CurrentUser => request.known_actor_id().cloned(),
        };
        if let Some(value) = value {
            params.insert(key.clone(), value);
        }
    }
    params
}

/// Writes the defaults returned by the lookup onto matching elements.
///
/// Failed lookups are ignored. Top-level result keys and entries of a
/// `values` object both count as defaults; keys without a matching element
/// are skipped. Returns the keys that were applied.
pub fn apply_defaults(result: &CallResult, elements: &mut [FormElement]) -> Vec<String> {
    if result.is_error() {
        return Vec::new();
    }

    let mut defaults = result.extra.clone();
    if let Value::Object(values) = &result.values {
        defaults.extend(values.clone());
    }

    let mut applied = Vec::new();
    for (key, value) in defaults {
        if let Some(element) = find_element_mut(elements, &key) {
            element.default_value = Some(value);
            applied.push(key);
        }
    }
    applied
}
