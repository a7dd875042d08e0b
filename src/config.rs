//! Handler configuration as stored by the host application.

use crate::constants::PLUGIN_ID;
use crate::model::{is_truthy, scalar_text, FieldSelection, ParamBinding};
use crate::{HandlerError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Settings of one form processor handler attached to a form.
///
/// Host payloads use `0`, `""` or `null` for unset values; those all load
/// as `None`. An unset current contact is written back as `0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfiguration {
    /// Name of the remote API connection.
    #[serde(deserialize_with = "optional_key")]
    pub connection: Option<String>,

    /// Action name of the form processor.
    #[serde(deserialize_with = "optional_key")]
    pub form_processor: Option<String>,

    /// Fields exposed on the form.
    pub form_processor_fields: FieldSelection,

    /// How each default parameter is filled when the form renders.
    pub form_processor_params: BTreeMap<String, ParamBinding>,

    /// Field that receives the actor id on submission.
    #[serde(deserialize_with = "optional_key", serialize_with = "key_or_zero")]
    pub form_processor_current_contact: Option<String>,

    /// Stored for the host; submissions always run in the request.
    #[serde(deserialize_with = "flag")]
    pub form_processor_background: bool,
}

impl HandlerConfiguration {
    /// Loads a configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            HandlerError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn require_connection(&self) -> Result<&str> {
        self.connection
            .as_deref()
            .ok_or_else(|| HandlerError::Configuration("no connection selected".to_string()))
    }

    pub fn require_form_processor(&self) -> Result<&str> {
        self.form_processor
            .as_deref()
            .ok_or_else(|| HandlerError::Configuration("no form processor selected".to_string()))
    }

    pub fn current_contact_key(&self) -> Option<&str> {
        self.form_processor_current_contact.as_deref()
    }

    /// Names the connection, processor and parameter bindings in one line.
    ///
    /// Bindings are listed in parameter-name order.
    pub fn summary(&self) -> String {
        let params = self
            .form_processor_params
            .values()
            .map(|binding| binding.as_str())
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "This {} handler using connection {} and form_processor {} with parameters [{}]",
            PLUGIN_ID,
            self.connection.as_deref().unwrap_or(""),
            self.form_processor.as_deref().unwrap_or(""),
            params
        )
    }
}

fn optional_key<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(is_truthy(&value).then(|| scalar_text(&value)))
}

fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(is_truthy(&Value::deserialize(deserializer)?))
}

fn key_or_zero<S>(key: &Option<String>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match key {
        Some(key) => serializer.serialize_str(key),
        None => serializer.serialize_u8(0),
    }
}
