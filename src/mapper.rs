use crate::model::{CallParameters, FieldSelection, SubmittedRecord};
use serde_json::Value;

/// Builds the parameters of a form processor call from a saved submission.
///
/// Every key present in both `record` and `selection` is copied; the flag
/// value is not consulted, as the stored selection only lists fields that
/// were enabled when the form was built. When `actor_id_key` names a field
/// (anything but empty or `"0"`), the actor id is written under it, as JSON
/// `null` when the actor is unknown.
pub fn extract_parameters(
    record: &SubmittedRecord,
    selection: &FieldSelection,
    actor_id_key: Option<&str>,
    actor_id: Option<&Value>,
) -> CallParameters {
    let mut params: CallParameters = record
        .iter()
        .filter(|(key, _)| selection.contains_key(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    if let Some(key) = actor_id_key.filter(|key| is_field_key(key)) {
        params.insert(key.to_string(), actor_id.cloned().unwrap_or(Value::Null));
    }

    params
}

/// Whether a configured key actually names a field; `""` and `"0"` mean unset.
pub(crate) fn is_field_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && key != "0"
}
