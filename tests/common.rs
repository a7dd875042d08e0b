//! Shared fixtures for the integration tests.
use form_processor_handler::{
    CallHandle, CallResult, FormElement, FormStore, HandlerConfiguration, HandlerError,
    InMemoryFormStore, RemoteApiClient, Result, ACTION_GETFIELDS, ACTION_LIST,
    ENTITY_FORM_PROCESSOR, ENTITY_FORM_PROCESSOR_DEFAULTS, ENTITY_FORM_PROCESSOR_INSTANCE,
};
use serde_json::json;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

/// Remote client answering from canned responses and recording every call.
///
/// Calls without a canned response get a successful, empty result.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingClient {
    responses: BTreeMap<(String, String), CallResult>,
    pub calls: RefCell<Vec<CallHandle>>,
}

#[allow(dead_code)]
impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, entity: &str, action: &str, response: serde_json::Value) -> Self {
        let result = serde_json::from_value(response).expect("valid call result fixture");
        self.responses
            .insert((entity.to_string(), action.to_string()), result);
        self
    }

    pub fn calls_to(&self, entity: &str, action: &str) -> Vec<CallHandle> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.entity == entity && call.action == action)
            .cloned()
            .collect()
    }
}

impl RemoteApiClient for RecordingClient {
    fn connectors(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("crm".to_string(), "CRM".to_string())])
    }

    fn execute_call(&self, call: &CallHandle) -> Result<CallResult> {
        self.calls.borrow_mut().push(call.clone());
        Ok(self
            .responses
            .get(&(call.entity.clone(), call.action.clone()))
            .cloned()
            .unwrap_or_default())
    }
}

/// Client set up like a CRM exposing a `signup` form processor.
#[allow(dead_code)]
pub fn signup_client() -> RecordingClient {
    RecordingClient::new()
        .respond(
            ENTITY_FORM_PROCESSOR_INSTANCE,
            ACTION_LIST,
            json!({"is_error": 0, "count": 1, "values": {"signup": {"title": "Sign up"}}}),
        )
        .respond(
            ENTITY_FORM_PROCESSOR,
            ACTION_GETFIELDS,
            json!({
                "is_error": 0,
                "count": 3,
                "values": {
                    "email": {"name": "email", "title": "E-mail"},
                    "country": {
                        "name": "country",
                        "title": "Country",
                        "options": {"us": "USA", "ca": "Canada"}
                    },
                    "contact_id": {"name": "contact_id", "title": "Contact"}
                }
            }),
        )
        .respond(
            ENTITY_FORM_PROCESSOR_DEFAULTS,
            ACTION_GETFIELDS,
            json!({
                "is_error": 0,
                "count": 2,
                "values": {
                    "campaign": {"name": "campaign"},
                    "contact_id": {"name": "contact_id"}
                }
            }),
        )
}

/// Configuration selecting e-mail and country of the `signup` processor.
#[allow(dead_code)]
pub fn signup_configuration() -> HandlerConfiguration {
    serde_json::from_value(json!({
        "connection": "crm",
        "form_processor": "signup",
        "form_processor_fields": {"email": 1, "country": 1},
        "form_processor_params": {"campaign": "url", "contact_id": "current_user"},
        "form_processor_current_contact": "contact_id"
    }))
    .expect("valid configuration fixture")
}

/// Form store that fails on request, otherwise behaving like the in-memory one.
#[allow(dead_code)]
#[derive(Default)]
pub struct FailingStore {
    pub inner: InMemoryFormStore,
    fail_save: bool,
    fail_delete: Option<String>,
}

#[allow(dead_code)]
impl FailingStore {
    pub fn new(elements: Vec<FormElement>) -> Self {
        Self {
            inner: InMemoryFormStore::new(elements),
            ..Default::default()
        }
    }

    pub fn failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    pub fn failing_delete(mut self, key: &str) -> Self {
        self.fail_delete = Some(key.to_string());
        self
    }
}

impl FormStore for FailingStore {
    fn flattened_field_keys(&self) -> Result<BTreeSet<String>> {
        self.inner.flattened_field_keys()
    }

    fn field_definitions(&self) -> Result<Vec<FormElement>> {
        self.inner.field_definitions()
    }

    fn set_field_definitions(&mut self, elements: Vec<FormElement>) -> Result<()> {
        self.inner.set_field_definitions(elements)
    }

    fn save(&mut self) -> Result<()> {
        if self.fail_save {
            return Err(HandlerError::store("form is locked"));
        }
        self.inner.save()
    }

    fn delete_field(&mut self, key: &str) -> Result<()> {
        if self.fail_delete.as_deref() == Some(key) {
            return Err(HandlerError::store(format!("cannot delete '{key}'")));
        }
        self.inner.delete_field(key)
    }
}
