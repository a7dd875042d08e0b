//! # form-processor-handler
//!
//! Webform handler that connects a form to a remote CRM "form processor".
//!
//! A form processor is a remote action identified by a connection name and
//! an action name. It describes the fields it expects and processes the
//! values submitted to it. This crate keeps a form's fields in line with the
//! fields an operator selected, and forwards saved submissions.
//!
//! ## Features
//!
//! - **Field reconciliation**: [`FieldReconciler`] adds selected fields as
//!   text or select elements and removes deselected ones
//! - **Submission mapping**: [`extract_parameters`] turns a saved submission
//!   into form processor call parameters
//! - **Defaults**: [`resolve_default_params`] and [`apply_defaults`] pre-fill
//!   elements from the request and the current actor
//! - **Explicit collaborators**: the host's form storage and the CRM client
//!   are plain traits, [`FormStore`] and [`RemoteApiClient`]
//!
//! ## Quick Start
//!
//! ```rust
//! use form_processor_handler::{
//!     CallHandle, CallResult, FieldSelection, FormProcessorHandler, HandlerConfiguration,
//!     InMemoryFormStore, RemoteApiClient, Result, WebformHandler,
//! };
//! use serde_json::json;
//!
//! struct Crm;
//!
//! impl RemoteApiClient for Crm {
//!     fn execute_call(&self, _call: &CallHandle) -> Result<CallResult> {
//!         Ok(serde_json::from_value(json!({
//!             "is_error": 0,
//!             "count": 1,
//!             "values": {"email": {"name": "email", "title": "E-mail"}}
//!         }))?)
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let mut handler = FormProcessorHandler::new(HandlerConfiguration::default(), Crm);
//!     let mut store = InMemoryFormStore::default();
//!
//!     handler.submit_configuration_form(
//!         HandlerConfiguration {
//!             connection: Some("crm".to_string()),
//!             form_processor: Some("signup".to_string()),
//!             form_processor_fields: FieldSelection::from_iter([("email", 1)]),
//!             ..Default::default()
//!         },
//!         &mut store,
//!     )?;
//!
//!     assert!(store.element("email").is_some());
//!     Ok(())
//! }
//! ```
//!
//! ## Handler Lifecycle
//!
//! The host drives a [`WebformHandler`] through three request-scoped steps:
//!
//! 1. **Configuration**: [`WebformHandler::build_configuration_form`] lists
//!    connections, processors, fields and default parameters;
//!    [`WebformHandler::submit_configuration_form`] stores the choices and
//!    reconciles the form
//! 2. **Rendering**: [`WebformHandler::alter_form`] pre-fills elements
//! 3. **Submission**: [`WebformHandler::post_save`] sends the selected
//!    values to the form processor
//!
//! Every step runs synchronously and makes at most one remote call per
//! lookup. Errors from the store or the remote client are returned as-is.

mod cli;
mod client;
mod config;
mod constants;
mod defaults;
mod error;
mod handler;
mod mapper;
mod model;
mod reconciler;
mod store;

// Re-export public API.
pub use cli::run;
pub use client::{FormProcessorApi, RemoteApiClient};
pub use config::HandlerConfiguration;
pub use constants::{
    ACTION_GETFIELDS, ACTION_LIST, ENTITY_FORM_PROCESSOR, ENTITY_FORM_PROCESSOR_DEFAULTS,
    ENTITY_FORM_PROCESSOR_INSTANCE, OPTION_LIMIT, PARAM_API_ACTION, PLUGIN_ID,
};
pub use defaults::{apply_defaults, resolve_default_params, RequestContext};
pub use error::{HandlerError, Result};
pub use handler::{
    ConfigurationForm, FieldCheckbox, FormProcessorHandler, ParamSelect, WebformHandler,
};
pub use mapper::extract_parameters;
pub use model::{
    flatten_keys, CallHandle, CallParameters, CallResult, ChoiceOption, ElementKind,
    FieldMetadata, FieldSelection, FieldSpec, FormElement, ParamBinding, SubmittedRecord,
};
pub use reconciler::{FieldReconciler, Reconciliation};
pub use store::{FormStore, InMemoryFormStore, JsonFileFormStore};
