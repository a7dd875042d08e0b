use crate::constants::{
    ACTION_GETFIELDS, ACTION_LIST, ENTITY_FORM_PROCESSOR, ENTITY_FORM_PROCESSOR_DEFAULTS,
    ENTITY_FORM_PROCESSOR_INSTANCE, OPTION_LIMIT, PARAM_API_ACTION,
};
use crate::model::{scalar_text, CallHandle, CallParameters, CallResult, FieldMetadata};
use crate::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Client for the remote CRM API.
///
/// Only [`RemoteApiClient::execute_call`] has to be implemented. By default:
/// - `connectors` reports no configured connections
/// - `create_call` packs its arguments into a [`CallHandle`] without I/O
///
/// # Example
///
/// ```rust
/// use form_processor_handler::{CallHandle, CallResult, RemoteApiClient, Result};
///
/// struct OfflineClient;
///
/// impl RemoteApiClient for OfflineClient {
///     fn execute_call(&self, call: &CallHandle) -> Result<CallResult> {
///         Ok(CallResult::error(format!("{} is offline", call.connection)))
///     }
/// }
/// ```
pub trait RemoteApiClient {
    /// Names and labels of the connections an operator configured.
    fn connectors(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    /// Prepares a call against `entity`/`action` on `connection`.
    fn create_call(
        &self,
        connection: &str,
        entity: &str,
        action: &str,
        params: CallParameters,
        options: CallParameters,
    ) -> Result<CallHandle> {
        Ok(CallHandle {
            connection: connection.to_string(),
            entity: entity.to_string(),
            action: action.to_string(),
            params,
            options,
        })
    }

    /// Executes a prepared call and returns the remote envelope.
    fn execute_call(&self, call: &CallHandle) -> Result<CallResult>;
}

impl<C: RemoteApiClient + ?Sized> RemoteApiClient for &C {
    fn connectors(&self) -> BTreeMap<String, String> {
        (**self).connectors()
    }

    fn create_call(
        &self,
        connection: &str,
        entity: &str,
        action: &str,
        params: CallParameters,
        options: CallParameters,
    ) -> Result<CallHandle> {
        (**self).create_call(connection, entity, action, params, options)
    }

    fn execute_call(&self, call: &CallHandle) -> Result<CallResult> {
        (**self).execute_call(call)
    }
}

/// Typed form processor lookups on top of a [`RemoteApiClient`].
///
/// Each method performs exactly one remote call. Nothing is cached or
/// retried.
pub struct FormProcessorApi<C> {
    client: C,
}

impl<C: RemoteApiClient> FormProcessorApi<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn connectors(&self) -> BTreeMap<String, String> {
        self.client.connectors()
    }

    /// Titles of the form processors available on `connection`.
    pub fn list(&self, connection: &str) -> Result<BTreeMap<String, String>> {
        let result = self.call(
            connection,
            ENTITY_FORM_PROCESSOR_INSTANCE,
            ACTION_LIST,
            CallParameters::new(),
            unlimited(),
        )?;
        Ok(pluck(&result, "title"))
    }

    /// Field descriptions of `processor`.
    pub fn fields(&self, connection: &str, processor: &str) -> Result<FieldMetadata> {
        let result = self.call(
            connection,
            ENTITY_FORM_PROCESSOR,
            ACTION_GETFIELDS,
            api_action(processor),
            unlimited(),
        )?;
        Ok(FieldMetadata::from_values(&result.values_map()))
    }

    /// Names of the parameters the defaults lookup of `processor` accepts.
    pub fn default_params(
        &self,
        connection: &str,
        processor: &str,
    ) -> Result<BTreeMap<String, String>> {
        let result = self.call(
            connection,
            ENTITY_FORM_PROCESSOR_DEFAULTS,
            ACTION_GETFIELDS,
            api_action(processor),
            unlimited(),
        )?;
        if result.count == 0 {
            return Ok(BTreeMap::new());
        }
        Ok(pluck(&result, "name"))
    }

    /// Asks `processor` for the default values matching `params`.
    pub fn defaults(
        &self,
        connection: &str,
        processor: &str,
        params: CallParameters,
    ) -> Result<CallResult> {
        self.call(
            connection,
            ENTITY_FORM_PROCESSOR_DEFAULTS,
            processor,
            params,
            CallParameters::new(),
        )
    }

    /// Runs `processor` with the values of a submission.
    pub fn submit(
        &self,
        connection: &str,
        processor: &str,
        params: CallParameters,
    ) -> Result<CallResult> {
        info!(
            "Submitting {} parameters to form processor {} on {}",
            params.len(),
            processor,
            connection
        );
        self.call(
            connection,
            ENTITY_FORM_PROCESSOR,
            processor,
            params,
            CallParameters::new(),
        )
    }

    fn call(
        &self,
        connection: &str,
        entity: &str,
        action: &str,
        params: CallParameters,
        options: CallParameters,
    ) -> Result<CallResult> {
        debug!("Calling {}.{} on {}", entity, action, connection);
        let call = self
            .client
            .create_call(connection, entity, action, params, options)?;
        self.client.execute_call(&call)
    }
}

fn unlimited() -> CallParameters {
    CallParameters::from([(OPTION_LIMIT.to_string(), Value::from(0))])
}

fn api_action(processor: &str) -> CallParameters {
    CallParameters::from([(PARAM_API_ACTION.to_string(), Value::from(processor))])
}

/// Maps every entry of the result values to one of its attributes.
fn pluck(result: &CallResult, attribute: &str) -> BTreeMap<String, String> {
    result
        .values_map()
        .into_iter()
        .map(|(key, value)| {
            let text = value.get(attribute).map(scalar_text).unwrap_or_default();
            (key, text)
        })
        .collect()
}
