use crate::client::{FormProcessorApi, RemoteApiClient};
use crate::config::HandlerConfiguration;
use crate::defaults::{apply_defaults, resolve_default_params, RequestContext};
use crate::mapper::extract_parameters;
use crate::model::{CallResult, FormElement, ParamBinding, SubmittedRecord};
use crate::reconciler::{FieldReconciler, Reconciliation};
use crate::store::FormStore;
use crate::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Lifecycle hooks a form-builder host calls on a webform handler.
///
/// Every hook has a default implementation, so handlers only override the
/// ones they need. By default:
/// - the summary is empty and the configuration is the host default
/// - the configuration form has no controls
/// - submitting the configuration, altering the form and post-save do nothing
///
/// # Example
///
/// ```rust
/// use form_processor_handler::{SubmittedRecord, RequestContext, Result, WebformHandler};
///
/// struct AuditHandler;
///
/// impl WebformHandler for AuditHandler {
///     fn summary(&self) -> String {
///         "Logs every submission".to_string()
///     }
///
///     fn post_save(
///         &self,
///         submission: &SubmittedRecord,
///         _request: &RequestContext,
///     ) -> Result<()> {
///         println!("saved {} values", submission.len());
///         Ok(())
///     }
/// }
/// ```
pub trait WebformHandler {
    /// One line describing how the handler is set up.
    fn summary(&self) -> String {
        String::new()
    }

    /// Configuration of a freshly attached handler.
    fn default_configuration(&self) -> HandlerConfiguration {
        HandlerConfiguration::default()
    }

    /// Describes the controls of the handler's settings form.
    fn build_configuration_form(&self) -> Result<ConfigurationForm> {
        Ok(ConfigurationForm::default())
    }

    /// Stores submitted settings and brings the form in line with them.
    fn submit_configuration_form(
        &mut self,
        _values: HandlerConfiguration,
        _store: &mut dyn FormStore,
    ) -> Result<()> {
        Ok(())
    }

    /// Adjusts the form's elements before it is shown to a visitor.
    fn alter_form(&self, _elements: &mut [FormElement], _request: &RequestContext) -> Result<()> {
        Ok(())
    }

    /// Runs after a submission has been saved.
    fn post_save(&self, _submission: &SubmittedRecord, _request: &RequestContext) -> Result<()> {
        Ok(())
    }
}

/// Model of the handler's settings form, for the host to render.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigurationForm {
    /// Selectable connections.
    pub connectors: BTreeMap<String, String>,
    pub connection: Option<String>,
    /// Processors of the selected connection; absent until one is chosen.
    pub form_processors: Option<BTreeMap<String, String>>,
    pub form_processor: Option<String>,
    pub fields: Vec<FieldCheckbox>,
    pub params: Vec<ParamSelect>,
    /// Choices for the actor-id field; `"0"` means none.
    pub current_contact_options: BTreeMap<String, String>,
    pub current_contact: String,
}

/// Checkbox exposing one discovered field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldCheckbox {
    pub key: String,
    pub title: String,
    pub checked: bool,
}

/// Binding select for one default parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamSelect {
    pub key: String,
    pub title: String,
    pub binding: ParamBinding,
    pub options: Vec<(ParamBinding, &'static str)>,
}

/// Handler that exposes form processor fields on a form and sends
/// submissions to the form processor.
pub struct FormProcessorHandler<C> {
    configuration: HandlerConfiguration,
    api: FormProcessorApi<C>,
}

impl<C: RemoteApiClient> FormProcessorHandler<C> {
    pub fn new(configuration: HandlerConfiguration, client: C) -> Self {
        Self {
            configuration,
            api: FormProcessorApi::new(client),
        }
    }

    pub fn configuration(&self) -> &HandlerConfiguration {
        &self.configuration
    }

    pub fn api(&self) -> &FormProcessorApi<C> {
        &self.api
    }

    /// Replaces the configuration and reconciles `store` with it.
    ///
    /// Returns what the reconciliation changed.
    pub fn apply_configuration(
        &mut self,
        values: HandlerConfiguration,
        store: &mut dyn FormStore,
    ) -> Result<Reconciliation> {
        self.configuration = HandlerConfiguration {
            form_processor_background: self.configuration.form_processor_background,
            ..values
        };

        let connection = self.configuration.require_connection()?;
        let processor = self.configuration.require_form_processor()?;
        let metadata = self.api.fields(connection, processor)?;

        info!(
            "Saving form processor {} on {} with {} selected fields",
            processor,
            connection,
            self.configuration.form_processor_fields.len()
        );

        FieldReconciler::new(store).reconcile(&self.configuration.form_processor_fields, &metadata)
    }

    /// Pre-fills elements from the defaults lookup. Returns the keys that
    /// received a default value.
    pub fn prefill(
        &self,
        elements: &mut [FormElement],
        request: &RequestContext,
    ) -> Result<Vec<String>> {
        let bindings = &self.configuration.form_processor_params;
        if bindings.is_empty() {
            return Ok(Vec::new());
        }
        let params = resolve_default_params(bindings, request);
        if params.is_empty() {
            return Ok(Vec::new());
        }

        let connection = self.configuration.require_connection()?;
        let processor = self.configuration.require_form_processor()?;
        let result = self.api.defaults(connection, processor, params)?;
        if result.is_error() {
            warn!(
                "Skipping defaults of {}: {}",
                processor,
                result.error_message().unwrap_or("lookup failed")
            );
        }
        Ok(apply_defaults(&result, elements))
    }

    /// Sends a saved submission to the form processor and returns the
    /// remote result unchanged.
    pub fn submit(
        &self,
        submission: &SubmittedRecord,
        request: &RequestContext,
    ) -> Result<CallResult> {
        let connection = self.configuration.require_connection()?;
        let processor = self.configuration.require_form_processor()?;
        let params = extract_parameters(
            submission,
            &self.configuration.form_processor_fields,
            self.configuration.current_contact_key(),
            request.actor_id.as_ref(),
        );
        let result = self.api.submit(connection, processor, params)?;
        if result.is_error() {
            warn!(
                "Form processor {} rejected the submission: {}",
                processor,
                result.error_message().unwrap_or("unknown error")
            );
        }
        Ok(result)
    }
}

impl<C: RemoteApiClient> WebformHandler for FormProcessorHandler<C> {
    fn summary(&self) -> String {
        self.configuration.summary()
    }

    fn build_configuration_form(&self) -> Result<ConfigurationForm> {
        let config = &self.configuration;
        let mut form = ConfigurationForm {
            connectors: self.api.connectors(),
            connection: config.connection.clone(),
            form_processor: config.form_processor.clone(),
            current_contact: config
                .current_contact_key()
                .unwrap_or("0")
                .to_string(),
            ..Default::default()
        };

        let Some(connection) = config.connection.as_deref() else {
            return Ok(form);
        };
        form.form_processors = Some(self.api.list(connection)?);

        let Some(processor) = config.form_processor.as_deref() else {
            return Ok(form);
        };

        let titles = self.api.fields(connection, processor)?.titles();
        form.fields = titles
            .iter()
            .map(|(key, title)| FieldCheckbox {
                key: key.clone(),
                title: title.clone(),
                checked: config.form_processor_fields.is_enabled(key),
            })
            .collect();

        form.params = self
            .api
            .default_params(connection, processor)?
            .into_iter()
            .map(|(key, title)| ParamSelect {
                binding: config
                    .form_processor_params
                    .get(&key)
                    .copied()
                    .unwrap_or_default(),
                options: ParamBinding::ALL
                    .iter()
                    .map(|binding| (*binding, binding.label()))
                    .collect(),
                key,
                title,
            })
            .collect();

        form.current_contact_options = BTreeMap::from([("0".to_string(), "-None-".to_string())]);
        form.current_contact_options.extend(titles);

        Ok(form)
    }

    fn submit_configuration_form(
        &mut self,
        values: HandlerConfiguration,
        store: &mut dyn FormStore,
    ) -> Result<()> {
        self.apply_configuration(values, store).map(|_| ())
    }

    fn alter_form(&self, elements: &mut [FormElement], request: &RequestContext) -> Result<()> {
        self.prefill(elements, request).map(|_| ())
    }

    fn post_save(&self, submission: &SubmittedRecord, request: &RequestContext) -> Result<()> {
        self.submit(submission, request).map(|_| ())
    }
}
