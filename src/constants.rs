/// Plugin identifier reported in the handler summary.
pub const PLUGIN_ID: &str = "cmrf_form_processor";

/// Entity that runs a form processor and describes its fields.
pub const ENTITY_FORM_PROCESSOR: &str = "FormProcessor";

/// Entity listing the form processors configured on a connection.
pub const ENTITY_FORM_PROCESSOR_INSTANCE: &str = "FormProcessorInstance";

/// Entity that computes default values for a form processor.
pub const ENTITY_FORM_PROCESSOR_DEFAULTS: &str = "FormProcessorDefaults";

pub const ACTION_LIST: &str = "list";
pub const ACTION_GETFIELDS: &str = "getfields";

/// Parameter naming the processor whose fields are requested.
pub const PARAM_API_ACTION: &str = "api_action";

/// Call option lifting the server-side result limit.
pub const OPTION_LIMIT: &str = "limit";
