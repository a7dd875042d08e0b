//! End-to-end handler lifecycle against a recording remote client.
mod common;
use common::{signup_client, signup_configuration, RecordingClient};
use form_processor_handler::{
    CallParameters, FormElement, FormProcessorHandler, HandlerConfiguration, InMemoryFormStore,
    JsonFileFormStore, ParamBinding, RequestContext, SubmittedRecord, WebformHandler,
    ENTITY_FORM_PROCESSOR, ENTITY_FORM_PROCESSOR_DEFAULTS, PARAM_API_ACTION,
};
use serde_json::json;

#[test]
fn test_configuration_form_reflects_discovered_fields() {
    let mut config = signup_configuration();
    config.form_processor_fields.set("country", false);
    let handler = FormProcessorHandler::new(config, signup_client());

    let form = handler.build_configuration_form().unwrap();

    assert_eq!(form.connectors.get("crm").map(String::as_str), Some("CRM"));
    assert_eq!(
        form.form_processors.unwrap().get("signup").map(String::as_str),
        Some("Sign up")
    );

    let checked: Vec<(&str, bool)> = form
        .fields
        .iter()
        .map(|field| (field.key.as_str(), field.checked))
        .collect();
    assert_eq!(
        checked,
        vec![("contact_id", false), ("country", false), ("email", true)]
    );

    let campaign = form.params.iter().find(|p| p.key == "campaign").unwrap();
    assert_eq!(campaign.binding, ParamBinding::Url);
    assert_eq!(campaign.options.len(), 3);

    assert_eq!(form.current_contact, "contact_id");
    assert_eq!(
        form.current_contact_options.get("0").map(String::as_str),
        Some("-None-")
    );
    assert_eq!(
        form.current_contact_options.get("email").map(String::as_str),
        Some("E-mail")
    );
}

#[test]
fn test_unchecked_when_field_missing_from_configuration() {
    let mut config = signup_configuration();
    config.form_processor_params.clear();
    let handler = FormProcessorHandler::new(config, signup_client());

    let form = handler.build_configuration_form().unwrap();
    let contact = form.fields.iter().find(|f| f.key == "contact_id").unwrap();
    assert!(!contact.checked);

    let contact_param = form.params.iter().find(|p| p.key == "contact_id").unwrap();
    assert_eq!(contact_param.binding, ParamBinding::None);
}

#[test]
fn test_submit_configuration_reconciles_form() {
    let mut handler = FormProcessorHandler::new(HandlerConfiguration::default(), signup_client());
    let mut store = InMemoryFormStore::new(vec![FormElement::text("contact_id")]);

    let mut values = signup_configuration();
    values.form_processor_fields.set("contact_id", false);
    handler
        .submit_configuration_form(values, &mut store)
        .unwrap();

    assert!(store.element("email").unwrap().is_text());
    assert_eq!(store.element("country").unwrap().options().unwrap().len(), 2);
    assert!(store.element("contact_id").is_none());
    assert_eq!(handler.configuration().form_processor.as_deref(), Some("signup"));

    let getfields = handler
        .api()
        .client()
        .calls_to(ENTITY_FORM_PROCESSOR, "getfields");
    assert_eq!(getfields.len(), 1);
    assert_eq!(getfields[0].params.get(PARAM_API_ACTION), Some(&json!("signup")));
}

#[test]
fn test_submit_configuration_keeps_background_flag() {
    let mut initial = HandlerConfiguration::default();
    initial.form_processor_background = true;
    let mut handler = FormProcessorHandler::new(initial, signup_client());

    handler
        .submit_configuration_form(signup_configuration(), &mut InMemoryFormStore::default())
        .unwrap();

    assert!(handler.configuration().form_processor_background);
}

#[test]
fn test_alter_form_applies_defaults() {
    let client = signup_client().respond(
        ENTITY_FORM_PROCESSOR_DEFAULTS,
        "signup",
        json!({"is_error": 0, "email": "ada@example.org", "country": "ca"}),
    );
    let handler = FormProcessorHandler::new(signup_configuration(), client);
    let mut elements = vec![FormElement::text("email"), FormElement::text("country")];
    let request = RequestContext::new()
        .with_query("campaign", "spring")
        .with_actor_id(42);

    handler.alter_form(&mut elements, &request).unwrap();

    assert_eq!(elements[0].default_value, Some(json!("ada@example.org")));
    assert_eq!(elements[1].default_value, Some(json!("ca")));

    let calls = handler
        .api()
        .client()
        .calls_to(ENTITY_FORM_PROCESSOR_DEFAULTS, "signup");
    assert_eq!(calls.len(), 1);
    let expected: CallParameters =
        serde_json::from_value(json!({"campaign": "spring", "contact_id": 42})).unwrap();
    assert_eq!(calls[0].params, expected);
}

#[test]
fn test_alter_form_skips_failed_defaults() {
    let client = signup_client().respond(
        ENTITY_FORM_PROCESSOR_DEFAULTS,
        "signup",
        json!({"is_error": 1, "error_message": "no such contact", "email": "x"}),
    );
    let handler = FormProcessorHandler::new(signup_configuration(), client);
    let mut elements = vec![FormElement::text("email")];

    handler
        .alter_form(&mut elements, &RequestContext::new().with_actor_id(42))
        .unwrap();

    assert_eq!(elements[0].default_value, None);
}

#[test]
fn test_alter_form_without_params_makes_no_call() {
    let handler = FormProcessorHandler::new(signup_configuration(), RecordingClient::new());
    let mut elements = vec![FormElement::text("email")];

    handler
        .alter_form(&mut elements, &RequestContext::new())
        .unwrap();

    assert!(handler.api().client().calls.borrow().is_empty());
}

#[test]
fn test_post_save_sends_selected_values_and_contact() {
    let handler = FormProcessorHandler::new(signup_configuration(), signup_client());
    let submission: SubmittedRecord = serde_json::from_value(json!({
        "email": "ada@example.org",
        "country": "us",
        "comment": "not forwarded"
    }))
    .unwrap();

    handler
        .post_save(&submission, &RequestContext::new().with_actor_id(42))
        .unwrap();

    let calls = handler.api().client().calls_to(ENTITY_FORM_PROCESSOR, "signup");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].connection, "crm");
    assert_eq!(
        serde_json::to_value(&calls[0].params).unwrap(),
        json!({"email": "ada@example.org", "country": "us", "contact_id": 42})
    );
}

#[test]
fn test_post_save_returns_remote_error_envelope() {
    let client = signup_client().respond(
        ENTITY_FORM_PROCESSOR,
        "signup",
        json!({"is_error": 1, "error_message": "invalid email"}),
    );
    let handler = FormProcessorHandler::new(signup_configuration(), client);

    let result = handler
        .submit(&SubmittedRecord::new(), &RequestContext::new())
        .unwrap();

    assert!(result.is_error());
    assert_eq!(result.error_message(), Some("invalid email"));
}

#[test]
fn test_configuration_on_json_file_form() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("form.json");
    std::fs::write(
        &path,
        serde_json::to_string(&vec![FormElement::text("notes")]).unwrap(),
    )
    .unwrap();

    let mut store = JsonFileFormStore::open(&path).unwrap();
    let mut handler = FormProcessorHandler::new(HandlerConfiguration::default(), signup_client());
    handler
        .apply_configuration(signup_configuration(), &mut store)
        .unwrap();

    let saved: Vec<FormElement> =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let keys: Vec<&str> = saved.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["notes", "country", "email"]);
}
