//! End-to-end tests through the facade crate: settings from TOML, a schema
//! from JSON, and a full edit/submit cycle.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use formflow::core::logging::setup_logging;
use formflow::core::settings_loader;
use formflow::forms::autosave::AutosaveStatus;
use formflow::forms::{FormEngine, FormSchema, SubmitOutcome};

const SETTINGS: &str = r#"
autosave = true
autosave_debounce_ms = 500
autosave_reset_ms = 500
async_check_delay_ms = 50
reserved_values = ["admin", "root"]
log_level = "warn"
"#;

const SCHEMA: &str = r#"{
    "id": "signup",
    "version": 2,
    "title": "Sign up",
    "fields": [
        {"name": "username", "label": "Username", "type": "text",
         "validation": [
            {"type": "required", "message": "Username is required"},
            {"type": "async", "value": "/api/check-username", "message": "Username already taken"}
         ]},
        {"name": "newsletter", "label": "Newsletter", "type": "checkbox"},
        {"name": "topics", "label": "Topics", "type": "select",
         "options": [{"label": "Rust", "value": "rust"}, {"label": "Forms", "value": "forms"}],
         "condition": {"field": "newsletter", "eq": true},
         "validation": [{"type": "required", "message": "Pick a topic"}]}
    ]
}"#;

#[tokio::test(start_paused = true)]
async fn test_signup_flow() {
    let settings = settings_loader::from_toml_str(SETTINGS).unwrap();
    setup_logging(&settings);
    let schema = FormSchema::from_json_str(SCHEMA).unwrap();
    let engine = FormEngine::new(schema, settings);

    let statuses = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&statuses);
    engine.on_autosave_status("log", move |s: &AutosaveStatus| sink.lock().unwrap().push(*s));

    // "root" is reserved by the loaded settings.
    let err = engine.set_value("username", "Root").await.unwrap();
    assert_eq!(err.as_deref(), Some("Username already taken"));
    engine.set_value("username", "ferris").await.unwrap();

    // Ticking the checkbox reveals a required select.
    engine.set_value("newsletter", true).await.unwrap();
    match engine.submit().await {
        SubmitOutcome::Rejected(errors) => assert_eq!(errors["topics"], "Pick a topic"),
        SubmitOutcome::Submitted(_) => panic!("topics should be required once visible"),
    }

    engine.set_value("topics", "rust").await.unwrap();
    let SubmitOutcome::Submitted(submission) = engine.submit().await else {
        panic!("form should submit");
    };
    assert_eq!(submission.schema_id, "signup");
    assert_eq!(submission.version, 2);
    assert_eq!(
        formflow::serde_json::to_value(&submission.values).unwrap(),
        formflow::serde_json::json!({
            "username": "ferris",
            "newsletter": true,
            "topics": "rust"
        })
    );

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(statuses.lock().unwrap().last(), Some(&AutosaveStatus::Idle));
}
