//! HTTP client behaviour against an in-process stub backend.

mod common;

use common::{StubServer, dead_base_url};
use model_deck::api::{ApiBody, ClientError, ModelApiClient};
use model_deck::app::workflow;
use model_deck::config::ApiConfig;
use model_deck::domain::{FeatureKind, FeatureValue};
use model_deck::report;

const GAMES_META: &str = r#"{
  "description": "Predicts video game sales",
  "input_features": [
    {"name": "Metacritic", "type": "numeric", "default": 70.0},
    {"name": "Console", "type": "categorical", "options": ["PS4", "PS5", "PS3"]},
    {"name": "Release Year", "default": 2020.0},
    {"name": "Rating", "type": "categorical", "options": ["M", "T", "E"]}
  ]
}"#;

#[test]
fn empty_model_list_is_not_an_error() {
    let server = StubServer::start(vec![(200, "[]")]);
    let models = server.client().list_models().unwrap();
    assert!(models.is_empty());
    assert_eq!(report::format_model_list(&models), report::NO_MODELS_HINT);

    let req = server.next_request();
    assert_eq!(req.method, "GET");
    assert_eq!(req.path, "/models");
}

#[test]
fn lists_models_in_server_order() {
    let server = StubServer::start(vec![(200, r#"["games-v1","fish-sales-v1"]"#)]);
    let models = server.client().list_models().unwrap();
    assert_eq!(models, vec!["games-v1", "fish-sales-v1"]);
}

#[test]
fn metadata_request_encodes_the_model_name() {
    let server = StubServer::start(vec![(200, GAMES_META)]);
    let meta = server.client().get_metadata("games v1").unwrap();
    assert_eq!(meta.input_features.len(), 4);
    assert_eq!(meta.input_features[2].kind, FeatureKind::Numeric);
    assert_eq!(server.next_request().path, "/models/games%20v1");
}

#[test]
fn metadata_failure_surfaces_status_and_body() {
    let server = StubServer::start(vec![(404, r#"{"detail":"Model not found"}"#)]);
    let err = server.client().get_metadata("missing").unwrap_err();
    match &err {
        ClientError::Status { status, body } => {
            assert_eq!(*status, 404);
            assert_eq!(body, &ApiBody::Json(serde_json::json!({"detail": "Model not found"})));
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert!(report::format_client_error(&err).contains("Model not found"));
}

#[test]
fn prediction_vector_follows_metadata_order() {
    let server = StubServer::start(vec![(200, GAMES_META), (200, r#"{"prediction":[1.25]}"#)]);
    let client = server.client();

    let mut loaded = workflow::load_model(&client, "games").unwrap();
    // Fill in reverse order; the vector must still follow the metadata.
    loaded.form.set("Rating", "T").unwrap();
    loaded.form.set("Release Year", "2015").unwrap();
    loaded.form.set("Console", "PS5").unwrap();
    loaded.form.set("Metacritic", "88").unwrap();

    let output = workflow::run_prediction(&client, &loaded.form).unwrap();
    assert_eq!(output.result, serde_json::json!({"prediction": [1.25]}));

    let _metadata_req = server.next_request();
    let predict_req = server.next_request();
    assert_eq!(predict_req.method, "POST");
    assert_eq!(predict_req.path, "/predict/games");
    assert_eq!(
        predict_req.body_json(),
        serde_json::json!({"features": [88.0, "PS5", 2015.0, "T"]})
    );
}

#[test]
fn defaults_are_sent_when_nothing_is_set() {
    let server = StubServer::start(vec![(200, r#"{"prediction":[0.5]}"#)]);
    let meta = serde_json::from_str(GAMES_META).unwrap();
    let form = model_deck::form::PredictForm::from_metadata("games", &meta).unwrap();
    assert_eq!(form.values()[0], FeatureValue::Number(70.0));

    form.submit(&server.client()).unwrap();
    assert_eq!(
        server.next_request().body_json(),
        serde_json::json!({"features": [70.0, "PS4", 2020.0, "M"]})
    );
}

#[test]
fn non_json_error_body_is_kept_as_text() {
    let server = StubServer::start(vec![(500, "Internal Server Error")]);
    let err = server.client().predict("games", &[]).unwrap_err();
    match err {
        ClientError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, ApiBody::Text("Internal Server Error".into()));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[test]
fn malformed_success_body_is_reported() {
    let server = StubServer::start(vec![(200, "<html>oops</html>")]);
    let err = server.client().list_models().unwrap_err();
    assert!(matches!(err, ClientError::Malformed(_)));
}

#[test]
fn other_success_codes_count_as_failures() {
    let server = StubServer::start(vec![(202, r#"["a"]"#)]);
    let err = server.client().list_models().unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 202, .. }));
}

#[test]
fn unreachable_backend_is_a_connection_error() {
    let client = ModelApiClient::new(&ApiConfig::new(&dead_base_url()).unwrap()).unwrap();
    let err = client.list_models().unwrap_err();
    assert!(matches!(err, ClientError::Connection(_)));
    assert!(report::format_client_error(&err).starts_with("Connection error"));
}
