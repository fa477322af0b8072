//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the client and form code stay free of presentation
//! - the CLI and the TUI show the same wording

use chrono::{DateTime, Local};

use crate::api::{ApiBody, ClientError};
use crate::domain::{FeatureKind, FeatureValue, ModelId, ModelMetadata};

/// Shown when the backend has no registered models.
pub const NO_MODELS_HINT: &str =
    "No models uploaded yet. Use `deck upload` (or the Upload tab) to register one.";

/// List of registered models, one per line.
pub fn format_model_list(models: &[ModelId]) -> String {
    if models.is_empty() {
        return NO_MODELS_HINT.to_string();
    }
    let mut out = format!("Available models ({}):\n", models.len());
    for (idx, model) in models.iter().enumerate() {
        out.push_str(&format!("{:>3}) {model}\n", idx + 1));
    }
    out
}

/// Description plus a table of input features.
pub fn format_metadata(model: &str, metadata: &ModelMetadata) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {model} ===\n"));
    out.push_str(&format!("Description: {}\n", metadata.display_description()));
    out.push_str(&format!("\nInput features ({}):\n", metadata.input_features.len()));

    let width = metadata
        .input_features
        .iter()
        .map(|f| f.name.len())
        .max()
        .unwrap_or(4)
        .max(4);
    for (idx, feature) in metadata.input_features.iter().enumerate() {
        let detail = match feature.kind {
            FeatureKind::Numeric => format!("default {:.2}", feature.numeric_default()),
            FeatureKind::Categorical => format!("options: {}", feature.options.join(", ")),
        };
        out.push_str(&format!(
            "{:>3}. {:<width$}  {:<11}  {detail}\n",
            idx + 1,
            feature.name,
            feature.kind.as_str(),
        ));
    }
    out
}

/// `name = value` lines for the vector about to be sent.
pub fn format_feature_vector(metadata: &ModelMetadata, values: &[FeatureValue]) -> String {
    let mut out = String::new();
    for (feature, value) in metadata.input_features.iter().zip(values) {
        out.push_str(&format!("  {} = {value}\n", feature.name));
    }
    out
}

pub fn format_prediction(model: &str, result: &serde_json::Value, received_at: DateTime<Local>) -> String {
    format!(
        "Prediction from '{model}' (received {}):\n{}",
        received_at.format("%H:%M:%S"),
        pretty_json(result)
    )
}

pub fn format_upload_success(model: &str, body: &ApiBody) -> String {
    let mut out = format!("Success! Model '{model}' uploaded.");
    let detail = body.pretty();
    if !detail.trim().is_empty() {
        out.push('\n');
        out.push_str(&detail);
    }
    out
}

/// User-facing text for any client failure: status code plus body for API errors.
pub fn format_client_error(err: &ClientError) -> String {
    match err {
        ClientError::Status { status, body } => {
            let detail = body.pretty();
            if detail.trim().is_empty() {
                format!("Error {status} from the API (empty body).")
            } else {
                format!("Error {status} from the API:\n{detail}")
            }
        }
        ClientError::Connection(_) => format!("Connection error: {err}"),
        ClientError::Malformed(_) | ClientError::Request(_) => format!("Unexpected error: {err}"),
    }
}

pub fn pretty_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
