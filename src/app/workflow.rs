//! Shared request workflows used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core flow:
//! metadata fetch -> form build -> predict
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use chrono::{DateTime, Local};

use crate::api::ModelApiClient;
use crate::domain::{ModelId, ModelMetadata};
use crate::error::AppError;
use crate::form::PredictForm;

/// A model whose metadata has been fetched, with a form seeded from it.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub id: ModelId,
    pub metadata: ModelMetadata,
    pub form: PredictForm,
}

/// A prediction result and when it arrived.
#[derive(Debug, Clone)]
pub struct PredictionOutput {
    pub model: ModelId,
    pub result: serde_json::Value,
    pub received_at: DateTime<Local>,
}

/// Fetch metadata for `id` and build its prediction form.
pub fn load_model(client: &ModelApiClient, id: &str) -> Result<LoadedModel, AppError> {
    let metadata = client.get_metadata(id)?;
    let form = PredictForm::from_metadata(id, &metadata)?;
    Ok(LoadedModel {
        id: id.to_string(),
        metadata,
        form,
    })
}

/// Send the form's feature vector.
pub fn run_prediction(client: &ModelApiClient, form: &PredictForm) -> Result<PredictionOutput, AppError> {
    let result = form.submit(client)?;
    Ok(PredictionOutput {
        model: form.model().to_string(),
        result,
        received_at: Local::now(),
    })
}
