//! Shared domain types.
//!
//! These mirror the JSON documents the model backend exchanges:
//!
//! - model metadata (`ModelMetadata`, `FeatureDescriptor`)
//! - prediction payloads (`FeatureValue`, `PredictRequest`)
//!
//! Everything here is plain data; HTTP and form handling live elsewhere.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque name of a registered model (e.g. `fish-sales-v1`).
pub type ModelId = String;

/// Input kind of a single feature.
///
/// The backend omits `type` for plain numeric inputs, so `Numeric` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    #[default]
    Numeric,
    Categorical,
}

impl FeatureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Numeric => Self::Categorical,
            Self::Categorical => Self::Numeric,
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema entry for one model input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDescriptor {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: FeatureKind,
    /// Starting value for numeric inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<f64>,
    /// Allowed values for categorical inputs, in display order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FeatureDescriptor {
    pub fn numeric(name: impl Into<String>, default: Option<f64>) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Numeric,
            default,
            options: Vec::new(),
        }
    }

    pub fn categorical(name: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Categorical,
            default: None,
            options,
        }
    }

    /// Starting value for a numeric input (`0.0` when the backend gives none).
    pub fn numeric_default(&self) -> f64 {
        self.default.unwrap_or(0.0)
    }

    /// Returns the reason this descriptor cannot back a form input, if any.
    pub fn problem(&self) -> Option<String> {
        match self.kind {
            FeatureKind::Categorical if self.options.is_empty() => Some(format!(
                "categorical feature '{}' has no options",
                self.name
            )),
            _ => None,
        }
    }
}

/// Metadata document describing a model's inputs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub input_features: Vec<FeatureDescriptor>,
}

impl ModelMetadata {
    /// Description as shown to users (`N/A` when the backend sent none).
    pub fn display_description(&self) -> &str {
        if self.description.trim().is_empty() {
            "N/A"
        } else {
            &self.description
        }
    }

    /// Example document for the `.meta` file format (video game sales model).
    pub fn example() -> Self {
        let opts = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            description: "Predicts video game sales from a few catalogue features.".to_string(),
            input_features: vec![
                FeatureDescriptor::numeric("Metacritic", Some(70.0)),
                FeatureDescriptor::numeric("Release Year", Some(2020.0)),
                FeatureDescriptor::categorical("Console", opts(&["PS4", "PS5", "PS3"])),
                FeatureDescriptor::categorical("Genres", opts(&["Action", "RPG", "Sports"])),
                FeatureDescriptor::categorical("Rating", opts(&["M", "T", "E", "E10+"])),
            ],
        }
    }
}

/// One entry of a feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v:.2}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Body of `POST /predict/{model}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictRequest<'a> {
    pub features: &'a [FeatureValue],
}
