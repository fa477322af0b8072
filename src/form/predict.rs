//! Prediction form built from model metadata.

use crate::api::{ClientError, ModelApiClient};
use crate::domain::{FeatureDescriptor, FeatureKind, FeatureValue, ModelId, ModelMetadata};
use crate::form::FormError;

/// One input per descriptor, kept in metadata order.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictForm {
    model: ModelId,
    features: Vec<FeatureDescriptor>,
    values: Vec<FeatureValue>,
}

impl PredictForm {
    /// Seed every input: numeric default (or `0.0`), first categorical option.
    pub fn from_metadata(model: impl Into<ModelId>, metadata: &ModelMetadata) -> Result<Self, FormError> {
        let mut values = Vec::with_capacity(metadata.input_features.len());
        for feature in &metadata.input_features {
            if let Some(problem) = feature.problem() {
                return Err(FormError::UnusableMetadata(problem));
            }
            values.push(initial_value(feature));
        }
        Ok(Self {
            model: model.into(),
            features: metadata.input_features.clone(),
            values,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn features(&self) -> &[FeatureDescriptor] {
        &self.features
    }

    pub fn values(&self) -> &[FeatureValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Set a feature by name from user text.
    pub fn set(&mut self, name: &str, raw: &str) -> Result<(), FormError> {
        let index = self
            .features
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| FormError::UnknownFeature(name.to_string()))?;
        self.set_at(index, raw)
    }

    /// Set a feature by position from user text.
    ///
    /// Numbers must parse as finite floats; categorical text must be one of the options.
    pub fn set_at(&mut self, index: usize, raw: &str) -> Result<(), FormError> {
        let Some(feature) = self.features.get(index) else {
            return Err(FormError::UnknownFeature(format!("#{}", index + 1)));
        };
        let raw = raw.trim();
        let value = match feature.kind {
            FeatureKind::Numeric => {
                let v = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| FormError::NotANumber {
                        name: feature.name.clone(),
                        value: raw.to_string(),
                    })?;
                FeatureValue::Number(v)
            }
            FeatureKind::Categorical => {
                if !feature.options.iter().any(|o| o == raw) {
                    return Err(FormError::NotAnOption {
                        name: feature.name.clone(),
                        value: raw.to_string(),
                        options: feature.options.clone(),
                    });
                }
                FeatureValue::Text(raw.to_string())
            }
        };
        self.values[index] = value;
        Ok(())
    }

    /// Move a categorical input to the next (`step > 0`) or previous option, wrapping.
    pub fn cycle_option(&mut self, index: usize, step: isize) {
        let Some(feature) = self.features.get(index) else {
            return;
        };
        if feature.kind != FeatureKind::Categorical || feature.options.is_empty() {
            return;
        }
        let n = feature.options.len() as isize;
        let current = match &self.values[index] {
            FeatureValue::Text(s) => feature.options.iter().position(|o| o == s).unwrap_or(0),
            FeatureValue::Number(_) => 0,
        };
        let next = (current as isize + step).rem_euclid(n) as usize;
        self.values[index] = FeatureValue::Text(feature.options[next].clone());
    }

    /// Add `delta` to a numeric input.
    pub fn nudge(&mut self, index: usize, delta: f64) {
        let is_numeric = self
            .features
            .get(index)
            .is_some_and(|f| f.kind == FeatureKind::Numeric);
        if !is_numeric {
            return;
        }
        if let FeatureValue::Number(v) = &mut self.values[index] {
            *v += delta;
        }
    }

    /// Values in `input_features` order, as the backend expects them.
    pub fn feature_vector(&self) -> Vec<FeatureValue> {
        self.values.clone()
    }

    pub fn submit(&self, client: &ModelApiClient) -> Result<serde_json::Value, ClientError> {
        client.predict(&self.model, &self.values)
    }
}

fn initial_value(feature: &FeatureDescriptor) -> FeatureValue {
    match feature.kind {
        FeatureKind::Numeric => FeatureValue::Number(feature.numeric_default()),
        FeatureKind::Categorical => FeatureValue::Text(feature.options[0].clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> PredictForm {
        PredictForm::from_metadata("games", &ModelMetadata::example()).unwrap()
    }

    #[test]
    fn vector_follows_metadata_order() {
        let form = form();
        assert_eq!(
            form.feature_vector(),
            vec![
                FeatureValue::Number(70.0),
                FeatureValue::Number(2020.0),
                FeatureValue::Text("PS4".into()),
                FeatureValue::Text("Action".into()),
                FeatureValue::Text("M".into()),
            ]
        );
    }

    #[test]
    fn setting_values_out_of_order_keeps_positions() {
        let mut form = form();
        form.set("Rating", "E10+").unwrap();
        form.set("Metacritic", "91.5").unwrap();
        form.set("Console", "PS5").unwrap();
        let v = form.feature_vector();
        assert_eq!(v[0], FeatureValue::Number(91.5));
        assert_eq!(v[2], FeatureValue::Text("PS5".into()));
        assert_eq!(v[4], FeatureValue::Text("E10+".into()));
        assert_eq!(v.len(), 5);
    }

    #[test]
    fn categorical_values_must_be_options() {
        let mut form = form();
        let err = form.set("Console", "Switch").unwrap_err();
        assert!(matches!(err, FormError::NotAnOption { .. }));
        assert_eq!(form.values()[2], FeatureValue::Text("PS4".into()));
    }

    #[test]
    fn numeric_values_must_parse() {
        let mut form = form();
        assert!(matches!(form.set("Metacritic", "high"), Err(FormError::NotANumber { .. })));
        assert!(matches!(form.set("Metacritic", "NaN"), Err(FormError::NotANumber { .. })));
        assert!(matches!(form.set("Nope", "1"), Err(FormError::UnknownFeature(_))));
    }

    #[test]
    fn cycle_wraps_both_ways() {
        let mut form = form();
        form.cycle_option(2, -1);
        assert_eq!(form.values()[2], FeatureValue::Text("PS3".into()));
        form.cycle_option(2, 1);
        assert_eq!(form.values()[2], FeatureValue::Text("PS4".into()));
        form.cycle_option(0, 1);
        assert_eq!(form.values()[0], FeatureValue::Number(70.0));
    }

    #[test]
    fn nudge_only_touches_numbers() {
        let mut form = form();
        form.nudge(0, 1.0);
        form.nudge(2, 1.0);
        assert_eq!(form.values()[0], FeatureValue::Number(71.0));
        assert_eq!(form.values()[2], FeatureValue::Text("PS4".into()));
    }

    #[test]
    fn numeric_without_default_starts_at_zero() {
        let meta = ModelMetadata {
            description: String::new(),
            input_features: vec![FeatureDescriptor::numeric("x", None)],
        };
        let form = PredictForm::from_metadata("m", &meta).unwrap();
        assert_eq!(form.feature_vector(), vec![FeatureValue::Number(0.0)]);
    }

    #[test]
    fn categorical_without_options_refuses_to_build() {
        let meta = ModelMetadata {
            description: String::new(),
            input_features: vec![FeatureDescriptor::categorical("c", Vec::new())],
        };
        let err = PredictForm::from_metadata("m", &meta).unwrap_err();
        assert!(matches!(err, FormError::UnusableMetadata(_)));
    }
}
