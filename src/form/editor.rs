//! Editable feature rows for inline upload metadata.

use crate::domain::{FeatureDescriptor, FeatureKind};
use crate::form::FormError;

/// One row being edited. `options` is the raw comma-separated text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureDraft {
    pub name: String,
    pub kind: FeatureKind,
    pub options: String,
    pub default: Option<f64>,
}

impl FeatureDraft {
    /// Parse `name:numeric[:default]` or `name:categorical:a,b,c`.
    pub fn from_spec(spec: &str) -> Result<Self, FormError> {
        let invalid = |reason: &str| FormError::InvalidFeatureSpec {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = spec.splitn(3, ':');
        let name = parts.next().unwrap_or("").trim();
        let kind = parts.next().map(str::trim).unwrap_or("numeric");
        let rest = parts.next().map(str::trim);

        match kind {
            "numeric" | "num" => {
                let default = match rest {
                    None | Some("") => None,
                    Some(raw) => Some(
                        raw.parse::<f64>()
                            .ok()
                            .filter(|v| v.is_finite())
                            .ok_or_else(|| invalid("default must be a number"))?,
                    ),
                };
                Ok(Self {
                    name: name.to_string(),
                    kind: FeatureKind::Numeric,
                    options: String::new(),
                    default,
                })
            }
            "categorical" | "cat" => Ok(Self {
                name: name.to_string(),
                kind: FeatureKind::Categorical,
                options: rest.unwrap_or("").to_string(),
                default: None,
            }),
            other => Err(invalid(&format!(
                "unknown type '{other}' (use numeric or categorical)"
            ))),
        }
    }

    /// Options split on commas, trimmed, blanks dropped.
    pub fn option_list(&self) -> Vec<String> {
        self.options
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Ordered, editable list of feature rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureEditor {
    rows: Vec<FeatureDraft>,
}

impl FeatureEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[FeatureDraft] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a blank numeric row and return its index.
    pub fn add(&mut self) -> usize {
        self.rows.push(FeatureDraft::default());
        self.rows.len() - 1
    }

    pub fn push(&mut self, draft: FeatureDraft) {
        self.rows.push(draft);
    }

    pub fn remove(&mut self, index: usize) -> Option<FeatureDraft> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    pub fn set_name(&mut self, index: usize, name: impl Into<String>) {
        if let Some(row) = self.rows.get_mut(index) {
            row.name = name.into();
        }
    }

    pub fn toggle_kind(&mut self, index: usize) {
        if let Some(row) = self.rows.get_mut(index) {
            row.kind = row.kind.toggled();
        }
    }

    pub fn set_options(&mut self, index: usize, options: impl Into<String>) {
        if let Some(row) = self.rows.get_mut(index) {
            row.options = options.into();
        }
    }

    pub fn set_default(&mut self, index: usize, default: Option<f64>) {
        if let Some(row) = self.rows.get_mut(index) {
            row.default = default;
        }
    }

    /// Turn the rows into descriptors, in row order.
    ///
    /// Every row needs a name; categorical rows need at least one option.
    pub fn to_descriptors(&self) -> Result<Vec<FeatureDescriptor>, FormError> {
        let mut out = Vec::with_capacity(self.rows.len());
        for (idx, row) in self.rows.iter().enumerate() {
            let name = row.name.trim();
            if name.is_empty() {
                return Err(FormError::UnnamedFeature { row: idx + 1 });
            }
            let descriptor = match row.kind {
                FeatureKind::Numeric => FeatureDescriptor::numeric(name, row.default),
                FeatureKind::Categorical => {
                    let options = row.option_list();
                    if options.is_empty() {
                        return Err(FormError::NoOptions {
                            name: name.to_string(),
                        });
                    }
                    FeatureDescriptor::categorical(name, options)
                }
            };
            out.push(descriptor);
        }
        Ok(out)
    }
}
