//! Small pieces of TUI state kept apart from drawing: the edit buffer, result
//! panes, and the mapping between upload-form rows and `UploadForm` fields.

use std::path::PathBuf;

use crate::domain::FeatureKind;
use crate::error::AppError;
use crate::form::{MetadataMode, UploadForm};

use super::App;

/// Text being typed into a field.
#[derive(Debug, Clone)]
pub(super) struct Editing {
    pub target: EditTarget,
    pub buffer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum EditTarget {
    /// Numeric input of the loaded prediction form.
    FeatureValue(usize),
    Upload(UploadField),
}

impl EditTarget {
    pub(super) fn label(&self, app: &App) -> String {
        match self {
            Self::FeatureValue(idx) => app
                .loaded
                .as_ref()
                .and_then(|l| l.form.features().get(*idx))
                .map(|f| f.name.clone())
                .unwrap_or_else(|| "value".to_string()),
            Self::Upload(field) => field.label(),
        }
    }
}

/// Outcome shown in a result pane.
#[derive(Debug, Clone)]
pub(super) enum ResultView {
    Success { title: String, body: String },
    Failure { title: String, body: String },
}

impl ResultView {
    pub fn failure(title: impl Into<String>, err: &AppError) -> Self {
        Self::Failure {
            title: title.into(),
            body: err.to_string(),
        }
    }
}

/// One line of the upload list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum UploadField {
    Name,
    ModelFile,
    Mode,
    MetaFile,
    Description,
    RowName(usize),
    RowOptions(usize),
    RowDefault(usize),
}

impl UploadField {
    /// Lines before the first feature row.
    pub const FIXED: usize = 5;

    pub fn at(idx: usize, form: &UploadForm) -> Self {
        match idx {
            0 => Self::Name,
            1 => Self::ModelFile,
            2 => Self::Mode,
            3 => Self::MetaFile,
            4 => Self::Description,
            n => Self::RowName((n - Self::FIXED).min(form.features.len().saturating_sub(1))),
        }
    }

    pub fn count(form: &UploadForm) -> usize {
        Self::FIXED + form.features.len()
    }

    pub fn label(&self) -> String {
        match self {
            Self::Name => "Model name".to_string(),
            Self::ModelFile => "Model file".to_string(),
            Self::Mode => "Metadata".to_string(),
            Self::MetaFile => "Meta file".to_string(),
            Self::Description => "Description".to_string(),
            Self::RowName(row) => format!("Feature {}", row + 1),
            Self::RowOptions(row) => format!("Options {}", row + 1),
            Self::RowDefault(row) => format!("Default {}", row + 1),
        }
    }

    /// Whether the field is sent with the current metadata mode.
    pub fn is_active(&self, form: &UploadForm) -> bool {
        match self {
            Self::MetaFile => form.mode == MetadataMode::File,
            Self::Description | Self::RowName(_) | Self::RowOptions(_) | Self::RowDefault(_) => {
                form.mode == MetadataMode::Inline
            }
            _ => true,
        }
    }
}

fn path_text(path: &Option<PathBuf>) -> String {
    path.as_ref().map(|p| p.display().to_string()).unwrap_or_default()
}

fn optional_path(text: &str) -> Option<PathBuf> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

/// Text placed in the edit buffer when editing starts.
pub(super) fn current_upload_text(form: &UploadForm, field: UploadField) -> String {
    let row = |r: usize| form.features.rows().get(r);
    match field {
        UploadField::Name => form.name.clone(),
        UploadField::ModelFile => path_text(&form.model_file),
        UploadField::Mode => form.mode.label().to_string(),
        UploadField::MetaFile => path_text(&form.meta_file),
        UploadField::Description => form.description.clone(),
        UploadField::RowName(r) => row(r).map(|d| d.name.clone()).unwrap_or_default(),
        UploadField::RowOptions(r) => row(r).map(|d| d.options.clone()).unwrap_or_default(),
        UploadField::RowDefault(r) => row(r)
            .and_then(|d| d.default)
            .map(|v| v.to_string())
            .unwrap_or_default(),
    }
}

/// Text shown next to the label in the upload list.
pub(super) fn display_upload_value(form: &UploadForm, field: UploadField) -> String {
    let or = |text: String, placeholder: &str| {
        if text.trim().is_empty() {
            placeholder.to_string()
        } else {
            text
        }
    };
    match field {
        UploadField::Name => or(form.name.clone(), "(required, e.g. fish-sales-v1)"),
        UploadField::ModelFile => or(path_text(&form.model_file), "(required, .onnx)"),
        UploadField::Mode => format!("{} (Enter to switch)", form.mode.label()),
        UploadField::MetaFile => or(path_text(&form.meta_file), "(.meta or .json)"),
        UploadField::Description => or(form.description.clone(), "(optional)"),
        UploadField::RowName(r) | UploadField::RowOptions(r) | UploadField::RowDefault(r) => {
            let Some(draft) = form.features.rows().get(r) else {
                return String::new();
            };
            let name = or(draft.name.clone(), "(unnamed)");
            let detail = match draft.kind {
                FeatureKind::Numeric => draft
                    .default
                    .map(|v| format!("default {v}"))
                    .unwrap_or_else(|| "no default".to_string()),
                FeatureKind::Categorical => or(draft.options.clone(), "(no options)"),
            };
            format!("{name} · {} · {detail}", draft.kind)
        }
    }
}

/// Store edited text into the form.
pub(super) fn apply_upload_edit(form: &mut UploadForm, field: UploadField, text: &str) -> Result<(), String> {
    match field {
        UploadField::Name => form.name = text.to_string(),
        UploadField::ModelFile => form.model_file = optional_path(text),
        UploadField::Mode => {}
        UploadField::MetaFile => form.meta_file = optional_path(text),
        UploadField::Description => form.description = text.to_string(),
        UploadField::RowName(r) => form.features.set_name(r, text),
        UploadField::RowOptions(r) => form.features.set_options(r, text),
        UploadField::RowDefault(r) => {
            let trimmed = text.trim();
            let default = if trimmed.is_empty() {
                None
            } else {
                let v = trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| format!("'{trimmed}' is not a number."))?;
                Some(v)
            };
            form.features.set_default(r, default);
        }
    }
    Ok(())
}
