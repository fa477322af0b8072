//! Upload form: model name, `.onnx` artifact, and metadata from a file or typed in.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::api::{ApiBody, MetadataPayload, ModelApiClient, UploadRequest};
use crate::domain::ModelMetadata;
use crate::form::{FeatureEditor, FormError, SubmitError};

/// Which metadata source the form sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataMode {
    #[default]
    File,
    Inline,
}

impl MetadataMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::File => Self::Inline,
            Self::Inline => Self::File,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::File => "metadata file",
            Self::Inline => "inline",
        }
    }
}

/// In-progress upload. Both metadata sources are kept so switching modes loses nothing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UploadForm {
    pub name: String,
    pub model_file: Option<PathBuf>,
    pub mode: MetadataMode,
    pub meta_file: Option<PathBuf>,
    pub description: String,
    pub features: FeatureEditor,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check every field and read the files. Never touches the network.
    pub fn validate(&self) -> Result<UploadRequest, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::MissingName);
        }
        let model_path = self.model_file.as_deref().ok_or(FormError::MissingModelFile)?;
        check_extension(model_path, &["onnx"], ".onnx")?;

        // Cheap checks on the typed-in rows come before any file reads.
        let inline = match self.mode {
            MetadataMode::Inline => Some(ModelMetadata {
                description: self.description.trim().to_string(),
                input_features: self.features.to_descriptors()?,
            }),
            MetadataMode::File => None,
        };

        let model_bytes = read_file(model_path)?;
        if model_bytes.is_empty() {
            return Err(FormError::EmptyModelFile(model_path.to_path_buf()));
        }

        let metadata = match inline {
            Some(meta) => MetadataPayload::Inline(meta),
            None => {
                let meta_path = self.meta_file.as_deref().ok_or(FormError::MissingMetadataFile)?;
                check_extension(meta_path, &["meta", "json"], ".meta or .json")?;
                let bytes = read_file(meta_path)?;
                check_metadata_file(meta_path, &bytes)?;
                MetadataPayload::File(bytes)
            }
        };

        Ok(UploadRequest {
            model_name: name.to_string(),
            model_bytes,
            metadata,
        })
    }

    /// Validate and upload. The form is cleared only after a `201 Created`.
    pub fn submit(&mut self, client: &ModelApiClient) -> Result<ApiBody, SubmitError> {
        let request = self.validate()?;
        let body = client.upload(&request)?;
        info!(model = %request.model_name, "model uploaded");
        self.reset();
        Ok(body)
    }

    /// Clear every field except the chosen metadata mode.
    pub fn reset(&mut self) {
        *self = Self {
            mode: self.mode,
            ..Self::default()
        };
    }
}

fn check_extension(path: &Path, allowed: &[&str], expected: &'static str) -> Result<(), FormError> {
    let ok = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| allowed.iter().any(|a| ext.eq_ignore_ascii_case(a)));
    if ok {
        Ok(())
    } else {
        Err(FormError::WrongExtension {
            path: path.to_path_buf(),
            expected,
        })
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, FormError> {
    if path.is_dir() {
        return Err(FormError::Unreadable {
            path: path.to_path_buf(),
            reason: "is a directory".to_string(),
        });
    }
    fs::read(path).map_err(|e| FormError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn check_metadata_file(path: &Path, bytes: &[u8]) -> Result<(), FormError> {
    let invalid = |reason: String| FormError::InvalidMetadataFile {
        path: path.to_path_buf(),
        reason,
    };
    let meta: ModelMetadata = serde_json::from_slice(bytes).map_err(|e| invalid(e.to_string()))?;
    if let Some(problem) = meta.input_features.iter().find_map(|f| f.problem()) {
        return Err(invalid(problem));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeatureKind;

    fn write(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn example_meta() -> Vec<u8> {
        serde_json::to_vec(&ModelMetadata::example()).unwrap()
    }

    #[test]
    fn file_mode_reads_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let form = UploadForm {
            name: " fish-sales-v1 ".into(),
            model_file: Some(write(dir.path(), "m.onnx", b"onnx-bytes")),
            meta_file: Some(write(dir.path(), "m.meta", &example_meta())),
            ..UploadForm::default()
        };
        let req = form.validate().unwrap();
        assert_eq!(req.model_name, "fish-sales-v1");
        assert_eq!(req.model_bytes, b"onnx-bytes");
        assert!(matches!(req.metadata, MetadataPayload::File(_)));
    }

    #[test]
    fn missing_name_is_rejected_first() {
        let form = UploadForm::default();
        assert_eq!(form.validate(), Err(FormError::MissingName));
    }

    #[test]
    fn missing_model_file_is_rejected() {
        let form = UploadForm {
            name: "m".into(),
            ..UploadForm::default()
        };
        assert_eq!(form.validate(), Err(FormError::MissingModelFile));
    }

    #[test]
    fn pickle_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let form = UploadForm {
            name: "m".into(),
            model_file: Some(write(dir.path(), "m.pkl", b"x")),
            ..UploadForm::default()
        };
        assert!(matches!(form.validate(), Err(FormError::WrongExtension { .. })));
    }

    #[test]
    fn empty_model_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let form = UploadForm {
            name: "m".into(),
            model_file: Some(write(dir.path(), "m.onnx", b"")),
            meta_file: Some(write(dir.path(), "m.meta", &example_meta())),
            ..UploadForm::default()
        };
        assert!(matches!(form.validate(), Err(FormError::EmptyModelFile(_))));
    }

    #[test]
    fn invalid_metadata_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let form = UploadForm {
            name: "m".into(),
            model_file: Some(write(dir.path(), "m.onnx", b"x")),
            meta_file: Some(write(dir.path(), "m.json", b"{not json")),
            ..UploadForm::default()
        };
        assert!(matches!(form.validate(), Err(FormError::InvalidMetadataFile { .. })));
    }

    #[test]
    fn inline_mode_builds_metadata_from_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut form = UploadForm {
            name: "m".into(),
            model_file: Some(write(dir.path(), "m.onnx", b"x")),
            mode: MetadataMode::Inline,
            description: "demo".into(),
            ..UploadForm::default()
        };
        let row = form.features.add();
        form.features.set_name(row, "Console");
        form.features.toggle_kind(row);
        form.features.set_options(row, "PS4,PS5");

        let req = form.validate().unwrap();
        let MetadataPayload::Inline(meta) = req.metadata else {
            panic!("expected inline metadata");
        };
        assert_eq!(meta.description, "demo");
        assert_eq!(meta.input_features[0].kind, FeatureKind::Categorical);
    }

    #[test]
    fn inline_mode_rejects_unnamed_rows() {
        let mut form = UploadForm {
            name: "m".into(),
            model_file: Some(PathBuf::from("does-not-matter.onnx")),
            mode: MetadataMode::Inline,
            ..UploadForm::default()
        };
        form.features.add();
        assert_eq!(form.validate(), Err(FormError::UnnamedFeature { row: 1 }));
    }

    #[test]
    fn reset_keeps_mode_only() {
        let mut form = UploadForm {
            name: "m".into(),
            mode: MetadataMode::Inline,
            ..UploadForm::default()
        };
        form.features.add();
        form.reset();
        assert_eq!(form.mode, MetadataMode::Inline);
        assert!(form.name.is_empty());
        assert!(form.features.is_empty());
    }
}
