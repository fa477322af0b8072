//! Command-line parsing for the model deck.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! client and form logic.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{API_URL_ENV, DEFAULT_API_URL};

pub mod prompt;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "deck", version, about = "Terminal client for a model-serving API (list, predict, upload)")]
pub struct Cli {
    /// Base URL of the model API.
    #[arg(long, global = true, env = API_URL_ENV, value_name = "URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List registered models.
    Models,
    /// Show a model's description and input features.
    Show(ShowArgs),
    /// Send a feature vector to a model and print the result.
    Predict(PredictArgs),
    /// Upload a new .onnx model with a metadata file or inline features.
    Upload(UploadArgs),
    /// Write an example .meta file to start from.
    MetaTemplate(TemplateArgs),
    /// Launch the interactive TUI (the default).
    Tui,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Model name.
    pub model: String,
}

#[derive(Debug, Args)]
pub struct PredictArgs {
    /// Model name.
    pub model: String,

    /// Feature value as NAME=VALUE (repeatable). Unset features keep their defaults.
    #[arg(short = 's', long = "set", value_name = "NAME=VALUE")]
    pub set: Vec<String>,

    /// Ask for each feature value on stdin.
    #[arg(short, long)]
    pub interactive: bool,

    /// Print only the raw JSON result.
    #[arg(long)]
    pub raw: bool,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Short model name (e.g. fish-sales-v1).
    #[arg(short, long)]
    pub name: String,

    /// The .onnx model file.
    #[arg(short, long, value_name = "FILE.onnx")]
    pub model: PathBuf,

    /// Metadata file (.meta or .json).
    #[arg(long, value_name = "FILE.meta", conflicts_with_all = ["description", "feature"])]
    pub meta: Option<PathBuf>,

    /// Model description (inline metadata).
    #[arg(short, long)]
    pub description: Option<String>,

    /// Inline feature as name:numeric[:default] or name:categorical:a,b,c (repeatable, in order).
    #[arg(short, long, value_name = "SPEC")]
    pub feature: Vec<String>,
}

#[derive(Debug, Args)]
pub struct TemplateArgs {
    /// Where to write the template.
    #[arg(value_name = "PATH", default_value = "model.meta")]
    pub path: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

/// Split a `NAME=VALUE` assignment. The name may contain spaces; the first `=` splits.
pub fn parse_assignment(raw: &str) -> Option<(&str, &str)> {
    let (name, value) = raw.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}
