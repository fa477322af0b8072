//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - dispatches to the scripted commands or the TUI

use std::fs;
use std::io;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::api::ModelApiClient;
use crate::cli::{Command, PredictArgs, ShowArgs, TemplateArgs, UploadArgs};
use crate::config::{ApiConfig, LOG_ENV};
use crate::domain::ModelMetadata;
use crate::error::AppError;
use crate::form::{FeatureDraft, MetadataMode, UploadForm};

pub mod workflow;

/// Entry point for the `deck` binary.
pub fn run() -> Result<(), AppError> {
    // Load `.env` first so clap sees MODEL_API_URL from it.
    dotenvy::dotenv().ok();

    // `deck` and `deck --api-url X` behave like `deck tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let is_tui = matches!(cli.command, Command::Tui);
    init_tracing(if is_tui { "off" } else { "warn" });

    let config = ApiConfig::new(&cli.api_url)?;
    tracing::debug!(base_url = %config.base_url, "resolved API endpoint");

    match cli.command {
        Command::Models => handle_models(&config),
        Command::Show(args) => handle_show(&config, args),
        Command::Predict(args) => handle_predict(&config, args),
        Command::Upload(args) => handle_upload(&config, args),
        Command::MetaTemplate(args) => handle_template(args),
        Command::Tui => crate::tui::run(&config),
    }
}

fn init_tracing(default_directive: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn client(config: &ApiConfig) -> Result<ModelApiClient, AppError> {
    Ok(ModelApiClient::new(config)?)
}

fn handle_models(config: &ApiConfig) -> Result<(), AppError> {
    let models = client(config)?.list_models()?;
    print!("{}", crate::report::format_model_list(&models));
    if models.is_empty() {
        println!();
    }
    Ok(())
}

fn handle_show(config: &ApiConfig, args: ShowArgs) -> Result<(), AppError> {
    let metadata = client(config)?.get_metadata(&args.model)?;
    print!("{}", crate::report::format_metadata(&args.model, &metadata));
    Ok(())
}

fn handle_predict(config: &ApiConfig, args: PredictArgs) -> Result<(), AppError> {
    let client = client(config)?;
    let mut loaded = workflow::load_model(&client, &args.model)?;

    for raw in &args.set {
        let (name, value) = crate::cli::parse_assignment(raw)
            .ok_or_else(|| AppError::input(format!("Expected NAME=VALUE, got '{raw}'.")))?;
        loaded.form.set(name, value)?;
    }

    if args.interactive {
        let stdin = io::stdin();
        crate::cli::prompt::prompt_for_features(&mut loaded.form, &mut stdin.lock(), &mut io::stdout())?;
    }

    if !args.raw {
        println!("Sending {} feature(s) to '{}':", loaded.form.len(), loaded.id);
        print!(
            "{}",
            crate::report::format_feature_vector(&loaded.metadata, loaded.form.values())
        );
    }

    let output = workflow::run_prediction(&client, &loaded.form)?;
    if args.raw {
        println!("{}", output.result);
    } else {
        println!(
            "{}",
            crate::report::format_prediction(&output.model, &output.result, output.received_at)
        );
    }
    Ok(())
}

fn handle_upload(config: &ApiConfig, args: UploadArgs) -> Result<(), AppError> {
    let mut form = upload_form_from_args(args)?;
    let name = form.name.trim().to_string();
    let body = form.submit(&client(config)?)?;
    println!("{}", crate::report::format_upload_success(&name, &body));
    Ok(())
}

/// Build the upload form the same way the TUI fills it in.
pub fn upload_form_from_args(args: UploadArgs) -> Result<UploadForm, AppError> {
    let mut form = UploadForm {
        name: args.name,
        model_file: Some(args.model),
        ..UploadForm::default()
    };

    match args.meta {
        Some(meta) => {
            form.mode = MetadataMode::File;
            form.meta_file = Some(meta);
        }
        None => {
            if args.feature.is_empty() && args.description.is_none() {
                return Err(AppError::input(
                    "Provide --meta <FILE.meta>, or inline metadata with --description/--feature.",
                ));
            }
            form.mode = MetadataMode::Inline;
            form.description = args.description.unwrap_or_default();
            for spec in &args.feature {
                form.features.push(FeatureDraft::from_spec(spec)?);
            }
        }
    }

    Ok(form)
}

fn handle_template(args: TemplateArgs) -> Result<(), AppError> {
    if args.path.exists() && !args.force {
        return Err(AppError::input(format!(
            "{} already exists. Use --force to overwrite.",
            args.path.display()
        )));
    }
    let json = serde_json::to_string_pretty(&ModelMetadata::example())
        .map_err(|e| AppError::input(format!("Failed to encode template: {e}")))?;
    fs::write(&args.path, json + "\n").map_err(|e| {
        AppError::input(format!("Failed to write '{}': {e}", args.path.display()))
    })?;
    println!(
        "Wrote {}. Feature names must match the model's input columns exactly.",
        args.path.display()
    );
    Ok(())
}

/// Rewrite argv so `deck` defaults to `deck tui`.
///
/// Rules:
/// - `deck`                       -> `deck tui`
/// - `deck --api-url URL`         -> `deck tui --api-url URL`
/// - `deck --api-url URL models`  -> unchanged (global flag before a subcommand)
/// - `deck --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    if !names_subcommand(&argv) {
        argv.insert(1.min(argv.len()), "tui".to_string());
    }
    argv
}

/// True when argv already picks a subcommand or asks for top-level help/version.
fn names_subcommand(argv: &[String]) -> bool {
    let mut tokens = argv.iter().skip(1);
    while let Some(token) = tokens.next() {
        match token.as_str() {
            "-h" | "--help" | "-V" | "--version" => return true,
            "--api-url" => {
                tokens.next();
            }
            flag if flag.starts_with('-') => {}
            // First positional is the subcommand; clap reports unknown names.
            _ => return true,
        }
    }
    false
}
