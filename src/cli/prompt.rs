//! Line-based prompts for `deck predict --interactive`.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the prompt walks the model's features in order and asks for each value
//!
//! Readers and writers are generic so the flow can be driven from tests.

use std::io::{BufRead, Write};

use crate::domain::FeatureKind;
use crate::error::AppError;
use crate::form::PredictForm;

/// Ask for every feature in metadata order.
///
/// Behavior:
/// - empty input keeps the current value (the default)
/// - categorical features accept an option number or the option text
/// - invalid input re-asks the same feature
/// - `q` cancels
pub fn prompt_for_features<R: BufRead, W: Write>(
    form: &mut PredictForm,
    input: &mut R,
    out: &mut W,
) -> Result<(), AppError> {
    let write_err = |e: std::io::Error| AppError::input(format!("Failed to write prompt: {e}"));

    for index in 0..form.len() {
        let feature = form.features()[index].clone();
        if feature.kind == FeatureKind::Categorical {
            writeln!(out, "{} options:", feature.name).map_err(write_err)?;
            for (i, opt) in feature.options.iter().enumerate() {
                writeln!(out, "{:>3}) {opt}", i + 1).map_err(write_err)?;
            }
        }

        loop {
            write!(
                out,
                "{} ({}) [{}]: ",
                feature.name,
                feature.kind,
                form.values()[index]
            )
            .map_err(write_err)?;
            out.flush().map_err(write_err)?;

            let mut line = String::new();
            let bytes = input
                .read_line(&mut line)
                .map_err(|e| AppError::input(format!("Failed to read input: {e}")))?;
            if bytes == 0 {
                return Err(AppError::input(
                    "No input received. Pass values with `deck predict <model> --set NAME=VALUE`.",
                ));
            }

            let answer = line.trim();
            if answer.eq_ignore_ascii_case("q") {
                return Err(AppError::input("Canceled."));
            }
            if answer.is_empty() {
                break;
            }

            let answer = match (feature.kind, answer.parse::<usize>()) {
                (FeatureKind::Categorical, Ok(choice)) if (1..=feature.options.len()).contains(&choice) => {
                    feature.options[choice - 1].as_str()
                }
                _ => answer,
            };

            match form.set_at(index, answer) {
                Ok(()) => break,
                Err(err) => writeln!(out, "{err}").map_err(write_err)?,
            }
        }
    }

    Ok(())
}
