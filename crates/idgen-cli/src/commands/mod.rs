//! CLI command definitions and handlers.

pub mod models;
pub mod predict;

use clap::{Parser, Subcommand};
use idgen_core::{ConfigurationError, InputValidationError, PredictError};

/// idgen - identity-preserving portrait generation
#[derive(Parser)]
#[command(name = "idgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared prediction arguments (images, prompt, conditioning).
    #[command(flatten)]
    pub predict: predict::PredictArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate an image from a face photo
    Predict(predict::PredictArgs),
    /// Inspect model weights
    Models(models::ModelsArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Prediction written.
    Success = 0,
    /// Any other failure.
    Error = 1,
    /// The request could not be served as given.
    InvalidInput = 2,
    /// The process is not set up to serve requests.
    Configuration = 3,
}

impl ExitCode {
    /// Picks the exit code for a failed command by walking its error chain.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(err) = cause.downcast_ref::<PredictError>() {
                return match err {
                    PredictError::Input(_) => Self::InvalidInput,
                    PredictError::Configuration(_) => Self::Configuration,
                    PredictError::Collaborator { .. } => Self::Error,
                };
            }
            if cause.is::<InputValidationError>() {
                return Self::InvalidInput;
            }
            if cause.is::<ConfigurationError>() {
                return Self::Configuration;
            }
        }
        Self::Error
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}
