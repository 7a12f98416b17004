//! Models command - inspect model weights.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};
use idgen_adapters::models::{
    list_models as adapter_list_models, models_dir, verify_models, MODELS,
};
use tracing::debug;

use crate::config::AppConfig;

/// Arguments for the models command
#[derive(Args)]
pub struct ModelsArgs {
    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Models subcommands
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// List registered models and whether they are present
    List,
    /// Print model directory path
    Path,
    /// Check that every model is present and readable
    Verify,
}

/// Run the models command.
///
/// # Errors
///
/// `verify` fails with the first missing or unreadable model.
pub fn run(args: &ModelsArgs, config: &AppConfig) -> Result<()> {
    let dir = models_dir(args.models_dir.as_deref().or(config.models.dir.as_deref()));
    debug!("Using models directory: {}", dir.display());

    match args.command {
        ModelsCommand::List => list_models(&dir),
        ModelsCommand::Path => print_path(&dir),
        ModelsCommand::Verify => verify(&dir),
    }
}

#[allow(clippy::unnecessary_wraps)]
fn list_models(dir: &Path) -> Result<()> {
    let models = adapter_list_models(dir);

    println!("Models directory: {}", dir.display());
    println!();

    for (name, installed) in &models {
        let status = if *installed { "✓" } else { "✗" };
        let info = MODELS.iter().find(|m| m.name == name);
        let path = info.map_or("unknown", |m| m.path);
        let description = info.map_or("", |m| m.description);
        println!("  {status} {name} ({path}) - {description}");
    }

    println!();
    let installed_count = models.iter().filter(|(_, installed)| *installed).count();
    println!("{}/{} models installed", installed_count, models.len());

    Ok(())
}

#[allow(clippy::unnecessary_wraps)]
fn print_path(dir: &Path) -> Result<()> {
    println!("{}", dir.display());
    Ok(())
}

fn verify(dir: &Path) -> Result<()> {
    verify_models(dir)?;
    println!("All {} models verified in {}", MODELS.len(), dir.display());
    Ok(())
}
