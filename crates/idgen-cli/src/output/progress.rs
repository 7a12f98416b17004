//! Progress spinner adapter using indicatif.

use std::time::Duration;

use idgen_core::{PredictionEvent, ProgressSink};
use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};
use tracing::debug;

/// Spinner that follows a prediction through its stages.
pub struct ProgressBar {
    bar: Option<IndicatifBar>,
    quiet: bool,
}

impl ProgressBar {
    /// Creates a new progress spinner.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, suppress all output
    /// * `show_bar` - If true, draw a spinner; otherwise only notable events are printed
    #[must_use]
    pub fn new(quiet: bool, show_bar: bool) -> Self {
        if quiet {
            return Self {
                bar: None,
                quiet: true,
            };
        }

        let bar = show_bar.then(|| {
            let bar = IndicatifBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
            {
                bar.set_style(style);
            }
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });

        Self { bar, quiet }
    }

    fn message(&self, text: String) {
        if let Some(bar) = &self.bar {
            bar.set_message(text);
        }
    }
}

impl ProgressSink for ProgressBar {
    fn on_event(&self, event: PredictionEvent) {
        debug!("Prediction stage: {}", event.stage());
        if self.quiet {
            return;
        }

        match event {
            PredictionEvent::Started { face_image } => {
                self.message(format!("Detecting face in {face_image}"));
            }
            PredictionEvent::FaceDetected { faces } => {
                if faces > 1 && self.bar.is_none() {
                    eprintln!("{faces} faces found, using the largest");
                }
                self.message("Face detected".to_string());
            }
            PredictionEvent::PoseReferenceApplied => {
                self.message("Pose reference applied".to_string());
            }
            PredictionEvent::Conditioned {
                selected,
                width,
                height,
            } => {
                let names: Vec<&str> = selected.iter().map(|kind| kind.name()).collect();
                let aux = if names.is_empty() {
                    "identity only".to_string()
                } else {
                    names.join("+")
                };
                self.message(format!("Generating {width}x{height} ({aux})"));
            }
            PredictionEvent::Generated { seed } => {
                self.message(format!("Generated with seed {seed}"));
            }
            PredictionEvent::SafetyChecked { nsfw } => {
                if nsfw {
                    eprintln!("WARN: output flagged as NSFW and replaced");
                }
            }
            PredictionEvent::Done { path } => {
                if let Some(bar) = &self.bar {
                    bar.finish_with_message(format!("Done: {}", path.display()));
                }
            }
            PredictionEvent::Failed { reason } => {
                if let Some(bar) = &self.bar {
                    bar.abandon_with_message(format!("Failed: {reason}"));
                }
            }
        }
    }
}
