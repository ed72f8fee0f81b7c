//! Observer implementations for inference sessions
//!
//! Observers allow progress reporting and restart logging without coupling
//! the restart controller to a terminal or an output format.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{Error, Result, ports::Observer, restarts::RestartSummary};

/// Progress bar observer - Shows finished restarts and the best score so far
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    finished: usize,
    best_score: f64,
}

impl ProgressObserver {
    /// Create a new progress observer
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            finished: 0,
            best_score: f64::NEG_INFINITY,
        }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_inference_start(&mut self, total_restarts: usize) -> Result<()> {
        let pb = ProgressBar::new(total_restarts as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} restarts ({msg})")
                .map_err(|e| Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_restart_complete(&mut self, summary: &RestartSummary) -> Result<()> {
        self.finished += 1;
        if summary.score > self.best_score {
            self.best_score = summary.score;
        }

        if let Some(pb) = &self.progress_bar {
            pb.set_position(self.finished as u64);
            pb.set_message(format!("best score {:.4}", self.best_score));
        }
        Ok(())
    }

    fn on_inference_end(&mut self, best: &RestartSummary, _completed: usize) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(format!(
                "best score {:.4} from restart {}",
                best.score, best.restart
            ));
        }
        Ok(())
    }
}

/// JSONL observer - Writes one JSON object per finished restart
pub struct JsonlObserver {
    writer: BufWriter<File>,
}

impl JsonlObserver {
    /// Create a new JSONL observer
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl Observer for JsonlObserver {
    fn on_restart_complete(&mut self, summary: &RestartSummary) -> Result<()> {
        serde_json::to_writer(&mut self.writer, summary)?;
        writeln!(&mut self.writer)?;
        Ok(())
    }

    fn on_inference_end(&mut self, _best: &RestartSummary, _completed: usize) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn summary(restart: usize, score: f64) -> RestartSummary {
        RestartSummary {
            restart,
            seed: restart as u64,
            score,
            log_likelihood: score,
            iterations: 3,
            converged: true,
        }
    }

    #[test]
    fn progress_tracks_best_score() {
        let mut observer = ProgressObserver::new();
        observer.on_inference_start(3).unwrap();
        observer.on_restart_complete(&summary(1, -5.0)).unwrap();
        observer.on_restart_complete(&summary(0, -2.0)).unwrap();
        observer.on_restart_complete(&summary(2, -9.0)).unwrap();
        observer.on_inference_end(&summary(0, -2.0), 3).unwrap();
        assert_eq!(observer.finished, 3);
        assert_eq!(observer.best_score, -2.0);
    }

    #[test]
    fn jsonl_writes_one_line_per_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("restarts.jsonl");
        let mut observer = JsonlObserver::new(&path).unwrap();
        observer.on_restart_complete(&summary(0, -1.5)).unwrap();
        observer.on_restart_complete(&summary(1, -0.5)).unwrap();
        observer.on_inference_end(&summary(1, -0.5), 2).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<RestartSummary> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(parsed, vec![summary(0, -1.5), summary(1, -0.5)]);
    }
}
