//! Build callbacks for monitoring and logging.
//!
//! - [`ProgressCallback`] - progress bar per build stage
//! - [`LoggingCallback`] - stage and split summaries via tracing

use indicatif::{ProgressBar, ProgressStyle};
use mtprep_core::{BuildCallback, BuildStage, SplitReport};

/// Progress bar callback for corpus builds.
pub struct ProgressCallback {
    progress: ProgressBar,
}

impl ProgressCallback {
    /// Create a new progress callback.
    pub fn new() -> Self {
        Self {
            progress: ProgressBar::hidden(),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
    }
}

impl Default for ProgressCallback {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildCallback for ProgressCallback {
    fn on_stage_start(&mut self, stage: &BuildStage, total: usize) {
        self.progress = ProgressBar::new(total as u64);
        self.progress.set_style(Self::style());
        self.progress.set_message(stage.to_string());
    }

    fn on_line(&mut self, position: usize) {
        self.progress.set_position(position as u64);
    }

    fn on_stage_end(&mut self, stage: &BuildStage) {
        self.progress.finish_with_message(format!("{} done", stage));
    }
}

/// Logging callback for build events.
#[derive(Debug, Default)]
pub struct LoggingCallback;

impl LoggingCallback {
    /// Create a new logging callback.
    pub fn new() -> Self {
        Self
    }
}

impl BuildCallback for LoggingCallback {
    fn on_stage_start(&mut self, stage: &BuildStage, total: usize) {
        tracing::info!(lines = total, "Started {}", stage);
    }

    fn on_split_encoded(&mut self, report: &SplitReport) {
        tracing::info!(
            split = %report.split,
            lines = report.lines,
            kept = report.kept,
            dropped = report.dropped,
            source_unknown = report.source_unknown,
            target_unknown = report.target_unknown,
            "Split encoded"
        );
    }
}

/// Fans events out to several callbacks.
#[derive(Default)]
pub struct CallbackList {
    callbacks: Vec<Box<dyn BuildCallback>>,
}

impl CallbackList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback.
    pub fn push(&mut self, callback: impl BuildCallback + 'static) {
        self.callbacks.push(Box::new(callback));
    }
}

impl BuildCallback for CallbackList {
    fn on_stage_start(&mut self, stage: &BuildStage, total: usize) {
        for cb in &mut self.callbacks {
            cb.on_stage_start(stage, total);
        }
    }

    fn on_line(&mut self, position: usize) {
        for cb in &mut self.callbacks {
            cb.on_line(position);
        }
    }

    fn on_stage_end(&mut self, stage: &BuildStage) {
        for cb in &mut self.callbacks {
            cb.on_stage_end(stage);
        }
    }

    fn on_split_encoded(&mut self, report: &SplitReport) {
        for cb in &mut self.callbacks {
            cb.on_split_encoded(report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl BuildCallback for Recorder {
        fn on_stage_start(&mut self, stage: &BuildStage, total: usize) {
            self.0.borrow_mut().push(format!("start {} {}", stage, total));
        }

        fn on_split_encoded(&mut self, report: &SplitReport) {
            self.0.borrow_mut().push(format!("split {}", report.split));
        }
    }

    #[test]
    fn test_callback_list_fans_out() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut list = CallbackList::new();
        list.push(Recorder(log.clone()));
        list.push(Recorder(log.clone()));
        list.push(LoggingCallback::new());

        let stage = BuildStage::EncodeSplit {
            split: "train".into(),
        };
        list.on_stage_start(&stage, 3);
        list.on_line(1);
        list.on_stage_end(&stage);
        list.on_split_encoded(&SplitReport {
            split: "train".into(),
            ..Default::default()
        });

        assert_eq!(
            *log.borrow(),
            vec![
                "start encoding train 3",
                "start encoding train 3",
                "split train",
                "split train"
            ]
        );
    }

    #[test]
    fn test_progress_callback_lifecycle() {
        let mut progress = ProgressCallback::new();
        let stage = BuildStage::EncodeSplit {
            split: "valid".into(),
        };
        progress.on_stage_start(&stage, 2);
        progress.on_line(2);
        progress.on_stage_end(&stage);
        assert!(progress.progress.is_finished());
    }
}
