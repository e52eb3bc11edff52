//! Shared terminal progress reporting (spec §5 "Shared resources": stdout
//! progress reporting behind a single shared lock, so interleaved worker
//! progress meters don't corrupt the terminal).
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// one progress bar per worker id, all multiplexed through a single
/// terminal writer.
pub struct WorkerProgress {
    multi: MultiProgress,
    style: ProgressStyle,
}

impl WorkerProgress {
    pub fn new() -> Self {
        WorkerProgress {
            multi: MultiProgress::new(),
            style: ProgressStyle::with_template("#{prefix} {bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        }
    }

    pub fn add_worker(&self, id: usize, total: u64) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new(total));
        bar.set_style(self.style.clone());
        bar.set_prefix(id.to_string());
        bar
    }
}

impl Default for WorkerProgress {
    fn default() -> Self {
        Self::new()
    }
}
