//! Operator console progress: a count bar of collected channels against the target.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

fn count_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.green} {msg} {pos}/{len} [{bar:.cyan/blue}] {percent:>3}%  \
         elapsed: {elapsed_precise}  eta: {eta_precise}"
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏  ")
}

/// Thin wrapper over an `indicatif` bar; a disabled scope draws nothing.
pub struct ProgressScope {
    pb: ProgressBar,
}

impl ProgressScope {
    pub fn count<T: Into<String>>(label: T, total: u64, enabled: bool) -> Self {
        if !enabled {
            return Self { pb: ProgressBar::hidden() };
        }
        let pb = ProgressBar::new(total);
        pb.set_style(count_style());
        let label = label.into();
        if !label.is_empty() {
            pb.set_message(label);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }
    #[inline] pub fn set_position(&self, pos: u64) { self.pb.set_position(pos); }
    #[inline] pub fn set_label<T: Into<String>>(&self, label: T) { self.pb.set_message(label.into()); }
    pub fn finish<T: Into<String>>(&self, msg: T) { self.pb.finish_with_message(msg.into()); }
}
