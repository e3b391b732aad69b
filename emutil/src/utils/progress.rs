//! Progress indicator utilities

use indicatif::{ProgressBar, ProgressStyle};

/// Create a spinner for indeterminate progress
///
/// Hidden when `quiet` is set; indicatif also hides it when stderr is not a
/// terminal.
pub fn create_spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
