//! Spinner display for running stages.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use behemoth::StageEvent;

/// Buffered events between the runner and the display task.
const EVENT_BUFFER: usize = 256;

/// A steadily ticking spinner with a message.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Consumes `StageEvent`s and keeps a spinner line up to date.
pub struct StageProgress {
    tx: mpsc::Sender<StageEvent>,
    handle: JoinHandle<()>,
}

impl StageProgress {
    pub fn start() -> Self {
        let (tx, mut rx) = mpsc::channel::<StageEvent>(EVENT_BUFFER);
        let handle = tokio::spawn(async move {
            let pb = spinner("Starting");
            let mut done: u64 = 0;
            let mut failed: u64 = 0;

            while let Some(event) = rx.recv().await {
                match event {
                    StageEvent::Started { stage } => {
                        pb.set_message(format!("{}: starting", stage));
                    }
                    StageEvent::ItemCompleted { stage, url, .. }
                    | StageEvent::ItemSkipped { stage, url } => {
                        done += 1;
                        pb.set_message(format!("{}: {} documents | {}", stage, done, url));
                    }
                    StageEvent::ItemFiltered { .. } => {
                        done += 1;
                    }
                    StageEvent::ItemFailed { stage, url, error } => {
                        done += 1;
                        failed += 1;
                        pb.println(format!("  {} {}: {}", console::style("✗").red(), url, error));
                        pb.set_message(format!("{}: {} documents, {} failed", stage, done, failed));
                    }
                    StageEvent::Completed { .. } => break,
                }
            }
            pb.finish_and_clear();
        });
        Self { tx, handle }
    }

    pub fn sender(&self) -> &mpsc::Sender<StageEvent> {
        &self.tx
    }

    /// Close the channel and wait for the display to clear.
    pub async fn finish(self) {
        drop(self.tx);
        let _ = self.handle.await;
    }
}
