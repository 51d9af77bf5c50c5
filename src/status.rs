//! Presentation surface and status ticking
//!
//! The pipeline only talks to the host UI through [`PopupView`]. While a
//! long phase runs, a [`StatusTicker`] cycles an animated status string
//! ("Loading", "Loading.", "Loading..", ...). The ticker is a scoped
//! resource: stopping it or dropping it tears the timer down, once.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

/// Default period between status updates
pub const STATUS_TICK: Duration = Duration::from_millis(500);

const MAX_DOTS: usize = 3;

/// Host UI the pipeline renders into
pub trait PopupView: Send + Sync {
    /// Replace the content area; `markdown` is converted for display by the view
    fn render(&self, markdown: &str);

    /// Replace the status line; an empty string clears it
    fn set_status(&self, text: &str);

    /// Enable or disable the run, language and copy controls
    fn set_controls_enabled(&self, enabled: bool);
}

/// The status text shown on the `tick`-th update
pub fn loading_frame(message: &str, tick: usize) -> String {
    format!("{}{}", message, ".".repeat(tick % (MAX_DOTS + 1)))
}

/// Periodic status updater bound to one pipeline phase
pub struct StatusTicker {
    handle: Option<JoinHandle<()>>,
    message: String,
}

impl StatusTicker {
    /// Start updating `view`'s status every `period`, first update after one period
    pub fn start(view: Arc<dyn PopupView>, message: String, period: Duration) -> Self {
        let frame_message = message.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            let mut tick = 0usize;
            loop {
                interval.tick().await;
                view.set_status(&loading_frame(&frame_message, tick));
                tick = tick.wrapping_add(1);
            }
        });
        trace!(message = %message, "status ticker started");

        Self {
            handle: Some(handle),
            message,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stop the ticker at a phase boundary
    pub fn stop(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            trace!(message = %self.message, "status ticker stopped");
        }
    }
}

impl Drop for StatusTicker {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Something a [`RecordingView`] was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Render(String),
    Status(String),
    Controls(bool),
}

/// View that records every call, for tests and headless hosts
#[derive(Debug, Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: ViewEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn renders(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Render(content) => Some(content),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Status(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn last_render(&self) -> Option<String> {
        self.renders().pop()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl PopupView for RecordingView {
    fn render(&self, markdown: &str) {
        self.push(ViewEvent::Render(markdown.to_string()));
    }

    fn set_status(&self, text: &str) {
        self.push(ViewEvent::Status(text.to_string()));
    }

    fn set_controls_enabled(&self, enabled: bool) {
        self.push(ViewEvent::Controls(enabled));
    }
}
