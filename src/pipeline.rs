//! Pipeline controller
//!
//! One call to [`Pipeline::run`] is one user-triggered run:
//!
//! ```text
//! Idle → CacheCheck ─┬─ hit ─────────────────────────────────────────────→ Render → Idle
//!                    └─ miss → Detecting → Acquiring → Translating → Caching ┘
//! any phase → Failed → Render
//! ```
//!
//! Failures never escape `run`: the error's message becomes the rendered
//! content. Every run ends by rendering, clearing the status line and
//! re-enabling the view's controls.

use crate::broker::ModelBroker;
use crate::cache::{CacheEntry, ResultCache, Task};
use crate::error::{TranslateError, TranslateResult};
use crate::language::LanguageCode;
use crate::messages::{Localizer, keys};
use crate::model::Translator;
use crate::segment::{Segments, segment};
use crate::selection::SelectionSource;
use crate::status::{PopupView, STATUS_TICK, StatusTicker};
use crate::streaming::translate_segment;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    CacheCheck,
    Detecting,
    Acquiring,
    Translating,
    Caching,
    Failed,
    Render,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Full pipeline ran and the result was cached
    Translated,
    /// Output came from the result cache
    CacheHit,
    /// Nothing was selected
    NoSelection,
    /// The run failed; the error's message was rendered
    Failed(TranslateError),
    /// Another run was in progress; nothing happened
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// What was rendered at the end of the run
    pub content: String,
}

/// How long the "copied" status stays up
pub const COPIED_STATUS_DURATION: Duration = Duration::from_millis(1000);

/// Held for the duration of a run; releases the flag when dropped
struct RunGuard<'a> {
    running: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(running: &'a AtomicBool) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard { running })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Clipboard form of rendered content: trailing newlines replaced by one blank line
pub fn clipboard_text(content: &str) -> String {
    format!("{}\n\n", content.trim_end_matches('\n'))
}

pub struct Pipeline {
    broker: ModelBroker,
    cache: ResultCache,
    localizer: Arc<dyn Localizer>,
    view: Arc<dyn PopupView>,
    selection: Arc<dyn SelectionSource>,
    status_tick: Duration,
    running: AtomicBool,
    phase: Mutex<RunPhase>,
    content: Mutex<String>,
    copied_reset: Mutex<Option<JoinHandle<()>>>,
}

impl Pipeline {
    pub fn new(
        broker: ModelBroker,
        cache: ResultCache,
        localizer: Arc<dyn Localizer>,
        view: Arc<dyn PopupView>,
        selection: Arc<dyn SelectionSource>,
    ) -> Self {
        Self {
            broker,
            cache,
            localizer,
            view,
            selection,
            status_tick: STATUS_TICK,
            running: AtomicBool::new(false),
            phase: Mutex::new(RunPhase::Idle),
            content: Mutex::new(String::new()),
            copied_reset: Mutex::new(None),
        }
    }

    pub fn with_status_tick(mut self, period: Duration) -> Self {
        self.status_tick = period;
        self
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn phase(&self) -> RunPhase {
        self.phase.lock().map(|p| *p).unwrap_or(RunPhase::Idle)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Content rendered at the end of the last run
    pub fn last_content(&self) -> String {
        self.content.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Clipboard text for the last run's content; flashes the "copied" status
    ///
    /// The status is cleared after [`COPIED_STATUS_DURATION`] when a tokio
    /// runtime is available, or by the next run otherwise.
    pub fn copy_content(&self) -> String {
        let text = clipboard_text(&self.last_content());
        self.view.set_status(&self.localizer.message(keys::COPIED, &[]));

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let view = self.view.clone();
            let reset = handle.spawn(async move {
                tokio::time::sleep(COPIED_STATUS_DURATION).await;
                view.set_status("");
            });
            if let Ok(mut slot) = self.copied_reset.lock() {
                if let Some(previous) = slot.replace(reset) {
                    previous.abort();
                }
            }
        }
        text
    }

    fn cancel_copied_reset(&self) {
        if let Some(reset) = self.copied_reset.lock().ok().and_then(|mut slot| slot.take()) {
            reset.abort();
        }
    }

    fn enter(&self, phase: RunPhase) {
        if let Ok(mut current) = self.phase.lock() {
            debug!(from = %*current, to = %phase, "pipeline phase");
            *current = phase;
        }
    }

    fn ticker(&self, key: &str) -> StatusTicker {
        StatusTicker::start(self.view.clone(), self.localizer.message(key, &[]), self.status_tick)
    }

    /// Translate the current selection into `target_language`
    ///
    /// With `use_cache`, an identical previous task is answered from the
    /// result cache; without it the pipeline always runs and replaces the
    /// cache entry.
    pub async fn run(&self, target_language: &LanguageCode, use_cache: bool) -> RunReport {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            warn!("run requested while another run is in progress");
            return RunReport {
                outcome: RunOutcome::Busy,
                content: String::new(),
            };
        };

        info!(target_language = %target_language, use_cache, "run started");
        self.cancel_copied_reset();
        self.view.render("");
        self.view.set_status("");
        self.view.set_controls_enabled(false);

        let (outcome, content) = match self.execute(target_language, use_cache).await {
            Ok(done) => done,
            Err(e) => {
                self.enter(RunPhase::Failed);
                error!(error = ?e, "run failed");
                let content = e.to_string();
                (RunOutcome::Failed(e), content)
            }
        };

        self.enter(RunPhase::Render);
        self.view.render(&content);
        if let Ok(mut last) = self.content.lock() {
            *last = content.clone();
        }
        self.view.set_status("");
        self.view.set_controls_enabled(true);
        self.enter(RunPhase::Idle);

        info!(outcome = ?outcome, "run finished");
        RunReport { outcome, content }
    }

    async fn execute(
        &self,
        target_language: &LanguageCode,
        use_cache: bool,
    ) -> TranslateResult<(RunOutcome, String)> {
        let input = self.selection.selected_text().await.map_err(|e| {
            debug!(error = %e, "selection could not be read");
            TranslateError::SelectionBlocked(self.localizer.message(keys::INJECTION_BLOCKED, &[]))
        })?;

        if input.is_empty() {
            return Ok((
                RunOutcome::NoSelection,
                self.localizer.message(keys::NO_SELECTION, &[]),
            ));
        }

        self.enter(RunPhase::CacheCheck);
        let task = Task::new(&input, target_language.clone());
        if use_cache {
            match self.cache.lookup(&task).await {
                Ok(Some(output)) => {
                    info!("cache hit");
                    return Ok((RunOutcome::CacheHit, output));
                }
                Ok(None) => {}
                // The clear below replaces an unreadable slot
                Err(e) => warn!(error = %e, "cache slot unreadable, treating as a miss"),
            }
        }
        debug!("cache miss");
        self.cache.clear().await?;

        self.enter(RunPhase::Detecting);
        let ticker = self.ticker(keys::LOADING);
        let segments = segment(&input);
        let source_language = self.broker.detect_language(&input).await?;
        ticker.stop();

        self.enter(RunPhase::Acquiring);
        let ticker = self.ticker(keys::LOADING);
        let translator = self
            .broker
            .create_translator(&source_language, target_language)
            .await?;
        ticker.stop();

        self.enter(RunPhase::Translating);
        let ticker = self.ticker(keys::TRANSLATING);
        let output = self.translate_segments(translator.as_ref(), segments).await?;
        ticker.stop();

        self.enter(RunPhase::Caching);
        self.cache
            .put(CacheEntry {
                task,
                output_text: output.clone(),
            })
            .await?;

        Ok((RunOutcome::Translated, output))
    }

    /// Translate segments strictly in order, rendering after every update
    async fn translate_segments(
        &self,
        translator: &dyn Translator,
        segments: Segments<'_>,
    ) -> TranslateResult<String> {
        let mut output = String::new();

        for (index, seg) in segments.enumerate() {
            if !seg.is_translatable() {
                output.push_str(seg.text);
                self.view.render(&output);
                continue;
            }

            let finalized = output.as_str();
            let translated = translate_segment(translator, seg.text, |partial| {
                let mut frame = String::with_capacity(finalized.len() + partial.len());
                frame.push_str(finalized);
                frame.push_str(partial);
                self.view.render(&frame);
            })
            .await?;

            output.push_str(&translated);
            trace!(index, "segment translated");
        }

        Ok(output)
    }
}
