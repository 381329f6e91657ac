//! Pipeline orchestration: export → spawn → ingest → annotate.
//!
//! [`Pipeline`] owns the persisted settings, the analyzer process slot and
//! the URL cursor, and exposes the entry points the embedding shell calls:
//! `page_load_finished` for the automatic trigger, `run_now` for the manual
//! affordance, `pump`/`wait_and_annotate` to drive an active run, and the
//! URL navigation helpers that apply the wrap rule and keep the cursor
//! persisted.
//!
//! Every error here is terminal for the current run only; after reporting,
//! the analyzer slot is back at `Idle` and the next trigger proceeds
//! normally.

use std::thread;
use std::time::{Duration, Instant};

use crate::annotate::{annotate, Annotation};
use crate::dump;
use crate::hunter::process::{AnalyzerError, AnalyzerEvent, AnalyzerManager, RunState};
use crate::hunter::result::{ingest, IngestError};
use crate::page::{Page, Ui};
use crate::settings::{Settings, SettingsError, SettingsResult};
use crate::urls::{UrlIterator, UrlsError};

/// Interval between completion polls while waiting on a run
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors surfaced by pipeline entry points
#[derive(Debug)]
pub enum PipelineError {
    /// A required configuration value is missing for an enabled feature
    Config(String),
    /// Starting the analyzer failed
    Analyzer(AnalyzerError),
    /// The result file could not be ingested
    Ingest(IngestError),
    /// Reading the URL list failed
    Urls(UrlsError),
    /// Writing the dump file failed
    Io(std::io::Error),
    /// Loading or saving persisted settings failed
    Settings(SettingsError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Config(msg) => write!(f, "Configuration error: {}", msg),
            PipelineError::Analyzer(err) => write!(f, "{}", err),
            PipelineError::Ingest(err) => write!(f, "{}", err),
            PipelineError::Urls(err) => write!(f, "{}", err),
            PipelineError::Io(err) => write!(f, "I/O error: {}", err),
            PipelineError::Settings(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Config(_) => None,
            PipelineError::Analyzer(err) => Some(err),
            PipelineError::Ingest(err) => Some(err),
            PipelineError::Urls(err) => Some(err),
            PipelineError::Io(err) => Some(err),
            PipelineError::Settings(err) => Some(err),
        }
    }
}

impl From<AnalyzerError> for PipelineError {
    fn from(err: AnalyzerError) -> Self {
        PipelineError::Analyzer(err)
    }
}

impl From<IngestError> for PipelineError {
    fn from(err: IngestError) -> Self {
        PipelineError::Ingest(err)
    }
}

impl From<UrlsError> for PipelineError {
    fn from(err: UrlsError) -> Self {
        PipelineError::Urls(err)
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err)
    }
}

impl From<SettingsError> for PipelineError {
    fn from(err: SettingsError) -> Self {
        PipelineError::Settings(err)
    }
}

/// The export → spawn → ingest → annotate pipeline plus the URL cursor.
#[derive(Debug, Default)]
pub struct Pipeline {
    settings: Settings,
    analyzer: AnalyzerManager,
    urls: UrlIterator,
}

impl Pipeline {
    /// Build a pipeline from loaded settings; the URL cursor starts at the
    /// persisted position.
    pub fn new(settings: Settings) -> Self {
        let mut urls = UrlIterator::new();
        urls.set_cur(settings.iterator_cursor);
        Self {
            settings,
            analyzer: AnalyzerManager::new(),
            urls,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn analyzer(&self) -> &AnalyzerManager {
        &self.analyzer
    }

    pub fn urls(&self) -> &UrlIterator {
        &self.urls
    }

    /// Persist settings, syncing the iterator cursor first. Called at
    /// shutdown.
    pub fn save_settings(&mut self, path: impl AsRef<std::path::Path>) -> SettingsResult<()> {
        self.settings.iterator_cursor = self.urls.cur();
        self.settings.save(path)
    }

    /// (Re)load the URL list from the configured file.
    ///
    /// Called when the iterator feature is (re)enabled or its source file
    /// changes. The persisted cursor is re-applied and clamped by the load.
    pub fn reload_urls(&mut self) -> PipelineResult<usize> {
        if self.settings.iterator_file.is_empty() {
            return Err(PipelineError::Config("URL list file is not set".to_string()));
        }
        self.urls.set_cur(self.settings.iterator_cursor);
        let count = self.urls.load(&self.settings.iterator_file)?;
        self.settings.iterator_cursor = self.urls.cur();
        Ok(count)
    }

    /// Automatic trigger: the page finished loading.
    ///
    /// A no-op returning `Ok(false)` while the analyzer feature is
    /// disabled; otherwise exports the dump and starts the analyzer,
    /// returning `Ok(true)`. Failures are reported to the status area and
    /// returned.
    pub fn page_load_finished<P, U>(&mut self, page: &P, ui: &mut U) -> PipelineResult<bool>
    where
        P: Page + ?Sized,
        U: Ui + ?Sized,
    {
        if !self.settings.analyzer_enabled {
            return Ok(false);
        }
        match self.launch(page) {
            Ok(()) => Ok(true),
            Err(err) => {
                ui.set_status(&format!("Warning: {}", err));
                Err(err)
            }
        }
    }

    /// Manual "run now" affordance.
    ///
    /// Unlike the automatic trigger this surfaces a user-visible "not
    /// enabled" notice instead of no-oping.
    pub fn run_now<P, U>(&mut self, page: &P, ui: &mut U) -> PipelineResult<()>
    where
        P: Page + ?Sized,
        U: Ui + ?Sized,
    {
        match self.launch(page) {
            Ok(()) => Ok(()),
            Err(err) => {
                ui.set_status(&format!("Warning: {}", err));
                Err(err)
            }
        }
    }

    /// Export the dump, write it, and start the analyzer on it.
    fn launch<P: Page + ?Sized>(&mut self, page: &P) -> PipelineResult<()> {
        if !self.settings.analyzer_enabled {
            return Err(PipelineError::Analyzer(AnalyzerError::NotEnabled));
        }
        if self.settings.dump_path.is_empty() {
            return Err(PipelineError::Config("dump path is not set".to_string()));
        }

        dump::dump(page).write_to(&self.settings.dump_path)?;
        self.analyzer
            .start(true, &self.settings.analyzer_path, &self.settings.dump_path)?;
        Ok(())
    }

    /// Drive the analyzer one step without blocking.
    ///
    /// Output is forwarded to the Ui as advisory notifications. On success
    /// the result file is ingested and the page annotated; on failure the
    /// report is written to the status area and ingestion skipped. Either
    /// way the slot returns to `Idle`, ready for the next trigger.
    pub fn pump<P, U>(&mut self, page: &mut P, ui: &mut U) -> PipelineResult<Option<Annotation>>
    where
        P: Page + ?Sized,
        U: Ui + ?Sized,
    {
        let state = self.analyzer.pump(|event| match event {
            AnalyzerEvent::Stdout(line) | AnalyzerEvent::Stderr(line) => ui.analyzer_output(&line),
            AnalyzerEvent::Exited { .. } => {}
        });

        match state {
            RunState::Succeeded => {
                self.analyzer.reset();
                let result_file = dump::result_path(&self.settings.dump_path);
                match ingest(&result_file) {
                    Ok(result) => Ok(Some(annotate(page, ui, &result))),
                    Err(err) => {
                        ui.set_status(&format!("Warning: {}", err));
                        Err(PipelineError::Ingest(err))
                    }
                }
            }
            RunState::Failed => {
                ui.set_status(&self.analyzer.failure_report());
                self.analyzer.reset();
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    /// Pump until the current run finishes or `timeout` elapses.
    pub fn wait_and_annotate<P, U>(
        &mut self,
        page: &mut P,
        ui: &mut U,
        timeout: Duration,
    ) -> PipelineResult<Option<Annotation>>
    where
        P: Page + ?Sized,
        U: Ui + ?Sized,
    {
        let deadline = Instant::now() + timeout;
        loop {
            let annotation = self.pump(page, ui)?;
            if annotation.is_some() {
                return Ok(annotation);
            }
            if !self.analyzer.is_active() {
                return Ok(None);
            }
            if Instant::now() >= deadline {
                self.analyzer.force_close();
                ui.set_status("Warning: analyzer timed out");
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Advance to the next URL, wrapping past the end of the list.
    ///
    /// Returns `None` while the iterator feature is disabled or the list is
    /// empty. The cursor is synced into the settings for persistence.
    pub fn next_url(&mut self) -> Option<String> {
        if !self.settings.iterator_enabled {
            return None;
        }
        let index = self.urls.next();
        let index = self.reclamp(index);
        self.settings.iterator_cursor = self.urls.cur();
        self.urls.url_at(index).map(str::to_string)
    }

    /// Retreat to the previous URL, wrapping before the start of the list.
    pub fn prev_url(&mut self) -> Option<String> {
        if !self.settings.iterator_enabled {
            return None;
        }
        let index = self.urls.prev();
        let index = self.reclamp(index);
        self.settings.iterator_cursor = self.urls.cur();
        self.urls.url_at(index).map(str::to_string)
    }

    /// Caller-side clamp rule: an out-of-range index resets the cursor and
    /// refreshes the count from the actual list length.
    fn reclamp(&mut self, index: i64) -> usize {
        let count = self.urls.count() as i64;
        if index >= count {
            self.urls.set_count(self.urls.len());
            self.urls.set_cur(0);
            0
        } else if index < 0 {
            let last = self.urls.len().saturating_sub(1);
            self.urls.set_count(self.urls.len());
            self.urls.set_cur(last as i64);
            last
        } else {
            index as usize
        }
    }
}
