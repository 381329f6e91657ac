//! VDOM Hunter - external page-analyzer pipeline.
//!
//! This crate provides:
//! - VDOM export of a page's serialized visible structure
//! - Lifecycle management for one external analyzer process at a time
//! - Lenient ingestion of the analyzer's JSON result file
//! - Page annotation (overlay boxes, group hover highlighting, summary)
//! - A bounded, persistent URL cursor for sequential browsing
//! - A persisted settings store shared by all of the above
//!
//! The embedding shell is modelled by the [`page::Page`] and [`page::Ui`]
//! traits; [`page::MockPage`] and [`page::MockUi`] are full recording
//! implementations.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use vdom_hunter::page::{MockPage, MockUi};
//! use vdom_hunter::pipeline::Pipeline;
//! use vdom_hunter::settings::Settings;
//!
//! let mut pipeline = Pipeline::new(Settings {
//!     analyzer_enabled: true,
//!     analyzer_path: "/usr/local/bin/findtitles".to_string(),
//!     dump_path: "/tmp/page.vdom".to_string(),
//!     ..Settings::default()
//! });
//!
//! let mut page = MockPage::with_structure(b"<root/>".to_vec());
//! let mut ui = MockUi::new();
//! pipeline.page_load_finished(&page, &mut ui).unwrap();
//! let annotation = pipeline
//!     .wait_and_annotate(&mut page, &mut ui, Duration::from_secs(60))
//!     .unwrap();
//! ```

pub mod annotate;
pub mod config;
pub mod dump;
pub mod hunter;
pub mod page;
pub mod pipeline;
pub mod settings;
pub mod urls;

// Re-export annotator types
pub use annotate::{annotate, group_class, Annotation, HoverBinding, FALLBACK_PROGRAM_LABEL, HIGHLIGHT_COLOR};

// Re-export exporter types
pub use dump::{dump, result_path, VdomDump, RESULT_SUFFIX};

// Re-export analyzer process and result types
pub use hunter::{
    ingest, AnalyzerError, AnalyzerEvent, AnalyzerManager, AnalyzerResult, AnnotationResult,
    IngestError, IngestResult, Item, JumpTo, RunState,
};

// Re-export collaborator traits and mocks
pub use page::{MockPage, MockUi, OverlayBox, OverlayHandle, Page, Ui};

// Re-export pipeline orchestration
pub use pipeline::{Pipeline, PipelineError, PipelineResult};

// Re-export persisted settings
pub use settings::{Settings, SettingsError, SettingsResult};

// Re-export the URL iterator
pub use urls::{UrlIterator, UrlsError, UrlsResult};
