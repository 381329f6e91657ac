pub mod process;
pub mod result;

pub use process::{AnalyzerError, AnalyzerEvent, AnalyzerManager, AnalyzerResult, RunState};
pub use result::{
    AnnotationResult, IngestError, IngestResult, Item, JumpTo, ingest, DEFAULT_BORDER_COLOR,
    DEFAULT_BORDER_STYLE, DEFAULT_BORDER_WIDTH,
};
