//! glyph-recog - multi-metric recognition of hand-drawn glyphs
//!
//! A drawn glyph is compared against a library of labeled reference glyphs by
//! three independent shape metrics (elastic alignment, angular features and
//! log-polar spatial histograms), and their rankings can be fused into one
//! answer. Reference glyphs are featurized once when the library is loaded.

pub mod alignment;
pub mod angular;
#[cfg(feature = "async")]
pub mod async_loader;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod fusion;
pub mod geometry;
pub mod glyph;
pub mod loader;
pub mod matcher;
pub mod recognizer;
pub mod session;
pub mod shape_context;
pub mod store;


// Re-export main types for convenience
#[cfg(feature = "async")]
pub use async_loader::{load_library_from_file_async, load_multiple_libraries_async};
pub use config::{FusionWeight, RecognizerConfig};
pub use error::{RecogError, RecogResult};
pub use glyph::{GlyphRecord, Point, Stroke, StrokeSet};
pub use loader::{load_library_from_file, parse_library, parse_strokes};
pub use matcher::{GlyphMatcher, MatcherKind, RankedResult};
pub use recognizer::{MatcherSelector, Recognizer, RecognizerDiagnostics};
pub use session::{InteractiveSession, QueryTicket};
pub use store::{StoreState, TemplateSet, TemplateStore};
