//! Interval algebra for calendar agendas.
//!
//! This crate models appointments as labeled time intervals and derives new
//! agendas from them:
//! - `Interval` for a single span with overlap, intersect and union
//! - `IntervalSet` for intersecting agendas, merging overlaps and finding
//!   free time inside a bounding window
//!
//! It performs no I/O. Callers supply intervals (or agenda text) and decide
//! how to report lines that fail to parse.

pub mod diagnostics;
pub mod error;
pub mod interval;
pub mod interval_set;

pub use diagnostics::{DiagnosticSink, IgnoreDiagnostics, SkippedLine, SkippedLines};
pub use error::{AgendaError, AgendaResult};
pub use interval::{Instant, Interval};
pub use interval_set::IntervalSet;
