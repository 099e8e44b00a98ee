//! Report generation from cached announcements.
//!
//! - `ReportProjector`: turns cached rows into keyed records
//! - `ReportFactory`: maps a format name to a `ReportWriter`

mod projector;
mod writer;

pub use projector::ReportProjector;
pub use writer::{JsonReport, ReportFactory, ReportWriter};
