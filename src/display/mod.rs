//! Presentation layer: report rows grouped by section and an audit trace of
//! a variable's dependency tree. Reads metadata and cached values only;
//! nothing here affects evaluation.

pub use self::report::{node_rows, resolve_nodal, root_rows, system_rows, ReportRow};
pub use self::trace::format_trace;

mod report;
mod trace;
