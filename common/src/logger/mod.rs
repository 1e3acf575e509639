//! Process-wide tracing setup and span helpers shared by every crate in the workspace.

mod init;
mod spans;
mod trace_id;

pub use init::{init_logger, init_logger_json};
pub use spans::{child_span, root_span};
pub use trace_id::TraceId;
