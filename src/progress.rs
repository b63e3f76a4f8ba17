//! Progress observability primitives.

pub mod event;
pub mod sink;

pub use event::{AttemptStatus, ProgressEvent, UnitId};
pub use sink::{NoopProgress, ProgressSink, RecordingProgress, TracingProgress};
