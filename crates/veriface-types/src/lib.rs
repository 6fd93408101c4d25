pub mod types;

pub use types::{AppEvent, DetectionBox, ResultRecord, ResultStatus, TriggerMode};
