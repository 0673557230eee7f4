/*! Per-resource capture state: tracking records and shadow diffing. */

pub mod record;
pub mod shadow;

pub use record::{MapAccess, MapMode, MapState, MapStatus, ResourceTrackingRecord, UsageHint};
pub use shadow::CaptureDelta;
