//! Tracking core: dispatch, modality detection, and fallback synthesis

pub mod dispatcher;
pub mod fallback;
pub mod unified;

pub use dispatcher::Tracker;
pub use fallback::{generate_fallback, FallbackReason};
pub use unified::detect_modality;
