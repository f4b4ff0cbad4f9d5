//! # Shiptrack Common Library
//!
//! Shared code for the shiptrack services including:
//! - Canonical tracking result and event models
//! - Common error type
//! - Configuration loading and credential resolution
//! - Timestamp parsing utilities

pub mod config;
pub mod error;
pub mod models;
pub mod time;

pub use error::{Error, Result};
pub use models::{Modality, NormalizedTrackingResult, TrackingEvent};
