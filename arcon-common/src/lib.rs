//! # ARCON Common Library
//!
//! Shared code for the Audio Reprocessing Console, including:
//! - Retry engine (resolver, deduplicator, store, validator, payload normalizer)
//! - Historical correction feed ingestion
//! - Edit sessions and per-section view state
//! - Configuration loading
//! - Error types

pub mod config;
pub mod error;
pub mod retry;
pub mod session;
pub mod view_state;

pub use error::{Error, Result};
pub use retry::{ClipKey, ClipTarget, RetryData, RetrySection, RetryTextEntry, Section};
pub use session::EditSession;
