//! # Math Mentor Common Library
//!
//! Shared code for the Math Mentor services including:
//! - Event types (MentorEvent enum) and the EventBus
//! - Pipeline/review types carried by events
//! - Configuration loading
//! - Utility functions

pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
