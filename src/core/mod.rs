//! Core types shared by every hostship module.
//!
//! At the moment this is the error vocabulary: [`HostshipError`] for typed
//! failures, [`ErrorCategory`] for the coarse taxonomy used in logs, and
//! [`ErrorContext`]/[`user_friendly_error`] for terminal reporting.

pub mod error;

pub use error::{ErrorCategory, ErrorContext, HostshipError, user_friendly_error};
