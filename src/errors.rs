//! Error Types
//!
//! This module defines the error types used by the post-processing core.
//!
//! # Overview
//!
//! The main error type [`PostFxError`] covers the per-effect failure modes:
//! - Precondition failures (backbuffer target, missing GPU programs or inputs)
//! - Persistent resource allocation failures
//! - Backend execution failures
//!
//! Precondition and allocation errors never escape a frame: the
//! [`PostProcessStack`](crate::renderer::graph::PostProcessStack) catches
//! them, logs a diagnostic and skips the failing effect. Only execution
//! errors are returned to the caller.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pulse_fx::errors::{PostFxError, Result};
//!
//! fn record() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the post-processing core.
#[derive(Error, Debug)]
pub enum PostFxError {
    // ========================================================================
    // Precondition Errors
    // ========================================================================
    /// The active color target is the swap-chain backbuffer, which cannot be
    /// both sampled and written by a multi-pass effect.
    #[error("{effect} requires an intermediate color texture, but the active target is the backbuffer")]
    BackbufferTarget {
        /// Name of the skipped effect
        effect: &'static str,
    },

    /// A GPU program required by an effect is not available in the backend.
    #[error("{effect} requires GPU program `{program}`, which is not loaded")]
    MissingProgram {
        /// Name of the skipped effect
        effect: &'static str,
        /// Name of the missing program
        program: &'static str,
    },

    /// A frame input required by an effect was not supplied.
    #[error("{effect} requires frame input `{input}`")]
    MissingInput {
        /// Name of the skipped effect
        effect: &'static str,
        /// Name of the missing input
        input: &'static str,
    },

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// The backend failed to allocate a persistent resource.
    #[error("Failed to allocate resource `{name}`: {reason}")]
    Allocation {
        /// Pool-qualified resource name
        name: String,
        /// Backend-provided reason
        reason: String,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// The backend failed to execute a pass graph.
    #[error("Pass graph execution failed: {0}")]
    Execution(String),
}

/// Alias for `Result<T, PostFxError>`.
pub type Result<T> = std::result::Result<T, PostFxError>;
