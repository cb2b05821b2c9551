//! # Decode Error Types
//!
//! Error types for decoder sessions and frame-buffer memory management.

use thiserror::Error;

/// Errors that can occur while opening or driving a decode session.
#[derive(Error, Debug)]
pub enum DecodeError {
    // ========================================================================
    // Negotiation Errors
    // ========================================================================
    /// None of the caller's pixel formats can be produced by the decoder boundary.
    #[error("No acceptable pixel format in the caller's options")]
    NoAcceptableFormat,

    /// No registered memory provider supports the requested formats.
    #[error("No memory provider supports the requested formats")]
    NoMemoryProvider,

    /// Codec is not handled by the external decoder boundary.
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    /// Codec profile value has no entry in the profile table.
    #[error("Unsupported {codec} profile: {profile}")]
    UnsupportedProfile { codec: String, profile: i32 },

    /// Content protection scheme is not handled by the decoder boundary.
    #[error("Unsupported key system: {0}")]
    UnsupportedKeySystem(String),

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// Heap allocation for a frame buffer failed.
    #[error("Out of memory allocating {requested} bytes")]
    OutOfMemory { requested: usize },

    /// Provider could not bind to its backing allocator at construction.
    #[error("Memory provider is degraded: {0}")]
    ProviderDegraded(String),

    /// Hardware buffer pool refused or returned an unusable buffer.
    #[error("Hardware buffer allocation failed: {0}")]
    HardwareAllocation(String),

    // ========================================================================
    // External Decoder Errors
    // ========================================================================
    /// The decoder has no entry point for the requested operation.
    #[error("Decoder does not support {0}")]
    NotSupported(&'static str),

    /// The decoder rejected its initialization data.
    #[error("Decoder failed to open: {0}")]
    OpenFailed(String),

    /// The decoder rejected updated initialization data.
    #[error("Decoder failed to reconfigure: {0}")]
    ReconfigureFailed(String),

    /// The decoder reported an error while producing a picture.
    #[error("Decoder error: {0}")]
    Decoder(String),

    /// The decoder reported a picture without a frame buffer attached.
    #[error("Decoder returned a picture without a frame buffer")]
    MissingFrameBuffer,

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Operation requires an open session.
    #[error("Decode session is closed")]
    SessionClosed,

    /// Configuration failed validation.
    #[error("Invalid decoder configuration: {0}")]
    InvalidConfig(String),
}

impl DecodeError {
    /// Returns `true` if the error is a failure to agree on formats, codec or
    /// protection with the decoder. These are fatal to the session only.
    pub fn is_negotiation_error(&self) -> bool {
        matches!(
            self,
            DecodeError::NoAcceptableFormat
                | DecodeError::NoMemoryProvider
                | DecodeError::UnsupportedCodec(_)
                | DecodeError::UnsupportedProfile { .. }
                | DecodeError::UnsupportedKeySystem(_)
        )
    }

    /// Returns `true` if the error comes from exhausted or unavailable memory.
    ///
    /// The next decode attempt may succeed once buffers are released.
    pub fn is_resource_error(&self) -> bool {
        matches!(
            self,
            DecodeError::OutOfMemory { .. }
                | DecodeError::ProviderDegraded(_)
                | DecodeError::HardwareAllocation(_)
        )
    }
}

/// Result type for decode operations.
pub type Result<T> = std::result::Result<T, DecodeError>;
