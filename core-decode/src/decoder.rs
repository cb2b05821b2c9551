//! External decoder boundary.
//!
//! A decoder backend is anything implementing [`ExternalDecoder`]; the session
//! drives it through dynamic dispatch. During open the decoder receives a
//! [`FrameBufferCallback`] bound to the session's memory provider and calls it
//! whenever it needs somewhere to write a picture.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::codec::DecoderInitData;
use crate::memory::MemoryProvider;
use crate::types::{DecodeStatus, DecoderPicture, DemuxPacket};

/// Which optional entry points a decoder backend provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderCapabilities {
    pub open: bool,
    pub reconfigure: bool,
    pub add_data: bool,
    pub get_picture: bool,
    pub reset: bool,
    pub name: bool,
}

impl DecoderCapabilities {
    /// Every entry point present.
    pub const fn full() -> Self {
        Self {
            open: true,
            reconfigure: true,
            add_data: true,
            get_picture: true,
            reset: true,
            name: true,
        }
    }
}

impl Default for DecoderCapabilities {
    fn default() -> Self {
        Self::full()
    }
}

/// A video decoder backend.
///
/// Entry points the backend does not provide are declared through
/// [`ExternalDecoder::capabilities`]; the session never calls them.
pub trait ExternalDecoder: Send {
    /// Entry points this backend provides.
    fn capabilities(&self) -> DecoderCapabilities {
        DecoderCapabilities::full()
    }

    /// Human-readable backend name.
    fn name(&self) -> String {
        String::new()
    }

    /// Prepare to decode a stream. Returns `false` if the stream is rejected.
    fn open(&mut self, init: &DecoderInitData) -> bool;

    /// Apply new stream parameters without reopening.
    fn reconfigure(&mut self, _init: &DecoderInitData) -> bool {
        false
    }

    /// Queue one compressed packet. Returns `false` if it was not accepted.
    fn add_data(&mut self, packet: &DemuxPacket) -> bool;

    /// Produce the next picture, if any.
    ///
    /// When `picture.drain` is set the decoder must flush its queue and
    /// eventually report [`DecodeStatus::EndOfStream`].
    fn get_picture(&mut self, picture: &mut DecoderPicture) -> DecodeStatus;

    /// Drop all decoder state.
    fn reset(&mut self) {}
}

/// Frame-buffer source handed to the decoder at open.
#[derive(Clone)]
pub struct FrameBufferCallback {
    provider: Arc<dyn MemoryProvider>,
}

impl FrameBufferCallback {
    pub(crate) fn new(provider: Arc<dyn MemoryProvider>) -> Self {
        Self { provider }
    }

    /// Lease `picture.buffer_size` bytes into `picture.buffer`.
    ///
    /// Returns `false`, leaving `picture.buffer` empty, when the provider
    /// cannot allocate.
    pub fn get_frame_buffer(&self, picture: &mut DecoderPicture) -> bool {
        match self.provider.acquire_buffer(picture.buffer_size) {
            Ok(buffer) => {
                picture.buffer = Some(buffer);
                true
            }
            Err(e) => {
                warn!(
                    provider = self.provider.name(),
                    size = picture.buffer_size,
                    error = %e,
                    "Frame buffer request failed"
                );
                picture.buffer = None;
                false
            }
        }
    }
}

impl fmt::Debug for FrameBufferCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBufferCallback")
            .field("provider", &self.provider.name())
            .finish()
    }
}
