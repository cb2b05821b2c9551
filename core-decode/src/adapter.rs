//! # Decoder Adapter
//!
//! Per-stream session driving an [`ExternalDecoder`] through
//! open, decode, retrieve, release and reset.
//!
//! ## Buffer discipline
//!
//! The session holds at most one delivered picture buffer. Retrieving picture
//! N releases the buffer of picture N-1 to the provider, so the decoder may
//! reuse a buffer one retrieval after handing it out, never sooner. A reset
//! drains the decoder's queue, releasing each drained buffer straight away,
//! then releases the held buffer before resetting the decoder.
//!
//! ```text
//! Closed ──open──▶ Opening ──ok──▶ Decoding ──reset──▶ Draining
//!   ▲                 │               │  ▲                 │
//!   └─────failed──────┘               │  └─────drained─────┘
//!   └─────────────close───────────────┘
//! ```

use std::sync::Arc;

use bridge_traits::process::ProcessInfo;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::codec::DecoderInitData;
use crate::config::DecoderConfig;
use crate::decoder::{ExternalDecoder, FrameBufferCallback};
use crate::error::{DecodeError, Result};
use crate::memory::{BufferId, MemoryBroker, MemoryProvider};
use crate::types::{
    display_size, CodecOptions, DecodeStatus, DecoderPicture, DemuxPacket, PictureFlags,
    PixelFormat, StreamInfo, VideoFormat, VideoPicture, DEFAULT_COLOR_MATRIX,
    DEFAULT_COLOR_RANGE,
};

/// Lifecycle state of a decode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Opening,
    Decoding,
    Draining,
}

/// Session-wide control flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodecControl {
    /// Ask the decoder to flush queued pictures
    pub drain: bool,
    /// Mark retrieved pictures as dropped
    pub drop: bool,
}

/// Outcome of [`DecoderAdapter::get_picture`].
#[derive(Debug)]
pub enum PictureOutcome {
    /// No picture is ready yet
    NoPicture,
    /// The decoder wants more packets
    NeedsData,
    /// A decoded picture
    Picture(VideoPicture),
    /// The decoder has returned every queued picture
    EndOfStream,
}

/// Pick the decoder-side formats the caller's options allow.
fn negotiate_formats(options: &CodecOptions) -> Result<Vec<VideoFormat>> {
    if options.accepts(PixelFormat::Yuv420p) {
        Ok(vec![VideoFormat::Yv12])
    } else {
        Err(DecodeError::NoAcceptableFormat)
    }
}

/// A decode session bound to one external decoder.
pub struct DecoderAdapter {
    session_id: Uuid,
    decoder: Box<dyn ExternalDecoder>,
    broker: Arc<MemoryBroker>,
    process_info: Arc<dyn ProcessInfo>,
    config: DecoderConfig,
    provider: Option<Arc<dyn MemoryProvider>>,
    formats: Vec<VideoFormat>,
    state: SessionState,
    width: u32,
    height: u32,
    display_aspect: f64,
    control: CodecControl,
    last_picture_buffer: Option<BufferId>,
}

impl DecoderAdapter {
    /// Create a closed session and report the decoder's name to the host.
    pub fn new(
        decoder: Box<dyn ExternalDecoder>,
        broker: Arc<MemoryBroker>,
        process_info: Arc<dyn ProcessInfo>,
        config: DecoderConfig,
    ) -> Self {
        let adapter = Self {
            session_id: Uuid::new_v4(),
            decoder,
            broker,
            process_info,
            config,
            provider: None,
            formats: Vec::new(),
            state: SessionState::Closed,
            width: 0,
            height: 0,
            display_aspect: 0.0,
            control: CodecControl::default(),
            last_picture_buffer: None,
        };

        if adapter.decoder.capabilities().name {
            let name = adapter.decoder.name();
            adapter.process_info.set_video_decoder_name(&name, false);
        }
        debug!(session = %adapter.session_id, "Created decode session");
        adapter
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Decoder name, empty if the decoder does not report one.
    pub fn name(&self) -> String {
        if self.decoder.capabilities().name {
            self.decoder.name()
        } else {
            String::new()
        }
    }

    /// Decoder name for error payloads.
    fn decoder_label(&self) -> String {
        let name = self.name();
        if name.is_empty() {
            "unnamed decoder".to_string()
        } else {
            name
        }
    }

    /// Current decoded picture size.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Display aspect ratio in use, `0.0` when unset.
    pub fn display_aspect(&self) -> f64 {
        self.display_aspect
    }

    /// Formats negotiated at open.
    pub fn formats(&self) -> &[VideoFormat] {
        &self.formats
    }

    /// Memory provider held by the open session.
    pub fn provider(&self) -> Option<&Arc<dyn MemoryProvider>> {
        self.provider.as_ref()
    }

    /// Buffer of the last delivered picture, still leased.
    pub fn held_buffer(&self) -> Option<BufferId> {
        self.last_picture_buffer
    }

    pub fn codec_control(&self) -> CodecControl {
        self.control
    }

    pub fn set_codec_control(&mut self, control: CodecControl) {
        debug!(session = %self.session_id, drain = control.drain, drop = control.drop, "Codec control changed");
        self.control = control;
    }

    // ========================================================================
    // Open / reconfigure
    // ========================================================================

    /// Open the session for `stream`.
    ///
    /// On failure the session is left closed and holds no provider. Opening
    /// an open session closes it first.
    pub fn open(&mut self, stream: &StreamInfo, options: &CodecOptions) -> Result<()> {
        if self.state != SessionState::Closed {
            self.close();
        }
        if !self.decoder.capabilities().open {
            return Err(DecodeError::NotSupported("open"));
        }

        self.state = SessionState::Opening;
        match self.try_open(stream, options) {
            Ok(provider) => {
                info!(
                    session = %self.session_id,
                    codec = stream.codec.as_str(),
                    width = stream.width,
                    height = stream.height,
                    provider = provider.name(),
                    "Decode session opened"
                );
                self.provider = Some(provider);
                self.state = SessionState::Decoding;
                Ok(())
            }
            Err(e) => {
                warn!(session = %self.session_id, error = %e, "Failed to open decode session");
                self.formats.clear();
                self.state = SessionState::Closed;
                Err(e)
            }
        }
    }

    fn try_open(
        &mut self,
        stream: &StreamInfo,
        options: &CodecOptions,
    ) -> Result<Arc<dyn MemoryProvider>> {
        let formats = negotiate_formats(options)?;
        let provider = self
            .broker
            .acquire_memory_provider(options)
            .ok_or(DecodeError::NoMemoryProvider)?;

        let init = self.init_data(stream, &formats, &provider)?;
        self.last_picture_buffer = None;

        if !self.decoder.open(&init) {
            return Err(DecodeError::OpenFailed(self.decoder_label()));
        }
        self.formats = formats;
        Ok(provider)
    }

    fn init_data(
        &mut self,
        stream: &StreamInfo,
        formats: &[VideoFormat],
        provider: &Arc<dyn MemoryProvider>,
    ) -> Result<DecoderInitData> {
        let init = DecoderInitData::from_stream(
            stream,
            formats,
            FrameBufferCallback::new(Arc::clone(provider)),
        )?;
        if let Some(session) = &stream.crypto_session {
            debug!(
                session = %self.session_id,
                key_system = ?session.key_system,
                session_id_len = session.session_id.len(),
                "Protected stream"
            );
        }

        self.display_aspect = if stream.aspect > 0.0 && !stream.forced_aspect {
            stream.aspect
        } else {
            0.0
        };
        self.width = stream.width;
        self.height = stream.height;
        self.process_info
            .set_video_dimensions(stream.width, stream.height);

        Ok(init)
    }

    /// Apply new stream parameters to the open decoder.
    pub fn reconfigure(&mut self, stream: &StreamInfo) -> Result<()> {
        if !self.decoder.capabilities().reconfigure {
            return Err(DecodeError::NotSupported("reconfigure"));
        }
        let provider = self.provider.clone().ok_or(DecodeError::SessionClosed)?;

        let formats = self.formats.clone();
        let init = self.init_data(stream, &formats, &provider)?;
        if !self.decoder.reconfigure(&init) {
            return Err(DecodeError::ReconfigureFailed(self.decoder_label()));
        }
        debug!(session = %self.session_id, width = stream.width, height = stream.height, "Decoder reconfigured");
        Ok(())
    }

    // ========================================================================
    // Decode
    // ========================================================================

    /// Forward a compressed packet. Returns whether the decoder accepted it.
    pub fn add_data(&mut self, packet: &DemuxPacket) -> Result<bool> {
        if !self.decoder.capabilities().add_data {
            return Err(DecodeError::NotSupported("add_data"));
        }
        if self.state == SessionState::Closed {
            return Err(DecodeError::SessionClosed);
        }
        Ok(self.decoder.add_data(packet))
    }

    /// Retrieve the next picture.
    ///
    /// Delivering a picture releases the buffer of the previously delivered
    /// one, so the returned plane addresses are valid until the next call.
    pub fn get_picture(&mut self) -> Result<PictureOutcome> {
        if !self.decoder.capabilities().get_picture {
            return Err(DecodeError::NotSupported("get_picture"));
        }
        let provider = self.provider.clone().ok_or(DecodeError::SessionClosed)?;

        let mut picture = DecoderPicture::request(self.control.drain);
        match self.decoder.get_picture(&mut picture) {
            DecodeStatus::NoPicture => Ok(PictureOutcome::NoPicture),
            DecodeStatus::NeedsData => Ok(PictureOutcome::NeedsData),
            DecodeStatus::EndOfStream => Ok(PictureOutcome::EndOfStream),
            DecodeStatus::Error => {
                error!(session = %self.session_id, "Decoder reported an error");
                Err(DecodeError::Decoder(self.decoder_label()))
            }
            DecodeStatus::Picture => self
                .deliver(&provider, picture)
                .map(PictureOutcome::Picture),
        }
    }

    fn deliver(
        &mut self,
        provider: &Arc<dyn MemoryProvider>,
        picture: DecoderPicture,
    ) -> Result<VideoPicture> {
        let Some(buffer) = picture.buffer.as_ref() else {
            error!(session = %self.session_id, "Decoder returned a picture without a frame buffer");
            return Err(DecodeError::MissingFrameBuffer);
        };
        let id = buffer.id();

        let (display_width, display_height) =
            display_size(picture.width, picture.height, self.display_aspect);
        let mut out = VideoPicture {
            buffer: Some(id),
            planes: picture.plane_offsets.map(|offset| buffer.plane(offset)),
            strides: picture.strides,
            width: picture.width,
            height: picture.height,
            display_width,
            display_height,
            pts: picture.pts,
            dts: None,
            color_range: DEFAULT_COLOR_RANGE,
            color_matrix: DEFAULT_COLOR_MATRIX,
            flags: PictureFlags {
                allocated: true,
                dropped: self.control.drop,
            },
            format: PixelFormat::Yuv420p,
            native: None,
        };
        provider.finalize(&mut out);

        if self.config.log_pictures {
            debug!(session = %self.session_id, pts = ?out.pts, buffer = %id, "GetPicture: picture");
        }

        if let Some(previous) = self.last_picture_buffer.take() {
            if previous != id {
                provider.release_buffer(previous);
            }
        }
        self.last_picture_buffer = Some(id);

        if picture.width != self.width || picture.height != self.height {
            self.width = picture.width;
            self.height = picture.height;
            self.process_info
                .set_video_dimensions(picture.width, picture.height);
        }

        Ok(out)
    }

    // ========================================================================
    // Reset / close
    // ========================================================================

    /// Drain the decoder and release every buffer the session holds.
    ///
    /// Blocks until the decoder reports end of stream. Decoder errors while
    /// draining are logged and the drain continues, so every queued buffer
    /// goes back to the provider before the decoder is reset.
    pub fn reset(&mut self) -> Result<()> {
        let caps = self.decoder.capabilities();
        if !caps.reset {
            return Ok(());
        }
        let Some(provider) = self.provider.clone() else {
            return Ok(());
        };

        debug!(session = %self.session_id, "Reset");
        self.state = SessionState::Draining;
        let drained = if caps.get_picture {
            self.drain(&provider)
        } else {
            0
        };

        if let Some(last) = self.last_picture_buffer.take() {
            provider.release_buffer(last);
        }
        self.decoder.reset();
        self.state = SessionState::Decoding;
        debug!(session = %self.session_id, drained, "Reset complete");
        Ok(())
    }

    fn drain(&mut self, provider: &Arc<dyn MemoryProvider>) -> usize {
        let mut drained = 0;
        loop {
            let mut picture = DecoderPicture::request(true);
            match self.decoder.get_picture(&mut picture) {
                DecodeStatus::EndOfStream => return drained,
                DecodeStatus::Picture => {
                    match picture.buffer {
                        Some(buffer) => provider.release_buffer(buffer.id()),
                        None => warn!(session = %self.session_id, "Drained picture has no frame buffer"),
                    }
                    drained += 1;
                }
                DecodeStatus::NoPicture | DecodeStatus::NeedsData => {}
                DecodeStatus::Error => {
                    warn!(session = %self.session_id, drained, "Decoder error while draining, continuing");
                }
            }
        }
    }

    /// Release the held buffer and the provider.
    pub fn close(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Some(last) = self.last_picture_buffer.take() {
                provider.release_buffer(last);
            }
            debug!(session = %self.session_id, provider = provider.name(), "Decode session closed");
        }
        self.last_picture_buffer = None;
        self.formats.clear();
        self.state = SessionState::Closed;
    }
}

impl Drop for DecoderAdapter {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiate_formats() {
        let options = CodecOptions::new([PixelFormat::Nv12, PixelFormat::Yuv420p]);
        assert_eq!(negotiate_formats(&options).unwrap(), vec![VideoFormat::Yv12]);

        let options = CodecOptions::new([PixelFormat::Nv12]);
        assert!(matches!(
            negotiate_formats(&options),
            Err(DecodeError::NoAcceptableFormat)
        ));
    }
}
