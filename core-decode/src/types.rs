//! # Decode Types
//!
//! Data exchanged between the host, the decode session and the external
//! decoder: negotiation options, stream hints, compressed packets and the two
//! picture records (the decoder-side request and the host-side output).

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::memory::{BufferId, FrameBuffer, NativeBuffer, PlanePtr};

// ============================================================================
// Pixel formats and negotiation
// ============================================================================

/// Host-side pixel formats a caller can accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// Three-plane 4:2:0 YUV in CPU memory
    Yuv420p,
    /// Two-plane 4:2:0 YUV in CPU memory
    Nv12,
    /// 4:2:0 YUV in GPU-shared memory, described by a native buffer
    GpuShared,
}

/// Pixel formats a caller is prepared to receive, in order of preference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecOptions {
    pub formats: Vec<PixelFormat>,
}

impl CodecOptions {
    pub fn new(formats: impl IntoIterator<Item = PixelFormat>) -> Self {
        Self {
            formats: formats.into_iter().collect(),
        }
    }

    /// Whether `format` is among the accepted formats.
    pub fn accepts(&self, format: PixelFormat) -> bool {
        self.formats.contains(&format)
    }
}

/// Decoder-side picture layouts offered to the external decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoFormat {
    /// Planar 4:2:0, luma then two chroma planes
    Yv12,
}

// ============================================================================
// Stream hints
// ============================================================================

/// Codec of the compressed stream as reported by the demuxer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecId {
    H264,
    Hevc,
    Vp8,
    Vp9,
    Av1,
    Mpeg2,
}

impl CodecId {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodecId::H264 => "h264",
            CodecId::Hevc => "hevc",
            CodecId::Vp8 => "vp8",
            CodecId::Vp9 => "vp9",
            CodecId::Av1 => "av1",
            CodecId::Mpeg2 => "mpeg2",
        }
    }
}

/// Content protection scheme of an encrypted stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeySystem {
    None,
    Widevine,
    PlayReady,
    WisePlay,
}

/// Decryption session attached to a protected stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoSession {
    pub key_system: KeySystem,
    /// Opaque session identifier, only its length is logged
    pub session_id: Bytes,
}

/// Demuxer hints describing a video stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub codec: CodecId,
    /// Codec profile as reported by the demuxer, [`crate::codec::profiles`]
    pub profile: i32,
    pub width: u32,
    pub height: u32,
    /// Display aspect ratio, `0.0` when unknown
    pub aspect: f64,
    /// The aspect ratio was forced by the user rather than read from the stream
    pub forced_aspect: bool,
    /// Out-of-band codec configuration (SPS/PPS and similar)
    pub extra_data: Bytes,
    pub crypto_session: Option<CryptoSession>,
}

impl StreamInfo {
    pub fn new(codec: CodecId, width: u32, height: u32) -> Self {
        Self {
            codec,
            profile: crate::codec::profiles::UNKNOWN,
            width,
            height,
            aspect: 0.0,
            forced_aspect: false,
            extra_data: Bytes::new(),
            crypto_session: None,
        }
    }

    pub fn with_profile(mut self, profile: i32) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_aspect(mut self, aspect: f64, forced: bool) -> Self {
        self.aspect = aspect;
        self.forced_aspect = forced;
        self
    }

    pub fn with_extra_data(mut self, extra_data: impl Into<Bytes>) -> Self {
        self.extra_data = extra_data.into();
        self
    }

    pub fn with_crypto_session(mut self, session: CryptoSession) -> Self {
        self.crypto_session = Some(session);
        self
    }
}

/// One compressed packet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemuxPacket {
    pub data: Bytes,
    pub pts: Option<i64>,
    pub dts: Option<i64>,
    pub duration: Option<i64>,
}

impl DemuxPacket {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    pub fn with_pts(mut self, pts: i64) -> Self {
        self.pts = Some(pts);
        self
    }
}

// ============================================================================
// Decoder-side picture
// ============================================================================

/// Result of asking the external decoder for a picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// No picture is ready yet
    NoPicture,
    /// The decoder failed to produce a picture
    Error,
    /// The decoder is buffering and wants more packets
    NeedsData,
    /// A picture is ready
    Picture,
    /// Every queued picture has been returned
    EndOfStream,
}

/// Picture record filled in by the external decoder.
///
/// The adapter sets `drain`; the decoder sets `buffer_size`, obtains `buffer`
/// through the frame-buffer callback and fills in the layout fields.
#[derive(Debug, Default)]
pub struct DecoderPicture {
    pub drain: bool,
    pub buffer_size: usize,
    pub buffer: Option<FrameBuffer>,
    pub plane_offsets: [usize; 3],
    pub strides: [usize; 3],
    pub width: u32,
    pub height: u32,
    pub pts: Option<i64>,
}

impl DecoderPicture {
    pub(crate) fn request(drain: bool) -> Self {
        Self {
            drain,
            ..Self::default()
        }
    }
}

// ============================================================================
// Host-side picture
// ============================================================================

/// Colour range reported for every decoded picture.
pub const DEFAULT_COLOR_RANGE: u8 = 0;

/// Colour matrix reported for every decoded picture.
pub const DEFAULT_COLOR_MATRIX: u8 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PictureFlags {
    /// Picture memory comes from a provider lease
    pub allocated: bool,
    /// The host asked for this picture to be dropped
    pub dropped: bool,
}

/// Decoded picture handed to the renderer.
///
/// Plane addresses stay valid until the next picture is retrieved from the
/// same session, or until the session is reset or closed.
#[derive(Debug, Clone)]
pub struct VideoPicture {
    pub buffer: Option<BufferId>,
    pub planes: [Option<PlanePtr>; 3],
    pub strides: [usize; 3],
    pub width: u32,
    pub height: u32,
    pub display_width: u32,
    pub display_height: u32,
    pub pts: Option<i64>,
    pub dts: Option<i64>,
    pub color_range: u8,
    pub color_matrix: u8,
    pub flags: PictureFlags,
    pub format: PixelFormat,
    pub native: Option<NativeBuffer>,
}

impl Default for VideoPicture {
    fn default() -> Self {
        Self {
            buffer: None,
            planes: [None; 3],
            strides: [0; 3],
            width: 0,
            height: 0,
            display_width: 0,
            display_height: 0,
            pts: None,
            dts: None,
            color_range: DEFAULT_COLOR_RANGE,
            color_matrix: DEFAULT_COLOR_MATRIX,
            flags: PictureFlags::default(),
            format: PixelFormat::Yuv420p,
            native: None,
        }
    }
}

/// Display size for a `width`x`height` picture at `aspect`.
///
/// The display width is the height scaled by the aspect, rounded to even and
/// truncated to a multiple of 4. It never exceeds the decoded width; when it
/// would, the height is rescaled from the width instead. A non-positive
/// aspect leaves the decoded size unchanged.
pub fn display_size(width: u32, height: u32, aspect: f64) -> (u32, u32) {
    if aspect.is_nan() || aspect <= 0.0 {
        return (width, height);
    }

    let mut display_width = align4(f64::from(height) * aspect);
    let mut display_height = height;
    if display_width > width {
        display_width = width;
        display_height = align4(f64::from(width) / aspect);
    }
    (display_width, display_height)
}

fn align4(value: f64) -> u32 {
    let rounded = value.round_ties_even() as i64;
    (rounded & !3).clamp(0, i64::from(u32::MAX)) as u32
}
