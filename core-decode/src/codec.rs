//! Codec and profile mapping for the external decoder boundary.
//!
//! Stream hints carry demuxer codec ids and numeric profile values; external
//! decoders only understand a closed set of codecs and profiles. Anything the
//! table does not name fails the open instead of falling back to a default.

use bytes::Bytes;
use serde::Serialize;

use crate::decoder::FrameBufferCallback;
use crate::error::{DecodeError, Result};
use crate::types::{CodecId, KeySystem, StreamInfo, VideoFormat};

/// Numeric profile values as reported by demuxers.
pub mod profiles {
    pub const UNKNOWN: i32 = -99;
    pub const H264_BASELINE: i32 = 66;
    pub const H264_MAIN: i32 = 77;
    pub const H264_EXTENDED: i32 = 88;
    pub const H264_HIGH: i32 = 100;
    pub const H264_HIGH_10: i32 = 110;
    pub const H264_HIGH_422: i32 = 122;
    pub const H264_HIGH_444_PREDICTIVE: i32 = 244;
}

/// Codecs the external decoder boundary can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VideoCodec {
    H264,
    Vp8,
    Vp9,
}

/// Codec profile understood by external decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CodecProfile {
    /// The codec has no profile distinctions the decoder cares about
    NotNeeded,
    /// The demuxer did not report a profile
    Unknown,
    H264Baseline,
    H264Main,
    H264Extended,
    H264High,
    H264High10,
    H264High422,
    H264High444Predictive,
}

/// Map a demuxer codec id and profile value to the decoder's vocabulary.
pub fn map_codec(codec: CodecId, profile: i32) -> Result<(VideoCodec, CodecProfile)> {
    match codec {
        CodecId::H264 => Ok((VideoCodec::H264, map_h264_profile(profile)?)),
        CodecId::Vp8 => Ok((VideoCodec::Vp8, CodecProfile::NotNeeded)),
        CodecId::Vp9 => Ok((VideoCodec::Vp9, CodecProfile::NotNeeded)),
        other => Err(DecodeError::UnsupportedCodec(other.as_str().to_string())),
    }
}

fn map_h264_profile(profile: i32) -> Result<CodecProfile> {
    let mapped = match profile {
        0 | profiles::UNKNOWN => CodecProfile::Unknown,
        profiles::H264_BASELINE => CodecProfile::H264Baseline,
        profiles::H264_MAIN => CodecProfile::H264Main,
        profiles::H264_EXTENDED => CodecProfile::H264Extended,
        profiles::H264_HIGH => CodecProfile::H264High,
        profiles::H264_HIGH_10 => CodecProfile::H264High10,
        profiles::H264_HIGH_422 => CodecProfile::H264High422,
        profiles::H264_HIGH_444_PREDICTIVE => CodecProfile::H264High444Predictive,
        other => {
            return Err(DecodeError::UnsupportedProfile {
                codec: CodecId::H264.as_str().to_string(),
                profile: other,
            })
        }
    };
    Ok(mapped)
}

/// Key systems the external decoder boundary can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DecoderKeySystem {
    None,
    Widevine,
    PlayReady,
}

fn map_key_system(key_system: KeySystem) -> Result<DecoderKeySystem> {
    match key_system {
        KeySystem::None => Ok(DecoderKeySystem::None),
        KeySystem::Widevine => Ok(DecoderKeySystem::Widevine),
        KeySystem::PlayReady => Ok(DecoderKeySystem::PlayReady),
        other => Err(DecodeError::UnsupportedKeySystem(format!("{:?}", other))),
    }
}

/// Decryption parameters passed to the decoder for a protected stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoInfo {
    pub key_system: DecoderKeySystem,
    pub session_id: Bytes,
}

/// Everything an external decoder needs to open or reconfigure.
#[derive(Debug, Clone)]
pub struct DecoderInitData {
    pub codec: VideoCodec,
    pub profile: CodecProfile,
    pub extra_data: Bytes,
    pub width: u32,
    pub height: u32,
    pub video_formats: Vec<VideoFormat>,
    pub crypto: Option<CryptoInfo>,
    /// Callback the decoder uses to obtain frame buffers
    pub frame_buffers: FrameBufferCallback,
}

impl DecoderInitData {
    /// Build init data from stream hints.
    pub fn from_stream(
        stream: &StreamInfo,
        formats: &[VideoFormat],
        frame_buffers: FrameBufferCallback,
    ) -> Result<Self> {
        let (codec, profile) = map_codec(stream.codec, stream.profile)?;

        let crypto = match &stream.crypto_session {
            Some(session) => Some(CryptoInfo {
                key_system: map_key_system(session.key_system)?,
                session_id: session.session_id.clone(),
            }),
            None => None,
        };

        Ok(Self {
            codec,
            profile,
            extra_data: stream.extra_data.clone(),
            width: stream.width,
            height: stream.height,
            video_formats: formats.to_vec(),
            crypto,
            frame_buffers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_h264_profile_table() {
        let cases = [
            (0, CodecProfile::Unknown),
            (profiles::UNKNOWN, CodecProfile::Unknown),
            (66, CodecProfile::H264Baseline),
            (77, CodecProfile::H264Main),
            (88, CodecProfile::H264Extended),
            (100, CodecProfile::H264High),
            (110, CodecProfile::H264High10),
            (122, CodecProfile::H264High422),
            (244, CodecProfile::H264High444Predictive),
        ];
        for (value, expected) in cases {
            assert_eq!(
                map_codec(CodecId::H264, value).unwrap(),
                (VideoCodec::H264, expected),
                "profile {}",
                value
            );
        }
    }

    #[test]
    fn test_unknown_h264_profile_fails() {
        let err = map_codec(CodecId::H264, 118).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedProfile { profile: 118, .. }));
    }

    #[test]
    fn test_vp_codecs_ignore_profile() {
        assert_eq!(
            map_codec(CodecId::Vp9, 2).unwrap(),
            (VideoCodec::Vp9, CodecProfile::NotNeeded)
        );
        assert_eq!(
            map_codec(CodecId::Vp8, 12345).unwrap(),
            (VideoCodec::Vp8, CodecProfile::NotNeeded)
        );
    }

    #[test]
    fn test_unsupported_codec() {
        let err = map_codec(CodecId::Hevc, 1).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedCodec(ref c) if c == "hevc"));
        assert!(err.is_negotiation_error());
    }

    #[test]
    fn test_key_system_mapping() {
        assert_eq!(map_key_system(KeySystem::Widevine).unwrap(), DecoderKeySystem::Widevine);
        assert_eq!(map_key_system(KeySystem::PlayReady).unwrap(), DecoderKeySystem::PlayReady);
        assert!(matches!(
            map_key_system(KeySystem::WisePlay),
            Err(DecodeError::UnsupportedKeySystem(_))
        ));
    }
}
