//! # Video Decode Module
//!
//! Frame-buffer memory management and the decoder session state machine.
//!
//! ## Overview
//!
//! This module handles:
//! - Memory providers leasing reusable frame buffers (heap and hardware-backed)
//! - Provider selection by negotiated pixel format (`MemoryBroker`)
//! - Driving an external decoder through open, decode, reset and close
//!   while holding at most one delivered picture buffer (`DecoderAdapter`)
//! - Codec and profile mapping for the decoder boundary

pub mod adapter;
pub mod codec;
pub mod config;
pub mod decoder;
pub mod error;
pub mod memory;
pub mod types;

pub use adapter::{CodecControl, DecoderAdapter, PictureOutcome, SessionState};
pub use codec::{CodecProfile, DecoderInitData, VideoCodec};
pub use config::DecoderConfig;
pub use decoder::{DecoderCapabilities, ExternalDecoder, FrameBufferCallback};
pub use error::{DecodeError, Result};
pub use memory::{
    BufferId, FrameBuffer, HardwareMemoryProvider, MallocMemoryProvider, MemoryBroker,
    MemoryProvider, PoolStats,
};
pub use types::{
    CodecId, CodecOptions, DecodeStatus, DecoderPicture, DemuxPacket, PixelFormat, StreamInfo,
    VideoFormat, VideoPicture,
};
