//! Player process information bridge.
//!
//! The decode core reports what it learns about the stream (decoder name,
//! decoded dimensions) to the host, which uses it for on-screen codec
//! information and to reconfigure the renderer when the picture size changes.

/// Receives decoder-side stream information.
///
/// Calls arrive on the decoding thread and must return quickly; hosts that
/// need to update UI state should hand the values off instead of blocking.
pub trait ProcessInfo: Send + Sync {
    /// Decoded picture dimensions changed (or were announced at open).
    fn set_video_dimensions(&self, width: u32, height: u32);

    /// Name of the active video decoder.
    fn set_video_decoder_name(&self, name: &str, is_hardware: bool);
}
