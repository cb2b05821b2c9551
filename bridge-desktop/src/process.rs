//! Desktop Process Information
//!
//! Records the most recent decoder name and video dimensions so the desktop
//! shell can render them in its codec-information overlay.

use bridge_traits::process::ProcessInfo;
use parking_lot::RwLock;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct VideoState {
    decoder_name: Option<String>,
    is_hardware: bool,
    dimensions: Option<(u32, u32)>,
}

/// In-memory [`ProcessInfo`] implementation.
#[derive(Debug, Default)]
pub struct DesktopProcessInfo {
    state: RwLock<VideoState>,
}

impl DesktopProcessInfo {
    /// Create an empty process-info recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last reported video dimensions.
    pub fn video_dimensions(&self) -> Option<(u32, u32)> {
        self.state.read().dimensions
    }

    /// Last reported decoder name.
    pub fn video_decoder_name(&self) -> Option<String> {
        self.state.read().decoder_name.clone()
    }

    /// Whether the last reported decoder runs on dedicated hardware.
    pub fn is_hardware_decoder(&self) -> bool {
        self.state.read().is_hardware
    }
}

impl ProcessInfo for DesktopProcessInfo {
    fn set_video_dimensions(&self, width: u32, height: u32) {
        let mut state = self.state.write();
        if state.dimensions != Some((width, height)) {
            info!(width, height, "Video dimensions changed");
            state.dimensions = Some((width, height));
        }
    }

    fn set_video_decoder_name(&self, name: &str, is_hardware: bool) {
        let mut state = self.state.write();
        state.decoder_name = Some(name.to_string());
        state.is_hardware = is_hardware;
        info!(decoder = name, is_hardware, "Video decoder selected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_dimensions() {
        let info = DesktopProcessInfo::new();
        assert_eq!(info.video_dimensions(), None);

        info.set_video_dimensions(1920, 1080);
        assert_eq!(info.video_dimensions(), Some((1920, 1080)));

        info.set_video_dimensions(1280, 720);
        assert_eq!(info.video_dimensions(), Some((1280, 720)));
    }

    #[test]
    fn test_records_decoder_name() {
        let info = DesktopProcessInfo::new();
        info.set_video_decoder_name("addon-h264", false);

        assert_eq!(info.video_decoder_name().as_deref(), Some("addon-h264"));
        assert!(!info.is_hardware_decoder());
    }
}
