//! Decode service tests
//!
//! This test suite verifies:
//! - Provider registration driven by feature flags and bridges
//! - Decoder configuration propagation into sessions
//! - Sessions sharing the service broker

use std::sync::Arc;

use bridge_desktop::{DesktopProcessInfo, SoftwareBufferAllocator};
use bridge_traits::time::{LogEntry, LogLevel, LoggerSink};
use bridge_traits::{
    BridgeError, HardwareBufferAllocator, HardwareBufferPool, PlaneLayout, ProcessInfo,
};
use core_decode::{
    CodecId, CodecOptions, DecodeStatus, DecoderConfig, DecoderInitData, DecoderPicture,
    DemuxPacket, ExternalDecoder, FrameBufferCallback, MallocMemoryProvider, MemoryProvider,
    PictureOutcome, PixelFormat, SessionState, StreamInfo,
};
use core_runtime::config::{CoreConfig, FeatureFlags};
use core_service::{bootstrap_desktop, CoreError, DecodeService};
use mockall::mock;
use mockall::predicate::eq;

mock! {
    Info {}

    impl ProcessInfo for Info {
        fn set_video_dimensions(&self, width: u32, height: u32);
        fn set_video_decoder_name(&self, name: &str, is_hardware: bool);
    }
}

/// Decoder that emits one 16x16 picture per packet.
struct PacketDecoder {
    callback: Option<FrameBufferCallback>,
    pending: usize,
}

impl PacketDecoder {
    fn boxed() -> Box<Self> {
        Box::new(Self {
            callback: None,
            pending: 0,
        })
    }
}

impl ExternalDecoder for PacketDecoder {
    fn name(&self) -> String {
        "packet".to_string()
    }

    fn open(&mut self, init: &DecoderInitData) -> bool {
        self.callback = Some(init.frame_buffers.clone());
        true
    }

    fn add_data(&mut self, _packet: &DemuxPacket) -> bool {
        self.pending += 1;
        true
    }

    fn get_picture(&mut self, picture: &mut DecoderPicture) -> DecodeStatus {
        if self.pending == 0 {
            return if picture.drain {
                DecodeStatus::EndOfStream
            } else {
                DecodeStatus::NeedsData
            };
        }
        let Some(callback) = self.callback.as_ref() else {
            return DecodeStatus::Error;
        };

        picture.buffer_size = 16 * 16 * 3 / 2;
        if !callback.get_frame_buffer(picture) {
            return DecodeStatus::Error;
        }
        self.pending -= 1;
        picture.plane_offsets = [0, 256, 320];
        picture.strides = [16, 8, 8];
        picture.width = 16;
        picture.height = 16;
        DecodeStatus::Picture
    }
}

struct RefusingAllocator;

impl HardwareBufferAllocator for RefusingAllocator {
    fn name(&self) -> &str {
        "refusing"
    }

    fn open_pool(
        &self,
        _layout: PlaneLayout,
        _width: u32,
        _height: u32,
    ) -> bridge_traits::error::Result<Arc<dyn HardwareBufferPool>> {
        Err(BridgeError::NotAvailable("no GPU-shared memory".to_string()))
    }
}

struct NullSink;

impl LoggerSink for NullSink {
    fn log(&self, _entry: LogEntry) -> bridge_traits::error::Result<()> {
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Trace
    }
}

fn desktop_config(features: FeatureFlags) -> CoreConfig {
    CoreConfig::builder()
        .process_info(Arc::new(DesktopProcessInfo::new()))
        .hardware_allocator(Arc::new(SoftwareBufferAllocator::new()))
        .features(features)
        .build()
        .unwrap()
}

fn yuv420p() -> CodecOptions {
    CodecOptions::new([PixelFormat::Yuv420p])
}

#[test]
fn test_software_service_has_only_heap_provider() {
    let service = DecodeService::new(
        desktop_config(FeatureFlags::default()),
        DecoderConfig::default(),
    )
    .unwrap();

    assert_eq!(service.broker().len(), 1);
    assert!(service.hardware_provider().is_none());
    assert_eq!(
        service
            .broker()
            .acquire_memory_provider(&yuv420p())
            .map(|p| p.name().to_string())
            .as_deref(),
        Some("malloc")
    );
}

#[test]
fn test_hardware_decode_registers_hardware_provider() {
    let service = DecodeService::new(
        desktop_config(FeatureFlags {
            enable_hardware_decode: true,
            enable_picture_logging: false,
        }),
        DecoderConfig::default(),
    )
    .unwrap();

    assert_eq!(service.broker().len(), 2);
    let hardware = service.hardware_provider().unwrap();
    assert!(!hardware.is_degraded());

    let selected = service
        .broker()
        .acquire_memory_provider(&CodecOptions::new([
            PixelFormat::GpuShared,
            PixelFormat::Yuv420p,
        ]))
        .unwrap();
    assert_eq!(selected.name(), "hardware");
}

#[test]
fn test_decoder_config_can_veto_hardware_provider() {
    let service = DecodeService::new(
        desktop_config(FeatureFlags {
            enable_hardware_decode: true,
            enable_picture_logging: false,
        }),
        DecoderConfig::software_only(),
    )
    .unwrap();

    assert!(service.hardware_provider().is_none());
    assert_eq!(service.broker().len(), 1);
}

#[test]
fn test_degraded_hardware_provider_stays_registered() {
    let config = CoreConfig::builder()
        .process_info(Arc::new(DesktopProcessInfo::new()))
        .hardware_allocator(Arc::new(RefusingAllocator))
        .enable_hardware_decode(true)
        .build()
        .unwrap();

    let service = DecodeService::new(config, DecoderConfig::default()).unwrap();
    assert!(service.hardware_provider().unwrap().is_degraded());
    assert_eq!(service.broker().len(), 2);
}

#[test]
fn test_picture_logging_flag_propagates() {
    let service = DecodeService::new(
        desktop_config(FeatureFlags {
            enable_hardware_decode: false,
            enable_picture_logging: true,
        }),
        DecoderConfig::default(),
    )
    .unwrap();

    assert!(service.decoder_config().log_pictures);
}

#[test]
fn test_invalid_decoder_config_fails_initialization() {
    let decoder_config = DecoderConfig {
        hardware_working_width: 0,
        ..DecoderConfig::default()
    };

    let result = DecodeService::new(desktop_config(FeatureFlags::default()), decoder_config);
    assert!(matches!(result, Err(CoreError::InitializationFailed(_))));
}

#[test]
fn test_inconsistent_config_is_rejected() {
    let config = CoreConfig {
        process_info: Arc::new(DesktopProcessInfo::new()),
        hardware_allocator: None,
        logger_sink: None,
        features: FeatureFlags {
            enable_hardware_decode: true,
            enable_picture_logging: false,
        },
    };

    let result = DecodeService::new(config, DecoderConfig::default());
    assert!(matches!(result, Err(CoreError::Runtime(_))));
}

#[test]
fn test_session_reports_to_process_info() {
    let mut info = MockInfo::new();
    info.expect_set_video_decoder_name()
        .withf(|name, is_hardware| name == "packet" && !*is_hardware)
        .times(1)
        .return_const(());
    info.expect_set_video_dimensions()
        .with(eq(16), eq(16))
        .times(1)
        .return_const(());

    let config = CoreConfig::builder()
        .process_info(Arc::new(info))
        .build()
        .unwrap();
    let service = DecodeService::new(config, DecoderConfig::default()).unwrap();

    let mut session = service.open_session(PacketDecoder::boxed());
    session
        .open(&StreamInfo::new(CodecId::H264, 16, 16), &yuv420p())
        .unwrap();
    assert_eq!(session.state(), SessionState::Decoding);
}

#[test]
fn test_sessions_use_service_broker() {
    let service = bootstrap_desktop(DecoderConfig::software_only()).unwrap();
    let heap = Arc::new(MallocMemoryProvider::new());
    let heap_dyn: Arc<dyn MemoryProvider> = Arc::clone(&heap) as Arc<dyn MemoryProvider>;
    service.register_provider(Arc::clone(&heap_dyn));

    let mut session = service.open_session(PacketDecoder::boxed());
    session
        .open(&StreamInfo::new(CodecId::H264, 16, 16), &yuv420p())
        .unwrap();
    assert!(Arc::ptr_eq(session.provider().unwrap(), &heap_dyn));

    for _ in 0..2 {
        assert!(session.add_data(&DemuxPacket::new(vec![0u8; 4])).unwrap());
        assert!(matches!(
            session.get_picture().unwrap(),
            PictureOutcome::Picture(_)
        ));
    }
    assert_eq!(heap.stats().used, 1);

    session.close();
    assert_eq!(heap.stats().used, 0);
    assert!(service.unregister_provider(&heap_dyn));
}

#[test]
fn test_logging_config_carries_host_sink() {
    let config = CoreConfig::builder()
        .process_info(Arc::new(DesktopProcessInfo::new()))
        .logger_sink(Arc::new(NullSink))
        .build()
        .unwrap();
    let service = DecodeService::new(config, DecoderConfig::default()).unwrap();
    assert!(service.logging_config().logger_sink.is_some());

    let service = bootstrap_desktop(DecoderConfig::software_only()).unwrap();
    assert!(service.logging_config().logger_sink.is_none());
}

#[test]
fn test_bootstrap_desktop_with_hardware() {
    let service = bootstrap_desktop(DecoderConfig::default()).unwrap();
    assert!(service.hardware_provider().is_some());
    assert_eq!(
        service
            .config()
            .hardware_allocator
            .as_ref()
            .map(|a| a.name()),
        Some("software")
    );
}
