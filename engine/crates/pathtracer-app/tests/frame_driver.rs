use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use imgui::TextureId;
use pathtracer_app::error::StartupError;
use pathtracer_app::frame_driver::{FrameDriver, FramePhase};
use pathtracer_app::path_tracer_pass::RtScene;
use pathtracer_crate_tools::settings::AppSettings;
use pathtracer_gfx::command_buffer::GfxCommand;
use pathtracer_gfx::device::{GfxBackend, GfxCapabilities, GfxDevice};
use pathtracer_gfx::handles::GfxTextureHandle;
use pathtracer_gfx::headless::HeadlessGfx;
use pathtracer_gfx::resources::{GfxBufferDesc, GfxTextureDesc};
use pathtracer_gfx::vk;
use pathtracer_platform::input_event::InputEvent;
use pathtracer_render_interface::sample_sequence::SampleSequence;
use pathtracer_render_interface::world_info::WorldInfo;

const DT: Duration = Duration::from_millis(16);

/// 同一进程内只能存在一个 imgui context
static IMGUI_LOCK: Mutex<()> = Mutex::new(());

fn lock() -> MutexGuard<'static, ()> {
    IMGUI_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

fn settings(target_samples: u32, show_output_preview: bool) -> AppSettings {
    AppSettings {
        width: 64,
        height: 32,
        target_samples,
        show_output_preview,
        ..Default::default()
    }
}

fn texture_desc(width: u32, height: u32, name: &str) -> GfxTextureDesc {
    GfxTextureDesc {
        extent: vk::Extent2D { width, height },
        format: vk::Format::B8G8R8A8_SRGB,
        usage: vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST,
        name: name.to_string(),
    }
}

/// present target 与 tlas 由调用方创建
fn prepare(gfx: &mut HeadlessGfx) -> (GfxTextureHandle, RtScene) {
    let present = gfx.create_texture(&texture_desc(64, 32, "present"), None).unwrap();
    let tlas = gfx.create_buffer(&GfxBufferDesc::new_constant_buffer(64, "tlas")).unwrap();
    (present, RtScene::new(tlas))
}

fn driver(settings: &AppSettings) -> FrameDriver<HeadlessGfx> {
    let mut gfx = HeadlessGfx::new(GfxBackend::Vulkan);
    let (present, scene) = prepare(&mut gfx);
    FrameDriver::new(gfx, settings, present, scene).unwrap()
}

fn uploaded_world_info(driver: &FrameDriver<HeadlessGfx>) -> WorldInfo {
    let bytes = driver.device().buffer_data(driver.world_info_buffer()).unwrap();
    bytemuck::pod_read_unaligned(bytes)
}

fn last_commands(driver: &FrameDriver<HeadlessGfx>) -> Vec<GfxCommand> {
    driver.device().last_submission().unwrap().commands().to_vec()
}

fn thumbnail_window(ui: &imgui::Ui, texture_id: TextureId) {
    ui.window("thumbnail")
        .position([0.0, 0.0], imgui::Condition::Always)
        .size([60.0, 30.0], imgui::Condition::Always)
        .build(|| {
            imgui::Image::new(texture_id, [16.0, 16.0]).build(ui);
        });
}

#[test]
fn accumulates_up_to_target() {
    let _guard = lock();
    let mut driver = driver(&settings(4, false));

    let reports: Vec<_> = (0..6).map(|_| driver.tick(DT, |_, _| {}).unwrap()).collect();

    let sample_indices: Vec<_> = reports.iter().map(|r| r.sample_index).collect();
    let dispatched: Vec<_> = reports.iter().map(|r| r.dispatched).collect();
    assert_eq!(sample_indices, [0, 1, 2, 3, 4, 4]);
    assert_eq!(dispatched, [true, true, true, true, false, false]);
    assert!(reports[0].reset);
    assert!(reports[1..].iter().all(|r| !r.reset));
    assert_eq!(reports[5].progress, 1.0);

    let stats = driver.device().stats();
    assert_eq!(stats.dispatches, 4);
    assert_eq!(stats.blits, 6);
    assert_eq!(stats.submits, 6);
    assert_eq!(driver.phase(), FramePhase::Idle);
    assert!(!driver.device().is_in_flight());

    let uploaded = uploaded_world_info(&driver);
    assert_eq!(uploaded.sample_index, 4);
    assert_eq!(uploaded.accumulation_factor, 0.2);
    assert_eq!(uploaded.frame_count, 6);
}

#[test]
fn parameter_change_restarts_accumulation() {
    let _guard = lock();
    let mut driver = driver(&settings(16, false));
    for _ in 0..3 {
        driver.tick(DT, |_, _| {}).unwrap();
    }

    driver.world_info_mut().roughness = 0.25;
    let report = driver.tick(DT, |_, _| {}).unwrap();
    assert!(report.reset);
    assert_eq!(report.sample_index, 0);
    assert!(report.dispatched);
    assert_eq!(uploaded_world_info(&driver).accumulation_factor, 1.0);

    // 相机矩阵不参与 fingerprint
    driver.world_info_mut().update_camera(32, 32);
    let report = driver.tick(DT, |_, _| {}).unwrap();
    assert!(!report.reset);
    assert_eq!(report.sample_index, 1);
}

#[test]
fn jitter_follows_frame_counter_after_cap() {
    let _guard = lock();
    let mut driver = driver(&settings(1, false));

    let mut offsets = Vec::new();
    for _ in 0..4 {
        let report = driver.tick(DT, |_, _| {}).unwrap();
        assert_eq!(driver.world_info().pixel_offset, SampleSequence::get(report.frame_id));
        offsets.push(driver.world_info().pixel_offset);
    }

    assert_eq!(driver.accum().sample_index(), 1);
    assert_ne!(offsets[2], offsets[3]);
}

#[test]
fn target_change_holds_then_resumes() {
    let _guard = lock();
    let mut driver = driver(&settings(8, false));
    for _ in 0..5 {
        driver.tick(DT, |_, _| {}).unwrap();
    }

    driver.set_target_samples(2);
    let report = driver.tick(DT, |_, _| {}).unwrap();
    assert!(!report.dispatched);
    assert_eq!(report.sample_index, 5);

    driver.set_target_samples(6);
    let report = driver.tick(DT, |_, _| {}).unwrap();
    assert!(report.dispatched);
    assert_eq!(report.sample_index, 5);
    assert!(!driver.tick(DT, |_, _| {}).unwrap().dispatched);
}

#[test]
fn ui_target_slider_value_is_applied() {
    let _guard = lock();
    let mut driver = driver(&settings(8, false));

    driver.tick(DT, |_, panel| *panel.target_samples = 3).unwrap();
    assert_eq!(driver.accum().target_samples(), 3);
}

#[test]
fn frame_command_order() {
    let _guard = lock();
    // 面板和预览图需要足够大的显示区域，否则会被 imgui 裁掉
    let settings = AppSettings {
        width: 1280,
        height: 720,
        ..settings(8, true)
    };
    let mut gfx = HeadlessGfx::new(GfxBackend::Vulkan);
    let present = gfx.create_texture(&texture_desc(1280, 720, "present"), None).unwrap();
    let tlas = gfx.create_buffer(&GfxBufferDesc::new_constant_buffer(64, "tlas")).unwrap();
    let mut driver = FrameDriver::new(gfx, &settings, present, RtScene::new(tlas)).unwrap();

    // 自动调整尺寸的窗口在第一帧不可见
    driver.tick_with_control_panel(DT).unwrap();
    let report = driver.tick_with_control_panel(DT).unwrap();
    assert!(!report.ui_aborted);
    assert_eq!(driver.frame_settings().present_format, vk::Format::B8G8R8A8_SRGB);

    let commands = last_commands(&driver);
    let position = |pred: &dyn Fn(&GfxCommand) -> bool| commands.iter().position(pred).unwrap();
    let update = position(&|c| matches!(c, GfxCommand::UpdateBuffer { .. }));
    let dispatch = position(&|c| matches!(c, GfxCommand::DispatchRays { width: 1280, height: 720, depth: 1 }));
    let blit = position(&|c| matches!(c, GfxCommand::Blit { .. }));
    let begin = position(&|c| matches!(c, GfxCommand::BeginRendering { load_op: vk::AttachmentLoadOp::LOAD, .. }));
    let draw = position(&|c| matches!(c, GfxCommand::DrawIndexed { .. }));
    let end = position(&|c| matches!(c, GfxCommand::EndRendering));
    assert!(update < dispatch && dispatch < blit && blit < begin && begin < draw && draw < end);

    assert_eq!(
        commands[blit],
        GfxCommand::Blit {
            src: driver.output_texture(),
            dst: driver.present_target(),
        }
    );

    // 第一个 UI draw 之前绑定的是字体的 resource set
    let font_bind = position(&|c| {
        matches!(
            c,
            GfxCommand::BindResourceSet { bind_point: vk::PipelineBindPoint::GRAPHICS, set, .. }
                if *set == driver.gui_pass().font_set()
        )
    });
    assert!(begin < font_bind && font_bind < draw);
    let first_graphics_bind = position(&|c| {
        matches!(
            c,
            GfxCommand::BindResourceSet {
                bind_point: vk::PipelineBindPoint::GRAPHICS,
                ..
            }
        )
    });
    assert_eq!(first_graphics_bind, font_bind);

    // 预览图通过 registry 的 resource set 绘制
    let preview_set = driver.texture_registry().resolve(driver.output_preview().unwrap()).unwrap();
    let preview_bind = position(&|c| {
        matches!(
            c,
            GfxCommand::BindResourceSet { bind_point: vk::PipelineBindPoint::GRAPHICS, set, .. }
                if *set == preview_set
        )
    });
    assert!(font_bind < preview_bind && preview_bind < end);
    assert!(
        commands[preview_bind..end]
            .iter()
            .any(|c| matches!(c, GfxCommand::DrawIndexed { .. }))
    );
}

#[test]
fn stale_texture_only_aborts_ui() {
    let _guard = lock();
    let mut driver = driver(&settings(128, false));

    let thumbnail = driver.device_mut().create_texture(&texture_desc(8, 8, "thumbnail"), None).unwrap();
    let texture_id = driver.bind_gui_texture(thumbnail).unwrap();

    driver.tick(DT, |ui, _| thumbnail_window(ui, texture_id)).unwrap();
    let report = driver.tick(DT, |ui, _| thumbnail_window(ui, texture_id)).unwrap();
    assert!(!report.ui_aborted);
    assert!(last_commands(&driver).iter().any(|c| matches!(c, GfxCommand::DrawIndexed { .. })));

    assert!(driver.unbind_gui_texture(thumbnail));
    driver.device_mut().destroy_texture(thumbnail);

    let report = driver.tick(DT, |ui, _| thumbnail_window(ui, texture_id)).unwrap();
    assert!(report.ui_aborted);
    assert!(report.dispatched);
    let commands = last_commands(&driver);
    assert!(commands.iter().any(|c| matches!(c, GfxCommand::Blit { .. })));
    assert!(!commands.iter().any(|c| matches!(c, GfxCommand::DrawIndexed { .. })));

    // 下一帧恢复正常
    let report = driver.tick(DT, |_, _| {}).unwrap();
    assert!(!report.ui_aborted);
    assert_eq!(report.sample_index, 3);

    // 重新绑定得到新的 TextureId
    let thumbnail = driver.device_mut().create_texture(&texture_desc(8, 8, "thumbnail"), None).unwrap();
    assert_ne!(driver.bind_gui_texture(thumbnail).unwrap(), texture_id);
}

#[test]
fn resize_keeps_accumulation() {
    let _guard = lock();
    let mut driver = driver(&settings(16, true));
    driver.tick_with_control_panel(DT).unwrap();
    driver.tick_with_control_panel(DT).unwrap();

    let old_preview = driver.output_preview().unwrap();
    let old_present = driver.present_target();
    let new_present = driver.device_mut().create_texture(&texture_desc(128, 48, "present"), None).unwrap();
    driver.resize(128, 48, new_present).unwrap();
    driver.device_mut().destroy_texture(old_present);

    assert_eq!(
        driver.device().texture_extent(driver.output_texture()),
        Some(vk::Extent2D { width: 128, height: 48 })
    );
    assert_eq!(driver.frame_settings().frame_extent, vk::Extent2D { width: 128, height: 48 });
    assert_eq!(driver.gui_host().io().display_size, [128.0, 48.0]);
    assert_ne!(driver.output_preview(), Some(old_preview));
    assert!(driver.texture_registry().resolve(old_preview).is_err());

    let report = driver.tick_with_control_panel(DT).unwrap();
    assert!(!report.reset);
    assert!(!report.ui_aborted);
    assert_eq!(report.sample_index, 2);
    assert!(last_commands(&driver).contains(&GfxCommand::DispatchRays {
        width: 128,
        height: 48,
        depth: 1
    }));

    // 最小化时尺寸为 0，忽略
    driver.resize(0, 0, new_present).unwrap();
    assert_eq!(driver.frame_settings().frame_extent, vk::Extent2D { width: 128, height: 48 });
}

#[test]
fn input_from_other_thread_reaches_ui() {
    let _guard = lock();
    let mut driver = driver(&settings(4, false));

    let sender = driver.input_sender();
    std::thread::spawn(move || {
        assert!(sender.send(InputEvent::MouseMoved {
            physical_position: [30.0, 20.0],
        }));
    })
    .join()
    .unwrap();

    driver.tick(DT, |_, _| {}).unwrap();
    assert_eq!(driver.gui_host().io().mouse_pos, [30.0, 20.0]);
}

#[test]
fn destroy_releases_everything_once() {
    let _guard = lock();
    let mut gfx = HeadlessGfx::new(GfxBackend::Vulkan);
    let (present, scene) = prepare(&mut gfx);
    let caller_owned = gfx.live_resource_count();

    let mut driver = FrameDriver::new(gfx, &settings(4, true), present, scene).unwrap();
    for _ in 0..3 {
        driver.tick_with_control_panel(DT).unwrap();
    }

    let (gfx, scene) = driver.destroy();
    assert_eq!(gfx.live_resource_count(), caller_owned);
    assert_eq!(gfx.stats().invalid_destroys, 0);
    assert!(scene.resources.is_empty());
}

#[test]
fn startup_rejects_unsupported_configuration() {
    let _guard = lock();

    let mut gfx = HeadlessGfx::new(GfxBackend::Vulkan);
    let (present, scene) = prepare(&mut gfx);
    let metal = AppSettings {
        backend: "metal".to_string(),
        ..settings(4, false)
    };
    assert!(matches!(
        FrameDriver::new(gfx, &metal, present, scene),
        Err(StartupError::UnsupportedBackend(name)) if name == "metal"
    ));

    let mut gfx = HeadlessGfx::new(GfxBackend::Vulkan);
    let (present, scene) = prepare(&mut gfx);
    let dx12 = AppSettings {
        backend: "directx12".to_string(),
        ..settings(4, false)
    };
    assert!(matches!(
        FrameDriver::new(gfx, &dx12, present, scene),
        Err(StartupError::UnsupportedBackend(_))
    ));

    let mut gfx = HeadlessGfx::with_capabilities(GfxCapabilities {
        ray_tracing: false,
        ..GfxCapabilities::new(GfxBackend::Vulkan)
    });
    let (present, scene) = prepare(&mut gfx);
    assert!(matches!(
        FrameDriver::new(gfx, &settings(4, false), present, scene),
        Err(StartupError::RayTracingUnsupported)
    ));
}
