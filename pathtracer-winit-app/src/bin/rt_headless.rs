//! 不创建窗口，直接在 headless 设备上跑固定帧数，用于检查累积和资源释放

use std::time::Duration;

use anyhow::Context;
use pathtracer_app::frame_driver::FrameDriver;
use pathtracer_crate_tools::settings::{AppSettings, DEFAULT_SETTINGS_FILE};
use pathtracer_gfx::device::{GfxBackend, GfxDevice};
use pathtracer_gfx::headless::HeadlessGfx;
use pathtracer_winit_app::room_scene;

fn main() -> anyhow::Result<()> {
    let settings_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_SETTINGS_FILE.to_string());
    let settings = AppSettings::load_or_default(&settings_path).context("failed to load settings")?;

    pathtracer_winit_app::init_env(&settings);

    let backend = GfxBackend::from_name(&settings.backend)
        .with_context(|| format!("unsupported backend: {}", settings.backend))?;
    let mut gfx = HeadlessGfx::new(backend);
    let present = room_scene::create_present_target(&mut gfx, backend, settings.width, settings.height)?;
    let scene = room_scene::create_room_scene(&mut gfx)?;
    let mut driver = FrameDriver::new(gfx, &settings, present, scene)?;

    let delta = Duration::from_millis(16);
    for _ in 0..settings.frames {
        let report = driver.tick_with_control_panel(delta)?;
        log::debug!(
            "frame {}: sample {} / {}, dispatched: {}",
            report.frame_id,
            report.sample_index,
            driver.accum().target_samples(),
            report.dispatched
        );
    }

    log::info!(
        "ran {} frames, accumulated {} samples",
        settings.frames,
        driver.accum().sample_index()
    );

    let (mut gfx, scene) = driver.destroy();
    scene.destroy(&mut gfx);
    gfx.destroy_texture(present);
    log::info!("headless stats: {:?}", gfx.stats());
    anyhow::ensure!(gfx.live_resource_count() == 0, "{} resources leaked", gfx.live_resource_count());

    Ok(())
}
