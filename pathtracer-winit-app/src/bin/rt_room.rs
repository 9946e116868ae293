use anyhow::Context;
use pathtracer_crate_tools::settings::{AppSettings, DEFAULT_SETTINGS_FILE};
use pathtracer_winit_app::app::WinitApp;

fn main() -> anyhow::Result<()> {
    let settings_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_SETTINGS_FILE.to_string());
    let settings = AppSettings::load_or_default(&settings_path).context("failed to load settings")?;

    pathtracer_winit_app::init_env(&settings);
    log::info!("settings: {:?}", settings);

    WinitApp::run(settings)
}
