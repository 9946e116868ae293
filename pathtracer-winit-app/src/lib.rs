pub mod app;
pub mod render_thread;
pub mod room_scene;
pub mod winit_event_adapter;

use pathtracer_crate_tools::init_log::{init_log, panic_handler, parse_level_filter};
use pathtracer_crate_tools::settings::AppSettings;

/// 日志、panic 钩子以及 tracy
pub fn init_env(settings: &AppSettings) {
    std::panic::set_hook(Box::new(panic_handler));

    init_log(parse_level_filter(&settings.log_level));

    tracy_client::Client::start();
}
