pub mod control_panel;
pub mod error;
pub mod frame_driver;
pub mod gui_host;
pub mod gui_keymap;
pub mod path_tracer_pass;
