pub mod accum;
pub mod frame_counter;
pub mod frame_settings;
pub mod sample_sequence;
pub mod world_info;
