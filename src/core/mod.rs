pub mod color;
pub mod frame_scheduler;
pub mod projection;
pub mod region_sync;
pub mod time_code;
pub mod viewport;
pub mod waveform;
