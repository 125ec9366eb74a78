//! Core types, FFT plans, windows, rings and biquads.

pub mod biquad;
pub mod fft;
pub mod ring_buffer;
pub mod types;
pub mod window;

pub use types::*;
pub use window::{apply_window, apply_window_into, generate_window, squared_window, WindowType};
