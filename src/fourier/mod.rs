//! Transform kernels: quarter-wave trig tables, scaled DCT-II/DCT-IV, and the
//! centered FFT pair built on top of them.

pub mod centered;
pub mod dct;
pub mod trig;

pub use centered::{fft_centered, ifft_centered};
pub use dct::{dct2, dct4};
pub use trig::quarter_wave;
