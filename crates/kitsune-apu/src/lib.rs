//! NES audio (APU) core.
//!
//! Two pulse channels, triangle, noise and the delta-modulation channel,
//! sequenced by the frame counter and combined through the console's
//! non-linear mixer. Output samples are decimated to 44.1 kHz and queued
//! in a mutex-guarded SPSC ring buffer ([`AudioBuffer`]) that the host
//! audio callback drains from its own thread; when the buffer is full,
//! new samples are dropped rather than blocking emulation.

mod apu;
mod buffer;
mod dmc;
mod envelope;
mod frame_counter;
mod length_counter;
mod noise;
mod pulse;
mod sweep;
mod timer;
mod triangle;

pub use apu::{Apu, SAMPLE_RATE};
pub use buffer::AudioBuffer;
pub use dmc::Dmc;
pub use envelope::Envelope;
pub use frame_counter::{FrameClock, FrameCounter};
pub use length_counter::LengthCounter;
pub use noise::Noise;
pub use pulse::Pulse;
pub use sweep::{PulseChannel, Sweep};
pub use timer::Timer;
pub use triangle::Triangle;
