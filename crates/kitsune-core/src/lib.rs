//! NES emulation core: the system bus and subsystem integration.
//!
//! The bus owns the CPU, video, audio, input and mapper subsystems and is
//! the machine's clock: the host calls [`Bus::cycle`] in a loop, one call
//! per master tick (one video dot). The CPU runs on every third tick and
//! the audio unit on every sixth. A `true` return marks the frame
//! boundary, where a host typically presents its framebuffer and paces to
//! 60 Hz.
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │                       Bus                         │
//! │  ┌──────┐ ┌───────┐ ┌───────┐ ┌───────┐ ┌──────┐  │
//! │  │ CPU  │ │ Video │ │ Audio │ │ Input │ │Mapper│  │
//! │  │ 6502 │ │  PPU  │ │  APU  │ │       │ │      │  │
//! │  └──────┘ └───────┘ └───────┘ └───────┘ └──────┘  │
//! └──────┬────────┬──────────┬──────────▲─────────────┘
//!        │        │          │          │
//!   set_pixel  (60 Hz)   ring buffer  button
//!        ▼                   ▼          │
//!              host service (injected)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use kitsune_core::{Bus, Button, Controller, HostService};
//!
//! struct Host {
//!     framebuffer: Vec<u8>,
//! }
//!
//! impl HostService for Host {
//!     fn set_pixel(&mut self, color: u8, r: bool, g: bool, b: bool, x: u8, y: u8) {
//!         let (red, green, blue) = kitsune_core::rgb(color, r, g, b);
//!         let offset = (usize::from(y) * 256 + usize::from(x)) * 3;
//!         self.framebuffer[offset..offset + 3].copy_from_slice(&[red, green, blue]);
//!     }
//!
//!     fn button(&self, _controller: Controller, _button: Button) -> bool {
//!         false
//!     }
//! }
//!
//! let rom = std::fs::read("game.nes").expect("failed to read image");
//! let host = Host { framebuffer: vec![0; 256 * 240 * 3] };
//! let mut bus = Bus::new(&rom, host).expect("failed to initialise");
//! let audio = bus.audio_buffer(); // hand this to the audio callback
//!
//! loop {
//!     while !bus.cycle() {}
//!     // present the framebuffer, poll events, pace to vsync
//! }
//! ```

mod bus;
mod host;
mod input;

pub use bus::{Bus, EmulatorError, Interrupt};
pub use host::{Button, Controller, HostService};
pub use input::Input;

// The subsystem crates are part of the public surface (palette lookups,
// buffer handles, cartridge inspection).
pub use kitsune_apu::{AudioBuffer, SAMPLE_RATE};
pub use kitsune_mappers::{Cartridge, CartridgeError, Mapper};
pub use kitsune_ppu::{rgb, FRAME_HEIGHT, FRAME_WIDTH, PALETTE};
