//! Per-dot NES video (PPU) core.
//!
//! Implements the 2C02-class video coprocessor: the 262×341 NTSC timing
//! grid, the background fetch/shift pipeline, sprite evaluation and
//! rendering, the v/t/x scroll register arithmetic, and the eight CPU-facing
//! register ports. The video reaches character memory, the live mirror
//! mode, the host pixel sink and the interrupt lines through the
//! [`VideoBus`] trait supplied by the integration layer.

mod oam;
mod palette;
mod ppu;
mod registers;
mod scroll;

pub use oam::{Oam, Sprite, SpriteAttributes};
pub use palette::{rgb, PALETTE};
pub use ppu::{Mirroring, Ppu, VideoBus};
pub use registers::{Ctrl, Mask, StatusReg};
pub use scroll::Scroll;

/// Frame width in pixels.
pub const FRAME_WIDTH: usize = 256;
/// Frame height in pixels.
pub const FRAME_HEIGHT: usize = 240;
