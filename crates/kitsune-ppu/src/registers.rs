//! PPU register images (control, mask, status).
//!
//! The video coprocessor exposes 8 memory-mapped ports at CPU addresses
//! $2000-$2007. These are the bit-level images behind ports 0-2.

use bitflags::bitflags;

bitflags! {
    /// Control register (port 0, write only).
    ///
    /// ```text
    /// 7  bit  0
    /// ---- ----
    /// VPHB SINN
    /// |||| ||||
    /// |||| ||++- Base nametable address
    /// |||| |+--- VRAM address increment per data-port access (0: +1, 1: +32)
    /// |||| +---- Sprite pattern table for 8×8 sprites (ignored in 8×16 mode)
    /// |||+------ Background pattern table
    /// ||+------- Sprite size (0: 8×8, 1: 8×16)
    /// |+-------- Master/slave select (unused)
    /// +--------- Generate an NMI at the start of vertical blank
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Ctrl: u8 {
        /// Nametable X bit (bit 0).
        const NAMETABLE_X = 0b0000_0001;
        /// Nametable Y bit (bit 1).
        const NAMETABLE_Y = 0b0000_0010;
        /// VRAM address increment (0: +1 across, 1: +32 down).
        const INCREMENT = 0b0000_0100;
        /// Sprite pattern table address (8×8 mode only).
        const SPRITE_TABLE = 0b0000_1000;
        /// Background pattern table address.
        const BACKGROUND_TABLE = 0b0001_0000;
        /// Sprite size (0: 8×8, 1: 8×16).
        const SPRITE_SIZE = 0b0010_0000;
        /// Master/slave select (unused on the console).
        const MASTER_SLAVE = 0b0100_0000;
        /// Generate NMI at vertical blank.
        const NMI_ENABLE = 0b1000_0000;
    }
}

impl Ctrl {
    /// VRAM address increment applied after each data-port access.
    #[inline]
    pub fn vram_increment(self) -> u16 {
        if self.contains(Self::INCREMENT) { 32 } else { 1 }
    }

    /// Sprite pattern table base address ($0000 or $1000).
    #[inline]
    pub fn sprite_table_addr(self) -> u16 {
        if self.contains(Self::SPRITE_TABLE) { 0x1000 } else { 0x0000 }
    }

    /// Background pattern table base address ($0000 or $1000).
    #[inline]
    pub fn background_table_addr(self) -> u16 {
        if self.contains(Self::BACKGROUND_TABLE) { 0x1000 } else { 0x0000 }
    }

    /// Sprite height in pixels (8 or 16).
    #[inline]
    pub fn sprite_height(self) -> i16 {
        if self.contains(Self::SPRITE_SIZE) { 16 } else { 8 }
    }

    /// Whether an NMI fires at vertical-blank entry.
    #[inline]
    pub fn nmi_enabled(self) -> bool {
        self.contains(Self::NMI_ENABLE)
    }
}

bitflags! {
    /// Mask register (port 1, write only).
    ///
    /// ```text
    /// 7  bit  0
    /// ---- ----
    /// BGRs bMmG
    /// |||| ||||
    /// |||| |||+- Greyscale
    /// |||| ||+-- Show background in leftmost 8 pixels
    /// |||| |+--- Show sprites in leftmost 8 pixels
    /// |||| +---- Show background
    /// |||+------ Show sprites
    /// ||+------- Emphasize red
    /// |+-------- Emphasize green
    /// +--------- Emphasize blue
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Mask: u8 {
        /// Greyscale mode.
        const GREYSCALE = 0b0000_0001;
        /// Show background in leftmost 8 pixels.
        const BACKGROUND_LEFT = 0b0000_0010;
        /// Show sprites in leftmost 8 pixels.
        const SPRITE_LEFT = 0b0000_0100;
        /// Show background.
        const BACKGROUND_SHOW = 0b0000_1000;
        /// Show sprites.
        const SPRITE_SHOW = 0b0001_0000;
        /// Emphasize red.
        const EMPHASIZE_RED = 0b0010_0000;
        /// Emphasize green.
        const EMPHASIZE_GREEN = 0b0100_0000;
        /// Emphasize blue.
        const EMPHASIZE_BLUE = 0b1000_0000;
    }
}

impl Mask {
    /// Whether rendering is enabled (background or sprites shown).
    #[inline]
    pub fn rendering_enabled(self) -> bool {
        self.intersects(Self::BACKGROUND_SHOW | Self::SPRITE_SHOW)
    }

    /// Whether background rendering is enabled.
    #[inline]
    pub fn show_background(self) -> bool {
        self.contains(Self::BACKGROUND_SHOW)
    }

    /// Whether sprite rendering is enabled.
    #[inline]
    pub fn show_sprites(self) -> bool {
        self.contains(Self::SPRITE_SHOW)
    }
}

bitflags! {
    /// Status register (port 2, read only). The low five bits are not
    /// driven; reads fill them from the data latch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StatusReg: u8 {
        /// More than 8 sprites matched a scanline.
        const SPRITE_OVERFLOW = 0b0010_0000;
        /// Opaque sprite-0 pixel overlapped an opaque background pixel.
        const SPRITE_ZERO_HIT = 0b0100_0000;
        /// Vertical blank in progress.
        const VBLANK = 0b1000_0000;
    }
}
