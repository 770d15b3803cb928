//! Object attribute memory (OAM).
//!
//! 256 bytes holding 64 sprite entries of four bytes each: Y position,
//! tile index (with a bank bit in 8×16 mode), attributes, X position.

use bitflags::bitflags;

bitflags! {
    /// Per-sprite attribute byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SpriteAttributes: u8 {
        /// Low bit of the sprite palette.
        const PALETTE_LO = 0b0000_0001;
        /// High bit of the sprite palette.
        const PALETTE_HI = 0b0000_0010;
        /// Behind-background priority (0 = in front).
        const PRIORITY = 0b0010_0000;
        /// Horizontal flip.
        const FLIP_HORIZONTAL = 0b0100_0000;
        /// Vertical flip.
        const FLIP_VERTICAL = 0b1000_0000;
    }
}

impl SpriteAttributes {
    /// Sprite palette index (0-3, offset by 4 into palette RAM).
    #[inline]
    #[must_use]
    pub fn palette(self) -> u8 {
        self.bits() & 0x03
    }

    /// Whether the sprite renders behind the background.
    #[inline]
    #[must_use]
    pub fn behind_background(self) -> bool {
        self.contains(Self::PRIORITY)
    }
}

/// One decoded OAM entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sprite {
    /// Y position of the top of the sprite.
    pub y: u8,
    /// Tile index; in 8×16 mode bit 0 selects the pattern bank.
    pub tile: u8,
    /// Attribute byte.
    pub attributes: SpriteAttributes,
    /// X position of the left of the sprite.
    pub x: u8,
}

impl Sprite {
    /// Decode a sprite from its four OAM bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            y: bytes[0],
            tile: bytes[1],
            attributes: SpriteAttributes::from_bits_truncate(bytes[2]),
            x: bytes[3],
        }
    }

    /// Pattern bank bit for 8×16 sprites ($0000 or $1000).
    #[inline]
    #[must_use]
    pub fn bank_addr(self) -> u16 {
        if self.tile & 0x01 != 0 { 0x1000 } else { 0x0000 }
    }

    /// Tile index with the bank bit stripped (8×16 mode).
    #[inline]
    #[must_use]
    pub fn tall_tile(self) -> u8 {
        self.tile & 0xFE
    }
}

/// Primary OAM: the 256-byte sprite table.
#[derive(Debug, Clone)]
pub struct Oam {
    data: [u8; 256],
}

impl Oam {
    /// Create OAM with all bytes zeroed.
    #[must_use]
    pub fn new() -> Self {
        Self { data: [0; 256] }
    }

    /// Read a byte by OAM address.
    #[inline]
    #[must_use]
    pub fn read(&self, addr: u8) -> u8 {
        self.data[addr as usize]
    }

    /// Write a byte by OAM address.
    #[inline]
    pub fn write(&mut self, addr: u8, data: u8) {
        self.data[addr as usize] = data;
    }

    /// Decode the sprite at the given entry index (0-63).
    #[must_use]
    pub fn sprite(&self, index: u8) -> Sprite {
        let base = usize::from(index) * 4;
        Sprite::from_bytes([
            self.data[base],
            self.data[base + 1],
            self.data[base + 2],
            self.data[base + 3],
        ])
    }

    /// Zero all entries.
    pub fn reset(&mut self) {
        self.data = [0; 256];
    }
}

impl Default for Oam {
    fn default() -> Self {
        Self::new()
    }
}
