//! Per-dot video pipeline.
//!
//! The video runs a 262-scanline × 341-dot NTSC grid: scanline -1 is the
//! prerender line, 0-239 are visible, 240 is post-render, 241 enters
//! vertical blank and 242-260 idle. Each [`Ppu::step`] call advances one
//! dot; completing scanline 260 signals the end of a frame.

use crate::oam::{Oam, Sprite, SpriteAttributes};
use crate::registers::{Ctrl, Mask, StatusReg};
use crate::scroll::Scroll;

/// Nametable mirroring mode.
///
/// Two physical 1 KB nametable banks tile the four 1 KB logical quadrants.
/// The mapper owns the live mode and may change it mid-frame; the video
/// queries it through [`VideoBus::mirroring`] on every access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mirroring {
    /// Banks 0,0,1,1 across the quadrants (vertical arrangement).
    #[default]
    Horizontal,
    /// Banks 0,1,0,1 across the quadrants (horizontal arrangement).
    Vertical,
    /// All quadrants map to bank 0.
    OneScreenLow,
    /// All quadrants map to bank 1.
    OneScreenHigh,
}

/// Bus services the video needs each dot: character memory, the live
/// mirror mode, the host pixel sink, and the two interrupt lines it drives.
pub trait VideoBus {
    /// Read character memory (pattern tables, $0000-$1FFF).
    fn chr_read(&mut self, addr: u16) -> u8;

    /// Write character memory (effective only for character-RAM carts).
    fn chr_write(&mut self, addr: u16, data: u8);

    /// Current nametable mirroring mode.
    fn mirroring(&self) -> Mirroring;

    /// Emit one pixel: a palette index (0-63) plus the emphasis bits.
    fn set_pixel(&mut self, color: u8, red: bool, green: bool, blue: bool, x: u8, y: u8);

    /// Raise the CPU's non-maskable interrupt (vertical-blank entry).
    fn non_maskable_interrupt(&mut self);

    /// Notify the mapper of the dot-260 scanline edge (MMC3 counter).
    fn mapper_interrupt(&mut self);
}

/// Background fetch latches and shift registers.
#[derive(Debug, Clone, Copy, Default)]
struct Background {
    /// Fetched tile index.
    tile: u8,
    /// Two-bit palette selector for the fetched tile.
    attribute: u8,
    /// Fetched pattern bytes.
    pattern_lo: u8,
    pattern_hi: u8,
    /// 16-bit shift registers; bit 15 - fine_x is the current pixel.
    shift_pattern_lo: u16,
    shift_pattern_hi: u16,
    shift_attr_lo: u16,
    shift_attr_hi: u16,
}

impl Background {
    /// Reload the low bytes of the shifters from the fetch latches.
    fn reload(&mut self) {
        self.shift_pattern_lo = (self.shift_pattern_lo & 0xFF00) | u16::from(self.pattern_lo);
        self.shift_pattern_hi = (self.shift_pattern_hi & 0xFF00) | u16::from(self.pattern_hi);
        self.shift_attr_lo = (self.shift_attr_lo & 0xFF00)
            | if self.attribute & 0x01 != 0 { 0x00FF } else { 0 };
        self.shift_attr_hi = (self.shift_attr_hi & 0xFF00)
            | if self.attribute & 0x02 != 0 { 0x00FF } else { 0 };
    }

    fn shift(&mut self) {
        self.shift_pattern_lo <<= 1;
        self.shift_pattern_hi <<= 1;
        self.shift_attr_lo <<= 1;
        self.shift_attr_hi <<= 1;
    }

    /// Current two-bit colour and palette selector under `fine_x`.
    fn pixel(&self, fine_x: u8) -> (u8, u8) {
        let mask = 0x8000_u16 >> fine_x;
        let color = (u8::from(self.shift_pattern_hi & mask != 0) << 1)
            | u8::from(self.shift_pattern_lo & mask != 0);
        let palette = (u8::from(self.shift_attr_hi & mask != 0) << 1)
            | u8::from(self.shift_attr_lo & mask != 0);
        (color, palette)
    }
}

/// One sprite evaluated onto the current scanline.
#[derive(Debug, Clone, Copy)]
struct LineSprite {
    /// The matched OAM entry.
    sprite: Sprite,
    /// X countdown; the sprite's patterns shift once it reaches zero.
    x: u8,
    pattern_lo: u8,
    pattern_hi: u8,
}

impl Default for LineSprite {
    fn default() -> Self {
        Self {
            sprite: Sprite::from_bytes([0xFF; 4]),
            x: 0xFF,
            pattern_lo: 0,
            pattern_hi: 0,
        }
    }
}

/// Sprite evaluation and render state for one scanline.
#[derive(Debug, Clone, Copy, Default)]
struct SpriteLine {
    sprites: [LineSprite; 8],
    count: u8,
    /// OAM entry 0 was copied onto this scanline.
    zero_found: bool,
    /// Sprite 0 produced the opaque sprite pixel on this dot.
    zero_rendered: bool,
}

/// The video coprocessor.
pub struct Ppu {
    ctrl: Ctrl,
    mask: Mask,
    status: StatusReg,
    scroll: Scroll,
    /// Buffered data-port read; also serves as the data latch backing the
    /// undriven low bits of the status port.
    read_buffer: u8,
    oam_addr: u8,
    oam: Oam,
    background: Background,
    sprites: SpriteLine,
    /// Current dot (0-340).
    dot: u16,
    /// Current scanline (-1 prerender through 260).
    scanline: i16,
    /// Two 1 KB nametable banks.
    nametables: [u8; 0x800],
    /// 32-byte palette RAM.
    palette: [u8; 32],
}

impl Ppu {
    /// Create a powered-on video core.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ctrl: Ctrl::empty(),
            mask: Mask::empty(),
            status: StatusReg::empty(),
            scroll: Scroll::new(),
            read_buffer: 0,
            oam_addr: 0,
            oam: Oam::new(),
            background: Background::default(),
            sprites: SpriteLine::default(),
            dot: 0,
            scanline: -1,
            nametables: [0; 0x800],
            palette: [0; 32],
        }
    }

    /// Reset to power-on state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Current scanline (-1 through 260).
    #[must_use]
    pub fn scanline(&self) -> i16 {
        self.scanline
    }

    /// Current dot (0-340).
    #[must_use]
    pub fn dot(&self) -> u16 {
        self.dot
    }

    /// Current VRAM address (`v`).
    #[must_use]
    pub fn vram_addr(&self) -> u16 {
        self.scroll.addr()
    }

    /// Temporary VRAM address (`t`).
    #[must_use]
    pub fn temp_vram_addr(&self) -> u16 {
        self.scroll.temp_addr()
    }

    /// Read a register port ($2000-$3FFF, decoded by address & 7).
    pub fn read_port(&mut self, bus: &mut impl VideoBus, addr: u16) -> u8 {
        match addr & 0x07 {
            // Status: the three driven bits plus the data latch, then the
            // vertical-blank flag and write toggle clear.
            2 => {
                let result = (self.status.bits() & 0xE0) | (self.read_buffer & 0x1F);
                self.status.remove(StatusReg::VBLANK);
                self.scroll.reset_toggle();
                result
            }

            // OAM data: no auto-increment on reads.
            4 => self.oam.read(self.oam_addr),

            // Data: buffered, except palette addresses which read through.
            7 => {
                let addr = self.scroll.addr() & 0x3FFF;
                let mut result = self.read_buffer;
                self.read_buffer = self.vram_read(bus, addr);
                if addr >= 0x3F00 {
                    result = self.read_buffer;
                }
                self.scroll.increment(self.ctrl.vram_increment());
                result
            }

            // Write-only ports read back the data latch.
            _ => self.read_buffer,
        }
    }

    /// Write a register port ($2000-$3FFF, decoded by address & 7).
    pub fn write_port(&mut self, bus: &mut impl VideoBus, addr: u16, data: u8) {
        match addr & 0x07 {
            0 => {
                self.ctrl = Ctrl::from_bits_truncate(data);
                self.scroll.write_control(data);
            }
            1 => self.mask = Mask::from_bits_truncate(data),
            // The status port is undriven on writes; the value lands in the
            // data latch.
            2 => self.read_buffer = data,
            3 => self.oam_addr = data,
            4 => {
                self.oam.write(self.oam_addr, data);
                if !self.status.contains(StatusReg::VBLANK) {
                    self.oam_addr = self.oam_addr.wrapping_add(1);
                }
            }
            5 => self.scroll.write_scroll(data),
            6 => self.scroll.write_addr(data),
            7 => {
                let addr = self.scroll.addr() & 0x3FFF;
                self.vram_write(bus, addr, data);
                self.scroll.increment(self.ctrl.vram_increment());
            }
            _ => unreachable!(),
        }
    }

    /// Read the 14-bit video address space.
    pub fn vram_read(&mut self, bus: &mut impl VideoBus, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => bus.chr_read(addr),
            0x2000..=0x3EFF => self.nametables[nametable_offset(bus.mirroring(), addr)],
            _ => self.palette[palette_offset(addr)],
        }
    }

    /// Write the 14-bit video address space.
    pub fn vram_write(&mut self, bus: &mut impl VideoBus, addr: u16, data: u8) {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => bus.chr_write(addr, data),
            0x2000..=0x3EFF => {
                self.nametables[nametable_offset(bus.mirroring(), addr)] = data;
            }
            _ => self.palette[palette_offset(addr)] = data,
        }
    }

    /// Read the video-OAM address space.
    #[must_use]
    pub fn oam_read(&self, addr: u8) -> u8 {
        self.oam.read(addr)
    }

    /// Write the video-OAM address space (OAM-DMA destination).
    pub fn oam_write(&mut self, addr: u8, data: u8) {
        self.oam.write(addr, data);
    }

    /// Advance one dot. Returns true when the frame completes (scanline 260
    /// wraps back to the prerender line).
    pub fn step(&mut self, bus: &mut impl VideoBus) -> bool {
        let rendering = self.mask.rendering_enabled();

        match self.scanline {
            -1..=239 => {
                if self.scanline == -1 && self.dot == 1 {
                    self.exit_vertical_blank();
                }

                match self.dot {
                    1..=256 | 321..=336 => {
                        if self.dot > 1 {
                            if self.mask.show_background() {
                                self.background.shift();
                            }
                            if self.dot <= 256 {
                                self.shift_sprites();
                            }
                        }
                        self.background_fetch(bus);
                        if self.dot == 256 && rendering {
                            self.scroll.increment_y();
                        }
                    }
                    257 => {
                        self.background.reload();
                        if rendering {
                            self.scroll.copy_horizontal();
                        }
                        if self.scanline >= 0 {
                            self.evaluate_sprites();
                            self.fetch_sprites(bus);
                        }
                    }
                    260 => {
                        if rendering {
                            bus.mapper_interrupt();
                        }
                    }
                    280..=304 => {
                        if self.scanline == -1 && rendering {
                            self.scroll.copy_vertical();
                        }
                    }
                    _ => {}
                }
            }
            241 => {
                if self.dot == 1 {
                    self.status.insert(StatusReg::VBLANK);
                    if self.ctrl.nmi_enabled() {
                        bus.non_maskable_interrupt();
                    }
                }
            }
            _ => {}
        }

        self.render_pixel(bus);

        self.dot += 1;
        if self.dot > 340 {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline > 260 {
                self.scanline = -1;
                return true;
            }
        }
        false
    }

    /// Prerender dot 1: clear the status flags and the sprite pipeline.
    fn exit_vertical_blank(&mut self) {
        self.status.remove(StatusReg::VBLANK | StatusReg::SPRITE_ZERO_HIT | StatusReg::SPRITE_OVERFLOW);
        for sprite in &mut self.sprites.sprites {
            sprite.pattern_lo = 0;
            sprite.pattern_hi = 0;
        }
    }

    /// The repeating 8-dot background fetch sequence.
    fn background_fetch(&mut self, bus: &mut impl VideoBus) {
        match (self.dot - 1) & 0x07 {
            0 => {
                self.background.reload();
                let addr = self.scroll.nametable_addr();
                self.background.tile = self.vram_read(bus, addr);
            }
            2 => {
                let addr = self.scroll.attribute_addr();
                let attribute = self.vram_read(bus, addr);
                self.background.attribute = self.scroll.attribute_quadrant(attribute);
            }
            4 => {
                let addr = self.ctrl.background_table_addr()
                    | (u16::from(self.background.tile) << 4)
                    | u16::from(self.scroll.fine_y());
                self.background.pattern_lo = self.vram_read(bus, addr);
            }
            6 => {
                let addr = self.ctrl.background_table_addr()
                    | (u16::from(self.background.tile) << 4)
                    | u16::from(self.scroll.fine_y());
                self.background.pattern_hi = self.vram_read(bus, addr + 8);
            }
            7 => {
                if self.mask.rendering_enabled() {
                    self.scroll.increment_x();
                }
            }
            _ => {}
        }
    }

    /// Count down sprite X positions; once a sprite is live its pattern
    /// bytes shift out one pixel per dot.
    fn shift_sprites(&mut self) {
        if !self.mask.show_sprites() {
            return;
        }
        for sprite in &mut self.sprites.sprites[..usize::from(self.sprites.count)] {
            if sprite.x == 0 {
                sprite.pattern_lo <<= 1;
                sprite.pattern_hi <<= 1;
            } else {
                sprite.x -= 1;
            }
        }
    }

    /// Dot-257 sprite evaluation: scan the 64 OAM entries against this
    /// scanline's Y range, keeping the first 8 matches. Entry 0 is tracked
    /// so the sprite-0-hit test can fire; a ninth match sets overflow.
    fn evaluate_sprites(&mut self) {
        self.status.remove(StatusReg::SPRITE_OVERFLOW);
        self.sprites = SpriteLine::default();

        for index in 0..64_u8 {
            let sprite = self.oam.sprite(index);
            let offset = self.scanline - i16::from(sprite.y);

            if offset >= 0 && offset < self.ctrl.sprite_height() {
                if self.sprites.count < 8 {
                    let slot = usize::from(self.sprites.count);
                    self.sprites.sprites[slot] = LineSprite {
                        sprite,
                        x: sprite.x,
                        pattern_lo: 0,
                        pattern_hi: 0,
                    };
                    self.sprites.count += 1;
                    if index == 0 {
                        self.sprites.zero_found = true;
                    }
                } else {
                    self.status.insert(StatusReg::SPRITE_OVERFLOW);
                    break;
                }
            }
        }
    }

    /// Fetch pattern bytes for the evaluated sprites, applying vertical
    /// flip to the row selection and horizontal flip by bit reversal.
    fn fetch_sprites(&mut self, bus: &mut impl VideoBus) {
        for slot in 0..usize::from(self.sprites.count) {
            let sprite = self.sprites.sprites[slot].sprite;
            let row = (self.scanline - i16::from(sprite.y)) as u16;
            let flip_v = sprite.attributes.contains(SpriteAttributes::FLIP_VERTICAL);

            let addr = if self.ctrl.sprite_height() == 16 {
                let tile = u16::from(sprite.tall_tile());
                let (first_half, fine) = if flip_v {
                    (row >= 8, (7 - (row & 0x07)) & 0x07)
                } else {
                    (row < 8, row & 0x07)
                };
                let tile = if first_half { tile } else { tile + 1 };
                sprite.bank_addr() | (tile << 4) | fine
            } else {
                let fine = if flip_v { 7 - (row & 0x07) } else { row & 0x07 };
                self.ctrl.sprite_table_addr() | (u16::from(sprite.tile) << 4) | fine
            };

            let mut lo = self.vram_read(bus, addr);
            let mut hi = self.vram_read(bus, addr + 8);
            if sprite.attributes.contains(SpriteAttributes::FLIP_HORIZONTAL) {
                lo = lo.reverse_bits();
                hi = hi.reverse_bits();
            }
            self.sprites.sprites[slot].pattern_lo = lo;
            self.sprites.sprites[slot].pattern_hi = hi;
        }
    }

    /// Mix the background and sprite pixels and emit to the host sink.
    fn render_pixel(&mut self, bus: &mut impl VideoBus) {
        let mut bg_color = 0_u8;
        let mut bg_palette = 0_u8;
        if self.mask.show_background() {
            let (color, palette) = self.background.pixel(self.scroll.fine_x());
            bg_color = color;
            bg_palette = palette;
        }

        let mut sprite_color = 0_u8;
        let mut sprite_palette = 0_u8;
        let mut sprite_in_front = false;
        self.sprites.zero_rendered = false;
        if self.mask.show_sprites() {
            for slot in 0..usize::from(self.sprites.count) {
                let entry = &self.sprites.sprites[slot];
                if entry.x != 0 {
                    continue;
                }
                let color = (u8::from(entry.pattern_hi & 0x80 != 0) << 1)
                    | u8::from(entry.pattern_lo & 0x80 != 0);
                if color != 0 {
                    sprite_color = color;
                    sprite_palette = entry.sprite.attributes.palette() + 4;
                    sprite_in_front = !entry.sprite.attributes.behind_background();
                    if slot == 0 {
                        self.sprites.zero_rendered = true;
                    }
                    break;
                }
            }
        }

        let (color, palette) = match (bg_color, sprite_color) {
            (0, 0) => (0, 0),
            (_, 0) => (bg_color, bg_palette),
            (0, _) => (sprite_color, sprite_palette),
            _ => {
                self.detect_sprite_zero_hit();
                if sprite_in_front {
                    (sprite_color, sprite_palette)
                } else {
                    (bg_color, bg_palette)
                }
            }
        };

        if (0..240).contains(&self.scanline) && (1..=256).contains(&self.dot) {
            let index = self.vram_read(bus, 0x3F00 + 4 * u16::from(palette) + u16::from(color));
            bus.set_pixel(
                index & 0x3F,
                self.mask.contains(Mask::EMPHASIZE_RED),
                self.mask.contains(Mask::EMPHASIZE_GREEN),
                self.mask.contains(Mask::EMPHASIZE_BLUE),
                (self.dot - 1) as u8,
                self.scanline as u8,
            );
        }
    }

    /// Set the sprite-0-hit flag when the stored OAM-0 sprite overlaps an
    /// opaque background pixel. Suppressed in the leftmost 8 pixels unless
    /// both leftmost-show mask bits are set.
    fn detect_sprite_zero_hit(&mut self) {
        if !(self.sprites.zero_found
            && self.sprites.zero_rendered
            && self.mask.show_background()
            && self.mask.show_sprites())
        {
            return;
        }

        let left_shown =
            self.mask.contains(Mask::BACKGROUND_LEFT) && self.mask.contains(Mask::SPRITE_LEFT);
        let low = if left_shown { 0 } else { 8 };
        if self.dot > low && self.dot <= 257 {
            self.status.insert(StatusReg::SPRITE_ZERO_HIT);
        }
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a nametable address (masked into $2000-$2FFF) onto the two physical
/// 1 KB banks under the given mirror mode.
fn nametable_offset(mirror: Mirroring, addr: u16) -> usize {
    let addr = addr & 0x0FFF;
    let bank = match mirror {
        Mirroring::Horizontal => (addr >> 11) & 1,
        Mirroring::Vertical => (addr >> 10) & 1,
        Mirroring::OneScreenLow => 0,
        Mirroring::OneScreenHigh => 1,
    };
    usize::from(bank) * 0x400 + usize::from(addr & 0x03FF)
}

/// Map a palette address into the 32-byte palette RAM. Entries $10/$14/
/// $18/$1C mirror the backdrop entries at $00/$04/$08/$0C.
fn palette_offset(addr: u16) -> usize {
    let addr = usize::from(addr & 0x1F);
    match addr {
        0x10 | 0x14 | 0x18 | 0x1C => addr - 0x10,
        _ => addr,
    }
}
