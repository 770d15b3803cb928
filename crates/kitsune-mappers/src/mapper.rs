//! Mapper dispatch layer.
//!
//! A [`Mapper`] owns the cartridge, the live mirror mode, and the bank
//! windows every variant banks through: one program-RAM offset, four 8 KB
//! program-ROM windows and eight 1 KB character windows. Per-variant
//! register state lives in a tagged [`MapperKind`]; reads go through the
//! shared windows, writes dispatch to the variant to move them.

use crate::cartridge::{Cartridge, CartridgeError};
use crate::cnrom::Cnrom;
use crate::gxrom::Gxrom;
use crate::mmc1::Mmc1;
use crate::mmc3::Mmc3;
use crate::nrom::Nrom;
use crate::unrom512::Unrom512;
use crate::uxrom::Uxrom;

/// Nametable mirroring mode, as the mapper drives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mirroring {
    /// Banks 0,0,1,1 across the four logical quadrants.
    #[default]
    Horizontal,
    /// Banks 0,1,0,1 across the four logical quadrants.
    Vertical,
    /// All quadrants map to bank 0.
    OneScreenLow,
    /// All quadrants map to bank 1.
    OneScreenHigh,
}

/// Size of one 8 KB program-ROM window.
pub(crate) const PRG_WINDOW: usize = 8 * 1024;
/// Size of one 1 KB character window.
pub(crate) const CHR_WINDOW: usize = 1024;

/// Shared mapper state the variants bank against.
#[derive(Debug, Clone)]
pub(crate) struct MapperState {
    /// The owned cartridge.
    pub cartridge: Cartridge,
    /// Live mirror mode; variants may rewrite it mid-frame.
    pub mirror: Mirroring,
    /// Byte offset of the program-RAM bank.
    pub prg_ram_offset: usize,
    /// Byte offsets of the four 8 KB program-ROM windows
    /// ($8000/$A000/$C000/$E000).
    pub prg_rom_offsets: [usize; 4],
    /// Byte offsets of the eight 1 KB character windows.
    pub chr_offsets: [usize; 8],
}

impl MapperState {
    /// Point the program-ROM windows at consecutive 8 KB slices starting
    /// from a 16 KB bank index, one pair of windows per 16 KB bank.
    pub fn set_prg_16k(&mut self, half: usize, bank: usize) {
        let banks = (self.cartridge.prg_rom_len() / (2 * PRG_WINDOW)).max(1);
        let base = (bank % banks) * 2 * PRG_WINDOW;
        self.prg_rom_offsets[half * 2] = base;
        self.prg_rom_offsets[half * 2 + 1] = base + PRG_WINDOW;
    }

    /// Point all four program-ROM windows at one 32 KB bank.
    pub fn set_prg_32k(&mut self, bank: usize) {
        let banks = (self.cartridge.prg_rom_len() / (4 * PRG_WINDOW)).max(1);
        let base = (bank % banks) * 4 * PRG_WINDOW;
        for (window, offset) in self.prg_rom_offsets.iter_mut().enumerate() {
            *offset = base + window * PRG_WINDOW;
        }
    }

    /// Index of the last 16 KB program bank.
    #[must_use]
    pub fn last_prg_16k(&self) -> usize {
        (self.cartridge.prg_rom_len() / (2 * PRG_WINDOW)).max(1) - 1
    }

    /// Point one 8 KB program-ROM window at an 8 KB bank index.
    pub fn set_prg_8k(&mut self, window: usize, bank: usize) {
        let banks = (self.cartridge.prg_rom_len() / PRG_WINDOW).max(1);
        self.prg_rom_offsets[window] = (bank % banks) * PRG_WINDOW;
    }

    /// Index of the last 8 KB program bank.
    #[must_use]
    pub fn last_prg_8k(&self) -> usize {
        (self.cartridge.prg_rom_len() / PRG_WINDOW).max(1) - 1
    }

    /// Point all eight character windows at one 8 KB bank.
    pub fn set_chr_8k(&mut self, bank: usize) {
        let banks = (self.cartridge.chr_len() / (8 * CHR_WINDOW)).max(1);
        let base = (bank % banks) * 8 * CHR_WINDOW;
        for (window, offset) in self.chr_offsets.iter_mut().enumerate() {
            *offset = base + window * CHR_WINDOW;
        }
    }

    /// Point four character windows at one 4 KB bank.
    pub fn set_chr_4k(&mut self, half: usize, bank: usize) {
        let banks = (self.cartridge.chr_len() / (4 * CHR_WINDOW)).max(1);
        let base = (bank % banks) * 4 * CHR_WINDOW;
        for window in 0..4 {
            self.chr_offsets[half * 4 + window] = base + window * CHR_WINDOW;
        }
    }

    /// Point one character window at a 1 KB bank index.
    pub fn set_chr_1k(&mut self, window: usize, bank: usize) {
        let banks = (self.cartridge.chr_len() / CHR_WINDOW).max(1);
        self.chr_offsets[window] = (bank % banks) * CHR_WINDOW;
    }
}

/// Per-variant register state.
#[derive(Debug, Clone)]
pub(crate) enum MapperKind {
    Nrom(Nrom),
    Mmc1(Mmc1),
    Uxrom(Uxrom),
    Cnrom(Cnrom),
    Mmc3(Mmc3),
    Unrom512(Unrom512),
    Gxrom(Gxrom),
}

/// The cartridge mapper: bank windows plus variant registers.
#[derive(Debug, Clone)]
pub struct Mapper {
    state: MapperState,
    kind: MapperKind,
}

impl Mapper {
    /// Build the mapper for a parsed cartridge.
    ///
    /// # Errors
    ///
    /// Returns [`CartridgeError::UnsupportedMapper`] for mapper ids with no
    /// implementation.
    pub fn new(cartridge: Cartridge) -> Result<Self, CartridgeError> {
        let mirror = cartridge.header.mirror;
        let mapper_id = cartridge.header.mapper;

        let mut state = MapperState {
            cartridge,
            mirror,
            prg_ram_offset: 0,
            prg_rom_offsets: [0; 4],
            chr_offsets: [0; 8],
        };

        let kind = match mapper_id {
            0 => MapperKind::Nrom(Nrom::power_on(&mut state)),
            1 => MapperKind::Mmc1(Mmc1::power_on(&mut state)),
            2 => MapperKind::Uxrom(Uxrom::power_on(&mut state)),
            3 => MapperKind::Cnrom(Cnrom::power_on(&mut state)),
            4 => MapperKind::Mmc3(Mmc3::power_on(&mut state)),
            30 => MapperKind::Unrom512(Unrom512::power_on(&mut state)),
            66 => MapperKind::Gxrom(Gxrom::power_on(&mut state)),
            id => return Err(CartridgeError::UnsupportedMapper(id)),
        };

        log::debug!("mapper {mapper_id} initialized");
        Ok(Self { state, kind })
    }

    /// The cartridge's mapper id.
    #[must_use]
    pub fn mapper_id(&self) -> u8 {
        self.state.cartridge.header.mapper
    }

    /// The live mirror mode.
    #[must_use]
    pub fn mirroring(&self) -> Mirroring {
        self.state.mirror
    }

    /// Borrow the owned cartridge.
    #[must_use]
    pub fn cartridge(&self) -> &Cartridge {
        &self.state.cartridge
    }

    /// Read program RAM ($6000-$7FFF).
    #[must_use]
    pub fn read_ram(&self, addr: u16) -> u8 {
        if !self.ram_enabled() {
            return 0;
        }
        let offset = self.state.prg_ram_offset + usize::from(addr & 0x1FFF);
        self.state.cartridge.prg_ram.get(offset).copied().unwrap_or(0)
    }

    /// Write program RAM ($6000-$7FFF).
    pub fn write_ram(&mut self, addr: u16, data: u8) {
        if !self.ram_writable() {
            return;
        }
        let offset = self.state.prg_ram_offset + usize::from(addr & 0x1FFF);
        if let Some(byte) = self.state.cartridge.prg_ram.get_mut(offset) {
            *byte = data;
        }
    }

    /// Read program ROM ($8000-$FFFF) through the 8 KB windows.
    #[must_use]
    pub fn read_rom(&self, addr: u16) -> u8 {
        let window = usize::from((addr >> 13) & 0x03);
        let offset = self.state.prg_rom_offsets[window] + usize::from(addr & 0x1FFF);
        self.state.cartridge.prg_rom.get(offset).copied().unwrap_or(0)
    }

    /// Write the program-ROM range; bank-register writes land here.
    pub fn write_rom(&mut self, addr: u16, data: u8) {
        match &mut self.kind {
            MapperKind::Nrom(_) => {}
            MapperKind::Mmc1(mmc1) => mmc1.write_rom(&mut self.state, addr, data),
            MapperKind::Uxrom(uxrom) => uxrom.write_rom(&mut self.state, data),
            MapperKind::Cnrom(cnrom) => cnrom.write_rom(&mut self.state, data),
            MapperKind::Mmc3(mmc3) => mmc3.write_rom(&mut self.state, addr, data),
            MapperKind::Unrom512(unrom) => unrom.write_rom(&mut self.state, data),
            MapperKind::Gxrom(gxrom) => gxrom.write_rom(&mut self.state, data),
        }
    }

    /// Read character memory ($0000-$1FFF) through the 1 KB windows.
    #[must_use]
    pub fn read_chr(&self, addr: u16) -> u8 {
        let window = usize::from((addr >> 10) & 0x07);
        let offset = self.state.chr_offsets[window] + usize::from(addr & 0x03FF);
        self.state.cartridge.chr.get(offset).copied().unwrap_or(0)
    }

    /// Write character memory; effective only on character-RAM carts.
    pub fn write_chr(&mut self, addr: u16, data: u8) {
        if !self.state.cartridge.chr_is_ram() {
            return;
        }
        let window = usize::from((addr >> 10) & 0x07);
        let offset = self.state.chr_offsets[window] + usize::from(addr & 0x03FF);
        if let Some(byte) = self.state.cartridge.chr.get_mut(offset) {
            *byte = data;
        }
    }

    /// The video's dot-260 scanline edge. Returns true when the variant
    /// raises a maskable interrupt (MMC3 counter underflow).
    pub fn scanline_interrupt(&mut self) -> bool {
        match &mut self.kind {
            MapperKind::Mmc3(mmc3) => mmc3.scanline(),
            _ => false,
        }
    }

    /// Reset the variant registers to their power-on banking.
    pub fn reset(&mut self) {
        self.state.mirror = self.state.cartridge.header.mirror;
        self.state.prg_ram_offset = 0;
        match &mut self.kind {
            MapperKind::Nrom(nrom) => nrom.reset(&mut self.state),
            MapperKind::Mmc1(mmc1) => mmc1.reset(&mut self.state),
            MapperKind::Uxrom(uxrom) => uxrom.reset(&mut self.state),
            MapperKind::Cnrom(cnrom) => cnrom.reset(&mut self.state),
            MapperKind::Mmc3(mmc3) => mmc3.reset(&mut self.state),
            MapperKind::Unrom512(unrom) => unrom.reset(&mut self.state),
            MapperKind::Gxrom(gxrom) => gxrom.reset(&mut self.state),
        }
    }

    /// Whether program RAM currently responds (MMC1/MMC3 can disable it).
    fn ram_enabled(&self) -> bool {
        match &self.kind {
            MapperKind::Mmc1(mmc1) => mmc1.ram_enabled(),
            MapperKind::Mmc3(mmc3) => mmc3.ram_enabled(),
            _ => true,
        }
    }

    /// Whether program RAM currently accepts writes (MMC3 adds a protect
    /// bit on top of the enable).
    fn ram_writable(&self) -> bool {
        match &self.kind {
            MapperKind::Mmc1(mmc1) => mmc1.ram_enabled(),
            MapperKind::Mmc3(mmc3) => mmc3.ram_writable(),
            _ => true,
        }
    }

    #[cfg(test)]
    pub(crate) fn kind(&self) -> &MapperKind {
        &self.kind
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn build_image(prg_banks: u8, chr_banks: u8, mapper: u8) -> Vec<u8> {
        let mut data = vec![0x4E, 0x45, 0x53, 0x1A];
        data.push(prg_banks);
        data.push(chr_banks);
        data.push(mapper << 4);
        data.push(mapper & 0xF0);
        data.extend_from_slice(&[0; 8]);
        // Tag every 16 KB program bank and 8 KB character bank with its
        // index so banking tests can see which bank a window hits.
        for bank in 0..prg_banks {
            data.extend(std::iter::repeat(bank).take(16 * 1024));
        }
        for bank in 0..chr_banks {
            data.extend(std::iter::repeat(0x80 | bank).take(8 * 1024));
        }
        data
    }

    pub(crate) fn build_mapper(prg_banks: u8, chr_banks: u8, mapper: u8) -> Mapper {
        let cartridge = Cartridge::new(&build_image(prg_banks, chr_banks, mapper)).unwrap();
        Mapper::new(cartridge).unwrap()
    }

    #[test]
    fn unknown_mapper_is_rejected() {
        let cartridge = Cartridge::new(&build_image(1, 1, 7)).unwrap();
        assert!(matches!(
            Mapper::new(cartridge),
            Err(CartridgeError::UnsupportedMapper(7))
        ));
    }

    #[test]
    fn program_ram_round_trips() {
        let mut mapper = build_mapper(1, 1, 0);
        mapper.write_ram(0x6000, 0x42);
        mapper.write_ram(0x7FFF, 0x43);
        assert_eq!(mapper.read_ram(0x6000), 0x42);
        assert_eq!(mapper.read_ram(0x7FFF), 0x43);
    }

    #[test]
    fn chr_rom_ignores_writes() {
        let mut mapper = build_mapper(1, 1, 0);
        let before = mapper.read_chr(0x0000);
        mapper.write_chr(0x0000, !before);
        assert_eq!(mapper.read_chr(0x0000), before);
    }

    #[test]
    fn chr_ram_accepts_writes() {
        let mut mapper = build_mapper(1, 0, 0);
        mapper.write_chr(0x1FFF, 0x77);
        assert_eq!(mapper.read_chr(0x1FFF), 0x77);
    }

    #[test]
    fn scanline_interrupt_is_a_no_op_for_simple_mappers() {
        let mut mapper = build_mapper(1, 1, 0);
        assert!(!mapper.scanline_interrupt());
    }
}
