//! Mapper 30 (UNROM 512 subset): UxROM with character banking and a
//! one-screen mirror override.
//!
//! The single register packs `{program:5, character:2, one_screen:1}`.
//! The one-screen bit only takes effect when the cartridge header raised
//! the four-screen flag, which this board repurposes as a one-screen
//! request; bit 7 then selects the low or high bank.

use crate::mapper::{MapperState, Mirroring};

/// Mapper-30 register state.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Unrom512 {
    /// Packed bank register.
    bank: u8,
}

impl Unrom512 {
    pub fn power_on(state: &mut MapperState) -> Self {
        let mut unrom = Self::default();
        unrom.reset(state);
        unrom
    }

    pub fn reset(&mut self, state: &mut MapperState) {
        self.bank = 0;
        self.apply(state);
    }

    pub fn write_rom(&mut self, state: &mut MapperState, data: u8) {
        self.bank = data;
        self.apply(state);
    }

    fn apply(self, state: &mut MapperState) {
        state.set_prg_16k(0, usize::from(self.bank & 0x1F));
        state.set_prg_16k(1, state.last_prg_16k());
        state.set_chr_8k(usize::from((self.bank >> 5) & 0x03));

        if state.cartridge.header.four_screen {
            state.mirror = if self.bank & 0x80 != 0 {
                Mirroring::OneScreenHigh
            } else {
                Mirroring::OneScreenLow
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Cartridge;
    use crate::mapper::tests::build_mapper;
    use crate::mapper::Mapper;

    #[test]
    fn program_and_character_banks_switch() {
        let mut mapper = build_mapper(4, 0, 30);
        mapper.write_rom(0x8000, 0x02);
        assert_eq!(mapper.read_rom(0x8000), 2);
        assert_eq!(mapper.read_rom(0xC000), 3);
    }

    #[test]
    fn one_screen_override_requires_header_flag() {
        // Without the four-screen flag the mirror stays as declared.
        let mut mapper = build_mapper(2, 0, 30);
        let before = mapper.mirroring();
        mapper.write_rom(0x8000, 0x80);
        assert_eq!(mapper.mirroring(), before);
    }

    #[test]
    fn one_screen_override_with_header_flag() {
        let mut data = vec![0x4E, 0x45, 0x53, 0x1A, 2, 0];
        data.push(0xE8); // mapper 30 low nibble (0xE), four-screen
        data.push(0x10); // mapper 30 high nibble
        data.extend_from_slice(&[0; 8]);
        data.extend(std::iter::repeat(0).take(2 * 16 * 1024));

        let mut mapper = Mapper::new(Cartridge::new(&data).unwrap()).unwrap();
        mapper.write_rom(0x8000, 0x00);
        assert_eq!(mapper.mirroring(), Mirroring::OneScreenLow);
        mapper.write_rom(0x8000, 0x80);
        assert_eq!(mapper.mirroring(), Mirroring::OneScreenHigh);
    }
}
