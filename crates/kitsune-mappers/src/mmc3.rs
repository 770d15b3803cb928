//! Mapper 4 (MMC3): fine-grained banking plus a scanline interrupt.
//!
//! Register ports come in even/odd pairs:
//!
//! - $8000/$8001: bank select `{register:3, prg_mode:1(bit 6),
//!   chr_inversion:1(bit 7)}` / bank data
//! - $A000/$A001: mirror select / program-RAM protect
//! - $C000/$C001: interrupt latch / counter reload
//! - $E000/$E001: interrupt disable / enable
//!
//! The scanline counter is clocked by the video at dot 260 of rendered
//! scanlines: a zero counter reloads from the latch, otherwise it
//! decrements, and reaching zero with interrupts enabled raises IRQ.

use crate::mapper::{MapperState, Mirroring};

/// Mapper-4 register state.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Mmc3 {
    /// Which bank register the next data write updates (0-7).
    bank_select: u8,
    /// Program mode: swaps the $8000 and $C000 windows.
    prg_mode: bool,
    /// Character A12 inversion: swaps the 2 KB and 1 KB window groups.
    chr_inversion: bool,
    /// The eight bank registers R0-R7.
    registers: [u8; 8],
    /// Program-RAM chip enable.
    ram_enabled: bool,
    /// Program-RAM write protect.
    ram_protect: bool,
    /// Scanline counter reload value.
    irq_latch: u8,
    /// Scanline counter.
    irq_counter: u8,
    /// Force a reload on the next clock.
    irq_reload: bool,
    /// Interrupt output enabled.
    irq_enabled: bool,
}

impl Mmc3 {
    pub fn power_on(state: &mut MapperState) -> Self {
        let mut mmc3 = Self {
            bank_select: 0,
            prg_mode: false,
            chr_inversion: false,
            registers: [0, 2, 4, 5, 6, 7, 0, 1],
            ram_enabled: true,
            ram_protect: false,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
        };
        mmc3.apply(state);
        mmc3
    }

    pub fn reset(&mut self, state: &mut MapperState) {
        *self = Self::power_on(state);
    }

    pub fn write_rom(&mut self, state: &mut MapperState, addr: u16, data: u8) {
        match ((addr >> 13) & 0x03, addr & 0x01) {
            // $8000: bank select.
            (0, 0) => {
                self.bank_select = data & 0x07;
                self.prg_mode = data & 0x40 != 0;
                self.chr_inversion = data & 0x80 != 0;
                self.apply(state);
            }
            // $8001: bank data.
            (0, 1) => {
                self.registers[usize::from(self.bank_select)] = data;
                self.apply(state);
            }
            // $A000: mirror select.
            (1, 0) => {
                state.mirror = if data & 0x01 != 0 {
                    Mirroring::Horizontal
                } else {
                    Mirroring::Vertical
                };
            }
            // $A001: program-RAM protect.
            (1, 1) => {
                self.ram_enabled = data & 0x80 != 0;
                self.ram_protect = data & 0x40 != 0;
            }
            // $C000: interrupt latch.
            (2, 0) => self.irq_latch = data,
            // $C001: counter reload.
            (2, 1) => {
                self.irq_counter = 0;
                self.irq_reload = true;
            }
            // $E000: interrupt disable.
            (3, 0) => self.irq_enabled = false,
            // $E001: interrupt enable.
            _ => self.irq_enabled = true,
        }
    }

    /// Clock the scanline counter. Returns true when IRQ should be raised.
    pub fn scanline(&mut self) -> bool {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }
        self.irq_counter == 0 && self.irq_enabled
    }

    pub fn ram_enabled(&self) -> bool {
        self.ram_enabled
    }

    pub fn ram_writable(&self) -> bool {
        self.ram_enabled && !self.ram_protect
    }

    /// Recompute the program and character windows from the registers.
    fn apply(&mut self, state: &mut MapperState) {
        let last = state.last_prg_8k();
        let second_last = last.saturating_sub(1);
        let r6 = usize::from(self.registers[6] & 0x3F);
        let r7 = usize::from(self.registers[7] & 0x3F);

        let windows = if self.prg_mode {
            [second_last, r7, r6, last]
        } else {
            [r6, r7, second_last, last]
        };
        for (window, bank) in windows.into_iter().enumerate() {
            state.set_prg_8k(window, bank);
        }

        let r = self.registers;
        let banks = if self.chr_inversion {
            [
                usize::from(r[2]),
                usize::from(r[3]),
                usize::from(r[4]),
                usize::from(r[5]),
                usize::from(r[0] & 0xFE),
                usize::from(r[0] | 0x01),
                usize::from(r[1] & 0xFE),
                usize::from(r[1] | 0x01),
            ]
        } else {
            [
                usize::from(r[0] & 0xFE),
                usize::from(r[0] | 0x01),
                usize::from(r[1] & 0xFE),
                usize::from(r[1] | 0x01),
                usize::from(r[2]),
                usize::from(r[3]),
                usize::from(r[4]),
                usize::from(r[5]),
            ]
        };
        for (window, bank) in banks.into_iter().enumerate() {
            state.set_chr_1k(window, bank);
        }
    }
}
