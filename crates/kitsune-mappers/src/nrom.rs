//! Mapper 0 (NROM): no banking hardware.
//!
//! 16 KB carts mirror their single program bank across both halves;
//! 32 KB carts map straight through. Character memory is fixed.

use crate::mapper::MapperState;

/// Mapper-0 state (none; the windows are fixed at power-on).
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Nrom;

impl Nrom {
    pub fn power_on(state: &mut MapperState) -> Self {
        let nrom = Self;
        nrom.reset(state);
        nrom
    }

    pub fn reset(self, state: &mut MapperState) {
        state.set_prg_16k(0, 0);
        state.set_prg_16k(1, state.last_prg_16k());
        state.set_chr_8k(0);
    }
}
