//! CPU Status Register (P register) flags.
//!
//! ```text
//! 7  6  5  4  3  2  1  0
//! N  V  U  B  D  I  Z  C
//! │  │  │  │  │  │  │  └─ Carry
//! │  │  │  │  │  │  └──── Zero
//! │  │  │  │  │  └─────── Interrupt Disable
//! │  │  │  │  └────────── Decimal Mode (not used on the NES but still functional)
//! │  │  │  └───────────── Break (1 when pushed from PHP/BRK, 0 from IRQ/NMI)
//! │  │  └──────────────── Unused (always 1 when pushed to stack)
//! │  └─────────────────── Overflow
//! └────────────────────── Negative
//! ```

use bitflags::bitflags;

bitflags! {
    /// CPU Status Register flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Status: u8 {
        /// Carry flag - set on overflow out of bit 7 or a non-borrowing subtract.
        const C = 1 << 0;

        /// Zero flag - set if the result of the last operation was zero.
        const Z = 1 << 1;

        /// Interrupt Disable flag - when set, IRQ interrupts are ignored.
        /// NMI is not affected.
        const I = 1 << 2;

        /// Decimal Mode flag - the NES CPU lacks BCD support, but the flag
        /// can still be set and cleared.
        const D = 1 << 3;

        /// Break flag - distinguishes BRK/PHP pushes (1) from IRQ/NMI pushes (0).
        const B = 1 << 4;

        /// Unused flag - always 1 when the status is pushed to the stack.
        const U = 1 << 5;

        /// Overflow flag - set if the last operation caused a signed overflow.
        const V = 1 << 6;

        /// Negative flag - set if bit 7 of the result is set.
        const N = 1 << 7;
    }
}

impl Status {
    /// Status after the RESET sequence: I set, plus the B and U bits the
    /// hardware reports while no interrupt is in flight.
    pub const RESET: Self = Self::I.union(Self::B).union(Self::U);

    /// Sets or clears the Zero and Negative flags based on a value.
    #[inline]
    pub fn set_zn(&mut self, value: u8) {
        self.set(Self::Z, value == 0);
        self.set(Self::N, value & 0x80 != 0);
    }

    /// Converts the status register to a byte for pushing to stack.
    /// The U flag is always set when pushing; B reflects the pusher's intent.
    #[inline]
    #[must_use]
    pub const fn to_stack_byte(self, brk: bool) -> u8 {
        let mut value = self.bits() | Self::U.bits();
        if brk {
            value |= Self::B.bits();
        } else {
            value &= !Self::B.bits();
        }
        value
    }

    /// Creates a status register from a byte pulled from the stack.
    /// The pulled B bit is discarded and U is forced on.
    #[inline]
    #[must_use]
    pub fn from_stack_byte(value: u8) -> Self {
        Self::from_bits_truncate((value & !Self::B.bits()) | Self::U.bits())
    }
}
