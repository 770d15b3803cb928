//! Opcode definitions and the 256-entry dispatch table.
//!
//! Every opcode byte decodes to a mnemonic, an addressing mode and a base
//! cycle count. The 151 official opcodes carry their documented semantics;
//! the 105 remaining bytes are accepted and executed as NOPs with the
//! addressing mode and cycle count of the slot they occupy.

use crate::addressing::AddrMode;

/// Instruction mnemonics (the 56 official operations).
///
/// Unofficial opcode bytes all decode to [`Mnemonic::Nop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)] // the 6502 data sheet is the documentation
pub enum Mnemonic {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
}

/// One entry of the opcode dispatch table.
#[derive(Debug, Clone, Copy)]
pub struct Opcode {
    /// Instruction mnemonic.
    pub mnemonic: Mnemonic,
    /// Addressing mode.
    pub mode: AddrMode,
    /// Base cycle count.
    pub cycles: u8,
    /// Whether a page-crossing read costs one extra cycle.
    pub page_cross: bool,
    /// Whether this byte is a documented opcode.
    pub official: bool,
}

/// Official opcode entry.
const fn op(mnemonic: Mnemonic, mode: AddrMode, cycles: u8) -> Opcode {
    Opcode { mnemonic, mode, cycles, page_cross: false, official: true }
}

/// Official opcode entry with a page-crossing penalty.
const fn opp(mnemonic: Mnemonic, mode: AddrMode, cycles: u8) -> Opcode {
    Opcode { mnemonic, mode, cycles, page_cross: true, official: true }
}

/// Unofficial opcode slot, executed as a NOP of the given mode.
const fn ill(mode: AddrMode, cycles: u8) -> Opcode {
    Opcode { mnemonic: Mnemonic::Nop, mode, cycles, page_cross: false, official: false }
}

/// Unofficial opcode slot with a page-crossing penalty.
const fn illp(mode: AddrMode, cycles: u8) -> Opcode {
    Opcode { mnemonic: Mnemonic::Nop, mode, cycles, page_cross: true, official: false }
}

/// Complete 256-entry opcode lookup table, indexed by opcode byte.
#[rustfmt::skip]
pub const OPCODE_TABLE: [Opcode; 256] = {
    use AddrMode::{
        Absolute as Abs, AbsoluteX as Abx, AbsoluteY as Aby, Accumulator as Acc,
        Immediate as Imm, Implied as Imp, Indirect as Ind, IndirectX as Izx,
        IndirectY as Izy, Relative as Rel, ZeroPage as Zp0, ZeroPageX as Zpx,
        ZeroPageY as Zpy,
    };
    use Mnemonic::*;
    [
        // 0x00
        op(Brk, Imp, 7),  op(Ora, Izx, 6),  ill(Imp, 2),      ill(Izx, 8),
        ill(Zp0, 3),      op(Ora, Zp0, 3),  op(Asl, Zp0, 5),  ill(Zp0, 5),
        op(Php, Imp, 3),  op(Ora, Imm, 2),  op(Asl, Acc, 2),  ill(Imm, 2),
        ill(Abs, 4),      op(Ora, Abs, 4),  op(Asl, Abs, 6),  ill(Abs, 6),
        // 0x10
        op(Bpl, Rel, 2),  opp(Ora, Izy, 5), ill(Imp, 2),      ill(Izy, 8),
        ill(Zpx, 4),      op(Ora, Zpx, 4),  op(Asl, Zpx, 6),  ill(Zpx, 6),
        op(Clc, Imp, 2),  opp(Ora, Aby, 4), ill(Imp, 2),      ill(Aby, 7),
        illp(Abx, 4),     opp(Ora, Abx, 4), op(Asl, Abx, 7),  ill(Abx, 7),
        // 0x20
        op(Jsr, Abs, 6),  op(And, Izx, 6),  ill(Imp, 2),      ill(Izx, 8),
        op(Bit, Zp0, 3),  op(And, Zp0, 3),  op(Rol, Zp0, 5),  ill(Zp0, 5),
        op(Plp, Imp, 4),  op(And, Imm, 2),  op(Rol, Acc, 2),  ill(Imm, 2),
        op(Bit, Abs, 4),  op(And, Abs, 4),  op(Rol, Abs, 6),  ill(Abs, 6),
        // 0x30
        op(Bmi, Rel, 2),  opp(And, Izy, 5), ill(Imp, 2),      ill(Izy, 8),
        ill(Zpx, 4),      op(And, Zpx, 4),  op(Rol, Zpx, 6),  ill(Zpx, 6),
        op(Sec, Imp, 2),  opp(And, Aby, 4), ill(Imp, 2),      ill(Aby, 7),
        illp(Abx, 4),     opp(And, Abx, 4), op(Rol, Abx, 7),  ill(Abx, 7),
        // 0x40
        op(Rti, Imp, 6),  op(Eor, Izx, 6),  ill(Imp, 2),      ill(Izx, 8),
        ill(Zp0, 3),      op(Eor, Zp0, 3),  op(Lsr, Zp0, 5),  ill(Zp0, 5),
        op(Pha, Imp, 3),  op(Eor, Imm, 2),  op(Lsr, Acc, 2),  ill(Imm, 2),
        op(Jmp, Abs, 3),  op(Eor, Abs, 4),  op(Lsr, Abs, 6),  ill(Abs, 6),
        // 0x50
        op(Bvc, Rel, 2),  opp(Eor, Izy, 5), ill(Imp, 2),      ill(Izy, 8),
        ill(Zpx, 4),      op(Eor, Zpx, 4),  op(Lsr, Zpx, 6),  ill(Zpx, 6),
        op(Cli, Imp, 2),  opp(Eor, Aby, 4), ill(Imp, 2),      ill(Aby, 7),
        illp(Abx, 4),     opp(Eor, Abx, 4), op(Lsr, Abx, 7),  ill(Abx, 7),
        // 0x60
        op(Rts, Imp, 6),  op(Adc, Izx, 6),  ill(Imp, 2),      ill(Izx, 8),
        ill(Zp0, 3),      op(Adc, Zp0, 3),  op(Ror, Zp0, 5),  ill(Zp0, 5),
        op(Pla, Imp, 4),  op(Adc, Imm, 2),  op(Ror, Acc, 2),  ill(Imm, 2),
        op(Jmp, Ind, 5),  op(Adc, Abs, 4),  op(Ror, Abs, 6),  ill(Abs, 6),
        // 0x70
        op(Bvs, Rel, 2),  opp(Adc, Izy, 5), ill(Imp, 2),      ill(Izy, 8),
        ill(Zpx, 4),      op(Adc, Zpx, 4),  op(Ror, Zpx, 6),  ill(Zpx, 6),
        op(Sei, Imp, 2),  opp(Adc, Aby, 4), ill(Imp, 2),      ill(Aby, 7),
        illp(Abx, 4),     opp(Adc, Abx, 4), op(Ror, Abx, 7),  ill(Abx, 7),
        // 0x80
        ill(Imm, 2),      op(Sta, Izx, 6),  ill(Imm, 2),      ill(Izx, 6),
        op(Sty, Zp0, 3),  op(Sta, Zp0, 3),  op(Stx, Zp0, 3),  ill(Zp0, 3),
        op(Dey, Imp, 2),  ill(Imm, 2),      op(Txa, Imp, 2),  ill(Imm, 2),
        op(Sty, Abs, 4),  op(Sta, Abs, 4),  op(Stx, Abs, 4),  ill(Abs, 4),
        // 0x90
        op(Bcc, Rel, 2),  op(Sta, Izy, 6),  ill(Imp, 2),      ill(Izy, 6),
        op(Sty, Zpx, 4),  op(Sta, Zpx, 4),  op(Stx, Zpy, 4),  ill(Zpy, 4),
        op(Tya, Imp, 2),  op(Sta, Aby, 5),  op(Txs, Imp, 2),  ill(Aby, 5),
        ill(Abx, 5),      op(Sta, Abx, 5),  ill(Aby, 5),      ill(Aby, 5),
        // 0xA0
        op(Ldy, Imm, 2),  op(Lda, Izx, 6),  op(Ldx, Imm, 2),  ill(Izx, 6),
        op(Ldy, Zp0, 3),  op(Lda, Zp0, 3),  op(Ldx, Zp0, 3),  ill(Zp0, 3),
        op(Tay, Imp, 2),  op(Lda, Imm, 2),  op(Tax, Imp, 2),  ill(Imm, 2),
        op(Ldy, Abs, 4),  op(Lda, Abs, 4),  op(Ldx, Abs, 4),  ill(Abs, 4),
        // 0xB0
        op(Bcs, Rel, 2),  opp(Lda, Izy, 5), ill(Imp, 2),      illp(Izy, 5),
        op(Ldy, Zpx, 4),  op(Lda, Zpx, 4),  op(Ldx, Zpy, 4),  ill(Zpy, 4),
        op(Clv, Imp, 2),  opp(Lda, Aby, 4), op(Tsx, Imp, 2),  illp(Aby, 4),
        opp(Ldy, Abx, 4), opp(Lda, Abx, 4), opp(Ldx, Aby, 4), illp(Aby, 4),
        // 0xC0
        op(Cpy, Imm, 2),  op(Cmp, Izx, 6),  ill(Imm, 2),      ill(Izx, 8),
        op(Cpy, Zp0, 3),  op(Cmp, Zp0, 3),  op(Dec, Zp0, 5),  ill(Zp0, 5),
        op(Iny, Imp, 2),  op(Cmp, Imm, 2),  op(Dex, Imp, 2),  ill(Imm, 2),
        op(Cpy, Abs, 4),  op(Cmp, Abs, 4),  op(Dec, Abs, 6),  ill(Abs, 6),
        // 0xD0
        op(Bne, Rel, 2),  opp(Cmp, Izy, 5), ill(Imp, 2),      ill(Izy, 8),
        ill(Zpx, 4),      op(Cmp, Zpx, 4),  op(Dec, Zpx, 6),  ill(Zpx, 6),
        op(Cld, Imp, 2),  opp(Cmp, Aby, 4), ill(Imp, 2),      ill(Aby, 7),
        illp(Abx, 4),     opp(Cmp, Abx, 4), op(Dec, Abx, 7),  ill(Abx, 7),
        // 0xE0
        op(Cpx, Imm, 2),  op(Sbc, Izx, 6),  ill(Imm, 2),      ill(Izx, 8),
        op(Cpx, Zp0, 3),  op(Sbc, Zp0, 3),  op(Inc, Zp0, 5),  ill(Zp0, 5),
        op(Inx, Imp, 2),  op(Sbc, Imm, 2),  op(Nop, Imp, 2),  ill(Imm, 2),
        op(Cpx, Abs, 4),  op(Sbc, Abs, 4),  op(Inc, Abs, 6),  ill(Abs, 6),
        // 0xF0
        op(Beq, Rel, 2),  opp(Sbc, Izy, 5), ill(Imp, 2),      ill(Izy, 8),
        ill(Zpx, 4),      op(Sbc, Zpx, 4),  op(Inc, Zpx, 6),  ill(Zpx, 6),
        op(Sed, Imp, 2),  opp(Sbc, Aby, 4), ill(Imp, 2),      ill(Aby, 7),
        illp(Abx, 4),     opp(Sbc, Abx, 4), op(Inc, Abx, 7),  ill(Abx, 7),
    ]
};
