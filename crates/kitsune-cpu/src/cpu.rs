//! 6502 CPU core implementation.
//!
//! The CPU is clocked once per three master ticks by the system bus. All of
//! an instruction's work happens on its first cycle; a pending-cycle counter
//! idles through the remainder so that bus-visible timing still matches the
//! documented cycle counts. OAM DMA is a parity-driven state machine that
//! steals the CPU while active.

use crate::addressing::AddrMode;
use crate::bus::Bus;
use crate::opcodes::{Mnemonic, Opcode, OPCODE_TABLE};
use crate::status::Status;

/// NMI vector address.
const VECTOR_NMI: u16 = 0xFFFA;
/// RESET vector address.
const VECTOR_RESET: u16 = 0xFFFC;
/// IRQ/BRK vector address.
const VECTOR_IRQ: u16 = 0xFFFE;

/// Stack page base address.
const STACK_BASE: u16 = 0x0100;

/// Cycles consumed by the NMI/IRQ/RESET sequences.
const INTERRUPT_CYCLES: u8 = 7;

/// OAM DMA transfer state.
///
/// Writing a page number to $4014 starts a 256-byte copy from processor
/// memory into video OAM. The transfer alternates read/write on master-cycle
/// parity, preceded by one or two alignment cycles.
#[derive(Debug, Clone, Copy, Default)]
struct Transfer {
    /// Transfer in progress; the CPU executes no instructions while set.
    active: bool,
    /// Alignment cycle still owed before the copy proper starts.
    sync: bool,
    /// Next processor-space source address.
    source: u16,
    /// Next video-OAM destination address.
    destination: u8,
    /// One-byte data latch between the read and write half-cycles.
    data: u8,
}

/// Computed operand for one instruction.
#[derive(Debug, Clone, Copy)]
struct Operand {
    /// Effective address (branch target for relative mode).
    addr: u16,
    /// Whether address computation crossed a page boundary.
    page_crossed: bool,
}

/// MOS 6502 CPU.
#[derive(Debug)]
pub struct Cpu {
    /// Accumulator register.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Stack pointer (offset into $0100-$01FF).
    pub sp: u8,
    /// Program counter.
    pub pc: u16,
    /// Status flags.
    pub status: Status,
    /// Idle cycles left in the current instruction.
    pending: u8,
    /// Non-maskable interrupt pending.
    nmi_pending: bool,
    /// Maskable interrupt pending (held until serviced or cleared by reset).
    irq_pending: bool,
    /// OAM DMA state.
    transfer: Transfer,
    /// Total CPU cycles consumed.
    cycles: u64,
}

impl Cpu {
    /// Create a new CPU. State matches the post-RESET contract once
    /// [`Cpu::reset`] has run against a bus with a valid RESET vector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: Status::RESET,
            pending: 0,
            nmi_pending: false,
            irq_pending: false,
            transfer: Transfer::default(),
            cycles: 0,
        }
    }

    /// Run the RESET sequence.
    ///
    /// The stack pointer decrements by 3 to mimic the suppressed pushes, the
    /// status becomes `I | B | U`, and the PC loads from the RESET vector.
    /// Takes 7 cycles.
    pub fn reset(&mut self, bus: &mut impl Bus) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = self.sp.wrapping_sub(3);
        self.status = Status::RESET;
        self.pc = bus.read_word(VECTOR_RESET);
        self.pending = INTERRUPT_CYCLES - 1;
        self.nmi_pending = false;
        self.irq_pending = false;
        self.transfer = Transfer::default();
        self.cycles = 0;
    }

    /// Raise the non-maskable interrupt line.
    pub fn raise_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Raise the maskable interrupt line. The request is held until the
    /// interrupt-disable flag allows it to be serviced.
    pub fn raise_irq(&mut self) {
        self.irq_pending = true;
    }

    /// Begin an OAM DMA transfer from the given 256-byte page.
    pub fn begin_transfer(&mut self, page: u8) {
        self.transfer.active = true;
        self.transfer.sync = true;
        self.transfer.source = u16::from(page) << 8;
        self.transfer.destination = 0;
    }

    /// Whether an OAM DMA transfer is in progress.
    #[must_use]
    pub fn transfer_active(&self) -> bool {
        self.transfer.active
    }

    /// Whether a maskable interrupt request is being held.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    /// Idle cycles left in the current instruction.
    #[must_use]
    pub fn pending_cycles(&self) -> u8 {
        self.pending
    }

    /// Total CPU cycles consumed since reset.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Execute one CPU cycle.
    ///
    /// `cycle` is the bus master-cycle counter, used for DMA parity. The
    /// call is a no-op (an idle cycle) unless the pending counter has
    /// drained, in which case arbitration runs in priority order:
    /// DMA continuation, NMI, IRQ, instruction fetch.
    pub fn step(&mut self, bus: &mut impl Bus, cycle: u64) {
        self.cycles += 1;

        if self.transfer.active {
            self.transfer_step(bus, cycle);
            return;
        }

        if self.pending > 0 {
            self.pending -= 1;
            return;
        }

        if self.nmi_pending {
            self.nmi_pending = false;
            self.interrupt(bus, VECTOR_NMI);
            return;
        }

        if self.irq_pending && !self.status.contains(Status::I) {
            self.irq_pending = false;
            self.interrupt(bus, VECTOR_IRQ);
            return;
        }

        let opcode = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);

        let entry = &OPCODE_TABLE[opcode as usize];
        let operand = self.fetch_operand(bus, entry.mode);
        let extra = self.execute(bus, entry, operand);

        let mut total = entry.cycles + extra;
        if entry.page_cross && operand.page_crossed {
            total += 1;
        }
        self.pending = total - 1;
    }

    /// One cycle of the OAM DMA state machine.
    ///
    /// The first cycle idles; it clears the sync flag only on odd parity,
    /// aligning the copy so reads land on even cycles and writes on odd.
    fn transfer_step(&mut self, bus: &mut impl Bus, cycle: u64) {
        if self.transfer.sync {
            if cycle & 1 == 1 {
                self.transfer.sync = false;
            }
        } else if cycle & 1 == 0 {
            self.transfer.data = bus.read(self.transfer.source);
            self.transfer.source = self.transfer.source.wrapping_add(1);
        } else {
            bus.write_oam(self.transfer.destination, self.transfer.data);
            self.transfer.destination = self.transfer.destination.wrapping_add(1);
            if self.transfer.destination == 0 {
                self.transfer.active = false;
            }
        }
    }

    /// Service an interrupt: push PC and status (B clear), set I, load the
    /// vector. Consumes 7 cycles.
    fn interrupt(&mut self, bus: &mut impl Bus, vector: u16) {
        self.push_word(bus, self.pc);
        self.push(bus, self.status.to_stack_byte(false));
        self.status.insert(Status::I);
        self.pc = bus.read_word(vector);
        self.pending = INTERRUPT_CYCLES - 1;
    }

    /// Compute the effective address for an addressing mode, advancing the
    /// PC past the operand bytes.
    fn fetch_operand(&mut self, bus: &mut impl Bus, mode: AddrMode) -> Operand {
        match mode {
            AddrMode::Implied | AddrMode::Accumulator => Operand { addr: 0, page_crossed: false },

            AddrMode::Immediate => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                Operand { addr, page_crossed: false }
            }

            AddrMode::ZeroPage => {
                let addr = u16::from(bus.read(self.pc));
                self.pc = self.pc.wrapping_add(1);
                Operand { addr, page_crossed: false }
            }

            AddrMode::ZeroPageX => {
                let base = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                Operand { addr: u16::from(base.wrapping_add(self.x)), page_crossed: false }
            }

            AddrMode::ZeroPageY => {
                let base = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                Operand { addr: u16::from(base.wrapping_add(self.y)), page_crossed: false }
            }

            AddrMode::Absolute => {
                let addr = bus.read_word(self.pc);
                self.pc = self.pc.wrapping_add(2);
                Operand { addr, page_crossed: false }
            }

            AddrMode::AbsoluteX => {
                let base = bus.read_word(self.pc);
                self.pc = self.pc.wrapping_add(2);
                let addr = base.wrapping_add(u16::from(self.x));
                Operand { addr, page_crossed: (base ^ addr) & 0xFF00 != 0 }
            }

            AddrMode::AbsoluteY => {
                let base = bus.read_word(self.pc);
                self.pc = self.pc.wrapping_add(2);
                let addr = base.wrapping_add(u16::from(self.y));
                Operand { addr, page_crossed: (base ^ addr) & 0xFF00 != 0 }
            }

            AddrMode::Indirect => {
                let ptr = bus.read_word(self.pc);
                self.pc = self.pc.wrapping_add(2);
                // A pointer at the end of a page wraps its high-byte fetch
                // back to the start of the same page.
                let lo = bus.read(ptr);
                let hi = bus.read((ptr & 0xFF00) | u16::from((ptr as u8).wrapping_add(1)));
                Operand { addr: u16::from_le_bytes([lo, hi]), page_crossed: false }
            }

            AddrMode::IndirectX => {
                let zp = bus.read(self.pc).wrapping_add(self.x);
                self.pc = self.pc.wrapping_add(1);
                let lo = bus.read(u16::from(zp));
                let hi = bus.read(u16::from(zp.wrapping_add(1)));
                Operand { addr: u16::from_le_bytes([lo, hi]), page_crossed: false }
            }

            AddrMode::IndirectY => {
                let zp = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                let lo = bus.read(u16::from(zp));
                let hi = bus.read(u16::from(zp.wrapping_add(1)));
                let base = u16::from_le_bytes([lo, hi]);
                let addr = base.wrapping_add(u16::from(self.y));
                Operand { addr, page_crossed: (base ^ addr) & 0xFF00 != 0 }
            }

            AddrMode::Relative => {
                let offset = bus.read(self.pc) as i8;
                self.pc = self.pc.wrapping_add(1);
                let addr = self.pc.wrapping_add(offset as u16);
                Operand { addr, page_crossed: (self.pc ^ addr) & 0xFF00 != 0 }
            }
        }
    }

    /// Execute one decoded instruction. Returns extra cycles beyond the
    /// table's base count (taken branches).
    #[allow(clippy::too_many_lines)]
    fn execute(&mut self, bus: &mut impl Bus, entry: &Opcode, operand: Operand) -> u8 {
        let addr = operand.addr;

        match entry.mnemonic {
            Mnemonic::Adc => {
                let value = bus.read(addr);
                self.do_adc(value);
            }
            Mnemonic::Sbc => {
                let value = bus.read(addr);
                self.do_adc(!value);
            }
            Mnemonic::And => {
                self.a &= bus.read(addr);
                self.status.set_zn(self.a);
            }
            Mnemonic::Eor => {
                self.a ^= bus.read(addr);
                self.status.set_zn(self.a);
            }
            Mnemonic::Ora => {
                self.a |= bus.read(addr);
                self.status.set_zn(self.a);
            }

            Mnemonic::Asl => self.read_modify_write(bus, entry.mode, addr, |cpu, value| {
                cpu.status.set(Status::C, value & 0x80 != 0);
                value << 1
            }),
            Mnemonic::Lsr => self.read_modify_write(bus, entry.mode, addr, |cpu, value| {
                cpu.status.set(Status::C, value & 0x01 != 0);
                value >> 1
            }),
            Mnemonic::Rol => self.read_modify_write(bus, entry.mode, addr, |cpu, value| {
                let carry_in = u8::from(cpu.status.contains(Status::C));
                cpu.status.set(Status::C, value & 0x80 != 0);
                (value << 1) | carry_in
            }),
            Mnemonic::Ror => self.read_modify_write(bus, entry.mode, addr, |cpu, value| {
                let carry_in = u8::from(cpu.status.contains(Status::C)) << 7;
                cpu.status.set(Status::C, value & 0x01 != 0);
                (value >> 1) | carry_in
            }),

            Mnemonic::Bcc => return self.branch(!self.status.contains(Status::C), operand),
            Mnemonic::Bcs => return self.branch(self.status.contains(Status::C), operand),
            Mnemonic::Bne => return self.branch(!self.status.contains(Status::Z), operand),
            Mnemonic::Beq => return self.branch(self.status.contains(Status::Z), operand),
            Mnemonic::Bpl => return self.branch(!self.status.contains(Status::N), operand),
            Mnemonic::Bmi => return self.branch(self.status.contains(Status::N), operand),
            Mnemonic::Bvc => return self.branch(!self.status.contains(Status::V), operand),
            Mnemonic::Bvs => return self.branch(self.status.contains(Status::V), operand),

            Mnemonic::Bit => {
                let value = bus.read(addr);
                self.status.set(Status::Z, self.a & value == 0);
                self.status.set(Status::V, value & 0x40 != 0);
                self.status.set(Status::N, value & 0x80 != 0);
            }

            Mnemonic::Brk => {
                // BRK is a two-byte instruction; the padding byte is skipped.
                let ret = self.pc.wrapping_add(1);
                self.push_word(bus, ret);
                self.push(bus, self.status.to_stack_byte(true));
                self.status.insert(Status::I);
                self.pc = bus.read_word(VECTOR_IRQ);
            }

            Mnemonic::Clc => self.status.remove(Status::C),
            Mnemonic::Cld => self.status.remove(Status::D),
            Mnemonic::Cli => self.status.remove(Status::I),
            Mnemonic::Clv => self.status.remove(Status::V),
            Mnemonic::Sec => self.status.insert(Status::C),
            Mnemonic::Sed => self.status.insert(Status::D),
            Mnemonic::Sei => self.status.insert(Status::I),

            Mnemonic::Cmp => {
                let value = bus.read(addr);
                self.compare(self.a, value);
            }
            Mnemonic::Cpx => {
                let value = bus.read(addr);
                self.compare(self.x, value);
            }
            Mnemonic::Cpy => {
                let value = bus.read(addr);
                self.compare(self.y, value);
            }

            Mnemonic::Dec => self.read_modify_write(bus, entry.mode, addr, |_, value| {
                value.wrapping_sub(1)
            }),
            Mnemonic::Inc => self.read_modify_write(bus, entry.mode, addr, |_, value| {
                value.wrapping_add(1)
            }),
            Mnemonic::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.status.set_zn(self.x);
            }
            Mnemonic::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.status.set_zn(self.y);
            }
            Mnemonic::Inx => {
                self.x = self.x.wrapping_add(1);
                self.status.set_zn(self.x);
            }
            Mnemonic::Iny => {
                self.y = self.y.wrapping_add(1);
                self.status.set_zn(self.y);
            }

            Mnemonic::Jmp => self.pc = addr,
            Mnemonic::Jsr => {
                // Push the address of the last operand byte; RTS adds one.
                self.push_word(bus, self.pc.wrapping_sub(1));
                self.pc = addr;
            }
            Mnemonic::Rts => {
                self.pc = self.pop_word(bus).wrapping_add(1);
            }
            Mnemonic::Rti => {
                let value = self.pop(bus);
                self.status = Status::from_stack_byte(value);
                self.pc = self.pop_word(bus);
            }

            Mnemonic::Lda => {
                self.a = bus.read(addr);
                self.status.set_zn(self.a);
            }
            Mnemonic::Ldx => {
                self.x = bus.read(addr);
                self.status.set_zn(self.x);
            }
            Mnemonic::Ldy => {
                self.y = bus.read(addr);
                self.status.set_zn(self.y);
            }

            Mnemonic::Nop => {
                // Memory-mode slots still perform the operand read, so
                // read-sensitive registers observe the access.
                if !matches!(entry.mode, AddrMode::Implied | AddrMode::Accumulator) {
                    let _ = bus.read(addr);
                }
            }

            Mnemonic::Pha => self.push(bus, self.a),
            Mnemonic::Php => {
                let value = self.status.to_stack_byte(true);
                self.push(bus, value);
            }
            Mnemonic::Pla => {
                self.a = self.pop(bus);
                self.status.set_zn(self.a);
            }
            Mnemonic::Plp => {
                let value = self.pop(bus);
                self.status = Status::from_stack_byte(value);
            }

            Mnemonic::Sta => bus.write(addr, self.a),
            Mnemonic::Stx => bus.write(addr, self.x),
            Mnemonic::Sty => bus.write(addr, self.y),

            Mnemonic::Tax => {
                self.x = self.a;
                self.status.set_zn(self.x);
            }
            Mnemonic::Tay => {
                self.y = self.a;
                self.status.set_zn(self.y);
            }
            Mnemonic::Tsx => {
                self.x = self.sp;
                self.status.set_zn(self.x);
            }
            Mnemonic::Txa => {
                self.a = self.x;
                self.status.set_zn(self.a);
            }
            Mnemonic::Tya => {
                self.a = self.y;
                self.status.set_zn(self.a);
            }
            // TXS does not update flags.
            Mnemonic::Txs => self.sp = self.x,
        }

        0
    }

    /// Shared shift/increment plumbing: accumulator mode operates on A,
    /// memory modes read-modify-write through the bus. Z/N update from the
    /// result in both cases.
    fn read_modify_write(
        &mut self,
        bus: &mut impl Bus,
        mode: AddrMode,
        addr: u16,
        operation: impl FnOnce(&mut Self, u8) -> u8,
    ) {
        if mode == AddrMode::Accumulator {
            let result = operation(self, self.a);
            self.a = result;
            self.status.set_zn(result);
        } else {
            let value = bus.read(addr);
            let result = operation(self, value);
            bus.write(addr, result);
            self.status.set_zn(result);
        }
    }

    /// Conditional branch. Taken branches cost one extra cycle, two if the
    /// target is on a different page from the next instruction.
    fn branch(&mut self, condition: bool, operand: Operand) -> u8 {
        if condition {
            self.pc = operand.addr;
            1 + u8::from(operand.page_crossed)
        } else {
            0
        }
    }

    /// Add with carry; SBC routes here with the operand inverted.
    fn do_adc(&mut self, value: u8) {
        let carry = u16::from(self.status.contains(Status::C));
        let sum = u16::from(self.a) + u16::from(value) + carry;
        let result = sum as u8;

        self.status.set(Status::C, sum > 0xFF);
        self.status
            .set(Status::V, !(self.a ^ value) & (self.a ^ result) & 0x80 != 0);
        self.a = result;
        self.status.set_zn(self.a);
    }

    /// Compare a register with a value: C for no borrow, Z/N from the
    /// difference.
    fn compare(&mut self, register: u8, value: u8) {
        let result = register.wrapping_sub(value);
        self.status.set(Status::C, register >= value);
        self.status.set_zn(result);
    }

    fn push(&mut self, bus: &mut impl Bus, value: u8) {
        bus.write(STACK_BASE | u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pop(&mut self, bus: &mut impl Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(STACK_BASE | u16::from(self.sp))
    }

    fn push_word(&mut self, bus: &mut impl Bus, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, (value & 0xFF) as u8);
    }

    fn pop_word(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.pop(bus);
        let hi = self.pop(bus);
        u16::from_le_bytes([lo, hi])
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlatBus {
        memory: Vec<u8>,
        oam: [u8; 256],
    }

    impl FlatBus {
        fn new() -> Self {
            Self { memory: vec![0; 0x10000], oam: [0; 256] }
        }
    }

    impl Bus for FlatBus {
        fn read(&mut self, addr: u16) -> u8 {
            self.memory[addr as usize]
        }

        fn write(&mut self, addr: u16, data: u8) {
            self.memory[addr as usize] = data;
        }

        fn write_oam(&mut self, addr: u8, data: u8) {
            self.oam[addr as usize] = data;
        }
    }

    /// Set up a CPU at $8000 with the given code bytes in place.
    fn setup(code: &[u8]) -> (Cpu, FlatBus) {
        let mut bus = FlatBus::new();
        bus.memory[0x8000..0x8000 + code.len()].copy_from_slice(code);
        let mut cpu = Cpu::new();
        cpu.pc = 0x8000;
        cpu.status = Status::U;
        (cpu, bus)
    }

    /// Run one full instruction, returning the cycles it consumed.
    fn run_instruction(cpu: &mut Cpu, bus: &mut FlatBus) -> u8 {
        cpu.step(bus, 0);
        let cycles = cpu.pending_cycles() + 1;
        let mut master = 3;
        while cpu.pending_cycles() > 0 {
            cpu.step(bus, master);
            master += 3;
        }
        cycles
    }

    #[test]
    fn adc_immediate_no_overflow() {
        let (mut cpu, mut bus) = setup(&[0x69, 0x10]); // ADC #$10
        cpu.a = 0x50;
        let cycles = run_instruction(&mut cpu, &mut bus);

        assert_eq!(cpu.a, 0x60);
        assert!(!cpu.status.contains(Status::N));
        assert!(!cpu.status.contains(Status::V));
        assert!(!cpu.status.contains(Status::C));
        assert!(!cpu.status.contains(Status::Z));
        assert_eq!(cycles, 2);
        assert_eq!(cpu.pc, 0x8002);
    }

    #[test]
    fn adc_immediate_signed_overflow() {
        let (mut cpu, mut bus) = setup(&[0x69, 0x50]); // ADC #$50
        cpu.a = 0x50;
        run_instruction(&mut cpu, &mut bus);

        assert_eq!(cpu.a, 0xA0);
        assert!(cpu.status.contains(Status::N));
        assert!(cpu.status.contains(Status::V));
        assert!(!cpu.status.contains(Status::C));
        assert!(!cpu.status.contains(Status::Z));
    }

    #[test]
    fn adc_carry_out() {
        let (mut cpu, mut bus) = setup(&[0x69, 0x01]);
        cpu.a = 0xFF;
        run_instruction(&mut cpu, &mut bus);

        assert_eq!(cpu.a, 0x00);
        assert!(cpu.status.contains(Status::C));
        assert!(cpu.status.contains(Status::Z));
        assert!(!cpu.status.contains(Status::V));
    }

    #[test]
    fn sbc_is_adc_of_complement() {
        let (mut cpu, mut bus) = setup(&[0xE9, 0x10]); // SBC #$10
        cpu.a = 0x50;
        cpu.status.insert(Status::C); // no borrow
        run_instruction(&mut cpu, &mut bus);

        assert_eq!(cpu.a, 0x40);
        assert!(cpu.status.contains(Status::C));
    }

    #[test]
    fn jsr_rts_return_address() {
        // JSR $4455 at $ABCD, RTS at $4455.
        let (mut cpu, mut bus) = setup(&[]);
        bus.memory[0xABCD] = 0x20;
        bus.memory[0xABCE] = 0x55;
        bus.memory[0xABCF] = 0x44;
        bus.memory[0x4455] = 0x60;
        cpu.pc = 0xABCD;
        let sp_before = cpu.sp;

        let jsr_cycles = run_instruction(&mut cpu, &mut bus);
        assert_eq!(cpu.pc, 0x4455);
        assert_eq!(jsr_cycles, 6);

        let rts_cycles = run_instruction(&mut cpu, &mut bus);
        assert_eq!(cpu.pc, 0xABD0);
        assert_eq!(cpu.sp, sp_before);
        assert_eq!(rts_cycles, 6);
    }

    #[test]
    fn branch_cycle_accounting() {
        // BNE forward, not taken: 2 cycles.
        let (mut cpu, mut bus) = setup(&[0xD0, 0x10]);
        cpu.status.insert(Status::Z);
        assert_eq!(run_instruction(&mut cpu, &mut bus), 2);
        assert_eq!(cpu.pc, 0x8002);

        // Taken, same page: 3 cycles.
        let (mut cpu, mut bus) = setup(&[0xD0, 0x10]);
        assert_eq!(run_instruction(&mut cpu, &mut bus), 3);
        assert_eq!(cpu.pc, 0x8012);

        // Taken, crossing a page: 4 cycles.
        let (mut cpu, mut bus) = setup(&[]);
        bus.memory[0x80F0] = 0xD0;
        bus.memory[0x80F1] = 0x20;
        cpu.pc = 0x80F0;
        assert_eq!(run_instruction(&mut cpu, &mut bus), 4);
        assert_eq!(cpu.pc, 0x8112);
    }

    #[test]
    fn jmp_indirect_page_wrap_bug() {
        let (mut cpu, mut bus) = setup(&[0x6C, 0xFF, 0x02]); // JMP ($02FF)
        bus.memory[0x02FF] = 0x34;
        bus.memory[0x0300] = 0xAB; // would be the high byte without the bug
        bus.memory[0x0200] = 0x12; // actual high-byte fetch wraps here
        run_instruction(&mut cpu, &mut bus);
        assert_eq!(cpu.pc, 0x1234);
    }

    #[test]
    fn zero_page_index_wraps() {
        let (mut cpu, mut bus) = setup(&[0xB5, 0xF0]); // LDA $F0,X
        cpu.x = 0x20;
        bus.memory[0x0010] = 0x42; // ($F0 + $20) & $FF
        run_instruction(&mut cpu, &mut bus);
        assert_eq!(cpu.a, 0x42);
    }

    #[test]
    fn indirect_y_page_cross_penalty() {
        let (mut cpu, mut bus) = setup(&[0xB1, 0x40]); // LDA ($40),Y
        bus.memory[0x0040] = 0xF0;
        bus.memory[0x0041] = 0x20; // base $20F0
        cpu.y = 0x20; // -> $2110, crosses
        bus.memory[0x2110] = 0x99;
        let cycles = run_instruction(&mut cpu, &mut bus);
        assert_eq!(cpu.a, 0x99);
        assert_eq!(cycles, 6);
    }

    #[test]
    fn txs_does_not_touch_flags() {
        let (mut cpu, mut bus) = setup(&[0x9A]); // TXS
        cpu.x = 0x00;
        let before = cpu.status;
        run_instruction(&mut cpu, &mut bus);
        assert_eq!(cpu.sp, 0x00);
        assert_eq!(cpu.status, before);

        // TSX of the same value does set Z.
        let (mut cpu, mut bus) = setup(&[0xBA]); // TSX
        cpu.sp = 0x00;
        run_instruction(&mut cpu, &mut bus);
        assert!(cpu.status.contains(Status::Z));
    }

    #[test]
    fn plp_discards_break_bit() {
        let (mut cpu, mut bus) = setup(&[0x28]); // PLP
        // Push a status byte with B set onto the stack by hand.
        bus.memory[0x01FE] = (Status::C | Status::B).bits();
        cpu.sp = 0xFD;
        run_instruction(&mut cpu, &mut bus);
        assert!(cpu.status.contains(Status::C));
        assert!(!cpu.status.contains(Status::B));
        assert!(cpu.status.contains(Status::U));
    }

    #[test]
    fn php_pushes_break_set() {
        let (mut cpu, mut bus) = setup(&[0x08]); // PHP
        cpu.status = Status::C | Status::U;
        run_instruction(&mut cpu, &mut bus);
        let pushed = bus.memory[0x01FD];
        assert_ne!(pushed & Status::B.bits(), 0);
        assert_ne!(pushed & Status::U.bits(), 0);
    }

    #[test]
    fn brk_pushes_break_and_vectors() {
        let (mut cpu, mut bus) = setup(&[0x00, 0xFF]); // BRK + padding
        bus.memory[0xFFFE] = 0x00;
        bus.memory[0xFFFF] = 0x90;
        let cycles = run_instruction(&mut cpu, &mut bus);

        assert_eq!(cycles, 7);
        assert_eq!(cpu.pc, 0x9000);
        assert!(cpu.status.contains(Status::I));
        // Pushed return address skips the padding byte.
        let ret_lo = bus.memory[0x01FC];
        let ret_hi = bus.memory[0x01FD];
        assert_eq!(u16::from_le_bytes([ret_lo, ret_hi]), 0x8002);
        // Pushed status has B set.
        assert_ne!(bus.memory[0x01FB] & Status::B.bits(), 0);
    }

    #[test]
    fn nmi_takes_priority_over_irq() {
        let (mut cpu, mut bus) = setup(&[0xEA]); // NOP
        bus.memory[0xFFFA] = 0x00;
        bus.memory[0xFFFB] = 0xA0;
        bus.memory[0xFFFE] = 0x00;
        bus.memory[0xFFFF] = 0xB0;
        bus.memory[0xA000] = 0xEA; // NMI handler: NOP
        cpu.status.remove(Status::I);
        cpu.raise_nmi();
        cpu.raise_irq();

        run_instruction(&mut cpu, &mut bus);
        assert_eq!(cpu.pc, 0xA000);
        // Pushed status has B clear.
        assert_eq!(bus.memory[0x01FB] & Status::B.bits(), 0);

        // The IRQ stays pending but I is now set, so it waits.
        run_instruction(&mut cpu, &mut bus);
        assert_eq!(cpu.pc, 0xA001);
    }

    #[test]
    fn irq_masked_by_interrupt_disable() {
        let (mut cpu, mut bus) = setup(&[0xEA, 0xEA]);
        bus.memory[0xFFFE] = 0x00;
        bus.memory[0xFFFF] = 0xB0;
        cpu.status.insert(Status::I);
        cpu.raise_irq();

        run_instruction(&mut cpu, &mut bus);
        assert_eq!(cpu.pc, 0x8001);

        // Clearing I lets the held request through.
        cpu.status.remove(Status::I);
        run_instruction(&mut cpu, &mut bus);
        assert_eq!(cpu.pc, 0xB000);
    }

    #[test]
    fn reset_state() {
        let (mut cpu, mut bus) = setup(&[]);
        bus.memory[0xFFFC] = 0x34;
        bus.memory[0xFFFD] = 0x12;
        cpu.sp = 0xFF;
        cpu.status = Status::empty();
        cpu.reset(&mut bus);

        assert_eq!(cpu.pc, 0x1234);
        assert_eq!(cpu.sp, 0xFC);
        assert_eq!(cpu.status, Status::RESET);
        assert_eq!(cpu.pending_cycles(), 6);
    }

    #[test]
    fn oam_transfer_copies_a_page() {
        let (mut cpu, mut bus) = setup(&[]);
        for i in 0..256_usize {
            bus.memory[0xAB00 + i] = i as u8;
        }
        cpu.begin_transfer(0xAB);
        assert!(cpu.transfer_active());

        let mut master = 0_u64;
        let mut cpu_cycles = 0;
        while cpu.transfer_active() {
            cpu.step(&mut bus, master);
            master += 3;
            cpu_cycles += 1;
            assert!(cpu_cycles <= 514, "transfer failed to terminate");
        }

        // Even starting parity costs the extra alignment cycle.
        assert_eq!(cpu_cycles, 514);
        for i in 0..256_usize {
            assert_eq!(bus.oam[i], i as u8);
        }
    }

    #[test]
    fn oam_transfer_odd_start_parity() {
        let (mut cpu, mut bus) = setup(&[]);
        cpu.begin_transfer(0x02);

        // First CPU step lands on odd master parity: 513 cycles total.
        let mut master = 3_u64;
        let mut cpu_cycles = 0;
        while cpu.transfer_active() {
            cpu.step(&mut bus, master);
            master += 3;
            cpu_cycles += 1;
        }
        assert_eq!(cpu_cycles, 513);
    }
}
