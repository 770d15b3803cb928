//! Whole-table opcode coverage.
//!
//! Every opcode byte is executed from a fixed pre-state against a flat
//! memory layout in which each addressing mode resolves to a known operand.
//! Official opcodes are checked for register results and consumed cycles;
//! the 105 unofficial slots are checked for canonical-NOP behaviour: the
//! right PC advance, the table's cycle count, and no register side effects.

use kitsune_cpu::{AddrMode, Bus, Cpu, Mnemonic, Status, OPCODE_TABLE};

struct FlatBus {
    memory: Vec<u8>,
}

impl FlatBus {
    fn new() -> Self {
        Self { memory: vec![0; 0x10000] }
    }
}

impl Bus for FlatBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
    }

    fn write_oam(&mut self, _addr: u8, _data: u8) {}
}

const CODE: u16 = 0x8000;
const OPERAND_LO: u8 = 0x20;
const OPERAND_HI: u8 = 0x03;
const DATA: u8 = 0x5A;
const PRE_X: u8 = 0x04;
const PRE_Y: u8 = 0x10;

/// Build the fixed memory layout: the opcode under test at $8000 with
/// operand bytes $20 $03, and data placed so that every addressing mode
/// resolves without a page crossing.
fn setup(opcode: u8) -> (Cpu, FlatBus) {
    let mut bus = FlatBus::new();
    bus.memory[CODE as usize] = opcode;
    bus.memory[CODE as usize + 1] = OPERAND_LO;
    bus.memory[CODE as usize + 2] = OPERAND_HI;

    bus.memory[0x0020] = DATA; // zero page (also the izy pointer low byte)
    bus.memory[0x0021] = 0x07; // izy pointer high byte -> base $075A
    bus.memory[0x0024] = DATA; // zero page,X (also the izx pointer low byte)
    bus.memory[0x0025] = 0x06; // izx pointer high byte -> $065A
    bus.memory[0x0030] = DATA; // zero page,Y
    bus.memory[0x0320] = DATA; // absolute
    bus.memory[0x0324] = DATA; // absolute,X
    bus.memory[0x0330] = DATA; // absolute,Y
    bus.memory[0x065A] = DATA; // (zp,X) target
    bus.memory[0x076A] = DATA; // (zp),Y target ($075A + Y)

    let mut cpu = Cpu::new();
    cpu.pc = CODE;
    cpu.a = 0x33;
    cpu.x = PRE_X;
    cpu.y = PRE_Y;
    cpu.sp = 0xFD;
    cpu.status = Status::U;
    (cpu, bus)
}

/// The effective address each mode resolves to under the fixed layout.
fn effective_addr(mode: AddrMode) -> u16 {
    match mode {
        AddrMode::ZeroPage => 0x0020,
        AddrMode::ZeroPageX => 0x0024,
        AddrMode::ZeroPageY => 0x0030,
        AddrMode::Absolute => 0x0320,
        AddrMode::AbsoluteX => 0x0324,
        AddrMode::AbsoluteY => 0x0330,
        AddrMode::IndirectX => 0x065A,
        AddrMode::IndirectY => 0x076A,
        AddrMode::Immediate => CODE + 1,
        _ => panic!("mode has no data address"),
    }
}

/// The operand value each mode reads under the fixed layout.
fn operand_value(mode: AddrMode) -> u8 {
    if mode == AddrMode::Immediate {
        OPERAND_LO
    } else {
        DATA
    }
}

/// Run one full instruction, returning the cycles it consumed.
fn run(cpu: &mut Cpu, bus: &mut FlatBus) -> u8 {
    cpu.step(bus, 0);
    let cycles = cpu.pending_cycles() + 1;
    let mut master = 3_u64;
    while cpu.pending_cycles() > 0 {
        cpu.step(bus, master);
        master += 3;
    }
    cycles
}

#[test]
fn unofficial_opcodes_behave_as_nops() {
    for (byte, entry) in OPCODE_TABLE.iter().enumerate() {
        if entry.official {
            continue;
        }

        let opcode = byte as u8;
        let (mut cpu, mut bus) = setup(opcode);
        let cycles = run(&mut cpu, &mut bus);

        let expected_pc = CODE + 1 + entry.mode.operand_size();
        assert_eq!(cpu.pc, expected_pc, "PC after 0x{opcode:02X}");
        assert_eq!(cycles, entry.cycles, "cycles for 0x{opcode:02X}");
        assert_eq!(cpu.a, 0x33, "A clobbered by 0x{opcode:02X}");
        assert_eq!(cpu.x, PRE_X, "X clobbered by 0x{opcode:02X}");
        assert_eq!(cpu.y, PRE_Y, "Y clobbered by 0x{opcode:02X}");
        assert_eq!(cpu.sp, 0xFD, "SP clobbered by 0x{opcode:02X}");
        assert_eq!(cpu.status, Status::U, "status clobbered by 0x{opcode:02X}");
    }
}

#[test]
fn load_opcodes_across_modes() {
    for (byte, entry) in OPCODE_TABLE.iter().enumerate() {
        let target = match entry.mnemonic {
            Mnemonic::Lda => 0,
            Mnemonic::Ldx => 1,
            Mnemonic::Ldy => 2,
            _ => continue,
        };

        let opcode = byte as u8;
        let (mut cpu, mut bus) = setup(opcode);
        let cycles = run(&mut cpu, &mut bus);
        let value = operand_value(entry.mode);

        let register = match target {
            0 => cpu.a,
            1 => cpu.x,
            _ => cpu.y,
        };
        assert_eq!(register, value, "load result for 0x{opcode:02X}");
        assert_eq!(cycles, entry.cycles, "cycles for 0x{opcode:02X}");
        assert_eq!(cpu.pc, CODE + 1 + entry.mode.operand_size());
        assert!(!cpu.status.contains(Status::Z));
        assert!(!cpu.status.contains(Status::N));
    }
}

#[test]
fn store_opcodes_across_modes() {
    for (byte, entry) in OPCODE_TABLE.iter().enumerate() {
        let expected = match entry.mnemonic {
            Mnemonic::Sta => 0x33,
            Mnemonic::Stx => PRE_X,
            Mnemonic::Sty => PRE_Y,
            _ => continue,
        };

        let opcode = byte as u8;
        let (mut cpu, mut bus) = setup(opcode);
        let before = cpu.status;
        let cycles = run(&mut cpu, &mut bus);
        let addr = effective_addr(entry.mode);

        assert_eq!(bus.memory[addr as usize], expected, "store for 0x{opcode:02X}");
        assert_eq!(cycles, entry.cycles, "cycles for 0x{opcode:02X}");
        assert_eq!(cpu.status, before, "stores must not touch flags");
    }
}

#[test]
fn logic_opcodes_across_modes() {
    for (byte, entry) in OPCODE_TABLE.iter().enumerate() {
        if !entry.official {
            continue;
        }
        let expected = match entry.mnemonic {
            Mnemonic::And => 0x33 & operand_value(entry.mode),
            Mnemonic::Ora => 0x33 | operand_value(entry.mode),
            Mnemonic::Eor => 0x33 ^ operand_value(entry.mode),
            _ => continue,
        };

        let opcode = byte as u8;
        let (mut cpu, mut bus) = setup(opcode);
        let cycles = run(&mut cpu, &mut bus);

        assert_eq!(cpu.a, expected, "result for 0x{opcode:02X}");
        assert_eq!(cycles, entry.cycles);
        assert_eq!(cpu.status.contains(Status::Z), expected == 0);
        assert_eq!(cpu.status.contains(Status::N), expected & 0x80 != 0);
    }
}

#[test]
fn arithmetic_opcodes_across_modes() {
    for (byte, entry) in OPCODE_TABLE.iter().enumerate() {
        if !entry.official {
            continue;
        }
        let value = operand_value(entry.mode);
        let expected = match entry.mnemonic {
            Mnemonic::Adc => 0x33_u8.wrapping_add(value),
            // Carry set before SBC: a plain subtract.
            Mnemonic::Sbc => 0x33_u8.wrapping_sub(value),
            _ => continue,
        };

        let opcode = byte as u8;
        let (mut cpu, mut bus) = setup(opcode);
        if entry.mnemonic == Mnemonic::Sbc {
            cpu.status.insert(Status::C);
        }
        let cycles = run(&mut cpu, &mut bus);

        assert_eq!(cpu.a, expected, "result for 0x{opcode:02X}");
        assert_eq!(cycles, entry.cycles);
        assert_eq!(cpu.status.contains(Status::N), expected & 0x80 != 0);
    }
}

#[test]
fn compare_opcodes_across_modes() {
    for (byte, entry) in OPCODE_TABLE.iter().enumerate() {
        if !entry.official {
            continue;
        }
        let register = match entry.mnemonic {
            Mnemonic::Cmp => 0x33,
            Mnemonic::Cpx => PRE_X,
            Mnemonic::Cpy => PRE_Y,
            _ => continue,
        };

        let opcode = byte as u8;
        let (mut cpu, mut bus) = setup(opcode);
        let cycles = run(&mut cpu, &mut bus);
        let value = operand_value(entry.mode);

        assert_eq!(cycles, entry.cycles);
        assert_eq!(cpu.status.contains(Status::C), register >= value, "C for 0x{opcode:02X}");
        assert_eq!(cpu.status.contains(Status::Z), register == value, "Z for 0x{opcode:02X}");
        // A, X, Y unchanged by compares.
        assert_eq!(cpu.a, 0x33);
        assert_eq!(cpu.x, PRE_X);
        assert_eq!(cpu.y, PRE_Y);
    }
}

#[test]
fn shift_and_step_opcodes_across_modes() {
    for (byte, entry) in OPCODE_TABLE.iter().enumerate() {
        if !entry.official {
            continue;
        }
        let operate: fn(u8) -> u8 = match entry.mnemonic {
            Mnemonic::Asl => |v| v << 1,
            Mnemonic::Lsr => |v| v >> 1,
            Mnemonic::Rol => |v| v << 1, // carry starts clear
            Mnemonic::Ror => |v| v >> 1,
            Mnemonic::Inc => |v| v.wrapping_add(1),
            Mnemonic::Dec => |v| v.wrapping_sub(1),
            _ => continue,
        };

        let opcode = byte as u8;
        let (mut cpu, mut bus) = setup(opcode);
        let cycles = run(&mut cpu, &mut bus);

        if entry.mode == AddrMode::Accumulator {
            assert_eq!(cpu.a, operate(0x33), "A result for 0x{opcode:02X}");
        } else {
            let addr = effective_addr(entry.mode);
            assert_eq!(bus.memory[addr as usize], operate(DATA), "memory result for 0x{opcode:02X}");
        }
        assert_eq!(cycles, entry.cycles, "cycles for 0x{opcode:02X}");
    }
}

#[test]
fn branch_opcodes_taken_and_not_taken() {
    // (opcode, flag, branches_when_set)
    let branches = [
        (0x10_u8, Status::N, false), // BPL
        (0x30, Status::N, true),     // BMI
        (0x50, Status::V, false),    // BVC
        (0x70, Status::V, true),     // BVS
        (0x90, Status::C, false),    // BCC
        (0xB0, Status::C, true),     // BCS
        (0xD0, Status::Z, false),    // BNE
        (0xF0, Status::Z, true),     // BEQ
    ];

    for (opcode, flag, on_set) in branches {
        for set in [false, true] {
            let (mut cpu, mut bus) = setup(opcode);
            cpu.status.set(flag, set);
            let cycles = run(&mut cpu, &mut bus);

            let taken = set == on_set;
            if taken {
                // Offset $20 forward from the post-operand PC, same page.
                assert_eq!(cpu.pc, CODE + 2 + u16::from(OPERAND_LO), "target for 0x{opcode:02X}");
                assert_eq!(cycles, 3, "taken cycles for 0x{opcode:02X}");
            } else {
                assert_eq!(cpu.pc, CODE + 2, "fallthrough for 0x{opcode:02X}");
                assert_eq!(cycles, 2, "untaken cycles for 0x{opcode:02X}");
            }
        }
    }
}

#[test]
fn implied_register_opcodes() {
    // (opcode, apply) pairs covering the register-only operations.
    let cases: &[(u8, fn(&mut Cpu))] = &[
        (0xAA, |c| c.x = c.a),                  // TAX
        (0xA8, |c| c.y = c.a),                  // TAY
        (0x8A, |c| c.a = c.x),                  // TXA
        (0x98, |c| c.a = c.y),                  // TYA
        (0xBA, |c| c.x = c.sp),                 // TSX
        (0xE8, |c| c.x = c.x.wrapping_add(1)),  // INX
        (0xC8, |c| c.y = c.y.wrapping_add(1)),  // INY
        (0xCA, |c| c.x = c.x.wrapping_sub(1)),  // DEX
        (0x88, |c| c.y = c.y.wrapping_sub(1)),  // DEY
    ];

    for &(opcode, apply) in cases {
        let (mut cpu, mut bus) = setup(opcode);
        let mut expected = Cpu::new();
        expected.a = cpu.a;
        expected.x = cpu.x;
        expected.y = cpu.y;
        expected.sp = cpu.sp;
        apply(&mut expected);

        let cycles = run(&mut cpu, &mut bus);
        assert_eq!(cycles, 2, "cycles for 0x{opcode:02X}");
        assert_eq!(cpu.pc, CODE + 1);
        assert_eq!(cpu.a, expected.a, "A for 0x{opcode:02X}");
        assert_eq!(cpu.x, expected.x, "X for 0x{opcode:02X}");
        assert_eq!(cpu.y, expected.y, "Y for 0x{opcode:02X}");
    }
}

#[test]
fn every_opcode_advances_or_jumps() {
    // Sanity over the whole table: after one instruction the CPU is at a
    // well-defined PC and the pending counter has drained.
    for byte in 0..=255_u8 {
        let (mut cpu, mut bus) = setup(byte);
        // Give RTI/RTS/BRK sane stack and vector contents.
        bus.memory[0xFFFE] = 0x00;
        bus.memory[0xFFFF] = 0x90;
        let cycles = run(&mut cpu, &mut bus);

        assert!(cycles >= 2, "0x{byte:02X} consumed {cycles} cycles");
        assert_eq!(cpu.pending_cycles(), 0);
    }
}
