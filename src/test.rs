use super::*;
use std::io;

/// Host that records syscall effects instead of touching stdout or a shell.
#[derive(Default)]
struct RecordingHost {
    output: String,
    commands: Vec<String>,
}

impl Host for RecordingHost {
    fn print(&mut self, text: &str) -> io::Result<()> {
        self.output.push_str(text);
        Ok(())
    }

    fn println(&mut self, text: &str) -> io::Result<()> {
        self.output.push_str(text);
        self.output.push('\n');
        Ok(())
    }

    fn run(&mut self, command: &str) -> io::Result<()> {
        self.commands.push(command.to_owned());
        Ok(())
    }
}

fn run_image(image: &[u8]) -> (Processor, Memory, RecordingHost, Exit) {
    let mut memory = Memory::new();
    memory.load(constants::RESET_PC, image).unwrap();
    let mut processor = Processor::new();
    let mut host = RecordingHost::default();
    let exit = processor.run(&mut memory, &mut host);
    (processor, memory, host, exit)
}

#[test]
fn mov_add_exit() {
    let (processor, _, _, exit) = run_image(&[
        0x41, 1, 5, // MOV R1, #5
        0x41, 2, 7, // MOV R2, #7
        0x12, 1, 2, // ADD R1, R2
        0x1c, 1, // EXIT R1
    ]);

    assert_eq!(exit, Exit::Exited(12));
    assert_eq!(processor.register(1), 12);
}

#[test]
fn jsr_rts_restores_stack() {
    let (processor, _, _, exit) = run_image(&[
        0xc1, 255, 0x00, 0x00, 0x10, 0x00, // MOV SP, #0x100000      (addr 1)
        0x47, 11, // JSR #11                                         (addr 7)
        0x5c, 0, // EXIT #0                                          (addr 9)
        0x41, 1, 1, // MOV R1, #1                                    (addr 11)
        0x08, // RTS                                                 (addr 14)
    ]);

    assert_eq!(exit, Exit::Exited(0));
    assert_eq!(processor.register(1), 1);
    assert_eq!(processor.register(constants::REG_SP), 0x0010_0000);
}

#[test]
fn cmp_blt_taken_on_negative() {
    let (_, _, _, exit) = run_image(&[
        0x41, 1, 0xff, // MOV R1, #-1                                (addr 1)
        0x4f, 1, 0, // CMP R1, #0                                    (addr 4)
        0x8b, 4, // BLT pc+4                                         (addr 7)
        0x5c, 1, // EXIT #1                                          (addr 9)
        0x5c, 2, // EXIT #2                                          (addr 11)
    ]);

    assert_eq!(exit, Exit::Exited(2));
}

#[test]
fn bge_taken_on_equal() {
    let (_, _, _, exit) = run_image(&[
        0x41, 1, 3, // MOV R1, #3                                    (addr 1)
        0x4f, 1, 3, // CMP R1, #3                                    (addr 4)
        0x8e, 4, // BGE pc+4                                         (addr 7)
        0x5c, 1, // EXIT #1                                          (addr 9)
        0x5c, 2, // EXIT #2                                          (addr 11)
    ]);

    assert_eq!(exit, Exit::Exited(2));
}

#[test]
fn bne_not_taken_on_equal() {
    let (_, _, _, exit) = run_image(&[
        0x41, 1, 3, // MOV R1, #3
        0x4f, 1, 3, // CMP R1, #3
        0x8a, 4, // BNE pc+4 (not taken)
        0x5c, 1, // EXIT #1
        0x5c, 2, // EXIT #2
    ]);

    assert_eq!(exit, Exit::Exited(1));
}

#[test]
fn div_rounds_toward_negative_infinity() {
    let (_, _, _, exit) = run_image(&[
        0x41, 1, 0xf9, // MOV R1, #-7
        0x41, 2, 2, // MOV R2, #2
        0x15, 1, 2, // DIV R1, R2
        0x1c, 1, // EXIT R1
    ]);

    assert_eq!(exit, Exit::Exited(-4));
}

#[test]
fn mod_follows_divisor_sign() {
    let (_, _, _, exit) = run_image(&[
        0x41, 1, 0xf9, // MOV R1, #-7
        0x41, 2, 2, // MOV R2, #2
        0x16, 1, 2, // MOD R1, R2
        0x1c, 1, // EXIT R1
    ]);

    assert_eq!(exit, Exit::Exited(1));
}

#[test]
fn push_immediate_pop() {
    let (processor, _, _, exit) = run_image(&[
        0xc1, 255, 0x00, 0x00, 0x10, 0x00, // MOV SP, #0x100000
        0x50, 42, // PUSH #42
        0x11, 3, // POP R3
        0x5c, 0, // EXIT #0
    ]);

    assert_eq!(exit, Exit::Exited(0));
    assert_eq!(processor.register(3), 42);
    assert_eq!(processor.register(constants::REG_SP), 0x0010_0000);
}

#[test]
fn store_and_load_little_endian() {
    let (processor, memory, _, exit) = run_image(&[
        0xc1, 1, 0x34, 0x12, 0x00, 0x00, // MOV R1, #0x1234
        0xc1, 2, 0x00, 0x80, 0x00, 0x00, // MOV R2, #0x8000
        0x45, 1, 2, 0, // STW R1, R2, #0
        0x43, 3, 2, 0, // LDW R3, R2, #0
        0x42, 4, 2, 1, // LDB R4, R2, #1
        0x5c, 0, // EXIT #0
    ]);

    assert_eq!(exit, Exit::Exited(0));
    assert_eq!(processor.register(3), 0x1234);
    assert_eq!(processor.register(4), 0x12);
    assert_eq!(memory.read_byte(0x8000), Ok(0x34));
    assert_eq!(memory.read_byte(0x8001), Ok(0x12));
}

#[test]
fn print_and_println_flush_in_order() {
    let (_, _, host, exit) = run_image(&[
        0x41, 1, 12, // MOV R1, #12                                  (addr 1)
        0x5e, 1, 3, // PRINT R1, #3                                  (addr 4)
        0x5d, 1, 2, // PRINTLN R1, #2                                (addr 7)
        0x5c, 0, // EXIT #0                                          (addr 10)
        b'h', b'i', b'\n', // string data                            (addr 12)
    ]);

    assert_eq!(exit, Exit::Exited(0));
    assert_eq!(host.output, "hi\nhi\n");
    assert!(host.commands.is_empty());
}

#[test]
fn run_passes_command_to_host() {
    let (_, _, host, exit) = run_image(&[
        0x41, 1, 9, // MOV R1, #9
        0x5f, 1, 4, // RUN R1, #4
        0x5c, 0, // EXIT #0
        b't', b'r', b'u', b'e', // command text (addr 9)
    ]);

    assert_eq!(exit, Exit::Exited(0));
    assert_eq!(host.commands, vec!["true".to_owned()]);
}

#[test]
fn pcrel_operand_adds_instruction_address() {
    // MOV R1, pc+9 at address 1 leaves 10 in R1.
    let (_, _, _, exit) = run_image(&[
        0x81, 1, 9, // MOV R1, pcrel 9
        0x1c, 1, // EXIT R1
    ]);

    assert_eq!(exit, Exit::Exited(10));
}

#[test]
fn add_wraps_on_overflow() {
    let (_, _, _, exit) = run_image(&[
        0xc1, 1, 0xff, 0xff, 0xff, 0x7f, // MOV R1, #0x7fffffff
        0x52, 1, 1, // ADD R1, #1
        0x1c, 1, // EXIT R1
    ]);

    assert_eq!(exit, Exit::Exited(i32::min_value()));
}

#[test]
fn shr_is_arithmetic() {
    let (_, _, _, exit) = run_image(&[
        0x41, 1, 0xf8, // MOV R1, #-8
        0x5b, 1, 1, // SHR R1, #1
        0x1c, 1, // EXIT R1
    ]);

    assert_eq!(exit, Exit::Exited(-4));
}

#[test]
fn shl_shifts_left() {
    let (_, _, _, exit) = run_image(&[
        0x41, 1, 3, // MOV R1, #3
        0x5a, 1, 4, // SHL R1, #4
        0x1c, 1, // EXIT R1
    ]);

    assert_eq!(exit, Exit::Exited(48));
}

#[test]
fn logic_ops() {
    let (processor, _, _, exit) = run_image(&[
        0x41, 1, 0x3c, // MOV R1, #0x3c
        0x57, 1, 0x0f, // AND R1, #0x0f
        0x41, 2, 0x30, // MOV R2, #0x30
        0x58, 2, 0x03, // OR R2, #0x03
        0x41, 3, 0x3c, // MOV R3, #0x3c
        0x59, 3, 0x0f, // XOR R3, #0x0f
        0x5c, 0, // EXIT #0
    ]);

    assert_eq!(exit, Exit::Exited(0));
    assert_eq!(processor.register(1), 0x0c);
    assert_eq!(processor.register(2), 0x33);
    assert_eq!(processor.register(3), 0x33);
}

#[test]
fn unknown_operation_traps() {
    let (_, _, _, exit) = run_image(&[0x00]);

    assert_eq!(
        exit,
        Exit::InvalidOpcode {
            addr: 1,
            opcode: 0x00
        }
    );
    assert_eq!(exit.code(), 1);
}

#[test]
fn division_by_zero_traps() {
    let (_, _, _, exit) = run_image(&[
        0x41, 1, 5, // MOV R1, #5   (addr 1)
        0x15, 1, 2, // DIV R1, R2   (addr 4; R2 is 0)
    ]);

    assert_eq!(exit, Exit::DivisionByZero { addr: 4 });
    assert_eq!(exit.code(), 1);
}

#[test]
fn out_of_bounds_load_traps() {
    let (_, _, _, exit) = run_image(&[
        0xc1, 1, 0x00, 0x00, 0x20, 0x00, // MOV R1, #0x200000  (addr 1)
        0x42, 2, 1, 0, // LDB R2, R1, #0                        (addr 7)
    ]);

    assert_eq!(
        exit,
        Exit::OutOfBounds {
            addr: 7,
            target: 0x0020_0000
        }
    );
}

#[test]
fn falling_off_the_image_hits_zeroed_memory() {
    // Without an EXIT the processor fetches opcode 0 right after the image.
    let (_, _, _, exit) = run_image(&[0x41, 1, 5]);

    assert_eq!(
        exit,
        Exit::InvalidOpcode {
            addr: 4,
            opcode: 0x00
        }
    );
}

#[test]
fn variant_table_matches_operand_layouts() {
    use num_traits::FromPrimitive;

    for &mnemonic in MNEMONICS {
        let descrs = variants(mnemonic).unwrap();
        assert!(!descrs.is_empty(), "{} has no variants", mnemonic);

        for variant in descrs {
            let op = Op::from_u8(variant.opcode & constants::OP_MASK)
                .unwrap_or_else(|| panic!("{}: bad operation bits", mnemonic));
            let layout = op.operands();

            assert_eq!(
                variant.operands.len() as u32,
                layout.count(),
                "{}: operand count mismatch",
                mnemonic
            );

            // The argument-type bits describe the final operand; variants
            // without operands use zero.
            let arg_bits = variant.opcode >> constants::ARG_TYPE_SHIFT;
            match variant.operands.last() {
                Some(last) => assert_eq!(arg_bits, last.arg_bits(), "{}", mnemonic),
                None => assert_eq!(arg_bits, 0, "{}", mnemonic),
            }

            // Non-final operands are always register index bytes.
            for kind in &variant.operands[..variant.operands.len().saturating_sub(1)] {
                assert_eq!(*kind, OperandKind::Reg, "{}", mnemonic);
            }
        }
    }
}

#[test]
fn exit_code_of_traps_is_one() {
    assert_eq!(Exit::Exited(7).code(), 7);
    assert_eq!(Exit::DivisionByZero { addr: 1 }.code(), 1);
    assert_eq!(
        Exit::OutOfBounds {
            addr: 1,
            target: -4
        }
        .code(),
        1
    );
}
