use std::fmt;

use num_integer::Integer;
use num_traits::FromPrimitive;

use crate::isa::{Op, OperandKind};
use crate::{constants, Host, Memory, Word};

/// Why a program stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exit {
    Exited(Word),                            // EXIT was executed with this code
    InvalidOpcode { addr: u32, opcode: u8 }, // operation bits name no operation
    OutOfBounds { addr: u32, target: i64 },  // memory access outside the address space
    DivisionByZero { addr: u32 },            // DIV or MOD with a zero divisor
    InvalidString { addr: u32 },             // syscall operand bytes were not UTF-8
    Io { addr: u32, message: String },       // the host failed to perform a syscall
}

impl Exit {
    /// Process exit code: the EXIT operand, or 1 for any abnormal stop.
    pub fn code(&self) -> Word {
        match *self {
            Exit::Exited(code) => code,
            _ => 1,
        }
    }
}

impl fmt::Display for Exit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Exit::Exited(code) => write!(f, "exited with code {}", code),
            Exit::InvalidOpcode { addr, opcode } => {
                write!(f, "invalid opcode 0x{:02x} at address {}", opcode, addr)
            }
            Exit::OutOfBounds { addr, target } => write!(
                f,
                "memory access out of bounds at address {} (target {})",
                addr, target
            ),
            Exit::DivisionByZero { addr } => write!(f, "division by zero at address {}", addr),
            Exit::InvalidString { addr } => {
                write!(f, "invalid UTF-8 string at address {}", addr)
            }
            Exit::Io { addr, ref message } => {
                write!(f, "I/O error at address {}: {}", addr, message)
            }
        }
    }
}

/// The execution engine: register file, condition code and program counter.
///
/// Memory and the syscall host are passed into [`step`]/[`run`] so the same
/// processor can be driven against different environments.
///
/// [`step`]: #method.step
/// [`run`]: #method.run
pub struct Processor {
    registers: [Word; constants::REGISTER_COUNT],
    pc: u32,
    cc: u8,
    trace: bool,
}

impl Processor {
    pub fn new() -> Processor {
        Processor {
            registers: [0; constants::REGISTER_COUNT],
            pc: constants::RESET_PC,
            cc: 0,
            trace: false,
        }
    }

    pub fn register(&self, index: u8) -> Word {
        self.registers[index as usize]
    }

    pub fn set_register(&mut self, index: u8, value: Word) {
        self.registers[index as usize] = value;
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn cc(&self) -> u8 {
        self.cc
    }

    /// Enables or disables the per-step debug trace on stderr.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /// Runs until the program exits or traps.
    pub fn run(&mut self, memory: &mut Memory, host: &mut dyn Host) -> Exit {
        loop {
            if let Some(exit) = self.step(memory, host) {
                return exit;
            }
        }
    }

    /// Executes one instruction. Returns `None` while the program keeps
    /// running.
    pub fn step(&mut self, memory: &mut Memory, host: &mut dyn Host) -> Option<Exit> {
        match self.tick(memory, host) {
            Ok(None) => None,
            Ok(Some(code)) => Some(Exit::Exited(code)),
            Err(exit) => Some(exit),
        }
    }

    fn fetch_byte(&mut self, memory: &Memory, instr_addr: u32) -> Result<u8, Exit> {
        let byte = memory.read_byte(self.pc).map_err(|_| Exit::OutOfBounds {
            addr: instr_addr,
            target: i64::from(self.pc),
        })?;
        self.pc = self.pc.wrapping_add(1);
        Ok(byte)
    }

    fn fetch_word(&mut self, memory: &Memory, instr_addr: u32) -> Result<Word, Exit> {
        let word = memory.read_word(self.pc).map_err(|_| Exit::OutOfBounds {
            addr: instr_addr,
            target: i64::from(self.pc),
        })?;
        self.pc = self.pc.wrapping_add(constants::WORD_BYTES);
        Ok(word)
    }

    fn mem_read_byte(&self, memory: &Memory, instr_addr: u32, addr: Word) -> Result<Word, Exit> {
        memory
            .read_byte(addr as u32)
            .map(Word::from)
            .map_err(|_| Exit::OutOfBounds {
                addr: instr_addr,
                target: i64::from(addr),
            })
    }

    fn mem_read_word(&self, memory: &Memory, instr_addr: u32, addr: Word) -> Result<Word, Exit> {
        memory.read_word(addr as u32).map_err(|_| Exit::OutOfBounds {
            addr: instr_addr,
            target: i64::from(addr),
        })
    }

    fn mem_write_byte(
        &self,
        memory: &mut Memory,
        instr_addr: u32,
        addr: Word,
        value: u8,
    ) -> Result<(), Exit> {
        memory.write_byte(addr as u32, value).map_err(|_| Exit::OutOfBounds {
            addr: instr_addr,
            target: i64::from(addr),
        })
    }

    fn mem_write_word(
        &self,
        memory: &mut Memory,
        instr_addr: u32,
        addr: Word,
        value: Word,
    ) -> Result<(), Exit> {
        memory.write_word(addr as u32, value).map_err(|_| Exit::OutOfBounds {
            addr: instr_addr,
            target: i64::from(addr),
        })
    }

    fn push(&mut self, memory: &mut Memory, instr_addr: u32, value: Word) -> Result<(), Exit> {
        let sp = self.registers[constants::REG_SP as usize].wrapping_sub(4);
        self.mem_write_word(memory, instr_addr, sp, value)?;
        self.registers[constants::REG_SP as usize] = sp;
        Ok(())
    }

    fn pop(&mut self, memory: &Memory, instr_addr: u32) -> Result<Word, Exit> {
        let sp = self.registers[constants::REG_SP as usize];
        let value = self.mem_read_word(memory, instr_addr, sp)?;
        self.registers[constants::REG_SP as usize] = sp.wrapping_add(4);
        Ok(value)
    }

    fn read_string(
        &self,
        memory: &Memory,
        instr_addr: u32,
        addr: Word,
        len: Word,
    ) -> Result<String, Exit> {
        let out_of_bounds = Exit::OutOfBounds {
            addr: instr_addr,
            target: i64::from(addr) + i64::from(len),
        };
        if len < 0 {
            return Err(out_of_bounds);
        }
        let bytes = memory
            .borrow_slice(addr as u32, len as u32)
            .map_err(|_| out_of_bounds)?;
        match std::str::from_utf8(bytes) {
            Ok(text) => Ok(text.to_owned()),
            Err(_) => Err(Exit::InvalidString { addr: instr_addr }),
        }
    }

    /// One fetch/decode/execute round. `Ok(Some(code))` is a normal EXIT.
    fn tick(&mut self, memory: &mut Memory, host: &mut dyn Host) -> Result<Option<Word>, Exit> {
        let instr_addr = self.pc;
        let opcode = self.fetch_byte(memory, instr_addr)?;
        let arg = OperandKind::from_arg_bits(opcode >> constants::ARG_TYPE_SHIFT);
        let op = Op::from_u8(opcode & constants::OP_MASK).ok_or(Exit::InvalidOpcode {
            addr: instr_addr,
            opcode,
        })?;

        if self.trace {
            eprintln!(
                "DEBUG: PC={} CC={} OP=0x{:02x} ({:?}) AT={}",
                instr_addr,
                self.cc,
                opcode,
                op,
                arg.arg_bits()
            );
        }

        // Read the operands: register indices first, then register values,
        // then the final operands in the form the argument type dictates.
        let layout = op.operands();
        let mut o = [0 as Word; 3];
        let mut slot = 0;
        for _ in 0..layout.nout {
            o[slot] = Word::from(self.fetch_byte(memory, instr_addr)?);
            slot += 1;
        }
        for _ in 0..layout.ninr {
            let index = self.fetch_byte(memory, instr_addr)?;
            o[slot] = self.registers[index as usize];
            slot += 1;
        }
        for _ in 0..layout.ninx {
            o[slot] = match arg {
                OperandKind::Imm32 => self.fetch_word(memory, instr_addr)?,
                OperandKind::Reg => {
                    let index = self.fetch_byte(memory, instr_addr)?;
                    self.registers[index as usize]
                }
                OperandKind::Imm8 => Word::from(self.fetch_byte(memory, instr_addr)? as i8),
                OperandKind::PcRel8 => Word::from(self.fetch_byte(memory, instr_addr)? as i8)
                    .wrapping_add(instr_addr as Word),
            };
            slot += 1;
        }
        debug_assert_eq!(slot as u32, layout.count());

        match op {
            Op::MOV => {
                self.registers[o[0] as usize] = o[1];
            }

            Op::LDB => {
                let addr = o[1].wrapping_add(o[2]);
                self.registers[o[0] as usize] = self.mem_read_byte(memory, instr_addr, addr)?;
            }

            Op::LDW => {
                let addr = o[1].wrapping_add(o[2]);
                self.registers[o[0] as usize] = self.mem_read_word(memory, instr_addr, addr)?;
            }

            Op::STB => {
                let addr = o[1].wrapping_add(o[2]);
                self.mem_write_byte(memory, instr_addr, addr, o[0] as u8)?;
            }

            Op::STW => {
                let addr = o[1].wrapping_add(o[2]);
                self.mem_write_word(memory, instr_addr, addr, o[0])?;
            }

            Op::JMP => {
                self.pc = o[0] as u32;
            }

            Op::JSR => {
                let return_addr = self.pc as Word;
                self.push(memory, instr_addr, return_addr)?;
                self.pc = o[0] as u32;
            }

            Op::RTS => {
                let return_addr = self.pop(memory, instr_addr)?;
                self.pc = return_addr as u32;
            }

            Op::BEQ => {
                if self.cc & constants::CC_EQ != 0 {
                    self.pc = o[0] as u32;
                }
            }

            Op::BNE => {
                if self.cc & constants::CC_EQ == 0 {
                    self.pc = o[0] as u32;
                }
            }

            Op::BLT => {
                if self.cc & constants::CC_LT != 0 {
                    self.pc = o[0] as u32;
                }
            }

            Op::BLE => {
                if self.cc & (constants::CC_LT | constants::CC_EQ) != 0 {
                    self.pc = o[0] as u32;
                }
            }

            Op::BGT => {
                if self.cc & constants::CC_GT != 0 {
                    self.pc = o[0] as u32;
                }
            }

            Op::BGE => {
                if self.cc & (constants::CC_GT | constants::CC_EQ) != 0 {
                    self.pc = o[0] as u32;
                }
            }

            Op::CMP => {
                self.cc = 0;
                if o[0] == o[1] {
                    self.cc |= constants::CC_EQ;
                }
                if o[0] < o[1] {
                    self.cc |= constants::CC_LT;
                }
                if o[0] > o[1] {
                    self.cc |= constants::CC_GT;
                }
            }

            Op::PUSH => {
                self.push(memory, instr_addr, o[0])?;
            }

            Op::POP => {
                let value = self.pop(memory, instr_addr)?;
                self.registers[o[0] as usize] = value;
            }

            Op::ADD => {
                let rd = o[0] as usize;
                self.registers[rd] = self.registers[rd].wrapping_add(o[1]);
            }

            Op::SUB => {
                let rd = o[0] as usize;
                self.registers[rd] = self.registers[rd].wrapping_sub(o[1]);
            }

            Op::MUL => {
                let rd = o[0] as usize;
                self.registers[rd] = self.registers[rd].wrapping_mul(o[1]);
            }

            Op::DIV => {
                if o[1] == 0 {
                    return Err(Exit::DivisionByZero { addr: instr_addr });
                }
                let rd = o[0] as usize;
                self.registers[rd] = div_floor(self.registers[rd], o[1]);
            }

            Op::MOD => {
                if o[1] == 0 {
                    return Err(Exit::DivisionByZero { addr: instr_addr });
                }
                let rd = o[0] as usize;
                self.registers[rd] = mod_floor(self.registers[rd], o[1]);
            }

            Op::AND => {
                self.registers[o[0] as usize] &= o[1];
            }

            Op::OR => {
                self.registers[o[0] as usize] |= o[1];
            }

            Op::XOR => {
                self.registers[o[0] as usize] ^= o[1];
            }

            Op::SHL => {
                let rd = o[0] as usize;
                self.registers[rd] = self.registers[rd].wrapping_shl(o[1] as u32);
            }

            Op::SHR => {
                // Arithmetic shift; the amount is masked modulo 32.
                let rd = o[0] as usize;
                self.registers[rd] = self.registers[rd].wrapping_shr(o[1] as u32);
            }

            Op::EXIT => {
                return Ok(Some(o[0]));
            }

            Op::PRINTLN => {
                let text = self.read_string(memory, instr_addr, o[0], o[1])?;
                host.println(&text).map_err(|err| Exit::Io {
                    addr: instr_addr,
                    message: err.to_string(),
                })?;
            }

            Op::PRINT => {
                let text = self.read_string(memory, instr_addr, o[0], o[1])?;
                host.print(&text).map_err(|err| Exit::Io {
                    addr: instr_addr,
                    message: err.to_string(),
                })?;
            }

            Op::RUN => {
                let command = self.read_string(memory, instr_addr, o[0], o[1])?;
                host.run(&command).map_err(|err| Exit::Io {
                    addr: instr_addr,
                    message: err.to_string(),
                })?;
            }
        }

        Ok(None)
    }
}

impl Default for Processor {
    fn default() -> Processor {
        Processor::new()
    }
}

/// Floor division, computed in 64 bits so `i32::MIN / -1` wraps instead of
/// overflowing. The result rounds toward negative infinity: `-7 / 2 == -4`.
fn div_floor(lhs: Word, rhs: Word) -> Word {
    i64::from(lhs).div_floor(&i64::from(rhs)) as Word
}

/// Floor modulo; the result has the sign of the divisor: `-7 mod 2 == 1`.
fn mod_floor(lhs: Word, rhs: Word) -> Word {
    i64::from(lhs).mod_floor(&i64::from(rhs)) as Word
}
