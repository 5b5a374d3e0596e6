use crate::Word;
use std::mem;

pub const WORD_BYTES     : u32 = mem::size_of::<Word>() as u32;

/// Size of the flat VM memory in bytes.
pub const MEMORY_BYTES   : usize = 1 << 20;

/// Number of registers in the register file.
pub const REGISTER_COUNT : usize = 256;

/// Address the program image is loaded at, and the initial program counter.
/// Byte 0 of memory is reserved and stays zero.
pub const RESET_PC       : u32 = 1;

/// Register index the `Z` alias resolves to.
pub const REG_Z          : u8 = 254;
/// Register index the `SP` alias resolves to. The stack grows downward with
/// a 4-byte stride; programs initialize SP themselves before first use.
pub const REG_SP         : u8 = 255;

// Condition code bits, set by CMP only.
pub const CC_EQ          : u8 = 1;
pub const CC_LT          : u8 = 2;
pub const CC_GT          : u8 = 4;

/// Mask extracting the operation from an opcode byte.
pub const OP_MASK        : u8 = 0x3f;
/// Shift extracting the argument-type bits from an opcode byte.
pub const ARG_TYPE_SHIFT : u32 = 6;
