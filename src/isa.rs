use num_derive::{FromPrimitive, ToPrimitive};

/// Operation part of an opcode byte.
///
/// The opcode byte is `(argtype << 6) | op`: the low six bits select one of
/// these operations, the top two bits select the form of the final operand
/// (see [`OperandKind`]). The operand list of each operation is fixed and
/// described by [`Op::operands`].
///
/// [`OperandKind`]: enum.OperandKind.html
/// [`Op::operands`]: enum.Op.html#method.operands
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum Op {
    //  Mnemonic  | Operands       | Effect
    //------------+----------------+------------------------------------------
    MOV = 1, // | Rd, v          | Rd = v
    LDB,     // | Rd, Rbase, v   | Rd = zero_extend(mem8[Rbase + v])
    LDW,     // | Rd, Rbase, v   | Rd = mem32[Rbase + v]
    STB,     // | Rs, Rbase, v   | mem8[Rbase + v] = Rs & 0xff
    STW,     // | Rs, Rbase, v   | mem32[Rbase + v] = Rs
    JMP,     // | v              | PC = v
    JSR,     // | v              | SP -= 4; mem32[SP] = PC; PC = v
    RTS,     // |                | PC = mem32[SP]; SP += 4
    BEQ,     // | v              | if EQ: PC = v
    BNE,     // | v              | if !EQ: PC = v
    BLT,     // | v              | if LT: PC = v
    BLE,     // | v              | if LT or EQ: PC = v
    BGT,     // | v              | if GT: PC = v
    BGE,     // | v              | if GT or EQ: PC = v
    CMP,     // | Ra, v          | CC = compare(Ra, v) (signed)
    PUSH,    // | v              | SP -= 4; mem32[SP] = v
    POP,     // | Rd             | Rd = mem32[SP]; SP += 4
    ADD,     // | Rd, v          | Rd += v
    SUB,     // | Rd, v          | Rd -= v
    MUL,     // | Rd, v          | Rd *= v
    DIV,     // | Rd, v          | Rd = floor(Rd / v)
    MOD,     // | Rd, v          | Rd = Rd mod v (floor)
    AND,     // | Rd, v          | Rd &= v
    OR,      // | Rd, v          | Rd |= v
    XOR,     // | Rd, v          | Rd ^= v
    SHL,     // | Rd, v          | Rd <<= v
    SHR,     // | Rd, v          | Rd >>= v (arithmetic)
    EXIT,    // | v              | stop with exit code v
    PRINTLN, // | Raddr, len     | print UTF-8 mem[Raddr..Raddr+len] + newline
    PRINT,   // | Raddr, len     | print UTF-8 mem[Raddr..Raddr+len]
    RUN,     // | Raddr, len     | run UTF-8 mem[Raddr..Raddr+len] in the shell
}

/// Form of an encoded operand.
///
/// All non-final operands are single register-index bytes (`Reg`); the form
/// of the final operand is selected by the argument-type bits of the opcode
/// byte.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OperandKind {
    /// Register index byte; read as the register's value in the final slot.
    Reg = 0,
    /// 8-bit signed immediate.
    Imm8 = 1,
    /// 8-bit signed offset relative to the address of the opcode byte.
    PcRel8 = 2,
    /// 32-bit little-endian immediate or absolute address.
    Imm32 = 3,
}

impl OperandKind {
    /// Decodes the argument-type bits of an opcode byte (`opcode >> 6`).
    pub fn from_arg_bits(bits: u8) -> OperandKind {
        match bits & 3 {
            0 => OperandKind::Reg,
            1 => OperandKind::Imm8,
            2 => OperandKind::PcRel8,
            _ => OperandKind::Imm32,
        }
    }

    /// The two bits this kind occupies at the top of an opcode byte.
    pub fn arg_bits(self) -> u8 {
        self as u8
    }

    /// Number of bytes an operand of this kind occupies after the opcode.
    pub fn encoded_size(self) -> u32 {
        match self {
            OperandKind::Imm32 => 4,
            _ => 1,
        }
    }
}

/// Operand counts for one operation, in decode order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct OperandLayout {
    /// Output (or in/out) register operands, read as register indices.
    pub nout: u32,
    /// Input register operands, read as register values.
    pub ninr: u32,
    /// Final operands whose form follows the opcode's argument-type bits.
    pub ninx: u32,
}

impl OperandLayout {
    pub fn count(&self) -> u32 {
        self.nout + self.ninr + self.ninx
    }
}

impl Op {
    /// Operand layout of this operation. The decoder reads `nout` register
    /// indices, then `ninr` register values, then `ninx` final operands.
    pub fn operands(self) -> OperandLayout {
        let (nout, ninr, ninx) = match self {
            Op::MOV => (1, 0, 1),
            Op::LDB | Op::LDW => (1, 1, 1),
            Op::STB | Op::STW => (0, 2, 1),
            Op::JMP | Op::JSR => (0, 0, 1),
            Op::RTS => (0, 0, 0),
            Op::BEQ | Op::BNE | Op::BLT | Op::BLE | Op::BGT | Op::BGE => (0, 0, 1),
            Op::CMP => (0, 1, 1),
            Op::PUSH => (0, 0, 1),
            Op::POP => (1, 0, 0),
            Op::ADD | Op::SUB | Op::MUL | Op::DIV | Op::MOD => (1, 0, 1),
            Op::AND | Op::OR | Op::XOR | Op::SHL | Op::SHR => (1, 0, 1),
            Op::EXIT => (0, 0, 1),
            Op::PRINTLN | Op::PRINT | Op::RUN => (0, 1, 1),
        };
        OperandLayout { nout, ninr, ninx }
    }
}

/// One legal encoding of a mnemonic: the full opcode byte (argument-type
/// bits included) and the operand kinds, final operand last.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Variant {
    pub opcode: u8,
    pub operands: &'static [OperandKind],
}

macro_rules! variants {
    ($( [ $opcode:expr $(, $kind:ident )* ] ),* $(,)?) => {
        &[ $( Variant { opcode: $opcode, operands: &[ $( OperandKind::$kind ),* ] } ),* ]
    };
}

/// Returns the encoding variants for an upper-case mnemonic, in the order
/// the assembler tries them. The first variant whose operands translate
/// without error wins, so register forms come first and the wide immediate
/// forms last.
pub fn variants(mnemonic: &str) -> Option<&'static [Variant]> {
    let descrs: &'static [Variant] = match mnemonic {
        // Move & load / store
        "MOV" => variants![
            [0x01, Reg, Reg],
            [0x41, Reg, Imm8],
            [0x81, Reg, PcRel8],
            [0xc1, Reg, Imm32],
        ],
        "LDB" => variants![
            [0x02, Reg, Reg, Reg],
            [0x42, Reg, Reg, Imm8],
            [0x82, Reg, Reg, PcRel8],
            [0xc2, Reg, Reg, Imm32],
        ],
        "LDW" => variants![
            [0x03, Reg, Reg, Reg],
            [0x43, Reg, Reg, Imm8],
            [0x83, Reg, Reg, PcRel8],
            [0xc3, Reg, Reg, Imm32],
        ],
        "STB" => variants![
            [0x04, Reg, Reg, Reg],
            [0x44, Reg, Reg, Imm8],
            [0x84, Reg, Reg, PcRel8],
            [0xc4, Reg, Reg, Imm32],
        ],
        "STW" => variants![
            [0x05, Reg, Reg, Reg],
            [0x45, Reg, Reg, Imm8],
            [0x85, Reg, Reg, PcRel8],
            [0xc5, Reg, Reg, Imm32],
        ],

        // Unconditional jump / jump to subroutine
        "JMP" => variants![[0x06, Reg], [0x46, Imm8], [0x86, PcRel8], [0xc6, Imm32]],
        "JSR" => variants![[0x07, Reg], [0x47, Imm8], [0x87, PcRel8], [0xc7, Imm32]],
        "RTS" => variants![[0x08]],

        // Conditional branch
        "BEQ" => variants![[0x09, Reg], [0x49, Imm8], [0x89, PcRel8], [0xc9, Imm32]],
        "BNE" => variants![[0x0a, Reg], [0x4a, Imm8], [0x8a, PcRel8], [0xca, Imm32]],
        "BLT" => variants![[0x0b, Reg], [0x4b, Imm8], [0x8b, PcRel8], [0xcb, Imm32]],
        "BLE" => variants![[0x0c, Reg], [0x4c, Imm8], [0x8c, PcRel8], [0xcc, Imm32]],
        "BGT" => variants![[0x0d, Reg], [0x4d, Imm8], [0x8d, PcRel8], [0xcd, Imm32]],
        "BGE" => variants![[0x0e, Reg], [0x4e, Imm8], [0x8e, PcRel8], [0xce, Imm32]],

        // Comparison
        "CMP" => variants![
            [0x0f, Reg, Reg],
            [0x4f, Reg, Imm8],
            [0x8f, Reg, PcRel8],
            [0xcf, Reg, Imm32],
        ],

        // Stack
        "PUSH" => variants![[0x10, Reg]],
        "POP" => variants![[0x11, Reg]],

        // Arithmetic
        "ADD" => variants![
            [0x12, Reg, Reg],
            [0x52, Reg, Imm8],
            [0x92, Reg, PcRel8],
            [0xd2, Reg, Imm32],
        ],
        "SUB" => variants![
            [0x13, Reg, Reg],
            [0x53, Reg, Imm8],
            [0x93, Reg, PcRel8],
            [0xd3, Reg, Imm32],
        ],
        "MUL" => variants![[0x14, Reg, Reg], [0x54, Reg, Imm8], [0xd4, Reg, Imm32]],
        "DIV" => variants![[0x15, Reg, Reg], [0x55, Reg, Imm8], [0xd5, Reg, Imm32]],
        "MOD" => variants![[0x16, Reg, Reg], [0x56, Reg, Imm8], [0xd6, Reg, Imm32]],

        // Logic
        "AND" => variants![[0x17, Reg, Reg], [0x57, Reg, Imm8], [0xd7, Reg, Imm32]],
        "OR" => variants![[0x18, Reg, Reg], [0x58, Reg, Imm8], [0xd8, Reg, Imm32]],
        "XOR" => variants![[0x19, Reg, Reg], [0x59, Reg, Imm8], [0xd9, Reg, Imm32]],
        "SHL" => variants![[0x1a, Reg, Reg], [0x5a, Reg, Imm8]],
        "SHR" => variants![[0x1b, Reg, Reg], [0x5b, Reg, Imm8]],

        // High level system calls
        "EXIT" => variants![[0x1c, Reg], [0x5c, Imm8], [0xdc, Imm32]],
        "PRINTLN" => variants![
            [0x1d, Reg, Reg],
            [0x5d, Reg, Imm8],
            [0x9d, Reg, PcRel8],
            [0xdd, Reg, Imm32],
        ],
        "PRINT" => variants![
            [0x1e, Reg, Reg],
            [0x5e, Reg, Imm8],
            [0x9e, Reg, PcRel8],
            [0xde, Reg, Imm32],
        ],
        "RUN" => variants![
            [0x1f, Reg, Reg],
            [0x5f, Reg, Imm8],
            [0x9f, Reg, PcRel8],
            [0xdf, Reg, Imm32],
        ],

        _ => return None,
    };
    Some(descrs)
}

/// All mnemonics with an entry in the variant table.
pub const MNEMONICS: &[&str] = &[
    "MOV", "LDB", "LDW", "STB", "STW", "JMP", "JSR", "RTS", "BEQ", "BNE", "BLT", "BLE", "BGT",
    "BGE", "CMP", "PUSH", "POP", "ADD", "SUB", "MUL", "DIV", "MOD", "AND", "OR", "XOR", "SHL",
    "SHR", "EXIT", "PRINTLN", "PRINT", "RUN",
];
