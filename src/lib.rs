//! Core of the BS Virtual Machine: a tiny register machine with 256 signed
//! 32-bit registers, a flat 1 MiB byte-addressable memory and a compact
//! variable-length instruction encoding (1-6 bytes per instruction).
//!
//! The crate provides the execution engine ([`Processor`], [`Memory`],
//! [`Host`]) and the instruction-set tables ([`Op`], [`variants`]) that the
//! assembler shares, so encoder and decoder agree on the exact same byte
//! format.
//!
//! [`Processor`]: struct.Processor.html
//! [`Memory`]: struct.Memory.html
//! [`Host`]: trait.Host.html
//! [`Op`]: enum.Op.html
//! [`variants`]: fn.variants.html

pub mod constants;

mod host;
mod isa;
mod memory;
mod processor;

#[cfg(test)]
mod test;

pub use crate::host::{Host, StdHost};
pub use crate::isa::{variants, Op, OperandKind, OperandLayout, Variant, MNEMONICS};
pub use crate::memory::Memory;
pub use crate::processor::{Exit, Processor};

/// Endianness of all multi-byte values in VM memory and emitted images.
pub type Endian = byteorder::LittleEndian;

/// Value held by a register: signed 32 bits, wrapping on arithmetic.
pub type Word = i32;
