use byteorder::ByteOrder;

use bsvm::{variants, Endian, OperandKind, Variant};

use crate::error::{AsmError, Result};
use crate::expr::{eval_expr, EvalEnv};

/// Parses a register operand: `R1`..`R255`, or the aliases `Z` (for R254)
/// and `SP` (for R255). A leading zero in the number is rejected, which
/// also keeps `R0` out of reach of programs.
pub fn translate_reg(operand: &str, line: usize) -> Result<u8> {
    let mut reg = operand.to_uppercase();
    if reg == "Z" {
        reg = "R254".to_owned();
    } else if reg == "SP" {
        reg = "R255".to_owned();
    }

    let bytes = reg.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'R' || bytes[1] == b'0' {
        return Err(bad_register(operand, line));
    }
    match reg[1..].parse::<u32>() {
        Ok(number) if number <= 255 => Ok(number as u8),
        _ => Err(bad_register(operand, line)),
    }
}

fn bad_register(operand: &str, line: usize) -> AsmError {
    AsmError::new(line, format!("Bad register: {}", operand))
}

/// Immediate operands may carry a decorative `#` prefix.
fn strip_hash(operand: &str) -> &str {
    if operand.starts_with('#') {
        &operand[1..]
    } else {
        operand
    }
}

/// Translates an immediate operand and appends its little-endian encoding.
pub(crate) fn translate_imm(
    operand: &str,
    kind: OperandKind,
    env: &EvalEnv,
    line: usize,
    out: &mut Vec<u8>,
) -> Result<()> {
    let mut value = eval_expr(env, line, strip_hash(operand))?;

    // Fold wide unsigned values (e.g. 0xffffffff) into the signed range.
    if value >= 1 << 31 {
        value = (value & 0xffff_ffff) - (1 << 32);
    }

    let (min, max) = match kind {
        OperandKind::Imm8 => (-(1 << 7), (1 << 7) - 1),
        _ => (-(1i64 << 31), (1i64 << 31) - 1),
    };
    if value < min || value > max {
        return Err(AsmError::new(
            line,
            format!(
                "Immediate value out of range ({}..{}): {}",
                min, max, operand
            ),
        ));
    }

    match kind {
        OperandKind::Imm8 => out.push(value as u8),
        _ => {
            let mut buf = [0u8; 4];
            Endian::write_i32(&mut buf, value as i32);
            out.extend_from_slice(&buf);
        }
    }
    Ok(())
}

/// Translates a PC-relative operand. On the first pass the target is not
/// trustworthy yet, so a placeholder byte is emitted; later passes encode
/// `target - pc` and enforce the signed 8-bit range.
pub(crate) fn translate_pcrel(
    operand: &str,
    pc: i64,
    env: &EvalEnv,
    line: usize,
    out: &mut Vec<u8>,
) -> Result<()> {
    if env.first_pass {
        out.push(0);
        return Ok(());
    }

    let target = eval_expr(env, line, strip_hash(operand))?;
    let offset = target - pc;
    if offset < -128 || offset >= 128 {
        return Err(AsmError::new(line, format!("Too large offset: {}", offset)));
    }
    out.push(offset as u8);
    Ok(())
}

/// Encodes one instruction against a single variant: the opcode byte, then
/// one encoded operand after another.
fn translate_operation(
    parts: &[&str],
    mnemonic: &str,
    variant: &Variant,
    pc: i64,
    env: &EvalEnv,
    line: usize,
) -> Result<Vec<u8>> {
    if parts.len() - 1 != variant.operands.len() {
        return Err(AsmError::new(
            line,
            format!(
                "Expected {} arguments for {}",
                variant.operands.len(),
                mnemonic
            ),
        ));
    }

    let mut instr = vec![variant.opcode];
    for (operand, kind) in parts[1..].iter().zip(variant.operands) {
        match kind {
            OperandKind::Reg => {
                let number = translate_reg(operand, line)?;
                instr.push(number);
            }
            OperandKind::Imm8 | OperandKind::Imm32 => {
                translate_imm(operand, *kind, env, line, &mut instr)?
            }
            OperandKind::PcRel8 => translate_pcrel(operand, pc, env, line, &mut instr)?,
        }
    }
    Ok(instr)
}

/// Encodes one instruction line. The variants of the mnemonic are tried in
/// table order and the first one that translates wins; if none does, the
/// error lists every candidate's failure.
pub fn encode_instruction(parts: &[&str], line: usize, env: &EvalEnv) -> Result<Vec<u8>> {
    let mnemonic = parts[0].to_uppercase();
    let pc = env.addr;

    let descrs = variants(&mnemonic)
        .ok_or_else(|| AsmError::new(line, format!("Bad mnemonic: {}", mnemonic)))?;

    let mut candidate_errors = Vec::new();
    for variant in descrs {
        match translate_operation(parts, &mnemonic, variant, pc, env, line) {
            Ok(instr) => return Ok(instr),
            Err(err) => candidate_errors.push(err.message),
        }
    }

    let mut message = format!(
        "Invalid operands for {}: {}",
        mnemonic,
        parts[1..].join(",")
    );
    for candidate in candidate_errors {
        message.push_str("\n  Candidate: ");
        message.push_str(&candidate);
    }
    Err(AsmError::new(line, message))
}
