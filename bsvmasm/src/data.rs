use byteorder::ByteOrder;

use bsvm::Endian;

use crate::error::{AsmError, Result};
use crate::expr::{eval_expr, parse_integer};
use crate::Pass;

impl<'a> Pass<'a> {
    /// Applies one data directive. `parts` are the extracted tokens, `line`
    /// is the full normalized line (needed by the string directives, whose
    /// content may contain separators).
    pub(crate) fn process_directive(
        &mut self,
        parts: &[&str],
        line: &str,
        line_no: usize,
    ) -> Result<()> {
        match parts[0] {
            ".align" => self.align(parts, line_no),
            ".byte" => self.emit_values(parts, 8, line_no),
            ".word" | ".long" | ".int" => self.emit_values(parts, 32, line_no),
            ".space" | ".zero" => self.space(parts, line_no),
            ".ascii" => self.ascii(parts[0], line, false, line_no),
            ".asciz" => self.ascii(parts[0], line, true, line_no),
            ".text" | ".data" | ".global" | ".globl" => {
                if self.verbosity >= 1 {
                    eprintln!(
                        "{}:{}: WARNING: Ignoring directive: {}",
                        self.file_name, line_no, parts[0]
                    );
                }
                Ok(())
            }
            other => Err(AsmError::new(
                line_no,
                format!("Unknown directive: {}", other),
            )),
        }
    }

    /// `.align N` pads with zero bytes until `addr % N == 0`.
    fn align(&mut self, parts: &[&str], line_no: usize) -> Result<()> {
        let arg = parts
            .get(1)
            .ok_or_else(|| AsmError::new(line_no, "Invalid alignment: (missing)"))?;
        let value = parse_integer(arg)
            .ok_or_else(|| AsmError::new(line_no, format!("Invalid alignment: {}", arg)))?;
        if ![1, 2, 4, 8, 16].contains(&value) {
            return Err(AsmError::new(
                line_no,
                format!("Invalid alignment: {} (must be 1, 2, 4, 8 or 16)", value),
            ));
        }

        let adjust = self.addr % value;
        if adjust > 0 {
            let pad = value - adjust;
            for _ in 0..pad {
                self.code.push(0);
            }
            self.addr += pad;
            if self.verbosity >= 2 {
                println!("Aligned pc to: {} (padded by {} bytes)", self.addr, pad);
            }
        }
        Ok(())
    }

    /// `.byte` / `.word` (and friends): one value expression per token.
    /// Multi-byte values must start on an address aligned to their size.
    fn emit_values(&mut self, parts: &[&str], num_bits: u32, line_no: usize) -> Result<()> {
        let val_size = i64::from(num_bits >> 3);
        if self.addr & (val_size - 1) != 0 {
            return Err(AsmError::new(
                line_no,
                format!("Data not aligned to a {} byte boundary", val_size),
            ));
        }

        for value_text in &parts[1..] {
            let mut value = {
                let env = self.env();
                eval_expr(&env, line_no, value_text)?
            };
            // Negative values are emitted modulo 2^bits.
            if value < 0 {
                value += 1i64 << num_bits;
            }
            if value < 0 || value >= 1i64 << num_bits {
                return Err(AsmError::new(
                    line_no,
                    format!("Value out of range for {}: {}", parts[0], value_text),
                ));
            }

            self.addr += val_size;
            if num_bits == 8 {
                self.code.push(value as u8);
            } else {
                let mut buf = [0u8; 4];
                Endian::write_u32(&mut buf, value as u32);
                self.code.extend_from_slice(&buf);
            }
        }
        Ok(())
    }

    /// `.space N` / `.zero N` emit N zero bytes.
    fn space(&mut self, parts: &[&str], line_no: usize) -> Result<()> {
        if parts.len() != 2 {
            return Err(AsmError::new(
                line_no,
                format!("Invalid usage of {}", parts[0]),
            ));
        }
        let size = match parse_integer(parts[1]) {
            Some(size) if size >= 0 => size,
            _ => {
                return Err(AsmError::new(
                    line_no,
                    format!("Invalid size: {}", parts[1]),
                ))
            }
        };

        self.addr += size;
        for _ in 0..size {
            self.code.push(0);
        }
        Ok(())
    }

    /// `.ascii "..."` / `.asciz "..."`: UTF-8 text with the escapes
    /// `\t \n \r \\ \"` and single-digit `\0`..`\9`.
    fn ascii(
        &mut self,
        directive: &str,
        line: &str,
        zero_terminated: bool,
        line_no: usize,
    ) -> Result<()> {
        let raw_text = line[directive.len()..].trim();
        let first_quote = raw_text.find('"');
        let last_quote = raw_text.rfind('"');
        let text = match (first_quote, last_quote) {
            (Some(first), Some(last)) if last == raw_text.len() - 1 && last != first => {
                &raw_text[first + 1..last]
            }
            _ => {
                return Err(AsmError::new(
                    line_no,
                    format!("Invalid string: {}", raw_text),
                ))
            }
        };

        let mut chars = text.chars();
        while let Some(ch) = chars.next() {
            if ch == '\\' {
                let control = chars.next().ok_or_else(|| {
                    AsmError::new(line_no, format!("Premature end of string: {}", raw_text))
                })?;
                let code = if control.is_ascii_digit() {
                    control as u8 - b'0'
                } else {
                    match control {
                        't' => 9,
                        'n' => 10,
                        'r' => 13,
                        '\\' => 92,
                        '"' => 34,
                        _ => {
                            return Err(AsmError::new(
                                line_no,
                                format!("Bad control character: \\{}", control),
                            ))
                        }
                    }
                };
                self.code.push(code);
                self.addr += 1;
            } else {
                let mut buf = [0u8; 4];
                let encoded = ch.encode_utf8(&mut buf).as_bytes();
                self.code.extend_from_slice(encoded);
                self.addr += encoded.len() as i64;
            }
        }

        if zero_terminated {
            self.code.push(0);
            self.addr += 1;
        }
        Ok(())
    }
}
