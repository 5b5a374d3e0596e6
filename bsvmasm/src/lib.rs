//! Assembler for the [BS Virtual Machine](../bsvm/index.html).
//!
//! The entry points are [`assemble`], which turns source text into a raw
//! bytecode image, and [`assemble_file`], which additionally resolves
//! `.include` directives relative to the file. The emitted image is meant
//! to be loaded at the VM's reset address.
//!
//! # Source language
//!
//! Comments start with `;` (to end of line) or are bracketed by `/*` and
//! `*/` (possibly spanning lines). A line is one of:
//!
//! - a label definition `name:` binding `name` to the current address, or a
//!   label assignment `name = expr`;
//! - a directive (`.align`, `.byte`, `.word`/`.long`/`.int`,
//!   `.space`/`.zero`, `.ascii`, `.asciz`, `.include`, and the ignored
//!   section directives `.text`/`.data`/`.global`/`.globl`);
//! - an instruction: `MNEMONIC operand [, operand ...]`.
//!
//! Labels of the form `N$` are local: their effective name is `scope@N`
//! where `scope` is the most recent global label. Registers are written
//! `R1`..`R255`, or `Z` and `SP` for R254 and R255. Immediate operands are
//! `+`/`-` chains of integer literals (decimal, `0x`, `0b`, `0o`), label
//! names and `*` (the current address), optionally prefixed by `#`.
//!
//! Encoding picks the first fitting variant of a mnemonic, so a value that
//! fits 8 bits costs 1 operand byte and a far address falls back to the
//! 32-bit form. Because variant sizes depend on label values and label
//! values depend on sizes, the assembler re-runs passes until neither the
//! label table nor the emitted bytes change, then pads the image to a
//! multiple of 4 bytes.
//!
//! [`assemble`]: fn.assemble.html
//! [`assemble_file`]: fn.assemble_file.html

mod data;
mod encode;
mod error;
mod expr;
mod labels;
mod lines;
mod preprocess;


use std::path::Path;

use crate::expr::{eval_expr, EvalEnv};
use crate::labels::{is_local_label, mangle_local_label, LabelMap};
use crate::lines::{extract_parts, is_label_assignment, LineNormalizer};

pub use crate::error::{AsmError, Result};
pub use crate::preprocess::Preprocessor;

/// Passes to attempt before declaring the input non-converging.
const MAX_PASSES: u32 = 100;

/// Assembles source text into a raw bytecode image. `.include` paths
/// resolve relative to the current directory.
pub fn assemble(source: &str) -> Result<Vec<u8>> {
    let lines: Vec<String> = source.lines().map(str::to_owned).collect();
    let lines = Preprocessor::new().process_lines(&lines, Path::new("."))?;
    compile(&lines, "<input>", 0)
}

/// Assembles a source file into a raw bytecode image. `verbosity` 1 prints
/// per-pass progress, 2 additionally an instruction listing and the final
/// label table.
pub fn assemble_file(path: &Path, verbosity: u8) -> Result<Vec<u8>> {
    if verbosity >= 1 {
        println!("Compiling {}...", path.display());
    }
    let lines = Preprocessor::new().process_file(path)?;
    compile(&lines, &path.display().to_string(), verbosity)
}

/// State of one assembler pass over the preprocessed source.
pub(crate) struct Pass<'a> {
    /// Label table of the previous pass; expressions resolve against this.
    pub(crate) labels: &'a LabelMap,
    pub(crate) first_pass: bool,
    pub(crate) file_name: &'a str,
    pub(crate) verbosity: u8,
    /// Most recent global label; scope for `N$` locals.
    pub(crate) scope: String,
    /// Current output address (starts at the reset PC).
    pub(crate) addr: i64,
    pub(crate) code: Vec<u8>,
    pub(crate) new_labels: LabelMap,
}

impl<'a> Pass<'a> {
    fn new(labels: &'a LabelMap, first_pass: bool, file_name: &'a str, verbosity: u8) -> Pass<'a> {
        Pass {
            labels,
            first_pass,
            file_name,
            verbosity,
            scope: String::new(),
            addr: i64::from(bsvm::constants::RESET_PC),
            code: Vec::new(),
            new_labels: LabelMap::new(),
        }
    }

    pub(crate) fn env(&self) -> EvalEnv {
        EvalEnv {
            labels: self.labels,
            scope: &self.scope,
            first_pass: self.first_pass,
            addr: self.addr,
        }
    }

    fn process_line(&mut self, line: &str, line_no: usize) -> Result<()> {
        if line.is_empty() {
            Ok(())
        } else if line.ends_with(':') || is_label_assignment(line) {
            self.process_label(line, line_no)
        } else if line.starts_with('.') {
            let parts = extract_parts(line);
            self.process_directive(&parts, line, line_no)
        } else {
            self.process_instruction(line, line_no)
        }
    }

    fn process_label(&mut self, line: &str, line_no: usize) -> Result<()> {
        let (label, value) = if line.ends_with(':') {
            (line[..line.len() - 1].to_owned(), self.addr)
        } else {
            self.parse_assigned_label(line, line_no)?
        };

        if label.contains(char::is_whitespace) || label.contains('@') {
            return Err(AsmError::new(line_no, format!("Bad label \"{}\"", label)));
        }

        let label = if is_local_label(&label) {
            if self.scope.is_empty() {
                return Err(AsmError::new(
                    line_no,
                    format!("No scope for local label: {}", label),
                ));
            }
            mangle_local_label(&label, &self.scope)
        } else {
            // A global label opens a new scope for subsequent locals.
            self.scope = label.clone();
            label
        };

        if self.new_labels.contains_key(&label) {
            return Err(AsmError::new(
                line_no,
                format!("Re-definition of label: {}", label),
            ));
        }
        self.new_labels.insert(label, value);
        Ok(())
    }

    fn parse_assigned_label(&self, line: &str, line_no: usize) -> Result<(String, i64)> {
        let parts: Vec<&str> = line
            .split('=')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        if parts.len() != 2 {
            return Err(AsmError::new(
                line_no,
                format!("Invalid label assignment: {}", line),
            ));
        }
        let value = eval_expr(&self.env(), line_no, parts[1])?;
        Ok((parts[0].to_owned(), value))
    }

    fn process_instruction(&mut self, line: &str, line_no: usize) -> Result<()> {
        let parts = extract_parts(line);
        let instr = encode::encode_instruction(&parts, line_no, &self.env())?;

        if self.verbosity >= 2 {
            let mut listing = format!("{:08x}: ", self.addr);
            for byte in &instr {
                listing.push_str(&format!("{:02x} ", byte));
            }
            for _ in instr.len()..6 {
                listing.push_str("   ");
            }
            println!("{} <= {:?}", listing, parts);
        }

        self.code.extend_from_slice(&instr);
        self.addr += instr.len() as i64;
        Ok(())
    }
}

/// The pass driver: re-assembles the whole source until the label table and
/// the emitted code both reach a fixpoint, then pads the image to a
/// multiple of 4 bytes.
fn compile(lines: &[String], file_name: &str, verbosity: u8) -> Result<Vec<u8>> {
    let mut labels = LabelMap::new();
    let mut code_from_last_pass: Vec<u8> = Vec::new();

    for pass_number in 1..=MAX_PASSES {
        let first_pass = pass_number == 1;
        if verbosity >= 1 {
            println!("Pass {}", pass_number);
        }

        let mut pass = Pass::new(&labels, first_pass, file_name, verbosity);
        let mut normalizer = LineNormalizer::new();
        for (index, raw_line) in lines.iter().enumerate() {
            let line = normalizer.normalize(raw_line);
            pass.process_line(line, index + 1)?;
        }
        if normalizer.in_block_comment() {
            return Err(AsmError::new(lines.len(), "Unterminated block comment"));
        }

        let converged =
            !first_pass && pass.new_labels == labels && pass.code == code_from_last_pass;
        let Pass {
            new_labels, code, ..
        } = pass;

        if !converged {
            labels = new_labels;
            code_from_last_pass = code;
            continue;
        }

        let mut code = code;
        while code.len() % 4 != 0 {
            code.push(0);
        }
        if verbosity >= 2 {
            for (label, value) in &labels {
                println!("Label: {} = {:08x}", label, value);
            }
        }
        if verbosity >= 1 {
            println!("Total size: {}", code.len());
        }
        return Ok(code);
    }

    Err(AsmError::new(
        0,
        format!("No convergence after {} passes", MAX_PASSES),
    ))
}
