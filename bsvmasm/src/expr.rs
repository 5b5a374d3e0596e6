use crate::error::{AsmError, Result};
use crate::labels::{is_local_label, mangle_local_label, LabelMap};

/// Value of an unresolved label on the first pass: the worst-case large
/// positive address, so that narrow-encoding range checks fail toward the
/// wide variants until the label settles.
pub const UNRESOLVED: i64 = 2_147_483_647;

/// Context for expression evaluation during one pass.
pub struct EvalEnv<'a> {
    /// The label table of the previous pass.
    pub labels: &'a LabelMap,
    /// Current scope (most recent global label) for `N$` references.
    pub scope: &'a str,
    pub first_pass: bool,
    /// Address of the instruction or datum being emitted; the value of `*`.
    pub addr: i64,
}

/// Parses an integer literal: decimal, `0x` hexadecimal, `0b` binary or
/// `0o` octal, with an optional leading sign. Returns `None` if `s` is not
/// a literal at all (it may still be a label).
pub fn parse_integer(s: &str) -> Option<i64> {
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let (radix, digits) = if rest.starts_with("0x") || rest.starts_with("0X") {
        (16, &rest[2..])
    } else if rest.starts_with("0b") || rest.starts_with("0B") {
        (2, &rest[2..])
    } else if rest.starts_with("0o") || rest.starts_with("0O") {
        (8, &rest[2..])
    } else {
        (10, rest)
    };
    if digits.starts_with('+') || digits.starts_with('-') {
        return None;
    }
    i64::from_str_radix(digits, radix).ok().map(|value| sign * value)
}

fn resolve_term(env: &EvalEnv, line: usize, term: &str) -> Result<i64> {
    // Numeric literal?
    if let Some(value) = parse_integer(term) {
        return Ok(value);
    }

    // Current address?
    if term == "*" {
        return Ok(env.addr);
    }

    // Label.
    let mangled;
    let name = if is_local_label(term) {
        if env.scope.is_empty() {
            return Err(AsmError::new(
                line,
                format!("No scope for local label: {}", term),
            ));
        }
        mangled = mangle_local_label(term, env.scope);
        mangled.as_str()
    } else {
        term
    };
    match env.labels.get(name) {
        Some(&value) => Ok(value),
        None if env.first_pass => Ok(UNRESOLVED),
        None => Err(AsmError::new(line, format!("Bad label: {}", term))),
    }
}

/// Evaluates a left-associative chain of `+` and `-` over integer literals,
/// labels and `*`. No precedence, no parentheses; empty terms count as 0,
/// which makes a leading sign work.
pub fn eval_expr(env: &EvalEnv, line: usize, expr: &str) -> Result<i64> {
    let mut result: i64 = 0;
    for addend in expr.split('+') {
        let mut add = true;
        for term in addend.split('-') {
            let term = term.trim();
            let value = if term.is_empty() {
                0
            } else {
                resolve_term(env, line, term)?
            };
            if add {
                result = result.wrapping_add(value);
            } else {
                result = result.wrapping_sub(value);
            }
            add = false;
        }
    }
    Ok(result)
}
