use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AsmError, Result};

/// Expands `.include "PATH"` directives recursively. Paths resolve relative
/// to the including file's directory; a stack of canonicalized paths
/// rejects include cycles.
pub struct Preprocessor {
    stack: Vec<PathBuf>,
}

impl Preprocessor {
    pub fn new() -> Preprocessor {
        Preprocessor { stack: Vec::new() }
    }

    /// Reads and expands one file.
    pub fn process_file(&mut self, path: &Path) -> Result<Vec<String>> {
        let canonical = fs::canonicalize(path).map_err(|err| {
            AsmError::new(0, format!("Cannot open {}: {}", path.display(), err))
        })?;
        if self.stack.contains(&canonical) {
            return Err(AsmError::new(
                0,
                format!("Include cycle: {}", path.display()),
            ));
        }

        let source = fs::read_to_string(path).map_err(|err| {
            AsmError::new(0, format!("Cannot read {}: {}", path.display(), err))
        })?;
        let lines: Vec<String> = source.lines().map(str::to_owned).collect();
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        self.stack.push(canonical);
        let result = self.process_lines(&lines, &dir);
        self.stack.pop();
        result
    }

    /// Expands includes in a line list, substituting each included file's
    /// (expanded) lines in place. All lines come out trimmed.
    pub fn process_lines(&mut self, lines: &[String], dir: &Path) -> Result<Vec<String>> {
        let mut result = Vec::new();
        for (index, raw_line) in lines.iter().enumerate() {
            let line = raw_line.trim();
            if line.starts_with(".include") {
                let name = line[".include".len()..].trim().replace('"', "");
                let include_path = dir.join(name);
                let included = self.process_file(&include_path).map_err(|err| {
                    if err.line == 0 {
                        AsmError::new(index + 1, err.message)
                    } else {
                        err
                    }
                })?;
                result.extend(included);
            } else {
                result.push(line.to_owned());
            }
        }
        Ok(result)
    }
}

impl Default for Preprocessor {
    fn default() -> Preprocessor {
        Preprocessor::new()
    }
}
