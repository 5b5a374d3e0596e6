/// Strips comments from source lines, carrying block-comment state from one
/// line to the next.
pub struct LineNormalizer {
    in_block_comment: bool,
}

impl LineNormalizer {
    pub fn new() -> LineNormalizer {
        LineNormalizer {
            in_block_comment: false,
        }
    }

    /// True while a `/*` comment is still open.
    pub fn in_block_comment(&self) -> bool {
        self.in_block_comment
    }

    /// Removes comments from one raw line and trims the rest. `;` comments
    /// run to the end of the line, `/*` comments to the matching `*/`
    /// (possibly on a later line). When both markers appear on a line, the
    /// earlier one wins.
    pub fn normalize<'a>(&mut self, raw: &'a str) -> &'a str {
        let mut line = raw;

        if self.in_block_comment {
            match line.find("*/") {
                None => return "",
                Some(pos) => {
                    self.in_block_comment = false;
                    line = &line[pos + 2..];
                }
            }
        }

        let line_comment = line.find(';');
        let block_comment = line.find("/*");
        let cut = match (line_comment, block_comment) {
            (Some(lc), Some(bc)) if bc < lc => {
                self.in_block_comment = true;
                Some(bc)
            }
            (None, Some(bc)) => {
                self.in_block_comment = true;
                Some(bc)
            }
            (lc, _) => lc,
        };
        if let Some(pos) = cut {
            line = &line[..pos];
        }

        line.trim()
    }
}

/// Detects a `NAME = EXPR` line: exactly one `=` and no string literal.
pub fn is_label_assignment(line: &str) -> bool {
    line.matches('=').count() == 1 && !line.contains('"')
}

/// Splits an instruction or directive line into tokens: whitespace first,
/// then commas within every token after the first, empty fragments dropped.
pub fn extract_parts(line: &str) -> Vec<&str> {
    let mut words = line.split_whitespace();
    let mut result = Vec::new();
    if let Some(first) = words.next() {
        result.push(first);
    }
    for word in words {
        result.extend(word.split(',').filter(|part| !part.is_empty()));
    }
    result
}

impl Default for LineNormalizer {
    fn default() -> LineNormalizer {
        LineNormalizer::new()
    }
}
