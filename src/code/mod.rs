//! Canonical catalog codes: `PREFIX` followed by a zero-padded integer.
//!
//! ```ignore
//! let codec = CodeFormat::default();
//! assert_eq!(codec.format(7), "PRD0007");
//! assert_eq!(codec.parse(" prd00012 "), Some(12));
//! ```

use regex::Regex;

pub const DEFAULT_PREFIX: &str = "PRD";
pub const DEFAULT_WIDTH: usize = 4;

/// Converts between code strings and their integer values.
#[derive(Debug, Clone)]
pub struct CodeFormat {
    prefix: String,
    width: usize,
    pattern: Regex,
}

impl Default for CodeFormat {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, DEFAULT_WIDTH)
    }
}

impl CodeFormat {
    /// Build a codec for `prefix` (matched case-insensitively) and pad `width`.
    pub fn new(prefix: &str, width: usize) -> Self {
        let prefix = prefix.trim().to_uppercase();
        let pattern = Regex::new(&format!("^{}0*([0-9]+)$", regex::escape(&prefix)))
            .expect("escaped prefix is always a valid pattern");
        CodeFormat {
            prefix,
            width,
            pattern,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Render `n`; numbers wider than the pad width widen the string.
    pub fn format(&self, n: u64) -> String {
        format!("{}{:0width$}", self.prefix, n, width = self.width)
    }

    /// Decode a code string. Returns `None` for empty or non-matching input,
    /// and for numbers too large to represent.
    pub fn parse(&self, code: &str) -> Option<u64> {
        let normalized = code.trim().to_uppercase();
        if normalized.is_empty() {
            return None;
        }
        let captures = self.pattern.captures(&normalized)?;
        captures.get(1)?.as_str().parse().ok()
    }

    /// Rewrite a decodable code into its canonical form; other codes are
    /// returned trimmed. Empty input yields `None`.
    pub fn canonicalize(&self, code: &str) -> Option<String> {
        match self.parse(code) {
            Some(n) => Some(self.format(n)),
            None => {
                let trimmed = code.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }
}
