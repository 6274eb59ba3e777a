//! Line filter applied to the merged device output.

use devgrep_common::TaggedLine;
use regex::{Regex, RegexBuilder};
use tracing::debug;

/// Case-insensitive line matcher.
///
/// The pattern is tried as a regex first; anything that fails to compile is
/// matched as a literal substring instead.
#[derive(Debug, Clone)]
pub enum LineFilter {
    Regex(Regex),
    Literal(String),
}

impl LineFilter {
    pub fn new(pattern: &str) -> Self {
        match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(re) => Self::Regex(re),
            Err(e) => {
                debug!(pattern, error = %e, "pattern is not a valid regex, matching literally");
                Self::Literal(pattern.to_lowercase())
            }
        }
    }

    pub fn is_match(&self, line: &str) -> bool {
        match self {
            Self::Regex(re) => re.is_match(line),
            Self::Literal(needle) => line.to_lowercase().contains(needle.as_str()),
        }
    }

    /// Matches on the device text only, never on the path prefix.
    pub fn keeps(&self, line: &TaggedLine) -> bool {
        self.is_match(&line.line)
    }
}
