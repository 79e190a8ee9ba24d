//! Layout heuristics.
//!
//! Both heuristics are approximate. They live here, behind named types, so
//! the document assembly code only asks "is this a heading?" and "what are
//! the cells?" and never hard-codes the thresholds.

use regex::Regex;

/// Decides which body lines get heading emphasis in word-processing output.
///
/// A line counts as a heading when it is shorter than `max_chars`
/// characters and does not end with one of `terminators`. Short sentences
/// without a trailing period are misclassified; that is expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingPolicy {
    /// Lines must be strictly shorter than this (in characters)
    pub max_chars: usize,
    /// Trailing characters that mark a line as running text
    pub terminators: Vec<char>,
}

impl HeadingPolicy {
    /// Policy with custom thresholds.
    pub fn new(max_chars: usize, terminators: impl Into<Vec<char>>) -> Self {
        Self {
            max_chars,
            terminators: terminators.into(),
        }
    }

    /// Whether `line` should be emphasised as a heading.
    pub fn is_heading(&self, line: &str) -> bool {
        if line.chars().count() >= self.max_chars {
            return false;
        }
        match line.chars().last() {
            Some(last) => !self.terminators.contains(&last),
            None => true,
        }
    }
}

impl Default for HeadingPolicy {
    fn default() -> Self {
        Self::new(60, ['.', ','])
    }
}

/// Splits a text line into spreadsheet cells.
#[derive(Debug, Clone)]
pub struct ColumnSplitter {
    delimiter: Regex,
}

/// A tab, or a run of two or more spaces.
pub const DEFAULT_DELIMITER: &str = r"\t| {2,}";

impl ColumnSplitter {
    /// Splitter with a custom delimiter pattern.
    pub fn new(pattern: &str) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            delimiter: Regex::new(pattern)?,
        })
    }

    /// The delimiter pattern in use.
    pub fn pattern(&self) -> &str {
        self.delimiter.as_str()
    }

    /// Split an already trimmed line into trimmed cell values.
    ///
    /// Trailing empty cells are dropped; interior empty cells are kept so
    /// columns stay aligned.
    pub fn split(&self, line: &str) -> Vec<String> {
        let mut cells: Vec<String> = self
            .delimiter
            .split(line)
            .map(|cell| cell.trim().to_string())
            .collect();
        while cells.len() > 1 && cells.last().is_some_and(|c| c.is_empty()) {
            cells.pop();
        }
        cells
    }
}

impl Default for ColumnSplitter {
    fn default() -> Self {
        Self {
            delimiter: Regex::new(DEFAULT_DELIMITER).expect("default delimiter is a valid regex"),
        }
    }
}

impl PartialEq for ColumnSplitter {
    fn eq(&self, other: &Self) -> bool {
        self.pattern() == other.pattern()
    }
}
