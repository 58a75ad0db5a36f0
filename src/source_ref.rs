//! Source references (C1): `(file, begin_loc, end_loc)` triples attached to
//! every diagnostic and every code node.

use std::fmt;
use std::rc::Rc;

/// A 1-based line/column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub const ZERO: Location = Location { line: 0, column: 0 };

    pub fn new(line: u32, column: u32) -> Self {
        Location { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open `[begin, end)` range within a single source file.
///
/// `file` is an `Rc<str>` rather than an owned `String` because every
/// expression, statement and symbol in a tree holds its own `SourceRef` and
/// they all point back at the same handful of file paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRef {
    pub file: Rc<str>,
    pub begin: Location,
    pub end: Location,
}

impl SourceRef {
    pub fn new(file: impl Into<Rc<str>>, begin: Location, end: Location) -> Self {
        SourceRef { file: file.into(), begin, end }
    }

    /// The synthetic zero-location reference used for file-level diagnostics
    /// such as a missing mandatory top-level assignment (§6).
    pub fn file_start(file: impl Into<Rc<str>>) -> Self {
        SourceRef { file: file.into(), begin: Location::ZERO, end: Location::ZERO }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.begin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_path_line_col_form() {
        let r = SourceRef::new("main.lstf", Location::new(3, 5), Location::new(3, 12));
        assert_eq!(r.to_string(), "main.lstf:3:5");
    }

    #[test]
    fn file_start_is_zero_location() {
        let r = SourceRef::file_start("main.lstf");
        assert_eq!(r.begin, Location::ZERO);
        assert_eq!(r.to_string(), "main.lstf:0:0");
    }
}
