use regex::Regex;

// 1 Julien HENRY (1008) 2011-12-14 09:14 AM Test.txt
// 2 Julien HENRY (1005) 2011-12-14 09:14 AM My commit comment.
// Digits are ASCII only: `\d` would also take e.g. Arabic-Indic digits.
const LINE_PATTERN: &str =
    r"^\s*([0-9]+)\s+(.*?)\s+\(([0-9]+)\) ([0-9]+-[0-9]+-[0-9]+ [0-9]+:[0-9]+ (?:AM|PM))(?: (.*))?$";

/// The pieces of one annotate record, still as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedLine<'a> {
    pub line_number: &'a str,
    pub author: &'a str,
    pub revision: &'a str,
    pub timestamp: &'a str,
}

/// Recognises annotate records. Anything else is source text that wrapped
/// past the terminal width.
#[derive(Debug, Clone)]
pub struct LineMatcher {
    pattern: Regex,
}

impl Default for LineMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl LineMatcher {
    pub fn new() -> Self {
        // The pattern is a literal; failing to compile it is a programming error.
        let pattern = Regex::new(LINE_PATTERN).expect("annotate line pattern is valid");
        Self { pattern }
    }

    pub fn match_line<'a>(&self, line: &'a str) -> Option<MatchedLine<'a>> {
        let caps = self.pattern.captures(line)?;
        Some(MatchedLine {
            line_number: caps.get(1)?.as_str(),
            author: caps.get(2)?.as_str(),
            revision: caps.get(3)?.as_str(),
            timestamp: caps.get(4)?.as_str(),
        })
    }
}
