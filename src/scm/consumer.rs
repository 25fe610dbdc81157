use crate::error::{BlameError, Result};
use crate::models::BlameLine;
use crate::scm::matcher::LineMatcher;
use crate::scm::timestamp::TimestampParser;

/// Compiled knowledge of what `lscm annotate` prints. Built once and shared
/// by every consumer.
#[derive(Debug, Clone, Default)]
pub struct AnnotateFormat {
    pub matcher: LineMatcher,
    pub timestamps: TimestampParser,
}

impl AnnotateFormat {
    pub fn new(timestamps: TimestampParser) -> Self {
        Self {
            matcher: LineMatcher::new(),
            timestamps,
        }
    }
}

/// Turns the stdout of one annotate run into blame lines.
///
/// Records must be numbered 1, 2, 3... in order. Lines that are not records
/// are wrapped source text and get dropped.
pub struct BlameConsumer<'a> {
    filename: &'a str,
    format: &'a AnnotateFormat,
    lines: Vec<BlameLine>,
}

impl<'a> BlameConsumer<'a> {
    pub fn new(filename: &'a str, format: &'a AnnotateFormat) -> Self {
        Self {
            filename,
            format,
            lines: Vec::new(),
        }
    }

    fn expected_line(&self) -> u32 {
        self.lines.len() as u32 + 1
    }

    pub fn consume_line(&mut self, line: &str) -> Result<()> {
        let expected = self.expected_line();
        let Some(matched) = self.format.matcher.match_line(line) else {
            // Probably code
            return Ok(());
        };

        let actual: u32 = matched
            .line_number
            .parse()
            .map_err(|_| BlameError::UnrecognizedBlameInfo {
                file: self.filename.to_string(),
                line: expected,
                raw: line.to_string(),
            })?;

        if actual != expected {
            return Err(BlameError::UnexpectedLine {
                file: self.filename.to_string(),
                expected,
                actual,
                raw: line.to_string(),
            });
        }

        self.lines.push(BlameLine {
            line_number: expected,
            author: matched.author.to_string(),
            revision: matched.revision.to_string(),
            date: self.format.timestamps.parse(matched.timestamp),
        });
        Ok(())
    }

    pub fn lines(&self) -> &[BlameLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<BlameLine> {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use pretty_assertions::assert_eq;

    use super::*;

    const DUARTE: &[&str] = &[
        "1  Duarte (1058) 2015-05-29 11:23 AM  Share /* ",
        "2  Duarte (1058) 2015-05-29 11:23 AM  Share  * Sonar, open source software quality management tool. ",
        "3  Duarte (1058) 2015-05-29 11:23 AM  Share  * Copyright (C) 2008-2012 SonarSource ",
        "4  Duarte (1058) 2015-05-29 11:23 AM  Share  * mailto:contact AT sonarsource DOT com ",
        "5  Duarte (1058) 2015-05-29 11:23 AM  Share  * ",
        "6  Duarte (1058) 2015-05-29 11:23 AM  Share  * Sonar is free software; you can redistribute it and/or ",
        "7  Duarte (1058) 2015-05-29 11:23 AM  Share  * modify it under the terms of the GNU Lesser General Public ",
        "8  Duarte (1058) 2015-05-29 11:23 AM  Share  * License as published by the Free Software Foundation; either ",
        "9  Duarte (1058) 2015-05-29 11:23 AM  Share  * version 3 of the License, or (at your option) any later version. ",
        "10 Duarte (1058) 2015-05-29 11:23 AM  Share  * ",
        "11 Duarte (1058) 2015-05-29 11:23 AM  Share  * Sonar is distributed in the hope that it will be useful, ",
        "12 Duarte (1058) 2015-05-29 11:23 AM  Share  * but WITHOUT ANY WARRANTY; without even the implied warranty of ",
        "13 Duarte    (1058) 2015-05-29 11:23 AM  Share  * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU ",
    ];

    fn format() -> AnnotateFormat {
        AnnotateFormat::new(TimestampParser::with_offset(FixedOffset::east_opt(3600).unwrap()))
    }

    #[test]
    fn author_parsing() {
        let format = format();
        let mut consumer = BlameConsumer::new("dummy.java", &format);
        for line in DUARTE {
            consumer.consume_line(line).unwrap();
        }

        let lines = consumer.into_lines();
        assert_eq!(lines.len(), DUARTE.len());
        assert!(lines.iter().all(|l| l.author == "Duarte" && l.revision == "1058"));
        let numbers: Vec<u32> = lines.iter().map(|l| l.line_number).collect();
        assert_eq!(numbers, (1..=13).collect::<Vec<u32>>());
    }

    #[test]
    fn wrapped_code_does_not_shift_numbering() {
        let format = format();

        let mut plain = BlameConsumer::new("a.txt", &format);
        for line in &DUARTE[..3] {
            plain.consume_line(line).unwrap();
        }

        let mut wrapped = BlameConsumer::new("a.txt", &format);
        wrapped.consume_line(DUARTE[0]).unwrap();
        wrapped.consume_line("continued source that wrapped").unwrap();
        wrapped.consume_line("").unwrap();
        wrapped.consume_line(DUARTE[1]).unwrap();
        wrapped.consume_line("    more (1058) wrapped text").unwrap();
        wrapped.consume_line(DUARTE[2]).unwrap();

        assert_eq!(plain.into_lines(), wrapped.into_lines());
    }

    #[test]
    fn gap_in_numbering_fails() {
        let format = format();
        let mut consumer = BlameConsumer::new("a.txt", &format);
        consumer.consume_line("1 A (100) 2014-12-09 09:14 AM x").unwrap();

        let err = consumer
            .consume_line("4 A (100) 2014-12-09 09:14 AM x")
            .unwrap_err();
        match err {
            BlameError::UnexpectedLine { file, expected, actual, raw } => {
                assert_eq!(file, "a.txt");
                assert_eq!(expected, 2);
                assert_eq!(actual, 4);
                assert_eq!(raw, "4 A (100) 2014-12-09 09:14 AM x");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(consumer.lines().len(), 1);
    }

    #[test]
    fn non_ascii_digits_are_wrapped_source() {
        let format = format();
        let mut consumer = BlameConsumer::new("a.txt", &format);
        consumer.consume_line("1 A (100) 2014-12-09 09:14 AM x").unwrap();
        consumer.consume_line("٢ A (١) 2014-12-09 09:14 AM wrapped").unwrap();
        consumer.consume_line("2 A (100) 2014-12-09 09:14 AM y").unwrap();

        let numbers: Vec<u32> = consumer.lines().iter().map(|l| l.line_number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn repeated_number_fails() {
        let format = format();
        let mut consumer = BlameConsumer::new("a.txt", &format);
        consumer.consume_line("1 A (100) 2014-12-09 09:14 AM x").unwrap();
        assert!(matches!(
            consumer.consume_line("1 A (100) 2014-12-09 09:14 AM x"),
            Err(BlameError::UnexpectedLine { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn oversized_number_is_unrecognized() {
        let format = format();
        let mut consumer = BlameConsumer::new("a.txt", &format);
        assert!(matches!(
            consumer.consume_line("99999999999999 A (100) 2014-12-09 09:14 AM x"),
            Err(BlameError::UnrecognizedBlameInfo { line: 1, .. })
        ));
    }

    #[test]
    fn bad_date_keeps_the_line() {
        let format = format();
        let mut consumer = BlameConsumer::new("a.txt", &format);
        consumer.consume_line("1 A (100) 2014-02-31 09:14 AM x").unwrap();
        consumer.consume_line("2 A (100) 2014-12-09 09:14 AM x").unwrap();

        let lines = consumer.into_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].date, None);
        assert!(lines[1].date.is_some());
    }
}
