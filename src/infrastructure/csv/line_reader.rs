// ============================================================
// LINE READER
// ============================================================
// Physical line splitting and delimited field extraction shared by the
// sniffer and the line parser

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::domain::municipio::Delimiter;

/// Iterator over the physical lines of a decoded file.
///
/// `\r\n`, `\n` and a bare `\r` all end a line, so files saved with classic
/// Mac line endings split the same way as Unix and Windows ones. A trailing
/// terminator does not produce an extra empty line.
pub struct PhysicalLines<'a> {
    rest: &'a str,
}

pub fn physical_lines(text: &str) -> PhysicalLines<'_> {
    PhysicalLines { rest: text }
}

impl<'a> Iterator for PhysicalLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }

        match self.rest.find(|c| c == '\r' || c == '\n') {
            Some(end) => {
                let line = &self.rest[..end];
                let terminator = if self.rest[end..].starts_with("\r\n") { 2 } else { 1 };
                self.rest = &self.rest[end + terminator..];
                Some(line)
            }
            None => {
                let line = self.rest;
                self.rest = "";
                Some(line)
            }
        }
    }
}

/// Split one line into trimmed fields.
///
/// Quoting is disabled: a `"` is an ordinary character, so the field count
/// is exactly the number of delimiters plus one.
pub fn split_fields(line: &str, delimiter: Delimiter) -> Vec<String> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .quoting(false)
        .delimiter(delimiter.as_byte())
        .from_reader(line.as_bytes());

    let mut record = StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => record.iter().map(str::to_string).collect(),
        _ => vec![line.trim().to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_lines_accepts_every_terminator() {
        let lines: Vec<&str> = physical_lines("a\r\nb\nc\rd").collect();
        assert_eq!(lines, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_physical_lines_keeps_blank_lines_for_numbering() {
        let lines: Vec<&str> = physical_lines("a\r\rb\r").collect();
        assert_eq!(lines, vec!["a", "", "b"]);
        assert_eq!(physical_lines("").count(), 0);
    }

    #[test]
    fn test_split_fields_trims() {
        let fields = split_fields(" 01 ; Acme ;GO ", Delimiter::Semicolon);
        assert_eq!(fields, vec!["01", "Acme", "GO"]);
    }

    #[test]
    fn test_split_fields_counts_every_delimiter() {
        assert_eq!(split_fields("01;Acme", Delimiter::Semicolon).len(), 2);
        assert_eq!(split_fields("01;;GO", Delimiter::Semicolon), vec!["01", "", "GO"]);
        assert_eq!(
            split_fields("3550308,\"São Paulo, SP\",SP", Delimiter::Comma).len(),
            4
        );
    }
}
