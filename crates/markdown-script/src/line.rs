use std::io::{self, Read};

const BOM: &str = "\u{feff}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRecord<'a> {
    pub text: &'a str,
    pub number: usize,
}

/// Splits `input` on `\n`, dropping a `\r` that directly precedes it.
///
/// Always yields at least one record: an empty input is a single empty line
/// and a trailing newline produces a trailing empty line.
pub fn split_lines(input: &str) -> Vec<LineRecord<'_>> {
    let mut lines = Vec::new();
    let mut rest = input;
    let mut number = 1usize;

    while let Some(idx) = rest.find('\n') {
        let raw = &rest[..idx];
        let text = raw.strip_suffix('\r').unwrap_or(raw);
        lines.push(LineRecord { text, number });
        rest = &rest[idx + 1..];
        number += 1;
    }

    lines.push(LineRecord { text: rest, number });
    lines
}

/// Reads every byte from `reader` and decodes it as UTF-8.
///
/// Invalid sequences are replaced rather than rejected and a leading
/// byte-order mark is dropped.
pub fn read_text<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    let text = String::from_utf8_lossy(&buffer);
    Ok(match text.strip_prefix(BOM) {
        Some(stripped) => stripped.to_string(),
        None => text.into_owned(),
    })
}
