//! Minimal Java-properties parsing for scanner configuration files.
//!
//! Handles comments, `=`/`:`/whitespace separators, line continuations, and
//! escapes. Unlike a full spec-compliant parser this only needs key/value
//! semantics; on duplicate keys the last value wins, matching
//! `java.util.Properties`.

use std::collections::HashMap;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PropertiesError {
    #[error("malformed \\u escape in value near offset {offset}")]
    MalformedUnicodeEscape { offset: usize },
}

pub fn parse(text: &str) -> Result<HashMap<String, String>, PropertiesError> {
    let bytes = text.as_bytes();
    let mut offset = 0usize;
    let mut entries = HashMap::new();

    while offset < bytes.len() {
        let line_start = offset;
        let logical = read_logical_line(bytes, &mut offset);
        if let Some((key, value)) = parse_logical_line(&logical, line_start)? {
            entries.insert(key, value);
        }

        // Always make progress, even on pathological inputs.
        if offset == line_start {
            offset += 1;
        }
    }

    Ok(entries)
}

fn read_logical_line(bytes: &[u8], offset: &mut usize) -> Vec<u8> {
    let mut out = Vec::new();

    loop {
        let segment_start = *offset;
        let mut line_end = segment_start;
        while line_end < bytes.len() && bytes[line_end] != b'\n' {
            line_end += 1;
        }

        let mut content_end = line_end;
        if content_end > segment_start && bytes[content_end - 1] == b'\r' {
            content_end -= 1;
        }

        let continues = ends_with_unescaped_backslash(&bytes[segment_start..content_end]);
        let copy_end = if continues {
            content_end.saturating_sub(1)
        } else {
            content_end
        };
        out.extend_from_slice(&bytes[segment_start..copy_end]);

        *offset = if line_end < bytes.len() {
            line_end + 1
        } else {
            line_end
        };

        if !continues {
            break;
        }

        // Continuation lines drop their leading whitespace.
        while *offset < bytes.len() && is_inline_whitespace(bytes[*offset]) {
            *offset += 1;
        }
    }

    out
}

fn ends_with_unescaped_backslash(line: &[u8]) -> bool {
    let mut backslashes = 0usize;
    for &b in line.iter().rev() {
        if b != b'\\' {
            break;
        }
        backslashes += 1;
    }
    backslashes % 2 == 1
}

fn parse_logical_line(
    line: &[u8],
    line_offset: usize,
) -> Result<Option<(String, String)>, PropertiesError> {
    let mut i = 0usize;
    while i < line.len() && is_inline_whitespace(line[i]) {
        i += 1;
    }

    if i >= line.len() || line[i] == b'#' || line[i] == b'!' {
        return Ok(None);
    }

    let key_start = i;
    while i < line.len() {
        match line[i] {
            b'\\' => i += 2,
            b'=' | b':' => break,
            b if is_inline_whitespace(b) => break,
            _ => i += 1,
        }
    }
    let key_end = i.min(line.len());

    while i < line.len() && is_inline_whitespace(line[i]) {
        i += 1;
    }
    if i < line.len() && (line[i] == b'=' || line[i] == b':') {
        i += 1;
    }
    while i < line.len() && is_inline_whitespace(line[i]) {
        i += 1;
    }

    let key = unescape(&line[key_start..key_end], line_offset + key_start)?;
    let value = unescape(&line[i..], line_offset + i)?;
    Ok(Some((key, value)))
}

fn is_inline_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\x0C')
}

fn unescape(bytes: &[u8], base_offset: usize) -> Result<String, PropertiesError> {
    // Splitting only ever happens at ASCII bytes, so the slice is still valid
    // UTF-8; decode per char to keep multi-byte text intact.
    let text = String::from_utf8_lossy(bytes);
    let mut out = String::new();
    let mut chars = text.char_indices();

    while let Some((_, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            None => {
                out.push('\\');
                break;
            }
            Some((_, 't')) => out.push('\t'),
            Some((_, 'n')) => out.push('\n'),
            Some((_, 'r')) => out.push('\r'),
            Some((_, 'f')) => out.push('\x0C'),
            Some((escape_index, 'u')) => {
                let mut value = 0u32;
                for _ in 0..4 {
                    let digit = chars.next().and_then(|(_, digit)| digit.to_digit(16)).ok_or(
                        PropertiesError::MalformedUnicodeEscape {
                            offset: base_offset + escape_index,
                        },
                    )?;
                    value = (value << 4) | digit;
                }
                if let Some(ch) = char::from_u32(value) {
                    out.push(ch);
                }
            }
            Some((_, other)) => out.push(other),
        }
    }

    Ok(out)
}
