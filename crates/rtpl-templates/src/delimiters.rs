/// Find the byte index of the delimiter closing a span opened just before
/// `from`, e.g. the `)` matching a call's `(`.
///
/// Nested `open`/`close` pairs are balanced. Rust string, raw string and char
/// literals are skipped so delimiters inside them do not count; a lone `'`
/// (a lifetime) is treated as ordinary code.
pub(crate) fn find_closing(source: &str, from: usize, open: u8, close: u8) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut pos = from;

    while pos < bytes.len() {
        let b = bytes[pos];
        if b == b'"' {
            pos = skip_string(bytes, pos + 1)?;
        } else if b == b'\'' {
            pos = skip_char_literal(source, pos);
        } else if let Some(hashes) = raw_string_hashes(bytes, pos) {
            pos = skip_raw_string(bytes, pos + hashes + 2, hashes)?;
        } else if b == open {
            depth += 1;
            pos += 1;
        } else if b == close {
            if depth == 0 {
                return Some(pos);
            }
            depth -= 1;
            pos += 1;
        } else {
            pos += 1;
        }
    }

    None
}

pub(crate) fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `pos` is just past the opening quote; returns the index after the closing one.
fn skip_string(bytes: &[u8], mut pos: usize) -> Option<usize> {
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b'"' => return Some(pos + 1),
            _ => pos += 1,
        }
    }
    None
}

fn skip_char_literal(source: &str, pos: usize) -> usize {
    let bytes = source.as_bytes();
    if bytes.get(pos + 1) == Some(&b'\\') {
        return bytes[(pos + 3).min(bytes.len())..]
            .iter()
            .position(|&b| b == b'\'')
            .map_or(pos + 1, |offset| pos + 3 + offset + 1);
    }

    match source[pos + 1..].chars().next() {
        Some(c) if bytes.get(pos + 1 + c.len_utf8()) == Some(&b'\'') => pos + 2 + c.len_utf8(),
        _ => pos + 1,
    }
}

/// Number of `#`s when `pos` starts a raw string (`r"`, `r#"`, `br"`, ...).
fn raw_string_hashes(bytes: &[u8], pos: usize) -> Option<usize> {
    if bytes[pos] != b'r' {
        return None;
    }
    let prefix_ok = match pos.checked_sub(1).map(|p| bytes[p]) {
        None => true,
        Some(b'b') => pos < 2 || !is_ident_byte(bytes[pos - 2]),
        Some(prev) => !is_ident_byte(prev),
    };
    if !prefix_ok {
        return None;
    }

    let hashes = bytes[pos + 1..].iter().take_while(|&&b| b == b'#').count();
    (bytes.get(pos + 1 + hashes) == Some(&b'"')).then_some(hashes)
}

/// `pos` is just past the opening quote of a raw string with `hashes` `#`s.
fn skip_raw_string(bytes: &[u8], mut pos: usize, hashes: usize) -> Option<usize> {
    while pos < bytes.len() {
        if bytes[pos] == b'"' {
            let end = pos + 1 + hashes;
            if end <= bytes.len() && bytes[pos + 1..end].iter().all(|&b| b == b'#') {
                return Some(end);
            }
        }
        pos += 1;
    }
    None
}
