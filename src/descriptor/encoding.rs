//! Decoding descriptors saved by assorted editors

use std::fmt;

/// Encoding a descriptor was read with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Latin1,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Utf8 => "utf-8",
            Self::Utf16Le => "utf-16le",
            Self::Utf16Be => "utf-16be",
            Self::Latin1 => "latin-1",
        })
    }
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decode as UTF-8, then UTF-16, then Latin-1. Latin-1 accepts any byte
/// sequence, so decoding always succeeds.
pub fn decode(bytes: &[u8]) -> (String, Encoding) {
    if let Some(text) = decode_utf8(bytes) {
        return (text, Encoding::Utf8);
    }
    if let Some(decoded) = decode_utf16(bytes) {
        return decoded;
    }
    (decode_latin1(bytes), Encoding::Latin1)
}

/// NUL bytes mean BOM-less UTF-16, which is also valid UTF-8
fn decode_utf8(bytes: &[u8]) -> Option<String> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    std::str::from_utf8(bytes)
        .ok()
        .filter(|text| !text.contains('\0'))
        .map(str::to_owned)
}

/// BOM decides the byte order; little-endian without one. Rejects odd
/// lengths, unpaired surrogates and control characters a text file would
/// not contain. Without a BOM, at least half of the high bytes must be NUL,
/// as they are for mostly-ASCII text.
fn decode_utf16(bytes: &[u8]) -> Option<(String, Encoding)> {
    let (body, encoding) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (rest, Encoding::Utf16Le),
        [0xFE, 0xFF, rest @ ..] => (rest, Encoding::Utf16Be),
        _ if looks_like_utf16le(bytes) => (bytes, Encoding::Utf16Le),
        _ => return None,
    };
    if body.len() % 2 != 0 {
        return None;
    }

    let units = body.chunks_exact(2).map(|pair| match encoding {
        Encoding::Utf16Be => u16::from_be_bytes([pair[0], pair[1]]),
        _ => u16::from_le_bytes([pair[0], pair[1]]),
    });
    let text: String = char::decode_utf16(units)
        .collect::<std::result::Result<_, _>>()
        .ok()?;

    let plausible = text
        .chars()
        .all(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'));
    plausible.then_some((text, encoding))
}

fn looks_like_utf16le(bytes: &[u8]) -> bool {
    let units = bytes.len() / 2;
    let nul_high = bytes.iter().skip(1).step_by(2).filter(|&&b| b == 0).count();
    units > 0 && nul_high * 2 >= units
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
