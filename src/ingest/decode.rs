//! Byte decoding under a prioritized encoding list
//!
//! Tenant uploads arrive in whatever encoding their spreadsheet tool felt
//! like: UTF-8 exports, Windows-1252 from Excel on Windows, bare Latin-1
//! from legacy CRMs. Each candidate is tried in order; Latin-1 sits last
//! because it never fails, so the list as a whole cannot reject text input.

use crate::error::{Error, Result};

/// Candidate encodings, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Windows1252,
    Latin1,
}

impl Encoding {
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Windows1252 => "windows-1252",
            Encoding::Latin1 => "latin-1",
        }
    }
}

pub const ENCODING_PRIORITY: &[Encoding] =
    &[Encoding::Utf8, Encoding::Windows1252, Encoding::Latin1];

/// Windows-1252 mappings for the 0x80..=0x9F block. `None` marks the five
/// code points the encoding leaves undefined; hitting one rejects the
/// candidate and falls through to Latin-1.
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), // 0x80 €
    None,             // 0x81
    Some('\u{201A}'), // 0x82
    Some('\u{0192}'), // 0x83
    Some('\u{201E}'), // 0x84
    Some('\u{2026}'), // 0x85
    Some('\u{2020}'), // 0x86
    Some('\u{2021}'), // 0x87
    Some('\u{02C6}'), // 0x88
    Some('\u{2030}'), // 0x89
    Some('\u{0160}'), // 0x8A
    Some('\u{2039}'), // 0x8B
    Some('\u{0152}'), // 0x8C
    None,             // 0x8D
    Some('\u{017D}'), // 0x8E
    None,             // 0x8F
    None,             // 0x90
    Some('\u{2018}'), // 0x91
    Some('\u{2019}'), // 0x92
    Some('\u{201C}'), // 0x93
    Some('\u{201D}'), // 0x94
    Some('\u{2022}'), // 0x95
    Some('\u{2013}'), // 0x96
    Some('\u{2014}'), // 0x97
    Some('\u{02DC}'), // 0x98
    Some('\u{2122}'), // 0x99
    Some('\u{0161}'), // 0x9A
    Some('\u{203A}'), // 0x9B
    Some('\u{0153}'), // 0x9C
    None,             // 0x9D
    Some('\u{017E}'), // 0x9E
    Some('\u{0178}'), // 0x9F
];

fn decode_with(encoding: Encoding, bytes: &[u8]) -> Option<String> {
    match encoding {
        Encoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
        Encoding::Windows1252 => {
            let mut out = String::with_capacity(bytes.len());
            for &b in bytes {
                let ch = match b {
                    0x00..=0x7F => char::from(b),
                    0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize]?,
                    _ => char::from(b),
                };
                out.push(ch);
            }
            Some(out)
        }
        Encoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

/// Decode `bytes` with the first encoding in the priority list that accepts
/// them, returning the text and the encoding that won.
pub fn decode(bytes: &[u8]) -> Result<(String, Encoding)> {
    for &encoding in ENCODING_PRIORITY {
        if let Some(text) = decode_with(encoding, bytes) {
            return Ok((text, encoding));
        }
    }
    // Unreachable while Latin-1 is in the list; kept so the priority list
    // stays editable without a panic path.
    Err(Error::DataFormat(
        "input not decodable under any supported encoding".to_string(),
    ))
}
