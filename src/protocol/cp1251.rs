//! # Code Page 1251 Encoding
//!
//! Converts Unicode strings to Windows-1251 single-byte encoding for FP705
//! printers, and back for text the device returns.
//!
//! ASCII (U+0000–U+007F) passes through unchanged. The Cyrillic block
//! А–я (U+0410–U+044F) maps linearly onto 0xC0–0xFF. The remaining upper
//! half (0x80–0xBF) is a lookup table.
//!
//! Unlike a display encoding, a fiscal payload must never be silently
//! altered, so [`encode`] fails on the first unmapped character.

use crate::error::Fp705Error;

/// Byte value of the first linear Cyrillic letter (`А`).
const CYRILLIC_START: u8 = 0xC0;

/// `А` U+0410
const CYRILLIC_FIRST: u32 = 0x0410;

/// Undefined slot (0x98) in the table below.
const UNDEFINED: char = '\u{FFFD}';

/// 0x80–0xBF: punctuation, Serbian/Macedonian/Ukrainian/Belarusian letters, symbols
const UPPER_HALF: [char; 64] = [
    // 0x80–0x8F
    'Ђ', 'Ѓ', '‚', 'ѓ', '„', '…', '†', '‡', '€', '‰', 'Љ', '‹', 'Њ', 'Ќ', 'Ћ', 'Џ',
    // 0x90–0x9F
    'ђ', '‘', '’', '“', '”', '•', '–', '—', UNDEFINED, '™', 'љ', '›', 'њ', 'ќ', 'ћ', 'џ',
    // 0xA0–0xAF
    '\u{00A0}', 'Ў', 'ў', 'Ј', '¤', 'Ґ', '¦', '§', 'Ё', '©', 'Є', '«', '¬', '\u{00AD}', '®', 'Ї',
    // 0xB0–0xBF
    '°', '±', 'І', 'і', 'ґ', 'µ', '¶', '·', 'ё', '№', 'є', '»', 'ј', 'Ѕ', 'ѕ', 'ї',
];

/// Encode a Unicode string as cp1251 bytes.
///
/// Returns [`Fp705Error::Encoding`] naming the first character (and its
/// char index) that has no cp1251 representation.
pub fn encode(s: &str) -> Result<Vec<u8>, Fp705Error> {
    let mut out = Vec::with_capacity(s.len());
    for (position, ch) in s.chars().enumerate() {
        match unicode_to_cp1251(ch) {
            Some(byte) => out.push(byte),
            None => return Err(Fp705Error::Encoding { ch, position }),
        }
    }
    Ok(out)
}

/// Decode cp1251 bytes returned by the device.
///
/// The single undefined byte (0x98) decodes to U+FFFD.
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| cp1251_to_unicode(b)).collect()
}

fn unicode_to_cp1251(ch: char) -> Option<u8> {
    let code = ch as u32;
    if code < 0x80 {
        return Some(code as u8);
    }
    if (CYRILLIC_FIRST..CYRILLIC_FIRST + 64).contains(&code) {
        return Some(CYRILLIC_START + (code - CYRILLIC_FIRST) as u8);
    }
    if ch == UNDEFINED {
        return None;
    }
    UPPER_HALF
        .iter()
        .position(|&c| c == ch)
        .map(|idx| 0x80 + idx as u8)
}

fn cp1251_to_unicode(byte: u8) -> char {
    match byte {
        0x00..=0x7F => byte as char,
        0x80..=0xBF => UPPER_HALF[(byte - 0x80) as usize],
        _ => char::from_u32(CYRILLIC_FIRST + (byte - CYRILLIC_START) as u32).unwrap_or(UNDEFINED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        assert_eq!(encode("Hello, world!").unwrap(), b"Hello, world!");
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(encode("").unwrap(), b"");
    }

    #[test]
    fn test_cyrillic_block() {
        assert_eq!(encode("А").unwrap(), vec![0xC0]);
        assert_eq!(encode("я").unwrap(), vec![0xFF]);
        // "Хляб" (bread)
        assert_eq!(encode("Хляб").unwrap(), vec![0xD5, 0xEB, 0xFF, 0xE1]);
    }

    #[test]
    fn test_upper_half_table() {
        assert_eq!(encode("Ё").unwrap(), vec![0xA8]);
        assert_eq!(encode("ё").unwrap(), vec![0xB8]);
        assert_eq!(encode("€").unwrap(), vec![0x88]);
        assert_eq!(encode("№").unwrap(), vec![0xB9]);
        assert_eq!(encode("Ї").unwrap(), vec![0xAF]);
    }

    #[test]
    fn test_mixed_ascii_and_cyrillic() {
        assert_eq!(encode("Ok-Да").unwrap(), vec![0x4F, 0x6B, 0x2D, 0xC4, 0xE0]);
    }

    #[test]
    fn test_unmapped_char_fails() {
        let err = encode("ab★").unwrap_err();
        match err {
            Fp705Error::Encoding { ch, position } => {
                assert_eq!(ch, '★');
                assert_eq!(position, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_replacement_char_is_not_encodable() {
        assert!(encode("\u{FFFD}").is_err());
    }

    #[test]
    fn test_decode_inverts_encode() {
        let text = "Касова бележка № 7 — 12.50 €";
        assert_eq!(decode(&encode(text).unwrap()), text);
    }

    #[test]
    fn test_decode_undefined_byte() {
        assert_eq!(decode(&[0x41, 0x98]), "A\u{FFFD}");
    }
}
