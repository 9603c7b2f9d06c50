//! Repair for the mojibake found in Facebook JSON exports.
//!
//! The export writer stores UTF-8 text as if every byte were its own Latin-1
//! code point, so "ą" arrives as "Ä\u{85}". Re-reading the code points as
//! bytes and decoding them as UTF-8 restores the original text.

/// Reinterprets `input` as Latin-1 bytes and decodes them as UTF-8.
///
/// Returns the input unchanged when a code point does not fit in one byte or
/// when the bytes are not valid UTF-8.
pub fn fix_encoding(input: &str) -> String {
    if input.is_ascii() {
        return input.to_string();
    }
    let mut bytes = Vec::with_capacity(input.len());
    for ch in input.chars() {
        let code = ch as u32;
        if code > 0xFF {
            return input.to_string();
        }
        bytes.push(code as u8);
    }
    match String::from_utf8(bytes) {
        Ok(fixed) => fixed,
        Err(_) => input.to_string(),
    }
}

pub fn fix_optional(input: Option<&str>) -> Option<String> {
    input.map(fix_encoding)
}
