//! Windows-1252 string handling.
//!
//! Every string in DTS and DSQ files (node names, material names, sequence
//! names) is single-byte Windows-1252, never UTF-8.

use encoding_rs::WINDOWS_1252;

use super::{Error, Result};

/// Decode Windows-1252 bytes. Every byte maps to a character, so this cannot fail.
pub fn decode_cp1252(bytes: &[u8]) -> String {
    let (text, _had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Encode a string to Windows-1252, rejecting characters outside the codepage.
pub fn encode_cp1252(text: &str) -> Result<Vec<u8>> {
    let (bytes, _encoding, had_errors) = WINDOWS_1252.encode(text);
    if had_errors {
        return Err(Error::InvalidText(format!(
            "{text:?} is not representable in Windows-1252"
        )));
    }
    if bytes.contains(&0) {
        return Err(Error::InvalidText(format!("{text:?} contains a NUL byte")));
    }
    Ok(bytes.into_owned())
}
