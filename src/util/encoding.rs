//! Legacy single-byte input decoding.

use std::borrow::Cow;

/// Decodes a field as UTF-8 when valid, otherwise as ISO-8859-1.
///
/// Latin-1 maps every byte to the code point of the same value, so decoding never fails.
pub(crate) fn decode_field(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().copied().map(char::from).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_passes_through() {
        assert_eq!(decode_field("Fernand Léger".as_bytes()), "Fernand Léger");
    }

    #[test]
    fn latin1_bytes_are_decoded() {
        // "Léger" in ISO-8859-1
        let bytes = [b'L', 0xE9, b'g', b'e', b'r'];
        assert_eq!(decode_field(&bytes), "Léger");
    }
}
