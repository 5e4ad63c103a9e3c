// Copyright (C) 2020-2025  The Blockhouse Technology Limited (TBTL).
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public
// License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine as _,
};

/// Type alias for a boxed error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Create the signing input of a detached `JWS`, given its encoded header and
/// the unencoded payload.
///
/// With `"b64": false` the payload is used as is, i.e. the input is
/// `<header>.<payload>`, as defined [here].
///
/// [here]: https://www.rfc-editor.org/rfc/rfc7797.html#section-3
pub fn construct_jws_payload(header: &str, payload: &str) -> String {
    format!("{header}.{payload}")
}

/// Returns the `base64url`-encoded string of the given `input`, **without**
/// padding.
pub fn base64_url_encode<T: AsRef<[u8]>>(input: T) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Decodes the given `payload` as the `base64url`-encoded string **without
/// padding** into bytes.
pub fn base64_url_decode<T: AsRef<[u8]>>(payload: T) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(payload)
}

/// Returns the standard, padded `base64` encoding of the given `input`.
///
/// This is the alphabet used by HTTP `Digest` header values, not the JOSE one.
pub fn base64_encode<T: AsRef<[u8]>>(input: T) -> String {
    STANDARD.encode(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_url_encode_has_no_padding_and_round_trips() {
        let bytes: Vec<u8> = (0..=255).collect();

        for len in 0..bytes.len() {
            let encoded = base64_url_encode(&bytes[..len]);

            assert!(!encoded.contains('='), "padding in {encoded}");
            assert!(!encoded.contains('+') && !encoded.contains('/'));
            assert_eq!(&bytes[..len], base64_url_decode(&encoded).unwrap());
        }
    }

    #[test]
    fn base64_url_encode_known_values() {
        assert_eq!("", base64_url_encode(b""));
        assert_eq!("Zg", base64_url_encode(b"f"));
        assert_eq!("Zm8", base64_url_encode(b"fo"));
        assert_eq!("-_8", base64_url_encode([0xfb, 0xff]));
    }

    #[test]
    fn base64_url_decode_rejects_padding() {
        assert!(base64_url_decode("Zg==").is_err());
    }

    #[test]
    fn base64_encode_uses_standard_alphabet() {
        assert_eq!("+/8=", base64_encode([0xfb, 0xff]));
    }
}
