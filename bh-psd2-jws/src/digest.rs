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

//! Body digests in the HTTP `Digest` header format of [RFC 3230].
//!
//! [RFC 3230]: https://www.rfc-editor.org/rfc/rfc3230.html

use openssl::sha::sha256;

use crate::utils::base64_encode;

/// The digest algorithm token used in `Digest` header values.
pub const DIGEST_ALGORITHM_SHA256: &str = "SHA-256";

/// Returns the standard `base64` encoding of the SHA-256 digest of `body`.
pub fn sha256_digest(body: &[u8]) -> String {
    base64_encode(sha256(body))
}

/// Returns the full `Digest` header value for `body`, i.e.
/// `SHA-256=<base64 digest>`.
pub fn digest_header_value(body: &[u8]) -> String {
    format!("{DIGEST_ALGORITHM_SHA256}={}", sha256_digest(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_digest_known_values() {
        assert_eq!(
            "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=",
            sha256_digest(b"")
        );
        assert_eq!(
            "ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0=",
            sha256_digest(b"abc")
        );
    }

    #[test]
    fn digest_header_value_of_token_request_body() {
        let body = b"grant_type=client_credentials&scope=aispis&client_id=example_client_id";

        assert_eq!(
            "SHA-256=rgN8AcG7Qx5nknLS81Qb46FW1Qh3IwgdzSCLiOpfoEE=",
            digest_header_value(body)
        );
    }
}
