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

use crate::{digest::digest_header_value, header::SIGNED_HEADERS};

/// Path of the OAuth2 token endpoint.
pub const TOKEN_ENDPOINT_PATH: &str = "/oauth2/token";

/// HTTP method of the OAuth2 token request.
pub const TOKEN_ENDPOINT_METHOD: &str = "POST";

/// Content type of the OAuth2 token request body.
pub const CONTENT_TYPE_FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// The detached JWS payload: one `name: value` line per entry of
/// [`SIGNED_HEADERS`], in that order, joined by `\n` without a trailing
/// newline.
///
/// The values must be identical to the ones present on the actual HTTP
/// request, otherwise the verifier reconstructs a different payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningString(String);

impl SigningString {
    /// Construct the signing string.
    ///
    /// The `method` is lowercased; `digest` is the full `Digest` header
    /// value, i.e. `SHA-256=<base64 digest>`.
    pub fn new(method: &str, path: &str, digest: &str, content_type: &str) -> Self {
        let request_target = format!("{} {}", method.to_ascii_lowercase(), path);
        let values = [request_target.as_str(), digest, content_type];

        let lines: Vec<String> = SIGNED_HEADERS
            .iter()
            .zip(values)
            .map(|(name, value)| format!("{name}: {value}"))
            .collect();

        Self(lines.join("\n"))
    }

    /// Construct the signing string of an OAuth2 token request with the given
    /// form-urlencoded `body`.
    pub fn for_token_request(body: &[u8]) -> Self {
        Self::new(
            TOKEN_ENDPOINT_METHOD,
            TOKEN_ENDPOINT_PATH,
            &digest_header_value(body),
            CONTENT_TYPE_FORM_URLENCODED,
        )
    }

    /// The signing string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SigningString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const TOKEN_REQUEST_BODY: &[u8] =
        b"grant_type=client_credentials&scope=aispis&client_id=example_client_id";

    pub(crate) const GOLDEN_SIGNING_STRING: &str = "(request-target): post /oauth2/token\n\
        digest: SHA-256=rgN8AcG7Qx5nknLS81Qb46FW1Qh3IwgdzSCLiOpfoEE=\n\
        content-type: application/x-www-form-urlencoded";

    #[test]
    fn token_request_signing_string_matches_golden_value() {
        let signing_string = SigningString::for_token_request(TOKEN_REQUEST_BODY);

        assert_eq!(GOLDEN_SIGNING_STRING, signing_string.as_str());
    }

    #[test]
    fn signing_string_has_three_lines_in_fixed_order() {
        for body in [&b""[..], b"grant_type=client_credentials", TOKEN_REQUEST_BODY] {
            let signing_string = SigningString::for_token_request(body);
            let lines: Vec<&str> = signing_string.as_str().split('\n').collect();

            assert_eq!(3, lines.len());
            assert_eq!("(request-target): post /oauth2/token", lines[0]);
            assert!(lines[1].starts_with("digest: SHA-256="));
            assert_eq!("content-type: application/x-www-form-urlencoded", lines[2]);
            assert!(!signing_string.as_str().ends_with('\n'));
        }
    }

    #[test]
    fn method_is_lowercased() {
        let signing_string = SigningString::new("GET", "/v1/accounts", "SHA-256=x", "text/plain");

        assert_eq!(
            "(request-target): get /v1/accounts\ndigest: SHA-256=x\ncontent-type: text/plain",
            signing_string.to_string()
        );
    }
}
