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

use bherror::{
    traits::{ErrorContext as _, ForeignError as _},
    Result,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{FormatError, SigningError},
    utils::{base64_url_decode, base64_url_encode},
    SigningAlgorithm,
};

/// The `mId` of the `sigD` header parameter for signatures over HTTP headers,
/// as defined in [ETSI TS 119 182-1] section 5.2.8.
///
/// [ETSI TS 119 182-1]: https://www.etsi.org/deliver/etsi_ts/119100_119199/11918201/01.01.01_60/ts_11918201v010101p.pdf
pub const SIG_D_HTTP_HEADERS_M_ID: &str = "http://uri.etsi.org/19182/HttpHeaders";

/// The (pseudo-)headers covered by the signature, in signing order.
pub const SIGNED_HEADERS: [&str; 3] = ["(request-target)", "digest", "content-type"];

/// Header parameters every verifier must understand and process.
pub const CRITICAL_HEADER_PARAMETERS: [&str; 3] = ["sigT", "sigD", "b64"];

/// Reference to the signed data, i.e. the `sigD` header parameter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SignedDataReference {
    /// Names of the (pseudo-)headers forming the detached payload.
    pub pars: Vec<String>,
    /// Identifier of the mechanism used to build the detached payload.
    #[serde(rename = "mId")]
    pub m_id: String,
}

/// The JWS protected header of the ETSI JAdES signature profile for HTTP
/// requests.
///
/// Fields serialize in declaration order, which yields a deterministic
/// encoding for the same fingerprint and signing time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct JwsProtectedHeader {
    /// Always `false`; the payload is detached and unencoded.
    pub b64: bool,
    /// SHA-256 thumbprint of the signing certificate.
    #[serde(rename = "x5t#S256")]
    pub x5t_s256: String,
    /// Critical header parameters.
    pub crit: Vec<String>,
    /// Claimed signing time, second precision, UTC.
    #[serde(rename = "sigT")]
    pub sig_t: String,
    /// Signed data reference.
    #[serde(rename = "sigD")]
    pub sig_d: SignedDataReference,
    /// Signature algorithm.
    pub alg: SigningAlgorithm,
}

impl JwsProtectedHeader {
    /// Build the header for a certificate thumbprint, signed at
    /// `signing_time`.
    pub fn new(x5t_s256: String, signing_time: DateTime<Utc>) -> Self {
        Self {
            b64: false,
            x5t_s256,
            crit: CRITICAL_HEADER_PARAMETERS.map(String::from).to_vec(),
            sig_t: format_signing_time(signing_time),
            sig_d: SignedDataReference {
                pars: SIGNED_HEADERS.map(String::from).to_vec(),
                m_id: SIG_D_HTTP_HEADERS_M_ID.to_owned(),
            },
            alg: SigningAlgorithm::Ps256,
        }
    }

    /// Serialize the header to JSON and `base64url`-encode it.
    pub fn encode(&self) -> Result<String, SigningError> {
        let json = serde_json::to_vec(self).foreign_err(|| SigningError::HeaderSerialization)?;

        Ok(base64_url_encode(json))
    }

    /// Decode a `base64url`-encoded header.
    pub fn decode(encoded: &str) -> Result<Self, FormatError> {
        let json = base64_url_decode(encoded)
            .foreign_err(|| FormatError::MalformedJws("header is not base64url".to_owned()))?;

        serde_json::from_slice(&json)
            .foreign_err(|| FormatError::MalformedJws("invalid protected header".to_owned()))
            .ctx(|| "decoding JWS protected header")
    }
}

/// Format `time` as the `sigT` value, e.g. `2024-05-15T09:30:00Z`.
///
/// Fractional seconds are truncated.
pub fn format_signing_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}
