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

use std::str::FromStr;

use bherror::Error;
use openssl::pkey::{PKey, Public};
use serde::{Deserialize, Serialize};

use crate::{error::SigningError, utils::BoxError};

/// Signature algorithms accepted by the Open Banking signature profile.
///
/// The bank sandbox only accepts `PS256`, see [section 3.5 of RFC7518].
///
/// [section 3.5 of RFC7518]: https://datatracker.ietf.org/doc/html/rfc7518#section-3.5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SigningAlgorithm {
    /// RSASSA-PSS with SHA-256 and MGF1 with SHA-256
    Ps256,
}

/// JWS `"alg"` header parameter value for digital signature algorithm
/// **RSASSA-PSS using SHA-256 and MGF1 with SHA-256**, as specified in [RFC7518].
///
/// [RFC7518]: https://datatracker.ietf.org/doc/html/rfc7518#section-3.1
pub const SIGNING_ALG_PS256: &str = "PS256";

impl FromStr for SigningAlgorithm {
    type Err = Error<SigningError>;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            SIGNING_ALG_PS256 => Ok(SigningAlgorithm::Ps256),
            _ => Err(Error::root(SigningError::UnsupportedAlgorithm(
                value.to_string(),
            ))),
        }
    }
}

impl std::fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let message = match self {
            Self::Ps256 => SIGNING_ALG_PS256,
        };
        write!(f, "{}", message)
    }
}

/// A signing backend, to be used for computing the detached JWS signature.
///
/// The output of the signer must be the raw JWS signature, not yet
/// `base64url`-encoded. See step 5 in [section 5.1 of RFC7515] for more
/// information.
///
/// [section 5.1 of RFC7515]: https://www.rfc-editor.org/rfc/rfc7515.html#section-5.1
pub trait Signer {
    /// The algorithm this signer uses. Must be a constant function.
    fn algorithm(&self) -> SigningAlgorithm;

    /// Produce a JWS signature over `message` as a byte array.
    ///
    /// The `message` is guaranteed to be a valid detached JWS signing input.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, BoxError>;
}

/// A backend for verifying detached JWS signatures.
pub trait SignatureVerifier {
    /// The algorithm used for the signature verification.
    fn algorithm(&self) -> SigningAlgorithm;

    /// Verifies the signature of the message, against the provided public key.
    ///
    /// # Return
    /// Method returns `Ok(true)` if the signature is valid for the given
    /// message, `Ok(false)` if it isn't (but there was no issue with the
    /// verifier itself), and `Err(_)` when the verifier itself encounters an
    /// error for any other reason.
    fn verify(
        &self,
        message: &[u8],
        signature: &[u8],
        public_key: &PKey<Public>,
    ) -> Result<bool, BoxError>;
}
