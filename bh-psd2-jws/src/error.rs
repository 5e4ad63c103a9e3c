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

/// Error related to the TPP signing certificate.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum CertificateError {
    /// Error that occurs when the certificate cannot be parsed.
    #[strum(to_string = "Invalid signing certificate")]
    InvalidCertificate,
    /// Error that occurs when the certificate cannot be re-encoded.
    #[strum(to_string = "Signing certificate encoding failed")]
    DerEncoding,
    /// Error that occurs when the public key of the certificate is not
    /// accessible or doesn't match the signing key.
    #[strum(to_string = "Invalid certificate public key")]
    PublicKey,
}

impl bherror::BhError for CertificateError {}

/// Error while producing or checking a JWS signature.
///
/// None of the variants or their attached contexts carry key material.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum SigningError {
    /// Error that occurs when the private key is unreadable or unsuitable for
    /// the signing algorithm.
    #[strum(to_string = "Invalid signing private key")]
    InvalidPrivateKey,
    /// Error that occurs when the cryptographic backend unexpectedly failed.
    #[strum(to_string = "Crypto backend failed")]
    CryptoBackend,
    /// Error that occurs when the protected header cannot be serialized.
    #[strum(to_string = "JWS protected header serialization failed")]
    HeaderSerialization,
    /// Error that occurs when the signer algorithm doesn't match the `alg`
    /// header parameter.
    #[strum(to_string = "Unsupported signing algorithm {0}")]
    UnsupportedAlgorithm(String),
    /// Error that occurs when a signature cannot be checked at all, as opposed
    /// to a signature that is simply invalid.
    #[strum(to_string = "Signature verification failed")]
    Verification,
}

impl bherror::BhError for SigningError {}

/// Error in the format of a detached JWS.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum FormatError {
    /// Error that occurs when a compact detached JWS is malformed.
    #[strum(to_string = "Malformed detached JWS: {0}")]
    MalformedJws(String),
}

impl bherror::BhError for FormatError {}
