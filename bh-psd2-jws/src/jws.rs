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
    traits::{ErrorContext as _, ForeignBoxed as _, ForeignError as _, PropagateError as _},
    Error, Result,
};
use openssl::pkey::{PKey, Public};

use crate::{
    error::{FormatError, SigningError},
    utils::{base64_url_decode, base64_url_encode, construct_jws_payload},
    JwsProtectedHeader, SignatureVerifier, Signer, SigningString,
};

/// A JWS in the compact serialization with a detached payload, i.e.
/// `<base64url(header)>..<base64url(signature)>`.
///
/// See [appendix F of RFC7515](https://www.rfc-editor.org/rfc/rfc7515.html#appendix-F).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactJws {
    header: String,
    signature: String,
}

impl CompactJws {
    /// Sign `signing_string` as the detached, unencoded payload under the
    /// given protected `header`.
    ///
    /// The signing input is `<base64url(header)>.<signing string>`.
    pub fn sign_detached<S>(
        header: &JwsProtectedHeader,
        signing_string: &SigningString,
        signer: &S,
    ) -> Result<Self, SigningError>
    where
        S: Signer + ?Sized,
    {
        if signer.algorithm() != header.alg {
            return Err(Error::root(SigningError::UnsupportedAlgorithm(
                signer.algorithm().to_string(),
            ))
            .ctx(format!("header requires {}", header.alg)));
        }

        let header = header.encode()?;
        let message = construct_jws_payload(&header, signing_string.as_str());

        let signature = signer
            .sign(message.as_bytes())
            .foreign_boxed_err(|| SigningError::CryptoBackend)
            .ctx(|| "signing the detached JWS payload")?;

        Ok(Self {
            header,
            signature: base64_url_encode(signature),
        })
    }

    /// Parse a compact detached JWS.
    ///
    /// Returns an error if any of the segments is missing, or if the payload
    /// segment is not empty.
    pub fn parse(jws: &str) -> Result<Self, FormatError> {
        let error = |message: &str| Error::root(FormatError::MalformedJws(message.to_owned()));

        let mut segments = jws.split('.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(error("expected exactly three segments"));
        };

        if !payload.is_empty() {
            return Err(error("payload must be detached"));
        }
        if header.is_empty() || signature.is_empty() {
            return Err(error("empty header or signature"));
        }

        Ok(Self {
            header: header.to_owned(),
            signature: signature.to_owned(),
        })
    }

    /// The `base64url`-encoded protected header.
    pub fn encoded_header(&self) -> &str {
        &self.header
    }

    /// The `base64url`-encoded signature.
    pub fn encoded_signature(&self) -> &str {
        &self.signature
    }

    /// Decode the protected header.
    pub fn header(&self) -> Result<JwsProtectedHeader, FormatError> {
        JwsProtectedHeader::decode(&self.header)
    }

    /// Decode the raw signature bytes.
    pub fn signature_bytes(&self) -> Result<Vec<u8>, FormatError> {
        base64_url_decode(&self.signature)
            .foreign_err(|| FormatError::MalformedJws("signature is not base64url".to_owned()))
    }

    /// Verify the signature against the reconstructed detached payload.
    ///
    /// Returns `Ok(false)` for a well-formed but invalid signature.
    pub fn verify_detached<V>(
        &self,
        signing_string: &SigningString,
        verifier: &V,
        public_key: &PKey<Public>,
    ) -> Result<bool, SigningError>
    where
        V: SignatureVerifier + ?Sized,
    {
        let header = self.header().with_err(|| SigningError::Verification)?;
        if header.alg != verifier.algorithm() {
            return Ok(false);
        }

        let signature = self
            .signature_bytes()
            .with_err(|| SigningError::Verification)?;
        let message = construct_jws_payload(&self.header, signing_string.as_str());

        verifier
            .verify(message.as_bytes(), &signature, public_key)
            .foreign_boxed_err(|| SigningError::Verification)
    }
}

impl std::fmt::Display for CompactJws {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.header, self.signature)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::{
        certificate::DUMMY_CERTIFICATE_FINGERPRINT,
        header::tests::{signing_time, GOLDEN_ENCODED_HEADER},
        signing_string::tests::{GOLDEN_SIGNING_STRING, TOKEN_REQUEST_BODY},
        BoxError, Ps256Signer, Ps256Verifier, SigningAlgorithm, SigningCertificate,
    };

    fn golden_jws() -> CompactJws {
        let header =
            JwsProtectedHeader::new(DUMMY_CERTIFICATE_FINGERPRINT.to_owned(), signing_time());
        let signing_string = SigningString::for_token_request(TOKEN_REQUEST_BODY);

        CompactJws::sign_detached(&header, &signing_string, &Ps256Signer::dummy()).unwrap()
    }

    fn public_key() -> PKey<Public> {
        SigningCertificate::dummy().public_key().unwrap()
    }

    #[test]
    fn detached_jws_matches_golden_value() {
        let jws = golden_jws().to_string();

        let (header, signature) = jws.split_once("..").unwrap();
        assert_eq!(GOLDEN_ENCODED_HEADER, header);
        assert!(!signature.contains('.') && !signature.contains('='));
        assert_eq!(256, base64_url_decode(signature).unwrap().len());

        let signing_string = SigningString::for_token_request(TOKEN_REQUEST_BODY);
        assert_eq!(GOLDEN_SIGNING_STRING, signing_string.as_str());
        assert!(golden_jws()
            .verify_detached(&signing_string, &Ps256Verifier, &public_key())
            .unwrap());
    }

    #[test]
    fn signature_is_over_header_dot_signing_string() {
        let jws = golden_jws();
        let message = format!("{GOLDEN_ENCODED_HEADER}.{GOLDEN_SIGNING_STRING}");

        assert!(Ps256Verifier
            .verify(
                message.as_bytes(),
                &jws.signature_bytes().unwrap(),
                &public_key()
            )
            .unwrap());
    }

    #[test]
    fn altered_signing_string_does_not_verify() {
        let jws = golden_jws();

        let altered = SigningString::for_token_request(
            b"grant_type=client_credentials&scope=aispis&client_id=example_client_iD",
        );
        assert!(!jws
            .verify_detached(&altered, &Ps256Verifier, &public_key())
            .unwrap());
    }

    #[test]
    fn altered_header_does_not_verify() {
        let jws = golden_jws();
        let signing_string = SigningString::for_token_request(TOKEN_REQUEST_BODY);

        let mut header = jws.header().unwrap();
        header.sig_t = "2024-05-15T09:30:01Z".to_owned();
        let tampered = CompactJws::parse(&format!(
            "{}..{}",
            header.encode().unwrap(),
            jws.encoded_signature()
        ))
        .unwrap();

        assert!(!tampered
            .verify_detached(&signing_string, &Ps256Verifier, &public_key())
            .unwrap());
    }

    #[test]
    fn parse_round_trips_display() {
        let jws = golden_jws();

        assert_eq!(jws, CompactJws::parse(&jws.to_string()).unwrap());
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for input in ["", "a.b", "a.b.c", "..sig", "hdr..", "a..b.c"] {
            let error = CompactJws::parse(input).unwrap_err();
            assert_matches!(error.error, FormatError::MalformedJws(_), "{input}");
        }
    }

    struct FailingSigner;

    impl Signer for FailingSigner {
        fn algorithm(&self) -> SigningAlgorithm {
            SigningAlgorithm::Ps256
        }

        fn sign(&self, _message: &[u8]) -> std::result::Result<Vec<u8>, BoxError> {
            Err("hardware token unavailable".into())
        }
    }

    #[test]
    fn signer_failure_is_surfaced() {
        let header =
            JwsProtectedHeader::new(DUMMY_CERTIFICATE_FINGERPRINT.to_owned(), signing_time());
        let signing_string = SigningString::for_token_request(TOKEN_REQUEST_BODY);

        let error =
            CompactJws::sign_detached(&header, &signing_string, &FailingSigner).unwrap_err();

        assert_eq!(SigningError::CryptoBackend, error.error);
        assert!(std::error::Error::source(&error).is_some());
    }
}
