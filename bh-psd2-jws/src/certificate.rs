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
use openssl::{
    pkey::{PKey, Public},
    sha::sha256,
    x509::X509,
};

use crate::{utils::base64_url_encode, CertificateError};

/// The X.509 certificate of the TPP used to attest application-level
/// signatures.
///
/// The certificate is parsed once and never mutated afterwards, so a single
/// instance can be shared by all requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningCertificate {
    certificate: X509,
}

impl SigningCertificate {
    /// Parse the certificate from the PEM format.
    pub fn from_pem(pem: &[u8]) -> Result<Self, CertificateError> {
        let certificate = X509::from_pem(pem)
            .foreign_err(|| CertificateError::InvalidCertificate)
            .ctx(|| "couldn't load PEM certificate")?;

        Ok(Self { certificate })
    }

    /// Parse the certificate from the DER format.
    pub fn from_der(der: &[u8]) -> Result<Self, CertificateError> {
        let certificate = X509::from_der(der)
            .foreign_err(|| CertificateError::InvalidCertificate)
            .ctx(|| "couldn't load DER certificate")?;

        Ok(Self { certificate })
    }

    /// The DER encoding of the certificate.
    pub fn to_der(&self) -> Result<Vec<u8>, CertificateError> {
        self.certificate
            .to_der()
            .foreign_err(|| CertificateError::DerEncoding)
    }

    /// Compute the `x5t#S256` thumbprint of the certificate, i.e. the
    /// `base64url`-encoded (**without** padding) SHA-256 digest of its DER
    /// encoding, as defined in [RFC 7515].
    ///
    /// [RFC 7515]: https://www.rfc-editor.org/rfc/rfc7515.html#section-4.1.8
    pub fn sha256_fingerprint(&self) -> Result<String, CertificateError> {
        let der = self.to_der().ctx(|| "computing x5t#S256")?;

        Ok(base64_url_encode(sha256(&der)))
    }

    /// The PEM encoding of the certificate with all line breaks removed, as
    /// expected by the `TPP-Signature-Certificate` HTTP header.
    pub fn to_single_line_pem(&self) -> Result<String, CertificateError> {
        let pem = self
            .certificate
            .to_pem()
            .foreign_err(|| CertificateError::DerEncoding)?;

        let pem = String::from_utf8(pem).foreign_err(|| CertificateError::DerEncoding)?;

        Ok(pem.chars().filter(|c| !matches!(c, '\r' | '\n')).collect())
    }

    /// Returns the public key of the certificate.
    pub fn public_key(&self) -> Result<PKey<Public>, CertificateError> {
        self.certificate
            .public_key()
            .foreign_err(|| CertificateError::PublicKey)
            .ctx(|| "Failed to access X509 public key")
    }

    /// Constructor of the test `SigningCertificate` instance, matching
    /// [`Ps256Signer::dummy`](crate::Ps256Signer::dummy).
    ///
    /// Do NOT use this method for production code, but only tests.
    #[cfg(any(feature = "test-utils", test))]
    pub fn dummy() -> Self {
        Self::from_pem(DUMMY_CERTIFICATE_PEM.as_bytes()).unwrap()
    }
}

/// PEM of [`SigningCertificate::dummy`].
#[cfg(any(feature = "test-utils", test))]
pub const DUMMY_CERTIFICATE_PEM: &str = include_str!("../testdata/signing.crt");

/// The `x5t#S256` of [`SigningCertificate::dummy`].
#[cfg(any(feature = "test-utils", test))]
pub const DUMMY_CERTIFICATE_FINGERPRINT: &str = "vM-IJ6t7EqvD7TmjgAdWARTf-lcNXBpVt8cold3HaUc";
