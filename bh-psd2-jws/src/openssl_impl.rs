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

use std::result::Result as StdResult;

use bherror::{
    traits::{ErrorContext as _, ForeignError as _},
    Error, Result,
};
use openssl::{
    hash::MessageDigest,
    pkey::{Id, PKey, PKeyRef, Private, Public},
    rsa::Padding,
    sign::{RsaPssSaltlen, Signer as OpensslSigner, Verifier as OpensslVerifier},
};

use crate::{
    error::SigningError, BoxError, CertificateError, SignatureVerifier, Signer,
    SigningAlgorithm, SigningCertificate,
};

/// Minimum RSA modulus size accepted for signing keys.
pub const MIN_RSA_KEY_BITS: u32 = 2048;

/// [`Signer`] implementation supporting the `PS256` algorithm (RSASSA-PSS
/// using SHA-256, MGF1 with SHA-256 and a 32 byte salt).
///
/// Intentionally doesn't implement `Debug`, so the key can't end up in logs.
pub struct Ps256Signer {
    private_key: PKey<Private>,
}

impl Ps256Signer {
    /// Create a `PS256` signer from an RSA private key in the PEM format
    /// (either PKCS#1 or PKCS#8).
    pub fn from_private_key_pem(private_key_pem: &[u8]) -> Result<Self, SigningError> {
        let private_key = PKey::private_key_from_pem(private_key_pem)
            .foreign_err(|| SigningError::InvalidPrivateKey)
            .ctx(|| "couldn't load private key")?;

        Self::from_private_key(private_key)
    }

    /// Create a `PS256` signer from an already loaded private key.
    pub fn from_private_key(private_key: PKey<Private>) -> Result<Self, SigningError> {
        if private_key.id() != Id::RSA {
            return Err(
                Error::root(SigningError::InvalidPrivateKey).ctx("PS256 requires an RSA key")
            );
        }

        if private_key.bits() < MIN_RSA_KEY_BITS {
            return Err(Error::root(SigningError::InvalidPrivateKey).ctx(format!(
                "RSA key of {} bits is shorter than {} bits",
                private_key.bits(),
                MIN_RSA_KEY_BITS
            )));
        }

        Ok(Self { private_key })
    }

    /// Check that `certificate` attests the public counterpart of this key.
    pub fn check_certificate(
        &self,
        certificate: &SigningCertificate,
    ) -> Result<(), CertificateError> {
        let certificate_key = certificate.public_key()?;

        if !certificate_key.public_eq(&self.private_key) {
            return Err(Error::root(CertificateError::PublicKey)
                .ctx("signing key doesn't match the signing certificate"));
        }

        Ok(())
    }

    /// Constructor of the test `Ps256Signer` instance, matching
    /// [`SigningCertificate::dummy`].
    ///
    /// Do NOT use this method for production code, but only tests.
    #[cfg(any(feature = "test-utils", test))]
    pub fn dummy() -> Self {
        Self::from_private_key_pem(DUMMY_SIGNING_KEY_PEM).unwrap()
    }
}

/// PKCS#8 PEM private key of [`Ps256Signer::dummy`].
#[cfg(any(feature = "test-utils", test))]
pub const DUMMY_SIGNING_KEY_PEM: &[u8] = include_bytes!("../testdata/signing.key");

fn pss_signer(private_key: &PKeyRef<Private>) -> StdResult<OpensslSigner<'_>, BoxError> {
    let mut signer = OpensslSigner::new(MessageDigest::sha256(), private_key)?;
    signer.set_rsa_padding(Padding::PKCS1_PSS)?;
    signer.set_rsa_pss_saltlen(RsaPssSaltlen::DIGEST_LENGTH)?;
    signer.set_rsa_mgf1_md(MessageDigest::sha256())?;
    Ok(signer)
}

fn pss_verifier(public_key: &PKeyRef<Public>) -> StdResult<OpensslVerifier<'_>, BoxError> {
    let mut verifier = OpensslVerifier::new(MessageDigest::sha256(), public_key)?;
    verifier.set_rsa_padding(Padding::PKCS1_PSS)?;
    verifier.set_rsa_pss_saltlen(RsaPssSaltlen::DIGEST_LENGTH)?;
    verifier.set_rsa_mgf1_md(MessageDigest::sha256())?;
    Ok(verifier)
}

impl Signer for Ps256Signer {
    fn algorithm(&self) -> SigningAlgorithm {
        SigningAlgorithm::Ps256
    }

    fn sign(&self, message: &[u8]) -> StdResult<Vec<u8>, BoxError> {
        let mut signer = pss_signer(&self.private_key)?;
        Ok(signer.sign_oneshot_to_vec(message)?)
    }
}

/// [`SignatureVerifier`] implementation supporting the `PS256` algorithm.
#[derive(Debug, Default)]
pub struct Ps256Verifier;

impl SignatureVerifier for Ps256Verifier {
    fn algorithm(&self) -> SigningAlgorithm {
        SigningAlgorithm::Ps256
    }

    fn verify(
        &self,
        message: &[u8],
        signature: &[u8],
        public_key: &PKey<Public>,
    ) -> StdResult<bool, BoxError> {
        if public_key.id() != Id::RSA {
            return Err("PS256 requires an RSA public key".into());
        }

        // RSA signatures are exactly as long as the modulus.
        if signature.len() != public_key.size() {
            return Ok(false);
        }

        let mut verifier = pss_verifier(public_key)?;
        Ok(verifier.verify_oneshot(signature, message)?)
    }
}
