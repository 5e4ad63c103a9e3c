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

//! Client configuration and credential loading.
//!
//! All values are loaded once at startup and never mutated afterwards, so they
//! can be shared by concurrent requests without locking.

use std::{path::Path, time::Duration};

use bh_psd2_jws::{Ps256Signer, SigningCertificate, TOKEN_ENDPOINT_PATH};
use bh_uri_utils::UriPathExtensions as _;
use bherror::{
    traits::{ErrorContext as _, ForeignError as _, PropagateError as _},
    Result,
};
use openssl::{pkey::PKey, x509::X509};
use reqwest::Url;

use crate::Error;

/// Base URL of the bank sandbox API.
pub const DEFAULT_BASE_URL: &str = "https://api.sandbox.ing.com";

/// Default timeout of a single HTTP request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Path of the accounts endpoint.
pub const ACCOUNTS_ENDPOINT_PATH: &str = "/v1/accounts";

/// Path suffix of the transactions endpoint, appended to
/// `/v1/accounts/{account_id}`.
pub const TRANSACTIONS_ENDPOINT_SUFFIX: &str = "/transactions";

/// Immutable configuration of the PSD2 client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: Url,
    client_id: String,
    timeout: Duration,
}

impl ClientConfig {
    /// Create the configuration for `client_id`, using [`DEFAULT_BASE_URL`]
    /// and [`DEFAULT_TIMEOUT`].
    pub fn new(client_id: impl Into<String>) -> Result<Self, Error> {
        let client_id = client_id.into();
        if client_id.trim().is_empty() {
            return Err(bherror::Error::root(Error::InvalidConfig(
                "client_id must not be empty".to_owned(),
            )));
        }

        Ok(Self {
            base_url: parse_base_url(DEFAULT_BASE_URL)?,
            client_id,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Replace the base URL of the bank API.
    ///
    /// Only `https` URLs without a path, query or fragment are accepted, since
    /// the signed `(request-target)` is the literal token endpoint path.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, Error> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    /// Replace the request timeout; it must not be zero.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, Error> {
        if timeout.is_zero() {
            return Err(bherror::Error::root(Error::InvalidConfig(
                "timeout must not be zero".to_owned(),
            )));
        }

        self.timeout = timeout;
        Ok(self)
    }

    /// The base URL of the bank API.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The OAuth2 client identifier.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The timeout enforced on every HTTP request.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// URL of the OAuth2 token endpoint.
    pub fn token_endpoint(&self) -> Result<Url, Error> {
        self.endpoint(TOKEN_ENDPOINT_PATH)
    }

    /// URL of the accounts endpoint.
    pub fn accounts_endpoint(&self) -> Result<Url, Error> {
        self.endpoint(ACCOUNTS_ENDPOINT_PATH)
    }

    /// URL of the transactions endpoint of the given account.
    ///
    /// The `account_id` is validated with [`validate_account_id`] first.
    pub fn transactions_endpoint(&self, account_id: &str) -> Result<Url, Error> {
        validate_account_id(account_id)?;

        self.endpoint(&format!(
            "{ACCOUNTS_ENDPOINT_PATH}/{account_id}{TRANSACTIONS_ENDPOINT_SUFFIX}"
        ))
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .clone()
            .add_path_suffix(path)
            .with_err(|| Error::InvalidConfig(format!("can't derive endpoint {path}")))
    }
}

fn parse_base_url(base_url: &str) -> Result<Url, Error> {
    let invalid = || Error::InvalidConfig(format!("invalid base URL {base_url}"));

    let url = Url::parse(base_url).foreign_err(invalid)?;

    if url.scheme() != "https" {
        return Err(bherror::Error::root(invalid()).ctx("base URL must use https"));
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(bherror::Error::root(invalid())
            .ctx("base URL must not have a path, query or fragment"));
    }

    Ok(url)
}

/// Check that `account_id` can be used as a single URL path segment as is.
///
/// The identifier must be non-empty, consist only of URL-unreserved
/// characters (`A-Z a-z 0-9 - . _ ~`) and must not be a dot segment.
pub fn validate_account_id(account_id: &str) -> Result<(), Error> {
    let is_unreserved =
        |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~');

    if account_id.is_empty()
        || matches!(account_id, "." | "..")
        || !account_id.chars().all(is_unreserved)
    {
        return Err(bherror::Error::root(Error::InvalidAccountId(
            account_id.to_owned(),
        )));
    }

    Ok(())
}

fn read_pem(path: &Path, what: &str) -> Result<Vec<u8>, Error> {
    std::fs::read(path)
        .foreign_err(|| Error::Credentials(format!("can't read {what} {}", path.display())))
}

/// The mutual TLS client identity, distinct from the signing credentials.
#[derive(Clone)]
pub struct TlsIdentity {
    certificate_pem: Vec<u8>,
    private_key_pem: Vec<u8>,
}

impl TlsIdentity {
    /// Load the identity from a PEM certificate (optionally followed by its
    /// chain) and a PEM private key in either the PKCS#1 or PKCS#8 format.
    ///
    /// The key is normalized to PKCS#8 and must match the certificate.
    pub fn from_pem(certificate_pem: &[u8], private_key_pem: &[u8]) -> Result<Self, Error> {
        let certificate = X509::from_pem(certificate_pem)
            .foreign_err(|| Error::Credentials("invalid TLS certificate".to_owned()))?;
        let private_key = PKey::private_key_from_pem(private_key_pem)
            .foreign_err(|| Error::Credentials("invalid TLS private key".to_owned()))?;

        let public_key = certificate
            .public_key()
            .foreign_err(|| Error::Credentials("invalid TLS certificate public key".to_owned()))?;
        if !public_key.public_eq(&private_key) {
            return Err(bherror::Error::root(Error::Credentials(
                "TLS private key doesn't match the TLS certificate".to_owned(),
            )));
        }

        let private_key_pem = private_key
            .private_key_to_pem_pkcs8()
            .foreign_err(|| Error::Credentials("can't encode TLS private key".to_owned()))?;

        Ok(Self {
            certificate_pem: certificate_pem.to_vec(),
            private_key_pem,
        })
    }

    /// Load the identity from PEM files, see [`TlsIdentity::from_pem`].
    pub fn from_files(
        certificate_path: impl AsRef<Path>,
        private_key_path: impl AsRef<Path>,
    ) -> Result<Self, Error> {
        let certificate_pem = read_pem(certificate_path.as_ref(), "TLS certificate")?;
        let private_key_pem = read_pem(private_key_path.as_ref(), "TLS private key")?;

        Self::from_pem(&certificate_pem, &private_key_pem)
    }

    /// Convert into the identity used by the TLS backend.
    pub fn to_reqwest_identity(&self) -> Result<reqwest::Identity, Error> {
        reqwest::Identity::from_pkcs8_pem(&self.certificate_pem, &self.private_key_pem)
            .foreign_err(|| {
                Error::Credentials("TLS identity rejected by the TLS backend".to_owned())
            })
    }

    /// Constructor of the test `TlsIdentity` instance.
    ///
    /// Do NOT use this method for production code, but only tests.
    #[cfg(any(feature = "test-utils", test))]
    pub fn dummy() -> Self {
        Self::from_pem(
            crate::test_utils::DUMMY_TLS_CERTIFICATE_PEM,
            crate::test_utils::DUMMY_TLS_KEY_PEM,
        )
        .unwrap()
    }
}

impl std::fmt::Debug for TlsIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsIdentity")
            .field("certificate_pem", &String::from_utf8_lossy(&self.certificate_pem))
            .field("private_key_pem", &"<redacted>")
            .finish()
    }
}

/// The TPP signing certificate together with the matching `PS256` signer.
///
/// The thumbprint and the `TPP-Signature-Certificate` header value are
/// computed once at load.
pub struct SigningCredentials {
    signer: Ps256Signer,
    fingerprint: String,
    certificate_header: String,
}

impl SigningCredentials {
    /// Pair the signing certificate with the signer of its private key.
    pub fn new(certificate: SigningCertificate, signer: Ps256Signer) -> Result<Self, Error> {
        signer
            .check_certificate(&certificate)
            .with_err(|| Error::Certificate)?;

        let fingerprint = certificate
            .sha256_fingerprint()
            .with_err(|| Error::Certificate)?;
        let certificate_header = certificate
            .to_single_line_pem()
            .with_err(|| Error::Certificate)?;

        Ok(Self {
            signer,
            fingerprint,
            certificate_header,
        })
    }

    /// Load the credentials from a PEM certificate and a PEM RSA private key.
    pub fn from_pem(certificate_pem: &[u8], private_key_pem: &[u8]) -> Result<Self, Error> {
        let certificate = SigningCertificate::from_pem(certificate_pem)
            .with_err(|| Error::Certificate)
            .ctx(|| "loading signing certificate")?;
        let signer = Ps256Signer::from_private_key_pem(private_key_pem)
            .with_err(|| Error::Signing)
            .ctx(|| "loading signing private key")?;

        Self::new(certificate, signer)
    }

    /// Load the credentials from PEM files, see
    /// [`SigningCredentials::from_pem`].
    pub fn from_files(
        certificate_path: impl AsRef<Path>,
        private_key_path: impl AsRef<Path>,
    ) -> Result<Self, Error> {
        let certificate_pem = read_pem(certificate_path.as_ref(), "signing certificate")?;
        let private_key_pem = read_pem(private_key_path.as_ref(), "signing private key")?;

        Self::from_pem(&certificate_pem, &private_key_pem)
    }

    /// The signer of the certificate's private key.
    pub fn signer(&self) -> &Ps256Signer {
        &self.signer
    }

    /// The `x5t#S256` thumbprint of the certificate.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// The single-line PEM certificate sent as `TPP-Signature-Certificate`.
    pub fn certificate_header(&self) -> &str {
        &self.certificate_header
    }

    /// Constructor of the test `SigningCredentials` instance, built from
    /// [`SigningCertificate::dummy`] and [`Ps256Signer::dummy`].
    ///
    /// Do NOT use this method for production code, but only tests.
    #[cfg(any(feature = "test-utils", test))]
    pub fn dummy() -> Self {
        Self::new(SigningCertificate::dummy(), Ps256Signer::dummy()).unwrap()
    }
}

impl std::fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}
