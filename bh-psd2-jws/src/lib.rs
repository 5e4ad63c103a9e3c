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

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! This crate provides the detached [JSON Web Signature (JWS)][1] used by a
//! PSD2 Open Banking third party provider (TPP) to sign its HTTP requests,
//! following the ETSI JAdES profile for HTTP headers.
//!
//! [1]: https://datatracker.ietf.org/doc/html/rfc7515
//!
//! # Details
//!
//! A signature covers three (pseudo-)headers of the request, listed in
//! [`SIGNED_HEADERS`]. They are rendered as a [`SigningString`], which is the
//! unencoded, detached payload of the JWS. The [`JwsProtectedHeader`] binds
//! the signature to the TPP [`SigningCertificate`] through its SHA-256
//! thumbprint, and to the signing time.
//!
//! The signature itself is produced by any implementation of the [`Signer`]
//! trait. An [`openssl`] backed implementation of the `PS256` algorithm is
//! provided by [`Ps256Signer`], along with [`Ps256Verifier`] for checking the
//! produced signatures.
//!
//! # Examples
//!
//! ## Sign a token request
//!
//! ```
//! use bh_psd2_jws::{
//!     digest_header_value, CompactJws, JwsProtectedHeader, Ps256Signer, Ps256Verifier,
//!     SigningCertificate, SigningString,
//! };
//!
//! # let (certificate_pem, key_pem) = (
//! #     include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/signing.crt")),
//! #     include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/signing.key")),
//! # );
//! let certificate = SigningCertificate::from_pem(certificate_pem).unwrap();
//! let signer = Ps256Signer::from_private_key_pem(key_pem).unwrap();
//!
//! let body = b"grant_type=client_credentials&scope=aispis&client_id=my-client";
//! let signing_string = SigningString::for_token_request(body);
//! let header = JwsProtectedHeader::new(
//!     certificate.sha256_fingerprint().unwrap(),
//!     bh_psd2_jws::chrono::Utc::now(),
//! );
//!
//! let jws = CompactJws::sign_detached(&header, &signing_string, &signer).unwrap();
//!
//! // The `Digest` header sent along with the request.
//! assert!(digest_header_value(body).starts_with("SHA-256="));
//!
//! let public_key = certificate.public_key().unwrap();
//! assert!(jws
//!     .verify_detached(&signing_string, &Ps256Verifier, &public_key)
//!     .unwrap());
//! ```

mod certificate;
mod digest;
mod error;
mod header;
mod jws;
mod openssl_impl;
mod signing_string;
mod traits;
mod utils;

pub use certificate::*;
pub use digest::*;
pub use error::*;
pub use header::*;
pub use jws::*;
pub use openssl_impl::*;
pub use signing_string::*;
pub use traits::*;
pub use utils::*;

// Re-export the crates exposed through the public API.
pub use chrono;
pub use openssl;
