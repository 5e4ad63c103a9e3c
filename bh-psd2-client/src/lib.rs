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

//! This crate provides a client for the PSD2 Open Banking API of a bank
//! sandbox, authenticating as a third party provider (TPP).
//!
//! # Details
//!
//! Access tokens are acquired with the OAuth2 client credentials grant by the
//! [`TokenClient`]. The token request is authenticated twice: the connection
//! uses mutual TLS with the [`TlsIdentity`], and the request itself carries a
//! detached JWS produced with the [`SigningCredentials`] (see the
//! [`bh_psd2_jws`] crate).
//!
//! The [`AccountsClient`] uses a fresh access token for every call to the
//! account information endpoints and relays their responses as
//! [`UpstreamResponse`]s.
//!
//! All network calls go through the [`HttpClient`] trait, implemented by
//! [`ReqwestHttpClient`] for production use.
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use bh_psd2_client::{
//!     AccountsClient, ClientConfig, ReqwestHttpClient, SigningCredentials, TlsIdentity,
//!     TokenClient,
//! };
//!
//! # async fn example() -> bherror::Result<(), bh_psd2_client::Error> {
//! let config = ClientConfig::new("example_client_id")?.with_timeout(Duration::from_secs(10))?;
//!
//! let tls_identity = TlsIdentity::from_files("certs/tls.crt", "certs/tls.key")?;
//! let credentials = SigningCredentials::from_files("certs/signing.crt", "certs/signing.key")?;
//! let http_client = ReqwestHttpClient::with_identity(&tls_identity, config.timeout())?;
//!
//! let client = AccountsClient::new(TokenClient::new(config, credentials, http_client));
//!
//! let accounts = client.accounts().await?;
//! println!("{}: {}", accounts.status, accounts.body);
//! # Ok(())
//! # }
//! ```

mod accounts;
mod config;
mod error;
mod token;
mod transport;

#[cfg(any(feature = "test-utils", test))]
pub mod test_utils;

pub use accounts::*;
pub use config::*;
pub use error::*;
pub use token::*;
pub use transport::*;

pub use bh_psd2_jws;
