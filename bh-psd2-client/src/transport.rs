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

use std::{future::Future, time::Duration};

use bherror::{traits::ForeignError as _, Result};
use reqwest::{Client, ClientBuilder};

use crate::{Error, TlsIdentity};

/// Transport used to talk to the bank API.
///
/// The implementation is responsible for client authentication via mutual TLS
/// and for enforcing a timeout.
pub trait HttpClient: Sync {
    /// Error type used by this trait.
    type Err: std::error::Error + Send + Sync + 'static;

    /// Send the `request` and return the full response.
    ///
    /// Non-success status codes are returned as responses, not errors.
    fn send(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> impl Future<Output = std::result::Result<http::Response<Vec<u8>>, Self::Err>> + Send;
}

/// [`HttpClient`] implementation using the [`reqwest`] crate.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient(Client);

impl ReqwestHttpClient {
    /// Construct [`ReqwestHttpClient`] from [`ClientBuilder`].
    pub fn from_builder(builder: ClientBuilder) -> reqwest::Result<Self> {
        Ok(Self(builder.build()?))
    }

    /// Construct the mutual TLS client presenting `identity`, with `timeout`
    /// enforced on every request.
    pub fn with_identity(identity: &TlsIdentity, timeout: Duration) -> Result<Self, Error> {
        let builder = Client::builder()
            .use_native_tls()
            .identity(identity.to_reqwest_identity()?)
            .timeout(timeout)
            .https_only(true);

        Self::from_builder(builder)
            .foreign_err(|| Error::Credentials("can't build the mutual TLS client".to_owned()))
    }
}

impl HttpClient for ReqwestHttpClient {
    type Err = reqwest::Error;

    async fn send(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> reqwest::Result<http::Response<Vec<u8>>> {
        let response = self.0.execute(request.try_into()?).await?;

        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        let mut converted = http::Response::new(body.to_vec());
        *converted.status_mut() = status;
        *converted.version_mut() = version;
        *converted.headers_mut() = headers;

        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn mutual_tls_client_is_built_from_identity() {
        ReqwestHttpClient::with_identity(&TlsIdentity::dummy(), Duration::from_secs(1)).unwrap();
    }

    #[tokio::test]
    async fn plain_http_is_refused() {
        let client = ReqwestHttpClient::with_identity(&TlsIdentity::dummy(), Duration::from_secs(1))
            .unwrap();

        let request = http::Request::get("http://127.0.0.1:9/v1/accounts")
            .body(Vec::new())
            .unwrap();

        assert!(client.send(request).await.is_err());
    }

    #[tokio::test]
    async fn unresponsive_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Accept the connection and never answer the TLS handshake.
        let server = tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            std::future::pending::<()>().await;
        });

        let client =
            ReqwestHttpClient::with_identity(&TlsIdentity::dummy(), Duration::from_millis(300))
                .unwrap();
        let request = http::Request::get(format!("https://{addr}/v1/accounts"))
            .body(Vec::new())
            .unwrap();

        let started = Instant::now();
        let error = client.send(request).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(error.is_timeout(), "{error:?}");
        assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(5), "{elapsed:?}");

        server.abort();
    }
}
