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

use bherror::{traits::ForeignError as _, Result};
use http::{
    header::{ACCEPT, AUTHORIZATION},
    StatusCode,
};
use reqwest::Url;
use tracing::debug;

use crate::{token::APPLICATION_JSON, Error, HttpClient, TokenClient};

/// Response of a resource endpoint, relayed as is.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    /// The upstream HTTP status code.
    pub status: StatusCode,
    /// The upstream JSON body; `null` if the body was empty.
    pub body: serde_json::Value,
}

impl UpstreamResponse {
    fn from_http(url: &Url, response: http::Response<Vec<u8>>) -> Result<Self, Error> {
        let status = response.status();
        let body = response.into_body();

        let body = if body.iter().all(u8::is_ascii_whitespace) {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).foreign_err(|| {
                Error::MalformedResponse(format!(
                    "{url} responded with {status} and a non-JSON body"
                ))
            })?
        };

        Ok(Self { status, body })
    }
}

/// Client for the account information endpoints.
pub struct AccountsClient<C> {
    token_client: TokenClient<C>,
}

impl<C: HttpClient> AccountsClient<C> {
    /// Create a new accounts client, acquiring its tokens with
    /// `token_client` and sending requests over its HTTP client.
    pub fn new(token_client: TokenClient<C>) -> Self {
        Self { token_client }
    }

    /// The token client used by this client.
    pub fn token_client(&self) -> &TokenClient<C> {
        &self.token_client
    }

    /// Fetch the accounts of the TPP.
    pub async fn accounts(&self) -> Result<UpstreamResponse, Error> {
        let url = self.token_client.config().accounts_endpoint()?;

        self.get(url).await
    }

    /// Fetch the transactions of the account with `account_id`.
    ///
    /// The identifier is validated before any request is made.
    pub async fn transactions(&self, account_id: &str) -> Result<UpstreamResponse, Error> {
        let url = self.token_client.config().transactions_endpoint(account_id)?;

        self.get(url).await
    }

    async fn get(&self, url: Url) -> Result<UpstreamResponse, Error> {
        let token = self.token_client.acquire_token().await?;

        let request = http::Request::get(url.as_str())
            .header(AUTHORIZATION, token.authorization_header())
            .header(ACCEPT, APPLICATION_JSON)
            .body(Vec::new())
            .foreign_err(|| Error::InvalidConfig(format!("can't build request to {url}")))?;

        let response = self
            .token_client
            .http_client()
            .send(request)
            .await
            .foreign_err(|| Error::Transport(url.to_string()))?;

        debug!(%url, status = %response.status(), "resource endpoint responded");

        UpstreamResponse::from_http(&url, response)
    }
}
