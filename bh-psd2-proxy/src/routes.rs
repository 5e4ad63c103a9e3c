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

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bh_psd2_client::{AccountsClient, HttpClient, UpstreamResponse};
use bherror::{traits::PropagateError as _, Error, Result};
use serde::Deserialize;
use tracing::info;

use crate::ApiError;

/// Path of the accounts endpoint.
pub const ACCOUNTS_ROUTE: &str = "/accounts";

/// Path of the transactions endpoint.
pub const TRANSACTIONS_ROUTE: &str = "/transactions";

/// State shared by all the proxy endpoints.
pub struct AppState<C> {
    client: Arc<AccountsClient<C>>,
}

impl<C> AppState<C> {
    /// Create the state around the accounts `client`.
    pub fn new(client: AccountsClient<C>) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

/// Query parameters of the transactions endpoint.
#[derive(Deserialize, Debug, Default)]
pub struct TransactionsQuery {
    /// Identifier of the account.
    pub account_id: Option<String>,
}

/// Build the router of the proxy endpoints.
pub fn router<C>(client: AccountsClient<C>) -> Router
where
    C: HttpClient + Send + 'static,
{
    Router::new()
        .route(ACCOUNTS_ROUTE, get(get_accounts::<C>))
        .route(TRANSACTIONS_ROUTE, get(get_transactions::<C>))
        .with_state(AppState::new(client))
}

fn relay(upstream: UpstreamResponse) -> Response {
    (upstream.status, Json(upstream.body)).into_response()
}

/// `GET /accounts`
pub async fn get_accounts<C>(State(state): State<AppState<C>>) -> Result<Response, ApiError>
where
    C: HttpClient + Send + 'static,
{
    let upstream = state.client.accounts().await.match_err(ApiError::from_client)?;
    info!(status = %upstream.status, "relayed accounts");

    Ok(relay(upstream))
}

/// `GET /transactions?account_id=<id>`
pub async fn get_transactions<C>(
    State(state): State<AppState<C>>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, ApiError>
where
    C: HttpClient + Send + 'static,
{
    let Some(account_id) = query.account_id else {
        return Err(Error::root(ApiError::MissingAccountId));
    };

    let upstream = state
        .client
        .transactions(&account_id)
        .await
        .match_err(ApiError::from_client)?;
    info!(status = %upstream.status, "relayed transactions");

    Ok(relay(upstream))
}

#[cfg(test)]
mod tests {
    use axum::{body::to_bytes, http::StatusCode};
    use bh_psd2_client::{
        test_utils::StubHttpClient, ClientConfig, SigningCredentials, TokenClient,
    };
    use serde_json::{json, Value};

    use super::*;

    fn state(http_client: StubHttpClient) -> AppState<StubHttpClient> {
        AppState::new(AccountsClient::new(TokenClient::new(
            ClientConfig::new("example_client_id").unwrap(),
            SigningCredentials::dummy(),
            http_client,
        )))
    }

    fn http_client_with_token() -> StubHttpClient {
        let http_client = StubHttpClient::new();
        http_client.push_json(200, &json!({ "access_token": "token-123" }));
        http_client
    }

    async fn into_parts(response: impl IntoResponse) -> (StatusCode, Value) {
        let response = response.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn accounts_are_relayed() {
        let http_client = http_client_with_token();
        http_client.push_json(200, &json!({ "accounts": [] }));

        let response = get_accounts(State(state(http_client))).await;

        assert_eq!((StatusCode::OK, json!({ "accounts": [] })), into_parts(response).await);
    }

    #[tokio::test]
    async fn upstream_status_is_relayed() {
        let http_client = http_client_with_token();
        http_client.push_json(403, &json!({ "message": "consent expired" }));

        let response = get_transactions(
            State(state(http_client)),
            Query(TransactionsQuery {
                account_id: Some("NL69INGB0123456789".to_owned()),
            }),
        )
        .await;

        assert_eq!(
            (StatusCode::FORBIDDEN, json!({ "message": "consent expired" })),
            into_parts(response).await
        );
    }

    #[tokio::test]
    async fn missing_account_id_is_bad_request() {
        let response = get_transactions(
            State(state(http_client_with_token())),
            Query(TransactionsQuery::default()),
        )
        .await;

        assert_eq!(
            (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Missing required query parameter account_id" })
            ),
            into_parts(response).await
        );
    }

    #[tokio::test]
    async fn invalid_account_id_is_bad_request() {
        let response = get_transactions(
            State(state(http_client_with_token())),
            Query(TransactionsQuery {
                account_id: Some("a/../b".to_owned()),
            }),
        )
        .await;

        assert_eq!(
            (StatusCode::BAD_REQUEST, json!({ "error": "Invalid account_id a/../b" })),
            into_parts(response).await
        );
    }

    #[tokio::test]
    async fn token_failure_is_internal_error() {
        let http_client = StubHttpClient::new();
        http_client.push_response(401, "unauthorized");

        let response = get_accounts(State(state(http_client))).await;

        assert_eq!(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Token acquisition failed with status 401: unauthorized" })
            ),
            into_parts(response).await
        );
    }

    #[tokio::test]
    async fn requests_are_routed() {
        let http_client = http_client_with_token();
        http_client.push_json(200, &json!({ "transactions": [] }));
        http_client.push_json(200, &json!({ "access_token": "token-456" }));
        http_client.push_json(200, &json!({ "accounts": [] }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(AccountsClient::new(TokenClient::new(
            ClientConfig::new("example_client_id").unwrap(),
            SigningCredentials::dummy(),
            http_client,
        )));
        let server = tokio::spawn(async move { axum::serve(listener, app).await });

        let get = |path: &str| {
            let url = format!("http://{addr}{path}");
            async move {
                let response = reqwest::get(url).await.unwrap();
                let status = response.status().as_u16();
                (status, response.json::<Value>().await.unwrap())
            }
        };

        assert_eq!(
            (200, json!({ "transactions": [] })),
            get("/transactions?account_id=NL69INGB0123456789").await
        );
        assert_eq!(
            (400, json!({ "error": "Missing required query parameter account_id" })),
            get("/transactions").await
        );
        assert_eq!((200, json!({ "accounts": [] })), get("/accounts").await);

        server.abort();
    }
}
