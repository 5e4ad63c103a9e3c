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

use axum::{response::IntoResponse as _, Json};
use bherror::adapters::axum::{IntoAxumResponse, StatusCode};

/// Error returned by the proxy endpoints.
///
/// The response body is `{"error": "<message>"}` with the message of this
/// error only, never its source chain.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum ApiError {
    /// Error that occurs when the `account_id` query parameter is missing.
    #[strum(to_string = "Missing required query parameter account_id")]
    MissingAccountId,
    /// Error that occurs when the `account_id` query parameter is invalid.
    #[strum(to_string = "Invalid account_id {0}")]
    InvalidAccountId(String),
    /// Error that occurs when the bank API can't be used.
    #[strum(to_string = "{0}")]
    Client(bh_psd2_client::Error),
}

impl bherror::BhError for ApiError {}

impl ApiError {
    /// Map a client error, keeping invalid input a caller fault.
    pub fn from_client(error: &bh_psd2_client::Error) -> Self {
        match error {
            bh_psd2_client::Error::InvalidAccountId(account_id) => {
                Self::InvalidAccountId(account_id.clone())
            }
            other => Self::Client(other.clone()),
        }
    }
}

impl IntoAxumResponse for ApiError {
    fn http_status_code(&self) -> StatusCode {
        match self {
            Self::MissingAccountId | Self::InvalidAccountId(_) => StatusCode::BAD_REQUEST,
            Self::Client(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_axum_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.to_string() });

        (self.http_status_code(), Json(body)).into_response()
    }
}

/// Error that stops the proxy server.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum ServerError {
    /// Error that occurs when the client can't be configured.
    #[strum(to_string = "Invalid proxy configuration")]
    Config,
    /// Error that occurs when the listening socket can't be bound.
    #[strum(to_string = "Can't listen on {0}")]
    Bind(String),
    /// Error that occurs when serving connections fails.
    #[strum(to_string = "Server failed")]
    Serve,
}

impl bherror::BhError for ServerError {}
