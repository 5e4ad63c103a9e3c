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

/// Error type returned by the PSD2 client.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum Error {
    /// Error that occurs when the client configuration is invalid.
    #[strum(to_string = "Invalid client configuration: {0}")]
    InvalidConfig(String),
    /// Error that occurs when TLS or signing credentials can't be loaded.
    #[strum(to_string = "Invalid credentials: {0}")]
    Credentials(String),
    /// Error that occurs when the signing certificate is unusable.
    #[strum(to_string = "Signing certificate error")]
    Certificate,
    /// Error that occurs when the request signature can't be produced.
    #[strum(to_string = "Request signing failed")]
    Signing,
    /// Error that occurs when the endpoint at the given URL can't be reached.
    #[strum(to_string = "Transport error while calling {0}")]
    Transport(String),
    /// Error that occurs when the token endpoint rejects the request or
    /// answers without an access token.
    ///
    /// Carries the HTTP status code and the response body.
    #[strum(to_string = "Token acquisition failed with status {0}: {1}")]
    TokenAcquisition(u16, String),
    /// Error that occurs when the account identifier is empty or not a
    /// single path segment of unreserved characters.
    #[strum(to_string = "Invalid account identifier: {0}")]
    InvalidAccountId(String),
    /// Error that occurs when a resource endpoint responds with a body that
    /// isn't JSON.
    #[strum(to_string = "Malformed upstream response: {0}")]
    MalformedResponse(String),
}

impl bherror::BhError for Error {}
