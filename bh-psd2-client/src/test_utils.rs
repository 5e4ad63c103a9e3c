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

//! Utilities for testing code built on top of this crate.
//!
//! Do NOT use these for production code, but only tests.

use std::{collections::VecDeque, future::Future, sync::Mutex};

use crate::HttpClient;

/// PEM certificate of [`TlsIdentity::dummy`](crate::TlsIdentity::dummy).
pub const DUMMY_TLS_CERTIFICATE_PEM: &[u8] = include_bytes!("../testdata/tls.crt");

/// PKCS#1 PEM private key of [`TlsIdentity::dummy`](crate::TlsIdentity::dummy).
pub const DUMMY_TLS_KEY_PEM: &[u8] = include_bytes!("../testdata/tls.key");

/// Transport failure returned by [`StubHttpClient`].
#[derive(Debug)]
pub struct StubTransportError(&'static str);

impl std::fmt::Display for StubTransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for StubTransportError {}

type StubResponse = Result<http::Response<Vec<u8>>, StubTransportError>;

/// [`HttpClient`] answering with queued responses, in order, and recording
/// every request it receives.
///
/// An empty queue answers with a [`StubTransportError`].
#[derive(Debug, Default)]
pub struct StubHttpClient {
    responses: Mutex<VecDeque<StubResponse>>,
    requests: Mutex<Vec<http::Request<Vec<u8>>>>,
}

impl StubHttpClient {
    /// Create a stub without any queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and raw body.
    pub fn push_response(&self, status: u16, body: impl Into<Vec<u8>>) {
        let mut response = http::Response::new(body.into());
        *response.status_mut() = http::StatusCode::from_u16(status).unwrap();

        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue a response with the given status and JSON body.
    pub fn push_json(&self, status: u16, body: &serde_json::Value) {
        self.push_response(status, serde_json::to_vec(body).unwrap());
    }

    /// Queue a transport failure.
    pub fn push_transport_error(&self) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(StubTransportError("connection reset")));
    }

    /// Take all the requests received so far.
    pub fn take_requests(&self) -> Vec<http::Request<Vec<u8>>> {
        std::mem::take(&mut *self.requests.lock().unwrap())
    }
}

impl HttpClient for StubHttpClient {
    type Err = StubTransportError;

    fn send(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> impl Future<Output = StubResponse> + Send {
        self.requests.lock().unwrap().push(request);

        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(StubTransportError("no response queued")));

        std::future::ready(response)
    }
}
