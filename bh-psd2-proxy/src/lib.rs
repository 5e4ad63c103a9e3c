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

//! HTTP proxy exposing the account information of a PSD2 Open Banking TPP.
//!
//! * `GET /accounts` relays the bank accounts endpoint.
//! * `GET /transactions?account_id=<id>` relays the bank transactions
//!   endpoint of the account.
//!
//! Upstream responses are relayed with their status code and JSON body.
//! Failures are answered with `{"error": "<message>"}`, with status `400` for
//! invalid input and `500` otherwise.

use std::net::SocketAddr;

use axum::Router;
use bherror::{traits::ForeignError as _, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

mod config;
mod error;
mod routes;

pub use config::*;
pub use error::*;
pub use routes::*;

/// Install the global `tracing` subscriber, filtered by `RUST_LOG` and
/// defaulting to `info`.
///
/// Records of the `log` facade are forwarded to the subscriber as well.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

/// Serve `router` on `listen_addr` until interrupted.
pub async fn serve(listen_addr: SocketAddr, router: Router) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .foreign_err(|| ServerError::Bind(listen_addr.to_string()))?;
    info!(%listen_addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .foreign_err(|| ServerError::Serve)?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "can't listen for the shutdown signal");
        std::future::pending::<()>().await;
    }
}
