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

use bh_psd2_proxy::{init_tracing, router, serve, ProxyArgs, ServerError};
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> bherror::Result<(), ServerError> {
    let args = ProxyArgs::parse();
    init_tracing();

    let client = args.accounts_client()?;
    info!(
        base_url = %client.token_client().config().base_url(),
        client_id = client.token_client().config().client_id(),
        "credentials loaded"
    );

    serve(args.listen_addr(), router(client)).await
}
