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

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use bh_psd2_client::{
    AccountsClient, ClientConfig, ReqwestHttpClient, SigningCredentials, TlsIdentity, TokenClient,
    DEFAULT_BASE_URL,
};
use bherror::{
    traits::{ErrorContext as _, PropagateError as _},
    Result,
};
use clap::Parser;

use crate::ServerError;

/// Settings of the proxy, read from the command line or the environment.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(author, version, about)]
pub struct ProxyArgs {
    /// Base URL of the bank API.
    #[arg(long, env = "PSD2_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
    /// OAuth2 client identifier of the TPP.
    #[arg(long, env = "PSD2_CLIENT_ID")]
    pub client_id: String,
    /// PEM certificate presented for mutual TLS.
    #[arg(long, env = "PSD2_TLS_CERTIFICATE")]
    pub tls_certificate: PathBuf,
    /// PEM private key of the mutual TLS certificate.
    #[arg(long, env = "PSD2_TLS_KEY")]
    pub tls_key: PathBuf,
    /// PEM certificate attesting the request signatures.
    #[arg(long, env = "PSD2_SIGNING_CERTIFICATE")]
    pub signing_certificate: PathBuf,
    /// PEM RSA private key of the signing certificate.
    #[arg(long, env = "PSD2_SIGNING_KEY")]
    pub signing_key: PathBuf,
    /// Timeout of every request to the bank, in seconds.
    #[arg(long, env = "PSD2_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
    /// Address to listen on.
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,
}

impl ProxyArgs {
    /// The socket address to listen on.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// The client configuration.
    pub fn client_config(&self) -> Result<ClientConfig, ServerError> {
        ClientConfig::new(self.client_id.as_str())
            .and_then(|config| config.with_base_url(&self.base_url))
            .and_then(|config| config.with_timeout(Duration::from_secs(self.timeout_secs)))
            .with_err(|| ServerError::Config)
    }

    /// Load the credentials and build the accounts client.
    pub fn accounts_client(&self) -> Result<AccountsClient<ReqwestHttpClient>, ServerError> {
        let config = self.client_config()?;

        let tls_identity = TlsIdentity::from_files(&self.tls_certificate, &self.tls_key)
            .with_err(|| ServerError::Config)
            .ctx(|| "loading the TLS identity")?;
        let credentials =
            SigningCredentials::from_files(&self.signing_certificate, &self.signing_key)
                .with_err(|| ServerError::Config)
                .ctx(|| "loading the signing credentials")?;
        let http_client = ReqwestHttpClient::with_identity(&tls_identity, config.timeout())
            .with_err(|| ServerError::Config)?;

        Ok(AccountsClient::new(TokenClient::new(
            config,
            credentials,
            http_client,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 11] = [
        "bh-psd2-proxy",
        "--client-id",
        "example_client_id",
        "--tls-certificate",
        "tls.crt",
        "--tls-key",
        "tls.key",
        "--signing-certificate",
        "signing.crt",
        "--signing-key",
        "signing.key",
    ];

    #[test]
    fn defaults_are_applied() {
        let args = ProxyArgs::try_parse_from(REQUIRED).unwrap();

        assert_eq!("example_client_id", args.client_id);
        assert_eq!(PathBuf::from("tls.key"), args.tls_key);
        assert_eq!("0.0.0.0:5000".parse::<SocketAddr>().unwrap(), args.listen_addr());

        let config = args.client_config().unwrap();
        assert_eq!("https://api.sandbox.ing.com/", config.base_url().as_str());
        assert_eq!(Duration::from_secs(30), config.timeout());
    }

    #[test]
    fn settings_are_overridden() {
        let args = ProxyArgs::try_parse_from(REQUIRED.into_iter().chain([
            "--base-url",
            "https://bank.example.com",
            "--timeout-secs",
            "5",
            "--host",
            "127.0.0.1",
            "--port",
            "8080",
        ]))
        .unwrap();

        assert_eq!("127.0.0.1:8080".parse::<SocketAddr>().unwrap(), args.listen_addr());

        let config = args.client_config().unwrap();
        assert_eq!("https://bank.example.com/", config.base_url().as_str());
        assert_eq!(Duration::from_secs(5), config.timeout());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let args =
            ProxyArgs::try_parse_from(REQUIRED.into_iter().chain(["--timeout-secs", "0"])).unwrap();

        assert_eq!(ServerError::Config, args.client_config().unwrap_err().error);
    }

    #[test]
    fn missing_credential_files_are_rejected() {
        let args = ProxyArgs::try_parse_from(REQUIRED).unwrap();

        let Err(error) = args.accounts_client() else {
            unreachable!("the credential files don't exist")
        };
        assert_eq!(ServerError::Config, error.error);
    }
}
