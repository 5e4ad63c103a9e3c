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

//! The OAuth2 client credentials grant with a signed token request.
//!
//! A token request carries a detached JWS over its `(request-target)`,
//! `Digest` and `Content-Type`, in the `x-jws-signature` header, and the
//! signing certificate in the `TPP-Signature-Certificate` header.

use bh_psd2_jws::{
    digest_header_value, CompactJws, JwsProtectedHeader, SigningString,
    CONTENT_TYPE_FORM_URLENCODED, TOKEN_ENDPOINT_METHOD, TOKEN_ENDPOINT_PATH,
};
use bherror::{
    traits::{ErrorContext as _, ForeignError as _, PropagateError as _},
    Result,
};
use chrono::{DateTime, Utc};
use http::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{ClientConfig, Error, HttpClient, SigningCredentials};

/// The `grant_type` of the token request.
pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";

/// The `scope` of the token request.
pub const SCOPE_AISPIS: &str = "aispis";

/// Name of the header carrying the detached JWS.
pub const JWS_SIGNATURE_HEADER: &str = "x-jws-signature";

/// Name of the header carrying the single-line PEM signing certificate.
pub const SIGNATURE_CERTIFICATE_HEADER: &str = "TPP-Signature-Certificate";

/// Name of the header carrying the body digest.
pub const DIGEST_HEADER: &str = "Digest";

/// Media type of the JSON responses accepted from the bank.
pub const APPLICATION_JSON: &str = "application/json";

/// The OAuth2 client credentials of the TPP.
///
/// Fields serialize in declaration order, which is the order of the form
/// body.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    grant_type: &'static str,
    scope: &'static str,
    client_id: String,
}

impl ClientCredentials {
    /// Credentials of the `client_credentials` grant with the `aispis` scope.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            grant_type: GRANT_TYPE_CLIENT_CREDENTIALS,
            scope: SCOPE_AISPIS,
            client_id: client_id.into(),
        }
    }

    /// The OAuth2 client identifier.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Serialize to the `application/x-www-form-urlencoded` request body.
    pub fn to_form_body(&self) -> Result<String, Error> {
        serde_html_form::to_string(self)
            .foreign_err(|| Error::InvalidConfig("can't encode the token request body".to_owned()))
    }
}

/// A token request with all its signature inputs, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTokenRequest {
    /// The form body; the digest and the signature cover exactly these bytes.
    pub body: String,
    /// The `Digest` header value.
    pub digest: String,
    /// The detached JWS over the signing string.
    pub jws: CompactJws,
    /// The `TPP-Signature-Certificate` header value.
    pub certificate_header: String,
}

impl SignedTokenRequest {
    /// The signing string the [`SignedTokenRequest::jws`] is computed over.
    pub fn signing_string(&self) -> SigningString {
        SigningString::new(
            TOKEN_ENDPOINT_METHOD,
            TOKEN_ENDPOINT_PATH,
            &self.digest,
            CONTENT_TYPE_FORM_URLENCODED,
        )
    }

    /// Build the HTTP request to the token endpoint at `url`.
    pub fn into_http_request(self, url: &Url) -> Result<http::Request<Vec<u8>>, Error> {
        http::Request::builder()
            .method(http::Method::POST)
            .uri(url.as_str())
            .header(CONTENT_TYPE, CONTENT_TYPE_FORM_URLENCODED)
            .header(ACCEPT, APPLICATION_JSON)
            .header(DIGEST_HEADER, self.digest)
            .header(JWS_SIGNATURE_HEADER, self.jws.to_string())
            .header(SIGNATURE_CERTIFICATE_HEADER, self.certificate_header)
            .body(self.body.into_bytes())
            .foreign_err(|| Error::InvalidConfig("can't build the token request".to_owned()))
    }
}

/// Sign the token request of `client_credentials`, claiming `signing_time`
/// as the `sigT`.
pub fn sign_token_request(
    credentials: &SigningCredentials,
    client_credentials: &ClientCredentials,
    signing_time: DateTime<Utc>,
) -> Result<SignedTokenRequest, Error> {
    let body = client_credentials.to_form_body()?;
    let digest = digest_header_value(body.as_bytes());

    let signing_string = SigningString::new(
        TOKEN_ENDPOINT_METHOD,
        TOKEN_ENDPOINT_PATH,
        &digest,
        CONTENT_TYPE_FORM_URLENCODED,
    );
    let header = JwsProtectedHeader::new(credentials.fingerprint().to_owned(), signing_time);

    let jws = CompactJws::sign_detached(&header, &signing_string, credentials.signer())
        .with_err(|| Error::Signing)
        .ctx(|| "signing the token request")?;

    Ok(SignedTokenRequest {
        body,
        digest,
        jws,
        certificate_header: credentials.certificate_header().to_owned(),
    })
}

/// An OAuth2 bearer access token.
///
/// The `Debug` implementation doesn't reveal the token.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// The raw token.
    pub fn secret(&self) -> &str {
        &self.0
    }

    /// The `Authorization` header value, i.e. `Bearer <token>`.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

fn parse_token_response(response: http::Response<Vec<u8>>) -> Result<AccessToken, Error> {
    let status = response.status();
    let body = response.into_body();
    let rejected = || {
        Error::TokenAcquisition(status.as_u16(), String::from_utf8_lossy(&body).into_owned())
    };

    if status != http::StatusCode::OK {
        return Err(bherror::Error::root(rejected()));
    }

    let token_response: TokenResponse = serde_json::from_slice(&body)
        .foreign_err(rejected)
        .ctx(|| "token response isn't JSON")?;

    match token_response.access_token {
        Some(access_token) if !access_token.is_empty() => Ok(AccessToken(access_token)),
        _ => Err(bherror::Error::root(rejected()).ctx("token response has no access_token")),
    }
}

/// Client for acquiring access tokens from the bank token endpoint.
///
/// Every acquisition signs and sends a fresh request; tokens aren't cached.
pub struct TokenClient<C> {
    config: ClientConfig,
    credentials: SigningCredentials,
    http_client: C,
}

impl<C: HttpClient> TokenClient<C> {
    /// Create a new token client.
    ///
    /// The `http_client` must authenticate with the TLS identity, which is
    /// distinct from the signing `credentials`.
    pub fn new(config: ClientConfig, credentials: SigningCredentials, http_client: C) -> Self {
        Self {
            config,
            credentials,
            http_client,
        }
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The underlying HTTP client.
    pub fn http_client(&self) -> &C {
        &self.http_client
    }

    /// Acquire an access token, signing the request at the current time.
    pub async fn acquire_token(&self) -> Result<AccessToken, Error> {
        self.acquire_token_at(Utc::now()).await
    }

    /// Acquire an access token, signing the request at `signing_time`.
    pub async fn acquire_token_at(
        &self,
        signing_time: DateTime<Utc>,
    ) -> Result<AccessToken, Error> {
        let url = self.config.token_endpoint()?;

        let signed = sign_token_request(
            &self.credentials,
            &ClientCredentials::new(self.config.client_id()),
            signing_time,
        )?;
        debug!(
            client_id = self.config.client_id(),
            x5t_s256 = self.credentials.fingerprint(),
            "signed token request"
        );

        let response = self
            .http_client
            .send(signed.into_http_request(&url)?)
            .await
            .foreign_err(|| Error::Transport(url.to_string()))?;

        let token = parse_token_response(response)?;
        info!(client_id = self.config.client_id(), "access token acquired");

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use bh_psd2_jws::{Ps256Verifier, SigningCertificate};
    use chrono::TimeZone as _;
    use serde_json::json;

    use super::*;
    use crate::test_utils::StubHttpClient;

    const GOLDEN_BODY: &str =
        "grant_type=client_credentials&scope=aispis&client_id=example_client_id";

    fn signing_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 9, 30, 0).unwrap() + chrono::Duration::milliseconds(750)
    }

    fn token_client(http_client: StubHttpClient) -> TokenClient<StubHttpClient> {
        TokenClient::new(
            ClientConfig::new("example_client_id").unwrap(),
            SigningCredentials::dummy(),
            http_client,
        )
    }

    #[test]
    fn form_body_has_fixed_field_order() {
        assert_eq!(
            GOLDEN_BODY,
            ClientCredentials::new("example_client_id").to_form_body().unwrap()
        );
        assert_eq!(
            "grant_type=client_credentials&scope=aispis&client_id=a+b%26c%3D",
            ClientCredentials::new("a b&c=").to_form_body().unwrap()
        );
    }

    #[test]
    fn signed_request_matches_golden_values() {
        let client_credentials = ClientCredentials::new("example_client_id");

        let signed =
            sign_token_request(&SigningCredentials::dummy(), &client_credentials, signing_time())
                .unwrap();

        assert_eq!(GOLDEN_BODY, signed.body);
        assert_eq!(
            "SHA-256=rgN8AcG7Qx5nknLS81Qb46FW1Qh3IwgdzSCLiOpfoEE=",
            signed.digest
        );
        assert_eq!(
            "(request-target): post /oauth2/token\n\
             digest: SHA-256=rgN8AcG7Qx5nknLS81Qb46FW1Qh3IwgdzSCLiOpfoEE=\n\
             content-type: application/x-www-form-urlencoded",
            signed.signing_string().as_str()
        );

        let header = signed.jws.header().unwrap();
        assert_eq!("2024-05-15T09:30:00Z", header.sig_t);
        assert_eq!(SigningCredentials::dummy().fingerprint(), header.x5t_s256);

        let public_key = SigningCertificate::dummy().public_key().unwrap();
        assert!(signed
            .jws
            .verify_detached(&signed.signing_string(), &Ps256Verifier, &public_key)
            .unwrap());
    }

    #[tokio::test]
    async fn token_is_acquired_with_signed_request() {
        let http_client = StubHttpClient::new();
        http_client.push_json(200, &json!({ "access_token": "token-123", "expires_in": 900 }));
        let client = token_client(http_client);

        let token = client.acquire_token_at(signing_time()).await.unwrap();

        assert_eq!("token-123", token.secret());
        assert_eq!("Bearer token-123", token.authorization_header());

        let requests = client.http_client().take_requests();
        assert_eq!(1, requests.len());
        let request = &requests[0];

        assert_eq!(http::Method::POST, request.method());
        assert_eq!("https://api.sandbox.ing.com/oauth2/token", request.uri().to_string());
        assert_eq!(GOLDEN_BODY.as_bytes(), request.body().as_slice());

        let headers = request.headers();
        assert_eq!(CONTENT_TYPE_FORM_URLENCODED, headers[CONTENT_TYPE]);
        assert_eq!(APPLICATION_JSON, headers[ACCEPT]);
        assert_eq!(digest_header_value(GOLDEN_BODY.as_bytes()), headers[DIGEST_HEADER]);
        assert_eq!(
            SigningCredentials::dummy().certificate_header(),
            headers[SIGNATURE_CERTIFICATE_HEADER]
        );

        let jws = CompactJws::parse(headers[JWS_SIGNATURE_HEADER].to_str().unwrap()).unwrap();
        assert_eq!("2024-05-15T09:30:00Z", jws.header().unwrap().sig_t);
    }

    #[tokio::test]
    async fn each_acquisition_signs_a_new_request() {
        let http_client = StubHttpClient::new();
        http_client.push_json(200, &json!({ "access_token": "first" }));
        http_client.push_json(200, &json!({ "access_token": "second" }));
        let client = token_client(http_client);

        assert_eq!("first", client.acquire_token().await.unwrap().secret());
        assert_eq!("second", client.acquire_token().await.unwrap().secret());

        let requests = client.http_client().take_requests();
        assert_eq!(2, requests.len());
        assert_ne!(
            requests[0].headers()[JWS_SIGNATURE_HEADER],
            requests[1].headers()[JWS_SIGNATURE_HEADER]
        );
    }

    #[tokio::test]
    async fn rejected_request_carries_status_and_body() {
        let http_client = StubHttpClient::new();
        http_client.push_response(401, r#"{"message":"Signature could not be verified"}"#);

        let error = token_client(http_client).acquire_token().await.unwrap_err();

        assert_eq!(
            Error::TokenAcquisition(
                401,
                r#"{"message":"Signature could not be verified"}"#.to_owned()
            ),
            error.error
        );
    }

    #[tokio::test]
    async fn missing_access_token_is_an_error() {
        for body in [
            json!({ "token_type": "Bearer" }),
            json!({ "access_token": "" }),
            json!({ "access_token": null }),
        ] {
            let http_client = StubHttpClient::new();
            http_client.push_json(200, &body);

            let error = token_client(http_client).acquire_token().await.unwrap_err();

            assert_matches!(error.error, Error::TokenAcquisition(200, _));
        }
    }

    #[tokio::test]
    async fn non_json_token_response_is_an_error() {
        let http_client = StubHttpClient::new();
        http_client.push_response(200, "<html>maintenance</html>");

        let error = token_client(http_client).acquire_token().await.unwrap_err();

        assert_eq!(
            Error::TokenAcquisition(200, "<html>maintenance</html>".to_owned()),
            error.error
        );
    }

    #[tokio::test]
    async fn transport_failure_names_the_endpoint() {
        let http_client = StubHttpClient::new();
        http_client.push_transport_error();

        let error = token_client(http_client).acquire_token().await.unwrap_err();

        assert_eq!(
            Error::Transport("https://api.sandbox.ing.com/oauth2/token".to_owned()),
            error.error
        );
    }

    #[test]
    fn access_token_debug_is_redacted() {
        let token = AccessToken("super-secret".to_owned());

        assert_eq!("AccessToken(<redacted>)", format!("{token:?}"));
    }
}
