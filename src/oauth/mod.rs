//! OAuth authorization-code and refresh-token flows.
//!
//! Applications that act on behalf of other users authenticate with OAuth:
//! the user approves the app on the authorization screen, the app exchanges
//! the single-use code for an access token + refresh token pair, and the
//! client renews the access token with the refresh token shortly before it
//! expires. Personal-token clients never touch this module.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::debug;
use serde::Deserialize;

use crate::client::{Client, ClientOptions};
use crate::error::Error;
use crate::http::DEFAULT_USER_AGENT;
use crate::util::url;

const AUTHORIZATION_URL: &str = "https://api.envato.com/authorization";
const TOKEN_URL: &str = "https://api.envato.com/token";

/// Safety margin subtracted from `expires_in` so the client renews slightly
/// before the server-side expiry.
const EXPIRATION_MARGIN_SECS: i64 = 1;

/// OAuth application credentials and helpers for the token flows.
#[derive(Debug, Clone)]
pub struct OAuth {
    /// The application's client id.
    pub client_id: String,
    /// The application's client secret.
    pub client_secret: String,
    /// The redirect URI registered with the application.
    pub redirect_uri: String,
    /// Optional user agent for token requests.
    pub user_agent: Option<String>,
    /// Override for the token endpoint. Intended for tests; leave `None`
    /// to use the production endpoint.
    pub token_url: Option<String>,
}

/// A renewed access token and its computed expiration time.
#[derive(Debug, Clone)]
pub struct RefreshedToken {
    /// The new access token.
    pub access_token: String,
    /// When the new token expires.
    pub expiration: DateTime<Utc>,
}

/// The token endpoint's response body for both grant types.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token_type: Option<String>,
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

#[derive(Debug, Deserialize, Default)]
struct TokenErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl OAuth {
    /// Creates an OAuth helper for the given application credentials.
    pub fn new(client_id: &str, client_secret: &str, redirect_uri: &str) -> Self {
        OAuth {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            user_agent: None,
            token_url: None,
        }
    }

    /// The URL to send users to for app approval.
    pub fn redirect_url(&self) -> String {
        url::build(
            AUTHORIZATION_URL,
            &[
                ("response_type", Some("code".to_string())),
                ("client_id", Some(self.client_id.clone())),
                ("redirect_uri", Some(self.redirect_uri.clone())),
            ],
        )
    }

    /// Exchanges a single-use authorization code for a ready-to-use
    /// [`Client`] with the access token, refresh token, and expiration
    /// configured.
    pub async fn exchange_code(&self, code: &str) -> Result<Client, Error> {
        let http = crate::http::build_client(None)?;
        let response = self
            .token_request(
                &http,
                &[
                    ("grant_type", "authorization_code"),
                    ("client_id", &self.client_id),
                    ("client_secret", &self.client_secret),
                    ("code", code),
                ],
            )
            .await?;

        Client::new(ClientOptions {
            token: response.access_token,
            refresh_token: response.refresh_token,
            expiration: Some(expiration_from(response.expires_in)),
            oauth: Some(self.clone()),
            user_agent: self.user_agent.clone(),
            ..ClientOptions::default()
        })
    }

    /// Obtains a fresh access token using the given refresh token.
    pub async fn renew(
        &self,
        http: &reqwest::Client,
        refresh_token: &str,
    ) -> Result<RefreshedToken, Error> {
        debug!("renewing access token");

        let response = self
            .token_request(
                http,
                &[
                    ("grant_type", "refresh_token"),
                    ("client_id", &self.client_id),
                    ("client_secret", &self.client_secret),
                    ("refresh_token", refresh_token),
                ],
            )
            .await?;

        Ok(RefreshedToken {
            access_token: response.access_token,
            expiration: expiration_from(response.expires_in),
        })
    }

    async fn token_request(
        &self,
        http: &reqwest::Client,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, Error> {
        let token_url = self.token_url.as_deref().unwrap_or(TOKEN_URL);
        let user_agent = self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);

        let response = http
            .post(token_url)
            .header(reqwest::header::USER_AGENT, user_agent)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let error: TokenErrorBody = serde_json::from_str(&body).unwrap_or_default();
            if error.error.as_deref() == Some("invalid_grant") {
                return Err(Error::OAuth(
                    "the given code was invalid or expired".to_string(),
                ));
            }
            if let Some(description) = error.error_description {
                return Err(Error::OAuth(description));
            }
            return Err(Error::OAuth(format!(
                "got unexpected status code ({status}) from the token endpoint"
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|_| Error::UnexpectedResponse(body.clone()))?;
        if token.token_type.is_none() {
            return Err(Error::UnexpectedResponse(body));
        }

        Ok(token)
    }
}

fn expiration_from(expires_in: i64) -> DateTime<Utc> {
    Utc::now() + ChronoDuration::seconds(expires_in - EXPIRATION_MARGIN_SECS)
}
