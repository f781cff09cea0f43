//! Client facade.
//!
//! [`Client`] owns the HTTP client, the request queue, and the credentials,
//! and exposes `get`/`post`/`put`/`patch`/`delete` plus grouped endpoint
//! accessors ([`Client::catalog`], [`Client::user`], [`Client::private`],
//! [`Client::stats`]). Every request goes through the queue, so concurrency
//! caps and rate-limit deferral apply uniformly.

mod catalog;
mod private;
mod stats;
mod user;

pub use catalog::{CatalogEndpoints, ItemSearchOptions};
pub use private::{DownloadLinkOptions, PrivateEndpoints};
pub use stats::StatsEndpoints;
pub use user::UserEndpoints;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use reqwest::Method;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use url::Url;

use crate::error::{Error, HttpError};
use crate::http::{self, FetchOptions, DEFAULT_USER_AGENT};
use crate::oauth::{OAuth, RefreshedToken};
use crate::queue::{Attempt, QueueEvent, RequestQueue, DEFAULT_CONCURRENCY};
use crate::types::Identity;

const BASE_URL: &str = "https://api.envato.com/";

/// An URL-encoded form body: name/value pairs in submission order.
pub type Form = Vec<(String, String)>;

/// Configuration for a [`Client`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The access token: either a personal token or an OAuth access token.
    pub token: String,

    /// The OAuth refresh token, if this is an OAuth session. Used together
    /// with `oauth` and `expiration` to renew access tokens automatically.
    pub refresh_token: Option<String>,

    /// When the current token expires. Requests made after this instant
    /// renew the token first (when `oauth` and `refresh_token` are set).
    pub expiration: Option<DateTime<Utc>>,

    /// The OAuth application credentials behind this session, if any.
    pub oauth: Option<OAuth>,

    /// Overrides the default user agent.
    pub user_agent: Option<String>,

    /// Overrides the API base URL. Intended for tests.
    pub base_url: Option<String>,

    /// Maximum number of concurrent requests. `0` means unlimited. Can be
    /// changed later with [`Client::set_concurrency`].
    pub concurrency: usize,

    /// Whether 429 responses are absorbed by deferring and retrying
    /// (default) instead of surfacing as
    /// [`HttpError::TooManyRequests`](crate::HttpError::TooManyRequests).
    pub handle_rate_limits: bool,

    /// Request timeout applied to every HTTP call. `None` disables the
    /// client-side timeout.
    pub timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            token: String::new(),
            refresh_token: None,
            expiration: None,
            oauth: None,
            user_agent: None,
            base_url: None,
            concurrency: DEFAULT_CONCURRENCY,
            handle_rate_limits: true,
            timeout: None,
        }
    }
}

/// A notification emitted by the client.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// The queue began deferring requests for the given duration.
    RateLimited(Duration),
    /// The deferral window elapsed and requests are flowing again.
    Resumed,
    /// The OAuth access token was renewed automatically.
    TokenRenewed(RefreshedToken),
}

/// Mutable credential state, shared across clones of the client.
struct AuthState {
    token: String,
    refresh_token: Option<String>,
    expiration: Option<DateTime<Utc>>,
}

struct ClientInner {
    http: reqwest::Client,
    queue: RequestQueue,
    concurrency: Arc<AtomicUsize>,
    auth: RwLock<AuthState>,
    oauth: Option<OAuth>,
    user_agent: String,
    base_url: Url,
    handle_rate_limits: bool,
    events: broadcast::Sender<ClientEvent>,
}

/// An Envato Market API client.
///
/// Cheap to clone; clones share the same queue, credentials, and HTTP
/// connection pool. Must be created inside a Tokio runtime.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Creates a client from the given options.
    pub fn new(options: ClientOptions) -> Result<Client, Error> {
        let concurrency = Arc::new(AtomicUsize::new(options.concurrency));
        let queue = RequestQueue::with_shared_limit(Arc::clone(&concurrency));
        let http = http::build_client(options.timeout)?;

        let base_url = match &options.base_url {
            Some(base) => {
                // Joining relies on the base ending with a slash.
                let mut base = base.clone();
                if !base.ends_with('/') {
                    base.push('/');
                }
                Url::parse(&base)?
            }
            None => Url::parse(BASE_URL)?,
        };

        let (events, _) = broadcast::channel(16);

        // Forward queue notifications onto the client's channel so callers
        // only need one subscription.
        let mut queue_events = queue.subscribe();
        let forwarded = events.clone();
        tokio::spawn(async move {
            loop {
                match queue_events.recv().await {
                    Ok(QueueEvent::RateLimited(duration)) => {
                        let _ = forwarded.send(ClientEvent::RateLimited(duration));
                    }
                    Ok(QueueEvent::Resumed) => {
                        let _ = forwarded.send(ClientEvent::Resumed);
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(Client {
            inner: Arc::new(ClientInner {
                http,
                queue,
                concurrency,
                auth: RwLock::new(AuthState {
                    token: options.token,
                    refresh_token: options.refresh_token,
                    expiration: options.expiration,
                }),
                oauth: options.oauth,
                user_agent: options
                    .user_agent
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
                base_url,
                handle_rate_limits: options.handle_rate_limits,
                events,
            }),
        })
    }

    /// Creates a client from a personal token with default options.
    pub fn with_token(token: &str) -> Result<Client, Error> {
        Client::new(ClientOptions {
            token: token.to_string(),
            ..ClientOptions::default()
        })
    }

    /// Subscribes to [`ClientEvent`] notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.events.subscribe()
    }

    /// The current access token.
    pub fn token(&self) -> String {
        self.auth_read().token.clone()
    }

    /// Replaces the access token.
    pub fn set_token(&self, token: &str) {
        self.auth_write().token = token.to_string();
    }

    /// The refresh token, if this is an OAuth session.
    pub fn refresh_token(&self) -> Option<String> {
        self.auth_read().refresh_token.clone()
    }

    /// Replaces the refresh token.
    pub fn set_refresh_token(&self, refresh_token: Option<String>) {
        self.auth_write().refresh_token = refresh_token;
    }

    /// When the current token expires, if known.
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.auth_read().expiration
    }

    /// Replaces the token expiration time.
    pub fn set_expiration(&self, expiration: Option<DateTime<Utc>>) {
        self.auth_write().expiration = expiration;
    }

    /// Whether the current token has expired. Always `false` when no
    /// expiration time is known.
    pub fn is_expired(&self) -> bool {
        self.auth_read()
            .expiration
            .is_some_and(|expiration| expiration < Utc::now())
    }

    /// Time remaining until the token expires. Negative once expired,
    /// `None` when no expiration time is known.
    pub fn ttl(&self) -> Option<chrono::Duration> {
        self.auth_read()
            .expiration
            .map(|expiration| expiration - Utc::now())
    }

    /// The current concurrency limit (0 = unlimited).
    pub fn concurrency(&self) -> usize {
        self.inner.concurrency.load(Ordering::Relaxed)
    }

    /// Changes the concurrency limit. Takes effect for the next admission
    /// decision; requests already in flight are unaffected.
    pub fn set_concurrency(&self, limit: usize) {
        self.inner.concurrency.store(limit, Ordering::Relaxed);
    }

    /// The number of outstanding requests, queued or in flight.
    pub fn queue_len(&self) -> usize {
        self.inner.queue.len()
    }

    /// The request queue behind this client.
    pub fn queue(&self) -> &RequestQueue {
        &self.inner.queue
    }

    /// Catalog endpoints: public details about items and marketplaces.
    pub fn catalog(&self) -> CatalogEndpoints<'_> {
        CatalogEndpoints::new(self)
    }

    /// User endpoints: public details about accounts.
    pub fn user(&self) -> UserEndpoints<'_> {
        UserEndpoints::new(self)
    }

    /// Private endpoints: details about the current user and their sales.
    pub fn private(&self) -> PrivateEndpoints<'_> {
        PrivateEndpoints::new(self)
    }

    /// Statistics endpoints: marketplace-wide totals.
    pub fn stats(&self) -> StatsEndpoints<'_> {
        StatsEndpoints::new(self)
    }

    /// Returns the identity of the current token: account id, granted
    /// permissions, and seconds until expiry.
    pub async fn identity(&self) -> Result<Identity, Error> {
        self.get("/whoami").await
    }

    /// Sends a `GET` request to the given path and decodes the response.
    pub async fn get<T>(&self, path: &str) -> Result<T, Error>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.fetch(Method::GET, path, None).await
    }

    /// Sends a `POST` request with an optional form body.
    pub async fn post<T>(&self, path: &str, form: Option<Form>) -> Result<T, Error>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.fetch(Method::POST, path, form).await
    }

    /// Sends a `PUT` request with an optional form body.
    pub async fn put<T>(&self, path: &str, form: Option<Form>) -> Result<T, Error>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.fetch(Method::PUT, path, form).await
    }

    /// Sends a `PATCH` request with an optional form body.
    pub async fn patch<T>(&self, path: &str, form: Option<Form>) -> Result<T, Error>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.fetch(Method::PATCH, path, form).await
    }

    /// Sends a `DELETE` request with an optional form body.
    pub async fn delete<T>(&self, path: &str, form: Option<Form>) -> Result<T, Error>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.fetch(Method::DELETE, path, form).await
    }

    /// Submits one API call to the queue and awaits its settled outcome.
    async fn fetch<T>(&self, method: Method, path: &str, form: Option<Form>) -> Result<T, Error>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let client = self.clone();
        let path = path.to_string();

        self.inner
            .queue
            .push(move || {
                let client = client.clone();
                let method = method.clone();
                let path = path.clone();
                let form = form.clone();
                async move { client.attempt(method, &path, form).await }
            })
            .await
    }

    /// One admission attempt: renew the token if needed, perform the HTTP
    /// call, and translate the response into an [`Attempt`].
    async fn attempt<T>(&self, method: Method, path: &str, form: Option<Form>) -> Attempt<T>
    where
        T: DeserializeOwned,
    {
        if self.is_expired() {
            if let Err(error) = self.renew_token().await {
                return Attempt::Reject(error);
            }
        }

        let url = match self.inner.base_url.join(path.trim_start_matches('/')) {
            Ok(url) => url.to_string(),
            Err(error) => return Attempt::Reject(error.into()),
        };

        let response = match http::fetch(
            &self.inner.http,
            FetchOptions {
                method,
                url,
                token: self.token(),
                user_agent: self.inner.user_agent.clone(),
                form,
            },
        )
        .await
        {
            Ok(response) => response,
            Err(error) => return Attempt::Reject(error),
        };

        if response.status.as_u16() == 429 && self.inner.handle_rate_limits {
            return Attempt::Retry(response.retry_after_seconds());
        }

        if let Some(error) = http::status_error(response.status, &response.body) {
            return Attempt::Reject(error.into());
        }

        match serde_json::from_str(&response.body) {
            Ok(value) => Attempt::Resolve(value),
            Err(error) => Attempt::Reject(error.into()),
        }
    }

    /// Renews the access token through the configured OAuth credentials.
    /// A no-op error-free path only exists for OAuth sessions; an expired
    /// token without OAuth credentials proceeds unrenewed (the API will
    /// reject it with a 401).
    async fn renew_token(&self) -> Result<(), Error> {
        let (oauth, refresh_token) = {
            let auth = self.auth_read();
            match (&self.inner.oauth, &auth.refresh_token) {
                (Some(oauth), Some(refresh_token)) => (oauth.clone(), refresh_token.clone()),
                _ => return Ok(()),
            }
        };

        let renewed = oauth.renew(&self.inner.http, &refresh_token).await?;
        debug!("access token renewed; expires {}", renewed.expiration);

        {
            let mut auth = self.auth_write();
            auth.token = renewed.access_token.clone();
            auth.expiration = Some(renewed.expiration);
        }

        let _ = self.inner.events.send(ClientEvent::TokenRenewed(renewed));
        Ok(())
    }

    fn auth_read(&self) -> std::sync::RwLockReadGuard<'_, AuthState> {
        self.inner.auth.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn auth_write(&self) -> std::sync::RwLockWriteGuard<'_, AuthState> {
        self.inner.auth.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Maps a 404 rejection to `Ok(None)` for endpoints that treat "not found"
/// as an ordinary answer.
pub(crate) fn optional<T>(result: Result<T, Error>) -> Result<Option<T>, Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Error::Http(HttpError::NotFound(_))) => Ok(None),
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_defaults() {
        let client = Client::with_token("abc").unwrap();
        assert_eq!(client.token(), "abc");
        assert_eq!(client.concurrency(), DEFAULT_CONCURRENCY);
        assert!(!client.is_expired());
        assert!(client.ttl().is_none());
        assert_eq!(client.queue_len(), 0);
    }

    #[tokio::test]
    async fn test_expiration_tracking() {
        let client = Client::with_token("abc").unwrap();

        client.set_expiration(Some(Utc::now() + chrono::Duration::hours(1)));
        assert!(!client.is_expired());
        assert!(client.ttl().unwrap() > chrono::Duration::minutes(59));

        client.set_expiration(Some(Utc::now() - chrono::Duration::seconds(5)));
        assert!(client.is_expired());
        assert!(client.ttl().unwrap() < chrono::Duration::zero());
    }

    #[tokio::test]
    async fn test_concurrency_is_mutable() {
        let client = Client::with_token("abc").unwrap();
        client.set_concurrency(10);
        assert_eq!(client.concurrency(), 10);
        client.set_concurrency(0);
        assert_eq!(client.concurrency(), 0);
    }

    #[test]
    fn test_optional_maps_not_found() {
        use crate::error::ErrorResponse;

        let found: Result<u32, Error> = Ok(5);
        assert_eq!(optional(found).unwrap(), Some(5));

        let missing: Result<u32, Error> =
            Err(Error::Http(HttpError::NotFound(ErrorResponse::default())));
        assert_eq!(optional(missing).unwrap(), None);

        let denied: Result<u32, Error> =
            Err(Error::Http(HttpError::AccessDenied(ErrorResponse::default())));
        assert!(optional(denied).is_err());
    }
}
