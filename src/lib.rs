//! envato: an async Rust client for the Envato Market API.
//!
//! Authentication is bearer-token based: either a personal token or an
//! OAuth session (with automatic access-token renewal). Every request is
//! scheduled through a per-client [`RequestQueue`] that caps concurrency
//! and transparently absorbs rate limiting: a 429 pauses all requests for
//! the server-specified `Retry-After` window, then re-runs the throttled
//! request without the caller ever seeing an error.
//!
//! # Example
//!
//! ```no_run
//! use envato::{Client, MarketName};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), envato::Error> {
//! let client = Client::with_token("personal-token")?;
//!
//! let identity = client.identity().await?;
//! println!("authenticated as account {}", identity.user_id);
//!
//! if let Some(item) = client.catalog().item(123456).await? {
//!     println!("{} has {} sales", item.name, item.number_of_sales);
//! }
//!
//! let categories = client.catalog().categories(MarketName::Themeforest).await?;
//! println!("{} categories", categories.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or ensure you're calling library functions within an async
//! context.

#![warn(missing_docs)]

mod client;
mod error;
mod http;
mod oauth;
mod queue;
pub mod types;
mod util;

pub use client::{
    CatalogEndpoints, Client, ClientEvent, ClientOptions, DownloadLinkOptions, Form,
    ItemSearchOptions, PrivateEndpoints, StatsEndpoints, UserEndpoints,
};
pub use error::{Error, ErrorResponse, HttpError};
pub use http::DEFAULT_USER_AGENT;
pub use oauth::{OAuth, RefreshedToken};
pub use queue::{Attempt, QueueEvent, RequestQueue, DEFAULT_CONCURRENCY};
pub use types::MarketName;
