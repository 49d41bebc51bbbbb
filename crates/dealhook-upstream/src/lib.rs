//! HTTP clients for the third-party APIs dealhook talks to.
//!
//! - [`ItadClient`]: waitlist read/write, user info, profile links and Steam app id lookup
//! - [`SteamClient`]: public wishlist and profile visibility
//! - [`DiscordClient`]: webhook delivery
//!
//! All clients share one `reqwest::Client` built by [`UpstreamClients::new`].

mod client;
pub mod discord;
pub mod error;
pub mod itad;
pub mod steam;

pub use client::{UpstreamClients, UpstreamConfig, UpstreamResponse};
pub use discord::DiscordClient;
pub use error::{Result, UpstreamError};
pub use itad::{ItadClient, LookupResult};
pub use steam::SteamClient;
