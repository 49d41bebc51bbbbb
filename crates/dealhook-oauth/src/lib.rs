//! OAuth 2.0 PKCE client for the price tracker.
//!
//! - [`oauth`]: verifier/challenge/state generation, authorization URL, code exchange

pub mod error;
pub mod oauth;

pub use error::{OAuthError, Result};
pub use oauth::{
    OAuthClient, OAuthConfig, PkceChallenge, TokenResponse, build_authorization_url,
    generate_state,
};
