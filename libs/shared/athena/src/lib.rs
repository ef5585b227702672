//! # Shared Athena Gateway
//!
//! Everything the cells need to talk to the athenahealth practice API:
//!
//! - [`TokenManager`] owns the OAuth2 client-credentials token and makes
//!   sure concurrent callers trigger at most one acquisition at a time.
//! - [`AthenaClient`] sends authenticated requests, re-authenticates once on
//!   a rejected token and maps every failure into [`GatewayError`].

pub mod client;
pub mod error;
pub mod token;

pub use client::{id_field, AthenaClient, Params, RetryPolicy};
pub use error::GatewayError;
pub use token::{AccessToken, TokenManager};
