//! Client for the remote CRM endpoint.
//!
//! The pipeline only depends on [`RemoteEndpoint`]; [`HttpEndpoint`] is the
//! production implementation and every call goes through a shared
//! [`RateLimiter`].

pub mod client;
pub mod config;
pub mod endpoint;
pub mod health;
pub mod models;
pub mod rate_limit;

pub use client::*;
pub use config::*;
pub use endpoint::*;
pub use rate_limit::{RateLimitConfig, RateLimiter, SharedRateLimiter};
