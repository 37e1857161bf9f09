//! Default limits for the fetch pipeline.
//!
//! The CRM endpoint allows 5 requests per second per account. Everything
//! else here is sized so that a full refresh stays within a few minutes at
//! that ceiling.
//!
//! These are defaults only; `FetchConfig` exposes each one.

// === Request Limits ===

/// Requests per second admitted by the rate limiter.
pub const DEFAULT_RATE_LIMIT: u32 = 5;

/// Attribute workers, and the in-flight ceiling of the rate limiter.
pub const DEFAULT_WORKER_COUNT: usize = 20;

// === Pagination Limits ===

/// Rows requested per page for both paginated listings.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Hard cap on primary records retrieved per refresh.
pub const DEFAULT_RECORD_CAP: usize = 1000;

/// Trailing window, in days, for the creation-time filter and the week view.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

// === Progress ===

/// The primary listing is only part of a refresh, so its running
/// percentage never exceeds this value.
pub const PRIMARY_PHASE_PERCENT_CAP: f64 = 50.0;
