//! Local page API
//!
//! Exposes the page services over HTTP for the UI shell:
//! - Stock page (`/api/stocks/search`, `/api/stock`)
//! - Strategy page (`/api/strategy`, `/api/strategy/backtest`, `/api/strategy/indicators`)
//! - Optimization page (`/api/optimize`, `/api/optimize/run`, `/api/optimize/apply`)
//! - Result page (`/api/result`)
//! - Session state (`/api/state`)
//!
//! Errors come back in the same envelope with `status: "error"`; failed
//! page preconditions answer 412 with the page to redirect to.

pub mod handlers;
mod server;
mod types;

pub use server::{router, ApiServer};
pub use types::{ApiResponse, ApplyParamsRequest, Empty, SearchQuery, SessionState};
