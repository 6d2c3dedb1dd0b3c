//! HTTP API

mod context;
mod dto;
mod filter;
mod handlers;
mod routes;

pub use context::{AuthenticatedIdentity, CurrentIdentity};
pub use dto::*;
pub use filter::{FilterState, authenticate, bearer_token, is_public_route};
pub use routes::{AppState, router};
