//! HTTP API module for the freight tariff engine.
//!
//! A thin boundary adapter: collaborators post routes, tariff histories and
//! client formulas, and get back calculation results or overlap verdicts.
//! Nothing is persisted.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{CalculateRequest, OverlapValidationRequest};
pub use response::{ApiError, ApiErrorResponse, ValidationResponse};
pub use state::AppState;
