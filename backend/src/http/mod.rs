//! HTTP surface for the plan execution engine.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  HTTP layer (axum handlers)                   │
//! │  - plan JSON in, visualization JSON out       │
//! │  - job tracking and SSE log streaming         │
//! └──────────────────────┬───────────────────────┘
//!                        │
//! ┌──────────────────────▼───────────────────────┐
//! │  PlanExecutor (services::plan_executor)       │
//! └──────────────────────┬───────────────────────┘
//!                        │
//! ┌──────────────────────▼───────────────────────┐
//! │  MetricsClient (graphql::client)              │
//! └──────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
