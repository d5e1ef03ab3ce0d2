//! # Plan Engine
//!
//! Execution engine for declarative analysis plans.
//!
//! A plan lists charts, each made of metrics, an optional filter tree and
//! grouping dimensions. The engine turns every chart into a bounded set of
//! concurrent queries against a metrics backend and assembles the answers into
//! labeled chart structures.
//!
//! ## Architecture
//!
//! - [`models`]: plan domain types and validation
//! - [`graphql`]: backend wire contract, query builder and client
//! - [`metadata`]: metric catalog and display-name lookups
//! - [`services`]: filter translation, dimensions, concurrent execution,
//!   response assembly and the plan executor
//! - [`charts`]: output DTOs
//! - [`http`]: Axum-based HTTP server (feature `http-server`)
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use plan_engine::api::{AnalysisPlan, ChartSpec, MetricSpec, MetricsClient, PlanExecutor};
//! use plan_engine::metadata::NoMetadata;
//!
//! # async fn run(client: Arc<dyn MetricsClient>) -> plan_engine::api::EngineResult<()> {
//! let plan = AnalysisPlan::new(vec![ChartSpec::new("BAR", vec![MetricSpec::new("DTN")])]);
//! let engine = PlanExecutor::new(client, Arc::new(NoMetadata));
//! let response = engine.execute(&plan, "session-token", 4, None).await?;
//! assert_eq!(response.charts.len(), 1);
//! # Ok(())
//! # }
//! ```

#![allow(clippy::result_large_err)]

pub mod api;
pub mod charts;
pub mod config;
pub mod error;
pub mod graphql;
pub mod metadata;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
