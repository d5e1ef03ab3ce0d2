//! Plan execution services.
//!
//! ```text
//! AnalysisPlan ─► plan_executor ─► dimension + filter_translator ─► executor ─► assembler
//! ```

pub mod assembler;
pub mod dimension;
pub mod executor;
pub mod filter_translator;
pub mod job_tracker;
pub mod plan_executor;

pub use dimension::{Category, Dimension};
pub use executor::{ConcurrentExecutor, FaultPolicy, PendingQuery, ProgressFn};
pub use filter_translator::{collect_date_bounds, translate, translate_opt};
pub use job_tracker::{Job, JobProgress, JobStatus, JobTracker, LogEntry, LogLevel};
pub use plan_executor::{ExecutionOptions, PlanExecutor};
