//! Domain models for blogeval.
//!
//! - `score`: content and agent score records, axis outcomes, grade mapping
//! - `run_metrics`: telemetry snapshot consumed by the agent evaluator
//! - `error`: error taxonomy for configuration and persistence

pub mod error;
pub mod run_metrics;
pub mod score;

pub use error::{EvalError, Result};
pub use run_metrics::{AgentMetrics, TaskMetrics, TaskStatus, TelemetrySnapshot};
pub use score::{AgentPerformanceScore, AxisOutcome, ContentQualityScore, Grade};
