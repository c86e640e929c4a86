//! blogeval core library
//!
//! Rule-based scoring of generated blog content and of the agent runs that
//! produce it, plus rendering and persistence of the results.

pub mod agent;
pub mod config;
pub mod content;
pub mod domain;
pub mod metrics;
pub mod obs;
pub mod observer;
pub mod quality_gate;
pub mod reporter;
pub mod telemetry;

pub use domain::{
    AgentMetrics, AgentPerformanceScore, AxisOutcome, ContentQualityScore, EvalError, Grade,
    Result, TaskMetrics, TaskStatus, TelemetrySnapshot,
};

pub use content::{AxisReport, ContentAxes, ContentAxis, ContentEvaluator, HtmlDocument};

pub use agent::AgentEvaluator;

pub use reporter::{read_evaluation_record, EvaluationRecord, EvaluationReporter};

pub use observer::{Clock, CostEstimate, ObservedEvent, RunObserver, SystemClock};

pub use quality_gate::{GateVerdict, QualityGate};

pub use config::EvaluationConfig;

pub use metrics::METRICS;

/// blogeval version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
