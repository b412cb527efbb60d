//! Core application primitives: pipeline, scheduler, transport and bootstrap

pub mod http;
pub mod pipeline;
pub mod runtime;
pub mod scheduler;

pub use http::{create_router, AppState};
pub use pipeline::{SignalPipeline, TupleOutcome};
pub use scheduler::{Scheduler, TickReport};
