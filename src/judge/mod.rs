//! Judging pipeline
//!
//! Dispatch of PENDING submissions and application of judge results.

pub mod applier;
pub mod consumer;
pub mod dispatcher;
pub mod simulation;
pub mod state_machine;
pub mod timeout;

pub use applier::{ApplyOutcome, ReportedScore, ResultApplier, ScoringPolicy};
pub use consumer::ResultConsumer;
pub use dispatcher::{Dispatcher, FailoverDispatcher, LocalSimulationDispatcher, QueueDispatcher};
pub use simulation::{FixedOutcome, OutcomeStrategy, RandomOutcome};
pub use timeout::TimeoutSweeper;
