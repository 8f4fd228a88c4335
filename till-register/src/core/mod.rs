//! Core infrastructure: configuration, task scheduling, id/time providers

pub mod config;
pub mod ids;
pub mod scheduler;

pub use config::RegisterConfig;
pub use ids::{Clock, IdProvider, ManualClock, SequentialIds, SystemClock, UuidIds};
pub use scheduler::{Scheduler, TaskKind};
