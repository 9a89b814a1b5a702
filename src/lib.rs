//! Engage - terminal console for engagement orchestration
//!
//! This library submits targets to an engagement service for analysis,
//! executes the recommended playbooks and keeps a bounded window of past
//! engagements, all driven through a single [`orchestrator::Orchestrator`]
//! that owns the console's view state.

pub mod cli;
pub mod commands;
pub mod config;
pub mod model;
pub mod orchestrator;
pub mod render;
pub mod service;
