//! Questionnaire tree engine.
//!
//! Templates are trees of groups and questions. This crate validates their
//! structure, decides which conditional nodes apply to a set of answers,
//! scores submissions bottom-up on a 0-100 scale, and folds many scored
//! submissions into cohort statistics.

pub mod config;
pub mod error;
pub mod scoring;
pub mod service;
pub mod telemetry;
pub mod tree;
