//! paes-core: Exam scoring engine, analysis, and session workflow.
//!
//! This crate defines the exam data model, the pure scoring pipeline that
//! turns a finished session into [`results::ExamResults`], and the
//! collaborator traits the rest of the workspace plugs storage into.

pub mod analysis;
pub mod cache;
pub mod engine;
pub mod error;
pub mod grading;
pub mod model;
pub mod parser;
pub mod recommendations;
pub mod report;
pub mod results;
pub mod session;
pub mod traits;

pub use engine::{compute_results, ScoringConfig, ScoringEngine};
pub use error::{ScoringError, SessionError};
