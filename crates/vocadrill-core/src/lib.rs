//! vocadrill-core: practice generation, scheduling, and answer grading.
//!
//! This crate defines the vocabulary data model, the weighted scheduler that
//! decides what to quiz next, the practice producers, and the grader that
//! classifies learner answers as correct, partially correct, or incorrect.

pub mod engine;
pub mod error;
pub mod grading;
pub mod history;
pub mod model;
pub mod parser;
pub mod practice;
pub mod producer;
pub mod report;
pub mod scheduler;
pub mod session;
pub mod statistics;
pub mod text;
pub mod traits;
