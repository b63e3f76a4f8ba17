//! Promptcast: concurrent image generation fan-out
//!
//! Dispatches text prompts to several remote image-generation backends at
//! once, bounds each call in time, retries failures, and gathers whatever
//! succeeded into a batch of outcomes for downstream publishing.

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod logging;
pub mod progress;
pub mod publish;
