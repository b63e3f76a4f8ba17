//! Concurrent image generation: bounded calls, retries, batch fan-out and warm-up.

pub mod bounded;
pub mod coordinator;
pub mod naming;
pub mod retry;
pub mod types;
pub mod warmup;

pub use bounded::call_bounded;
pub use coordinator::FanOutCoordinator;
pub use naming::{artifact_path, prompt_variant, slugify, SeedSource};
pub use retry::{RetryPolicy, RetryingGenerator};
pub use types::{
    BatchReport, BatchTimestamp, ExhaustedUnit, GeneratedArtifact, GenerationBatch, Outcome,
    WorkUnit,
};
pub use warmup::{ProbeResult, ProbeStatus, WarmUpConfig, WarmUpProber, WarmUpReport};
