//! Integration test binary for promptcast.
//!
//! Scenarios live under `integration/`: batch fan-out, retries, warm-up,
//! layered configuration and the CLI route table, all against in-process
//! scripted backends.

mod integration;
