//! Artifact naming and per-attempt prompt variants.

use crate::generation::types::BatchTimestamp;
use std::path::{Path, PathBuf};

const SEED_MODULUS: u64 = 1_000_000;

/// Lowercase, file-name-safe form of a display name or identifier.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "backend".to_string()
    } else {
        slug.to_string()
    }
}

/// `{output_dir}/{name}_{identifier}_{timestamp}[_p{n}].png`
///
/// The prompt suffix is only added when the batch carries more than one prompt.
pub fn artifact_path(
    output_dir: &Path,
    display_name: &str,
    identifier: &str,
    timestamp: &BatchTimestamp,
    prompt_index: usize,
    prompt_count: usize,
) -> PathBuf {
    let mut file_name = format!(
        "{}_{}_{}",
        slugify(display_name),
        slugify(identifier),
        timestamp
    );
    if prompt_count > 1 {
        file_name.push_str(&format!("_p{}", prompt_index + 1));
    }
    file_name.push_str(".png");
    output_dir.join(file_name)
}

pub fn prompt_variant(base_prompt: &str, seed: u64) -> String {
    format!("{} --seed {}", base_prompt, seed)
}

/// Time-derived seeds that never repeat within one work unit.
#[derive(Debug, Default)]
pub struct SeedSource {
    issued: Vec<u64>,
}

impl SeedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_seed(&mut self) -> u64 {
        let millis = chrono::Utc::now().timestamp_millis().unsigned_abs();
        let mut seed = millis % SEED_MODULUS;
        while self.issued.contains(&seed) {
            seed = (seed + 1) % SEED_MODULUS;
        }
        self.issued.push(seed);
        seed
    }
}
