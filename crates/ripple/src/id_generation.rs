//! Hash-based ID generation for plans and their execution units.
//!
//! Plan IDs are short, collision-resistant hashes: SHA256 over the plan's
//! title, scope and creation time, base36 encoded and prefixed with the
//! configured plan prefix (e.g. `plan-a3f8`). The hash grows from 4 to 6
//! characters as the number of stored plans grows.
//!
//! Execution unit IDs are hierarchical children of their plan ID, numbered by
//! sequence (`plan-a3f8.1`, `plan-a3f8.2`, ...), so a unit ID always names
//! its owning plan.
//!
//! # Example
//!
//! ```
//! use ripple::id_generation::{IdGenerator, IdGeneratorConfig, execution_id};
//!
//! let mut generator = IdGenerator::new(IdGeneratorConfig {
//!     prefix: "plan".to_string(),
//!     database_size: 0,
//! });
//!
//! let plan_id = generator.generate("Bump lodash", &["repoA", "repoB"]).unwrap();
//! assert!(plan_id.starts_with("plan-"));
//! assert_eq!(execution_id(&plan_id, 0), format!("{plan_id}.1"));
//! ```

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_NONCE: u32 = 100;
const MAX_ID_LENGTH: usize = 6;

/// Errors that can occur during ID generation
#[derive(Debug, Error)]
pub enum IdGenerationError {
    /// Unable to generate a unique ID after exhausting all nonces and length increases
    #[error("Unable to generate unique ID after {attempts} attempts")]
    CollisionExhausted {
        /// Number of nonces tried
        attempts: u32,
    },

    /// Invalid length parameter
    #[error("Length must be greater than 0")]
    InvalidLength,
}

/// Configuration for ID generation
#[derive(Debug, Clone)]
pub struct IdGeneratorConfig {
    /// Prefix for all plan IDs (e.g., "plan")
    pub prefix: String,

    /// Number of plans currently stored (affects adaptive length)
    pub database_size: usize,
}

/// Hash-based plan ID generator with collision detection
pub struct IdGenerator {
    config: IdGeneratorConfig,
    existing_ids: HashSet<String>,
}

impl IdGenerator {
    /// Create a new ID generator with the given configuration
    pub fn new(config: IdGeneratorConfig) -> Self {
        Self {
            config,
            existing_ids: HashSet::new(),
        }
    }

    /// Register an existing ID to prevent collisions
    pub fn register_id(&mut self, id: String) {
        self.existing_ids.insert(id);
    }

    /// Number of plans this generator was sized for
    pub fn database_size(&self) -> usize {
        self.config.database_size
    }

    /// Generate a new unique plan ID.
    ///
    /// # Arguments
    ///
    /// * `title` - Plan title
    /// * `scope` - Repositories or packages that distinguish this plan
    ///
    /// # Errors
    ///
    /// Returns an error if every nonce collides even at the maximum length.
    pub fn generate(&mut self, title: &str, scope: &[&str]) -> Result<String, IdGenerationError> {
        let id_length = self.adaptive_length();

        for nonce in 0..MAX_NONCE {
            let id = self.generate_hash_id(title, scope, nonce, id_length)?;

            if !self.existing_ids.contains(&id) {
                if nonce > 0 {
                    debug!(nonce, id_length, "Generated unique plan ID after collisions");
                }
                self.existing_ids.insert(id.clone());
                return Ok(id);
            }
        }

        if id_length < MAX_ID_LENGTH {
            warn!(
                id_length,
                max_nonce = MAX_NONCE,
                "All nonces exhausted, increasing plan ID length to {}",
                id_length + 1
            );
            let longer_id = self.generate_hash_id(title, scope, 0, id_length + 1)?;
            if self.existing_ids.insert(longer_id.clone()) {
                return Ok(longer_id);
            }
        }

        Err(IdGenerationError::CollisionExhausted {
            attempts: MAX_NONCE,
        })
    }

    fn generate_hash_id(
        &self,
        title: &str,
        scope: &[&str],
        nonce: u32,
        length: usize,
    ) -> Result<String, IdGenerationError> {
        let timestamp = Utc::now().timestamp_millis();
        let content = format!("{}|{}|{}|{}", title, scope.join(","), timestamp, nonce);

        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let hash_bytes = hasher.finalize();

        let hash_str = encode_base36(&hash_bytes[..8], length)?;
        Ok(format!("{}-{}", self.config.prefix, hash_str))
    }

    /// - 0-500 plans: 4 chars
    /// - 500-1,500: 5 chars
    /// - 1,500+: 6 chars
    fn adaptive_length(&self) -> usize {
        match self.config.database_size {
            0..=500 => 4,
            501..=1500 => 5,
            _ => MAX_ID_LENGTH,
        }
    }
}

/// ID of the unit at `sequence` (0-based) within `plan_id`.
pub fn execution_id(plan_id: &str, sequence: usize) -> String {
    format!("{}.{}", plan_id, sequence + 1)
}

/// Encode the first 8 bytes as a base36 string of exactly `length` characters.
fn encode_base36(bytes: &[u8], length: usize) -> Result<String, IdGenerationError> {
    if length == 0 {
        return Err(IdGenerationError::InvalidLength);
    }

    let mut n: u64 = 0;
    for &byte in bytes.iter().take(8) {
        n = n.wrapping_shl(8).wrapping_add(u64::from(byte));
    }

    let mut result = Vec::with_capacity(length);
    while result.len() < length {
        // n % 36 always fits the table
        result.push(BASE36_CHARS[(n % 36) as usize]);
        n /= 36;
    }
    result.reverse();

    Ok(result.into_iter().map(char::from).collect())
}
