//! Random reviewer selection.
//!
//! Selection is a pluggable policy: services hold a `dyn ReviewerPicker` so
//! tests can swap in a seeded generator without touching orchestration.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

use crate::error::AppError;
use crate::models::User;

/// Chooses reviewers from an already-filtered candidate list.
pub trait ReviewerPicker: Send + Sync {
    /// Uniform random subset of size `min(candidates.len(), max_count)`.
    /// An empty candidate list yields an empty result.
    fn pick_many(&self, candidates: Vec<User>, max_count: usize) -> Vec<User>;

    /// One uniformly random candidate. Fails with `NoCandidate` when empty.
    fn pick_one(&self, candidates: Vec<User>) -> Result<User, AppError>;
}

/// Picker backed by a standard RNG.
pub struct RandomPicker {
    rng: Mutex<StdRng>,
}

impl RandomPicker {
    /// Picker seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic picker for tests and reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // A panic while holding the lock cannot corrupt an RNG
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut *rng)
    }
}

impl Default for RandomPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewerPicker for RandomPicker {
    fn pick_many(&self, mut candidates: Vec<User>, max_count: usize) -> Vec<User> {
        if candidates.is_empty() {
            return candidates;
        }

        // Shuffle then truncate: every candidate is equally likely and none twice.
        self.with_rng(|rng| candidates.shuffle(rng));
        candidates.truncate(max_count);
        candidates
    }

    fn pick_one(&self, mut candidates: Vec<User>) -> Result<User, AppError> {
        if candidates.is_empty() {
            return Err(AppError::no_candidate(None));
        }

        let idx = self.with_rng(|rng| rng.gen_range(0..candidates.len()));
        Ok(candidates.swap_remove(idx))
    }
}
