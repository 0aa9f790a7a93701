//! Environment abstraction for deterministic testing.
//!
//! Decouples the engine from system randomness (the source of local message
//! ids). Production uses OS entropy; tests use a seeded RNG so generated ids
//! are reproducible.

use rand::RngCore;

/// Abstract environment providing randomness.
///
/// # Invariants
///
/// - `random_bytes()` uses unpredictable entropy in production.
/// - Given the same seed, a test environment produces the same byte sequence.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u128`.
    ///
    /// Convenience for local message id generation.
    fn random_u128(&self) -> u128 {
        let mut bytes = [0u8; 16];
        self.random_bytes(&mut bytes);
        u128::from_be_bytes(bytes)
    }
}

/// Production environment backed by OS entropy.
#[derive(Debug, Clone, Default)]
pub struct SystemEnv;

impl Environment for SystemEnv {
    fn random_bytes(&self, buffer: &mut [u8]) {
        rand::rngs::OsRng.fill_bytes(buffer);
    }
}

/// Test utilities.
pub mod test_utils {
    use std::sync::{Arc, Mutex};

    use rand::{RngCore, SeedableRng, rngs::StdRng};

    use super::Environment;

    /// Deterministic environment with a seeded RNG.
    #[derive(Debug, Clone)]
    pub struct MockEnv {
        rng: Arc<Mutex<StdRng>>,
    }

    impl MockEnv {
        /// Create a mock environment with a fixed default seed.
        pub fn new() -> Self {
            Self::with_seed(0x4d41_524b)
        }

        /// Create a mock environment with the given seed.
        pub fn with_seed(seed: u64) -> Self {
            Self { rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))) }
        }
    }

    impl Default for MockEnv {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Environment for MockEnv {
        fn random_bytes(&self, buffer: &mut [u8]) {
            // Lock poisoning only happens if a test panicked mid-fill; any
            // subsequent use is already doomed, so recover the guard.
            let mut rng = match self.rng.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            rng.fill_bytes(buffer);
        }
    }
}
