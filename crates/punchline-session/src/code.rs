//! Session code generation.

use punchline_protocol::SessionCode;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::SessionError;

/// Characters a session code is drawn from.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Produces candidate session codes.
///
/// A source makes no uniqueness promise; the manager retries on
/// collision. Implement this to control codes in tests.
pub trait CodeSource: Send + 'static {
    /// Returns a fresh candidate code of `length` characters.
    fn next_code(&mut self, length: usize) -> Result<SessionCode, SessionError>;
}

/// The default [`CodeSource`]: uniform uppercase letters from a
/// non-cryptographic generator.
#[derive(Debug)]
pub struct CodeGenerator {
    rng: StdRng,
}

impl CodeGenerator {
    /// Seeds a generator from the operating system.
    ///
    /// # Errors
    /// [`SessionError::Entropy`] if the OS refuses to provide randomness.
    pub fn from_entropy() -> Result<Self, SessionError> {
        let rng = StdRng::try_from_os_rng()
            .map_err(|e| SessionError::Entropy(e.to_string()))?;
        Ok(Self { rng })
    }

    /// A generator that yields the same codes for the same seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl CodeSource for CodeGenerator {
    fn next_code(&mut self, length: usize) -> Result<SessionCode, SessionError> {
        let code: String = (0..length)
            .map(|_| {
                let i = self.rng.random_range(0..CODE_ALPHABET.len());
                char::from(CODE_ALPHABET[i])
            })
            .collect();
        Ok(SessionCode::new(code))
    }
}
