//! Collision-resistant database name generation.

use crate::error::Error;

const ALPHABET_LEN: u8 = 26;

/// Generates a random lowercase name of exactly `length` characters.
///
/// Characters are drawn from `a..=z` using the operating system's
/// cryptographically strong entropy source, so two calls are
/// statistically independent and collisions at the default length of
/// fifteen are negligible across realistic test-suite volumes.
///
/// # Errors
///
/// Returns [`Error::RandomSource`] if the entropy source is unavailable.
pub fn random_name(length: usize) -> Result<String, Error> {
    let mut bytes = vec![0_u8; length];
    getrandom::fill(&mut bytes).map_err(|source| Error::RandomSource { source })?;
    Ok(bytes
        .iter()
        .map(|byte| char::from(b'a' + byte % ALPHABET_LEN))
        .collect())
}
