//! Randomness for salts and nonces.

use rand::RngCore;
use rand::rngs::OsRng;

/// Returns `N` bytes drawn from the operating system CSPRNG.
///
/// Panics if the OS generator is unavailable; there is no fallback to a
/// weaker source.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    OsRng.fill_bytes(&mut buf);
    buf
}
