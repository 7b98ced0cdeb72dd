use rand::Rng;

use super::errors::DomainError;

/// Uppercase alphanumerics without the easily confused `0 O 1 I`.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const BASE_LENGTH: usize = 8;
const WIDEN_PER_ATTEMPT: usize = 2;
pub const MAX_ATTEMPTS: usize = 5;

pub const REFERRAL_CODE_PREFIX: &str = "REF";
pub const REWARD_COUPON_PREFIX: &str = "RWD";

pub fn random_code(prefix: &str, random_len: usize) -> String {
    let mut rng = rand::thread_rng();
    let body: String = (0..random_len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{prefix}{body}")
}

/// Generates `prefix` + random characters until `is_taken` reports a free
/// candidate. Each retry widens the random part; gives up after
/// `MAX_ATTEMPTS`.
pub fn generate_unique_code<F>(prefix: &str, mut is_taken: F) -> Result<String, DomainError>
where
    F: FnMut(&str) -> Result<bool, DomainError>,
{
    for attempt in 0..MAX_ATTEMPTS {
        let candidate = random_code(prefix, BASE_LENGTH + attempt * WIDEN_PER_ATTEMPT);
        if !is_taken(&candidate)? {
            return Ok(candidate);
        }
        log::debug!("code candidate {} already taken (attempt {})", candidate, attempt + 1);
    }
    Err(DomainError::Internal(format!(
        "could not generate a unique {prefix} code after {MAX_ATTEMPTS} attempts"
    )))
}
