use rand::{Rng, distributions::Alphanumeric};

/// Length of refresh tokens; 64 alphanumeric characters carry about 381 bits.
pub const REFRESH_TOKEN_LENGTH: usize = 64;

/// Generates a random alphanumeric string of the specified length.
///
/// The generated string contains uppercase letters (A-Z), lowercase letters (a-z),
/// and digits (0-9), drawn from the thread-local CSPRNG. Used for opaque
/// refresh tokens.
///
/// # Examples
///
/// ```ignore
/// let token = generate_random_string(32);
/// assert_eq!(token.len(), 32);
/// ```
pub fn generate_random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_and_alphabet() {
        let token = generate_random_string(REFRESH_TOKEN_LENGTH);
        assert_eq!(token.len(), REFRESH_TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tokens_differ() {
        assert_ne!(generate_random_string(32), generate_random_string(32));
    }
}
