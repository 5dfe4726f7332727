use crate::config;

/// Hash a password with the configured bcrypt cost.
/// bcrypt is CPU bound, so callers in async context should use `spawn_blocking`.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, config::config().security.bcrypt_cost)
}

/// Check a password against a stored hash. Unparseable hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}
