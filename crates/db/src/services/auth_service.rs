// Password hashing for user accounts. Identity itself arrives via the
// OAuth proxy headers; bcrypt is only used for locally managed credentials.
use bcrypt::{DEFAULT_COST, hash, verify};

pub struct AuthService;

impl AuthService {
    /// Hash a password using bcrypt
    pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
        hash(password, DEFAULT_COST)
    }

    /// Verify a password against a hash
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
        verify(password, hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let password = "test_password_123";
        let hash = AuthService::hash_password(password).unwrap();

        // Verify correct password
        assert!(AuthService::verify_password(password, &hash).unwrap());

        // Verify wrong password fails
        assert!(!AuthService::verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let password = "same_password";
        let first = AuthService::hash_password(password).unwrap();
        let second = AuthService::hash_password(password).unwrap();
        assert_ne!(first, second);
        assert!(AuthService::verify_password(password, &second).unwrap());
    }
}
