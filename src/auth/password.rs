pub use bcrypt::DEFAULT_COST;

/// bcrypt hash with a random salt; `cost` must be within 4-31.
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// False for a malformed stored hash as well as for a wrong password.
pub fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_its_own_hash() {
        let stored = hash_password_with_cost("hunter2", 4).unwrap();
        assert!(stored.starts_with("$2b$04$"));
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn salts_differ_between_calls() {
        let first = hash_password_with_cost("hunter2", 4).unwrap();
        let second = hash_password_with_cost("hunter2", 4).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn known_hash() {
        assert!(verify_password("U*U", "$2a$05$CCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOeW"));
        assert!(!verify_password("U*V", "$2a$05$CCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOeW"));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "no-separator"));
        assert!(!verify_password("pass128", "00128$b5490a"));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn rejects_cost_below_minimum() {
        assert!(hash_password_with_cost("hunter2", 3).is_err());
    }
}
