//! User identifier
//!
//! Users are keyed by a database-assigned BIGSERIAL; the typed wrapper lives
//! in the kernel so the ledger can reference the same id.

pub use kernel::id::UserId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_from_path_segment() {
        let user_id: UserId = "102".parse().unwrap();
        assert_eq!(user_id.as_i64(), 102);
        assert_eq!(user_id.to_string(), "102");
    }
}
