//! ID generation utilities.

use uuid::Uuid;

/// Fixed id of the welcome tab.
pub const WELCOME_TAB_ID: &str = "welcome";

/// Generates a new process-unique id for requests, rows and collections.
///
/// UUID v7 keeps ids roughly sortable by creation time.
#[must_use]
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_format() {
        let id = generate_id();
        assert_eq!(id.len(), 36);
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_generate_id_uniqueness() {
        let id1 = generate_id();
        let id2 = generate_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_welcome_id_is_not_a_uuid() {
        assert!(Uuid::parse_str(WELCOME_TAB_ID).is_err());
    }
}
