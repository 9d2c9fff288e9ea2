// 🆔 Identifier Generator - Opaque, globally unique ids
//
// Every entity (bank, user, account, transfer) is identified by a UUID v4
// rendered as a string. Ids carry no ordering and no meaning.

/// Bank identifier
pub type BankId = String;

/// User identifier
pub type UserId = String;

/// Bank account identifier
pub type AccountId = String;

/// Generate a fresh identifier (UUID v4)
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_id_is_uuid() {
        let id = generate_id();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }
}
