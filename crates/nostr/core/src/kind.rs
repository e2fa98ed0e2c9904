//! Well-known event kinds and NIP-01 kind classification.
//!
//! The event engine treats `kind` as an opaque category; these constants only
//! name the conventional values.

pub const KIND_METADATA: u16 = 0;
pub const KIND_TEXT_NOTE: u16 = 1;
pub const KIND_RECOMMEND_RELAY: u16 = 2;
pub const KIND_CONTACTS: u16 = 3;
pub const KIND_ENCRYPTED_DIRECT_MESSAGE: u16 = 4;
pub const KIND_EVENT_DELETION: u16 = 5;
pub const KIND_REPOST: u16 = 6;
pub const KIND_REACTION: u16 = 7;
pub const KIND_RELAY_LIST: u16 = 10002;
pub const KIND_LONG_FORM: u16 = 30023;

/// Event kind classification according to NIP-01.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindClassification {
    /// Events expected to be stored by relays
    Regular,
    /// Only latest event per pubkey+kind is stored
    Replaceable,
    /// Not expected to be stored by relays
    Ephemeral,
    /// Only latest event per pubkey+kind+d-tag is stored
    Addressable,
    Unknown,
}

/// Classify an event kind according to NIP-01 rules.
pub fn classify_kind(kind: u16) -> KindClassification {
    match kind {
        1 | 2 | 4..45 | 1000..10000 => KindClassification::Regular,
        0 | 3 | 10000..20000 => KindClassification::Replaceable,
        20000..30000 => KindClassification::Ephemeral,
        30000..40000 => KindClassification::Addressable,
        _ => KindClassification::Unknown,
    }
}

pub fn is_regular_kind(kind: u16) -> bool {
    classify_kind(kind) == KindClassification::Regular
}

pub fn is_replaceable_kind(kind: u16) -> bool {
    classify_kind(kind) == KindClassification::Replaceable
}

pub fn is_ephemeral_kind(kind: u16) -> bool {
    classify_kind(kind) == KindClassification::Ephemeral
}

pub fn is_addressable_kind(kind: u16) -> bool {
    classify_kind(kind) == KindClassification::Addressable
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_kind() {
        assert_eq!(classify_kind(KIND_TEXT_NOTE), KindClassification::Regular);
        assert_eq!(classify_kind(KIND_REACTION), KindClassification::Regular);
        assert_eq!(classify_kind(44), KindClassification::Regular);
        assert_eq!(classify_kind(45), KindClassification::Unknown);
        assert_eq!(classify_kind(9999), KindClassification::Regular);
        assert_eq!(classify_kind(KIND_METADATA), KindClassification::Replaceable);
        assert_eq!(classify_kind(KIND_CONTACTS), KindClassification::Replaceable);
        assert_eq!(classify_kind(KIND_RELAY_LIST), KindClassification::Replaceable);
        assert_eq!(classify_kind(20000), KindClassification::Ephemeral);
        assert_eq!(classify_kind(KIND_LONG_FORM), KindClassification::Addressable);
        assert_eq!(classify_kind(50000), KindClassification::Unknown);
    }

    #[test]
    fn test_kind_predicates() {
        assert!(is_regular_kind(1));
        assert!(!is_regular_kind(0));
        assert!(is_replaceable_kind(19999));
        assert!(!is_replaceable_kind(20000));
        assert!(is_ephemeral_kind(29999));
        assert!(is_addressable_kind(39999));
        assert!(!is_addressable_kind(40000));
    }
}
