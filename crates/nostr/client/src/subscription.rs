//! Subscription identifiers.

use uuid::Uuid;

/// Generate a unique subscription ID.
///
/// 32 lowercase hex characters, well under the 64-character cap relays
/// enforce.
pub fn generate_subscription_id() -> String {
    Uuid::new_v4().simple().to_string()
}
