//! User Profile Types
//!
//! Identity records returned by the auth service's lookup endpoints. Users
//! are created by registration and immutable thereafter as far as this core
//! is concerned.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's public profile as returned by `auth/users/batch` and
/// `auth/users/search`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Unique user ID
    pub id: Uuid,
    /// User's email (used for lookup)
    pub email: String,
    /// User's username, doubling as display name
    pub username: String,
}
