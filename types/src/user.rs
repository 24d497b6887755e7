//! Portal user identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric user identifier assigned by the election service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// An authenticated citizen as reported by the election service.
///
/// Replaced wholesale on every (re-)authentication. The only in-place
/// mutation is [`User::mark_voted`], which keeps `has_voted` monotonic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// National identity document number, when the service discloses it.
    #[serde(rename = "dni", default, skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    #[serde(default)]
    pub has_voted: bool,
    #[serde(default)]
    pub is_admin: bool,
}

impl User {
    /// Record that this user has cast their vote. Never reverts.
    pub fn mark_voted(&mut self) {
        self.has_voted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_service_payload() {
        let json = r#"{"id":7,"name":"Ana","email":"ana@x.com","dni":"30111222","hasVoted":false,"isAdmin":true}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, UserId::new(7));
        assert_eq!(user.national_id.as_deref(), Some("30111222"));
        assert!(user.is_admin);
        assert!(!user.has_voted);
    }

    #[test]
    fn missing_flags_default_to_false() {
        let json = r#"{"id":1,"name":"Bo","email":"bo@x.com"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert!(!user.has_voted);
        assert!(!user.is_admin);
        assert_eq!(user.national_id, None);
    }

    #[test]
    fn mark_voted_is_monotonic() {
        let mut user: User =
            serde_json::from_str(r#"{"id":1,"name":"Bo","email":"bo@x.com"}"#).unwrap();
        user.mark_voted();
        user.mark_voted();
        assert!(user.has_voted);
    }
}
