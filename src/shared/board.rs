//! Board Data Structures
//!
//! Boards are named collections of tasks with an owner and a set of
//! role-scoped members. The owner is an overlay on top of the membership
//! set: a board does not guarantee its owner appears inside `members`, and
//! nothing here inserts a synthetic owner row.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role a member holds on one board
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardRole {
    /// Full control including rename/delete/share; exactly one per board
    Owner,
    /// May create, edit, move and delete tasks
    Editor,
    /// Read-only access
    Viewer,
}

impl BoardRole {
    /// Whether this role permits mutating board content
    pub fn can_modify(self) -> bool {
        matches!(self, Self::Owner | Self::Editor)
    }
}

/// A member of a board, with profile fields resolved client-side.
///
/// `display_name` and `email` are `None` until the profile lookup succeeds;
/// a lookup that fails for a given id still yields a member carrying the
/// bare id so the UI never throws on an unknown user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BoardMember {
    /// The member's user id
    pub user_id: Uuid,
    /// Resolved display name, if the profile lookup succeeded
    pub display_name: Option<String>,
    /// Resolved email, if the profile lookup succeeded
    pub email: Option<String>,
    /// The member's role on this board
    pub role: BoardRole,
}

impl BoardMember {
    /// Placeholder member for a user id whose profile could not be resolved
    pub fn placeholder(user_id: Uuid, role: BoardRole) -> Self {
        Self {
            user_id,
            display_name: None,
            email: None,
            role,
        }
    }

    /// Display name or fallback to the bare user id
    pub fn display_name_or_id(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| self.user_id.to_string())
    }
}

/// Raw membership entry as returned by `GET boards/{id}/members`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawMember {
    /// The member's user id
    pub user_id: Uuid,
    /// The member's role on this board
    pub role: BoardRole,
}

/// A board as held in the local cache
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    /// Unique board ID
    pub id: Uuid,
    /// Board name
    pub name: String,
    /// The owning user; implicitly the highest role even if absent from
    /// `members`
    pub owner_id: Uuid,
    /// Known members; may lag the server until the next membership fetch
    #[serde(default)]
    pub members: Vec<BoardMember>,
}

/// Wire shape of a board as returned by the list/create endpoints.
///
/// The list endpoint may omit `members` entirely for performance; `None`
/// here means "not sent", which is different from an empty member set and
/// must never erase already-known member data during a merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardDto {
    /// Unique board ID
    pub id: Uuid,
    /// Board name
    pub name: String,
    /// The owning user
    pub owner_id: Uuid,
    /// Membership, when the endpoint includes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<RawMember>>,
}

impl BoardDto {
    /// Build a cache board, falling back to `known` members when the wire
    /// omitted them
    pub fn into_board(self, known: Vec<BoardMember>) -> Board {
        let members = match self.members {
            Some(raw) => merge_members(&known, &raw),
            None => known,
        };
        Board {
            id: self.id,
            name: self.name,
            owner_id: self.owner_id,
            members,
        }
    }
}

/// Merge raw membership with already-resolved profiles.
///
/// The raw list is authoritative for who is a member and with what role;
/// resolved display names and emails are carried over from the previous
/// member set so a members-less or raw-only response never erases them.
pub fn merge_members(known: &[BoardMember], raw: &[RawMember]) -> Vec<BoardMember> {
    raw.iter()
        .map(|entry| {
            let cached = known.iter().find(|m| m.user_id == entry.user_id);
            BoardMember {
                user_id: entry.user_id,
                display_name: cached.and_then(|m| m.display_name.clone()),
                email: cached.and_then(|m| m.email.clone()),
                role: entry.role,
            }
        })
        .collect()
}

/// Hydrate a list of DTOs against previously-known boards.
///
/// Merge rule: never let a fetch silently erase already-known member data.
pub fn hydrate_boards(dtos: Vec<BoardDto>, known: &[Board]) -> Vec<Board> {
    dtos.into_iter()
        .map(|dto| {
            let cached = known
                .iter()
                .find(|b| b.id == dto.id)
                .map(|b| b.members.clone())
                .unwrap_or_default();
            dto.into_board(cached)
        })
        .collect()
}
