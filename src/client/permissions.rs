//! Permission Resolution
//!
//! Pure mapping from (board, user) to the effective role and capability
//! set. No state, no caching: membership can change underneath an open
//! view, so callers recompute on every render and before every mutation.

use uuid::Uuid;

use crate::shared::{Board, BoardRole};

/// Effective capabilities of one user on one board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardAccess {
    /// Effective role; ownership overrides any membership entry
    pub role: BoardRole,
    /// Whether content mutations (tasks, renames of owned boards) are allowed
    pub can_modify: bool,
    /// Whether the user owns the board
    pub is_owner: bool,
}

/// Resolve the effective role of `user_id` on `board`.
///
/// Ownership is an overlay: the owner gets `Owner` whether or not a
/// membership row exists for them. A user neither owning nor listed is a
/// `Viewer` (default-deny). Total function; never fails.
pub fn resolve(board: &Board, user_id: Uuid) -> BoardAccess {
    let is_owner = board.owner_id == user_id;
    let role = if is_owner {
        BoardRole::Owner
    } else {
        board
            .members
            .iter()
            .find(|member| member.user_id == user_id)
            .map(|member| member.role)
            .unwrap_or(BoardRole::Viewer)
    };
    BoardAccess {
        role,
        can_modify: role.can_modify(),
        is_owner,
    }
}
