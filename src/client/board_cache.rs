//! Board Cache
//!
//! Owns the set of boards visible to the session, the active-board
//! selection, and board-level mutations. Boards use confirm-then-apply:
//! no board mutation is reflected locally before the server acknowledges
//! it, so a failed rename never flickers.
//!
//! The lock is only ever held across synchronous sections, never across an
//! await; reconciliation re-acquires it when the response arrives.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::client::config::SelectionStore;
use crate::client::transport::Transport;
use crate::shared::{
    hydrate_boards, Board, BoardMember, BoardRole, CoreError, CoreResult, UserProfile,
};

#[derive(Default)]
struct BoardState {
    boards: Vec<Board>,
    active_board_id: Option<Uuid>,
    last_error: Option<CoreError>,
}

/// Local mirror of the session's boards
pub struct BoardCache {
    state: Mutex<BoardState>,
    transport: Arc<dyn Transport>,
    selection: SelectionStore,
}

impl BoardCache {
    pub fn new(transport: Arc<dyn Transport>, selection: SelectionStore) -> Self {
        Self {
            state: Mutex::new(BoardState::default()),
            transport,
            selection,
        }
    }

    fn state(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of all cached boards
    pub fn boards(&self) -> Vec<Board> {
        self.state().boards.clone()
    }

    /// One cached board by id
    pub fn board(&self, board_id: Uuid) -> Option<Board> {
        self.state().boards.iter().find(|b| b.id == board_id).cloned()
    }

    /// The currently active board id, if any
    pub fn active_board_id(&self) -> Option<Uuid> {
        self.state().active_board_id
    }

    /// The currently active board, if any
    pub fn active_board(&self) -> Option<Board> {
        let state = self.state();
        let active = state.active_board_id?;
        state.boards.iter().find(|b| b.id == active).cloned()
    }

    /// The most recent surfaced error
    pub fn last_error(&self) -> Option<CoreError> {
        self.state().last_error.clone()
    }

    /// Drop everything (sign-out). The persisted selection file is left
    /// alone; the next fetch validates it against the new session's boards.
    pub fn reset(&self) {
        let mut state = self.state();
        state.boards.clear();
        state.active_board_id = None;
        state.last_error = None;
        tracing::info!("Board cache cleared");
    }

    fn fail(&self, error: CoreError) -> CoreError {
        tracing::error!("Board operation failed: {}", error);
        self.state().last_error = Some(error.clone());
        error
    }

    /// Fetch all boards visible to the session and merge them into the
    /// cache.
    ///
    /// The list endpoint may omit members for performance; already-known
    /// member data is preserved for boards the response is members-less
    /// for. Afterwards the active selection is revalidated: a still-valid
    /// selection is kept, otherwise the persisted choice is restored if it
    /// still exists, otherwise the first board is auto-selected; the
    /// selection becomes empty only when the board list is empty.
    pub async fn fetch_boards(&self) -> CoreResult<()> {
        let dtos = self
            .transport
            .list_boards()
            .await
            .map_err(|e| self.fail(e))?;

        let mut state = self.state();
        let merged = hydrate_boards(dtos, &state.boards);
        state.boards = merged;

        let current = state.active_board_id;
        let current_valid =
            current.is_some_and(|id| state.boards.iter().any(|b| b.id == id));
        let next = if current_valid {
            current
        } else {
            let persisted = self
                .selection
                .load()
                .filter(|id| state.boards.iter().any(|b| b.id == *id));
            persisted.or_else(|| state.boards.first().map(|b| b.id))
        };
        if next != state.active_board_id {
            tracing::info!("Active board changed: {:?} -> {:?}", state.active_board_id, next);
            state.active_board_id = next;
            self.selection.store(next);
        }
        Ok(())
    }

    /// Create a board, append it, and make it active
    pub async fn create_board(&self, name: &str) -> CoreResult<Board> {
        let name = name.trim();
        if name.is_empty() {
            return Err(self.fail(CoreError::validation("name", "Board name cannot be empty")));
        }
        let dto = self
            .transport
            .create_board(name)
            .await
            .map_err(|e| self.fail(e))?;
        let board = dto.into_board(Vec::new());

        let mut state = self.state();
        state.boards.push(board.clone());
        state.active_board_id = Some(board.id);
        self.selection.store(Some(board.id));
        Ok(board)
    }

    /// Rename a board. Confirm-then-apply: the local name changes only
    /// after the server acknowledges, so a failure never flickers the UI.
    /// The caller is expected to have checked `is_owner`.
    pub async fn rename_board(&self, board_id: Uuid, name: &str) -> CoreResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(self.fail(CoreError::validation("name", "Board name cannot be empty")));
        }
        self.transport
            .rename_board(board_id, name)
            .await
            .map_err(|e| self.fail(e))?;

        let mut state = self.state();
        if let Some(board) = state.boards.iter_mut().find(|b| b.id == board_id) {
            board.name = name.to_string();
        }
        Ok(())
    }

    /// Delete a board and, if it was active, select the first remaining
    /// board (or none). Returns the new active id so the caller can evict
    /// the task slice.
    pub async fn delete_board(&self, board_id: Uuid) -> CoreResult<Option<Uuid>> {
        self.transport
            .delete_board(board_id)
            .await
            .map_err(|e| self.fail(e))?;

        let mut state = self.state();
        state.boards.retain(|b| b.id != board_id);
        if state.active_board_id == Some(board_id) {
            let next = state.boards.first().map(|b| b.id);
            state.active_board_id = next;
            self.selection.store(next);
        }
        Ok(state.active_board_id)
    }

    /// Explicit user selection. Returns false when the board is unknown.
    pub fn select_board(&self, board_id: Uuid) -> bool {
        let mut state = self.state();
        if !state.boards.iter().any(|b| b.id == board_id) {
            return false;
        }
        if state.active_board_id != Some(board_id) {
            state.active_board_id = Some(board_id);
            self.selection.store(Some(board_id));
        }
        true
    }

    /// Fetch a board's membership and resolve profiles.
    ///
    /// Profiles come from the batch lookup; if the batch endpoint is
    /// unavailable each id is retried individually, and an id that still
    /// cannot be resolved yields a placeholder member carrying the bare id
    /// so the UI never throws on an unknown user.
    pub async fn fetch_board_members(&self, board_id: Uuid) -> CoreResult<Vec<BoardMember>> {
        let raw = self
            .transport
            .list_members(board_id)
            .await
            .map_err(|e| self.fail(e))?;

        let mut ids: Vec<Uuid> = raw.iter().map(|m| m.user_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let mut profiles: HashMap<Uuid, UserProfile> = HashMap::new();
        match self.transport.lookup_users(&ids).await {
            Ok(found) => {
                profiles.extend(found.into_iter().map(|p| (p.id, p)));
            }
            Err(e) => {
                tracing::warn!("Batch user lookup failed, falling back to per-id: {}", e);
                for id in &ids {
                    match self.transport.lookup_users(std::slice::from_ref(id)).await {
                        Ok(found) => profiles.extend(found.into_iter().map(|p| (p.id, p))),
                        Err(e) => tracing::warn!("User lookup failed for {}: {}", id, e),
                    }
                }
            }
        }

        let members: Vec<BoardMember> = raw
            .iter()
            .map(|entry| match profiles.get(&entry.user_id) {
                Some(profile) => BoardMember {
                    user_id: entry.user_id,
                    display_name: Some(profile.username.clone()),
                    email: Some(profile.email.clone()),
                    role: entry.role,
                },
                None => BoardMember::placeholder(entry.user_id, entry.role),
            })
            .collect();

        let mut state = self.state();
        if let Some(board) = state.boards.iter_mut().find(|b| b.id == board_id) {
            board.members = members.clone();
        }
        Ok(members)
    }

    /// Grant a user access to a board, then refetch membership.
    ///
    /// Membership is refetched rather than locally patched because role
    /// propagation is server-authoritative.
    pub async fn share_board(
        &self,
        board_id: Uuid,
        user_id: Uuid,
        role: BoardRole,
    ) -> CoreResult<()> {
        self.transport
            .share_board(board_id, user_id, role)
            .await
            .map_err(|e| self.fail(e))?;
        self.fetch_board_members(board_id).await?;
        Ok(())
    }

    /// Change a member's role, then refetch membership
    pub async fn update_member_role(
        &self,
        board_id: Uuid,
        user_id: Uuid,
        role: BoardRole,
    ) -> CoreResult<()> {
        self.transport
            .update_member_role(board_id, user_id, role)
            .await
            .map_err(|e| self.fail(e))?;
        self.fetch_board_members(board_id).await?;
        Ok(())
    }

    /// Remove a member, then refetch membership. Task assignments are left
    /// alone; removal does not retroactively unassign.
    pub async fn remove_member(&self, board_id: Uuid, user_id: Uuid) -> CoreResult<()> {
        self.transport
            .remove_member(board_id, user_id)
            .await
            .map_err(|e| self.fail(e))?;
        self.fetch_board_members(board_id).await?;
        Ok(())
    }

    /// Search users by name or email for the share dialog
    pub async fn search_users(&self, query: &str) -> CoreResult<Vec<UserProfile>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.transport
            .search_users(query)
            .await
            .map_err(|e| self.fail(e))
    }
}
