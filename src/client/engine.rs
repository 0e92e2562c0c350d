//! Sync Engine
//!
//! Root-owned container wiring the session identity to the board and task
//! caches: no ambient globals, the application root constructs one engine
//! and passes it by reference to its views. The engine is also where
//! permission gating happens, so a denied action never reaches the
//! network, and where a vanished entity triggers a refetch of its parent
//! collection.

use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::client::board_cache::BoardCache;
use crate::client::config::SelectionStore;
use crate::client::permissions::{resolve, BoardAccess};
use crate::client::reorder::ReorderEngine;
use crate::client::task_cache::TaskCache;
use crate::client::transport::Transport;
use crate::shared::{Board, BoardRole, CoreError, CoreResult, Task, TaskPatch, TaskStatus};

/// Application-root state container for the synchronization core
pub struct SyncEngine {
    boards: BoardCache,
    tasks: TaskCache,
    session_user: Mutex<Option<Uuid>>,
}

impl SyncEngine {
    pub fn new(transport: Arc<dyn Transport>, selection: SelectionStore) -> Self {
        Self {
            boards: BoardCache::new(Arc::clone(&transport), selection),
            tasks: TaskCache::new(transport),
            session_user: Mutex::new(None),
        }
    }

    /// The board cache slice
    pub fn boards(&self) -> &BoardCache {
        &self.boards
    }

    /// The task cache slice
    pub fn tasks(&self) -> &TaskCache {
        &self.tasks
    }

    fn session(&self) -> MutexGuard<'_, Option<Uuid>> {
        self.session_user
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The signed-in user, if any
    pub fn current_user_id(&self) -> Option<Uuid> {
        *self.session()
    }

    /// Session change notification. A different identity drops both cache
    /// slices; the caller follows up with [`SyncEngine::bootstrap`].
    pub fn set_session(&self, user_id: Uuid) {
        let mut session = self.session();
        if *session != Some(user_id) {
            tracing::info!("Session user changed, clearing caches");
            self.boards.reset();
            self.tasks.reset();
        }
        *session = Some(user_id);
    }

    /// Sign-out notification: clears the session identity and both caches
    pub fn sign_out(&self) {
        *self.session() = None;
        self.boards.reset();
        self.tasks.reset();
    }

    /// Initial load: fetch boards, then the task slice for whichever board
    /// ends up active (persisted choice if still valid, else the first)
    pub async fn bootstrap(&self) -> CoreResult<()> {
        self.boards.fetch_boards().await?;
        let active = self.boards.active_board_id();
        self.tasks.set_board(active);
        if let Some(board_id) = active {
            self.tasks.fetch_tasks(board_id).await?;
        }
        Ok(())
    }

    /// Explicit board selection. The previous task slice is discarded
    /// before the new fetch is issued.
    pub async fn select_board(&self, board_id: Uuid) -> CoreResult<()> {
        if !self.boards.select_board(board_id) {
            return Err(CoreError::not_found("board"));
        }
        self.tasks.set_board(Some(board_id));
        self.tasks.fetch_tasks(board_id).await
    }

    /// Effective capabilities of the session user on a board.
    ///
    /// Recomputed on every call; an unknown board or missing session is
    /// default-deny.
    pub fn access(&self, board_id: Uuid) -> BoardAccess {
        let denied = BoardAccess {
            role: BoardRole::Viewer,
            can_modify: false,
            is_owner: false,
        };
        let Some(user_id) = self.current_user_id() else {
            return denied;
        };
        match self.boards.board(board_id) {
            Some(board) => resolve(&board, user_id),
            None => denied,
        }
    }

    fn require_owner(&self, board_id: Uuid) -> CoreResult<()> {
        if self.access(board_id).is_owner {
            Ok(())
        } else {
            Err(CoreError::authorization("Only the board owner may do this"))
        }
    }

    fn require_modify(&self, board_id: Uuid) -> CoreResult<()> {
        if self.access(board_id).can_modify {
            Ok(())
        } else {
            Err(CoreError::authorization("Viewer role cannot modify the board"))
        }
    }

    fn active_board_id(&self) -> CoreResult<Uuid> {
        self.boards
            .active_board_id()
            .ok_or_else(|| CoreError::validation("board", "No board selected"))
    }

    /// Create a board and make it active (its task slice starts empty)
    pub async fn create_board(&self, name: &str) -> CoreResult<Board> {
        let board = self.boards.create_board(name).await?;
        self.tasks.set_board(Some(board.id));
        Ok(board)
    }

    /// Rename a board; owner-only. A 404 means the board vanished
    /// server-side, so the board list is refetched before surfacing.
    pub async fn rename_board(&self, board_id: Uuid, name: &str) -> CoreResult<()> {
        self.require_owner(board_id)?;
        match self.boards.rename_board(board_id, name).await {
            Err(e) if e.is_not_found() => {
                self.refresh_boards_after_vanish().await;
                Err(e)
            }
            other => other,
        }
    }

    /// Delete a board; owner-only. Evicts the task slice and loads the
    /// newly active board, if any.
    pub async fn delete_board(&self, board_id: Uuid) -> CoreResult<()> {
        self.require_owner(board_id)?;
        let next_active = self.boards.delete_board(board_id).await?;
        self.tasks.set_board(next_active);
        if let Some(active) = next_active {
            self.tasks.fetch_tasks(active).await?;
        }
        Ok(())
    }

    /// Grant a user access; owner-only
    pub async fn share_board(
        &self,
        board_id: Uuid,
        user_id: Uuid,
        role: BoardRole,
    ) -> CoreResult<()> {
        self.require_owner(board_id)?;
        self.boards.share_board(board_id, user_id, role).await
    }

    /// Change a member's role; owner-only
    pub async fn update_member_role(
        &self,
        board_id: Uuid,
        user_id: Uuid,
        role: BoardRole,
    ) -> CoreResult<()> {
        self.require_owner(board_id)?;
        self.boards.update_member_role(board_id, user_id, role).await
    }

    /// Remove a member; owner-only. Existing task assignments are not
    /// touched.
    pub async fn remove_member(&self, board_id: Uuid, user_id: Uuid) -> CoreResult<()> {
        self.require_owner(board_id)?;
        self.boards.remove_member(board_id, user_id).await
    }

    /// Create a task on the active board; requires modify capability
    pub async fn create_task(&self, name: &str) -> CoreResult<Task> {
        let board_id = self.active_board_id()?;
        self.require_modify(board_id)?;
        self.tasks.create_task(board_id, name).await
    }

    /// Partial task update; requires modify capability. A vanished task
    /// triggers a refetch of the active board's slice.
    pub async fn update_task(&self, task_id: Uuid, patch: TaskPatch) -> CoreResult<Task> {
        let board_id = self.active_board_id()?;
        self.require_modify(board_id)?;
        match self.tasks.update_task(task_id, patch).await {
            Err(e) if e.is_not_found() => {
                let _ = self.tasks.fetch_tasks(board_id).await;
                Err(e)
            }
            other => other,
        }
    }

    /// Optimistic status move; requires modify capability, checked before
    /// any network call
    pub async fn update_task_status(&self, task_id: Uuid, status: TaskStatus) -> CoreResult<()> {
        let board_id = self.active_board_id()?;
        self.require_modify(board_id)?;
        self.tasks.update_task_status(task_id, status).await
    }

    /// Replace a task's assignee set; requires modify capability
    pub async fn set_task_assignees(&self, task_id: Uuid, user_ids: &[Uuid]) -> CoreResult<()> {
        let board_id = self.active_board_id()?;
        self.require_modify(board_id)?;
        self.tasks.set_task_assignees(task_id, user_ids).await
    }

    /// Delete a task; requires modify capability. A vanished task triggers
    /// a refetch of the active board's slice.
    pub async fn delete_task(&self, task_id: Uuid) -> CoreResult<()> {
        let board_id = self.active_board_id()?;
        self.require_modify(board_id)?;
        match self.tasks.delete_task(task_id).await {
            Err(e) if e.is_not_found() => {
                let _ = self.tasks.fetch_tasks(board_id).await;
                Err(e)
            }
            other => other,
        }
    }

    /// Drag-and-drop a task to `target_index` within `target` lane;
    /// requires modify capability, checked before any network call
    pub async fn move_task(
        &self,
        task_id: Uuid,
        target: TaskStatus,
        target_index: usize,
    ) -> CoreResult<()> {
        let board_id = self.active_board_id()?;
        self.require_modify(board_id)?;
        ReorderEngine::drag(&self.tasks, board_id, task_id, target, target_index).await
    }

    async fn refresh_boards_after_vanish(&self) {
        if self.boards.fetch_boards().await.is_ok() {
            let active = self.boards.active_board_id();
            self.tasks.set_board(active);
        }
    }
}
