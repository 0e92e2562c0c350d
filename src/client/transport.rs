//! Transport Seam
//!
//! The REST contract consumed by the caches, lifted to an object-safe
//! trait so both caches can share one `Arc<dyn Transport>` and tests can
//! inject an in-memory fake. The auth header and any 401 interception are
//! the concrete transport's concern; the caches never see credentials.

use async_trait::async_trait;
use uuid::Uuid;

use crate::shared::{BoardDto, BoardRole, CoreResult, RawMember, Task, TaskPatch, TaskStatus, UserProfile};

/// The backend REST contract, one method per endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET boards`: boards visible to the session; members may be omitted
    async fn list_boards(&self) -> CoreResult<Vec<BoardDto>>;

    /// `POST boards`
    async fn create_board(&self, name: &str) -> CoreResult<BoardDto>;

    /// `PATCH boards/{id}`
    async fn rename_board(&self, board_id: Uuid, name: &str) -> CoreResult<()>;

    /// `DELETE boards/{id}`; cascades to the board's tasks server-side
    async fn delete_board(&self, board_id: Uuid) -> CoreResult<()>;

    /// `GET boards/{id}/members`: raw membership, profiles unresolved
    async fn list_members(&self, board_id: Uuid) -> CoreResult<Vec<RawMember>>;

    /// `POST auth/users/batch`
    async fn lookup_users(&self, ids: &[Uuid]) -> CoreResult<Vec<UserProfile>>;

    /// `GET auth/users/search?q=`
    async fn search_users(&self, query: &str) -> CoreResult<Vec<UserProfile>>;

    /// `POST boards/{id}/share`
    async fn share_board(&self, board_id: Uuid, user_id: Uuid, role: BoardRole) -> CoreResult<()>;

    /// `PATCH boards/{id}/members/{userId}`
    async fn update_member_role(
        &self,
        board_id: Uuid,
        user_id: Uuid,
        role: BoardRole,
    ) -> CoreResult<()>;

    /// `DELETE boards/{id}/members/{userId}`
    async fn remove_member(&self, board_id: Uuid, user_id: Uuid) -> CoreResult<()>;

    /// `GET tasks/board/{boardId}`: tasks in canonical lane order
    async fn list_tasks(&self, board_id: Uuid) -> CoreResult<Vec<Task>>;

    /// `POST tasks`; the server mints the task id
    async fn create_task(&self, board_id: Uuid, name: &str) -> CoreResult<Task>;

    /// `PATCH tasks/{id}`: partial field update, returns the canonical task
    async fn update_task(&self, task_id: Uuid, patch: &TaskPatch) -> CoreResult<Task>;

    /// `PATCH tasks/{id}/status`
    async fn update_task_status(&self, task_id: Uuid, status: TaskStatus) -> CoreResult<()>;

    /// `PATCH tasks/board/{boardId}/reorder`: full new ordering for one lane
    async fn reorder_column(
        &self,
        board_id: Uuid,
        status: TaskStatus,
        ordered_task_ids: &[Uuid],
    ) -> CoreResult<()>;

    /// `GET tasks/{id}/assignees`
    async fn get_assignees(&self, task_id: Uuid) -> CoreResult<Vec<Uuid>>;

    /// `PATCH tasks/{id}/assignees`: replaces the full set, returns it
    async fn set_assignees(&self, task_id: Uuid, user_ids: &[Uuid]) -> CoreResult<Vec<Uuid>>;

    /// `DELETE tasks/{id}`
    async fn delete_task(&self, task_id: Uuid) -> CoreResult<()>;
}
