//! Shared test helpers: an in-memory transport with scripted failures,
//! call recording, and gates for holding requests in flight.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Semaphore;
use uuid::Uuid;

use laneboard::shared::{
    BoardDto, BoardRole, CoreError, CoreResult, FieldPatch, RawMember, Task, TaskPatch, TaskStatus,
    UserProfile,
};
use laneboard::Transport;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory stand-in for the backend, shared by the scenario tests
#[derive(Default)]
pub struct FakeTransport {
    pub boards: Mutex<Vec<BoardDto>>,
    pub members: Mutex<HashMap<Uuid, Vec<RawMember>>>,
    pub users: Mutex<HashMap<Uuid, UserProfile>>,
    pub tasks: Mutex<HashMap<Uuid, Vec<Task>>>,
    pub assignees: Mutex<HashMap<Uuid, Vec<Uuid>>>,

    /// One-shot failures keyed by operation name
    failures: Mutex<HashMap<&'static str, CoreError>>,
    /// Task ids whose assignee lookup fails
    pub fail_assignees_for: Mutex<HashSet<Uuid>>,
    /// Whether the batch lookup endpoint rejects multi-id requests
    pub batch_lookup_down: AtomicBool,

    pub status_calls: AtomicUsize,
    pub reorder_calls: Mutex<Vec<(Uuid, TaskStatus, Vec<Uuid>)>>,

    /// Incremented as soon as the call is entered, before any gate
    pub list_tasks_started: AtomicUsize,
    pub status_started: AtomicUsize,

    /// Closed semaphores holding an operation in flight until opened
    gates: Mutex<HashMap<&'static str, Arc<Semaphore>>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_board(&self, name: &str, owner_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        lock(&self.boards).push(BoardDto {
            id,
            name: name.to_string(),
            owner_id,
            members: None,
        });
        lock(&self.tasks).insert(id, Vec::new());
        id
    }

    pub fn set_board_members(&self, board_id: Uuid, members: Vec<(Uuid, BoardRole)>) {
        let raw: Vec<RawMember> = members
            .iter()
            .map(|(user_id, role)| RawMember {
                user_id: *user_id,
                role: *role,
            })
            .collect();
        lock(&self.members).insert(board_id, raw.clone());
        if let Some(dto) = lock(&self.boards).iter_mut().find(|b| b.id == board_id) {
            dto.members = Some(raw);
        }
    }

    pub fn add_user(&self, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        lock(&self.users).insert(
            id,
            UserProfile {
                id,
                email: format!("{}@example.com", username),
                username: username.to_string(),
            },
        );
        id
    }

    pub fn add_task(&self, board_id: Uuid, name: &str, status: TaskStatus) -> Uuid {
        let task = Task {
            id: Uuid::new_v4(),
            board_id,
            name: name.to_string(),
            status,
            description: None,
            deadline: None,
            assigned_to: Vec::new(),
            updated_at: Utc::now(),
        };
        let id = task.id;
        lock(&self.tasks).entry(board_id).or_default().push(task);
        id
    }

    /// Drop the members array from the board's list response, as the list
    /// endpoint may for performance
    pub fn clear_listed_members(&self, board_id: Uuid) {
        if let Some(dto) = lock(&self.boards).iter_mut().find(|b| b.id == board_id) {
            dto.members = None;
        }
    }

    /// Make the next call of `op` fail with `error`
    pub fn fail_once(&self, op: &'static str, error: CoreError) {
        lock(&self.failures).insert(op, error);
    }

    /// Hold every call of `op` until the returned semaphore gets permits
    pub fn gate(&self, op: &'static str) -> Arc<Semaphore> {
        let sem = Arc::new(Semaphore::new(0));
        lock(&self.gates).insert(op, Arc::clone(&sem));
        sem
    }

    fn take_failure(&self, op: &'static str) -> Option<CoreError> {
        lock(&self.failures).remove(op)
    }

    async fn pass_gate(&self, op: &'static str) {
        let sem = lock(&self.gates).get(op).cloned();
        if let Some(sem) = sem {
            let permit = sem.acquire().await.expect("gate semaphore closed");
            permit.forget();
        }
    }

    async fn check(&self, op: &'static str) -> CoreResult<()> {
        self.pass_gate(op).await;
        match self.take_failure(op) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn list_boards(&self) -> CoreResult<Vec<BoardDto>> {
        self.check("list_boards").await?;
        Ok(lock(&self.boards).clone())
    }

    async fn create_board(&self, name: &str) -> CoreResult<BoardDto> {
        self.check("create_board").await?;
        let session_owner = Uuid::new_v4();
        let id = self.add_board(name, session_owner);
        Ok(lock(&self.boards)
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .expect("board just added"))
    }

    async fn rename_board(&self, board_id: Uuid, name: &str) -> CoreResult<()> {
        self.check("rename_board").await?;
        match lock(&self.boards).iter_mut().find(|b| b.id == board_id) {
            Some(dto) => {
                dto.name = name.to_string();
                Ok(())
            }
            None => Err(CoreError::not_found("board")),
        }
    }

    async fn delete_board(&self, board_id: Uuid) -> CoreResult<()> {
        self.check("delete_board").await?;
        lock(&self.boards).retain(|b| b.id != board_id);
        lock(&self.tasks).remove(&board_id);
        Ok(())
    }

    async fn list_members(&self, board_id: Uuid) -> CoreResult<Vec<RawMember>> {
        self.check("list_members").await?;
        Ok(lock(&self.members).get(&board_id).cloned().unwrap_or_default())
    }

    async fn lookup_users(&self, ids: &[Uuid]) -> CoreResult<Vec<UserProfile>> {
        self.check("lookup_users").await?;
        if self.batch_lookup_down.load(Ordering::SeqCst) && ids.len() > 1 {
            return Err(CoreError::network("batch endpoint unavailable"));
        }
        let users = lock(&self.users);
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn search_users(&self, query: &str) -> CoreResult<Vec<UserProfile>> {
        self.check("search_users").await?;
        let query = query.to_lowercase();
        Ok(lock(&self.users)
            .values()
            .filter(|p| p.username.to_lowercase().contains(&query) || p.email.contains(&query))
            .cloned()
            .collect())
    }

    async fn share_board(&self, board_id: Uuid, user_id: Uuid, role: BoardRole) -> CoreResult<()> {
        self.check("share_board").await?;
        let mut members = lock(&self.members);
        let entries = members.entry(board_id).or_default();
        entries.retain(|m| m.user_id != user_id);
        entries.push(RawMember { user_id, role });
        Ok(())
    }

    async fn update_member_role(
        &self,
        board_id: Uuid,
        user_id: Uuid,
        role: BoardRole,
    ) -> CoreResult<()> {
        self.check("update_member_role").await?;
        let mut members = lock(&self.members);
        match members
            .entry(board_id)
            .or_default()
            .iter_mut()
            .find(|m| m.user_id == user_id)
        {
            Some(member) => {
                member.role = role;
                Ok(())
            }
            None => Err(CoreError::not_found("member")),
        }
    }

    async fn remove_member(&self, board_id: Uuid, user_id: Uuid) -> CoreResult<()> {
        self.check("remove_member").await?;
        let mut members = lock(&self.members);
        members.entry(board_id).or_default().retain(|m| m.user_id != user_id);
        Ok(())
    }

    async fn list_tasks(&self, board_id: Uuid) -> CoreResult<Vec<Task>> {
        self.list_tasks_started.fetch_add(1, Ordering::SeqCst);
        self.check("list_tasks").await?;
        Ok(lock(&self.tasks).get(&board_id).cloned().unwrap_or_default())
    }

    async fn create_task(&self, board_id: Uuid, name: &str) -> CoreResult<Task> {
        self.check("create_task").await?;
        let task = Task {
            id: Uuid::new_v4(),
            board_id,
            name: name.to_string(),
            status: TaskStatus::Todo,
            description: None,
            deadline: None,
            assigned_to: Vec::new(),
            updated_at: Utc::now(),
        };
        lock(&self.tasks)
            .entry(board_id)
            .or_default()
            .insert(0, task.clone());
        Ok(task)
    }

    async fn update_task(&self, task_id: Uuid, patch: &TaskPatch) -> CoreResult<Task> {
        self.check("update_task").await?;
        let mut tasks = lock(&self.tasks);
        let task = tasks
            .values_mut()
            .flat_map(|list| list.iter_mut())
            .find(|t| t.id == task_id)
            .ok_or_else(|| CoreError::not_found("task"))?;
        if let Some(name) = &patch.name {
            task.name = name.clone();
        }
        match &patch.description {
            FieldPatch::Keep => {}
            FieldPatch::Clear => task.description = None,
            FieldPatch::Set(text) => task.description = Some(text.clone()),
        }
        match &patch.deadline {
            FieldPatch::Keep => {}
            FieldPatch::Clear => task.deadline = None,
            FieldPatch::Set(when) => task.deadline = Some(*when),
        }
        if let Some(user_ids) = &patch.assigned_to {
            task.assigned_to = user_ids.clone();
        }
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn update_task_status(&self, task_id: Uuid, status: TaskStatus) -> CoreResult<()> {
        self.status_started.fetch_add(1, Ordering::SeqCst);
        self.pass_gate("update_task_status").await;
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.take_failure("update_task_status") {
            return Err(error);
        }
        let mut tasks = lock(&self.tasks);
        match tasks
            .values_mut()
            .flat_map(|list| list.iter_mut())
            .find(|t| t.id == task_id)
        {
            Some(task) => {
                task.status = status;
                Ok(())
            }
            None => Err(CoreError::not_found("task")),
        }
    }

    async fn reorder_column(
        &self,
        board_id: Uuid,
        status: TaskStatus,
        ordered_task_ids: &[Uuid],
    ) -> CoreResult<()> {
        self.check("reorder_column").await?;
        lock(&self.reorder_calls).push((board_id, status, ordered_task_ids.to_vec()));
        Ok(())
    }

    async fn get_assignees(&self, task_id: Uuid) -> CoreResult<Vec<Uuid>> {
        self.check("get_assignees").await?;
        if lock(&self.fail_assignees_for).contains(&task_id) {
            return Err(CoreError::network("assignee lookup failed"));
        }
        Ok(lock(&self.assignees).get(&task_id).cloned().unwrap_or_default())
    }

    async fn set_assignees(&self, task_id: Uuid, user_ids: &[Uuid]) -> CoreResult<Vec<Uuid>> {
        self.check("set_assignees").await?;
        let mut deduped: Vec<Uuid> = Vec::new();
        for id in user_ids {
            if !deduped.contains(id) {
                deduped.push(*id);
            }
        }
        lock(&self.assignees).insert(task_id, deduped.clone());
        Ok(deduped)
    }

    async fn delete_task(&self, task_id: Uuid) -> CoreResult<()> {
        self.check("delete_task").await?;
        for list in lock(&self.tasks).values_mut() {
            list.retain(|t| t.id != task_id);
        }
        Ok(())
    }
}
