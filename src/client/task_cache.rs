//! Task Cache
//!
//! Owns the task slice for the currently active board only. Tasks use
//! apply-then-reconcile: status moves flip locally before the server call
//! and roll back on failure, while creates and deletes wait for server
//! confirmation (the server is the id authority, and a delete that
//! reappears is worse UX than a brief delay).
//!
//! Switching boards discards the slice; a fetch response that arrives for
//! a board that is no longer active (or from before a reset) is dropped on
//! the floor, never committed. Within one board, the cache is
//! last-response-wins: the most recently *resolved* response overwrites
//! the entry, not the most recently issued request, so out-of-order
//! arrivals can cause a stale overwrite until the next full fetch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::future::join_all;
use uuid::Uuid;

use crate::client::mutation::{MutationLog, MutationPhase};
use crate::client::transport::Transport;
use crate::shared::{CoreError, CoreResult, Task, TaskPatch, TaskStatus};

#[derive(Default)]
struct TaskState {
    board_id: Option<Uuid>,
    /// Bumped on every reset; a fetch started under an older epoch is stale
    epoch: u64,
    tasks: Vec<Task>,
    /// Per-lane position hints; lane membership itself is task status
    order: HashMap<TaskStatus, Vec<Uuid>>,
    last_error: Option<CoreError>,
    mutations: MutationLog,
}

impl TaskState {
    fn reset_for(&mut self, board_id: Option<Uuid>) {
        self.board_id = board_id;
        self.tasks.clear();
        self.order.clear();
        self.epoch += 1;
    }

    fn lane_ids(&self, status: TaskStatus) -> Vec<Uuid> {
        let in_lane = |id: &Uuid| {
            self.tasks
                .iter()
                .any(|t| t.id == *id && t.status == status)
        };
        let mut ids: Vec<Uuid> = Vec::new();
        if let Some(hints) = self.order.get(&status) {
            for id in hints {
                if in_lane(id) && !ids.contains(id) {
                    ids.push(*id);
                }
            }
        }
        // Tasks that entered the lane without a position hint go last
        for task in &self.tasks {
            if task.status == status && !ids.contains(&task.id) {
                ids.push(task.id);
            }
        }
        ids
    }

    fn task_mut(&mut self, task_id: Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }
}

/// Local mirror of the active board's tasks
pub struct TaskCache {
    state: Mutex<TaskState>,
    transport: Arc<dyn Transport>,
}

impl TaskCache {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            state: Mutex::new(TaskState::default()),
            transport,
        }
    }

    fn state(&self) -> MutexGuard<'_, TaskState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The board this slice belongs to
    pub fn board_id(&self) -> Option<Uuid> {
        self.state().board_id
    }

    /// Snapshot of the slice, lanes flattened in lane order
    pub fn tasks(&self) -> Vec<Task> {
        let state = self.state();
        TaskStatus::ALL
            .iter()
            .flat_map(|status| state.lane_ids(*status))
            .filter_map(|id| state.tasks.iter().find(|t| t.id == id).cloned())
            .collect()
    }

    /// One task by id
    pub fn task(&self, task_id: Uuid) -> Option<Task> {
        self.state().tasks.iter().find(|t| t.id == task_id).cloned()
    }

    /// Tasks of one lane in display order
    pub fn lane(&self, status: TaskStatus) -> Vec<Task> {
        let state = self.state();
        state
            .lane_ids(status)
            .into_iter()
            .filter_map(|id| state.tasks.iter().find(|t| t.id == id).cloned())
            .collect()
    }

    /// Ordered task ids of one lane
    pub fn lane_order(&self, status: TaskStatus) -> Vec<Uuid> {
        self.state().lane_ids(status)
    }

    /// The most recent surfaced error
    pub fn last_error(&self) -> Option<CoreError> {
        self.state().last_error.clone()
    }

    /// Phase of the most recent optimistic mutation against one task
    pub fn mutation_phase(&self, task_id: Uuid) -> Option<MutationPhase> {
        self.state().mutations.latest_for(task_id)
    }

    /// Whether any optimistic mutation is still in flight
    pub fn has_pending_mutations(&self) -> bool {
        self.state().mutations.has_pending()
    }

    /// Drop everything (sign-out)
    pub fn reset(&self) {
        let mut state = self.state();
        state.reset_for(None);
        state.last_error = None;
        tracing::info!("Task cache cleared");
    }

    /// Write barrier for active-board changes: the previous slice is
    /// discarded *before* the next fetch is issued, so no response can
    /// land tasks from one board under another.
    pub fn set_board(&self, board_id: Option<Uuid>) {
        let mut state = self.state();
        if state.board_id != board_id {
            tracing::info!("Task slice switching board: {:?} -> {:?}", state.board_id, board_id);
            state.reset_for(board_id);
        }
    }

    fn fail(&self, error: CoreError) -> CoreError {
        tracing::error!("Task operation failed: {}", error);
        self.state().last_error = Some(error.clone());
        error
    }

    /// Fetch the full task slice for a board, replacing the current one.
    ///
    /// No-op for a nil board id. Assignees are fetched per task; a task
    /// whose assignee lookup fails simply keeps an empty assignee list
    /// rather than aborting the whole fetch. If the active board changed
    /// while the fetch was in flight, the response is dropped.
    pub async fn fetch_tasks(&self, board_id: Uuid) -> CoreResult<()> {
        if board_id.is_nil() {
            return Ok(());
        }
        let epoch = {
            let mut state = self.state();
            if state.board_id != Some(board_id) {
                state.reset_for(Some(board_id));
            }
            state.epoch
        };

        let mut tasks = self
            .transport
            .list_tasks(board_id)
            .await
            .map_err(|e| self.fail(e))?;

        let lookups = join_all(tasks.iter().map(|t| self.transport.get_assignees(t.id))).await;
        for (task, result) in tasks.iter_mut().zip(lookups) {
            match result {
                Ok(assignees) => task.assigned_to = assignees,
                Err(e) => {
                    tracing::warn!("Assignee lookup failed for task {}: {}", task.id, e);
                    task.assigned_to = Vec::new();
                }
            }
        }

        let mut state = self.state();
        if state.epoch != epoch || state.board_id != Some(board_id) {
            tracing::warn!("Dropping stale task fetch for board {}", board_id);
            return Ok(());
        }
        state.order.clear();
        for task in &tasks {
            state.order.entry(task.status).or_default().push(task.id);
        }
        state.tasks = tasks;
        Ok(())
    }

    /// Create a task. The new task appears locally only after the server
    /// acknowledges creation and returns the canonical id; it is prepended
    /// to the TODO lane.
    pub async fn create_task(&self, board_id: Uuid, name: &str) -> CoreResult<Task> {
        let name = name.trim();
        if name.is_empty() {
            return Err(self.fail(CoreError::validation("name", "Task name cannot be empty")));
        }
        let task = self
            .transport
            .create_task(board_id, name)
            .await
            .map_err(|e| self.fail(e))?;

        let mut state = self.state();
        if state.board_id == Some(board_id) {
            state
                .order
                .entry(task.status)
                .or_default()
                .insert(0, task.id);
            state.tasks.push(task.clone());
        }
        Ok(task)
    }

    /// Partial content update. Not optimistic: the cache entry is replaced
    /// with the server's canonical response when it arrives
    /// (last-response-wins).
    pub async fn update_task(&self, task_id: Uuid, patch: TaskPatch) -> CoreResult<Task> {
        if patch.is_empty() {
            return self
                .task(task_id)
                .ok_or_else(|| CoreError::not_found("task"));
        }
        let task = self
            .transport
            .update_task(task_id, &patch)
            .await
            .map_err(|e| self.fail(e))?;
        self.reconcile_task(task.clone());
        Ok(task)
    }

    /// Optimistic status move, used for drag-and-drop's immediate visual
    /// feedback: the local status flips before the server call, and on
    /// failure it reverts to its pre-mutation value.
    ///
    /// Idempotent: when the status already matches, no network call is
    /// issued at all.
    pub async fn update_task_status(&self, task_id: Uuid, status: TaskStatus) -> CoreResult<()> {
        let (prior, token) = {
            let mut state = self.state();
            let Some(task) = state.task_mut(task_id) else {
                drop(state);
                return Err(self.fail(CoreError::not_found("task")));
            };
            if task.status == status {
                return Ok(());
            }
            let prior = task.status;
            task.status = status;
            let token = state.mutations.begin(task_id);
            (prior, token)
        };

        match self.transport.update_task_status(task_id, status).await {
            Ok(()) => {
                self.state().mutations.commit(token);
                Ok(())
            }
            Err(e) => {
                let mut state = self.state();
                if let Some(task) = state.task_mut(task_id) {
                    if task.status == status {
                        task.status = prior;
                    }
                }
                state.mutations.roll_back(token);
                drop(state);
                Err(self.fail(e))
            }
        }
    }

    /// Send the full new ordering for one lane. No local change here: the
    /// caller (the reorder engine) performs the local splice before
    /// invoking this, and a failure is left as a soft inconsistency until
    /// the next full fetch.
    pub async fn reorder_column(
        &self,
        board_id: Uuid,
        status: TaskStatus,
        ordered_task_ids: &[Uuid],
    ) -> CoreResult<()> {
        self.transport
            .reorder_column(board_id, status, ordered_task_ids)
            .await
            .map_err(|e| self.fail(e))
    }

    /// Local splice of one lane's position hints
    pub fn apply_lane_order(&self, status: TaskStatus, ordered_task_ids: Vec<Uuid>) {
        self.state().order.insert(status, ordered_task_ids);
    }

    /// Replace the full assignee set of a task. The wire contract is
    /// "set", not "add/remove"; the cache takes whatever set the server
    /// echoes back.
    pub async fn set_task_assignees(&self, task_id: Uuid, user_ids: &[Uuid]) -> CoreResult<()> {
        let confirmed = self
            .transport
            .set_assignees(task_id, user_ids)
            .await
            .map_err(|e| self.fail(e))?;
        let mut state = self.state();
        if let Some(task) = state.task_mut(task_id) {
            task.assigned_to = confirmed;
        }
        Ok(())
    }

    /// Delete a task. Confirm-then-remove: the task disappears locally
    /// only after the server acknowledges.
    pub async fn delete_task(&self, task_id: Uuid) -> CoreResult<()> {
        self.transport
            .delete_task(task_id)
            .await
            .map_err(|e| self.fail(e))?;
        let mut state = self.state();
        state.tasks.retain(|t| t.id != task_id);
        for hints in state.order.values_mut() {
            hints.retain(|id| *id != task_id);
        }
        Ok(())
    }

    /// Overwrite one cache entry with a server response, if the slice
    /// still belongs to the task's board. Last-response-wins: responses
    /// are applied in arrival order, not issuance order.
    fn reconcile_task(&self, task: Task) {
        let mut state = self.state();
        if state.board_id != Some(task.board_id) {
            tracing::warn!("Dropping task response for inactive board {}", task.board_id);
            return;
        }
        match state.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(entry) => *entry = task,
            None => {
                state.order.entry(task.status).or_default().push(task.id);
                state.tasks.push(task);
            }
        }
    }
}
