//! HTTP Transport
//!
//! The reqwest binding of the [`Transport`] trait. Attaches the bearer
//! token from [`Config`] to every request and maps response statuses onto
//! the core error taxonomy: 401/403 are authorization failures (surfaced,
//! never fatal), 404 means the entity vanished server-side, and everything
//! else non-2xx is a network error carrying the status and body text.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::client::config::Config;
use crate::client::transport::Transport;
use crate::shared::{
    BoardDto, BoardRole, CoreError, CoreResult, RawMember, Task, TaskPatch, TaskStatus,
    UserProfile,
};

/// One entry of the assignee list endpoints' response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssigneeEntry {
    user_id: Uuid,
}

/// REST client for the task-board backend
pub struct HttpTransport {
    config: Config,
    client: Client,
}

impl HttpTransport {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.get_token() {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> CoreResult<Response> {
        let response = self.authorize(request).send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(error_for(response).await)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> CoreResult<T> {
        let response = self.send(request).await?;
        let value = response.json::<T>().await.map_err(|e| {
            CoreError::serialization(format!("Failed to parse response: {}", e))
        })?;
        Ok(value)
    }

    async fn send_unit(&self, request: RequestBuilder) -> CoreResult<()> {
        self.send(request).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        self.config.api_url(path)
    }
}

async fn error_for(response: Response) -> CoreError {
    let status = response.status();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| status.to_string());
    match status.as_u16() {
        401 | 403 => CoreError::authorization(format!("{} - {}", status, text)),
        404 => CoreError::not_found(text),
        _ => CoreError::network(format!("Request failed: {} - {}", status, text)),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn list_boards(&self) -> CoreResult<Vec<BoardDto>> {
        self.send_json(self.client.get(self.url("boards"))).await
    }

    async fn create_board(&self, name: &str) -> CoreResult<BoardDto> {
        let body = json!({ "name": name });
        self.send_json(self.client.post(self.url("boards")).json(&body))
            .await
    }

    async fn rename_board(&self, board_id: Uuid, name: &str) -> CoreResult<()> {
        let url = self.url(&format!("boards/{}", board_id));
        self.send_unit(self.client.patch(url).json(&json!({ "name": name })))
            .await
    }

    async fn delete_board(&self, board_id: Uuid) -> CoreResult<()> {
        let url = self.url(&format!("boards/{}", board_id));
        self.send_unit(self.client.delete(url)).await
    }

    async fn list_members(&self, board_id: Uuid) -> CoreResult<Vec<RawMember>> {
        let url = self.url(&format!("boards/{}/members", board_id));
        self.send_json(self.client.get(url)).await
    }

    async fn lookup_users(&self, ids: &[Uuid]) -> CoreResult<Vec<UserProfile>> {
        let url = self.url("auth/users/batch");
        self.send_json(self.client.post(url).json(&json!({ "ids": ids })))
            .await
    }

    async fn search_users(&self, query: &str) -> CoreResult<Vec<UserProfile>> {
        let url = self.url("auth/users/search");
        self.send_json(self.client.get(url).query(&[("q", query)]))
            .await
    }

    async fn share_board(&self, board_id: Uuid, user_id: Uuid, role: BoardRole) -> CoreResult<()> {
        let body = json!({ "userId": user_id, "role": role });
        let url = self.url(&format!("boards/{}/share", board_id));
        self.send_unit(self.client.post(url).json(&body)).await
    }

    async fn update_member_role(
        &self,
        board_id: Uuid,
        user_id: Uuid,
        role: BoardRole,
    ) -> CoreResult<()> {
        let url = self.url(&format!("boards/{}/members/{}", board_id, user_id));
        self.send_unit(self.client.patch(url).json(&json!({ "role": role })))
            .await
    }

    async fn remove_member(&self, board_id: Uuid, user_id: Uuid) -> CoreResult<()> {
        let url = self.url(&format!("boards/{}/members/{}", board_id, user_id));
        self.send_unit(self.client.delete(url)).await
    }

    async fn list_tasks(&self, board_id: Uuid) -> CoreResult<Vec<Task>> {
        let url = self.url(&format!("tasks/board/{}", board_id));
        self.send_json(self.client.get(url)).await
    }

    async fn create_task(&self, board_id: Uuid, name: &str) -> CoreResult<Task> {
        let body = json!({ "boardId": board_id, "name": name });
        self.send_json(self.client.post(self.url("tasks")).json(&body))
            .await
    }

    async fn update_task(&self, task_id: Uuid, patch: &TaskPatch) -> CoreResult<Task> {
        let url = self.url(&format!("tasks/{}", task_id));
        self.send_json(self.client.patch(url).json(&patch.to_body()))
            .await
    }

    async fn update_task_status(&self, task_id: Uuid, status: TaskStatus) -> CoreResult<()> {
        let url = self.url(&format!("tasks/{}/status", task_id));
        self.send_unit(self.client.patch(url).json(&json!({ "status": status })))
            .await
    }

    async fn reorder_column(
        &self,
        board_id: Uuid,
        status: TaskStatus,
        ordered_task_ids: &[Uuid],
    ) -> CoreResult<()> {
        let body = json!({ "status": status, "orderedTaskIds": ordered_task_ids });
        let url = self.url(&format!("tasks/board/{}/reorder", board_id));
        self.send_unit(self.client.patch(url).json(&body)).await
    }

    async fn get_assignees(&self, task_id: Uuid) -> CoreResult<Vec<Uuid>> {
        let url = self.url(&format!("tasks/{}/assignees", task_id));
        let entries: Vec<AssigneeEntry> = self.send_json(self.client.get(url)).await?;
        Ok(entries.into_iter().map(|entry| entry.user_id).collect())
    }

    async fn set_assignees(&self, task_id: Uuid, user_ids: &[Uuid]) -> CoreResult<Vec<Uuid>> {
        let body = json!({ "userIds": user_ids });
        let url = self.url(&format!("tasks/{}/assignees", task_id));
        let entries: Vec<AssigneeEntry> =
            self.send_json(self.client.patch(url).json(&body)).await?;
        Ok(entries.into_iter().map(|entry| entry.user_id).collect())
    }

    async fn delete_task(&self, task_id: Uuid) -> CoreResult<()> {
        let url = self.url(&format!("tasks/{}", task_id));
        self.send_unit(self.client.delete(url)).await
    }
}
