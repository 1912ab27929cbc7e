//! HTTP implementation of the task service API

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::wire::{
    endpoints, AddTaskRequest, DeleteRequest, Envelope, ErrorBody, LoginRequest, SignupRequest,
    StatusRequest, TaskData, TaskListData, UpdateTaskRequest,
};
use super::TodoApi;
use crate::config::ClientConfig;
use crate::session::{AuthPayload, Identity};
use crate::task::{Task, TaskStatus};
use crate::{Error, Result};

/// Talks JSON to the hosted service. No retries, no caching.
#[derive(Debug, Clone)]
pub struct HttpTodoApi {
    client: Client,
    base_url: String,
}

impl HttpTodoApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder, identity: &Identity) -> RequestBuilder {
        match &identity.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send one request and decode its envelope.
    ///
    /// Non-success statuses become [`Error::Status`]; bodies that are not a
    /// valid envelope become [`Error::InvalidResponse`].
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<Envelope<T>> {
        debug!("Sending {} request", operation);

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .filter(|msg| !msg.trim().is_empty())
                .unwrap_or_else(|| format!("Something went wrong ({})", status.as_u16()));
            warn!("{} failed with status {}: {}", operation, status, message);
            return Err(Error::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            warn!("{} returned an unreadable body: {}", operation, e);
            Error::InvalidResponse(e.to_string())
        })
    }
}

#[async_trait]
impl TodoApi for HttpTodoApi {
    async fn signup(&self, request: &SignupRequest) -> Result<AuthPayload> {
        let req = self.client.post(self.url(endpoints::SIGNUP)).json(request);
        self.send::<AuthPayload>("signup", req)
            .await?
            .into_data("Registration failed")
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthPayload> {
        let req = self
            .client
            .post(self.url(endpoints::LOGIN))
            .json(&LoginRequest { email, password });
        self.send::<AuthPayload>("login", req)
            .await?
            .into_data("Login failed")
    }

    async fn list_tasks(
        &self,
        identity: &Identity,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Task>> {
        let mut req = self.client.get(self.url(endpoints::LIST_TASKS));
        if let Some(status) = status {
            req = req.query(&[("status", status.as_str())]);
        }
        let req = self.authorized(req, identity);
        let data = self
            .send::<TaskListData>("list tasks", req)
            .await?
            .into_data("Failed to fetch tasks")?;
        Ok(data.todos)
    }

    async fn add_task(&self, identity: &Identity, title: &str, description: &str) -> Result<Task> {
        let req = self
            .client
            .post(self.url(endpoints::ADD_TASK))
            .json(&AddTaskRequest { title, description });
        let req = self.authorized(req, identity);
        let data = self
            .send::<TaskData>("add task", req)
            .await?
            .into_data("Failed to add task")?;
        Ok(data.todo)
    }

    async fn update_task(
        &self,
        identity: &Identity,
        id: &str,
        title: &str,
        description: &str,
    ) -> Result<Task> {
        let req = self
            .client
            .put(self.url(endpoints::UPDATE_TASK))
            .json(&UpdateTaskRequest {
                id,
                title,
                description,
            });
        let req = self.authorized(req, identity);
        let data = self
            .send::<TaskData>("update task", req)
            .await?
            .into_data("Failed to update task")?;
        Ok(data.todo)
    }

    async fn set_task_status(
        &self,
        identity: &Identity,
        id: &str,
        status: TaskStatus,
    ) -> Result<Task> {
        let req = self
            .client
            .put(self.url(endpoints::SET_STATUS))
            .json(&StatusRequest { id, status });
        let req = self.authorized(req, identity);
        let data = self
            .send::<TaskData>("set task status", req)
            .await?
            .into_data("Failed to update task status")?;
        Ok(data.todo)
    }

    async fn delete_task(&self, identity: &Identity, id: &str) -> Result<()> {
        let req = self
            .client
            .delete(self.url(endpoints::DELETE_TASK))
            .json(&DeleteRequest { id });
        let req = self.authorized(req, identity);
        self.send::<serde_json::Value>("delete task", req)
            .await?
            .check("Failed to delete task")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{delete, get, post, put};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn spawn_service(router: Router) -> HttpTodoApi {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        HttpTodoApi::new(&ClientConfig::default().with_base_url(format!("http://{}", addr)))
            .unwrap()
    }

    fn identity() -> Identity {
        Identity {
            id: "7".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            token: Some("tok-7".into()),
        }
    }

    fn task_json(id: u32, title: &str, status: &str) -> Value {
        json!({
            "id": id,
            "title": title,
            "description": "",
            "status": status,
            "createdAt": "2024-05-01 09:00:00",
            "updatedAt": "2024-05-01 09:00:00"
        })
    }

    fn bearer(headers: &HeaderMap) -> Option<String> {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    #[tokio::test]
    async fn test_login_success() {
        let router = Router::new().route(
            endpoints::LOGIN,
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["email"], "ada@example.com");
                assert_eq!(body["password"], "secret1");
                Json(json!({
                    "success": true,
                    "data": {
                        "user": {"id": 7, "firstName": "Ada", "lastName": "Lovelace",
                                 "email": "ada@example.com"},
                        "token": "tok-7"
                    }
                }))
            }),
        );
        let api = spawn_service(router).await;

        let identity = api
            .login("ada@example.com", "secret1")
            .await
            .unwrap()
            .into_identity();
        assert_eq!(identity, self::identity());
    }

    #[tokio::test]
    async fn test_login_application_failure() {
        let router = Router::new().route(
            endpoints::LOGIN,
            post(|| async { Json(json!({"success": false, "error": "Invalid credentials"})) }),
        );
        let api = spawn_service(router).await;

        let err = api.login("ada@example.com", "wrong").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Application);
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn test_status_failure_uses_body_message() {
        let router = Router::new().route(
            endpoints::SIGNUP,
            post(|| async {
                (
                    StatusCode::CONFLICT,
                    Json(json!({"success": false, "error": "Email already registered"})),
                )
            }),
        );
        let api = spawn_service(router).await;

        let err = api
            .signup(&SignupRequest {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "ada@example.com".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap_err();
        match err {
            Error::Status { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "Email already registered");
            }
            e => panic!("Expected Status error, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_status_failure_without_json_body() {
        let router = Router::new().route(
            endpoints::LIST_TASKS,
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>") }),
        );
        let api = spawn_service(router).await;

        let err = api.list_tasks(&identity(), None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert_eq!(err.to_string(), "Something went wrong (500)");
    }

    #[tokio::test]
    async fn test_unreadable_success_body() {
        let router = Router::new().route(
            endpoints::LIST_TASKS,
            get(|| async { "not json" }),
        );
        let api = spawn_service(router).await;

        let err = api.list_tasks(&identity(), None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_list_sends_token_and_status_filter() {
        let router = Router::new().route(
            endpoints::LIST_TASKS,
            get(
                |headers: HeaderMap, Query(params): Query<HashMap<String, String>>| async move {
                    if bearer(&headers).as_deref() != Some("Bearer tok-7") {
                        return (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({"success": false, "error": "Unauthorized"})),
                        );
                    }
                    let todos = match params.get("status").map(String::as_str) {
                        Some("completed") => vec![task_json(2, "Done thing", "inactive")],
                        Some(_) => vec![task_json(1, "Open thing", "active")],
                        None => vec![
                            task_json(1, "Open thing", "active"),
                            task_json(2, "Done thing", "inactive"),
                        ],
                    };
                    (
                        StatusCode::OK,
                        Json(json!({"success": true, "data": {"todos": todos}})),
                    )
                },
            ),
        );
        let api = spawn_service(router).await;

        let all = api.list_tasks(&identity(), None).await.unwrap();
        assert_eq!(all.len(), 2);

        let completed = api
            .list_tasks(&identity(), Some(TaskStatus::Completed))
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].status, TaskStatus::Completed);

        let mut anonymous = identity();
        anonymous.token = None;
        let err = api.list_tasks(&anonymous, None).await.unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized");
    }

    #[tokio::test]
    async fn test_task_mutations() {
        let router = Router::new()
            .route(
                endpoints::ADD_TASK,
                post(|Json(body): Json<Value>| async move {
                    let mut todo = task_json(10, body["title"].as_str().unwrap_or(""), "active");
                    todo["description"] = body["description"].clone();
                    Json(json!({"success": true, "data": {"todo": todo}}))
                }),
            )
            .route(
                endpoints::UPDATE_TASK,
                put(|Json(body): Json<Value>| async move {
                    let mut todo = task_json(10, body["title"].as_str().unwrap_or(""), "active");
                    todo["id"] = body["id"].clone();
                    Json(json!({"success": true, "data": {"todo": todo}}))
                }),
            )
            .route(
                endpoints::SET_STATUS,
                put(|Json(body): Json<Value>| async move {
                    let status = body["status"].as_str().unwrap_or("active").to_string();
                    let todo = task_json(10, "Buy milk", &status);
                    Json(json!({"success": true, "data": {"todo": todo}}))
                }),
            )
            .route(
                endpoints::DELETE_TASK,
                delete(|Json(body): Json<Value>| async move {
                    if body["id"] == "10" {
                        Json(json!({"success": true}))
                    } else {
                        Json(json!({"success": false, "error": "Task not found"}))
                    }
                }),
            );
        let api = spawn_service(router).await;
        let who = identity();

        let created = api.add_task(&who, "Buy milk", "2 litres").await.unwrap();
        assert_eq!(created.id, "10");
        assert_eq!(created.description, "2 litres");

        let updated = api
            .update_task(&who, "10", "Buy oat milk", "")
            .await
            .unwrap();
        assert_eq!(updated.id, "10");
        assert_eq!(updated.title, "Buy oat milk");

        let done = api
            .set_task_status(&who, "10", TaskStatus::Completed)
            .await
            .unwrap();
        assert_eq!(done.status, TaskStatus::Completed);

        api.delete_task(&who, "10").await.unwrap();
        let err = api.delete_task(&who, "11").await.unwrap_err();
        assert_eq!(err.to_string(), "Task not found");
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = HttpTodoApi::new(
            &ClientConfig::default().with_base_url(format!("http://{}", addr)),
        )
        .unwrap();
        let err = api.login("ada@example.com", "secret1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(!err.to_string().is_empty());
    }
}
