use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use ::common::LocalStorageConfig;
use ::common::storage::LocalStorage;
use reqwest::Client;
use sea_orm::DbErr;
use serde_json::Value;

use keepsy_server::config::{
    AppConfig, CorsConfig, DatabaseConfig, ServerConfig, StorageBackendKind, StorageConfig,
};
use keepsy_server::entity::bill;
use keepsy_server::repository::{BillRepository, NewBill, RepositoryError, UserResolver};
use keepsy_server::service::BillService;
use keepsy_server::state::AppState;

/// Upload limit used by every test server.
pub const MAX_UPLOAD_SIZE: u64 = 1024;

pub const ALICE: i32 = 42;
pub const BOB: i32 = 7;
pub const UNKNOWN_USER: i32 = 999;

pub mod routes {
    pub const BILLS: &str = "/api/v1/bills";
    pub const HEALTH: &str = "/health";

    pub fn bills_of(user_id: i32) -> String {
        format!("/api/v1/bills?user_id={user_id}")
    }

    pub fn bill(id: i64, user_id: i32) -> String {
        format!("/api/v1/bills/{id}?user_id={user_id}")
    }

    pub fn bill_download(id: i64, user_id: i32) -> String {
        format!("/api/v1/bills/{id}/download?user_id={user_id}")
    }
}

/// In-memory bill table standing in for the database.
#[derive(Default)]
pub struct MemoryBills {
    rows: Mutex<Vec<bill::Model>>,
    fail_create: bool,
}

#[async_trait]
impl BillRepository for MemoryBills {
    async fn create(&self, bill: NewBill) -> Result<bill::Model, RepositoryError> {
        if self.fail_create {
            return Err(RepositoryError::Database(DbErr::Custom(
                "insert rejected".into(),
            )));
        }
        let mut rows = self.rows.lock().unwrap();
        let model = bill::Model {
            id: rows.len() as i32 + 1,
            user_id: bill.user_id,
            category_id: bill.category_id,
            product_id: bill.product_id,
            name: bill.name,
            file_url: bill.file_url.into_string(),
            file_type: bill.file_type,
            amount: bill.amount,
            due_date: bill.due_date,
            created_at: bill.created_at,
            updated_at: bill.created_at,
        };
        rows.push(model.clone());
        Ok(model)
    }

    async fn list_by_owner(&self, user_id: i32) -> Result<Vec<bill::Model>, RepositoryError> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> Result<bill::Model, RepositoryError> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("Bill {id}")))
    }
}

pub struct MemoryUsers(HashMap<i32, String>);

#[async_trait]
impl UserResolver for MemoryUsers {
    async fn resolve_external_id(&self, user_id: i32) -> Result<String, RepositoryError> {
        self.0
            .get(&user_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("User {user_id}")))
    }
}

/// A running test server backed by in-memory repositories and a temp-dir
/// local storage backend.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub upload_dir: PathBuf,
    _temp: tempfile::TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    pub location: Option<String>,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let location = res
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let text = res.text().await.expect("Failed to read response body");
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            location,
            text,
            body,
        }
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(MemoryBills::default()).await
    }

    /// Spawn a server whose repository rejects every insert.
    pub async fn spawn_with_failing_inserts() -> Self {
        Self::spawn_with(MemoryBills {
            fail_create: true,
            ..Default::default()
        })
        .await
    }

    async fn spawn_with(bills: MemoryBills) -> Self {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let upload_dir = temp.path().join("uploads");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        let local = LocalStorageConfig {
            base_path: upload_dir.clone(),
            base_url: format!("http://{addr}/uploads"),
            serve_path: "/uploads".to_string(),
        };
        let storage = LocalStorage::from_config(&local)
            .await
            .expect("Failed to create local storage");

        let users = MemoryUsers(HashMap::from([
            (ALICE, "3f1c2b9e-0000-4000-8000-000000000042".to_string()),
            (BOB, "3f1c2b9e-0000-4000-8000-000000000007".to_string()),
        ]));

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: "postgres://unused".to_string(),
            },
            storage: StorageConfig {
                backend: StorageBackendKind::Local,
                max_upload_size: MAX_UPLOAD_SIZE,
                local,
                s3: None,
            },
        };

        let state = AppState {
            bills: Arc::new(BillService::new(
                Arc::new(bills),
                Arc::new(users),
                Arc::new(storage),
            )),
            config: app_config,
        };

        let app = keepsy_server::build_router(state);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("Failed to build HTTP client"),
            upload_dir,
            _temp: temp,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.get_url(&self.url(path)).await
    }

    pub async fn get_url(&self, url: &str) -> TestResponse {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    /// Upload a bill with the given text fields alongside the file part.
    pub async fn upload(
        &self,
        file: Option<(&str, Vec<u8>)>,
        fields: &[(&str, &str)],
    ) -> TestResponse {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in fields {
            form = form.text(name.to_string(), value.to_string());
        }
        if let Some((file_name, bytes)) = file {
            let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
            form = form.part("file", part);
        }

        let res = self
            .client
            .post(self.url(routes::BILLS))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send upload request");

        TestResponse::from_response(res).await
    }

    /// Upload `file_name` for `user_id` and return the created bill's id.
    pub async fn upload_bill(&self, user_id: i32, file_name: &str, bytes: &[u8]) -> i64 {
        let res = self
            .upload(
                Some((file_name, bytes.to_vec())),
                &[("user_id", &user_id.to_string())],
            )
            .await;
        assert_eq!(res.status, 201, "upload failed: {}", res.text);
        res.body["id"].as_i64().unwrap()
    }

    /// Number of regular files below the upload directory.
    pub fn stored_file_count(&self) -> usize {
        count_files(&self.upload_dir)
    }
}

fn count_files(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(Result::ok)
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}
