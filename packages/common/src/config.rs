use std::path::PathBuf;

use serde::Deserialize;

/// Local filesystem backend configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct LocalStorageConfig {
    /// Directory uploaded files are written to. Default: "./uploads".
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,
    /// Public URL prefix the stored files are reachable under.
    /// Default: "http://localhost:8080/uploads".
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Route the server mounts the base directory on. Default: "/uploads".
    #[serde(default = "default_serve_path")]
    pub serve_path: String,
}

fn default_base_path() -> PathBuf {
    PathBuf::from("./uploads")
}
fn default_base_url() -> String {
    "http://localhost:8080/uploads".into()
}
fn default_serve_path() -> String {
    "/uploads".into()
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            base_url: default_base_url(),
            serve_path: default_serve_path(),
        }
    }
}

/// S3-compatible object store configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ObjectStorageConfig {
    pub bucket: String,
    /// Region name. Default: "us-east-1".
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint (MinIO, R2, ...). When unset the AWS endpoint for
    /// `region` is used.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Use path-style addressing. Required by most self-hosted stores.
    #[serde(default)]
    pub path_style: bool,
    /// Prefix prepended to every object key. Default: "".
    #[serde(default)]
    pub key_prefix: String,
    /// Lifetime of presigned download URLs. Default: 900 seconds.
    #[serde(default = "default_presign_expiry_secs")]
    pub presign_expiry_secs: u32,
}

fn default_region() -> String {
    "us-east-1".into()
}
fn default_presign_expiry_secs() -> u32 {
    900
}
