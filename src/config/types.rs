use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub jobs: JobsConfig,

    #[serde(default)]
    pub remux: RemuxConfig,

    #[serde(default)]
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory with the web UI assets, served with SPA fallback
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Where merged `.ts` containers are written while a job runs
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Where finished `.mp4` artifacts live until their job expires
    #[serde(default = "default_converted_dir")]
    pub converted_dir: PathBuf,
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}
fn default_converted_dir() -> PathBuf {
    PathBuf::from("converted")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            converted_dir: default_converted_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobsConfig {
    /// Age after which a job record and its artifact are reaped (default: 30 minutes)
    #[serde(default = "default_expiration")]
    pub expiration_secs: u64,

    /// How often the reaper sweeps (default: 60 seconds)
    #[serde(default = "default_reap_interval")]
    pub reap_interval_secs: u64,

    /// Jobs processed at once; 0 means unbounded
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// How long shutdown waits for in-flight jobs
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

fn default_expiration() -> u64 {
    1800
}
fn default_reap_interval() -> u64 {
    60
}
fn default_max_concurrent() -> usize {
    4
}
fn default_shutdown_grace() -> u64 {
    30
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            expiration_secs: default_expiration(),
            reap_interval_secs: default_reap_interval(),
            max_concurrent: default_max_concurrent(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

impl JobsConfig {
    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_secs)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemuxConfig {
    /// Wall-clock budget for one ffmpeg run (default: 600 seconds)
    #[serde(default = "default_remux_timeout")]
    pub timeout_secs: u64,

    /// Custom path to ffmpeg binary
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Custom path to ffprobe binary
    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,
}

fn default_remux_timeout() -> u64 {
    600
}

impl Default for RemuxConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_remux_timeout(),
            ffmpeg_path: None,
            ffprobe_path: None,
        }
    }
}

impl RemuxConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Per-request budget, covering the whole body of one segment
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_connect_timeout() -> u64 {
    10
}
fn default_request_timeout() -> u64 {
    120
}
fn default_user_agent() -> String {
    format!("hlsforged/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl FetchConfig {
    /// Build the HTTP client used for manifests and segments.
    pub fn build_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .user_agent(&self.user_agent)
            .build()
    }
}
