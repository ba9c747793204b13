use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8808";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_DEFAULT_LOCATION: &str = "malappuram";
const DEFAULT_SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;
const SNAPSHOT_FILE_NAME: &str = "servicemart.json";

/// Resolved server configuration: CLI arguments override the optional config
/// file, which overrides built-in defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_bind_address: SocketAddr,
    pub data_dir: PathBuf,
    /// Run without a snapshot file; state is lost on exit.
    pub ephemeral: bool,
    pub admin_username: String,
    pub admin_password: String,
    pub session_ttl_secs: u64,
    /// Slug the presentation layer falls back to when a visitor has not
    /// picked a location yet. The resolver itself stays filter-neutral.
    pub default_location: String,
    pub contact_phone: Option<String>,
    pub graceful_shutdown_timeout_secs: u64,
}

impl ServerConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            bind: cli_bind,
            data_dir: cli_data_dir,
            ephemeral: cli_ephemeral,
            admin_username: cli_admin_username,
            admin_password: cli_admin_password,
            session_ttl_secs: cli_session_ttl,
            default_location: cli_default_location,
            contact_phone: cli_contact_phone,
            shutdown_timeout_secs: cli_shutdown_timeout,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            bind: file_bind,
            data_dir: file_data_dir,
            ephemeral: file_ephemeral,
            admin_username: file_admin_username,
            admin_password: file_admin_password,
            session_ttl_secs: file_session_ttl,
            default_location: file_default_location,
            contact_phone: file_contact_phone,
            shutdown_timeout_secs: file_shutdown_timeout,
        } = file_config;

        let http_bind_address = cli_bind.or(file_bind).unwrap_or_else(|| {
            DEFAULT_HTTP_BIND
                .parse()
                .expect("default bind address valid")
        });

        let data_dir = cli_data_dir
            .or(file_data_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let default_location = cli_default_location
            .or(file_default_location)
            .unwrap_or_else(|| DEFAULT_DEFAULT_LOCATION.to_string())
            .to_ascii_lowercase();

        Ok(Self {
            http_bind_address,
            data_dir,
            ephemeral: cli_ephemeral || file_ephemeral.unwrap_or(false),
            admin_username: cli_admin_username
                .or(file_admin_username)
                .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string()),
            admin_password: cli_admin_password.or(file_admin_password).unwrap_or_default(),
            session_ttl_secs: cli_session_ttl
                .or(file_session_ttl)
                .unwrap_or(DEFAULT_SESSION_TTL_SECS)
                .max(60),
            default_location,
            contact_phone: cli_contact_phone.or(file_contact_phone),
            graceful_shutdown_timeout_secs: cli_shutdown_timeout
                .or(file_shutdown_timeout)
                .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        })
    }

    /// Fail-fast validation run before server startup.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.admin_username.trim().is_empty(),
            "admin username must not be empty"
        );
        anyhow::ensure!(
            !self.admin_password.is_empty(),
            "admin password must be set (--admin-password or SERVICEMART_ADMIN_PASSWORD)"
        );
        anyhow::ensure!(
            crate::slug::is_valid_slug(&self.default_location),
            "default location {:?} is not a valid slug",
            self.default_location
        );
        Ok(())
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE_NAME)
    }
}

#[derive(Parser, Debug, Default, Clone)]
#[command(name = "servicemart", about = "Local-services marketplace server", version)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "SERVICEMART_BIND",
        value_name = "ADDR",
        help = "HTTP bind address"
    )]
    pub bind: Option<SocketAddr>,

    #[arg(
        long,
        env = "SERVICEMART_DATA_DIR",
        value_name = "DIR",
        help = "Directory holding the store snapshot"
    )]
    pub data_dir: Option<PathBuf>,

    #[arg(long, help = "Keep all state in memory (no snapshot file)")]
    pub ephemeral: bool,

    #[arg(
        long,
        env = "SERVICEMART_ADMIN_USER",
        value_name = "NAME",
        help = "Bootstrap admin username"
    )]
    pub admin_username: Option<String>,

    #[arg(
        long,
        env = "SERVICEMART_ADMIN_PASSWORD",
        value_name = "PASSWORD",
        help = "Bootstrap admin password",
        hide_env_values = true
    )]
    pub admin_password: Option<String>,

    #[arg(
        long,
        env = "SERVICEMART_SESSION_TTL",
        value_name = "SECS",
        help = "Admin session lifetime in seconds"
    )]
    pub session_ttl_secs: Option<u64>,

    #[arg(
        long,
        env = "SERVICEMART_DEFAULT_LOCATION",
        value_name = "SLUG",
        help = "Location slug catalog entries default to"
    )]
    pub default_location: Option<String>,

    #[arg(
        long,
        env = "SERVICEMART_CONTACT_PHONE",
        value_name = "PHONE",
        help = "Default contact phone surfaced to customers"
    )]
    pub contact_phone: Option<String>,

    #[arg(
        long,
        env = "SERVICEMART_SHUTDOWN_TIMEOUT",
        value_name = "SECS",
        help = "Graceful shutdown budget in seconds"
    )]
    pub shutdown_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    bind: Option<SocketAddr>,
    data_dir: Option<PathBuf>,
    ephemeral: Option<bool>,
    admin_username: Option<String>,
    admin_password: Option<String>,
    session_ttl_secs: Option<u64>,
    default_location: Option<String>,
    contact_phone: Option<String>,
    shutdown_timeout_secs: Option<u64>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
