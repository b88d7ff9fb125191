//! Server configuration
//!
//! Settings come from command-line flags (each with a `TSUKUROGAMI_*`
//! environment fallback) or, when `--config` is given, from a JSON file that
//! replaces the flags entirely. Either source is checked by
//! [`Config::validate`] before anything starts.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use reqwest::Url;
use serde::Deserialize;
use tsukurogami_client::Credentials;
use tsukurogami_core::instance::DEFAULT_NAME_PATTERN;

use crate::service::log_buffer::DEFAULT_CAPACITY;

const DEFAULT_XCODE_URL: &str = "https://localhost:20343";
const DEFAULT_PORT: u16 = 4444;
const DEFAULT_TRUNK_BRANCH: &str = "master";

/// Command-line interface
#[derive(Debug, Parser)]
#[command(name = "tsukurogami")]
#[command(
    about = "Provisions CI server bots for pull requests and relays build results back",
    long_about = None
)]
pub struct Cli {
    /// Base URL of the CI server
    #[arg(long, env = "TSUKUROGAMI_XCODE_URL", default_value = DEFAULT_XCODE_URL)]
    pub xcode_url: String,

    /// Base URL of the source-control server
    #[arg(long, env = "TSUKUROGAMI_BITBUCKET_URL")]
    pub bitbucket_url: Option<String>,

    /// CI server credentials, as user:password
    #[arg(long, env = "TSUKUROGAMI_XCODE_CREDENTIALS", hide_env_values = true)]
    pub xcode_credentials: Option<String>,

    /// Source-control server credentials, as user:password
    #[arg(long, env = "TSUKUROGAMI_BITBUCKET_CREDENTIALS", hide_env_values = true)]
    pub bitbucket_credentials: Option<String>,

    /// Port to listen on; also used in the status-poke scripts
    #[arg(long, env = "TSUKUROGAMI_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Skip certificate verification on both servers
    #[arg(
        long,
        env = "TSUKUROGAMI_SKIP_VERIFY",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub skip_verify: bool,

    /// Branch merged into each pull-request branch before building
    #[arg(long, env = "TSUKUROGAMI_TRUNK_BRANCH", default_value = DEFAULT_TRUNK_BRANCH)]
    pub trunk_branch: String,

    /// Name of instance bots, with {template} and {branch} placeholders
    #[arg(long, env = "TSUKUROGAMI_NAME_PATTERN", default_value = DEFAULT_NAME_PATTERN)]
    pub name_pattern: String,

    /// Number of log lines kept for GET /logs
    #[arg(long, env = "TSUKUROGAMI_LOG_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    pub log_capacity: usize,

    /// JSON file used instead of all other arguments
    #[arg(long, env = "TSUKUROGAMI_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Unvalidated settings from either source
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(rename = "xcodeURL", default = "default_xcode_url")]
    pub xcode_url: String,

    #[serde(rename = "bitbucketURL", default)]
    pub bitbucket_url: Option<String>,

    #[serde(default)]
    pub xcode_credentials: Option<String>,

    #[serde(default)]
    pub bitbucket_credentials: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_skip_verify")]
    pub skip_verify: bool,

    #[serde(default = "default_trunk_branch")]
    pub trunk_branch: String,

    #[serde(default = "default_name_pattern")]
    pub name_pattern: String,

    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
}

fn default_xcode_url() -> String {
    DEFAULT_XCODE_URL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_skip_verify() -> bool {
    true
}

fn default_trunk_branch() -> String {
    DEFAULT_TRUNK_BRANCH.to_string()
}

fn default_name_pattern() -> String {
    DEFAULT_NAME_PATTERN.to_string()
}

fn default_log_capacity() -> usize {
    DEFAULT_CAPACITY
}

/// Validated settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub xcode_url: Url,
    pub bitbucket_url: Url,
    pub xcode_credentials: Credentials,
    pub bitbucket_credentials: Credentials,
    pub port: u16,
    pub skip_verify: bool,
    pub trunk_branch: String,
    pub name_pattern: String,
    pub log_capacity: usize,
}

impl Config {
    /// Builds the configuration from parsed arguments, reading the JSON file if one was given
    pub fn load(cli: Cli) -> Result<Self> {
        match &cli.config {
            Some(path) => Self::from_file(path),
            None => Ok(Self::from(cli)),
        }
    }

    /// Reads a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Validates the configuration
    ///
    /// Every problem is reported at once so a misconfigured start needs only
    /// one round of fixes.
    pub fn validate(&self) -> Result<Settings> {
        let mut problems = Vec::new();

        let xcode_url = parse_url("xcode URL", Some(&self.xcode_url), &mut problems);
        let bitbucket_url = parse_url("bitbucket URL", self.bitbucket_url.as_deref(), &mut problems);
        let xcode_credentials = parse_credentials(
            "xcode credentials",
            self.xcode_credentials.as_deref(),
            &mut problems,
        );
        let bitbucket_credentials = parse_credentials(
            "bitbucket credentials",
            self.bitbucket_credentials.as_deref(),
            &mut problems,
        );

        if self.port == 0 {
            problems.push("port must be greater than 0".to_string());
        }

        if self.trunk_branch.trim().is_empty() {
            problems.push("trunk branch cannot be empty".to_string());
        }

        if !self.name_pattern.contains("{branch}") {
            problems.push("name pattern must contain {branch}".to_string());
        }

        if self.log_capacity == 0 {
            problems.push("log capacity must be greater than 0".to_string());
        }

        match (xcode_url, bitbucket_url, xcode_credentials, bitbucket_credentials) {
            (Some(xcode_url), Some(bitbucket_url), Some(xcode_credentials), Some(bitbucket_credentials))
                if problems.is_empty() =>
            {
                Ok(Settings {
                    xcode_url,
                    bitbucket_url,
                    xcode_credentials,
                    bitbucket_credentials,
                    port: self.port,
                    skip_verify: self.skip_verify,
                    trunk_branch: self.trunk_branch.clone(),
                    name_pattern: self.name_pattern.clone(),
                    log_capacity: self.log_capacity,
                })
            }
            _ => anyhow::bail!("invalid configuration: {}", problems.join("; ")),
        }
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            xcode_url: cli.xcode_url,
            bitbucket_url: cli.bitbucket_url,
            xcode_credentials: cli.xcode_credentials,
            bitbucket_credentials: cli.bitbucket_credentials,
            port: cli.port,
            skip_verify: cli.skip_verify,
            trunk_branch: cli.trunk_branch,
            name_pattern: cli.name_pattern,
            log_capacity: cli.log_capacity,
        }
    }
}

/// Adds `http://` when no scheme is given, as curl would
fn with_default_scheme(raw: &str) -> String {
    if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    }
}

fn parse_url(name: &str, raw: Option<&str>, problems: &mut Vec<String>) -> Option<Url> {
    let raw = match raw.map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => raw,
        None => {
            problems.push(format!("{} is required", name));
            return None;
        }
    };

    match Url::parse(&with_default_scheme(raw)) {
        Ok(url) if url.host_str().is_some() => Some(url),
        Ok(_) => {
            problems.push(format!("{} has no host: {}", name, raw));
            None
        }
        Err(e) => {
            problems.push(format!("{} is invalid ({}): {}", name, e, raw));
            None
        }
    }
}

fn parse_credentials(
    name: &str,
    raw: Option<&str>,
    problems: &mut Vec<String>,
) -> Option<Credentials> {
    match raw.filter(|r| !r.is_empty()) {
        None => {
            problems.push(format!("{} are required", name));
            None
        }
        Some(raw) => match Credentials::parse(raw) {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                problems.push(format!("{}: {}", name, e));
                None
            }
        },
    }
}

impl Settings {
    /// Base URL of the CI server without a trailing slash
    pub fn xcode_base(&self) -> String {
        self.xcode_url.as_str().trim_end_matches('/').to_string()
    }

    /// Base URL of the source-control server without a trailing slash
    pub fn bitbucket_base(&self) -> String {
        self.bitbucket_url.as_str().trim_end_matches('/').to_string()
    }

    /// Base URL the status-poke scripts call back on
    pub fn callback_url(&self, host: &str) -> String {
        format!("http://{}:{}", host, self.port)
    }
}

/// Formats an address for use as a URL host
pub fn url_host(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => format!("[{}]", v6),
    }
}

/// Finds the address the CI server can reach this process on
///
/// Opens a connection to the CI server and takes the local end's address,
/// which is the interface the operating system routes that traffic over.
/// Falls back to `localhost`.
pub async fn discover_callback_host(ci_url: &Url) -> String {
    let target = match (ci_url.host_str(), ci_url.port_or_known_default()) {
        (Some(host), Some(port)) => (host.trim_matches(['[', ']']).to_string(), port),
        _ => return "localhost".to_string(),
    };

    let connect = tokio::net::TcpStream::connect((target.0.as_str(), target.1));
    match tokio::time::timeout(Duration::from_secs(10), connect).await {
        Ok(Ok(stream)) => match stream.local_addr() {
            Ok(addr) => url_host(addr.ip()),
            Err(e) => {
                tracing::warn!("Could not read local address: {}", e);
                "localhost".to_string()
            }
        },
        Ok(Err(e)) => {
            tracing::warn!("Could not reach CI server at {}:{}: {}", target.0, target.1, e);
            "localhost".to_string()
        }
        Err(_) => {
            tracing::warn!("Timed out reaching CI server at {}:{}", target.0, target.1);
            "localhost".to_string()
        }
    }
}
