//! Load config from file and environment.

use serde::Deserialize;
use std::path::PathBuf;

/// Node configuration. File: ~/.config/peerlink/config.toml or
/// /etc/peerlink/config.toml.
/// Env overrides: PEERLINK_SERVER_ADDR, PEERLINK_PEER_PORT, PEERLINK_LOG.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Coordination server address (default 127.0.0.1:6000).
    #[serde(default = "default_server_addr")]
    pub server_addr: String,
    /// Peer serving port (default 8000; 0 disables peer serving).
    #[serde(default = "default_peer_port")]
    pub peer_port: u16,
    /// Log filter directive (default "info").
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_server_addr() -> String {
    "127.0.0.1:6000".to_string()
}
fn default_peer_port() -> u16 {
    8000
}
fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: default_server_addr(),
            peer_port: default_peer_port(),
            log_filter: default_log_filter(),
        }
    }
}

/// Load config: merge default, then config file (if present), then env vars.
pub fn load() -> Config {
    let mut c = load_file().unwrap_or_else(Config::default);
    if let Ok(s) = std::env::var("PEERLINK_SERVER_ADDR") {
        if !s.is_empty() {
            c.server_addr = s;
        }
    }
    if let Ok(s) = std::env::var("PEERLINK_PEER_PORT") {
        if let Ok(p) = s.parse::<u16>() {
            c.peer_port = p;
        }
    }
    if let Ok(s) = std::env::var("PEERLINK_LOG") {
        if !s.is_empty() {
            c.log_filter = s;
        }
    }
    c
}

fn config_paths() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut out = Vec::new();
    if let Some(h) = home {
        out.push(h.join(".config/peerlink/config.toml"));
    }
    out.push(PathBuf::from("/etc/peerlink/config.toml"));
    out
}

fn load_file() -> Option<Config> {
    for p in config_paths() {
        if p.exists() {
            if let Ok(s) = std::fs::read_to_string(&p) {
                if let Ok(c) = toml::from_str::<Config>(&s) {
                    return Some(c);
                }
            }
            break;
        }
    }
    None
}
