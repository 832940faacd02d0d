use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

/// Runtime configuration for the listener and its collaborators.
///
/// Every field has a default; a configuration file is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Socket the SMTP listener binds, all interfaces by default.
    pub socket: SocketAddr,
    /// Hostname announced in the service greeting.
    pub banner: String,
    /// Slack channel that receives summaries, links and files.
    pub channel: String,
    /// Directory attachments are staged in before upload.
    pub staging_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket: ([0, 0, 0, 0], 2525).into(),
            banner: "mailsink".to_string(),
            channel: "#general".to_string(),
            staging_dir: std::env::temp_dir(),
        }
    }
}

impl Config {
    /// Load the configuration using the following precedence:
    /// 1. `MAILSINK_CONFIG` environment variable
    /// 2. ./mailsink.toml (current working directory)
    /// 3. built-in defaults
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(env_path) = std::env::var("MAILSINK_CONFIG") {
            let path = PathBuf::from(env_path);
            if !path.exists() {
                anyhow::bail!(
                    "MAILSINK_CONFIG points to non-existent file: {}",
                    path.display()
                );
            }
            return Self::from_file(&path);
        }

        let default_path = PathBuf::from("./mailsink.toml");
        if default_path.exists() {
            return Self::from_file(&default_path);
        }

        Ok(Self::default())
    }

    fn from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config from {}: {}", path.display(), e)
        })?;
        Ok(toml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.socket, "0.0.0.0:2525".parse().unwrap());
        assert_eq!(config.channel, "#general");
        assert_eq!(config.banner, "mailsink");
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r##"
            socket = "127.0.0.1:2525"
            channel = "#mail"
            "##,
        )
        .unwrap();

        assert_eq!(config.socket, "127.0.0.1:2525".parse().unwrap());
        assert_eq!(config.channel, "#mail");
        assert_eq!(config.banner, "mailsink");
    }
}
