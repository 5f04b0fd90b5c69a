use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

pub const DATABASE_PATH_ENV: &str = "KNIT_DATABASE_PATH";
pub const DEV_USER_ENV: &str = "KNIT_DEV_USER";

#[derive(Parser, Debug, Default)]
#[command(name = "knit", about = "Communities, events and mentorship for every generation")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Load demo communities, people and events into an empty database
    #[arg(long)]
    pub seed: bool,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub map: MapConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    /// Request header carrying the caller's profile id
    pub user_header: String,
    /// Acts as this profile when the header is missing. Local development only.
    pub dev_user: Option<String>,
}

/// Raster tile source and initial viewport for the events map
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub tile_url: String,
    pub attribution: String,
    pub center_lat: f64,
    pub center_lng: f64,
    pub zoom: u8,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: "x-knit-user".to_string(),
            dev_user: None,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tile_url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; OpenStreetMap contributors".to_string(),
            center_lat: 37.7749,
            center_lng: -122.4194,
            zoom: 11,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        Self::load_with_env(cli, |key| std::env::var(key).ok())
    }

    /// Same as `load`, with the environment supplied by the caller
    pub fn load_with_env(
        cli: &Cli,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // Environment overrides
        if let Some(path) = env(DATABASE_PATH_ENV).filter(|v| !v.is_empty()) {
            config.database.path = Some(PathBuf::from(path));
        }
        if let Some(user) = env(DEV_USER_ENV).filter(|v| !v.is_empty()) {
            config.auth.dev_user = Some(user);
        }

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("knit.db"));
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".knit")
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("knit.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn cli_in(dir: &std::path::Path) -> Cli {
        Cli {
            data_dir: Some(dir.to_path_buf()),
            ..Cli::default()
        }
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.user_header, "x-knit-user");
        assert!(config.auth.dev_user.is_none());
        assert!(config.database.path.is_none());
        assert_eq!(config.map.zoom, 11);
        assert!(config.map.tile_url.contains("{z}/{x}/{y}"));
    }

    #[test]
    fn data_dir_uses_cli_override() {
        let cli = Cli {
            data_dir: Some(PathBuf::from("/tmp/test-knit")),
            ..Cli::default()
        };
        assert_eq!(Config::data_dir(&cli), PathBuf::from("/tmp/test-knit"));
    }

    #[test]
    fn data_dir_defaults_to_home_dot_knit() {
        let dir = Config::data_dir(&Cli::default());
        assert!(dir.ends_with(".knit"));
    }

    #[test]
    fn load_with_no_config_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load_with_env(&cli_in(tmp.path()), no_env).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.db_path(), tmp.path().join("knit.db"));
    }

    #[test]
    fn load_applies_cli_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = Cli {
            host: Some("127.0.0.1".to_string()),
            port: Some(8080),
            ..cli_in(tmp.path())
        };
        let config = Config::load_with_env(&cli, no_env).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn load_reads_toml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
host = "192.168.1.1"
port = 9000

[auth]
user_header = "x-forwarded-user"
dev_user = "profile-alex"

[map]
tile_url = "https://tiles.example.com/{z}/{x}/{y}.png"
zoom = 13
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            ..cli_in(tmp.path())
        };
        let config = Config::load_with_env(&cli, no_env).unwrap();
        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.user_header, "x-forwarded-user");
        assert_eq!(config.auth.dev_user.as_deref(), Some("profile-alex"));
        assert_eq!(config.map.zoom, 13);
        // Unset keys keep their defaults
        assert_eq!(config.map.center_lat, 37.7749);
    }

    #[test]
    fn environment_overrides_toml_but_not_cli() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
port = 9000

[database]
path = "/from/toml.db"
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            port: Some(4000),
            ..cli_in(tmp.path())
        };
        let config = Config::load_with_env(&cli, |key| match key {
            DATABASE_PATH_ENV => Some("/from/env.db".to_string()),
            DEV_USER_ENV => Some("profile-sam".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.db_path(), PathBuf::from("/from/env.db"));
        assert_eq!(config.auth.dev_user.as_deref(), Some("profile-sam"));
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn empty_environment_values_are_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load_with_env(&cli_in(tmp.path()), |_| Some(String::new())).unwrap();
        assert_eq!(config.db_path(), tmp.path().join("knit.db"));
        assert!(config.auth.dev_user.is_none());
    }
}
