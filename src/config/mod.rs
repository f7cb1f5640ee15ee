use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fmt, fs, io,
    path::{Path, PathBuf},
};

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_WARNING_THRESHOLD: u64 = 2_000_000_000;
pub const DEFAULT_DANGER_THRESHOLD: u64 = 1_000_000_000;
pub const DEFAULT_FEES: &str = "20000upokt";

/// Parsed `config.toml`. Loaded once at startup and never written back.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub keyring_backend: Option<String>,
    #[serde(default)]
    pub home: Option<PathBuf>,
    #[serde(default = "default_fetch_balances")]
    pub fetch_balances: bool,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub networks: BTreeMap<String, Network>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Network {
    pub rpc_endpoint: String,
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub gateways: Vec<String>,
    #[serde(default)]
    pub applications: Vec<String>,
    #[serde(default)]
    pub bank: Option<String>,
    #[serde(default)]
    pub fees: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_warning")]
    pub warning: u64,
    #[serde(default = "default_danger")]
    pub danger: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning: DEFAULT_WARNING_THRESHOLD,
            danger: DEFAULT_DANGER_THRESHOLD,
        }
    }
}

fn default_fetch_balances() -> bool {
    true
}

fn default_warning() -> u64 {
    DEFAULT_WARNING_THRESHOLD
}

fn default_danger() -> u64 {
    DEFAULT_DANGER_THRESHOLD
}

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    NoNetworks,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse {}: {source}", path.display())
            }
            ConfigError::NoNetworks => f.write_str("no networks found in config"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::NoNetworks => None,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        if config.networks.is_empty() {
            return Err(ConfigError::NoNetworks);
        }
        Ok(config)
    }

    pub fn network(&self, name: &str) -> Option<&Network> {
        self.networks.get(name)
    }

    pub fn network_names(&self) -> Vec<String> {
        self.networks.keys().cloned().collect()
    }

    /// Home directory handed to the client as `--home`.
    pub fn client_home(&self) -> PathBuf {
        if let Some(home) = &self.home {
            return home.clone();
        }
        let base = std::env::var_os("HOME")
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        base.join(".pocket")
    }
}

impl Network {
    pub fn chain_id<'a>(&'a self, name: &'a str) -> &'a str {
        self.chain_id.as_deref().unwrap_or(name)
    }

    pub fn fees(&self) -> &str {
        self.fees.as_deref().unwrap_or(DEFAULT_FEES)
    }

    pub fn funding_account(&self) -> Option<&str> {
        self.bank.as_deref().filter(|bank| !bank.trim().is_empty())
    }
}

/// Resolve the config path from `$APPSTAKE_TUI_CONFIG`, the first CLI argument,
/// or the working directory default.
pub fn resolve_path() -> PathBuf {
    if let Ok(explicit) = std::env::var("APPSTAKE_TUI_CONFIG") {
        if !explicit.trim().is_empty() {
            return PathBuf::from(explicit);
        }
    }
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
keyring_backend = "test"

[thresholds]
warning = 3000
danger = 1000

[networks.pocket]
rpc_endpoint = "https://rpc.example"
gateways = ["gw1", "gw2"]
applications = ["a1", "a2"]
bank = "bank1"

[networks.pocket-beta]
rpc_endpoint = "https://beta.example"
chain_id = "pocket-beta-2"
gateways = []
"#;

    #[test]
    fn parses_networks_and_thresholds() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.keyring_backend.as_deref(), Some("test"));
        assert_eq!(config.thresholds, Thresholds { warning: 3000, danger: 1000 });
        assert!(config.fetch_balances);
        assert_eq!(config.network_names(), vec!["pocket", "pocket-beta"]);

        let pocket = config.network("pocket").unwrap();
        assert_eq!(pocket.gateways, vec!["gw1", "gw2"]);
        assert_eq!(pocket.chain_id("pocket"), "pocket");
        assert_eq!(pocket.funding_account(), Some("bank1"));
        assert_eq!(pocket.fees(), DEFAULT_FEES);

        let beta = config.network("pocket-beta").unwrap();
        assert_eq!(beta.chain_id("pocket-beta"), "pocket-beta-2");
        assert_eq!(beta.funding_account(), None);
    }

    #[test]
    fn thresholds_default_when_omitted() {
        let config = Config::parse(
            "[networks.pocket]\nrpc_endpoint = \"x\"\ngateways = [\"gw1\"]\n",
        )
        .unwrap();
        assert_eq!(config.thresholds, Thresholds::default());
    }

    #[test]
    fn empty_network_map_is_rejected() {
        let err = Config::parse("keyring_backend = \"os\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::NoNetworks));
    }

    #[test]
    fn load_reports_path_on_failure() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"networks = 12").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains(&file.path().display().to_string()));

        let missing = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }

    #[test]
    fn home_override_wins() {
        let mut config = Config::parse(SAMPLE).unwrap();
        config.home = Some(PathBuf::from("/srv/pocket"));
        assert_eq!(config.client_home(), PathBuf::from("/srv/pocket"));
    }
}
