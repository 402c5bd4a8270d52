// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::chain_profile::ChainProfile;
use crate::yaml::load_yaml_with_env;
use anyhow::{anyhow, bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use path_clean::clean;
use std::{
    collections::HashSet,
    env,
    path::{Path, PathBuf},
};
use tracing::debug;

/// The file name looked up when no config path is given.
pub const DEFAULT_CONFIG_NAME: &str = "ct.config.yaml";

/// Names another config file when `--config` is not passed.
pub const CONFIG_ENV: &str = "CT_CONFIG";

/// The config actually used throughout the app
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Every deployment the tool knows about
    chains: Vec<ChainProfile>,
    /// The chain used when a command does not name one
    default_chain: Option<String>,
    /// Where this configuration was read from
    #[serde(skip)]
    config_file: PathBuf,
}

impl AppConfig {
    pub fn new(chains: Vec<ChainProfile>, default_chain: Option<String>) -> Result<Self> {
        let config = Self {
            chains,
            default_chain,
            config_file: PathBuf::new(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn chains(&self) -> &[ChainProfile] {
        &self.chains
    }

    pub fn default_chain(&self) -> Option<&str> {
        self.default_chain.as_deref()
    }

    pub fn config_file(&self) -> &PathBuf {
        &self.config_file
    }

    /// Pick a chain profile by name, falling back to `default_chain`, then to the only
    /// configured chain.
    pub fn chain(&self, name: Option<&str>) -> Result<&ChainProfile> {
        let wanted = name.or(self.default_chain.as_deref());
        match wanted {
            Some(wanted) => self
                .chains
                .iter()
                .find(|c| c.name == wanted)
                .ok_or_else(|| anyhow!("No chain named '{}' in {:?}", wanted, self.config_file)),
            None => match self.chains.as_slice() {
                [only] => Ok(only),
                [] => bail!("No chains configured in {:?}", self.config_file),
                _ => bail!(
                    "Several chains are configured; pick one with --chain or set `default_chain`"
                ),
            },
        }
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for chain in &self.chains {
            if !seen.insert(chain.name.as_str()) {
                bail!("Chain '{}' is configured more than once", chain.name);
            }
            chain.validate()?;
        }
        if let Some(default) = &self.default_chain {
            if !seen.contains(default.as_str()) {
                bail!("default_chain '{}' does not match any configured chain", default);
            }
        }
        Ok(())
    }
}

/// Where the configuration is read from.
///
/// An explicit path wins (relative paths resolve against `cwd`), then `CT_CONFIG`, then the
/// nearest `ct.config.yaml` in `cwd` or one of its parents, then the OS config dir.
fn locate_config(cwd: &Path, explicit: Option<String>) -> Result<PathBuf> {
    let explicit = explicit.or_else(|| env::var(CONFIG_ENV).ok().filter(|p| !p.is_empty()));
    if let Some(path) = explicit {
        return Ok(clean(cwd.join(path)));
    }

    let nearest = cwd
        .ancestors()
        .map(|dir| dir.join(DEFAULT_CONFIG_NAME))
        .find(|candidate| candidate.is_file());
    match nearest {
        Some(found) => Ok(found),
        None => Ok(OsDirs::config_dir()?.join(DEFAULT_CONFIG_NAME)),
    }
}

/// `CT_CHAINS__<NAME>__` where `<NAME>` is the chain name upper-cased, non alphanumerics as `_`.
fn chain_env_prefix(name: &str) -> String {
    let key: String = name
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() => c.to_ascii_uppercase(),
            _ => '_',
        })
        .collect();
    format!("CT_CHAINS__{key}__")
}

/// Layer `CT_CHAINS__<NAME>__<FIELD>` variables over one chain profile. Nested keys use `__`,
/// e.g. `CT_CHAINS__LOCAL__TIMEOUTS__NETWORK_MS`.
fn with_chain_overrides(chain: ChainProfile) -> Result<ChainProfile> {
    let prefix = chain_env_prefix(&chain.name);
    Figment::from(Serialized::defaults(&chain))
        .merge(Env::prefixed(&prefix).split("__").ignore(&["name"]))
        .extract()
        .with_context(|| format!("Invalid {prefix}* override for chain {}", chain.name))
}

/// Load the config at `config_file` or the first location [`locate_config`] finds.
///
/// `chain` is the `--chain` flag and wins over `default_chain` from file or `CT_DEFAULT_CHAIN`.
/// Chain fields can be overridden per chain with `CT_CHAINS__<NAME>__<FIELD>`.
pub fn load_config(config_file: Option<String>, chain: Option<String>) -> Result<AppConfig> {
    let config_path = locate_config(&env::current_dir()?, config_file)?;
    debug!("Loading configuration from {:?}", config_path);

    let loaded_yaml = load_yaml_with_env(&config_path).context("Configuration file not found")?;

    let mut config: AppConfig = Figment::from(Serialized::defaults(&AppConfig::default()))
        .merge(Yaml::string(&loaded_yaml))
        .merge(Env::prefixed("CT_").only(&["default_chain"]))
        .extract()
        .context("Could not parse configuration")?;

    config.chains = config
        .chains
        .into_iter()
        .map(with_chain_overrides)
        .collect::<Result<_>>()?;
    if chain.is_some() {
        config.default_chain = chain;
    }
    config.config_file = config_path;
    config.validate()?;
    Ok(config)
}

pub struct OsDirs;
impl OsDirs {
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir().map(|d| d.join("ct")).ok_or_else(|| {
            anyhow!("ct needs an OS that can provide a config dir. See https://docs.rs/dirs")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use figment::Jail;

    const TWO_CHAINS: &str = r#"
default_chain: "arbitrum-sepolia"
chains:
  - name: "arbitrum-sepolia"
    chain_id: 421614
    rpc_url: "https://sepolia-rollup.arbitrum.io/rpc"
    ledger: "0x0d60d494cbc4438066a4c1a6154aa89cf83b4874"
    hub: "0xb2bb24cea9aa32c0555f934be8c6f73c93ee6f0c"
    market_api: "https://api.market.arbitrum-sepolia-testnet.iex.ec"
    app: "0xbb21e58a72327a5fda6f5d3673f1fab6607aeab1"
    workerpool: "0xb967057a21dc6a66a29721d96b8aa7454b7c383f"
    escrow_payment: "10000000000000000"
    timeouts:
      network_ms: 5000
  - name: "local"
    chain_id: 31337
    rpc_url: "ws://localhost:8545"
    ledger: "0x5fbdb2315678afecb367f032d93f642f64180aa3"
    hub: "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512"
    market_api: "http://localhost:3000"
    app: "0x9fe46736679d2d9a65f0992f2272de9f3c7fa6e0"
    workerpool: "0xcf7ed3acca5a467e9e704c703e8d87f634fb0fc9"
"#;

    #[test]
    fn parses_chains_and_defaults() -> Result<()> {
        let config: AppConfig = serde_yaml::from_str(TWO_CHAINS)?;
        config.validate()?;

        let chain = config.chain(None)?;
        assert_eq!(chain.chain_id, 421614);
        assert_eq!(chain.timeouts.network_ms, 5000);
        assert_eq!(chain.timeouts.settlement_ms, 600_000);

        let local = config.chain(Some("local"))?;
        assert_eq!(local.ledger, address!("0x5fbdb2315678afecb367f032d93f642f64180aa3"));
        assert_eq!(local.escrow_payment, "0");
        assert!(local.rpc()?.is_local());

        assert!(config.chain(Some("mainnet")).is_err());
        Ok(())
    }

    #[test]
    fn ambiguous_chain_selection_fails() -> Result<()> {
        let mut config: AppConfig = serde_yaml::from_str(TWO_CHAINS)?;
        config.default_chain = None;
        assert!(config.chain(None).is_err());

        config.chains.truncate(1);
        assert_eq!(config.chain(None)?.name, "arbitrum-sepolia");
        Ok(())
    }

    #[test]
    fn duplicate_chain_names_are_rejected() -> Result<()> {
        let config: AppConfig = serde_yaml::from_str(TWO_CHAINS)?;
        let mut chains = config.chains().to_vec();
        chains.push(chains[0].clone());
        assert!(AppConfig::new(chains, None).is_err());
        Ok(())
    }

    #[test]
    fn file_not_found() -> Result<()> {
        let Err(err) = load_config(Some("/nope".to_string()), None) else {
            bail!("error expected");
        };
        let Some(e) = err.downcast_ref::<std::io::Error>() else {
            bail!("io error expected");
        };
        assert_eq!(e.kind(), std::io::ErrorKind::NotFound);
        Ok(())
    }

    #[test]
    fn loads_from_cwd_with_env_expansion_and_overrides() {
        Jail::expect_with(|jail| {
            jail.set_env("TEST_LEDGER", "0x1234567890123456789012345678901234567890");
            jail.create_file(
                DEFAULT_CONFIG_NAME,
                &TWO_CHAINS.replace(
                    "0x5fbdb2315678afecb367f032d93f642f64180aa3",
                    "${TEST_LEDGER}",
                ),
            )?;

            let config = load_config(None, None).map_err(|e| e.to_string())?;
            assert_eq!(config.chain(None).map_err(|e| e.to_string())?.chain_id, 421614);
            assert!(config.config_file().ends_with(DEFAULT_CONFIG_NAME));
            let local = config.chain(Some("local")).map_err(|e| e.to_string())?;
            assert_eq!(
                local.ledger,
                address!("0x1234567890123456789012345678901234567890")
            );

            jail.set_env("CT_DEFAULT_CHAIN", "local");
            let config = load_config(None, None).map_err(|e| e.to_string())?;
            assert_eq!(config.default_chain(), Some("local"));

            let config = load_config(None, Some("arbitrum-sepolia".to_string()))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.default_chain(), Some("arbitrum-sepolia"));

            jail.set_env("CT_DEFAULT_CHAIN", "mainnet");
            assert!(load_config(None, None).is_err());
            Ok(())
        });
    }

    #[test]
    fn nearest_parent_config_is_used() {
        Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_NAME, TWO_CHAINS)?;
            jail.create_dir("deploy")?;
            jail.create_dir("deploy/arbitrum")?;
            let nested = jail.directory().join("deploy/arbitrum");

            let found = locate_config(&nested, None).map_err(|e| e.to_string())?;
            assert_eq!(found, jail.directory().join(DEFAULT_CONFIG_NAME));

            jail.create_file("deploy/ct.config.yaml", TWO_CHAINS)?;
            let found = locate_config(&nested, None).map_err(|e| e.to_string())?;
            assert_eq!(found, jail.directory().join("deploy/ct.config.yaml"));
            Ok(())
        });
    }

    #[test]
    fn explicit_path_beats_env_and_search() {
        Jail::expect_with(|jail| {
            let cwd = jail.directory().to_path_buf();
            jail.create_file(DEFAULT_CONFIG_NAME, TWO_CHAINS)?;

            jail.set_env(CONFIG_ENV, "/etc/ct/staging.yaml");
            let found = locate_config(&cwd, None).map_err(|e| e.to_string())?;
            assert_eq!(found, PathBuf::from("/etc/ct/staging.yaml"));

            let found = locate_config(&cwd, Some("../shared/./ct.yaml".to_string()))
                .map_err(|e| e.to_string())?;
            assert_eq!(found, clean(cwd.join("../shared/ct.yaml")));

            jail.set_env(CONFIG_ENV, "");
            let found = locate_config(&cwd, None).map_err(|e| e.to_string())?;
            assert_eq!(found, cwd.join(DEFAULT_CONFIG_NAME));
            Ok(())
        });
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn falls_back_to_the_os_config_dir() {
        Jail::expect_with(|jail| {
            let xdg = jail.directory().join("xdg");
            jail.create_dir("xdg")?;
            jail.create_dir("xdg/ct")?;
            jail.create_dir("work")?;
            jail.set_env("XDG_CONFIG_HOME", xdg.display());

            let found =
                locate_config(&jail.directory().join("work"), None).map_err(|e| e.to_string())?;
            assert_eq!(found, xdg.join("ct").join(DEFAULT_CONFIG_NAME));
            Ok(())
        });
    }

    #[test]
    fn chain_fields_can_be_overridden_from_env() {
        Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_NAME, TWO_CHAINS)?;
            jail.set_env("CT_CHAINS__LOCAL__RPC_URL", "http://127.0.0.1:9545");
            jail.set_env("CT_CHAINS__LOCAL__TIMEOUTS__NETWORK_MS", "1500");
            jail.set_env(
                "CT_CHAINS__ARBITRUM_SEPOLIA__WORKERPOOL",
                "0x1111111111111111111111111111111111111111",
            );
            jail.set_env("CT_CHAINS__LOCAL__NAME", "renamed");

            let config = load_config(None, None).map_err(|e| e.to_string())?;
            let local = config.chain(Some("local")).map_err(|e| e.to_string())?;
            assert_eq!(local.rpc_url, "http://127.0.0.1:9545");
            assert_eq!(local.timeouts.network_ms, 1500);
            assert_eq!(local.timeouts.confirmation_ms, 120_000);
            assert_eq!(local.chain_id, 31337);

            let arbitrum = config.chain(None).map_err(|e| e.to_string())?;
            assert_eq!(
                arbitrum.workerpool,
                address!("0x1111111111111111111111111111111111111111")
            );
            assert_eq!(arbitrum.timeouts.network_ms, 5000);
            Ok(())
        });
    }

    #[test]
    fn bad_chain_override_is_reported() {
        Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_NAME, TWO_CHAINS)?;
            jail.set_env("CT_CHAINS__LOCAL__LEDGER", "not-an-address");
            assert!(load_config(None, None).is_err());

            jail.set_env(
                "CT_CHAINS__LOCAL__LEDGER",
                "0x5fbdb2315678afecb367f032d93f642f64180aa3",
            );
            jail.set_env("CT_CHAINS__LOCAL__TIMEOUTS__CONFIRMATION_MS", "0");
            assert!(load_config(None, None).is_err());
            Ok(())
        });
    }

    #[test]
    fn env_prefix_follows_the_chain_name() {
        assert_eq!(chain_env_prefix("local"), "CT_CHAINS__LOCAL__");
        assert_eq!(chain_env_prefix("arbitrum-sepolia"), "CT_CHAINS__ARBITRUM_SEPOLIA__");
        assert_eq!(chain_env_prefix("bellecour.v8"), "CT_CHAINS__BELLECOUR_V8__");
    }
}
