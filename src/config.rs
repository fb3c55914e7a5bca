use crate::core::address::MacAddress;
use crate::core::emit::Backend;
use crate::core::error::{Error, Result};
use crate::core::generator::ProtocolChoice;
use crate::utils::{system_config_path, user_config_path};
use crate::validators;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Default OpenFlow datapath id of the controller backend
pub const DEFAULT_DEVICE_ID: &str = "of:000000223d4b0182";

/// How the rule set of a translation is obtained
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[strum(serialize = "file")]
    File,
    #[strum(serialize = "random")]
    Random,
}

/// Complete translator configuration
///
/// Every section only affects the backends that use it; unknown sections
/// and fields are ignored so one file can serve every backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default)]
    pub queues: QueueConfig,
    #[serde(default)]
    pub flow_api: FlowApiConfig,
    #[serde(default)]
    pub flow_director: FlowDirectorConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub switch_cli: SwitchCliConfig,
    #[serde(default)]
    pub random: RandomConfig,
}

/// Hardware queue striping (flow-api and flow-director)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_queue_target")]
    pub target: u16,
    /// Emit one artifact per queue count from 1 to `target`
    #[serde(default)]
    pub iterative: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            target: default_queue_target(),
            iterative: false,
        }
    }
}

fn default_queue_target() -> u16 {
    4
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowApiConfig {
    /// NIC port id; rules are NIC independent when unset
    #[serde(default)]
    pub port_id: Option<u16>,
    /// Flow group; a jump rule from group 0 is added when > 0
    #[serde(default)]
    pub group: Option<u32>,
    /// Attach a `count` action to every rule
    #[serde(default)]
    pub count: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowDirectorConfig {
    #[serde(default)]
    pub port_id: Option<u16>,
    #[serde(default)]
    pub count: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default = "default_device_id")]
    pub device_id: String,
    #[serde(default)]
    pub table_id: u32,
    #[serde(default = "default_in_port")]
    pub in_port: u32,
    #[serde(default = "default_controller_out_port")]
    pub out_port: u32,
    #[serde(default = "default_controller_priority")]
    pub priority: u32,
    #[serde(default = "default_true")]
    pub permanent: bool,
    #[serde(default)]
    pub timeout: u32,
    /// Rewrite source/destination MACs before output
    #[serde(default)]
    pub rewrite_macs: bool,
    #[serde(default = "default_controller_eth_src")]
    pub eth_src: MacAddress,
    #[serde(default = "default_controller_eth_dst")]
    pub eth_dst: MacAddress,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device_id: default_device_id(),
            table_id: 0,
            in_port: default_in_port(),
            out_port: default_controller_out_port(),
            priority: default_controller_priority(),
            permanent: true,
            timeout: 0,
            rewrite_macs: false,
            eth_src: default_controller_eth_src(),
            eth_dst: default_controller_eth_dst(),
        }
    }
}

fn default_device_id() -> String {
    DEFAULT_DEVICE_ID.to_string()
}

fn default_in_port() -> u32 {
    1
}

fn default_controller_out_port() -> u32 {
    2
}

fn default_controller_priority() -> u32 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_controller_eth_src() -> MacAddress {
    MacAddress::new([0xec, 0xf4, 0xbb, 0xd5, 0xff, 0x08])
}

fn default_controller_eth_dst() -> MacAddress {
    MacAddress::new([0xec, 0xf4, 0xbb, 0xd5, 0xff, 0x0a])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchCliConfig {
    #[serde(default = "default_bridge")]
    pub bridge: String,
    #[serde(default)]
    pub table: u32,
    /// `priority=` is left out of the match when unset
    #[serde(default = "default_switch_priority")]
    pub priority: Option<u32>,
    #[serde(default = "default_in_port")]
    pub in_port: u32,
    #[serde(default = "default_in_port")]
    pub out_port: u32,
    /// Matched as `dl_src`, written as the new destination
    #[serde(default = "default_switch_eth_src")]
    pub eth_src: MacAddress,
    /// Matched as `dl_dst`, written as the new source
    #[serde(default = "default_switch_eth_dst")]
    pub eth_dst: MacAddress,
}

impl Default for SwitchCliConfig {
    fn default() -> Self {
        Self {
            bridge: default_bridge(),
            table: 0,
            priority: default_switch_priority(),
            in_port: default_in_port(),
            out_port: default_in_port(),
            eth_src: default_switch_eth_src(),
            eth_dst: default_switch_eth_dst(),
        }
    }
}

fn default_bridge() -> String {
    "ovsbr0".to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_switch_priority() -> Option<u32> {
    Some(0)
}

fn default_switch_eth_src() -> MacAddress {
    MacAddress::new([0, 0, 0, 0, 0, 0xa1])
}

fn default_switch_eth_dst() -> MacAddress {
    MacAddress::new([0, 0, 0, 0, 0, 0xa2])
}

/// Synthetic rule generation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomConfig {
    /// Number of lines per artifact, jump rule included
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub protocol: ProtocolChoice,
    /// Fixed seed for reproducible rule sets; drawn at random when unset
    #[serde(default)]
    pub seed: Option<u64>,
    /// 0-based position replaced by a known-matching rule
    #[serde(default)]
    pub desired_at: Option<usize>,
}

impl TranslatorConfig {
    /// Checks everything `backend` and `strategy` will read.
    ///
    /// Runs before any parsing or emission; warnings are logged, hard
    /// failures are returned as [`Error::Config`].
    pub fn validate(&self, backend: Backend, strategy: Strategy) -> Result<()> {
        match backend {
            Backend::FlowApi | Backend::FlowDirector => {
                if let Some(warning) = validators::validate_queue_count(self.queues.target)
                    .map_err(|e| Error::config("queues.target", e))?
                {
                    warn!("{warning}");
                }
            }
            Backend::ControllerJson => {
                validators::validate_device_id(&self.controller.device_id)
                    .map_err(|e| Error::config("controller.device_id", e))?;
                validators::validate_switch_port(self.controller.in_port)
                    .map_err(|e| Error::config("controller.in_port", e))?;
                validators::validate_switch_port(self.controller.out_port)
                    .map_err(|e| Error::config("controller.out_port", e))?;
            }
            Backend::SwitchCli => {
                validators::validate_bridge_name(&self.switch_cli.bridge)
                    .map_err(|e| Error::config("switch_cli.bridge", e))?;
                validators::validate_switch_port(self.switch_cli.in_port)
                    .map_err(|e| Error::config("switch_cli.in_port", e))?;
                validators::validate_switch_port(self.switch_cli.out_port)
                    .map_err(|e| Error::config("switch_cli.out_port", e))?;
            }
            Backend::ClassifierJson => {}
        }

        if strategy == Strategy::Random {
            let count = self.random.count.ok_or_else(|| {
                Error::config("random.count", "synthetic generation needs a rule count")
            })?;
            if let Some(warning) = validators::validate_rule_count(count)
                .map_err(|e| Error::config("random.count", e))?
            {
                warn!("{warning}");
            }
        }

        Ok(())
    }
}

/// Loads the configuration.
///
/// An explicit `path` must exist and parse. Otherwise the user config and
/// then the system config are tried; a broken default file is reported and
/// skipped.
pub fn load_config(path: Option<&Path>) -> Result<TranslatorConfig> {
    if let Some(path) = path {
        let json = std::fs::read_to_string(path)?;
        return Ok(serde_json::from_str(&json)?);
    }

    for candidate in [user_config_path(), system_config_path()].into_iter().flatten() {
        let Ok(json) = std::fs::read_to_string(&candidate) else {
            continue;
        };
        match serde_json::from_str::<TranslatorConfig>(&json) {
            Ok(config) => {
                debug!("Loaded configuration from {}", candidate.display());
                return Ok(config);
            }
            Err(e) => warn!("Ignoring invalid config {}: {e}", candidate.display()),
        }
    }

    Ok(TranslatorConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = TranslatorConfig::default();
        assert_eq!(config.queues.target, 4);
        assert_eq!(config.controller.device_id, DEFAULT_DEVICE_ID);
        assert_eq!(config.controller.priority, 1000);
        assert!(config.controller.permanent);
        assert_eq!(config.switch_cli.bridge, "ovsbr0");
        assert_eq!(config.switch_cli.priority, Some(0));
        assert_eq!(config.switch_cli.eth_src.to_string(), "00:00:00:00:00:a1");
        assert_eq!(config.random.protocol, ProtocolChoice::Random);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: TranslatorConfig = serde_json::from_str(
            r#"{"queues": {"target": 8}, "switch_cli": {"table": 2, "eth_dst": "aa:bb:cc:dd:ee:ff"}}"#,
        )
        .unwrap();
        assert_eq!(config.queues.target, 8);
        assert!(!config.queues.iterative);
        assert_eq!(config.switch_cli.table, 2);
        assert_eq!(config.switch_cli.bridge, "ovsbr0");
        assert_eq!(config.switch_cli.eth_dst.to_string(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(config.controller, ControllerConfig::default());
    }

    #[test]
    fn test_invalid_mac_rejected_on_load() {
        let result: std::result::Result<TranslatorConfig, _> =
            serde_json::from_str(r#"{"switch_cli": {"eth_src": "not-a-mac"}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_queue_count() {
        let mut config = TranslatorConfig::default();
        config.queues.target = 0;
        let err = config.validate(Backend::FlowApi, Strategy::File).unwrap_err();
        assert!(matches!(err, Error::Config { ref field, .. } if field == "queues.target"));
        // queue count is irrelevant for the switch backend
        assert!(config.validate(Backend::SwitchCli, Strategy::File).is_ok());
    }

    #[test]
    fn test_validate_random_requires_count() {
        let mut config = TranslatorConfig::default();
        let err = config
            .validate(Backend::FlowApi, Strategy::Random)
            .unwrap_err();
        assert!(matches!(err, Error::Config { ref field, .. } if field == "random.count"));

        config.random.count = Some(0);
        assert!(config.validate(Backend::FlowApi, Strategy::Random).is_err());

        config.random.count = Some(16);
        assert!(config.validate(Backend::FlowApi, Strategy::Random).is_ok());
    }

    #[test]
    fn test_validate_backend_fields() {
        let mut config = TranslatorConfig::default();
        config.controller.device_id = "switch-1".to_string();
        assert!(config.validate(Backend::ControllerJson, Strategy::File).is_err());

        config.switch_cli.bridge = "br0 && reboot".to_string();
        assert!(config.validate(Backend::SwitchCli, Strategy::File).is_err());

        config.switch_cli.bridge = "br0".to_string();
        config.switch_cli.in_port = 0;
        assert!(config.validate(Backend::SwitchCli, Strategy::File).is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"flow_api": {{"group": 3, "count": true}}}}"#).unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.flow_api.group, Some(3));
        assert!(config.flow_api.count);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let err = load_config(Some(Path::new("/nonexistent/flowgen.json"))).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
