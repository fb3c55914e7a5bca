//! Backend emitters
//!
//! Each backend renders a [`RuleSet`] into its own syntax behind the
//! [`Emitter`] trait:
//!
//! - [`flow_api`]: NIC flow rules with queue striping and group chaining
//! - [`flow_director`]: NIC flow-director rules with queue striping
//! - [`controller_json`]: SDN controller flow-table JSON
//! - [`switch_cli`]: software switch `add-flow` commands with table chaining
//! - [`classifier_json`]: classifier entry list
//!
//! Rendering is deterministic and keeps no state between calls: queue
//! counters and deduplication sets live inside one `render` call.

pub mod classifier_json;
pub mod controller_json;
pub mod flow_api;
pub mod flow_director;
pub mod switch_cli;

use crate::config::TranslatorConfig;
use crate::core::artifact::Artifact;
use crate::core::chain::GroupChainer;
use crate::core::error::Result;
use crate::core::queue::sweep;
use crate::core::rule::RuleSet;
use serde::{Deserialize, Serialize};
use tracing::info;

pub use classifier_json::ClassifierJsonEmitter;
pub use controller_json::ControllerJsonEmitter;
pub use flow_api::FlowApiEmitter;
pub use flow_director::FlowDirectorEmitter;
pub use switch_cli::SwitchCliEmitter;

/// Target backend
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    #[strum(to_string = "flow-api", serialize = "dpdk")]
    FlowApi,
    #[strum(to_string = "flow-director", serialize = "fdir")]
    FlowDirector,
    #[strum(to_string = "controller-json", serialize = "onos")]
    ControllerJson,
    #[strum(to_string = "switch-cli", serialize = "ovs")]
    SwitchCli,
    #[strum(to_string = "classifier-json", serialize = "json")]
    ClassifierJson,
}

impl Backend {
    /// Short tag used in synthetic artifact names
    pub const fn short_name(self) -> &'static str {
        match self {
            Backend::FlowApi => "dpdk",
            Backend::FlowDirector => "fdir",
            Backend::ControllerJson => "onos",
            Backend::SwitchCli => "ovs",
            Backend::ClassifierJson => "json",
        }
    }

    /// Human-readable name for log lines
    pub const fn display_name(self) -> &'static str {
        match self {
            Backend::FlowApi => "Flow API",
            Backend::FlowDirector => "Flow Director",
            Backend::ControllerJson => "Controller",
            Backend::SwitchCli => "Switch CLI",
            Backend::ClassifierJson => "Classifier",
        }
    }

    /// Whether artifacts are produced per hardware queue count
    pub const fn uses_queues(self) -> bool {
        matches!(self, Backend::FlowApi | Backend::FlowDirector)
    }
}

/// Output of one render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub lines: Vec<String>,
    /// Rules in the output, jump rule included
    pub rule_count: usize,
}

pub trait Emitter {
    fn backend(&self) -> Backend;

    /// Artifact file name for rules named `stem`.
    fn file_name(&self, stem: &str) -> String;

    fn render(&self, rules: &RuleSet) -> Result<Rendered>;

    /// Renders `rules` into a complete artifact. Fails as a whole; no
    /// partial artifact is ever returned.
    fn emit(&self, rules: &RuleSet, stem: &str) -> Result<Artifact> {
        let rendered = self.render(rules)?;
        Ok(Artifact::from_lines(
            self.file_name(stem),
            &rendered.lines,
            rendered.rule_count,
        ))
    }
}

/// Echoes one rendered rule.
pub(crate) fn log_rule(backend: Backend, number: usize, text: &str) {
    info!("{} rule #{:>4}: {}", backend.display_name(), number, text);
}

/// Group/table chaining in effect for `backend`.
pub fn chainer_for(backend: Backend, config: &TranslatorConfig) -> GroupChainer {
    match backend {
        Backend::FlowApi => GroupChainer::new(config.flow_api.group, config.flow_api.count),
        Backend::SwitchCli => GroupChainer::new(Some(config.switch_cli.table), false),
        Backend::FlowDirector | Backend::ControllerJson | Backend::ClassifierJson => {
            GroupChainer::new(None, false)
        }
    }
}

/// One emitter per artifact to produce: queue backends get one per queue
/// count of the sweep, the others exactly one.
pub fn emitters_for(backend: Backend, config: &TranslatorConfig) -> Vec<Box<dyn Emitter>> {
    if !backend.uses_queues() {
        let emitter: Box<dyn Emitter> = match backend {
            Backend::ControllerJson => Box::new(ControllerJsonEmitter::new(&config.controller)),
            Backend::SwitchCli => Box::new(SwitchCliEmitter::new(&config.switch_cli)),
            _ => Box::new(ClassifierJsonEmitter),
        };
        return vec![emitter];
    }

    sweep(config.queues.target, config.queues.iterative)
        .map(|q| match backend {
            Backend::FlowDirector => {
                Box::new(FlowDirectorEmitter::new(&config.flow_director, q)) as Box<dyn Emitter>
            }
            _ => Box::new(FlowApiEmitter::new(&config.flow_api, q)),
        })
        .collect()
}
