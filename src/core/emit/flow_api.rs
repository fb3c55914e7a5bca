//! NIC flow-rule API emitter
//!
//! One `flow create` line per rule:
//!
//! ```text
//! flow create 0 group 1 ingress pattern eth / ipv4 src is 10.0.0.5 / end actions queue index 0 / count / end
//! ```
//!
//! Within a layer, matches are written in reverse insertion order. With a
//! group above 0 the artifact starts with a jump rule from group 0.

use super::{Backend, Emitter, Rendered, log_rule};
use crate::config::FlowApiConfig;
use crate::core::chain::{GroupChainer, JumpRule};
use crate::core::error::Result;
use crate::core::queue::QueueDistributor;
use crate::core::rule::{CanonicalRule, Layer, LayerMatches, RuleSet};
use std::fmt::Write;

/// Layers rendered into a flow pattern, in pattern order.
const PATTERN_LAYERS: [Layer; 3] = [Layer::Ipv4, Layer::Udp, Layer::Tcp];

#[derive(Debug, Clone)]
pub struct FlowApiEmitter {
    port_id: Option<u16>,
    group: Option<u32>,
    count: bool,
    queue_count: u16,
}

impl FlowApiEmitter {
    pub fn new(config: &FlowApiConfig, queue_count: u16) -> Self {
        Self {
            port_id: config.port_id,
            group: config.group,
            count: config.count,
            queue_count,
        }
    }

    fn prefix(&self, group: Option<u32>) -> String {
        let mut out = String::new();
        if let Some(port) = self.port_id {
            let _ = write!(out, "flow create {port} ");
        }
        if let Some(group) = group {
            let _ = write!(out, "group {group} ");
        }
        out.push_str("ingress pattern eth");
        out
    }

    fn render_jump(&self, jump: &JumpRule) -> String {
        format!(
            "{} / end actions jump group {} / {}",
            self.prefix(Some(0)),
            jump.target,
            actions_tail(jump.count)
        )
    }
}

impl Emitter for FlowApiEmitter {
    fn backend(&self) -> Backend {
        Backend::FlowApi
    }

    fn file_name(&self, stem: &str) -> String {
        let group = self.group.map_or(-1, i64::from);
        format!("{stem}_group_{group}_hw_queues_{}.dpdk", self.queue_count)
    }

    fn render(&self, rules: &RuleSet) -> Result<Rendered> {
        let mut queues = QueueDistributor::new(self.queue_count)?;
        let mut lines = Vec::with_capacity(rules.len() + 1);

        if let Some(jump) = GroupChainer::new(self.group, self.count).jump_rule(LayerMatches::default()) {
            lines.push(self.render_jump(&jump));
        }

        for rule in rules {
            let line = format!(
                "{}{} actions queue index {} / {}",
                self.prefix(self.group),
                render_pattern(rule),
                queues.next_queue(),
                actions_tail(self.count)
            );
            log_rule(self.backend(), lines.len(), &line);
            lines.push(line);
        }

        Ok(Rendered {
            rule_count: lines.len(),
            lines,
        })
    }
}

/// ` / ipv4 <matches> / udp <matches> / tcp <matches> / end`
pub(crate) fn render_pattern(rule: &CanonicalRule) -> String {
    let mut out = String::new();
    for layer in PATTERN_LAYERS {
        let Some(matches) = rule.layer(layer) else {
            continue;
        };
        let _ = write!(out, " / {layer}");
        for m in matches.iter().rev() {
            let _ = write!(out, " {m}");
        }
    }
    out.push_str(" / end");
    out
}

/// Optional `count` action followed by the end-of-actions marker.
pub(crate) fn actions_tail(count: bool) -> &'static str {
    if count { "count / end" } else { "end" }
}
