//! Software switch CLI emitter
//!
//! Each rule becomes one `ovs-ofctl` command adding a flow. The action swaps
//! the configured MAC pair and outputs on the configured port (`in_port`
//! when that is the ingress port itself). A table above 0 gets a
//! `goto_table` rule in table 0 first.

use super::{Backend, Emitter, Rendered, log_rule};
use crate::config::SwitchCliConfig;
use crate::core::chain::{GroupChainer, JumpRule};
use crate::core::error::Result;
use crate::core::rule::{CanonicalRule, Field, Layer, LayerMatches, Operand, RuleSet, Value};
use std::fmt::Write;

const OFCTL: &str = "ovs-ofctl -O OpenFlow14 add-flow";
const ETH_TYPE_IPV4: u16 = 0x0800;

#[derive(Debug, Clone)]
pub struct SwitchCliEmitter {
    config: SwitchCliConfig,
}

impl SwitchCliEmitter {
    pub fn new(config: &SwitchCliConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// `dl_type`, `dl_src` and `dl_dst` for the configured MAC pair.
    fn default_ethernet(&self) -> LayerMatches {
        let mut ethernet = LayerMatches::default();
        ethernet.set(Field::Proto, Operand::Exact(Value::EtherType(ETH_TYPE_IPV4)));
        ethernet.set(Field::Src, Operand::Exact(Value::Mac(self.config.eth_src)));
        ethernet.set(Field::Dst, Operand::Exact(Value::Mac(self.config.eth_dst)));
        ethernet
    }

    fn command(&self, flow: &str) -> String {
        format!("{OFCTL} {} \"{flow}\"", self.config.bridge)
    }

    fn render_jump(&self, jump: &JumpRule) -> String {
        let mut flow = format!("table=0, in_port={}, ", self.config.in_port);
        for m in jump.ethernet.iter() {
            push_match(&mut flow, Layer::Ethernet, m.field, m.operand);
        }
        let _ = write!(flow, "actions=goto_table:{}", jump.target);
        self.command(&flow)
    }

    fn render_rule(&self, rule: &CanonicalRule) -> String {
        let mut flow = format!("table={}, ", self.config.table);
        if let Some(priority) = self.config.priority {
            let _ = write!(flow, "priority={priority}, ");
        }
        let _ = write!(flow, "in_port={}, ", self.config.in_port);

        let default_ethernet;
        let ethernet = match rule.layer(Layer::Ethernet) {
            Some(ethernet) => ethernet,
            None => {
                default_ethernet = self.default_ethernet();
                &default_ethernet
            }
        };
        for m in ethernet.iter() {
            push_match(&mut flow, Layer::Ethernet, m.field, m.operand);
        }

        let ipv4 = rule.layer(Layer::Ipv4);
        match ipv4.and_then(|l| l.get(Field::Proto)) {
            Some(operand) => push_match(&mut flow, Layer::Ipv4, Field::Proto, *operand),
            None => {
                if let Some(proto) = rule.transport().and_then(Layer::ip_protocol) {
                    push_match(
                        &mut flow,
                        Layer::Ipv4,
                        Field::Proto,
                        Operand::Exact(Value::Protocol(proto)),
                    );
                }
            }
        }
        if let Some(ipv4) = ipv4 {
            for m in ipv4.iter().rev().filter(|m| m.field != Field::Proto) {
                push_match(&mut flow, Layer::Ipv4, m.field, m.operand);
            }
        }

        for layer in [Layer::Udp, Layer::Tcp] {
            if let Some(matches) = rule.layer(layer) {
                for m in matches.iter().rev() {
                    push_match(&mut flow, layer, m.field, m.operand);
                }
            }
        }

        let output = if self.config.out_port == self.config.in_port {
            "in_port".to_string()
        } else {
            self.config.out_port.to_string()
        };
        // MACs are swapped on the way out
        let _ = write!(
            flow,
            "actions=mod_dl_src:{}, mod_dl_dst:{}, output:{output}",
            self.config.eth_dst, self.config.eth_src
        );
        self.command(&flow)
    }
}

/// Appends `key=value, ` in the switch's match vocabulary.
fn push_match(flow: &mut String, layer: Layer, field: Field, operand: Operand) {
    let key = match (layer, field) {
        (Layer::Ethernet, Field::Proto) => "dl_type",
        (Layer::Ethernet, Field::Src) => "dl_src",
        (Layer::Ethernet, Field::Dst) => "dl_dst",
        (Layer::Ipv4, Field::Proto) => "nw_proto",
        (Layer::Ipv4, Field::Src) => "nw_src",
        (Layer::Ipv4, Field::Dst) => "nw_dst",
        (_, Field::Src) => "tp_src",
        (_, Field::Dst | Field::Proto) => "tp_dst",
    };
    let _ = match operand {
        Operand::Exact(value) => write!(flow, "{key}={value}, "),
        Operand::Masked {
            spec: Value::Port(spec),
            mask: Value::Port(mask),
        } => write!(flow, "{key}={spec}/0x{mask:04x}, "),
        Operand::Masked { spec, mask } => write!(flow, "{key}={spec}/{mask}, "),
    };
}

impl Emitter for SwitchCliEmitter {
    fn backend(&self) -> Backend {
        Backend::SwitchCli
    }

    fn file_name(&self, stem: &str) -> String {
        format!("{stem}_table_{}.ovs", self.config.table)
    }

    fn render(&self, rules: &RuleSet) -> Result<Rendered> {
        let mut lines = Vec::with_capacity(rules.len() + 1);

        let chainer = GroupChainer::new(Some(self.config.table), false);
        if let Some(jump) = chainer.jump_rule(self.default_ethernet()) {
            lines.push(self.render_jump(&jump));
        }

        for rule in rules {
            let line = self.render_rule(rule);
            log_rule(self.backend(), lines.len(), &line);
            lines.push(line);
        }

        Ok(Rendered {
            rule_count: lines.len(),
            lines,
        })
    }
}
