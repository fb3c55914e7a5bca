//! Synthetic rule sets for stress-testing backends
//!
//! Rules are built directly in the IR without going through the parser. The
//! random source is explicit, so a fixed seed reproduces the same rule set.

use crate::core::address::Ipv4Address;
use crate::core::rule::{Action, Field, Layer, RuleDraft, RuleSet, RuleSetBuilder, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Transport protocol of generated rules
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum ProtocolChoice {
    #[strum(serialize = "tcp")]
    Tcp,
    #[strum(serialize = "udp")]
    Udp,
    /// Coin flip per rule
    #[default]
    #[strum(serialize = "random")]
    Random,
    /// Address-only rules
    #[strum(serialize = "none")]
    None,
}

// Fixed subnets of the known-matching rule
const DESIRED_SRC: (Ipv4Address, Ipv4Address) = (
    Ipv4Address::new(192, 168, 0, 0),
    Ipv4Address::new(255, 255, 0, 0),
);
const DESIRED_DST: (Ipv4Address, Ipv4Address) = (
    Ipv4Address::new(10, 0, 0, 0),
    Ipv4Address::new(255, 0, 0, 0),
);

pub struct RandomRuleGenerator<R> {
    rng: R,
    protocol: ProtocolChoice,
    desired_at: Option<usize>,
}

impl RandomRuleGenerator<StdRng> {
    /// Generator with a fixed seed.
    pub fn seeded(seed: u64, protocol: ProtocolChoice) -> Self {
        Self::new(StdRng::seed_from_u64(seed), protocol)
    }
}

impl<R: Rng> RandomRuleGenerator<R> {
    pub fn new(rng: R, protocol: ProtocolChoice) -> Self {
        Self {
            rng,
            protocol,
            desired_at: None,
        }
    }

    /// Replaces the rule at `position` (0-based) with a deterministic rule
    /// matching 192.168.0.0/16 → 10.0.0.0/8. Positions past the end are
    /// clamped to the last rule.
    pub fn with_desired_rule_at(mut self, position: Option<usize>) -> Self {
        self.desired_at = position;
        self
    }

    /// Generates `count` rules: action allow, output port 0, priorities
    /// `1..=count`.
    pub fn generate(&mut self, name: &str, count: usize) -> RuleSet {
        let desired_at = self.desired_at.filter(|_| count > 0).map(|pos| {
            if pos >= count {
                warn!(
                    "Desired rule position {pos} is past the last rule, using {}",
                    count - 1
                );
                count - 1
            } else {
                pos
            }
        });

        let mut builder = RuleSetBuilder::with_capacity(name, count);
        for idx in 0..count {
            let draft = if Some(idx) == desired_at {
                self.desired_rule()
            } else {
                self.random_rule()
            };
            let rule = builder.push(draft);
            debug!("Generated rule #{:>4}: {}", rule.priority(), rule.source_text());
        }

        info!("Generated {count} synthetic rules for '{name}'");
        builder.finish()
    }

    fn pick_transport(&mut self) -> Option<Layer> {
        match self.protocol {
            ProtocolChoice::Tcp => Some(Layer::Tcp),
            ProtocolChoice::Udp => Some(Layer::Udp),
            ProtocolChoice::Random => Some(if self.rng.random_bool(0.5) {
                Layer::Tcp
            } else {
                Layer::Udp
            }),
            ProtocolChoice::None => None,
        }
    }

    fn random_rule(&mut self) -> RuleDraft {
        let src = Ipv4Address::from_bits(self.rng.random());
        let dst = Ipv4Address::from_bits(self.rng.random());
        let transport = self.pick_transport();

        let mut text = format!("allow src host {src} dst host {dst}");
        let mut ports = None;
        if let Some(layer) = transport {
            let (sport, dport): (u16, u16) = (self.rng.random(), self.rng.random());
            text.push_str(&format!(" {layer} src port {sport} dst port {dport}"));
            ports = Some((layer, sport, dport));
        }

        let mut draft = RuleDraft::new(Action::Allow, 0, text);
        draft
            .exact(Layer::Ipv4, Field::Src, Value::Address(src))
            .exact(Layer::Ipv4, Field::Dst, Value::Address(dst));
        if let Some((layer, sport, dport)) = ports {
            draft
                .exact(layer, Field::Src, Value::Port(sport))
                .exact(layer, Field::Dst, Value::Port(dport));
        }
        draft
    }

    fn desired_rule(&mut self) -> RuleDraft {
        let layer = match self.protocol {
            ProtocolChoice::Udp => Some(Layer::Udp),
            ProtocolChoice::None => None,
            ProtocolChoice::Tcp | ProtocolChoice::Random => Some(Layer::Tcp),
        };

        let mut text = "allow src net 192.168.0.0/16 dst net 10.0.0.0/8".to_string();
        if let Some(layer) = layer {
            text.push(' ');
            text.push_str(layer.as_ref());
        }

        let mut draft = RuleDraft::new(Action::Allow, 0, text);
        draft
            .masked(
                Layer::Ipv4,
                Field::Src,
                Value::Address(DESIRED_SRC.0),
                Value::Address(DESIRED_SRC.1),
            )
            .masked(
                Layer::Ipv4,
                Field::Dst,
                Value::Address(DESIRED_DST.0),
                Value::Address(DESIRED_DST.1),
            );
        if let Some(proto) = layer.and_then(Layer::ip_protocol) {
            draft.exact(Layer::Ipv4, Field::Proto, Value::Protocol(proto));
        }
        draft
    }
}
