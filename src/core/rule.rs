//! Canonical rule representation shared by the parser, the generator and
//! every backend emitter
//!
//! A [`CanonicalRule`] holds, per protocol [`Layer`], an insertion-ordered list
//! of [`FieldMatch`] entries. Each field carries either an exact value or a
//! spec+mask pair, never both: setting a field twice replaces the earlier
//! operand in place.
//!
//! Rules are drafted with [`RuleDraft`] and frozen by [`RuleSetBuilder::push`],
//! which assigns the 1-based priority. Nothing mutates a rule after that.
//!
//! # Example
//!
//! ```
//! use flowgen::core::address::Ipv4Address;
//! use flowgen::core::rule::{Action, Field, Layer, RuleDraft, RuleSetBuilder, Value};
//!
//! let mut draft = RuleDraft::new(Action::Allow, 0, "allow src host 10.0.0.5");
//! draft.exact(Layer::Ipv4, Field::Src, Value::Address(Ipv4Address::new(10, 0, 0, 5)));
//!
//! let mut builder = RuleSetBuilder::new("rules");
//! builder.push(draft);
//! let rule_set = builder.finish();
//! assert_eq!(rule_set.rules()[0].priority(), 1);
//! ```

use crate::core::address::{Ipv4Address, MacAddress};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Protocol layers a rule can constrain, in header order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
pub enum Layer {
    #[strum(serialize = "eth")]
    Ethernet,
    #[strum(serialize = "ipv4")]
    Ipv4,
    #[strum(serialize = "udp")]
    Udp,
    #[strum(serialize = "tcp")]
    Tcp,
}

impl Layer {
    /// IP protocol number carried by a transport layer.
    pub const fn ip_protocol(self) -> Option<u8> {
        match self {
            Layer::Tcp => Some(6),
            Layer::Udp => Some(17),
            Layer::Ethernet | Layer::Ipv4 => None,
        }
    }
}

/// Field within a layer. `Proto` is the IP protocol for `ipv4` and the
/// ethertype for `eth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
pub enum Field {
    #[strum(serialize = "proto")]
    Proto,
    #[strum(serialize = "src")]
    Src,
    #[strum(serialize = "dst")]
    Dst,
}

/// A single match operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Address(Ipv4Address),
    Mac(MacAddress),
    Port(u16),
    Protocol(u8),
    EtherType(u16),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Address(addr) => write!(f, "{addr}"),
            Value::Mac(mac) => write!(f, "{mac}"),
            Value::Port(port) => write!(f, "{port}"),
            Value::Protocol(proto) => write!(f, "{proto}"),
            Value::EtherType(ty) => write!(f, "0x{ty:04x}"),
        }
    }
}

/// Exact (`is`) or masked (`spec` + `mask`) match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    Exact(Value),
    Masked { spec: Value, mask: Value },
}

impl Operand {
    pub const fn is_masked(&self) -> bool {
        matches!(self, Operand::Masked { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldMatch {
    pub field: Field,
    pub operand: Operand,
}

impl fmt::Display for FieldMatch {
    /// Flow-pattern form: `src is 10.0.0.5` or `dst spec 10.1.0.0 dst mask 255.255.0.0`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand {
            Operand::Exact(value) => write!(f, "{} is {value}", self.field),
            Operand::Masked { spec, mask } => {
                write!(f, "{0} spec {spec} {0} mask {mask}", self.field)
            }
        }
    }
}

/// Insertion-ordered field matches of one layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LayerMatches {
    entries: Vec<FieldMatch>,
}

impl LayerMatches {
    /// Sets a field, replacing an earlier operand for the same field in place.
    pub fn set(&mut self, field: Field, operand: Operand) {
        if let Some(existing) = self.entries.iter_mut().find(|m| m.field == field) {
            existing.operand = operand;
        } else {
            self.entries.push(FieldMatch { field, operand });
        }
    }

    pub fn get(&self, field: Field) -> Option<&Operand> {
        self.entries
            .iter()
            .find(|m| m.field == field)
            .map(|m| &m.operand)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &FieldMatch> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rule action (Allow or Deny)
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    #[strum(serialize = "allow")]
    Allow,
    #[strum(serialize = "deny")]
    Deny,
}

impl Action {
    /// Output port implied by a filter-style action: allow → 0, deny → 1.
    pub const fn filter_port(self) -> u32 {
        match self {
            Action::Allow => 0,
            Action::Deny => 1,
        }
    }
}

/// A rule under construction. Frozen into a [`CanonicalRule`] by
/// [`RuleSetBuilder::push`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDraft {
    layers: BTreeMap<Layer, LayerMatches>,
    output_port: u32,
    action: Action,
    source_text: String,
}

impl RuleDraft {
    pub fn new(action: Action, output_port: u32, source_text: impl Into<String>) -> Self {
        Self {
            layers: BTreeMap::new(),
            output_port,
            action,
            source_text: source_text.into(),
        }
    }

    /// Makes sure a layer is present even when it carries no field yet.
    pub fn ensure_layer(&mut self, layer: Layer) -> &mut LayerMatches {
        self.layers.entry(layer).or_default()
    }

    pub fn exact(&mut self, layer: Layer, field: Field, value: Value) -> &mut Self {
        self.ensure_layer(layer).set(field, Operand::Exact(value));
        self
    }

    pub fn masked(&mut self, layer: Layer, field: Field, spec: Value, mask: Value) -> &mut Self {
        self.ensure_layer(layer)
            .set(field, Operand::Masked { spec, mask });
        self
    }

    pub fn has_layer(&self, layer: Layer) -> bool {
        self.layers.contains_key(&layer)
    }

    /// Drops layers that ended up without any field match.
    fn prune(&mut self) {
        self.layers.retain(|_, matches| !matches.is_empty());
    }
}

/// Backend-agnostic representation of one parsed or synthesized rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRule {
    layers: BTreeMap<Layer, LayerMatches>,
    output_port: u32,
    priority: u32,
    action: Action,
    source_text: String,
}

impl CanonicalRule {
    pub fn layer(&self, layer: Layer) -> Option<&LayerMatches> {
        self.layers.get(&layer)
    }

    /// Present layers in header order.
    pub fn layers(&self) -> impl Iterator<Item = (Layer, &LayerMatches)> {
        self.layers.iter().map(|(layer, matches)| (*layer, matches))
    }

    pub const fn output_port(&self) -> u32 {
        self.output_port
    }

    pub const fn priority(&self) -> u32 {
        self.priority
    }

    pub const fn action(&self) -> Action {
        self.action
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Transport layer of the rule, TCP winning if both are present.
    pub fn transport(&self) -> Option<Layer> {
        [Layer::Tcp, Layer::Udp]
            .into_iter()
            .find(|layer| self.layers.contains_key(layer))
    }

    /// Re-renders the match as classifier clause text, e.g.
    /// `src host 10.0.0.5 && dst net 10.1.0.0/16 && tcp dst port 80`.
    ///
    /// Masked transport ports have no classifier clause and are left out.
    pub fn traffic_class(&self) -> String {
        let mut clauses = Vec::new();

        if let Some(ipv4) = self.layer(Layer::Ipv4) {
            for m in ipv4.iter() {
                match (m.field, m.operand) {
                    (Field::Proto, Operand::Exact(value) | Operand::Masked { spec: value, .. }) => {
                        clauses.push(format!("ip proto {value}"));
                    }
                    (field, Operand::Exact(value)) => {
                        clauses.push(format!("{field} host {value}"));
                    }
                    (field, Operand::Masked { spec, mask }) => {
                        let len = match mask {
                            Value::Address(mask) => mask.prefix_len(),
                            _ => None,
                        };
                        match len {
                            Some(len) => clauses.push(format!("{field} net {spec}/{len}")),
                            None => clauses.push(format!("{field} net {spec} mask {mask}")),
                        }
                    }
                }
            }
        }

        for layer in [Layer::Tcp, Layer::Udp] {
            if let Some(matches) = self.layer(layer) {
                for m in matches.iter() {
                    if let Operand::Exact(value) = m.operand {
                        clauses.push(format!("{layer} {} port {value}", m.field));
                    }
                }
            }
        }

        clauses.join(" && ")
    }
}

impl fmt::Display for CanonicalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} -> port {}",
            self.priority, self.action, self.output_port
        )?;
        for (layer, matches) in self.layers() {
            write!(f, " / {layer}")?;
            for m in matches.iter() {
                write!(f, " {m}")?;
            }
        }
        Ok(())
    }
}

/// Ordered, immutable collection of rules produced by one parse or
/// generation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    name: String,
    rules: Vec<CanonicalRule>,
}

impl RuleSet {
    /// Name of the input the rules came from (file stem or synthetic label).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[CanonicalRule] {
        &self.rules
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CanonicalRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a CanonicalRule;
    type IntoIter = std::slice::Iter<'a, CanonicalRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// Accumulates accepted rules and assigns gap-free 1-based priorities.
#[derive(Debug)]
pub struct RuleSetBuilder {
    name: String,
    rules: Vec<CanonicalRule>,
}

impl RuleSetBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            rules: Vec::with_capacity(capacity),
        }
    }

    /// Freezes a draft and returns the accepted rule.
    pub fn push(&mut self, mut draft: RuleDraft) -> &CanonicalRule {
        draft.prune();
        let priority = u32::try_from(self.rules.len() + 1).unwrap_or(u32::MAX);
        self.rules.push(CanonicalRule {
            layers: draft.layers,
            output_port: draft.output_port,
            priority,
            action: draft.action,
            source_text: draft.source_text,
        });
        &self.rules[self.rules.len() - 1]
    }

    /// Number of rules accepted so far.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn finish(self) -> RuleSet {
        RuleSet {
            name: self.name,
            rules: self.rules,
        }
    }
}
