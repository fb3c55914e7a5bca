//! Shared test utilities for core module tests
//!
//! Only compiled in test mode.

use crate::core::parser::parse_source;
use crate::core::rule::RuleSet;

/// Parses `lines` as one source named `test`.
///
/// Panics on a grammar error; tests that expect one call `parse_source`
/// directly.
pub fn rule_set(lines: &[&str]) -> RuleSet {
    parse_source("test", &lines.join("\n"))
        .expect("test source should parse")
        .rule_set
}

/// A small mixed rule set: every line style, both actions, masked and
/// exact addresses, tcp and udp ports.
pub fn sample_rule_set() -> RuleSet {
    rule_set(&[
        "allow src host 10.0.0.5 tcp dst port 80",
        "drop dst net 192.168.1.0/24",
        "deny udp src port 53",
        "10.1.2.0/24 7",
        "flow create 0 ingress pattern eth / ipv4 src is 172.16.0.1 / udp dst is 4789 / end actions queue index 0 / end",
    ])
}
