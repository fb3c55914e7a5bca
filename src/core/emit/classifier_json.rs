//! Classifier entry-list emitter
//!
//! Re-renders each rule's match as classifier clause text and lists it with
//! its output port, priority and action. A traffic class already listed in
//! the same document is dropped.

use super::{Backend, Emitter, Rendered, log_rule};
use crate::core::error::Result;
use crate::core::rule::{Action, RuleSet};
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

#[derive(Debug, Serialize)]
struct EntryList {
    entries: Vec<Entry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Entry {
    traffic_class: String,
    output_port: u32,
    priority: u32,
    action: Action,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifierJsonEmitter;

impl Emitter for ClassifierJsonEmitter {
    fn backend(&self) -> Backend {
        Backend::ClassifierJson
    }

    fn file_name(&self, stem: &str) -> String {
        format!("{stem}.json")
    }

    fn render(&self, rules: &RuleSet) -> Result<Rendered> {
        let mut seen = HashSet::with_capacity(rules.len());
        let mut entries = Vec::with_capacity(rules.len());

        for rule in rules {
            let traffic_class = rule.traffic_class();
            if !seen.insert(traffic_class.clone()) {
                warn!(
                    "Dropping rule #{} '{}': traffic class already listed",
                    rule.priority(),
                    rule.source_text()
                );
                continue;
            }
            log_rule(self.backend(), entries.len(), &traffic_class);
            entries.push(Entry {
                traffic_class,
                output_port: rule.output_port(),
                priority: rule.priority(),
                action: rule.action(),
            });
        }

        let rule_count = entries.len();
        Ok(Rendered {
            lines: vec![serde_json::to_string_pretty(&EntryList { entries })?],
            rule_count,
        })
    }
}
