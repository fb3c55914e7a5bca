//! NIC flow-director emitter
//!
//! Same match and action rendering as the flow API, but flow-director
//! tables have no groups, so there is never a group prefix or jump rule.

use super::flow_api::{actions_tail, render_pattern};
use super::{Backend, Emitter, Rendered, log_rule};
use crate::config::FlowDirectorConfig;
use crate::core::error::Result;
use crate::core::queue::QueueDistributor;
use crate::core::rule::RuleSet;

#[derive(Debug, Clone)]
pub struct FlowDirectorEmitter {
    port_id: Option<u16>,
    count: bool,
    queue_count: u16,
}

impl FlowDirectorEmitter {
    pub fn new(config: &FlowDirectorConfig, queue_count: u16) -> Self {
        Self {
            port_id: config.port_id,
            count: config.count,
            queue_count,
        }
    }
}

impl Emitter for FlowDirectorEmitter {
    fn backend(&self) -> Backend {
        Backend::FlowDirector
    }

    fn file_name(&self, stem: &str) -> String {
        let port = self.port_id.map_or(-1, i32::from);
        format!("{stem}_port_{port}_hw_queues_{}.fdir", self.queue_count)
    }

    fn render(&self, rules: &RuleSet) -> Result<Rendered> {
        let mut queues = QueueDistributor::new(self.queue_count)?;
        let prefix = match self.port_id {
            Some(port) => format!("flow create {port} ingress pattern eth"),
            None => "ingress pattern eth".to_string(),
        };

        let mut lines = Vec::with_capacity(rules.len());
        for rule in rules {
            let line = format!(
                "{prefix}{} actions queue index {} / {}",
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
