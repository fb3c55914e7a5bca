//! SDN controller flow-table JSON emitter
//!
//! Produces one `{"flows": [...]}` document per artifact. Every flow
//! selector starts with the ingress port and the IPv4 ethertype, followed by
//! criteria derived from the rule. Transport ports must be exact: the flow
//! format has no port masks.

use super::{Backend, Emitter, Rendered, log_rule};
use crate::config::ControllerConfig;
use crate::core::address::MacAddress;
use crate::core::error::{Error, Result};
use crate::core::rule::{CanonicalRule, Field, Layer, Operand, RuleSet, Value};
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

const ETH_TYPE_IPV4: &str = "0x800";

#[derive(Debug, Serialize)]
struct FlowDocument {
    flows: Vec<Flow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Flow {
    device_id: String,
    table_id: u32,
    priority: u32,
    is_permanent: bool,
    timeout: u32,
    selector: Selector,
    treatment: Treatment,
}

#[derive(Debug, Serialize)]
struct Selector {
    criteria: Vec<Criterion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum Criterion {
    InPort {
        port: u32,
    },
    EthType {
        #[serde(rename = "ethType")]
        eth_type: &'static str,
    },
    IpProto {
        protocol: u8,
    },
    #[serde(rename = "IPV4_SRC")]
    Ipv4Src { ip: String },
    #[serde(rename = "IPV4_DST")]
    Ipv4Dst { ip: String },
    TcpSrc {
        #[serde(rename = "tcpPort")]
        tcp_port: u16,
    },
    TcpDst {
        #[serde(rename = "tcpPort")]
        tcp_port: u16,
    },
    UdpSrc {
        #[serde(rename = "udpPort")]
        udp_port: u16,
    },
    UdpDst {
        #[serde(rename = "udpPort")]
        udp_port: u16,
    },
}

#[derive(Debug, Serialize)]
struct Treatment {
    instructions: Vec<Instruction>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum Instruction {
    #[serde(rename = "L2MODIFICATION")]
    L2Modification { subtype: &'static str, mac: MacAddress },
    #[serde(rename = "OUTPUT")]
    Output { port: u32 },
}

#[derive(Debug, Clone)]
pub struct ControllerJsonEmitter {
    config: ControllerConfig,
}

impl ControllerJsonEmitter {
    pub fn new(config: &ControllerConfig) -> Self {
        let mut config = config.clone();
        config.device_id.make_ascii_lowercase();
        Self { config }
    }

    fn criteria(&self, rule: &CanonicalRule) -> Result<Vec<Criterion>> {
        let mut criteria = vec![
            Criterion::InPort {
                port: self.config.in_port,
            },
            Criterion::EthType {
                eth_type: ETH_TYPE_IPV4,
            },
        ];

        let mut has_proto = false;
        if let Some(ipv4) = rule.layer(Layer::Ipv4) {
            for m in ipv4.iter().rev() {
                match (m.field, m.operand) {
                    (Field::Proto, Operand::Exact(Value::Protocol(protocol))) => {
                        has_proto = true;
                        criteria.push(Criterion::IpProto { protocol });
                    }
                    (Field::Proto, _) => {
                        return Err(self.unsupported(rule, "masked IP protocol match"));
                    }
                    (field, operand) => {
                        let ip = self.cidr(rule, operand)?;
                        criteria.push(if field == Field::Src {
                            Criterion::Ipv4Src { ip }
                        } else {
                            Criterion::Ipv4Dst { ip }
                        });
                    }
                }
            }
        }

        // Transport criteria require the IP protocol to be matched as well
        if let Some(layer) = rule.transport()
            && !has_proto
            && let Some(protocol) = layer.ip_protocol()
        {
            criteria.push(Criterion::IpProto { protocol });
        }

        for layer in [Layer::Tcp, Layer::Udp] {
            let Some(matches) = rule.layer(layer) else {
                continue;
            };
            for m in matches.iter().rev() {
                let port = match m.operand {
                    Operand::Exact(Value::Port(port)) => port,
                    _ => {
                        let direction = if m.field == Field::Src {
                            "source"
                        } else {
                            "destination"
                        };
                        return Err(self.unsupported(
                            rule,
                            &format!(
                                "wildcard {} {direction} port match is not supported",
                                layer.as_ref().to_uppercase()
                            ),
                        ));
                    }
                };
                criteria.push(match (layer, m.field) {
                    (Layer::Tcp, Field::Src) => Criterion::TcpSrc { tcp_port: port },
                    (Layer::Tcp, _) => Criterion::TcpDst { tcp_port: port },
                    (_, Field::Src) => Criterion::UdpSrc { udp_port: port },
                    _ => Criterion::UdpDst { udp_port: port },
                });
            }
        }

        Ok(criteria)
    }

    /// `a.b.c.d/32` for exact matches, `spec/len` for contiguous masks.
    fn cidr(&self, rule: &CanonicalRule, operand: Operand) -> Result<String> {
        match operand {
            Operand::Exact(Value::Address(addr)) => Ok(format!("{addr}/32")),
            Operand::Masked {
                spec: Value::Address(spec),
                mask: Value::Address(mask),
            } => mask
                .prefix_len()
                .map(|len| format!("{spec}/{len}"))
                .ok_or_else(|| self.unsupported(rule, &format!("non-contiguous netmask {mask}"))),
            _ => Err(Error::Internal(format!(
                "unexpected IPv4 operand {operand:?} in rule #{}",
                rule.priority()
            ))),
        }
    }

    fn instructions(&self) -> Vec<Instruction> {
        let mut instructions = Vec::with_capacity(3);
        if self.config.rewrite_macs {
            instructions.push(Instruction::L2Modification {
                subtype: "ETH_SRC",
                mac: self.config.eth_src,
            });
            instructions.push(Instruction::L2Modification {
                subtype: "ETH_DST",
                mac: self.config.eth_dst,
            });
        }
        instructions.push(Instruction::Output {
            port: self.config.out_port,
        });
        instructions
    }

    fn unsupported(&self, rule: &CanonicalRule, message: &str) -> Error {
        Error::unsupported(
            self.backend(),
            format!(
                "rule #{} '{}': {message}",
                rule.priority(),
                rule.source_text()
            ),
        )
    }
}

impl Emitter for ControllerJsonEmitter {
    fn backend(&self) -> Backend {
        Backend::ControllerJson
    }

    fn file_name(&self, stem: &str) -> String {
        format!(
            "{stem}_inport_{}_outport_{}.json",
            self.config.in_port, self.config.out_port
        )
    }

    fn render(&self, rules: &RuleSet) -> Result<Rendered> {
        let mut seen: HashSet<Vec<Criterion>> = HashSet::with_capacity(rules.len());
        let mut flows = Vec::with_capacity(rules.len());

        for rule in rules {
            let criteria = self.criteria(rule)?;
            if !seen.insert(criteria.clone()) {
                warn!(
                    "Dropping rule #{} '{}': same selector as an earlier flow",
                    rule.priority(),
                    rule.source_text()
                );
                continue;
            }

            let flow = Flow {
                device_id: self.config.device_id.clone(),
                table_id: self.config.table_id,
                priority: self.config.priority,
                is_permanent: self.config.permanent,
                timeout: self.config.timeout,
                selector: Selector { criteria },
                treatment: Treatment {
                    instructions: self.instructions(),
                },
            };
            log_rule(self.backend(), flows.len(), &serde_json::to_string(&flow)?);
            flows.push(flow);
        }

        let rule_count = flows.len();
        let document = serde_json::to_string_pretty(&FlowDocument { flows })?;
        Ok(Rendered {
            lines: vec![document],
            rule_count,
        })
    }
}
