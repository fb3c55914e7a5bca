//! Rule parser: classifies source lines and decodes them into rule drafts
//!
//! Three line styles are accepted:
//!
//! - **Filter**: `allow|drop|deny <clauses>`, e.g. `drop tcp dst port 22`
//! - **Director**: flow-table rules such as
//!   `flow create 0 ingress pattern eth / ipv4 src is 10.0.0.1 / end actions queue index 0 / end`
//! - **Lookup**: `<address>[/len] <output port>`, e.g. `10.1.2.0/24 7`
//!
//! A line that fits none of them aborts the whole source with
//! [`Error::Grammar`]. Data errors inside a recognized line (bad address,
//! bad port, IPv6) only skip that line.

use crate::core::address::{AddressError, Ipv4Address, Ipv4Prefix, is_address_literal, is_ipv6_literal};
use crate::core::error::{Error, Result, SkipReason};
use crate::core::lexer::{Token, tokenize};
use crate::core::rule::{Action, Field, Layer, RuleDraft, RuleSet, RuleSetBuilder, Value};
use tracing::{debug, info, warn};

/// Top-level shape of a source line
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum LineStyle {
    #[strum(serialize = "filter")]
    Filter(Action),
    #[strum(serialize = "director")]
    Director,
    #[strum(serialize = "lookup")]
    Lookup,
    #[strum(serialize = "unknown")]
    Unknown,
}

/// Result of parsing one line that did not abort the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Rule(RuleDraft),
    Skipped(SkipReason),
    Blank,
}

/// A line excluded from the rule set, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub line: usize,
    pub text: String,
    pub reason: SkipReason,
}

/// Accepted rules plus every skipped line of one source.
#[derive(Debug, Clone)]
pub struct ParseReport {
    pub rule_set: RuleSet,
    pub skipped: Vec<SkippedLine>,
}

/// Trims whitespace and trailing commas.
pub fn normalize_line(raw: &str) -> &str {
    raw.trim().trim_end_matches(',').trim_end()
}

pub fn classify(tokens: &[Token<'_>]) -> LineStyle {
    match tokens {
        [Token::Allow, ..] => LineStyle::Filter(Action::Allow),
        [Token::Drop | Token::Deny, ..] => LineStyle::Filter(Action::Deny),
        [Token::Flow, Token::Create, ..] | [Token::Ingress | Token::Egress | Token::Transfer, ..] => {
            LineStyle::Director
        }
        [Token::Word(addr), Token::Word(port)]
            if is_address_literal(addr) && !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) =>
        {
            LineStyle::Lookup
        }
        _ => LineStyle::Unknown,
    }
}

/// Parses one source line. `line_no` is 1-based and only used in errors.
pub fn parse_line(line_no: usize, raw: &str) -> Result<LineOutcome> {
    let text = normalize_line(raw);
    if text.is_empty() {
        return Ok(LineOutcome::Blank);
    }

    let tokens = tokenize(text);
    let mentions_ipv6 = tokens
        .iter()
        .any(|t| t.is_ipv6_marker() || t.word().is_some_and(is_ipv6_literal));

    let decoded = match classify(&tokens) {
        LineStyle::Unknown => {
            return Err(Error::Grammar {
                line: line_no,
                text: text.to_string(),
                reason: "unknown rule format".to_string(),
            });
        }
        _ if mentions_ipv6 => Err(SkipReason::Ipv6Unsupported),
        LineStyle::Filter(action) => {
            ClauseParser::new(RuleDraft::new(action, action.filter_port(), text)).run(&tokens[1..])
        }
        LineStyle::Director => parse_director(&tokens, text),
        LineStyle::Lookup => parse_lookup(&tokens, text),
    };

    Ok(match decoded {
        Ok(draft) => LineOutcome::Rule(draft),
        Err(reason) => LineOutcome::Skipped(reason),
    })
}

/// Parses a whole source. Any grammar error aborts before a rule set is
/// returned, so callers never emit from a partially parsed source.
pub fn parse_source(name: &str, source: &str) -> Result<ParseReport> {
    let mut builder = RuleSetBuilder::new(name);
    let mut skipped = Vec::new();

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        match parse_line(line_no, raw)? {
            LineOutcome::Rule(draft) => {
                let rule = builder.push(draft);
                info!("Accepted rule #{:>4}: {}", rule.priority(), rule.source_text());
            }
            LineOutcome::Skipped(reason) => {
                let text = normalize_line(raw).to_string();
                warn!("Skipped line {line_no} ({reason}): {text}");
                skipped.push(SkippedLine {
                    line: line_no,
                    text,
                    reason,
                });
            }
            LineOutcome::Blank => {}
        }
    }

    info!(
        "Parsed '{}': {} rules accepted, {} skipped",
        name,
        builder.len(),
        skipped.len()
    );

    Ok(ParseReport {
        rule_set: builder.finish(),
        skipped,
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Filter clauses
// ═══════════════════════════════════════════════════════════════════════════

type Decoded = std::result::Result<RuleDraft, SkipReason>;

/// Walks the clause tokens of a filter rule (or a normalized lookup rule).
struct ClauseParser {
    draft: RuleDraft,
    /// Protocol of the last transport clause, reused by bare `port` clauses
    transport: Option<Layer>,
}

impl ClauseParser {
    fn new(draft: RuleDraft) -> Self {
        Self {
            draft,
            transport: None,
        }
    }

    fn run(mut self, tokens: &[Token<'_>]) -> Decoded {
        let mut pos = 0;
        while pos < tokens.len() {
            pos = self.clause(tokens, pos)?;
        }
        Ok(self.draft)
    }

    /// Decodes the clause starting at `pos` and returns the next position.
    fn clause(&mut self, tokens: &[Token<'_>], pos: usize) -> std::result::Result<usize, SkipReason> {
        match tokens[pos] {
            Token::Ip => match tokens.get(pos + 1) {
                Some(Token::Proto) => {
                    let operand = tokens
                        .get(pos + 2)
                        .ok_or_else(|| SkipReason::MissingOperand("ip proto".to_string()))?;
                    let proto = parse_protocol(operand.text())?;
                    self.draft
                        .exact(Layer::Ipv4, Field::Proto, Value::Protocol(proto));
                    Ok(pos + 3)
                }
                // bare `ip` matches every IPv4 packet
                _ => Ok(pos + 1),
            },
            Token::Src | Token::Dst => self.direction(tokens, pos, None),
            Token::Tcp | Token::Udp => {
                let layer = if tokens[pos] == Token::Tcp {
                    Layer::Tcp
                } else {
                    Layer::Udp
                };
                if matches!(tokens.get(pos + 1), Some(Token::Src | Token::Dst))
                    && tokens.get(pos + 2) == Some(&Token::Port)
                {
                    return self.direction(tokens, pos + 1, Some(layer));
                }
                // bare protocol keyword: restrict the IP protocol
                if self.draft_proto_unset() {
                    let proto = layer.ip_protocol().unwrap_or_default();
                    self.draft
                        .exact(Layer::Ipv4, Field::Proto, Value::Protocol(proto));
                }
                self.transport = Some(layer);
                Ok(pos + 1)
            }
            Token::Word("and" | "&&" | "all" | "any") => Ok(pos + 1),
            other => Err(SkipReason::UnexpectedToken(other.text().to_string())),
        }
    }

    fn draft_proto_unset(&mut self) -> bool {
        self.draft
            .ensure_layer(Layer::Ipv4)
            .get(Field::Proto)
            .is_none()
    }

    /// `src|dst host|net|port ...` with `pos` on the direction keyword.
    fn direction(
        &mut self,
        tokens: &[Token<'_>],
        pos: usize,
        explicit: Option<Layer>,
    ) -> std::result::Result<usize, SkipReason> {
        let field = if tokens[pos] == Token::Src {
            Field::Src
        } else {
            Field::Dst
        };
        let kind = tokens
            .get(pos + 1)
            .ok_or_else(|| SkipReason::MissingOperand(field.to_string()))?;
        let operand = tokens
            .get(pos + 2)
            .map(Token::text)
            .ok_or_else(|| SkipReason::MissingOperand(format!("{field} {}", kind.text())))?;

        match kind {
            Token::Host => {
                let prefix = parse_prefix(operand)?;
                if !prefix.is_host() {
                    return Err(SkipReason::InvalidPrefix(operand.to_string()));
                }
                self.draft
                    .exact(Layer::Ipv4, field, Value::Address(prefix.address()));
                Ok(pos + 3)
            }
            Token::Net => {
                if tokens.get(pos + 3) == Some(&Token::Mask) {
                    let mask_text = tokens
                        .get(pos + 4)
                        .map(Token::text)
                        .ok_or_else(|| SkipReason::MissingOperand(format!("{field} net mask")))?;
                    let spec = parse_address(operand)?;
                    let mask = parse_address(mask_text)?;
                    if spec.to_bits() & !mask.to_bits() != 0 {
                        return Err(SkipReason::InvalidAddress(operand.to_string()));
                    }
                    self.draft.masked(
                        Layer::Ipv4,
                        field,
                        Value::Address(spec),
                        Value::Address(mask),
                    );
                    return Ok(pos + 5);
                }
                let prefix = parse_prefix(operand)?;
                self.draft.masked(
                    Layer::Ipv4,
                    field,
                    Value::Address(prefix.address()),
                    Value::Address(prefix.netmask()),
                );
                Ok(pos + 3)
            }
            Token::Port => {
                let port = parse_port(operand)?;
                let layer = explicit.or(self.transport).unwrap_or_else(|| {
                    warn!("No transport protocol for '{field} port {operand}', defaulting to tcp");
                    Layer::Tcp
                });
                self.transport = Some(layer);
                self.draft.exact(layer, field, Value::Port(port));
                Ok(pos + 3)
            }
            other => Err(SkipReason::UnexpectedToken(other.text().to_string())),
        }
    }
}

fn parse_lookup(tokens: &[Token<'_>], text: &str) -> Decoded {
    let (addr, port) = match tokens {
        [Token::Word(addr), Token::Word(port)] => (*addr, *port),
        _ => return Err(SkipReason::MissingOperand(text.to_string())),
    };
    let output_port: u32 = port
        .parse()
        .map_err(|_| SkipReason::InvalidPort(port.to_string()))?;

    let normalized = match addr.split_once('/') {
        Some((_, "32")) => format!("dst host {addr}"),
        _ => format!("dst net {addr}"),
    };
    debug!("Lookup rule '{text}' normalized to '{normalized}'");

    ClauseParser::new(RuleDraft::new(Action::Allow, output_port, text)).run(&tokenize(&normalized))
}

// ═══════════════════════════════════════════════════════════════════════════
// Director rules
// ═══════════════════════════════════════════════════════════════════════════

fn parse_director(tokens: &[Token<'_>], text: &str) -> Decoded {
    let action = if tokens.contains(&Token::Drop) {
        Action::Deny
    } else {
        Action::Allow
    };
    let mut draft = RuleDraft::new(action, action.filter_port(), text);

    let start = tokens
        .iter()
        .position(|t| *t == Token::Pattern)
        .ok_or_else(|| SkipReason::MissingOperand("pattern".to_string()))?
        + 1;
    let end = tokens[start..]
        .iter()
        .position(|t| *t == Token::End)
        .map_or(tokens.len(), |offset| start + offset);

    for item in tokens[start..end].split(|t| *t == Token::Slash) {
        let Some((head, rest)) = item.split_first() else {
            continue;
        };
        let layer = match head {
            Token::Ipv4 => Layer::Ipv4,
            Token::Tcp => Layer::Tcp,
            Token::Udp => Layer::Udp,
            Token::Ipv6 => return Err(SkipReason::Ipv6Unsupported),
            other => {
                debug!("Ignoring pattern item '{}' in '{text}'", other.text());
                continue;
            }
        };
        decode_item(&mut draft, layer, rest)?;
    }

    if [Layer::Ipv4, Layer::Tcp, Layer::Udp]
        .iter()
        .any(|layer| draft.has_layer(*layer))
    {
        Ok(draft)
    } else {
        Err(SkipReason::MissingOperand("pattern".to_string()))
    }
}

/// Decodes `<field> is|spec|mask <value>` triples of one pattern item.
fn decode_item(draft: &mut RuleDraft, layer: Layer, tokens: &[Token<'_>]) -> std::result::Result<(), SkipReason> {
    let mut specs: Vec<(Field, Value)> = Vec::new();
    let mut masks: Vec<(Field, Value)> = Vec::new();

    for triple in tokens.chunks(3) {
        let [field, kind, value] = triple else {
            let last = triple.last().map_or("", Token::text);
            return Err(SkipReason::MissingOperand(last.to_string()));
        };
        let field = match field {
            Token::Src => Field::Src,
            Token::Dst => Field::Dst,
            Token::Proto if layer == Layer::Ipv4 => Field::Proto,
            other => return Err(SkipReason::UnexpectedToken(other.text().to_string())),
        };
        let value = item_value(layer, field, value.text())?;
        match kind {
            Token::Is => {
                draft.exact(layer, field, value);
            }
            Token::Spec => specs.push((field, value)),
            Token::Mask => {
                masks.retain(|(f, _)| *f != field);
                masks.push((field, value));
            }
            other => return Err(SkipReason::UnexpectedToken(other.text().to_string())),
        }
    }

    for (field, spec) in specs {
        let idx = masks
            .iter()
            .position(|(f, _)| *f == field)
            .ok_or_else(|| SkipReason::MissingOperand(format!("{field} spec")))?;
        let (_, mask) = masks.remove(idx);
        draft.masked(layer, field, spec, mask);
    }
    if let Some((field, _)) = masks.first() {
        return Err(SkipReason::MissingOperand(format!("{field} mask")));
    }
    Ok(())
}

fn item_value(layer: Layer, field: Field, text: &str) -> std::result::Result<Value, SkipReason> {
    match (layer, field) {
        (Layer::Ipv4, Field::Proto) => parse_protocol(text).map(Value::Protocol),
        (Layer::Ipv4, _) => parse_address(text).map(Value::Address),
        _ => parse_number::<u16>(text)
            .map(Value::Port)
            .ok_or_else(|| SkipReason::InvalidPort(text.to_string())),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Operands
// ═══════════════════════════════════════════════════════════════════════════

fn address_skip(text: &str, err: AddressError) -> SkipReason {
    match err {
        AddressError::PrefixLength(_) => SkipReason::InvalidPrefix(text.to_string()),
        AddressError::Syntax(_) | AddressError::HostBitsSet(_) | AddressError::Mac(_) => {
            SkipReason::InvalidAddress(text.to_string())
        }
    }
}

fn parse_address(text: &str) -> std::result::Result<Ipv4Address, SkipReason> {
    text.parse().map_err(|e| address_skip(text, e))
}

fn parse_prefix(text: &str) -> std::result::Result<Ipv4Prefix, SkipReason> {
    text.parse().map_err(|e| address_skip(text, e))
}

/// Decimal or `0x` hexadecimal.
fn parse_number<T: TryFrom<u64>>(text: &str) -> Option<T> {
    let value = match text.strip_prefix("0x") {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            u64::from_str_radix(hex, 16).ok()?
        }
        Some(_) => return None,
        None if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) => text.parse().ok()?,
        None => return None,
    };
    T::try_from(value).ok()
}

fn parse_port(text: &str) -> std::result::Result<u16, SkipReason> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SkipReason::InvalidPort(text.to_string()));
    }
    text.parse()
        .map_err(|_| SkipReason::InvalidPort(text.to_string()))
}

/// IP protocol by number or by name (`icmp`, `tcp`, `udp`).
pub fn parse_protocol(text: &str) -> std::result::Result<u8, SkipReason> {
    match text {
        "icmp" => Ok(1),
        "tcp" => Ok(6),
        "udp" => Ok(17),
        _ => parse_number(text).ok_or_else(|| SkipReason::InvalidProtocol(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rule::Operand;

    fn accepted(line: &str) -> RuleDraft {
        match parse_line(1, line).unwrap() {
            LineOutcome::Rule(draft) => draft,
            other => panic!("expected rule for '{line}', got {other:?}"),
        }
    }

    fn skip(line: &str) -> SkipReason {
        match parse_line(1, line).unwrap() {
            LineOutcome::Skipped(reason) => reason,
            other => panic!("expected skip for '{line}', got {other:?}"),
        }
    }

    fn frozen(draft: RuleDraft) -> crate::core::rule::CanonicalRule {
        let mut builder = RuleSetBuilder::new("t");
        builder.push(draft).clone()
    }

    fn addr(s: &str) -> Value {
        Value::Address(s.parse().unwrap())
    }

    #[test]
    fn test_classify_styles() {
        assert_eq!(classify(&tokenize("allow src host 1.2.3.4")), LineStyle::Filter(Action::Allow));
        assert_eq!(classify(&tokenize("drop")), LineStyle::Filter(Action::Deny));
        assert_eq!(classify(&tokenize("deny tcp")), LineStyle::Filter(Action::Deny));
        assert_eq!(classify(&tokenize("flow create 0 ingress pattern eth / end")), LineStyle::Director);
        assert_eq!(classify(&tokenize("ingress pattern eth / end")), LineStyle::Director);
        assert_eq!(classify(&tokenize("10.1.2.0/24 7")), LineStyle::Lookup);
        assert_eq!(classify(&tokenize("10.1.2.0/24 -7")), LineStyle::Unknown);
        assert_eq!(classify(&tokenize("10.1.2.0/24 7 8")), LineStyle::Unknown);
        assert_eq!(classify(&tokenize("permit any")), LineStyle::Unknown);
        assert_eq!(classify(&tokenize("10.0.0.0/99 3")), LineStyle::Unknown);
        assert_eq!(classify(&tokenize("10.0.0.1/24 3")), LineStyle::Unknown);
        assert_eq!(classify(&tokenize("2001:db8::/32 1")), LineStyle::Lookup);
    }

    #[test]
    fn test_invalid_lookup_address_is_fatal() {
        for line in ["300.1.1.1 3", "10.0.0.0/99 3", "10.0.0.1/24 3"] {
            let err = parse_source("x", &format!("10.1.2.0/24 7\n{line}\n")).unwrap_err();
            assert!(matches!(err, Error::Grammar { line: 2, .. }), "{line}: {err:?}");
        }
    }

    #[test]
    fn test_unknown_grammar_is_fatal() {
        let err = parse_line(4, "permit src host 1.2.3.4").unwrap_err();
        assert!(matches!(err, Error::Grammar { line: 4, .. }));
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(parse_line(1, "   ,").unwrap(), LineOutcome::Blank);
    }

    #[test]
    fn test_filter_host_and_net() {
        let rule = frozen(accepted("allow src host 10.0.0.5 dst net 192.168.1.0/24,"));
        assert_eq!(rule.output_port(), 0);
        assert_eq!(rule.action(), Action::Allow);
        let ipv4 = rule.layer(Layer::Ipv4).unwrap();
        assert_eq!(ipv4.get(Field::Src), Some(&Operand::Exact(addr("10.0.0.5"))));
        assert_eq!(
            ipv4.get(Field::Dst),
            Some(&Operand::Masked {
                spec: addr("192.168.1.0"),
                mask: addr("255.255.255.0"),
            })
        );
        assert_eq!(rule.source_text(), "allow src host 10.0.0.5 dst net 192.168.1.0/24");
    }

    #[test]
    fn test_drop_maps_to_deny_port_one() {
        let rule = frozen(accepted("drop dst host 10.0.0.1/32"));
        assert_eq!(rule.action(), Action::Deny);
        assert_eq!(rule.output_port(), 1);
    }

    #[test]
    fn test_net_with_explicit_mask() {
        let rule = frozen(accepted("allow src net 10.0.0.0 mask 255.0.0.0"));
        assert_eq!(
            rule.layer(Layer::Ipv4).unwrap().get(Field::Src),
            Some(&Operand::Masked {
                spec: addr("10.0.0.0"),
                mask: addr("255.0.0.0"),
            })
        );
    }

    #[test]
    fn test_port_protocols() {
        let rule = frozen(accepted("allow udp src port 53 dst port 5353"));
        let udp = rule.layer(Layer::Udp).unwrap();
        assert_eq!(udp.get(Field::Src), Some(&Operand::Exact(Value::Port(53))));
        assert_eq!(udp.get(Field::Dst), Some(&Operand::Exact(Value::Port(5353))));
        assert!(rule.layer(Layer::Tcp).is_none());

        let rule = frozen(accepted("allow dst port 80"));
        assert!(rule.layer(Layer::Tcp).is_some());
    }

    #[test]
    fn test_ip_proto_names_and_numbers() {
        let rule = frozen(accepted("allow ip proto tcp"));
        assert_eq!(
            rule.layer(Layer::Ipv4).unwrap().get(Field::Proto),
            Some(&Operand::Exact(Value::Protocol(6)))
        );
        let rule = frozen(accepted("allow ip proto 17"));
        assert_eq!(
            rule.layer(Layer::Ipv4).unwrap().get(Field::Proto),
            Some(&Operand::Exact(Value::Protocol(17)))
        );
        assert_eq!(skip("allow ip proto gre"), SkipReason::InvalidProtocol("gre".to_string()));
    }

    #[test]
    fn test_bare_protocol_keyword_restricts_proto() {
        let rule = frozen(accepted("deny udp"));
        assert_eq!(
            rule.layer(Layer::Ipv4).unwrap().get(Field::Proto),
            Some(&Operand::Exact(Value::Protocol(17)))
        );
    }

    #[test]
    fn test_skip_reasons() {
        assert_eq!(skip("allow tcp dst port -1"), SkipReason::InvalidPort("-1".to_string()));
        assert_eq!(skip("allow dst port http"), SkipReason::InvalidPort("http".to_string()));
        assert_eq!(skip("allow dst port 70000"), SkipReason::InvalidPort("70000".to_string()));
        assert_eq!(skip("allow src host 10.0.0.256"), SkipReason::InvalidAddress("10.0.0.256".to_string()));
        assert_eq!(skip("allow src net 10.0.0.1/24"), SkipReason::InvalidAddress("10.0.0.1/24".to_string()));
        assert_eq!(skip("allow src net 10.0.0.0/33"), SkipReason::InvalidPrefix("10.0.0.0/33".to_string()));
        assert_eq!(skip("allow src host 10.0.0.0/8"), SkipReason::InvalidPrefix("10.0.0.0/8".to_string()));
        assert_eq!(skip("allow src"), SkipReason::MissingOperand("src".to_string()));
        assert_eq!(skip("allow src foo 1.2.3.4"), SkipReason::UnexpectedToken("foo".to_string()));
        assert_eq!(skip("allow ip6 src host ::1"), SkipReason::Ipv6Unsupported);
        assert_eq!(skip("allow src host 2001:db8::1"), SkipReason::Ipv6Unsupported);
    }

    #[test]
    fn test_lookup_rules() {
        let rule = frozen(accepted("10.1.2.0/24 7"));
        assert_eq!(rule.output_port(), 7);
        assert_eq!(rule.action(), Action::Allow);
        assert_eq!(
            rule.layer(Layer::Ipv4).unwrap().get(Field::Dst),
            Some(&Operand::Masked {
                spec: addr("10.1.2.0"),
                mask: addr("255.255.255.0"),
            })
        );

        // no suffix goes through `dst net`, i.e. a /32 mask
        let rule = frozen(accepted("10.1.2.3 5"));
        assert_eq!(rule.output_port(), 5);
        assert_eq!(
            rule.layer(Layer::Ipv4).unwrap().get(Field::Dst),
            Some(&Operand::Masked {
                spec: addr("10.1.2.3"),
                mask: addr("255.255.255.255"),
            })
        );

        let rule = frozen(accepted("10.1.2.3/32 2"));
        assert_eq!(
            rule.layer(Layer::Ipv4).unwrap().get(Field::Dst),
            Some(&Operand::Exact(addr("10.1.2.3")))
        );
        assert_eq!(skip("2001:db8::/32 1"), SkipReason::Ipv6Unsupported);
    }

    #[test]
    fn test_director_rules() {
        let rule = frozen(accepted(
            "flow create 0 group 1 ingress pattern eth / ipv4 src is 10.0.0.1 dst spec 10.1.0.0 dst mask 255.255.0.0 / tcp dst is 80 / end actions queue index 3 / end",
        ));
        assert_eq!(rule.action(), Action::Allow);
        assert_eq!(rule.output_port(), 0);
        let ipv4 = rule.layer(Layer::Ipv4).unwrap();
        assert_eq!(ipv4.get(Field::Src), Some(&Operand::Exact(addr("10.0.0.1"))));
        assert_eq!(
            ipv4.get(Field::Dst),
            Some(&Operand::Masked {
                spec: addr("10.1.0.0"),
                mask: addr("255.255.0.0"),
            })
        );
        assert_eq!(
            rule.layer(Layer::Tcp).unwrap().get(Field::Dst),
            Some(&Operand::Exact(Value::Port(80)))
        );

        let rule = frozen(accepted("ingress pattern eth / udp src spec 1024 src mask 0xfc00 / end actions drop / end"));
        assert_eq!(rule.action(), Action::Deny);
        assert_eq!(rule.output_port(), 1);
        assert_eq!(
            rule.layer(Layer::Udp).unwrap().get(Field::Src),
            Some(&Operand::Masked {
                spec: Value::Port(1024),
                mask: Value::Port(0xfc00),
            })
        );
    }

    #[test]
    fn test_director_skips() {
        assert_eq!(
            skip("flow create 0 ingress pattern eth / end actions queue index 0 / end"),
            SkipReason::MissingOperand("pattern".to_string())
        );
        assert_eq!(
            skip("ingress pattern eth / ipv6 src is ::1 / end"),
            SkipReason::Ipv6Unsupported
        );
        assert_eq!(
            skip("ingress pattern eth / ipv4 src spec 10.0.0.0 / end"),
            SkipReason::MissingOperand("src spec".to_string())
        );
    }

    #[test]
    fn test_parse_source_priorities_skip_ipv6() {
        let source = "allow src host 10.0.0.1\nallow ip6 src host ::1\n\ndeny dst port 22\n";
        let report = parse_source("rules", source).unwrap();
        let priorities: Vec<_> = report.rule_set.iter().map(|r| r.priority()).collect();
        assert_eq!(priorities, vec![1, 2]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line, 2);
        assert_eq!(report.rule_set.rules()[1].source_text(), "deny dst port 22");
    }

    #[test]
    fn test_parse_source_aborts_on_grammar_error() {
        let source = "allow src host 10.0.0.1\nbogus line here\n";
        assert!(matches!(
            parse_source("rules", source),
            Err(Error::Grammar { line: 2, .. })
        ));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number::<u16>("0xffff"), Some(0xffff));
        assert_eq!(parse_number::<u16>("65536"), None);
        assert_eq!(parse_number::<u8>("0x"), None);
        assert_eq!(parse_number::<u8>("+1"), None);
    }
}
