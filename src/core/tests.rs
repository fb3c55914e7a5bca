//! Cross-module tests: parser, rule set, emitters and pipeline together

use crate::config::{self, TranslatorConfig};
use crate::core::emit::{Backend, Emitter, FlowApiEmitter, emitters_for};
use crate::core::error::{Error, SkipReason};
use crate::core::parser::parse_source;
use crate::core::pipeline::{generate, translate_source};
use crate::core::rule::{Action, Field, Layer, Operand, Value};
use crate::core::test_helpers::{rule_set, sample_rule_set};
use proptest::prelude::*;
use strum::IntoEnumIterator;

fn config_with_queues(target: u16, group: Option<u32>) -> TranslatorConfig {
    let mut config = TranslatorConfig::default();
    config.queues.target = target;
    config.flow_api.group = group;
    config
}

#[test]
fn test_end_to_end_flow_api() {
    let config = config_with_queues(2, Some(0));
    let translation = translate_source(
        "acl",
        "allow src host 10.0.0.5\ndrop dst net 192.168.1.0/24\n",
        Backend::FlowApi,
        &config,
    )
    .unwrap();

    assert_eq!(translation.artifacts.len(), 1);
    let artifact = &translation.artifacts[0];
    assert_eq!(artifact.file_name, "acl_group_0_hw_queues_2.dpdk");
    assert_eq!(artifact.rule_count, 2);
    assert_eq!(
        artifact.contents,
        "group 0 ingress pattern eth / ipv4 src is 10.0.0.5 / end actions queue index 0 / end\n\
         group 0 ingress pattern eth / ipv4 dst spec 192.168.1.0 dst mask 255.255.255.0 / end actions queue index 1 / end\n"
    );
}

#[test]
fn test_filter_output_ports_follow_action() {
    let rules = rule_set(&["allow tcp dst port 80", "drop udp", "deny ip proto icmp"]);
    let ports: Vec<_> = rules.iter().map(|r| (r.action(), r.output_port())).collect();
    assert_eq!(
        ports,
        vec![(Action::Allow, 0), (Action::Deny, 1), (Action::Deny, 1)]
    );
}

#[test]
fn test_lookup_rule() {
    let rules = rule_set(&["10.1.2.0/24 7"]);
    let rule = &rules.rules()[0];
    assert_eq!(rule.output_port(), 7);
    assert_eq!(
        rule.layer(Layer::Ipv4).unwrap().get(Field::Dst),
        Some(&Operand::Masked {
            spec: Value::Address("10.1.2.0".parse().unwrap()),
            mask: Value::Address("255.255.255.0".parse().unwrap()),
        })
    );
}

#[test]
fn test_ipv6_lines_leave_no_trace_and_no_priority_gap() {
    let report = parse_source(
        "mixed",
        "allow src host 10.0.0.1\n\
         allow src host 2001:db8::1\n\
         ip6 allow\n\
         allow dst host 10.0.0.2\n",
    );
    // `ip6 allow` is not a recognized style, so it aborts the whole source
    assert!(matches!(report, Err(Error::Grammar { line: 3, .. })));

    let report = parse_source(
        "mixed",
        "allow src host 10.0.0.1\n\
         allow src host 2001:db8::1\n\
         flow create 0 ingress pattern eth / ipv6 src is ::1 / end actions drop / end\n\
         allow dst host 10.0.0.2\n",
    )
    .unwrap();
    let priorities: Vec<_> = report.rule_set.iter().map(|r| r.priority()).collect();
    assert_eq!(priorities, vec![1, 2]);
    assert_eq!(report.skipped.len(), 2);
    assert!(
        report
            .skipped
            .iter()
            .all(|s| s.reason == SkipReason::Ipv6Unsupported)
    );

    for backend in Backend::iter() {
        for emitter in emitters_for(backend, &TranslatorConfig::default()) {
            let artifact = emitter.emit(&report.rule_set, "mixed").unwrap();
            assert!(!artifact.contents.contains("::"), "{backend}: {}", artifact.contents);
            assert!(!artifact.contents.contains("2001"));
        }
    }
}

#[test]
fn test_skipped_data_errors_keep_later_rules() {
    let report = parse_source(
        "bad",
        "allow src host 10.0.0.300\n\
         allow tcp dst port -1\n\
         allow dst net 10.0.0.1/24\n\
         allow dst net 10.0.0.0/33\n\
         allow src host 1.1.1.1\n",
    )
    .unwrap();
    assert_eq!(report.rule_set.len(), 1);
    assert_eq!(report.rule_set.rules()[0].priority(), 1);
    let reasons: Vec<_> = report.skipped.iter().map(|s| s.reason.clone()).collect();
    assert!(matches!(reasons[0], SkipReason::InvalidAddress(_)));
    assert!(matches!(reasons[1], SkipReason::InvalidPort(_)));
    assert!(matches!(reasons[2], SkipReason::InvalidAddress(_)));
    assert!(matches!(reasons[3], SkipReason::InvalidPrefix(_)));
}

#[test]
fn test_grammar_error_aborts_before_emission() {
    let err = translate_source(
        "acl",
        "allow src host 10.0.0.1\nthis is not a rule\n",
        Backend::SwitchCli,
        &TranslatorConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Grammar { line: 2, .. }));
}

#[test]
fn test_emission_is_idempotent() {
    let rules = sample_rule_set();
    let config = config_with_queues(3, Some(2));
    for backend in Backend::iter() {
        let first: Vec<_> = emitters_for(backend, &config)
            .iter()
            .map(|e| e.emit(&rules, "s").unwrap())
            .collect();
        let second: Vec<_> = emitters_for(backend, &config)
            .iter()
            .map(|e| e.emit(&rules, "s").unwrap())
            .collect();
        assert_eq!(first, second, "{backend}");
    }
}

#[test]
fn test_iterative_sweep_produces_one_artifact_per_queue_count() {
    let mut config = config_with_queues(4, None);
    config.queues.iterative = true;
    let translation =
        translate_source("acl", "allow src host 10.0.0.5", Backend::FlowDirector, &config).unwrap();
    let names: Vec<_> = translation
        .artifacts
        .iter()
        .map(|a| a.file_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "acl_port_-1_hw_queues_1.fdir",
            "acl_port_-1_hw_queues_2.fdir",
            "acl_port_-1_hw_queues_3.fdir",
            "acl_port_-1_hw_queues_4.fdir",
        ]
    );
}

#[test]
fn test_invalid_config_rejected_before_parsing() {
    let config = config_with_queues(0, None);
    // the source would abort with a grammar error if it were parsed
    let err = translate_source("acl", "garbage", Backend::FlowApi, &config).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[test]
fn test_random_requires_count() {
    let err = generate(Backend::FlowApi, &TranslatorConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Config { ref field, .. } if field == "random.count"));
    assert!(
        TranslatorConfig::default()
            .validate(Backend::FlowApi, config::Strategy::File)
            .is_ok()
    );
}

#[test]
fn test_seeded_generation_is_byte_identical() {
    let mut config = config_with_queues(2, Some(1));
    config.random.count = Some(50);
    config.random.seed = Some(42);
    config.random.desired_at = Some(10);

    for backend in Backend::iter() {
        let first = generate(backend, &config).unwrap();
        let second = generate(backend, &config).unwrap();
        assert_eq!(first.artifacts, second.artifacts, "{backend}");
    }
}

#[test]
fn test_random_line_count_includes_jump_rule() {
    let mut config = config_with_queues(1, Some(3));
    config.random.count = Some(20);
    config.random.seed = Some(1);

    let translation = generate(Backend::FlowApi, &config).unwrap();
    assert_eq!(translation.stem, "random_dpdk_rules_20");
    assert_eq!(translation.rule_set.len(), 19);
    let artifact = &translation.artifacts[0];
    assert_eq!(artifact.rule_count, 20);
    assert_eq!(artifact.contents.lines().count(), 20);
    assert!(artifact.contents.lines().next().unwrap().contains("jump group 3"));
}

#[test]
fn test_jump_rule_only_for_positive_group() {
    let rules = sample_rule_set();
    for (group, expect_jump) in [(None, false), (Some(0), false), (Some(1), true)] {
        let config = config_with_queues(1, group);
        let emitter = FlowApiEmitter::new(&config.flow_api, 1);
        let rendered = emitter.render(&rules).unwrap();
        assert_eq!(rendered.lines[0].contains("jump"), expect_jump, "{group:?}");
    }
}

proptest! {
    #[test]
    fn prop_parser_never_panics(line in "\\PC{0,80}") {
        let _ = parse_source("fuzz", &line);
    }

    #[test]
    fn prop_filter_vocabulary_never_panics(
        words in proptest::collection::vec(
            prop_oneof![
                Just("allow"), Just("drop"), Just("src"), Just("dst"), Just("host"),
                Just("net"), Just("port"), Just("mask"), Just("tcp"), Just("udp"),
                Just("ip"), Just("proto"), Just("10.0.0.0/8"), Just("1.2.3.4"),
                Just("255.0.0.0"), Just("80"), Just("-1"), Just("::1"),
            ],
            0..12,
        )
    ) {
        let _ = parse_source("fuzz", &words.join(" "));
    }

    #[test]
    fn prop_priorities_are_gap_free(hosts in proptest::collection::vec(any::<[u8; 4]>(), 0..20)) {
        let source: Vec<String> = hosts
            .iter()
            .map(|[a, b, c, d]| format!("allow src host {a}.{b}.{c}.{d}"))
            .collect();
        let report = parse_source("p", &source.join("\n")).unwrap();
        let priorities: Vec<u32> = report.rule_set.iter().map(|r| r.priority()).collect();
        let expected: Vec<u32> = (1..=u32::try_from(hosts.len()).unwrap()).collect();
        prop_assert_eq!(priorities, expected);
    }
}
