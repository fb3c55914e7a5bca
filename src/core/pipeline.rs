//! Translation pipeline
//!
//! Obtains a [`RuleSet`] (parsed from a source or synthesized), renders every
//! artifact the configuration asks for, and only then hands them back for
//! writing. A fatal error anywhere leaves nothing on disk.

use crate::config::{Strategy, TranslatorConfig};
use crate::core::artifact::Artifact;
use crate::core::emit::{Backend, chainer_for, emitters_for};
use crate::core::error::{Error, Result};
use crate::core::generator::RandomRuleGenerator;
use crate::core::parser::{SkippedLine, parse_source};
use crate::core::rule::RuleSet;
use crate::utils::artifact_stem;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything produced for one input.
#[derive(Debug, Clone)]
pub struct Translation {
    pub stem: String,
    pub rule_set: RuleSet,
    pub skipped: Vec<SkippedLine>,
    pub artifacts: Vec<Artifact>,
}

impl Translation {
    /// Writes all artifacts into `dir`.
    pub fn write_to(&self, dir: &Path, sidecar: bool) -> Result<Vec<PathBuf>> {
        self.artifacts
            .iter()
            .map(|artifact| artifact.write_to(dir, sidecar))
            .collect()
    }
}

/// Parses `source` and renders it for `backend`.
pub fn translate_source(
    stem: &str,
    source: &str,
    backend: Backend,
    config: &TranslatorConfig,
) -> Result<Translation> {
    config.validate(backend, Strategy::File)?;

    let report = parse_source(stem, source)?;
    let artifacts = render_all(&report.rule_set, stem, backend, config)?;
    Ok(Translation {
        stem: stem.to_string(),
        rule_set: report.rule_set,
        skipped: report.skipped,
        artifacts,
    })
}

pub fn translate_file(path: &Path, backend: Backend, config: &TranslatorConfig) -> Result<Translation> {
    info!("Translating {} for the {backend} backend", path.display());
    let source = std::fs::read_to_string(path)?;
    translate_source(&artifact_stem(path), &source, backend, config)
}

/// Synthesizes `random.count` lines' worth of rules and renders them.
///
/// When the backend adds a jump rule, one rule fewer is generated so every
/// artifact holds exactly `random.count` lines.
pub fn generate(backend: Backend, config: &TranslatorConfig) -> Result<Translation> {
    config.validate(backend, Strategy::Random)?;

    let count = config
        .random
        .count
        .ok_or_else(|| Error::config("random.count", "synthetic generation needs a rule count"))?;
    let budget = chainer_for(backend, config).rule_budget(count);
    let seed = config.random.seed.unwrap_or_else(rand::random);
    info!(
        "Generating {budget} {} rules (seed {seed})",
        config.random.protocol
    );

    let stem = format!("random_{}_rules_{count}", backend.short_name());
    let rule_set = RandomRuleGenerator::seeded(seed, config.random.protocol)
        .with_desired_rule_at(config.random.desired_at)
        .generate(&stem, budget);

    let artifacts = render_all(&rule_set, &stem, backend, config)?;
    Ok(Translation {
        stem,
        rule_set,
        skipped: Vec::new(),
        artifacts,
    })
}

fn render_all(
    rule_set: &RuleSet,
    stem: &str,
    backend: Backend,
    config: &TranslatorConfig,
) -> Result<Vec<Artifact>> {
    emitters_for(backend, config)
        .iter()
        .map(|emitter| emitter.emit(rule_set, stem))
        .collect()
}
