//! Stress Test Source Generator for flowgen
//!
//! Writes classifier rule sources mixing every line style the parser accepts:
//! - Filter rules with host, net, mask, port and `ip proto` clauses
//! - Lookup rules (`<prefix> <port>`)
//! - Director rules with exact and masked pattern items
//! - Edge cases: IPv6 rules and invalid ports that must be skipped
//!
//! # Usage
//!
//! ```bash
//! # Generate 1000 rules
//! cargo run --bin stress_gen -- -o /tmp/stress.rules
//!
//! # Generate 5000 rules with edge cases, reproducibly
//! cargo run --bin stress_gen -- --count 5000 --edge-cases --seed 12345 -o /tmp/edge.rules
//!
//! # Parse the result and check every edge case was skipped
//! cargo run --bin stress_gen -- --edge-cases --verify --report --dry-run
//! ```
//!
//! The generator also creates a `.sha256` checksum file next to the output.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use flowgen::core::parser::parse_source;
use rand::prelude::*;
use rand::rngs::StdRng;
use sha2::{Digest, Sha256};

// ═══════════════════════════════════════════════════════════════════════════
// CLI Arguments
// ═══════════════════════════════════════════════════════════════════════════

/// flowgen Stress Test Source Generator
#[derive(Parser)]
#[command(name = "stress_gen")]
#[command(about = "Generate classifier rule sources for flowgen parser and emitter testing")]
struct Args {
    /// Number of lines to generate
    #[arg(short, long, default_value = "1000")]
    count: usize,

    /// Output file path (will also create .sha256 checksum)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Mix in lines that must be skipped: IPv6 and invalid ports
    #[arg(long)]
    edge_cases: bool,

    /// Random seed for reproducible generation (useful for bug reports)
    #[arg(long)]
    seed: Option<u64>,

    /// Print a report of the generated line kinds
    #[arg(long)]
    report: bool,

    /// Parse the generated source and compare accepted/skipped counts
    #[arg(long)]
    verify: bool,

    /// Preview generation without writing files
    #[arg(long)]
    dry_run: bool,
}

const EDGE_CASE_PROBABILITY: f64 = 0.15;

// ═══════════════════════════════════════════════════════════════════════════
// Coverage Tracking
// ═══════════════════════════════════════════════════════════════════════════

/// Counts generated line kinds for reporting
#[derive(Default)]
struct CoverageTracker {
    kinds: HashMap<&'static str, usize>,
    clauses: HashMap<&'static str, usize>,
    expected_skips: usize,
}

impl CoverageTracker {
    fn record(&mut self, kind: &'static str, clauses: &[&'static str], skipped: bool) {
        *self.kinds.entry(kind).or_default() += 1;
        for clause in clauses {
            *self.clauses.entry(clause).or_default() += 1;
        }
        if skipped {
            self.expected_skips += 1;
        }
    }

    fn print_report(&self, total: usize) {
        println!("\n=== Coverage Report ===\n");
        println!("Generated {total} lines:\n");

        fn print_sorted(name: &str, map: &HashMap<&'static str, usize>) {
            println!("{name}:");
            let mut items: Vec<_> = map.iter().collect();
            items.sort_by_key(|(k, _)| *k);
            for (key, count) in items {
                println!("  {key}: {count}");
            }
        }

        print_sorted("Line kinds", &self.kinds);
        print_sorted("\nClauses", &self.clauses);
        println!("\nExpected skips: {}", self.expected_skips);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Random Values
// ═══════════════════════════════════════════════════════════════════════════

fn random_host(rng: &mut impl Rng) -> String {
    let [a, b, c, d]: [u8; 4] = rng.random();
    format!("{a}.{b}.{c}.{d}")
}

/// Network address with host bits cleared.
fn random_net(rng: &mut impl Rng) -> (String, u8) {
    let len = rng.random_range(8..=30u8);
    let bits = rng.random::<u32>() & (u32::MAX << (32 - len));
    let [a, b, c, d] = bits.to_be_bytes();
    (format!("{a}.{b}.{c}.{d}"), len)
}

fn netmask(len: u8) -> String {
    let [a, b, c, d] = (u32::MAX << (32 - len)).to_be_bytes();
    format!("{a}.{b}.{c}.{d}")
}

fn random_port(rng: &mut impl Rng) -> u16 {
    rng.random_range(1..=u16::MAX)
}

fn random_transport(rng: &mut impl Rng) -> &'static str {
    if rng.random_bool(0.5) { "tcp" } else { "udp" }
}

// ═══════════════════════════════════════════════════════════════════════════
// Line Generators
// ═══════════════════════════════════════════════════════════════════════════

fn filter_line(rng: &mut impl Rng, tracker: &mut CoverageTracker) -> String {
    let action = ["allow", "drop", "deny"][rng.random_range(0..3)];
    let mut line = action.to_string();
    let mut clauses = Vec::new();

    if rng.random_bool(0.2) {
        let proto = ["icmp", "tcp", "udp", "47"][rng.random_range(0..4)];
        let _ = write!(line, " ip proto {proto}");
        clauses.push("ip proto");
    }
    for direction in ["src", "dst"] {
        match rng.random_range(0..4) {
            0 => {
                let _ = write!(line, " {direction} host {}", random_host(rng));
                clauses.push("host");
            }
            1 => {
                let (net, len) = random_net(rng);
                let _ = write!(line, " {direction} net {net}/{len}");
                clauses.push("net/len");
            }
            2 => {
                let (net, len) = random_net(rng);
                let _ = write!(line, " {direction} net {net} mask {}", netmask(len));
                clauses.push("net mask");
            }
            _ => {}
        }
    }
    if rng.random_bool(0.6) {
        let transport = random_transport(rng);
        let direction = if rng.random_bool(0.5) { "src" } else { "dst" };
        let _ = write!(line, " {transport} {direction} port {}", random_port(rng));
        clauses.push("port");
    }
    if clauses.is_empty() {
        let _ = write!(line, " src host {}", random_host(rng));
        clauses.push("host");
    }

    tracker.record("filter", &clauses, false);
    line
}

fn lookup_line(rng: &mut impl Rng, tracker: &mut CoverageTracker) -> String {
    let port = rng.random_range(0..64u32);
    if rng.random_bool(0.3) {
        tracker.record("lookup", &["host"], false);
        format!("{} {port}", random_host(rng))
    } else {
        let (net, len) = random_net(rng);
        tracker.record("lookup", &["net/len"], false);
        format!("{net}/{len} {port}")
    }
}

fn director_line(rng: &mut impl Rng, tracker: &mut CoverageTracker) -> String {
    let mut line = format!("flow create {} ingress pattern eth", rng.random_range(0..4u8));
    let mut clauses = vec!["ipv4"];

    let (net, len) = random_net(rng);
    let _ = write!(
        line,
        " / ipv4 src is {} dst spec {net} dst mask {}",
        random_host(rng),
        netmask(len)
    );
    if rng.random_bool(0.5) {
        let transport = random_transport(rng);
        if rng.random_bool(0.3) {
            let _ = write!(line, " / {transport} dst spec {} dst mask 0xff00", random_port(rng) & 0xff00);
            clauses.push("masked port");
        } else {
            let _ = write!(line, " / {transport} dst is {}", random_port(rng));
            clauses.push("port");
        }
    }
    let _ = write!(line, " / end actions queue index {} / end", rng.random_range(0..8u8));

    tracker.record("director", &clauses, false);
    line
}

fn edge_case_line(rng: &mut impl Rng, tracker: &mut CoverageTracker) -> String {
    match rng.random_range(0..4) {
        0 => {
            tracker.record("edge", &["ipv6 host"], true);
            format!("allow src host 2001:db8::{:x}", rng.random::<u16>())
        }
        1 => {
            tracker.record("edge", &["ipv6 pattern"], true);
            "flow create 0 ingress pattern eth / ipv6 src is ::1 / end actions drop / end".to_string()
        }
        2 => {
            tracker.record("edge", &["negative port"], true);
            format!("deny tcp dst port -{}", random_port(rng))
        }
        _ => {
            tracker.record("edge", &["port overflow"], true);
            format!("allow udp src port {}", 65_536 + u32::from(random_port(rng)))
        }
    }
}

fn generate_source(rng: &mut impl Rng, count: usize, edge_cases: bool) -> (String, CoverageTracker) {
    let mut tracker = CoverageTracker::default();
    let mut source = String::new();

    for _ in 0..count {
        let line = if edge_cases && rng.random_bool(EDGE_CASE_PROBABILITY) {
            edge_case_line(rng, &mut tracker)
        } else {
            match rng.random_range(0..10) {
                0..=5 => filter_line(rng, &mut tracker),
                6..=7 => lookup_line(rng, &mut tracker),
                _ => director_line(rng, &mut tracker),
            }
        };
        source.push_str(&line);
        source.push('\n');
    }

    (source, tracker)
}

/// Parses the source and checks the skip count matches the edge cases.
fn verify(source: &str, count: usize, tracker: &CoverageTracker) -> bool {
    match parse_source("stress", source) {
        Ok(report) => {
            let accepted = report.rule_set.len();
            let skipped = report.skipped.len();
            println!("Accepted: {accepted}, skipped: {skipped}");
            if skipped == tracker.expected_skips && accepted + skipped == count {
                println!("✓ Parser output matches the generated mix");
                true
            } else {
                eprintln!(
                    "✗ Expected {} skips and {} accepted rules",
                    tracker.expected_skips,
                    count - tracker.expected_skips
                );
                for line in report.skipped.iter().take(10) {
                    eprintln!("  line {}: {} ({})", line.line, line.text, line.reason);
                }
                false
            }
        }
        Err(e) => {
            eprintln!("✗ Parser rejected the source: {e}");
            false
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if !args.dry_run && args.output.is_none() {
        eprintln!("Error: --output is required (or use --dry-run)");
        return ExitCode::FAILURE;
    }

    let seed = args.seed.unwrap_or_else(rand::random);
    println!("Using seed: {seed}");
    let mut rng = StdRng::seed_from_u64(seed);

    println!(
        "Generating {} lines{}...",
        args.count,
        if args.edge_cases {
            format!(" (with edge cases, {}% probability)", (EDGE_CASE_PROBABILITY * 100.0) as u32)
        } else {
            String::new()
        }
    );
    let (source, tracker) = generate_source(&mut rng, args.count, args.edge_cases);

    let verified = !args.verify || verify(&source, args.count, &tracker);

    if args.report {
        tracker.print_report(args.count);
    }

    if let Some(output_path) = args.output.as_ref().filter(|_| !args.dry_run) {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        let checksum = format!("{:x}", hasher.finalize());

        if let Err(e) = std::fs::write(output_path, &source) {
            eprintln!("Error: cannot write {}: {e}", output_path.display());
            return ExitCode::FAILURE;
        }
        println!("Wrote: {}", output_path.display());

        let mut checksum_path = output_path.clone().into_os_string();
        checksum_path.push(".sha256");
        let checksum_path = PathBuf::from(checksum_path);
        if let Err(e) = std::fs::write(&checksum_path, format!("{checksum}\n")) {
            eprintln!("Error: cannot write {}: {e}", checksum_path.display());
            return ExitCode::FAILURE;
        }
        println!("Wrote: {}", checksum_path.display());
    } else {
        println!("\nDry run complete. No files written.");
    }

    if verified {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
