//! flowgen - packet classification rule translator
//!
//! Translates classifier rule lists into NIC flow rules, SDN controller
//! flow tables and software switch commands, or synthesizes rule sets of
//! any size for load testing.
//!
//! # Usage
//!
//! ```bash
//! # Flow API rules striped over 8 hardware queues, one file per queue count
//! flowgen translate acl.rules --backend flow-api --queues 8 --iterative -o out/
//!
//! # Controller flows for one device
//! flowgen translate acl.rules --backend controller-json --device-id of:000000223d4b0182
//!
//! # 10k reproducible switch rules in table 1 (plus the goto_table rule)
//! flowgen random --backend switch-cli --count 10000 --seed 7 --table 1
//!
//! # Parse only: list accepted and skipped rules
//! flowgen check acl.rules
//! ```

use clap::{Args, Parser, Subcommand};
use flowgen::config::{TranslatorConfig, load_config};
use flowgen::core::address::MacAddress;
use flowgen::core::emit::Backend;
use flowgen::core::generator::ProtocolChoice;
use flowgen::core::parser::parse_source;
use flowgen::core::pipeline::{self, Translation};
use flowgen::utils::artifact_stem;
use flowgen::validators::validate_mac;
use flowgen::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level, error, info, warn};

shadow_rs::shadow!(build);

#[derive(Parser)]
#[command(name = "flowgen")]
#[command(about = "Translate packet classification rules for NICs, controllers and switches", long_about = None)]
#[command(version = build::CLAP_LONG_VERSION)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Write the log to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Configuration file (defaults to the user, then system config)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate rule files for a backend
    Translate {
        /// Rule source files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Generate a synthetic rule set for a backend
    Random {
        /// Lines per artifact, jump rule included
        #[arg(short, long)]
        count: usize,
        /// Transport protocol of generated rules
        #[arg(long)]
        protocol: Option<ProtocolChoice>,
        /// Seed for reproducible rule sets
        #[arg(long)]
        seed: Option<u64>,
        /// 0-based position of a known-matching rule
        #[arg(long, value_name = "INDEX")]
        desired_at: Option<usize>,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Parse rule files and report accepted and skipped rules
    Check {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Target backend (flow-api, flow-director, controller-json, switch-cli, classifier-json)
    #[arg(short, long)]
    backend: Backend,

    /// Output directory (must exist)
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Write a .sha256 file next to every artifact
    #[arg(long)]
    checksum: bool,

    /// Render and report without writing files
    #[arg(long)]
    dry_run: bool,
}

/// Command-line values that take precedence over the config file
#[derive(Args)]
struct Overrides {
    /// Hardware queue count (flow-api, flow-director)
    #[arg(long)]
    queues: Option<u16>,
    /// One artifact per queue count from 1 to --queues
    #[arg(long)]
    iterative: bool,
    /// Port id for 'flow create' (flow-api, flow-director)
    #[arg(long)]
    port_id: Option<u16>,
    /// Flow group; above 0 a jump rule from group 0 is added (flow-api)
    #[arg(long)]
    group: Option<u32>,
    /// Add a count action to every rule (flow-api, flow-director)
    #[arg(long)]
    with_count: bool,
    /// Datapath id of the target device (controller-json)
    #[arg(long)]
    device_id: Option<String>,
    /// Ingress port (controller-json, switch-cli)
    #[arg(long)]
    in_port: Option<u32>,
    /// Egress port (controller-json, switch-cli)
    #[arg(long)]
    out_port: Option<u32>,
    /// Rewrite MACs before output (controller-json)
    #[arg(long)]
    rewrite_macs: bool,
    /// Bridge name (switch-cli)
    #[arg(long)]
    bridge: Option<String>,
    /// Flow table; above 0 a goto_table rule is added (switch-cli)
    #[arg(long)]
    table: Option<u32>,
    /// Source MAC matched and rewritten (switch-cli)
    #[arg(long, value_parser = validate_mac)]
    eth_src: Option<MacAddress>,
    /// Destination MAC matched and rewritten (switch-cli)
    #[arg(long, value_parser = validate_mac)]
    eth_dst: Option<MacAddress>,
}

impl Overrides {
    fn apply(self, config: &mut TranslatorConfig, backend: Backend) {
        if let Some(queues) = self.queues {
            config.queues.target = queues;
        }
        config.queues.iterative |= self.iterative;
        if let Some(port_id) = self.port_id {
            config.flow_api.port_id = Some(port_id);
            config.flow_director.port_id = Some(port_id);
        }
        if let Some(group) = self.group {
            config.flow_api.group = Some(group);
        }
        config.flow_api.count |= self.with_count;
        config.flow_director.count |= self.with_count;
        if let Some(device_id) = self.device_id {
            config.controller.device_id = device_id;
        }
        config.controller.rewrite_macs |= self.rewrite_macs;
        // in/out ports are shared flags; apply them where the backend reads them
        match backend {
            Backend::SwitchCli => {
                if let Some(port) = self.in_port {
                    config.switch_cli.in_port = port;
                }
                if let Some(port) = self.out_port {
                    config.switch_cli.out_port = port;
                }
            }
            _ => {
                if let Some(port) = self.in_port {
                    config.controller.in_port = port;
                }
                if let Some(port) = self.out_port {
                    config.controller.out_port = port;
                }
            }
        }
        if let Some(bridge) = self.bridge {
            config.switch_cli.bridge = bridge;
        }
        if let Some(table) = self.table {
            config.switch_cli.table = table;
        }
        if let Some(mac) = self.eth_src {
            config.switch_cli.eth_src = mac;
        }
        if let Some(mac) = self.eth_dst {
            config.switch_cli.eth_dst = mac;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            let hint = e.hint();
            eprintln!("Error: {}", hint.user_message);
            for suggestion in &hint.suggestions {
                eprintln!("  - {suggestion}");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => Level::WARN,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    let builder = tracing_subscriber::fmt().with_max_level(level);

    if let Some(path) = &cli.log_file {
        if let Ok(file) = std::fs::File::create(path) {
            builder.with_writer(file).with_ansi(false).init();
            return;
        }
        eprintln!("Cannot create log file {}, logging to stderr", path.display());
    }
    builder.with_writer(std::io::stderr).init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Translate {
            inputs,
            output,
            overrides,
        } => {
            overrides.apply(&mut config, output.backend);
            ensure_output_dir(&output)?;
            // every input is rendered before anything is written
            let translations = inputs
                .iter()
                .map(|path| pipeline::translate_file(path, output.backend, &config))
                .collect::<Result<Vec<_>>>()?;
            for translation in &translations {
                persist(translation, &output)?;
            }
        }
        Commands::Random {
            count,
            protocol,
            seed,
            desired_at,
            output,
            overrides,
        } => {
            overrides.apply(&mut config, output.backend);
            config.random.count = Some(count);
            if let Some(protocol) = protocol {
                config.random.protocol = protocol;
            }
            config.random.seed = seed.or(config.random.seed);
            config.random.desired_at = desired_at.or(config.random.desired_at);
            ensure_output_dir(&output)?;

            let translation = pipeline::generate(output.backend, &config)?;
            persist(&translation, &output)?;
        }
        Commands::Check { inputs } => {
            for path in &inputs {
                check(path)?;
            }
        }
    }
    Ok(())
}

fn ensure_output_dir(output: &OutputArgs) -> Result<()> {
    if output.dry_run || output.output.is_dir() {
        return Ok(());
    }
    Err(Error::config(
        "output",
        format!("{} is not a directory", output.output.display()),
    ))
}

fn persist(translation: &Translation, output: &OutputArgs) -> Result<()> {
    if !translation.skipped.is_empty() {
        warn!(
            "{}: {} lines skipped",
            translation.stem,
            translation.skipped.len()
        );
    }

    if output.dry_run {
        for artifact in &translation.artifacts {
            println!(
                "[DRY RUN] {} ({} rules, sha256 {})",
                artifact.file_name,
                artifact.rule_count,
                artifact.checksum()
            );
        }
        return Ok(());
    }

    for path in translation.write_to(&output.output, output.checksum)? {
        println!("Wrote: {}", path.display());
    }
    Ok(())
}

fn check(path: &Path) -> Result<()> {
    let source = std::fs::read_to_string(path)?;
    let report = parse_source(&artifact_stem(path), &source)?;

    println!("{}:", path.display());
    for rule in &report.rule_set {
        println!("  {rule}");
    }
    for skipped in &report.skipped {
        println!(
            "  skipped line {}: {} ({})",
            skipped.line, skipped.text, skipped.reason
        );
    }
    info!(
        "{}: {} accepted, {} skipped",
        path.display(),
        report.rule_set.len(),
        report.skipped.len()
    );
    Ok(())
}
