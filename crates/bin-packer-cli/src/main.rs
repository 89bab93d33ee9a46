use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::{Rng, SeedableRng};
use tracing::info;

use bin_packer_core::prelude::*;

#[derive(Parser, Debug)]
#[command(
    name = "bin-packer",
    about = "Pack a JSON order into cuboid bins",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=clap::ArgAction::Count, global = true, help_heading = "Logging")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(short, long, default_value_t = false, global = true, help_heading = "Logging")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack a `VariantsRequest` (or bare `Order`) and print the best `PackedOrder`
    Pack(PackArgs),
    /// Generate several variants under different strategies and print them all
    Variants(PackArgs),
    /// Simple timing bench: pack a synthetic order and print time + fill rate
    Bench(BenchArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    /// Input JSON file. Reads stdin if omitted.
    input: Option<PathBuf>,
    /// Output file. Writes stdout if omitted.
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// Pretty-print the output JSON
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

#[derive(Parser, Debug, Clone)]
struct BenchArgs {
    /// Number of synthetic articles to generate
    #[arg(long, default_value_t = 80)]
    count: usize,
    /// Bin width/length/height
    #[arg(long, default_value_t = 100)]
    bin_size: i64,
    /// Max bins available
    #[arg(long, default_value_t = 10)]
    max_collis: u32,
    /// Enable mirror-walls packing
    #[arg(long, default_value_t = false)]
    mirror_walls: bool,
    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args, false),
        Commands::Variants(args) => run_pack(args, true),
        Commands::Bench(args) => run_bench(args),
    }
}

fn read_input(input: &Option<PathBuf>) -> anyhow::Result<String> {
    match input {
        Some(path) => fs::read_to_string(path).with_context(|| format!("read {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("read stdin")?;
            Ok(buf)
        }
    }
}

/// Accepts either a full `VariantsRequest` or a bare `Order` (defaulting
/// `num_variants` and `config`), so a quick one-off order doesn't need the
/// wrapper.
fn parse_request(raw: &str) -> anyhow::Result<VariantsRequest> {
    if let Ok(req) = serde_json::from_str::<VariantsRequest>(raw) {
        return Ok(req);
    }
    let order: Order = serde_json::from_str(raw).context("input is neither a VariantsRequest nor an Order")?;
    Ok(VariantsRequest {
        order,
        num_variants: None,
        config: None,
    })
}

/// The strategies tried when `num_variants` asks for more than one run
/// (spec §2: the core packs one `(order, config)` pair at a time; producing
/// several candidate configs and ranking them is the caller's job).
const VARIANT_STRATEGIES: &[ItemSelectStrategy] = &[
    ItemSelectStrategy::LargestHWL,
    ItemSelectStrategy::LargestVolume,
    ItemSelectStrategy::LargestWHL,
    ItemSelectStrategy::LargestLHW,
    ItemSelectStrategy::LargestLWH,
    ItemSelectStrategy::LargestWToFill,
    ItemSelectStrategy::LargestWHToFill,
];

fn candidate_configs(base: &PackerConfiguration, num_variants: usize) -> Vec<PackerConfiguration> {
    VARIANT_STRATEGIES
        .iter()
        .take(num_variants.max(1))
        .map(|&strategy| PackerConfiguration {
            default_select_strategy: strategy,
            new_layer_select_strategy: strategy,
            ..base.clone()
        })
        .collect()
}

fn run_pack(cli: &PackArgs, all_variants: bool) -> anyhow::Result<()> {
    let raw = read_input(&cli.input)?;
    let request = parse_request(&raw)?;
    let base_config = request.config.clone().unwrap_or_default();
    let num_variants = request.num_variants.unwrap_or(1).max(1) as usize;

    let configs = if all_variants {
        candidate_configs(&base_config, num_variants)
    } else {
        vec![base_config]
    };

    let mut results = Vec::with_capacity(configs.len());
    for config in configs {
        let variant = pack(&request.order, &config).context("packing failed")?;
        results.push((variant, config));
    }

    let weights = PackingEvaluationWeights::default();
    let ranked = evaluate(results, &weights);
    info!(variants = ranked.len(), "evaluated packing variants");

    let variants: Vec<PackingVariant> = if all_variants {
        ranked.into_iter().map(|e| e.variant).collect()
    } else {
        ranked.into_iter().take(1).map(|e| e.variant).collect()
    };
    let packed = to_packed_order(&request.order, &variants);

    let json = if cli.pretty {
        serde_json::to_string_pretty(&packed)?
    } else {
        serde_json::to_string(&packed)?
    };
    write_output(&cli.out, &json)
}

fn write_output(out: &Option<PathBuf>, json: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => fs::write(path, json).with_context(|| format!("write {}", path.display())),
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            writeln!(lock, "{json}").context("write stdout")
        }
    }
}

fn run_bench(args: &BenchArgs) -> anyhow::Result<()> {
    let order = synthetic_order(args);
    let config = PackerConfiguration::builder().mirror_walls(args.mirror_walls).build();

    let start = std::time::Instant::now();
    let variant = pack(&order, &config).context("packing failed")?;
    let elapsed = start.elapsed();

    let total_bin_volume: i64 = variant.bins.iter().map(|b| b.volume()).sum();
    let used_volume: i64 = variant.bins.iter().map(|b| b.get_used_volume(false)).sum();
    let fill_rate = if total_bin_volume > 0 {
        used_volume as f64 / total_bin_volume as f64 * 100.0
    } else {
        0.0
    };

    println!(
        "packed {} articles into {} bin(s) in {:.2?} ({:.1}% filled, {} unpacked)",
        args.count,
        variant.bins.len(),
        elapsed,
        fill_rate,
        variant.unpacked_items.len()
    );
    Ok(())
}

fn synthetic_order(args: &BenchArgs) -> Order {
    let mut rng = rand::rngs::StdRng::seed_from_u64(args.seed);
    let articles = (0..args.count)
        .map(|i| Article {
            id: format!("bench_{i}"),
            width: rng.gen_range(2..=args.bin_size / 3),
            length: rng.gen_range(2..=args.bin_size / 3),
            height: rng.gen_range(2..=args.bin_size / 3),
            weight: rng.gen_range(0.5..10.0),
            amount: 1,
        })
        .collect();
    Order {
        order_id: "bench".into(),
        articles,
        supplies: None,
        colli_details: Some(ColliDetails {
            width: args.bin_size,
            length: args.bin_size,
            height: args.bin_size,
            max_collis: args.max_collis,
            max_length: None,
            max_weight: None,
            safety_distance_smaller_articles: None,
            min_article_width_no_safety_distance: None,
            safety_distance_lengthwise: None,
        }),
    }
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}
