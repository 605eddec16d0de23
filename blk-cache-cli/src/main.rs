use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use blk_cache::CacheConfig;
use log::{error, info};

mod harness;

struct CliArgs {
    file: PathBuf,
    size: usize,
    block_size: Option<usize>,
    slots: Option<usize>,
    iterations: usize,
    seed: Option<u64>,
    config: Option<PathBuf>,
    keep: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            file: PathBuf::from("test.dat"),
            size: 1024,
            block_size: None,
            slots: None,
            iterations: 1000,
            seed: None,
            config: None,
            keep: false,
        }
    }
}

fn parse_args() -> CliArgs {
    let mut args = CliArgs::default();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--file" | "-f" => {
                if let Some(path) = iter.next() {
                    args.file = PathBuf::from(path);
                }
            }
            "--size" | "-s" => {
                if let Some(v) = iter.next() {
                    args.size = parse_size(&v).unwrap_or(args.size);
                }
            }
            "--block-size" | "-b" => {
                if let Some(v) = iter.next() {
                    args.block_size = parse_size(&v);
                }
            }
            "--slots" | "-n" => {
                if let Some(v) = iter.next() {
                    args.slots = v.parse().ok();
                }
            }
            "--iterations" | "-i" => {
                if let Some(v) = iter.next() {
                    args.iterations = v.parse().unwrap_or(args.iterations);
                }
            }
            "--seed" => {
                if let Some(v) = iter.next() {
                    args.seed = v.parse().ok();
                }
            }
            "--config" | "-c" => {
                if let Some(path) = iter.next() {
                    args.config = Some(PathBuf::from(path));
                }
            }
            "--keep" => {
                args.keep = true;
            }
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", arg);
                print_usage();
                process::exit(1);
            }
        }
    }

    args
}

fn parse_size(s: &str) -> Option<usize> {
    let s = s.trim().to_uppercase();
    let (num_str, multiplier) = if s.ends_with("M") || s.ends_with("MB") {
        (s.trim_end_matches("MB").trim_end_matches("M"), 1024 * 1024)
    } else if s.ends_with("K") || s.ends_with("KB") {
        (s.trim_end_matches("KB").trim_end_matches("K"), 1024)
    } else {
        (s.as_str(), 1)
    };

    num_str.parse::<usize>().ok()?.checked_mul(multiplier)
}

fn print_usage() {
    println!("Aging block cache verification harness");
    println!();
    println!("USAGE:");
    println!("    blk-cache-cli [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -f, --file <PATH>        Test file to generate [default: test.dat]");
    println!("    -s, --size <SIZE>        Test file size (e.g., 1024, 64K) [default: 1024]");
    println!("    -b, --block-size <SIZE>  Cache block size, power of two [default: 1024]");
    println!("    -n, --slots <NUM>        Number of cache slots [default: 8]");
    println!("    -i, --iterations <NUM>   Random reads to verify [default: 1000]");
    println!("    --seed <NUM>             RNG seed [default: time based]");
    println!("    -c, --config <PATH>      TOML cache config (block_size, slot_count)");
    println!("    --keep                   Keep the generated file");
    println!("    -h, --help               Print this help message");
}

fn build_config(args: &CliArgs) -> Result<CacheConfig> {
    let mut config = match &args.config {
        Some(path) => CacheConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => CacheConfig::default(),
    };

    if let Some(block_size) = args.block_size {
        config = config.with_block_size(block_size);
    }
    if let Some(slots) = args.slots {
        config = config.with_slot_count(slots);
    }

    config.validate()?;
    Ok(config)
}

fn run(args: &CliArgs) -> Result<bool> {
    let config = build_config(args)?;
    let seed = args.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    });

    info!("File: {} ({} bytes)", args.file.display(), args.size);
    info!(
        "Cache: {} slots x {} bytes, seed {}",
        config.slot_count, config.block_size, seed
    );

    let data = harness::pattern(args.size);
    harness::gen_file(&args.file, &data)?;

    let result = harness::verify_reads(&args.file, &data, config, args.iterations, seed);

    if !args.keep {
        if let Err(e) = std::fs::remove_file(&args.file) {
            error!("Failed to remove {}: {}", args.file.display(), e);
        }
    }

    match result {
        Ok(summary) => {
            println!("cache hit cnt = {}", summary.stats.hits);
            println!(
                "{} reads ({} out of range), {} bytes verified, hit rate {:.1}%",
                summary.iterations,
                summary.out_of_range,
                summary.bytes_verified,
                summary.stats.hit_rate() * 100.0
            );
            println!("Test success");
            Ok(true)
        }
        Err(e) => {
            error!("{:#}", e);
            println!("Test failed");
            Ok(false)
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();
    let args = parse_args();

    match run(&args) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("{:#}", e);
            process::exit(2);
        }
    }
}
