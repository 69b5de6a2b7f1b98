//! squitter: Decode ADS-B extended squitter captures from the command line.
//!
//! Supports:
//! - Decoding a capture file of hex, dump1090 or binary-digit frames
//! - Resolving a single even/odd pair to a position
//! - Writing a default config file

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use log::{debug, info};
use serde::Serialize;

use squitter_core::{try_decode_at, try_resolve, Message, Position};

mod config;
mod error;
mod input;
mod pairing;

use config::{Config, OutputFormat};
use error::CliError;
use input::FrameReader;
use pairing::PairBuffer;

#[derive(Parser)]
#[command(name = "squitter", version, about = "ADS-B extended squitter decoder")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file (default: ~/.squitter/config.yaml)
    #[arg(long, global = true, env = "SQUITTER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode every frame in a capture file
    Decode {
        /// Path to a file with one frame per line
        file: PathBuf,

        /// Print messages as JSON lines
        #[arg(long)]
        json: bool,

        /// Reference latitude for position resolution
        #[arg(long, requires = "ref_lon", allow_hyphen_values = true)]
        ref_lat: Option<f64>,

        /// Reference longitude for position resolution
        #[arg(long, requires = "ref_lat", allow_hyphen_values = true)]
        ref_lon: Option<f64>,
    },

    /// Resolve a position from one even and one odd frame
    Resolve {
        /// First frame (hex)
        first: String,

        /// Second frame (hex), treated as the newer of the two
        second: String,

        /// Print the position as JSON
        #[arg(long)]
        json: bool,

        #[arg(long, requires = "ref_lon", allow_hyphen_values = true)]
        ref_lat: Option<f64>,

        #[arg(long, requires = "ref_lat", allow_hyphen_values = true)]
        ref_lon: Option<f64>,
    },

    /// Write a default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Serialize)]
struct ResolvedPosition<'a> {
    icao: &'a str,
    latitude: f64,
    longitude: f64,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let config_path = cli.config.unwrap_or_else(config::config_file);

    let result = match cli.command {
        Commands::Decode {
            file,
            json,
            ref_lat,
            ref_lon,
        } => load(&config_path).and_then(|cfg| {
            let format = output_format(&cfg, json);
            cmd_decode(&file, format, reference(&cfg, ref_lat, ref_lon))
        }),
        Commands::Resolve {
            first,
            second,
            json,
            ref_lat,
            ref_lon,
        } => load(&config_path).and_then(|cfg| {
            let format = output_format(&cfg, json);
            let reference = reference(&cfg, ref_lat, ref_lon).ok_or_else(|| {
                CliError::Config("no reference position: pass --ref-lat/--ref-lon".into())
            })?;
            cmd_resolve(&first, &second, reference, format)
        }),
        Commands::InitConfig { force } => cmd_init_config(&config_path, force),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load(path: &Path) -> Result<Config, CliError> {
    let cfg = config::load_from(path)?;
    debug!("config: {} ({})", path.display(), cfg.receiver.name);
    Ok(cfg)
}

/// `--json` wins over the configured format.
fn output_format(cfg: &Config, json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        cfg.output.format
    }
}

/// Command-line reference if given, else the configured receiver position.
fn reference(cfg: &Config, lat: Option<f64>, lon: Option<f64>) -> Option<Position> {
    match (lat, lon) {
        (Some(lat), Some(lon)) => Some(Position::new(lat, lon)),
        _ => match (cfg.receiver.lat, cfg.receiver.lon) {
            (Some(lat), Some(lon)) => Some(Position::new(lat, lon)),
            _ => None,
        },
    }
}

fn cmd_decode(
    file: &Path,
    format: OutputFormat,
    reference: Option<Position>,
) -> Result<(), CliError> {
    let frames = FrameReader::new(file).read_all()?;
    eprintln!("Decoding: {} ({} frames)", file.display(), frames.len());

    let mut pairs = reference.map(PairBuffer::new);
    let mut decoded = 0u64;

    for raw in &frames {
        let now = Instant::now();
        let msg = match try_decode_at(&raw.bits, now) {
            Ok(msg) => msg,
            Err(e) => {
                debug!("line {}: {e}", raw.line);
                continue;
            }
        };
        decoded += 1;
        print_message(&msg, format)?;

        if let (Some(buf), Some(pos)) = (pairs.as_mut(), msg.as_position()) {
            buf.prune(now);
            if let Some(p) = buf.push(pos) {
                print_position(&pos.header.icao_hex(), p, format)?;
            }
        }
    }

    eprintln!("{decoded} decoded messages, {} dropped", frames.len() as u64 - decoded);
    if let Some(buf) = &pairs {
        eprintln!(
            "{} positions resolved, {} pairs rejected, {} aircraft buffered",
            buf.resolved(),
            buf.rejected(),
            buf.len()
        );
    }
    Ok(())
}

fn cmd_resolve(
    first: &str,
    second: &str,
    reference: Position,
    format: OutputFormat,
) -> Result<(), CliError> {
    let t0 = Instant::now();
    let a = decode_position(first, t0)?;
    let b = decode_position(second, t0 + Duration::from_millis(1))?;

    let (Some(pa), Some(pb)) = (a.as_position(), b.as_position()) else {
        let which = if a.as_position().is_none() { first } else { second };
        return Err(CliError::NotPosition(which.to_string()));
    };

    let pos = try_resolve(pa, pb, reference)?;
    print_position(&pb.header.icao_hex(), pos, format)
}

fn decode_position(hex: &str, timestamp: Instant) -> Result<Message, CliError> {
    let bits = input::parse_frame_text(hex)
        .ok_or_else(|| CliError::InvalidFrame(hex.to_string()))?;
    Ok(try_decode_at(&bits, timestamp)?)
}

fn cmd_init_config(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    config::save_to(&Config::default(), path)?;
    info!("wrote {}", path.display());
    eprintln!("Config written to {}", path.display());
    Ok(())
}

fn print_message(msg: &Message, format: OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => println!("{msg}"),
        OutputFormat::Json => println!("{}", serde_json::to_string(msg)?),
    }
    Ok(())
}

fn print_position(icao: &str, pos: Position, format: OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => println!(
            "[POS] ICAO: {icao} | Lat: {:.5} | Lon: {:.5}",
            pos.latitude, pos.longitude
        ),
        OutputFormat::Json => {
            let out = ResolvedPosition {
                icao,
                latitude: pos.latitude,
                longitude: pos.longitude,
            };
            println!("{}", serde_json::to_string(&out)?);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const EVEN: &str = "8D40621D58C382D690C8AC2863A7";
    const ODD: &str = "8D40621D58C386435CC412692AD6";

    #[test]
    fn test_resolve_accepts_json_flag() {
        let cli = Cli::try_parse_from([
            "squitter", "resolve", ODD, EVEN, "--json", "--ref-lat", "52.3", "--ref-lon", "3.9",
        ])
        .unwrap();
        match cli.command {
            Commands::Resolve { json, ref_lat, ref_lon, .. } => {
                assert!(json);
                assert_eq!(ref_lat, Some(52.3));
                assert_eq!(ref_lon, Some(3.9));
            }
            _ => panic!("expected resolve"),
        }
    }

    #[test]
    fn test_resolve_defaults_to_config_format() {
        let cli = Cli::try_parse_from(["squitter", "resolve", ODD, EVEN]).unwrap();
        let Commands::Resolve { json, .. } = cli.command else {
            panic!("expected resolve");
        };
        assert!(!json);
    }

    #[test]
    fn test_json_flag_overrides_config() {
        let mut cfg = Config::default();
        assert_eq!(output_format(&cfg, false), OutputFormat::Text);
        assert_eq!(output_format(&cfg, true), OutputFormat::Json);
        cfg.output.format = OutputFormat::Json;
        assert_eq!(output_format(&cfg, false), OutputFormat::Json);
    }

    #[test]
    fn test_reference_prefers_flags() {
        let mut cfg = Config::default();
        assert_eq!(reference(&cfg, None, None), None);
        cfg.receiver.lat = Some(35.5);
        cfg.receiver.lon = Some(-82.5);
        assert_eq!(reference(&cfg, None, None), Some(Position::new(35.5, -82.5)));
        assert_eq!(
            reference(&cfg, Some(52.3), Some(3.9)),
            Some(Position::new(52.3, 3.9))
        );
    }

    #[test]
    fn test_negative_reference_parses() {
        let cli = Cli::try_parse_from([
            "squitter", "resolve", ODD, EVEN, "--ref-lat", "-33.9", "--ref-lon", "-176.1",
        ])
        .unwrap();
        let Commands::Resolve { ref_lat, ref_lon, .. } = cli.command else {
            panic!("expected resolve");
        };
        assert_eq!(ref_lat, Some(-33.9));
        assert_eq!(ref_lon, Some(-176.1));
    }
}
