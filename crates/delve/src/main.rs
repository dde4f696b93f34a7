//! Command-line level generator
//!
//! Generates one level and prints it as ASCII or JSON.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use serde::Serialize;
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use delve_core::dungeon::remove_unused_holes;
use delve_core::{
    ConfigError, DungeonConfig, GameRng, GenError, GeneratedLevel, LevelRequest, Loc, Paradigm, RoomRegistry,
    generate_level,
};

/// Dungeon level generator
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(author, version, about = "Generate a dungeon level", long_about = None)]
struct Args {
    /// Dungeon depth
    #[arg(short = 'd', long = "depth", default_value_t = 10)]
    depth: i32,

    /// RNG seed (random when omitted)
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,

    /// Force a paradigm: classic, modified, labyrinth, cavern or moria
    #[arg(short = 'p', long = "paradigm")]
    paradigm: Option<Paradigm>,

    /// JSON profile file overriding the defaults
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Generate a quest level
    #[arg(long = "quest")]
    quest: bool,

    /// Smallest acceptable height
    #[arg(long = "min-height", default_value_t = 0)]
    min_height: i32,

    /// Smallest acceptable width
    #[arg(long = "min-width", default_value_t = 0)]
    min_width: i32,

    /// Single-width tunnels and doors
    #[arg(long = "turn-based")]
    turn_based: bool,

    /// Keep unused stair holes instead of filling them
    #[arg(long = "keep-holes")]
    keep_holes: bool,

    /// Print JSON instead of ASCII
    #[arg(long = "json")]
    json: bool,

    /// List the paradigms and exit
    #[arg(long = "list")]
    list: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Generation(#[from] GenError),

    #[error("could not encode level: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("could not write output: {0}")]
    Write(#[from] io::Error),
}

/// JSON form of a generated level
#[derive(Serialize)]
struct LevelDump<'a> {
    seed: u64,
    depth: i32,
    paradigm: Paradigm,
    height: i32,
    width: i32,
    known: bool,
    centres: &'a [Loc],
    rows: Vec<String>,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn load_config(args: &Args) -> Result<DungeonConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| CliError::Read {
                path: path.clone(),
                source,
            })?;
            DungeonConfig::from_json(&text)?
        }
        None => DungeonConfig::default(),
    };
    if args.turn_based {
        config.turn_based = true;
    }
    Ok(config)
}

fn print_level(level: &GeneratedLevel, args: &Args, out: &mut impl Write) -> Result<(), CliError> {
    let ascii = level.chunk.to_ascii();
    if args.json {
        let dump = LevelDump {
            seed: level.seed,
            depth: level.chunk.depth(),
            paradigm: level.paradigm,
            height: level.chunk.height(),
            width: level.chunk.width(),
            known: level.chunk.light_level,
            centres: &level.centres,
            rows: ascii.lines().map(str::to_string).collect(),
        };
        serde_json::to_writer_pretty(&mut *out, &dump)?;
        writeln!(out)?;
    } else {
        writeln!(
            out,
            "{} level, depth {}, seed {}, {}x{}, {} rooms",
            level.paradigm,
            level.chunk.depth(),
            level.seed,
            level.chunk.height(),
            level.chunk.width(),
            level.centres.len()
        )?;
        out.write_all(ascii.as_bytes())?;
    }
    Ok(())
}

fn run(args: &Args) -> Result<(), CliError> {
    let config = load_config(args)?;
    let registry = RoomRegistry::with_defaults();
    let mut rng = match args.seed {
        Some(seed) => GameRng::new(seed),
        None => GameRng::from_entropy(),
    };

    let request = LevelRequest {
        depth: args.depth,
        min_height: args.min_height,
        min_width: args.min_width,
        quest: args.quest,
        paradigm: args.paradigm,
    };
    let mut level = generate_level(&config, &registry, &request, &mut rng)?;

    // no stairs are placed here, so every hole is unused
    if !args.keep_holes {
        let filled = remove_unused_holes(&mut level.chunk);
        debug!(filled, "unused holes filled");
    }

    let stdout = io::stdout();
    print_level(&level, args, &mut stdout.lock())
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.list {
        for paradigm in Paradigm::iter() {
            println!("{paradigm}");
        }
        return ExitCode::SUCCESS;
    }

    init_tracing(args.verbose);
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "generation failed");
            eprintln!("delve: {err}");
            ExitCode::FAILURE
        }
    }
}
