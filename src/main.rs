use clap::Parser;
use log::{error, info, LevelFilter};
use primcell::utils::logger;
use primcell::{is_primitive, primitive, Config, Result, Structure};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

/// Reduces a crystal structure (JSON) to its primitive cell and prints it as JSON.
#[derive(Parser, Debug)]
#[command(name = "primcell")]
#[command(version, about)]
struct Cli {
    /// Structure file (JSON)
    input: PathBuf,

    /// Fractional tolerance (default from config, 1e-8)
    #[arg(short, long)]
    tolerance: Option<f64>,

    /// Read settings from this file instead of the user config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the reduced structure here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only print whether the structure is already primitive
    #[arg(long)]
    check: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    let args = Cli::parse();

    // 1. Config first, so the logger can honour its level
    let (config, config_msg) = match &args.config {
        Some(path) => match Config::load_from(path) {
            Ok(cfg) => (cfg, format!("Config loaded from {:?}", path)),
            Err(e) => {
                eprintln!("Could not read config {:?}: {}", path, e);
                return ExitCode::from(2);
            }
        },
        None => Config::load(),
    };

    let level = logger::parse_level(&config.log_level).unwrap_or(LevelFilter::Info);
    if logger::init(level).is_err() {
        eprintln!("Logger already initialised");
    }
    info!("{}", config_msg);

    // 2. Run
    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Cli, config: &Config) -> Result<()> {
    let tolerance = args.tolerance.unwrap_or(config.tolerance);

    let reader = BufReader::new(File::open(&args.input)?);
    let structure: Structure = serde_json::from_reader(reader)?;
    info!(
        "Loaded {} atom(s) from {:?} (volume {:.6})",
        structure.len(),
        args.input,
        structure.volume()
    );

    if args.check {
        println!("{}", is_primitive(&structure, tolerance)?);
        return Ok(());
    }

    let reduced = primitive(&structure, tolerance)?;
    info!(
        "Primitive cell: {} atom(s), volume {:.6}",
        reduced.len(),
        reduced.volume()
    );

    let text = if args.pretty || config.pretty_output {
        serde_json::to_string_pretty(&reduced)?
    } else {
        serde_json::to_string(&reduced)?
    };

    match &args.output {
        Some(path) => {
            fs::write(path, text + "\n")?;
            info!("Saved to {:?}", path);
        }
        None => println!("{}", text),
    }
    Ok(())
}
