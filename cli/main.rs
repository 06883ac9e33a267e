#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

use clap::{Args, CommandFactory, Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process;

use annulus::calculator::Calculator;
use annulus::config::CalculatorConfig;
use annulus::grid::AadGrid;
use annulus::stats::PredictionReport;

#[derive(Args)]
pub struct GridArgs {
    /// Path to the AAD grid file (.json or .toml)
    #[arg(long, env = "ANNULUS_GRID")]
    pub grid: Option<PathBuf>,

    /// Optional TOML config file with the grid location and input limits
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct PredictArgs {
    #[command(flatten)]
    pub grid: GridArgs,

    /// Age in years
    #[arg(long, allow_hyphen_values = true)]
    pub age: f64,

    /// Weight in kilograms
    #[arg(long, allow_hyphen_values = true)]
    pub weight: f64,

    /// Height in centimetres
    #[arg(long, allow_hyphen_values = true)]
    pub height: f64,

    /// Sex: male or female
    #[arg(long)]
    pub sex: String,

    /// Measured annulus diameter in mm; enables the Z-score
    #[arg(long, allow_hyphen_values = true)]
    pub measured: Option<f64>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
#[command(
    name = "annulus",
    version,
    about = "Predicts the expected aortic annulus diameter from age, weight, height and sex."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict the mean AAD, its standard deviation and the normal range
    Predict(PredictArgs),
    /// Print the axes and size of a grid file
    Inspect(GridArgs),
}

fn resolve_grid(
    args: &GridArgs,
) -> Result<(PathBuf, CalculatorConfig), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => CalculatorConfig::load(path)?,
        None => CalculatorConfig::default(),
    };
    let grid_path = args.grid.clone().or_else(|| config.grid.clone()).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "No grid file given. Use --grid, set ANNULUS_GRID, or set `grid` in the config file.",
        )
    })?;
    Ok((grid_path, config))
}

pub fn predict(args: PredictArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (grid_path, config) = resolve_grid(&args.grid)?;
    let calculator = Calculator::new(config.limits);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(calculator.load(&grid_path))?;

    let prediction = calculator.predict_labeled(args.age, args.weight, args.height, &args.sex)?;
    let report = prediction.report(args.measured);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &PredictionReport) {
    let p = &report.prediction;
    println!("Predicted AAD:      {:.3} mm", p.mean_aad);
    println!("Standard deviation: {:.3} mm", p.std_dev);
    println!(
        "Normal range:       {:.3} - {:.3} mm (mean ± 2 SD)",
        p.lower_bound, p.upper_bound
    );
    match (report.measured, report.z_score, report.band) {
        (Some(measured), Some(z), Some(band)) => {
            println!("Measured AAD:       {measured:.3} mm");
            println!("Z-score:            {z:.3} ({band})");
        }
        (Some(measured), _, _) => {
            println!("Measured AAD:       {measured} mm");
            println!("Z-score:            not available (measured value must be positive)");
        }
        (None, _, _) => {}
    }
}

pub fn inspect(args: GridArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (grid_path, _) = resolve_grid(&args)?;
    println!("Loading grid from: {}", grid_path.display());
    let grid = AadGrid::load(&grid_path)?;
    println!("{}", grid.summary());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Some(Commands::Predict(args)) => predict(args),
        Some(Commands::Inspect(args)) => inspect(args),
        None => Cli::command()
            .print_help()
            .map(|_| println!())
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
