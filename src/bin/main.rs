use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use le_sizer::NetlistError;
use le_sizer::config::SizerConfig;
use le_sizer::report::{Statistics, dump_sizes};
use le_sizer::sizer::Sizer;
use le_sizer::testcase::ring_oscillator;

/// Size the reference ring-oscillator design with logical effort
#[derive(Debug, Parser)]
#[command(name = "le-sizer", version)]
struct Args {
    /// JSON preferences file with sizing parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Global step-up (su)
    #[arg(long)]
    step_up: Option<f64>,

    /// Convergence tolerance on the relative size change of a pass
    #[arg(long)]
    epsilon: Option<f64>,

    /// Maximum number of passes
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Diffusion to gate capacitance ratio
    #[arg(long)]
    alpha: Option<f64>,

    /// Keeper size relative to the weakest opposing driver
    #[arg(long)]
    keeper_ratio: Option<f64>,

    /// Write the final sizes to this file
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn sizer_config(&self) -> Result<SizerConfig, NetlistError> {
        let mut config = match &self.config {
            Some(path) => SizerConfig::load(path)?,
            None => SizerConfig::default(),
        };
        if let Some(v) = self.step_up {
            config.global_step_up = v;
        }
        if let Some(v) = self.epsilon {
            config.convergence_epsilon = v;
        }
        if let Some(v) = self.max_iterations {
            config.max_iterations = v;
        }
        if let Some(v) = self.alpha {
            config.diffusion_alpha = v;
        }
        if let Some(v) = self.keeper_ratio {
            config.keeper_ratio = v;
        }
        config.validate()?;
        Ok(config)
    }
}

fn run(args: &Args) -> Result<bool, NetlistError> {
    let config = args.sizer_config()?;
    let mut netlist = ring_oscillator(config.global_step_up)?;

    let report = Sizer::new(&mut netlist).run(&config, || false)?;
    println!("{report}");
    for diagnostic in report.diagnostics.iter() {
        println!("  {diagnostic}");
    }
    if !report.is_success() {
        println!("Sizing failed; sizes left as last committed");
    }

    print!("{}", Statistics::collect(&netlist, &config));
    for (name, size) in netlist.sizes() {
        println!("  {name}: {size:.4}");
    }

    if let Some(path) = &args.dump {
        dump_sizes(&netlist, path)?;
    }
    Ok(report.is_success())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
