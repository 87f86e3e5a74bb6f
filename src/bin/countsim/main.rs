mod logging;

use clap::{Parser, Subcommand, ValueEnum};
use countsim::{
    ExperimentConfig, ExperimentModel, ExponentialDecay, Hold, PoissonProcess, TrialRunner,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::error::Error;
use tracing::info;

#[derive(Parser)]
#[command(name = "countsim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Seed for the uniform source
    #[arg(long, global = true, env = "COUNTSIM_SEED", default_value_t = 2736687128)]
    seed: u64,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Measure the mean arrival-time shift between long-hold and short-hold counting
    Shift {
        /// Dip table to simulate
        #[arg(long, env = "COUNTSIM_PRESET", value_enum, default_value_t = Preset::Single)]
        preset: Preset,

        /// Paired trials per batch
        #[arg(long, env = "COUNTSIM_RUNS", default_value_t = 200)]
        runs: usize,

        /// Number of batches
        #[arg(long, env = "COUNTSIM_BATCHES", default_value_t = 5)]
        batches: usize,

        /// Override the expected short-hold signal count
        #[arg(long)]
        num_hits: Option<f64>,

        /// Override the holding time
        #[arg(long)]
        hold_time: Option<f64>,

        /// Override the background rate
        #[arg(long)]
        background_rate: Option<f64>,
    },
    /// Realize a single exponentially decaying process and count its events
    Realize {
        /// Expected total count of the population
        #[arg(long, default_value_t = 100.0)]
        amplitude: f64,

        /// Decay time constant
        #[arg(long, default_value_t = 10.0)]
        time_constant: f64,

        /// Length of the counting window
        #[arg(long, default_value_t = 20.0)]
        length: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Single,
    ThreeDip,
    NineDip,
}

impl Preset {
    fn config(self) -> ExperimentConfig {
        match self {
            Preset::Single => ExperimentConfig::single_dip(),
            Preset::ThreeDip => ExperimentConfig::three_dip(),
            Preset::NineDip => ExperimentConfig::nine_dip(),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let mut rng = StdRng::seed_from_u64(cli.seed);
    match cli.command {
        Command::Shift {
            preset,
            runs,
            batches,
            num_hits,
            hold_time,
            background_rate,
        } => {
            let mut config = preset.config();
            if let Some(num_hits) = num_hits {
                config.num_hits = num_hits;
            }
            if let Some(hold_time) = hold_time {
                config.hold_time = hold_time;
            }
            if let Some(background_rate) = background_rate {
                config.background_rate = background_rate;
            }

            let mut model = ExperimentModel::new(&config, rng)?;
            info!(
                seed = cli.seed,
                runs,
                batches,
                expected_short = model.expected_count(Hold::Short),
                expected_long = model.expected_count(Hold::Long),
                "starting shift measurement"
            );

            let report = TrialRunner::new(runs, batches).run(&mut model);
            for batch in &report.batches {
                match batch.shift {
                    Some(shift) => println!(
                        "Avg Arrival Time Shift: {:.6} stddev: {:.6}",
                        shift.mean, shift.std_dev
                    ),
                    None => println!("Avg Arrival Time Shift: no data"),
                }
            }
            match report.grand {
                Some(grand) => println!(
                    "Grand Avg Arrival Time Shift: {:.6} stddev: {:.6}",
                    grand.mean, grand.std_dev
                ),
                None => println!("Grand Avg Arrival Time Shift: no data"),
            }
        }
        Command::Realize {
            amplitude,
            time_constant,
            length,
        } => {
            let decay = ExponentialDecay::new(amplitude, time_constant)?;
            let mut process = PoissonProcess::new(decay)?;
            let events = process.events_to_time(&mut rng, length);
            println!("Generated {} Events!", events.len());
        }
    }
    Ok(())
}
