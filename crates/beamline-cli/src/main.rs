//! Beamline command-line interface.
//!
//! Probe element fields and track particles from TOML job files:
//! ```sh
//! beamline-cli probe job.toml
//! beamline-cli cavity job.toml --beta 0.8 --beta 1.0
//! beamline-cli track job.toml
//! beamline-cli validate job.toml
//! ```

mod config;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "beamline-cli")]
#[command(about = "Beamline element fields and thin-element particle transport")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the element field along the configured probe line.
    Probe {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Report frequency, voltage and transit-time factors of a cavity element.
    Cavity {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Relativistic beta values for the transit-time factor.
        #[arg(short, long, default_values_t = vec![1.0])]
        beta: Vec<f64>,
        /// Simpson intervals for the on-axis integrals.
        #[arg(short, long, default_value_t = 200)]
        steps: usize,
    },
    /// Track the configured particles through the element.
    Track {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file and build its element without running.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Probe { config, output } => {
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());
            let element = runner::build_element(&job)?;
            let Some(probe) = &job.probe else {
                anyhow::bail!("No [probe] table in {}", config.display());
            };

            let samples = runner::probe_field(&element, probe)?;
            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));

            if job.output.save_csv {
                runner::write_probe_csv(&samples, &out_dir.join("probe.csv"), &element)?;
            }
            if job.output.save_json {
                runner::write_json(&samples, &out_dir.join("probe.json"))?;
            }
            println!("Probed {} points.", samples.len());
            Ok(())
        }
        Commands::Cavity { config, beta, steps } => {
            let job = config::load_config(&config)?;
            let element = runner::build_element(&job)?;
            let report = runner::cavity_report(&element, &beta, steps)?;

            println!("Cavity '{}'", element.name);
            println!("  frequency:         {:.6e} Hz", report.frequency);
            println!("  angular frequency: {:.6e} rad/s", report.angular_frequency);
            println!("  voltage:           {:.6e} V", report.voltage);
            for (b, ttf) in &report.transit_time_factors {
                println!("  TTF(beta={:.4}):    {:.6}", b, ttf);
            }

            if job.output.save_json {
                let path = PathBuf::from(&job.output.directory).join("cavity.json");
                runner::write_json(&report, &path)?;
            }
            Ok(())
        }
        Commands::Track { config, output } => {
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());
            let element = runner::build_element(&job)?;

            let points = runner::track_particles(&element, &job)?;
            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));

            if job.output.save_csv {
                runner::write_tracks_csv(&points, &out_dir.join("tracks.csv"), &element)?;
            }
            if job.output.save_json {
                runner::write_json(&points, &out_dir.join("tracks.json"))?;
            }
            println!("Tracking complete.");
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            let element = runner::build_element(&job)?;
            println!(
                "Configuration is valid: {} ({} element '{}')",
                config.display(),
                element.type_name(),
                element.name
            );
            Ok(())
        }
    }
}
