use anyhow::Result;
use clap::{Parser, Subcommand};
use flappy_neat::assets::Assets;
use flappy_neat::train::{self, DEFAULT_GENERATIONS, TrainOptions, Trainer};
use flappy_neat::app;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "flappy-neat")]
#[command(about = "Flappy Bird, by hand or by NEAT-evolved networks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play with the keyboard: Space/Up/W flap, P pause, R restart, Esc quit
    Play {
        #[arg(long, default_value = "assets")]
        assets: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Evolve a population of birds
    Train {
        /// neat-python style config file
        #[arg(long, default_value = "config.txt")]
        config: PathBuf,
        #[arg(long, default_value_t = DEFAULT_GENERATIONS)]
        generations: usize,
        #[arg(long, default_value = "assets")]
        assets: PathBuf,
        /// Run without a window, as fast as possible
        #[arg(long)]
        headless: bool,
        /// End a round once this many pipes are cleared
        #[arg(long)]
        max_score: Option<u32>,
        /// Write a JSON summary of the run here
        #[arg(long)]
        report: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Commands::Play { assets, seed } => app::run_play(Assets::load(&assets), seed),
        Commands::Train {
            config,
            generations,
            assets,
            headless,
            max_score,
            report,
            seed,
        } => {
            let assets = Assets::load(&assets);
            let options = TrainOptions {
                generations,
                max_score,
                seed,
            };
            let mut trainer = Trainer::from_file(&config, options, &assets)?;
            if !headless {
                return app::run_train(assets, trainer, report);
            }
            let summary = trainer.run_headless(&assets)?;
            tracing::info!(
                generations = summary.generations,
                solved = summary.solved,
                best_fitness = ?summary.best_fitness,
                "training finished"
            );
            if let Some(path) = &report {
                train::write_report(path, &summary)?;
            }
            Ok(())
        }
    }
}
