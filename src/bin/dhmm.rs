use clap::{Parser, Subcommand};
use dhmm::cli;
use dhmm::forward::LogBase;
use dhmm::train::{TrainConfig, DEFAULT_MAX_ITER};
use log::error;

#[derive(Parser, Debug)]
#[clap(author, about, version)]
struct Opts {
    /// Check that every row of A, B and pi sums to one
    #[clap(long)]
    strict: bool,
    /// Tolerance of the --strict check
    #[clap(long, default_value_t = cli::DEFAULT_STRICT_TOLERANCE)]
    tolerance: f64,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Probability of the observation sequence (lines: A, B, pi, sequence)
    Evaluate {
        /// Print the log-likelihood computed with the scaled forward pass
        #[clap(long)]
        log: bool,
        /// Base of the log-likelihood: e, 2 or 10. Implies --log
        #[clap(long)]
        log_base: Option<LogBase>,
        /// Input filename. stdin if not specified
        input: Option<std::path::PathBuf>,
    },
    /// Most likely hidden state path (lines: A, B, pi, sequence)
    Decode {
        /// Input filename. stdin if not specified
        input: Option<std::path::PathBuf>,
    },
    /// Baum-Welch training (lines: A, B, pi, sequence)
    Learn {
        /// Maximum number of EM iterations
        #[clap(long, default_value_t = DEFAULT_MAX_ITER)]
        max_iter: usize,
        /// Base of the reported log-likelihood: e, 2 or 10
        #[clap(long, default_value_t = LogBase::Natural)]
        log_base: LogBase,
        /// Print the trained model and the training summary as JSON
        #[clap(long)]
        json: bool,
        /// Input filename. stdin if not specified
        input: Option<std::path::PathBuf>,
    },
    /// Emission distribution after one step, pi*A*B (lines: A, B, pi)
    Propagate {
        /// Input filename. stdin if not specified
        input: Option<std::path::PathBuf>,
    },
    /// Sample an observation sequence from the model (lines: A, B, pi)
    Sample {
        /// Length of the sequence
        #[clap(short = 'l', long)]
        length: usize,
        /// Seed of the random number generator
        #[clap(short = 's', long, default_value_t = 0)]
        seed: u64,
        /// Also print the hidden states
        #[clap(long)]
        states: bool,
        /// Input filename. stdin if not specified
        input: Option<std::path::PathBuf>,
    },
}

fn run(opts: &Opts) -> dhmm::Result<String> {
    let strict = if opts.strict {
        Some(opts.tolerance)
    } else {
        None
    };
    match &opts.command {
        Commands::Evaluate {
            log,
            log_base,
            input,
        } => {
            let input = cli::load(cli::open_input(input.as_deref())?, true, strict)?;
            cli::evaluate(&input, cli::evaluate_log_base(*log, *log_base))
        }
        Commands::Decode { input } => {
            let input = cli::load(cli::open_input(input.as_deref())?, true, strict)?;
            cli::decode(&input)
        }
        Commands::Learn {
            max_iter,
            log_base,
            json,
            input,
        } => {
            let input = cli::load(cli::open_input(input.as_deref())?, true, strict)?;
            let config = TrainConfig {
                max_iter: *max_iter,
                log_base: *log_base,
            };
            cli::learn(&input, config, *json)
        }
        Commands::Propagate { input } => {
            let input = cli::load(cli::open_input(input.as_deref())?, false, strict)?;
            cli::propagate(&input)
        }
        Commands::Sample {
            length,
            seed,
            states,
            input,
        } => {
            let input = cli::load(cli::open_input(input.as_deref())?, false, strict)?;
            cli::sample(&input, *length, *seed, *states)
        }
    }
}

fn main() {
    env_logger::init();
    let opts: Opts = Opts::parse();
    log::debug!("opts={:?}", opts);
    match run(&opts) {
        Ok(out) => println!("{}", out),
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
