//! vitalwatch - vital-sign alerting tool
//!
//! A command-line tool for evaluating patient vital-sign readings against
//! detection rules and reporting deduplicated alerts.

use clap::Parser;
use vitalwatch::cli::args::{generate_completions, Cli, Commands};
use vitalwatch::commands::{run_classify, run_config, run_evaluate, run_rules};
use vitalwatch::config::ConfigBuilder;
use vitalwatch::error::{AppError, ConfigError, DataError};

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Set log level based on verbose flag
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    // Run the appropriate command
    let result = run(&cli);

    if let Err(e) = result {
        log::error!("{}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    if let Commands::Completions { shell } = &cli.command {
        generate_completions(*shell);
        return Ok(());
    }

    let config = ConfigBuilder::new()
        .with_file(cli.config.as_deref())?
        .with_verbose(cli.verbose.then_some(true))
        .with_color(cli.no_color.then_some(false))
        .build();

    if config.general.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    match &cli.command {
        Commands::Evaluate(args) => run_evaluate(args, config, cli.format),

        Commands::Rules => run_rules(&config, cli.format),

        Commands::Classify(args) => run_classify(args, &config, cli.format),

        Commands::Config => run_config(&config, cli.format),

        Commands::Completions { .. } => Ok(()),
    }
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    match err {
        AppError::Data(DataError::InputNotFound(_)) => {
            eprintln!();
            eprintln!("Hint: --input takes a data file or a directory of .txt/.csv files.");
        }
        AppError::Config(ConfigError::InvalidValue { .. } | ConfigError::TomlError(_)) => {
            eprintln!();
            eprintln!("Hint: Run 'vitalwatch config' without --config to see valid defaults.");
        }
        AppError::NoPatientsFound => {
            eprintln!();
            eprintln!("Hint: Lines must look like 'patientId,timestamp,label,value'.");
            eprintln!("      Run with --verbose to see which lines were skipped.");
        }
        _ => {}
    }
}
