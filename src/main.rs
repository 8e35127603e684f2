use anyhow::{bail, Context};
use clap::{Arg, ArgMatches, Command};
use csv_email_extractor::{Config, CsvPipeline, RecordClassifier, SyntaxValidator, ValidationMode};
use log::LevelFilter;
use std::path::PathBuf;
use std::process;

fn main() {
    let matches = cli().get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config = match load_config(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error loading configuration: {e:#}");
            process::exit(1);
        }
    };

    let filename = matches
        .get_one::<String>("filename")
        .map(String::as_str)
        .unwrap_or_default();

    match extract_emails(&config, filename) {
        Ok(message) => println!("✅ {message}"),
        Err(e) => {
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    }
}

fn cli() -> Command {
    Command::new("extract-emails-from-csv")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extracts email addresses from a CSV file into proper and wrong sets")
        .long_about(
            "Extracts email addresses from the given CSV file and stores proper ones in \
             proper_emails.csv and wrong ones in wrong_emails.csv, together with a \
             validation summary. The input file is looked up in the data directory and \
             all results are written to the result directory.",
        )
        .arg(
            Arg::new("filename")
                .value_name("FILENAME")
                .help("Name of csv file with email addresses to be processed")
                .required_unless_present("generate-config"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path (defaults are used when omitted)"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("Directory the input filename is resolved against"),
        )
        .arg(
            Arg::new("result-dir")
                .long("result-dir")
                .value_name("DIR")
                .help("Directory the result files are written to"),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .value_name("MODE")
                .help("Email syntax check to apply")
                .value_parser(clap::value_parser!(ValidationMode)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
}

fn generate_default_config(path: &str) {
    match Config::default().to_file(path) {
        Ok(()) => println!("✅ Default configuration written to {path}"),
        Err(e) => {
            eprintln!("❌ Error generating configuration: {e:#}");
            process::exit(1);
        }
    }
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<Config> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(dir) = matches.get_one::<String>("data-dir") {
        config.data_dir = PathBuf::from(dir);
    }
    if let Some(dir) = matches.get_one::<String>("result-dir") {
        config.result_dir = PathBuf::from(dir);
    }
    if let Some(mode) = matches.get_one::<ValidationMode>("mode") {
        config.validation_mode = *mode;
    }

    config.validate()?;
    Ok(config)
}

fn extract_emails(config: &Config, filename: &str) -> anyhow::Result<String> {
    if filename.trim().is_empty() {
        bail!("You have to pass name of source csv file");
    }

    let input_path = config.input_path(filename);
    if !input_path.is_file() {
        bail!(
            "You have to pass name of proper csv file, something is wrong with {}",
            filename
        );
    }

    std::fs::create_dir_all(&config.result_dir).with_context(|| {
        format!(
            "Failed to create result directory: {}",
            config.result_dir.display()
        )
    })?;

    log::debug!(
        "Processing {} with {:?} validation",
        input_path.display(),
        config.validation_mode
    );

    let classifier = RecordClassifier::new(SyntaxValidator::new(config.validation_mode));
    let mut pipeline =
        CsvPipeline::new(classifier).with_summary_delimiter(config.delimiter_byte());
    pipeline.set_source_path(&input_path);

    let report = pipeline
        .run(&config.output_paths(), filename)
        .with_context(|| format!("Failed to process {filename}"))?;

    for path in &report.written {
        log::debug!("Result file: {}", path.display());
    }

    Ok(report.message)
}
