
use log::{LevelFilter, error, info};

use citydawg::cli::call::{CallSettings, check_call_settings};
use citydawg::cli::core::{Commands, get_cli};
use citydawg::cli::describe::{DescribeSettings, check_describe_settings};
use citydawg::data_types::call_results::CallResults;
use citydawg::data_types::haplotype_matrix::ReferenceMatrix;
use citydawg::definition_loader::load_reference_matrix;
use citydawg::errors::{ExtractorError, LoaderError};
use citydawg::util::file_io::{save_calls_tsv, save_json};

/// Sets up the logger based on the verbosity count
/// # Arguments
/// * `verbosity` - number of times -v was provided
fn init_logging(verbosity: u8) {
    let filter_level: LevelFilter = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };

    // immediately setup logging first
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();
}

/// Picks the exit code for an error that came out of the calling pipeline
/// # Arguments
/// * `error` - the error to classify
fn pipeline_exit_code(error: &(dyn std::error::Error + 'static)) -> exitcode::ExitCode {
    if let Some(loader_error) = error.downcast_ref::<LoaderError>() {
        match loader_error {
            LoaderError::DefinitionNotFound { .. } => exitcode::NOINPUT,
            LoaderError::MalformedDefinition { .. } => exitcode::DATAERR
        }
    } else if let Some(extractor_error) = error.downcast_ref::<ExtractorError>() {
        match extractor_error {
            ExtractorError::MissingSamples { .. } |
            ExtractorError::CoordinateMismatch { .. } => exitcode::DATAERR
        }
    } else if error.downcast_ref::<std::io::Error>().is_some() {
        exitcode::IOERR
    } else {
        exitcode::SOFTWARE
    }
}

/// This will run the "call" mode of the tool
/// # Arguments
/// * `settings` - the CallSettings object
fn run_call(settings: CallSettings) {
    init_logging(settings.verbosity);

    // okay, now we can check all the other settings
    let cli_settings: CallSettings = match check_call_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while processing CLI settings: {e}");
            std::process::exit(exitcode::USAGE);
        }
    };

    // now hand it to the diplotype caller
    let results: CallResults = match citydawg::diplotyper::call_diplotypes(&cli_settings) {
        Ok(r) => r,
        Err(e) => {
            error!("Error while calling diplotypes: {e}");
            std::process::exit(pipeline_exit_code(e.as_ref()));
        }
    };

    // save the diplotypes to the defined file
    info!("Saving diplotypes to {:?}", cli_settings.diplotype_filename);
    match save_json(&results, &cli_settings.diplotype_filename) {
        Ok(()) => {},
        Err(e) => {
            error!("Error while writing diplotypes to file: {e}");
            std::process::exit(exitcode::IOERR);
        }
    };

    if let Some(filename) = cli_settings.calls_tsv.as_ref() {
        info!("Saving diplotype table to {:?}", filename);
        match save_calls_tsv(&results, filename) {
            Ok(()) => {},
            Err(e) => {
                error!("Error while writing diplotype table to file: {e}");
                std::process::exit(exitcode::IOERR);
            }
        };
    }
}

/// This will run the "describe" mode of the tool
/// # Arguments
/// * `settings` - the DescribeSettings object
fn run_describe(settings: DescribeSettings) {
    init_logging(settings.verbosity);

    // okay, now we can check all the other settings
    let (cli_settings, genes) = match check_describe_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while processing CLI settings: {e}");
            std::process::exit(exitcode::USAGE);
        }
    };

    for gene in genes.iter() {
        info!("Loading {gene} definition from {:?}...", cli_settings.definitions_folder);
        let matrix: ReferenceMatrix = match load_reference_matrix(&cli_settings.definitions_folder, gene, cli_settings.build) {
            Ok(m) => m,
            Err(e) => {
                error!("Error while loading gene definition: {e}");
                std::process::exit(pipeline_exit_code(&e));
            }
        };

        // display the matrix statistics
        citydawg::describe::print_stats(&matrix);
    }
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::Call(settings) => {
            run_call(*settings);
        },
        Commands::Describe(settings) => {
            run_describe(*settings);
        }
    }

    info!("Process finished successfully.");
}
