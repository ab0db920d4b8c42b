use clap::Args;
use log::info;
use std::path::PathBuf;

use crate::cli::call::expand_genes;
use crate::cli::core::{check_required_filename, AFTER_HELP};
use crate::data_types::genome_build::GenomeBuild;

#[derive(Clone, Args)]
#[clap(author, about,
    after_help = &**AFTER_HELP)]
pub struct DescribeSettings {
    /// Folder containing the <GENE>_translation.json definition files
    #[clap(short = 'D')]
    #[clap(long = "definitions")]
    #[clap(value_name = "DIR")]
    #[clap(default_value = "data/definitions")]
    #[clap(help_heading = Some("Input/Output"))]
    pub definitions_folder: PathBuf,

    /// Gene to describe, or "all" for every shipped gene
    #[clap(short = 'g')]
    #[clap(long = "gene")]
    #[clap(value_name = "GENE")]
    #[clap(default_value = "all")]
    pub gene: String,

    /// Genome build to load the coordinates for
    #[clap(long = "build")]
    #[clap(value_name = "BUILD")]
    #[clap(default_value = "grch38")]
    pub build: GenomeBuild,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

pub fn check_describe_settings(settings: DescribeSettings) -> Result<(DescribeSettings, Vec<String>), Box<dyn std::error::Error>> {
    // dump stuff to the logger
    check_required_filename(&settings.definitions_folder, "Definitions folder");
    let genes = expand_genes(&settings.gene)?;

    info!("Definitions: {:?}", &settings.definitions_folder);
    info!("Genes: {genes:?}");
    info!("Build: {}", settings.build);

    Ok((settings, genes))
}
