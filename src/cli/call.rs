
use clap::Args;
use log::{info, warn};
use simple_error::bail;
use std::path::PathBuf;

use crate::cli::core::{AFTER_HELP, check_required_filename};
use crate::data_types::genome_build::GenomeBuild;

/// Genes we ship definitions for; this is what "all" expands to
pub const SUPPORTED_GENES: [&str; 2] = ["CYP2C9", "CYP2C19"];

/// Above this many samples, we recommend batch mode
pub const BATCH_RECOMMENDATION: usize = 10000;

#[derive(Args, Clone, Default)]
#[clap(author, about,
    after_help = &**AFTER_HELP)]
pub struct CallSettings {
    /// Input variant file in VCF/BCF format
    #[clap(required = true)]
    #[clap(short = 'c')]
    #[clap(long = "vcf")]
    #[clap(value_name = "VCF")]
    #[clap(help_heading = Some("Input/Output"))]
    pub vcf_filename: PathBuf,

    /// Folder containing the <GENE>_translation.json definition files
    #[clap(short = 'D')]
    #[clap(long = "definitions")]
    #[clap(value_name = "DIR")]
    #[clap(default_value = "data/definitions")]
    #[clap(help_heading = Some("Input/Output"))]
    pub definitions_folder: PathBuf,

    /// Output diplotype call file (JSON)
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-calls")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub diplotype_filename: PathBuf,

    /// Optional flat table of calls with one row per sample and gene
    #[clap(long = "output-tsv")]
    #[clap(value_name = "TSV")]
    #[clap(help_heading = Some("Input/Output"))]
    pub calls_tsv: Option<PathBuf>,

    /// Gene to call, which needs a <GENE>_translation.json definition; "all" calls every shipped gene
    #[clap(short = 'g')]
    #[clap(long = "gene")]
    #[clap(value_name = "GENE")]
    #[clap(default_value = "all")]
    #[clap(help_heading = Some("Calling"))]
    pub gene: String,

    /// Genome build of the VCF coordinates
    #[clap(long = "build")]
    #[clap(value_name = "BUILD")]
    #[clap(default_value = "grch38")]
    #[clap(help_heading = Some("Calling"))]
    pub build: GenomeBuild,

    /// Treat the genotypes as phased, skipping detection
    #[clap(long = "phased")]
    #[clap(conflicts_with = "unphased")]
    #[clap(help_heading = Some("Calling"))]
    pub phased: bool,

    /// Treat the genotypes as unphased, skipping detection
    #[clap(long = "unphased")]
    #[clap(help_heading = Some("Calling"))]
    pub unphased: bool,

    /// Extract and call samples in fixed-size batches to bound memory
    #[clap(short = 'b')]
    #[clap(long = "batch")]
    #[clap(help_heading = Some("Calling"))]
    pub batch_mode: bool,

    /// Number of samples per batch in batch mode
    #[clap(long = "batch-size")]
    #[clap(value_name = "COUNT")]
    #[clap(default_value = "10000")]
    #[clap(help_heading = Some("Calling"))]
    pub batch_size: usize,

    /// Number of threads to use for calling.
    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    pub threads: usize,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

impl CallSettings {
    /// The phasing mode the user asked for, None means detect it
    pub fn explicit_phasing(&self) -> Option<bool> {
        if self.phased {
            Some(true)
        } else if self.unphased {
            Some(false)
        } else {
            None
        }
    }

    /// The batch size to use, None when batch mode is off
    pub fn effective_batch_size(&self) -> Option<usize> {
        if self.batch_mode {
            Some(self.batch_size)
        } else {
            None
        }
    }

    /// Expands the gene option into the list of genes to process
    /// # Errors
    /// * if the gene name is empty
    pub fn genes(&self) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        expand_genes(&self.gene)
    }
}

/// Expands "all" into the shipped gene list.
/// Any other name is passed through, shipped genes are matched case-insensitively.
/// Whether a definition exists is up to the loader.
/// # Errors
/// * if the gene name is empty
pub fn expand_genes(gene: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let gene = gene.trim();
    if gene.is_empty() {
        bail!("--gene must not be empty");
    }
    if gene.eq_ignore_ascii_case("all") {
        return Ok(SUPPORTED_GENES.iter().map(|g| g.to_string()).collect());
    }
    match SUPPORTED_GENES.iter().find(|g| g.eq_ignore_ascii_case(gene)) {
        Some(g) => Ok(vec![g.to_string()]),
        None => Ok(vec![gene.to_string()])
    }
}

pub fn check_call_settings(settings: CallSettings) -> Result<CallSettings, Box<dyn std::error::Error>> {
    info!("Inputs:");

    // check for all the required input files
    check_required_filename(&settings.vcf_filename, "VCF file");
    check_required_filename(&settings.definitions_folder, "Definitions folder");

    // dump stuff to the logger
    info!("\tVCF: {:?}", settings.vcf_filename);
    info!("\tDefinitions: {:?}", settings.definitions_folder);

    // outputs
    info!("Outputs:");
    info!("\tDiplotype calls: {:?}", settings.diplotype_filename);
    if let Some(filename) = settings.calls_tsv.as_ref() {
        info!("\tCalls TSV: {:?}", filename);
    }

    // calling settings
    info!("Calling settings:");
    let genes = settings.genes()?;
    info!("\tGenes: {genes:?}");
    info!("\tBuild: {}", settings.build);
    match settings.explicit_phasing() {
        Some(true) => info!("\tPhasing: phased"),
        Some(false) => info!("\tPhasing: unphased"),
        None => info!("\tPhasing: detect from VCF")
    };
    if settings.batch_mode {
        if settings.batch_size == 0 {
            bail!("--batch-size must be greater than 0");
        }
        info!("\tBatch mode: {} samples per batch", settings.batch_size);
    } else {
        info!("\tBatch mode: DISABLED");
    }

    if settings.threads == 0 {
        bail!("--threads must be greater than 0");
    }
    info!("Processing threads: {}", settings.threads);

    Ok(settings)
}

/// Logs a warning if a large sample set is being processed without batches
pub fn check_batch_recommendation(num_samples: usize, batch_mode: bool) {
    if !batch_mode && num_samples > BATCH_RECOMMENDATION {
        warn!("{num_samples} samples without batch mode, consider --batch to bound memory usage");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_genes() {
        assert_eq!(expand_genes("all").unwrap(), vec!["CYP2C9".to_string(), "CYP2C19".to_string()]);
        assert_eq!(expand_genes("cyp2c19").unwrap(), vec!["CYP2C19".to_string()]);
        // anything else goes to the loader as written
        assert_eq!(expand_genes("CYP3A5").unwrap(), vec!["CYP3A5".to_string()]);
        assert!(expand_genes("  ").is_err());
    }

    #[test]
    fn test_settings_helpers() {
        let mut settings = CallSettings {
            batch_size: 100,
            ..Default::default()
        };
        assert_eq!(settings.explicit_phasing(), None);
        assert_eq!(settings.effective_batch_size(), None);

        settings.unphased = true;
        settings.batch_mode = true;
        assert_eq!(settings.explicit_phasing(), Some(false));
        assert_eq!(settings.effective_batch_size(), Some(100));
    }
}
