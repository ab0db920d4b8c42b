
use log::{debug, info, trace};
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;

use crate::caller::DiplotypeCaller;
use crate::cli::call::{CallSettings, check_batch_recommendation};
use crate::data_types::call_results::{CallResults, GeneCallDetails, RunMetadata, SampleCall};
use crate::data_types::diplotype_call::DiplotypeCall;
use crate::data_types::genome_build::GenomeBuild;
use crate::data_types::haplotype_matrix::ReferenceMatrix;
use crate::definition_loader::load_reference_matrix;
use crate::errors::CallerError;
use crate::genotype_extractor::VariantSource;

/// Options that control how a single gene is processed
#[derive(Clone, Copy, Debug)]
pub struct GeneOptions<'a> {
    /// Folder with the gene definition files
    pub definitions_folder: &'a Path,
    /// Build of the variant coordinates
    pub build: GenomeBuild,
    /// User provided phasing mode, None to detect
    pub explicit_phasing: Option<bool>,
    /// Samples per batch, None for a single batch
    pub batch_size: Option<usize>
}

/// This is the main function to call all of the diplotypes.
/// It opens the VCF once, then processes each requested gene in turn.
/// # Arguments
/// * `cli_settings` - the full settings for calling
/// # Errors
/// * if the VCF cannot be opened or has no samples
/// * if the VCF assembly does not match the requested build
/// * if any gene fails to load, extract, or call
pub fn call_diplotypes(cli_settings: &CallSettings) -> Result<CallResults, Box<dyn std::error::Error>> {
    let source = VariantSource::open(&cli_settings.vcf_filename)?;
    info!("Loaded {} samples from {:?}", source.num_samples(), source.path());
    source.check_build(cli_settings.build)?;
    check_batch_recommendation(source.num_samples(), cli_settings.batch_mode);

    let thread_pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cli_settings.threads)
        .build()?;

    let options = GeneOptions {
        definitions_folder: &cli_settings.definitions_folder,
        build: cli_settings.build,
        explicit_phasing: cli_settings.explicit_phasing(),
        batch_size: cli_settings.effective_batch_size()
    };

    let mut results = CallResults::new(RunMetadata::new(cli_settings.build, options.batch_size));
    for gene in cli_settings.genes()?.into_iter() {
        info!("Solving {gene}...");
        let details = process_gene(&source, &gene, &options, &thread_pool)?;
        info!("Finished {gene}: {:?}", details.status_counts());
        results.insert(gene, details)?;
    }
    Ok(results)
}

/// Runs the loader, extractor, and caller for one gene.
/// Batches are processed in order and samples within a batch are called in parallel, so calls come back in sample order.
/// # Arguments
/// * `source` - the opened variant source
/// * `gene` - the gene to call
/// * `options` - how to process the gene
/// * `thread_pool` - the pool that per-sample calls run on
/// # Errors
/// * if the definition is missing or malformed
/// * if the VCF records cannot be read
/// * if the caller rejects the extracted vectors
pub fn process_gene(
    source: &VariantSource, gene: &str, options: &GeneOptions, thread_pool: &rayon::ThreadPool
) -> Result<GeneCallDetails, Box<dyn std::error::Error>> {
    let prep_start = Instant::now();
    let matrix: ReferenceMatrix = load_reference_matrix(options.definitions_folder, gene, options.build)?;
    debug!("Loaded {} variant positions and {} alleles for {gene}", matrix.num_rows(), matrix.num_alleles());
    let phased = source.resolve_phasing(&matrix, options.explicit_phasing)?;
    debug!("Preparation for {gene} took {:?}, phased: {phased}", prep_start.elapsed());

    let caller = DiplotypeCaller::new(&matrix, phased);
    let mut calls: Vec<SampleCall> = Vec::with_capacity(source.num_samples());
    let batches = source.batches(options.batch_size);
    let num_batches = batches.len();
    for (batch_index, sample_range) in batches.into_iter().enumerate() {
        if num_batches > 1 {
            info!("Processing batch {}/{num_batches} (samples {sample_range:?})", batch_index + 1);
        }

        let extract_start = Instant::now();
        let samples = source.extract(&matrix, sample_range)?;
        debug!("Extraction of {} samples took {:?}", samples.len(), extract_start.elapsed());

        let call_start = Instant::now();
        let batch_calls: Vec<DiplotypeCall> = thread_pool.install(|| {
            samples.par_iter()
                .map(|sample| caller.call_sample(sample))
                .collect::<Result<Vec<DiplotypeCall>, CallerError>>()
        })?;
        debug!("Calling {} samples took {:?}", batch_calls.len(), call_start.elapsed());

        // samples go out of scope here, only the calls are kept
        for (sample, call) in samples.into_iter().zip(batch_calls.into_iter()) {
            trace!("\t{}: {call}", sample.sample_id());
            debug!("{}: {}", sample.sample_id(), call.diplotype().diplotype());
            calls.push(SampleCall::new(sample.sample_id().to_string(), call));
        }
    }

    Ok(GeneCallDetails::new(
        matrix.wild_type().name().to_string(),
        phased,
        matrix.num_rows(),
        matrix.num_alleles(),
        calls
    ))
}
