
use log::{debug, trace, warn};
use rust_htslib::bcf;
use rust_htslib::bcf::Read;
use rust_htslib::bcf::record::GenotypeAllele;
use simple_error::bail;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::data_types::allele_vector::{ObservedState, SampleGenotypes};
use crate::data_types::coordinates::normalize_chrom;
use crate::data_types::genome_build::GenomeBuild;
use crate::data_types::haplotype_matrix::ReferenceMatrix;
use crate::errors::ExtractorError;

/// A variant-call file that we pull genotypes out of.
/// The header is parsed once on open; records are streamed on every extraction so memory is bounded by the batch.
#[derive(Clone, Debug)]
pub struct VariantSource {
    /// Path to the VCF/BCF
    path: PathBuf,
    /// Sample identifiers in header order
    sample_ids: Vec<String>,
    /// The first assembly label we found in the header, if any
    declared_assembly: Option<String>,
    /// Phasing declared by a `##phasing=` header line, if any
    declared_phasing: Option<bool>
}

impl VariantSource {
    /// Opens the variant file and parses the header
    /// # Arguments
    /// * `path` - the VCF or BCF file, plain or bgzipped
    /// # Errors
    /// * if the file does not parse as a VCF/BCF
    /// * if the header declares zero samples
    /// * if a sample name is not UTF-8
    pub fn open(path: &Path) -> Result<VariantSource, Box<dyn std::error::Error>> {
        let vcf_reader: bcf::Reader = bcf::Reader::from_path(path)?;
        let vcf_header: &bcf::header::HeaderView = vcf_reader.header();

        let mut sample_ids = vec![];
        for sv in vcf_header.samples().iter() {
            sample_ids.push(std::str::from_utf8(sv)?.to_string());
        }
        if sample_ids.is_empty() {
            return Err(ExtractorError::MissingSamples {
                source_name: path.display().to_string()
            }.into());
        }

        let mut declared_assembly: Option<String> = None;
        let mut contig_assembly: Option<String> = None;
        let mut declared_phasing: Option<bool> = None;
        for header_record in vcf_header.header_records().iter() {
            match header_record {
                bcf::header::HeaderRecord::Generic { key, value } => {
                    if key == "reference" && declared_assembly.is_none() {
                        declared_assembly = Some(value.clone());
                    } else if key == "phasing" {
                        declared_phasing = parse_phasing_label(value);
                    }
                },
                bcf::header::HeaderRecord::Contig { values, .. } => {
                    if contig_assembly.is_none() {
                        contig_assembly = values.get("assembly").cloned();
                    }
                },
                _ => {}
            };
        }

        // contig assembly tags are more specific than a reference path
        let declared_assembly = match (contig_assembly, declared_assembly) {
            (Some(c), _) => Some(c),
            (None, r) => r
        };

        Ok(VariantSource {
            path: path.to_path_buf(),
            sample_ids,
            declared_assembly,
            declared_phasing
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    pub fn num_samples(&self) -> usize {
        self.sample_ids.len()
    }

    pub fn declared_assembly(&self) -> Option<&str> {
        self.declared_assembly.as_deref()
    }

    pub fn declared_phasing(&self) -> Option<bool> {
        self.declared_phasing
    }

    /// Verifies that the declared assembly agrees with the requested build.
    /// An assembly we cannot interpret is only a warning, since plenty of VCFs carry a bare reference path.
    /// # Errors
    /// * if the declared assembly is clearly a different build
    pub fn check_build(&self, requested: GenomeBuild) -> Result<(), ExtractorError> {
        match self.declared_assembly.as_ref() {
            Some(declared) => {
                match GenomeBuild::from_assembly_label(declared) {
                    Some(detected) if detected != requested => {
                        Err(ExtractorError::CoordinateMismatch {
                            declared: declared.clone(),
                            detected,
                            requested
                        })
                    },
                    Some(_) => Ok(()),
                    None => {
                        warn!("Could not determine the build from declared assembly {declared:?}, assuming {requested}");
                        Ok(())
                    }
                }
            },
            None => {
                debug!("No assembly declared in {:?}, assuming {requested}", self.path);
                Ok(())
            }
        }
    }

    /// Splits the samples into contiguous index ranges.
    /// # Arguments
    /// * `batch_size` - if Some, the maximum number of samples per batch; None is a single batch
    pub fn batches(&self, batch_size: Option<usize>) -> Vec<Range<usize>> {
        let num_samples = self.num_samples();
        let batch_size = batch_size.unwrap_or(num_samples).max(1);
        (0..num_samples).step_by(batch_size)
            .map(|start| start..(start + batch_size).min(num_samples))
            .collect()
    }

    /// Decides whether the copies for this gene are true haplotypes.
    /// An explicit setting wins, then the header declaration, then the phase markers on heterozygous calls at the gene rows.
    /// # Arguments
    /// * `matrix` - the reference matrix for the gene
    /// * `explicit` - a user provided phasing mode
    /// # Errors
    /// * if the records cannot be read
    pub fn resolve_phasing(&self, matrix: &ReferenceMatrix, explicit: Option<bool>) -> Result<bool, Box<dyn std::error::Error>> {
        if let Some(phased) = explicit {
            debug!("Phasing set explicitly: {phased}");
            return Ok(phased);
        }
        if let Some(phased) = self.declared_phasing {
            debug!("Phasing declared in header: {phased}");
            return Ok(phased);
        }

        let mut evidence = PhaseEvidence::default();
        scan_gene_records(&self.path, matrix, |record, _row_index, _alt_index| {
            let Ok(genotypes) = record.genotypes() else {
                // no GT here, so no phase markers either
                return Ok(());
            };
            for sample_index in 0..self.num_samples() {
                evidence.add_genotype(&genotypes.get(sample_index));
            }
            Ok(())
        })?;
        debug!("Phase evidence for {}: {evidence:?}", matrix.gene());
        Ok(evidence.is_phased())
    }

    /// Extracts the two allele vectors for a range of samples.
    /// Rows absent from the file are Reference on both copies; records that do not match a row are ignored.
    /// # Arguments
    /// * `matrix` - the reference matrix, which determines the row order of the vectors
    /// * `sample_range` - the sample indices to extract, see `batches(...)`
    /// # Errors
    /// * if the sample range is outside the samples in the file
    /// * if the records cannot be read
    pub fn extract(&self, matrix: &ReferenceMatrix, sample_range: Range<usize>) -> Result<Vec<SampleGenotypes>, Box<dyn std::error::Error>> {
        if sample_range.start > sample_range.end || sample_range.end > self.num_samples() {
            bail!("Sample range {sample_range:?} is outside the {} samples in {:?}", self.num_samples(), self.path);
        }
        let num_rows = matrix.num_rows();
        let mut samples: Vec<SampleGenotypes> = self.sample_ids[sample_range.clone()].iter()
            .map(|sample_id| SampleGenotypes::all_reference(sample_id.clone(), num_rows))
            .collect();

        let mut num_matched = 0;
        scan_gene_records(&self.path, matrix, |record, row_index, alt_index| {
            num_matched += 1;
            let genotypes = match record.genotypes() {
                Ok(g) => g,
                Err(e) => {
                    // a record without GT is a no-call for everyone
                    warn!("No genotypes for {} ({e}), treating as missing", matrix.positions()[row_index]);
                    for sample in samples.iter_mut() {
                        sample.set_row(row_index, ObservedState::Missing, ObservedState::Missing);
                    }
                    return Ok(());
                }
            };
            for (sample, sample_index) in samples.iter_mut().zip(sample_range.clone()) {
                let (state_a, state_b) = genotype_states(&genotypes.get(sample_index), alt_index);
                sample.set_row(row_index, state_a, state_b);
            }
            Ok(())
        })?;
        debug!("Matched {num_matched} / {num_rows} {} rows in samples {sample_range:?}", matrix.gene());
        Ok(samples)
    }
}

/// Interprets a `##phasing=` header value
fn parse_phasing_label(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "full" | "phased" | "true" | "yes" => Some(true),
        "none" | "unphased" | "false" | "no" => Some(false),
        // "partial" and anything else is decided from the calls
        _ => None
    }
}

/// Tallies the phase markers on heterozygous calls
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PhaseEvidence {
    /// Heterozygous calls with every allele observed
    het_calls: usize,
    /// The subset of those that carried a phase marker
    phased_het_calls: usize
}

impl PhaseEvidence {
    /// Adds a single genotype to the tally; homozygous and partially missing calls say nothing about phase
    pub fn add_genotype(&mut self, genotype: &[GenotypeAllele]) {
        if genotype.len() < 2 {
            return;
        }
        let indices: Option<Vec<u32>> = genotype.iter().map(|ga| ga.index()).collect();
        let Some(indices) = indices else {
            return;
        };
        if indices.iter().all(|&i| i == indices[0]) {
            return;
        }
        self.het_calls += 1;
        // htslib stores the phase marker on every allele after the first
        if genotype[1..].iter().all(|ga| matches!(ga, GenotypeAllele::Phased(_))) {
            self.phased_het_calls += 1;
        }
    }

    /// Phased only if we saw heterozygous calls and every one of them was phased
    pub fn is_phased(&self) -> bool {
        self.het_calls > 0 && self.het_calls == self.phased_het_calls
    }
}

/// Converts one genotype into the states for copy A and copy B relative to a single alternate allele.
/// Any other allele at the record (reference or a different alternate) is Reference for this row.
/// Haploid calls fill both copies with the same state.
fn genotype_states(genotype: &[GenotypeAllele], alt_index: u32) -> (ObservedState, ObservedState) {
    let convert = |ga: &GenotypeAllele| -> ObservedState {
        match ga.index() {
            Some(i) if i == alt_index => ObservedState::Alternate,
            Some(_) => ObservedState::Reference,
            None => ObservedState::Missing
        }
    };
    match genotype.len() {
        0 => (ObservedState::Missing, ObservedState::Missing),
        1 => {
            let state = convert(&genotype[0]);
            (state, state)
        },
        2 => (convert(&genotype[0]), convert(&genotype[1])),
        _ => {
            trace!("Polyploid genotype {genotype:?}, using the first two alleles");
            (convert(&genotype[0]), convert(&genotype[1]))
        }
    }
}

/// Streams the records of a variant file, calling `visitor` for every (record, row, alt index) that matches a matrix row.
/// Uses the index to jump to the gene when one is available.
/// # Errors
/// * if the file cannot be read
/// * if the visitor returns an error
fn scan_gene_records<F>(path: &Path, matrix: &ReferenceMatrix, mut visitor: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnMut(&bcf::Record, usize, u32) -> Result<(), Box<dyn std::error::Error>>
{
    if matrix.num_rows() == 0 {
        return Ok(());
    }

    // the index is only useful if the gene is on a single chromosome
    let region = matrix.region()
        .filter(|r| matrix.positions().iter().all(|p| normalize_chrom(p.chrom()) == normalize_chrom(r.chrom())));
    if let Some(region) = region {
        if let Ok(mut indexed_reader) = bcf::IndexedReader::from_path(path) {
            let header: bcf::header::HeaderView = indexed_reader.header().clone();
            let short_chrom = normalize_chrom(region.chrom());
            let long_chrom = format!("chr{short_chrom}");
            let chrom_index = [short_chrom, long_chrom.as_str()].iter()
                .find_map(|c| header.name2rid(c.as_bytes()).ok());
            match chrom_index {
                Some(rid) => {
                    indexed_reader.fetch(rid, region.start(), Some(region.end()))?;
                    return visit_records(&mut indexed_reader, matrix, &mut visitor);
                },
                None => {
                    debug!("Chromosome {} is not in the header of {path:?}, no records for {}", region.chrom(), matrix.gene());
                    return Ok(());
                }
            };
        }
    }

    let mut vcf_reader: bcf::Reader = bcf::Reader::from_path(path)?;
    visit_records(&mut vcf_reader, matrix, &mut visitor)
}

/// Shared record loop for indexed and streaming readers
fn visit_records<R, F>(vcf_reader: &mut R, matrix: &ReferenceMatrix, visitor: &mut F) -> Result<(), Box<dyn std::error::Error>>
where
    R: bcf::Read,
    F: FnMut(&bcf::Record, usize, u32) -> Result<(), Box<dyn std::error::Error>>
{
    let header: bcf::header::HeaderView = vcf_reader.header().clone();
    for record_result in vcf_reader.records() {
        let record: bcf::Record = record_result?;
        let Some(rid) = record.rid() else {
            continue;
        };
        let chrom: &str = std::str::from_utf8(header.rid2name(rid)?)?;
        // VCF positions are 1-based, htslib is 0-based
        let position: u64 = (record.pos() + 1) as u64;

        let alleles: Vec<&str> = record.alleles().iter()
            .map(|a| std::str::from_utf8(a).unwrap_or("UTF8_ERROR"))
            .collect();
        for (alt_index, &alt) in alleles.iter().enumerate().skip(1) {
            let Some(row_index) = matrix.row_index(chrom, position, alt) else {
                continue;
            };
            let row = &matrix.positions()[row_index];
            if row.reference() != alleles[0] {
                warn!("Reference mismatch for {row}, found {chrom}:{position} {alleles:?}; ignoring record");
                continue;
            }
            trace!("Matched {row} to record {chrom}:{position} {alleles:?}");
            visitor(&record, row_index, alt_index as u32)?;
        }
    }
    Ok(())
}
