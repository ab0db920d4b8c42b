
use serde::Serialize;
use simple_error::bail;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry::{Occupied, Vacant};

use crate::data_types::diplotype_call::{CallStatus, DiplotypeCall};
use crate::data_types::genome_build::GenomeBuild;

/// Intended to be serialized to JSON as the final result
#[derive(Debug, Serialize)]
pub struct CallResults {
    /// Version of the tool that generated the calls
    citydawg_version: String,
    /// Settings that affect every gene in the run
    run_metadata: RunMetadata,
    /// Map from gene name to the per-sample calls
    gene_details: BTreeMap<String, GeneCallDetails>
}

impl CallResults {
    /// Basic constructor, genes are added with `insert`
    pub fn new(run_metadata: RunMetadata) -> CallResults {
        CallResults {
            citydawg_version: crate::cli::core::FULL_VERSION.to_string(),
            run_metadata,
            gene_details: Default::default()
        }
    }

    /// Simple wrapper for our gene insertion to make sure we do not double insert
    /// # Arguments
    /// * `gene` - the gene name we are saving the calls for
    /// * `details` - the calls getting saved
    pub fn insert(&mut self, gene: String, details: GeneCallDetails) -> Result<(), Box<dyn std::error::Error>> {
        match self.gene_details.entry(gene) {
            Vacant(entry) => entry.insert(details),
            Occupied(entry) => bail!("Entry for {} is already occupied.", entry.key())
        };
        Ok(())
    }

    pub fn run_metadata(&self) -> &RunMetadata {
        &self.run_metadata
    }

    pub fn gene_details(&self) -> &BTreeMap<String, GeneCallDetails> {
        &self.gene_details
    }
}

/// Metadata describing how the run was configured
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunMetadata {
    /// The genome build the definitions were loaded for
    build: GenomeBuild,
    /// The batch size, if batch mode was enabled
    batch_size: Option<usize>,
    /// The time the run was started
    run_time: chrono::DateTime<chrono::Utc>
}

impl RunMetadata {
    pub fn new(build: GenomeBuild, batch_size: Option<usize>) -> RunMetadata {
        RunMetadata {
            build,
            batch_size,
            run_time: chrono::Utc::now()
        }
    }

    pub fn build(&self) -> GenomeBuild {
        self.build
    }

    pub fn batch_size(&self) -> Option<usize> {
        self.batch_size
    }
}

/// Wrapper for all of the calls for a single gene
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GeneCallDetails {
    /// The wild-type allele for the gene
    wild_type: String,
    /// Whether the genotypes were treated as phased
    phased: bool,
    /// Number of defining variant positions
    num_variants: usize,
    /// Number of star alleles, including wild-type
    num_alleles: usize,
    /// One call per sample, in the sample order of the variant source
    calls: Vec<SampleCall>
}

impl GeneCallDetails {
    pub fn new(wild_type: String, phased: bool, num_variants: usize, num_alleles: usize, calls: Vec<SampleCall>) -> GeneCallDetails {
        GeneCallDetails {
            wild_type,
            phased,
            num_variants,
            num_alleles,
            calls
        }
    }

    pub fn is_phased(&self) -> bool {
        self.phased
    }

    pub fn calls(&self) -> &[SampleCall] {
        &self.calls
    }

    /// Counts the calls by status, useful for a run summary
    pub fn status_counts(&self) -> BTreeMap<CallStatus, usize> {
        let mut counts: BTreeMap<CallStatus, usize> = Default::default();
        for sample_call in self.calls.iter() {
            *counts.entry(sample_call.call().status()).or_insert(0) += 1;
        }
        counts
    }
}

/// A diplotype call tagged with the sample it belongs to
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SampleCall {
    /// Sample identifier from the variant source
    sample: String,
    /// The call itself
    #[serde(flatten)]
    call: DiplotypeCall
}

impl SampleCall {
    pub fn new(sample: String, call: DiplotypeCall) -> SampleCall {
        SampleCall {
            sample,
            call
        }
    }

    pub fn sample(&self) -> &str {
        &self.sample
    }

    pub fn call(&self) -> &DiplotypeCall {
        &self.call
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::data_types::pgx_diplotype::Diplotype;

    fn dummy_details() -> GeneCallDetails {
        let calls = vec![
            SampleCall::new("s1".to_string(), DiplotypeCall::new(Diplotype::new("*1", "*1"), CallStatus::Unambiguous, false, vec![])),
            SampleCall::new("s2".to_string(), DiplotypeCall::new(Diplotype::new("*1", "*2"), CallStatus::Degraded, false, vec![])),
            SampleCall::new("s3".to_string(), DiplotypeCall::new(Diplotype::new("*2", "*3"), CallStatus::Unambiguous, false, vec![]))
        ];
        GeneCallDetails::new("*1".to_string(), false, 2, 3, calls)
    }

    #[test]
    fn test_insert() {
        let mut results = CallResults::new(RunMetadata::new(GenomeBuild::Grch38, None));
        results.insert("CYP2C19".to_string(), dummy_details()).unwrap();
        assert!(results.insert("CYP2C19".to_string(), dummy_details()).is_err());
        assert_eq!(results.gene_details().len(), 1);
        assert_eq!(results.run_metadata().build(), GenomeBuild::Grch38);
    }

    #[test]
    fn test_status_counts() {
        let counts = dummy_details().status_counts();
        assert_eq!(counts.get(&CallStatus::Unambiguous), Some(&2));
        assert_eq!(counts.get(&CallStatus::Degraded), Some(&1));
        assert_eq!(counts.get(&CallStatus::Tied), None);
    }

    #[test]
    fn test_sample_call_serialization() {
        let details = dummy_details();
        let value = serde_json::to_value(&details.calls()[1]).unwrap();
        assert_eq!(value["sample"], "s2");
        assert_eq!(value["status"], "degraded");
        assert_eq!(value["diplotype"]["diplotype"], "*1/*2");
    }
}
