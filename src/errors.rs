
use std::path::PathBuf;

use crate::data_types::genome_build::GenomeBuild;

/// Errors produced while turning a gene definition into a reference matrix; these abort the gene
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum LoaderError {
    #[error("no definition found for gene {gene} at {path:?}")]
    DefinitionNotFound { gene: String, path: PathBuf },
    #[error("malformed definition for gene {gene}: {reason}")]
    MalformedDefinition { gene: String, reason: String }
}

impl LoaderError {
    /// Shorthand for the malformed variant, which is by far the most common
    pub fn malformed(gene: &str, reason: impl Into<String>) -> LoaderError {
        LoaderError::MalformedDefinition {
            gene: gene.to_string(),
            reason: reason.into()
        }
    }
}

/// Errors produced while extracting genotypes from a variant source
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ExtractorError {
    #[error("variant source {source_name} declares zero samples")]
    MissingSamples { source_name: String },
    #[error("variant source declares assembly {declared:?} ({detected}), but {requested} was requested")]
    CoordinateMismatch { declared: String, detected: GenomeBuild, requested: GenomeBuild }
}

/// Errors produced by the diplotype caller; only raised for caller contract violations
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CallerError {
    #[error("allele vector lengths ({copy_a}, {copy_b}) do not match the reference matrix row count ({expected})")]
    InvalidInput { copy_a: usize, copy_b: usize, expected: usize }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = LoaderError::malformed("CYP2C19", "duplicate allele name *2");
        assert_eq!(err.to_string(), "malformed definition for gene CYP2C19: duplicate allele name *2");

        let err = ExtractorError::CoordinateMismatch {
            declared: "GRCh37".to_string(),
            detected: GenomeBuild::Grch37,
            requested: GenomeBuild::Grch38
        };
        assert_eq!(err.to_string(), "variant source declares assembly \"GRCh37\" (grch37), but grch38 was requested");

        let err = CallerError::InvalidInput { copy_a: 2, copy_b: 3, expected: 3 };
        assert!(err.to_string().contains("(2, 3)"));
    }
}
