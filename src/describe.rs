
use itertools::Itertools;

use crate::data_types::haplotype_matrix::{ExpectedState, ReferenceMatrix};

/// Summary numbers for a reference matrix
#[derive(Clone, Debug, PartialEq)]
pub struct MatrixStats {
    pub num_rows: usize,
    pub num_alleles: usize,
    /// Rows where at least two alleles disagree
    pub informative_rows: usize,
    /// Total DontCare cells across all columns
    pub dont_care_cells: usize
}

impl MatrixStats {
    pub fn new(matrix: &ReferenceMatrix) -> MatrixStats {
        let informative_rows = (0..matrix.num_rows())
            .filter(|&r| matrix.is_informative(r))
            .count();
        let dont_care_cells = matrix.alleles().iter()
            .map(|a| a.expected().iter().filter(|&&e| e == ExpectedState::DontCare).count())
            .sum();
        MatrixStats {
            num_rows: matrix.num_rows(),
            num_alleles: matrix.num_alleles(),
            informative_rows,
            dont_care_cells
        }
    }
}

/// Comma-separated variant ids where an allele expects the alternate, "-" if none
/// # Arguments
/// * `matrix` - the matrix containing the allele
/// * `allele_name` - the allele to describe
pub fn alternate_ids(matrix: &ReferenceMatrix, allele_name: &str) -> String {
    let ids = matrix.alleles().iter()
        .filter(|a| a.name() == allele_name)
        .flat_map(|a| {
            a.expected().iter().zip(matrix.positions().iter())
                .filter(|&(&e, _p)| e == ExpectedState::Alternate)
                .map(|(_e, p)| p.variant_id())
        })
        .join(",");
    if ids.is_empty() {
        "-".to_string()
    } else {
        ids
    }
}

/// Prints the statistics for a given reference matrix
/// # Arguments
/// * `matrix` - the matrix to print the statistics for
pub fn print_stats(matrix: &ReferenceMatrix) {
    let stats = MatrixStats::new(matrix);
    println!("Gene: {}", matrix.gene());
    println!("\tBuild: {}", matrix.build());
    if let Some(region) = matrix.region() {
        println!("\tRegion: {region}");
    }
    println!("\tWild-type: {}", matrix.wild_type().name());
    println!("\tVariant positions: {} ({} informative)", stats.num_rows, stats.informative_rows);
    println!("\tStar alleles: {}", stats.num_alleles);
    println!("\tDon't-care cells: {}", stats.dont_care_cells);

    // per-row and per-allele details, only with elevated verbosity
    if log::log_enabled!(log::Level::Debug) {
        println!();
        println!("variant\tchrom\tposition\tref\talt");
        for position in matrix.positions().iter() {
            println!("{}\t{}\t{}\t{}\t{}", position.variant_id(), position.chrom(), position.position(), position.reference(), position.alternate());
        }
        println!();

        println!("allele\talternate_variants\tdefining_variants\talternate_ids");
        for allele in matrix.alleles().iter() {
            println!("{}\t{}\t{}\t{}", allele.name(), allele.num_alternate(), allele.num_defining(), alternate_ids(matrix, allele.name()));
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::data_types::genome_build::GenomeBuild;
    use crate::data_types::haplotype_matrix::{StarAllele, VariantPosition};

    #[test]
    fn test_matrix_stats() {
        let positions = vec![
            VariantPosition::new("rs100".to_string(), "chr1".to_string(), 100, "A".to_string(), "G".to_string()),
            VariantPosition::new("rs200".to_string(), "chr1".to_string(), 200, "C".to_string(), "T".to_string())
        ];
        let alleles = vec![
            StarAllele::new("*1".to_string(), vec![ExpectedState::Reference, ExpectedState::Reference]),
            StarAllele::new("*2".to_string(), vec![ExpectedState::Alternate, ExpectedState::DontCare])
        ];
        let matrix = ReferenceMatrix::new("TEST", GenomeBuild::Grch38, positions, alleles, "*1").unwrap();
        assert_eq!(MatrixStats::new(&matrix), MatrixStats {
            num_rows: 2,
            num_alleles: 2,
            informative_rows: 1,
            dont_care_cells: 1
        });
        assert_eq!(alternate_ids(&matrix, "*2"), "rs100");
        assert_eq!(alternate_ids(&matrix, "*1"), "-");
    }
}
