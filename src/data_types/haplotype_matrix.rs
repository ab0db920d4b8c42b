
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use serde::Serialize;

use crate::data_types::coordinates::{Coordinates, normalize_chrom};
use crate::data_types::genome_build::GenomeBuild;
use crate::errors::LoaderError;

/// The state a star allele expects at a defining variant position
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum ExpectedState {
    /// The allele carries the reference sequence here
    Reference,
    /// The allele carries the alternate sequence here
    Alternate,
    /// The allele does not constrain this position
    DontCare
}

/// A defining variant position for a gene, these are the rows of the reference matrix
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct VariantPosition {
    /// chromosome of the variant
    chrom: String,
    /// 1-based position of the variant
    position: u64,
    /// alt allele
    alternate: String,
    /// ref allele
    reference: String,
    /// identifier from the definition, e.g. a dbSNP ID
    variant_id: String
}

impl VariantPosition {
    pub fn new(variant_id: String, chrom: String, position: u64, reference: String, alternate: String) -> VariantPosition {
        VariantPosition {
            chrom,
            position,
            alternate,
            reference,
            variant_id
        }
    }

    pub fn variant_id(&self) -> &str {
        &self.variant_id
    }

    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn alternate(&self) -> &str {
        &self.alternate
    }

    /// The key we use to look this position up from a variant record
    fn lookup_key(&self) -> (String, u64, String) {
        (normalize_chrom(&self.chrom).to_string(), self.position, self.alternate.clone())
    }
}

impl std::fmt::Display for VariantPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({}:{}{}>{})", self.variant_id, self.chrom, self.position, self.reference, self.alternate)
    }
}

/// A single column of the reference matrix
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StarAllele {
    /// The star allele label, e.g. "*2"
    name: String,
    /// Expected state for each row of the matrix
    expected: Vec<ExpectedState>
}

impl StarAllele {
    pub fn new(name: String, expected: Vec<ExpectedState>) -> StarAllele {
        StarAllele {
            name,
            expected
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expected(&self) -> &[ExpectedState] {
        &self.expected
    }

    /// Number of rows where this allele expects the alternate sequence
    pub fn num_alternate(&self) -> usize {
        self.expected.iter().filter(|&&e| e == ExpectedState::Alternate).count()
    }

    /// Number of rows this allele actually constrains
    pub fn num_defining(&self) -> usize {
        self.expected.iter().filter(|&&e| e != ExpectedState::DontCare).count()
    }
}

/// Rows are the defining variant positions sorted by coordinate, columns are the star alleles.
/// Built once per gene and shared read-only by every sample call.
#[derive(Clone, Debug, Serialize)]
pub struct ReferenceMatrix {
    /// The gene this matrix describes
    gene: String,
    /// The build the positions are expressed in
    build: GenomeBuild,
    /// The rows, in fixed order
    positions: Vec<VariantPosition>,
    /// The columns, the wild-type allele is always one of these
    alleles: Vec<StarAllele>,
    /// Index of the wild-type column
    wild_type_index: usize,
    /// Lookup from (normalized chrom, position, alt) to the row index
    #[serde(skip)]
    row_lookup: HashMap<(String, u64, String), usize>
}

impl ReferenceMatrix {
    /// Creates the matrix and checks the shape invariants.
    /// # Arguments
    /// * `gene` - the gene name
    /// * `build` - the genome build the positions are in
    /// * `positions` - the rows, must be sorted and unique
    /// * `alleles` - the columns, each must have one entry per row
    /// * `wild_type` - the name of the wild-type column, which must expect reference at every row
    /// # Errors
    /// * if a row has position 0, positions are 1-based
    /// * if the rows are unsorted or duplicated
    /// * if a column has the wrong number of rows
    /// * if allele names are duplicated
    /// * if the wild-type column is missing or expects anything other than reference
    pub fn new(
        gene: &str, build: GenomeBuild, positions: Vec<VariantPosition>, alleles: Vec<StarAllele>, wild_type: &str
    ) -> Result<ReferenceMatrix, LoaderError> {
        let mut row_lookup: HashMap<(String, u64, String), usize> = Default::default();
        for (row_index, position) in positions.iter().enumerate() {
            if position.position() == 0 {
                return Err(LoaderError::malformed(gene, format!("position 0 is invalid for {position}, positions are 1-based")));
            }
            if row_index > 0 && positions[row_index - 1] >= *position {
                return Err(LoaderError::malformed(gene, format!("rows are not strictly sorted at {position}")));
            }
            if row_lookup.insert(position.lookup_key(), row_index).is_some() {
                return Err(LoaderError::malformed(gene, format!("duplicate variant position {position}")));
            }
        }

        let mut names: HashSet<&str> = Default::default();
        for allele in alleles.iter() {
            if !names.insert(allele.name()) {
                return Err(LoaderError::malformed(gene, format!("duplicate allele name {}", allele.name())));
            }
            if allele.expected().len() != positions.len() {
                return Err(LoaderError::malformed(gene, format!(
                    "allele {} has {} states for {} rows", allele.name(), allele.expected().len(), positions.len()
                )));
            }
        }

        let wild_type_index = alleles.iter()
            .position(|a| a.name() == wild_type)
            .ok_or_else(|| LoaderError::malformed(gene, format!("wild-type allele {wild_type} is not a column")))?;
        if alleles[wild_type_index].expected().iter().any(|&e| e != ExpectedState::Reference) {
            return Err(LoaderError::malformed(gene, format!("wild-type allele {wild_type} must expect reference at every position")));
        }

        Ok(ReferenceMatrix {
            gene: gene.to_string(),
            build,
            positions,
            alleles,
            wild_type_index,
            row_lookup
        })
    }

    pub fn gene(&self) -> &str {
        &self.gene
    }

    pub fn build(&self) -> GenomeBuild {
        self.build
    }

    pub fn positions(&self) -> &[VariantPosition] {
        &self.positions
    }

    pub fn alleles(&self) -> &[StarAllele] {
        &self.alleles
    }

    pub fn num_rows(&self) -> usize {
        self.positions.len()
    }

    pub fn num_alleles(&self) -> usize {
        self.alleles.len()
    }

    pub fn wild_type_index(&self) -> usize {
        self.wild_type_index
    }

    pub fn wild_type(&self) -> &StarAllele {
        &self.alleles[self.wild_type_index]
    }

    /// Finds the row for a variant, chromosome labels are compared without the "chr" prefix
    /// # Arguments
    /// * `chrom` - chromosome of the observed variant
    /// * `position` - 1-based position of the observed variant
    /// * `alternate` - the observed alternate sequence
    pub fn row_index(&self, chrom: &str, position: u64, alternate: &str) -> Option<usize> {
        self.row_lookup.get(&(normalize_chrom(chrom).to_string(), position, alternate.to_string())).copied()
    }

    /// Returns true if at least two alleles disagree on this row, i.e. an observation here can separate them
    pub fn is_informative(&self, row_index: usize) -> bool {
        let mut seen: Option<ExpectedState> = None;
        for allele in self.alleles.iter() {
            match (allele.expected()[row_index], seen) {
                (ExpectedState::DontCare, _) => {},
                (state, None) => seen = Some(state),
                (state, Some(previous)) => {
                    if state != previous {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// The region spanned by the rows as 0-based half-open coordinates; None if there are no rows
    pub fn region(&self) -> Option<Coordinates> {
        let first = self.positions.first()?;
        let start = self.positions.iter().map(|p| p.position()).min()?;
        let end = self.positions.iter()
            .map(|p| p.position() + p.reference().len().max(1) as u64)
            .max()?;
        // 1-based -> 0-based
        Some(Coordinates::new(first.chrom().to_string(), start - 1, end - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ExpectedState::{Alternate as A, DontCare as X, Reference as R};

    fn two_row_positions() -> Vec<VariantPosition> {
        vec![
            VariantPosition::new("rs100".to_string(), "chr1".to_string(), 100, "A".to_string(), "G".to_string()),
            VariantPosition::new("rs200".to_string(), "chr1".to_string(), 200, "C".to_string(), "T".to_string())
        ]
    }

    #[test]
    fn test_matrix_construction() {
        let matrix = ReferenceMatrix::new(
            "TEST", GenomeBuild::Grch38, two_row_positions(),
            vec![
                StarAllele::new("*1".to_string(), vec![R, R]),
                StarAllele::new("*2".to_string(), vec![A, R]),
                StarAllele::new("*3".to_string(), vec![R, A])
            ],
            "*1"
        ).unwrap();

        assert_eq!(matrix.num_rows(), 2);
        assert_eq!(matrix.num_alleles(), 3);
        assert_eq!(matrix.wild_type().name(), "*1");
        assert_eq!(matrix.row_index("1", 200, "T"), Some(1));
        assert_eq!(matrix.row_index("chr1", 200, "G"), None);
        assert!(matrix.is_informative(0));
        assert_eq!(matrix.region().unwrap(), Coordinates::new("chr1".to_string(), 99, 200));
        assert_eq!(matrix.alleles()[1].num_alternate(), 1);
    }

    #[test]
    fn test_uninformative_row() {
        let matrix = ReferenceMatrix::new(
            "TEST", GenomeBuild::Grch38, two_row_positions(),
            vec![
                StarAllele::new("*1".to_string(), vec![R, R]),
                StarAllele::new("*2".to_string(), vec![A, X])
            ],
            "*1"
        ).unwrap();
        assert!(matrix.is_informative(0));
        assert!(!matrix.is_informative(1));
        assert_eq!(matrix.alleles()[1].num_defining(), 1);
    }

    #[test]
    fn test_bad_matrices() {
        // duplicate names
        let result = ReferenceMatrix::new(
            "TEST", GenomeBuild::Grch38, two_row_positions(),
            vec![
                StarAllele::new("*1".to_string(), vec![R, R]),
                StarAllele::new("*1".to_string(), vec![A, R])
            ],
            "*1"
        );
        assert!(matches!(result, Err(LoaderError::MalformedDefinition { .. })));

        // wrong column length
        let result = ReferenceMatrix::new(
            "TEST", GenomeBuild::Grch38, two_row_positions(),
            vec![StarAllele::new("*1".to_string(), vec![R])],
            "*1"
        );
        assert!(result.is_err());

        // wild-type that is not all reference
        let result = ReferenceMatrix::new(
            "TEST", GenomeBuild::Grch38, two_row_positions(),
            vec![StarAllele::new("*1".to_string(), vec![R, A])],
            "*1"
        );
        assert!(result.is_err());

        // unsorted rows
        let mut positions = two_row_positions();
        positions.reverse();
        let result = ReferenceMatrix::new(
            "TEST", GenomeBuild::Grch38, positions,
            vec![StarAllele::new("*1".to_string(), vec![R, R])],
            "*1"
        );
        assert!(result.is_err());

        // position 0 has no 0-based equivalent
        let result = ReferenceMatrix::new(
            "TEST", GenomeBuild::Grch38,
            vec![VariantPosition::new("rs0".to_string(), "chr1".to_string(), 0, "A".to_string(), "G".to_string())],
            vec![StarAllele::new("*1".to_string(), vec![R])],
            "*1"
        );
        assert!(matches!(result, Err(LoaderError::MalformedDefinition { .. })));
    }
}
