
use serde::Serialize;

use crate::data_types::haplotype_matrix::ExpectedState;

/// The observed state of a single haplotype copy at a defining position
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum ObservedState {
    Reference,
    Alternate,
    /// No-call, the genotype could not be determined
    Missing
}

/// Outcome of comparing an expected state to an observed one
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CellComparison {
    Match,
    Mismatch,
    /// The observation is missing, so this cell provides no evidence
    Unobserved,
    /// The allele does not constrain this position
    NotDefining
}

impl ObservedState {
    /// Compares this observation against the state an allele expects
    pub fn compare(&self, expected: ExpectedState) -> CellComparison {
        match (expected, self) {
            (ExpectedState::DontCare, _) => CellComparison::NotDefining,
            (_, ObservedState::Missing) => CellComparison::Unobserved,
            (ExpectedState::Reference, ObservedState::Reference) |
            (ExpectedState::Alternate, ObservedState::Alternate) => CellComparison::Match,
            _ => CellComparison::Mismatch
        }
    }
}

/// Ordered observed states for one haplotype copy, aligned to the reference matrix rows
pub type AlleleVector = Vec<ObservedState>;

/// The two allele vectors for a single sample
#[derive(Clone, Debug, PartialEq)]
pub struct SampleGenotypes {
    /// The sample identifier from the variant source
    sample_id: String,
    /// Copy A; the left allele of each genotype
    copy_a: AlleleVector,
    /// Copy B; the right allele of each genotype
    copy_b: AlleleVector
}

impl SampleGenotypes {
    pub fn new(sample_id: String, copy_a: AlleleVector, copy_b: AlleleVector) -> SampleGenotypes {
        SampleGenotypes {
            sample_id,
            copy_a,
            copy_b
        }
    }

    /// Creates a sample that is reference on both copies at every one of `num_rows` rows
    pub fn all_reference(sample_id: String, num_rows: usize) -> SampleGenotypes {
        SampleGenotypes::new(
            sample_id,
            vec![ObservedState::Reference; num_rows],
            vec![ObservedState::Reference; num_rows]
        )
    }

    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    pub fn copy_a(&self) -> &[ObservedState] {
        &self.copy_a
    }

    pub fn copy_b(&self) -> &[ObservedState] {
        &self.copy_b
    }

    /// Sets the two copies at a row
    pub fn set_row(&mut self, row_index: usize, state_a: ObservedState, state_b: ObservedState) {
        self.copy_a[row_index] = state_a;
        self.copy_b[row_index] = state_b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare() {
        assert_eq!(ObservedState::Reference.compare(ExpectedState::Reference), CellComparison::Match);
        assert_eq!(ObservedState::Alternate.compare(ExpectedState::Alternate), CellComparison::Match);
        assert_eq!(ObservedState::Alternate.compare(ExpectedState::Reference), CellComparison::Mismatch);
        assert_eq!(ObservedState::Missing.compare(ExpectedState::Alternate), CellComparison::Unobserved);
        assert_eq!(ObservedState::Missing.compare(ExpectedState::DontCare), CellComparison::NotDefining);
        assert_eq!(ObservedState::Alternate.compare(ExpectedState::DontCare), CellComparison::NotDefining);
    }

    #[test]
    fn test_sample_genotypes() {
        let mut sample = SampleGenotypes::all_reference("NA12878".to_string(), 3);
        assert_eq!(sample.copy_a(), sample.copy_b());
        sample.set_row(1, ObservedState::Alternate, ObservedState::Missing);
        assert_eq!(sample.copy_a(), &[ObservedState::Reference, ObservedState::Alternate, ObservedState::Reference]);
        assert_eq!(sample.copy_b()[1], ObservedState::Missing);
        assert_eq!(sample.sample_id(), "NA12878");
    }
}
