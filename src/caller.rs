
use log::{trace, warn};
use std::cmp::Ordering;

use crate::data_types::allele_vector::{CellComparison, ObservedState, SampleGenotypes};
use crate::data_types::diplotype_call::{CallStatus, DiplotypeCall};
use crate::data_types::haplotype_matrix::{ReferenceMatrix, StarAllele};
use crate::data_types::pgx_diplotype::Diplotype;
use crate::errors::CallerError;

/// Beyond this many rows that differ between the two copies, we stop enumerating unphased assignments.
/// 2^(16-1) assignments is the largest search we will run for one sample.
pub const MAX_SWAPPABLE_ROWS: usize = 16;

/// Evidence for one allele against one haplotype copy.
/// Missing observations and rows the allele does not constrain are excluded from both counts.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MatchScore {
    /// Defining rows where the observation agreed with the allele
    matched: u64,
    /// Defining rows that had an observation
    observed: u64
}

impl MatchScore {
    pub fn new(matched: u64, observed: u64) -> MatchScore {
        assert!(matched <= observed);
        MatchScore { matched, observed }
    }

    pub fn matched(&self) -> u64 {
        self.matched
    }

    pub fn observed(&self) -> u64 {
        self.observed
    }

    /// An allele with no observed defining rows carries no evidence either way
    pub fn is_indeterminate(&self) -> bool {
        self.observed == 0
    }

    /// The matching fraction, None if indeterminate
    pub fn fraction(&self) -> Option<f64> {
        if self.is_indeterminate() {
            None
        } else {
            Some(self.matched as f64 / self.observed as f64)
        }
    }

    /// Compares the matching fractions exactly; indeterminate scores are below everything else
    pub fn compare_fraction(&self, other: &MatchScore) -> Ordering {
        match (self.is_indeterminate(), other.is_indeterminate()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => (self.matched * other.observed).cmp(&(other.matched * self.observed))
        }
    }
}

/// Sum of the two per-copy fractions for a pairing, stored as an exact rational
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct PairScore {
    numerator: u64,
    denominator: u64
}

impl PairScore {
    /// Indeterminate copies contribute nothing
    fn new(score_a: &MatchScore, score_b: &MatchScore) -> PairScore {
        let (m1, o1) = if score_a.is_indeterminate() { (0, 1) } else { (score_a.matched, score_a.observed) };
        let (m2, o2) = if score_b.is_indeterminate() { (0, 1) } else { (score_b.matched, score_b.observed) };
        PairScore {
            numerator: m1 * o2 + m2 * o1,
            denominator: o1 * o2
        }
    }
}

impl PartialOrd for PairScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PairScore {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.numerator as u128 * other.denominator as u128;
        let rhs = other.numerator as u128 * self.denominator as u128;
        lhs.cmp(&rhs)
    }
}

/// Scores a single allele column against one allele vector
/// # Arguments
/// * `allele` - the reference column
/// * `observed` - the observed states, same length as the column
pub fn score_allele(allele: &StarAllele, observed: &[ObservedState]) -> MatchScore {
    assert_eq!(allele.expected().len(), observed.len());
    let mut matched = 0;
    let mut total = 0;
    for (&expected, state) in allele.expected().iter().zip(observed.iter()) {
        match state.compare(expected) {
            CellComparison::Match => {
                matched += 1;
                total += 1;
            },
            CellComparison::Mismatch => total += 1,
            CellComparison::Unobserved |
            CellComparison::NotDefining => {}
        };
    }
    MatchScore::new(matched, total)
}

/// The best reference allele(s) for one haplotype copy
#[derive(Clone, Debug, PartialEq)]
struct CopyMatch {
    /// Column indices at the maximal score
    best: Vec<usize>,
    /// The maximal score
    score: MatchScore
}

/// Selects the best alleles for one copy.
/// If the wild-type is among the best, no named allele beats the baseline and the copy is wild-type.
/// If every allele is indeterminate, the copy also defaults to wild-type.
fn best_alleles(matrix: &ReferenceMatrix, observed: &[ObservedState]) -> CopyMatch {
    let scores: Vec<MatchScore> = matrix.alleles().iter()
        .map(|allele| score_allele(allele, observed))
        .collect();

    let wild_type_index = matrix.wild_type_index();
    let max_score = scores.iter()
        .filter(|s| !s.is_indeterminate())
        .max_by(|a, b| a.compare_fraction(b))
        .copied();

    match max_score {
        Some(max_score) => {
            let best: Vec<usize> = scores.iter().enumerate()
                .filter(|(_i, s)| !s.is_indeterminate() && s.compare_fraction(&max_score) == Ordering::Equal)
                .map(|(i, _s)| i)
                .collect();
            if best.contains(&wild_type_index) {
                CopyMatch { best: vec![wild_type_index], score: max_score }
            } else {
                CopyMatch { best, score: max_score }
            }
        },
        None => CopyMatch { best: vec![wild_type_index], score: MatchScore::default() }
    }
}

/// Calls diplotypes for samples of a single gene; this is the unit of work that gets scheduled per sample.
/// The caller holds no state beyond the shared matrix and the phasing flag.
#[derive(Clone, Copy, Debug)]
pub struct DiplotypeCaller<'a> {
    /// The shared, read-only reference matrix
    matrix: &'a ReferenceMatrix,
    /// If true, copy A and copy B are true haplotypes
    phased: bool
}

impl<'a> DiplotypeCaller<'a> {
    pub fn new(matrix: &'a ReferenceMatrix, phased: bool) -> DiplotypeCaller<'a> {
        DiplotypeCaller {
            matrix,
            phased
        }
    }

    pub fn is_phased(&self) -> bool {
        self.phased
    }

    /// Calls the diplotype for an extracted sample
    /// # Errors
    /// * if the allele vectors do not match the matrix row count
    pub fn call_sample(&self, sample: &SampleGenotypes) -> Result<DiplotypeCall, CallerError> {
        call_diplotype(self.matrix, sample.copy_a(), sample.copy_b(), self.phased)
    }
}

/// This is the workhorse function for picking the best pair of star alleles for one sample.
/// Phased copies are matched independently and keep their orientation.
/// Unphased copies have every reassignment of their differing rows enumerated, and the pairings with the best combined score win.
/// # Arguments
/// * `matrix` - the reference haplotype matrix
/// * `copy_a` - the first observed allele vector
/// * `copy_b` - the second observed allele vector
/// * `phased` - if true, the copies are true haplotypes
/// # Errors
/// * if either vector length differs from the matrix row count
pub fn call_diplotype(
    matrix: &ReferenceMatrix, copy_a: &[ObservedState], copy_b: &[ObservedState], phased: bool
) -> Result<DiplotypeCall, CallerError> {
    let num_rows = matrix.num_rows();
    if copy_a.len() != num_rows || copy_b.len() != num_rows {
        return Err(CallerError::InvalidInput {
            copy_a: copy_a.len(),
            copy_b: copy_b.len(),
            expected: num_rows
        });
    }

    // the wild-type constrains every row, so any no-call can shift the relative scores
    let missing_evidence = copy_a.iter().chain(copy_b.iter())
        .any(|&s| s == ObservedState::Missing);

    // rows that can be moved between the copies when unphased
    let swappable_rows: Vec<usize> = if phased {
        vec![]
    } else {
        (0..num_rows).filter(|&r| copy_a[r] != copy_b[r]).collect()
    };

    let search_truncated = swappable_rows.len() > MAX_SWAPPABLE_ROWS;
    let num_assignments: usize = if swappable_rows.is_empty() || search_truncated {
        if search_truncated {
            warn!("{} differing rows exceeds the unphased search limit of {MAX_SWAPPABLE_ROWS}, scoring the given split only", swappable_rows.len());
        }
        1
    } else {
        // the first swappable row is pinned, the mirror image of each assignment is the same unordered pair
        1 << (swappable_rows.len() - 1)
    };

    let mut best_score: Option<PairScore> = None;
    let mut candidates: Vec<(usize, usize)> = vec![];
    let mut hap_a: Vec<ObservedState> = copy_a.to_vec();
    let mut hap_b: Vec<ObservedState> = copy_b.to_vec();
    for assignment in 0..num_assignments {
        // reset, then apply the swaps for this assignment
        hap_a.copy_from_slice(copy_a);
        hap_b.copy_from_slice(copy_b);
        for (bit, &row_index) in swappable_rows.iter().skip(1).enumerate() {
            if (assignment >> bit) & 0x1 != 0 {
                std::mem::swap(&mut hap_a[row_index], &mut hap_b[row_index]);
            }
        }

        let match_a = best_alleles(matrix, &hap_a);
        let match_b = best_alleles(matrix, &hap_b);
        let pair_score = PairScore::new(&match_a.score, &match_b.score);
        trace!("\tassignment {assignment}: {:?} {:?} => {pair_score:?}", match_a.best, match_b.best);

        let ordering = match best_score {
            Some(bs) => pair_score.cmp(&bs),
            None => Ordering::Greater
        };
        if ordering == Ordering::Less {
            continue;
        }
        if ordering == Ordering::Greater {
            best_score = Some(pair_score);
            candidates.clear();
        }

        for &a in match_a.best.iter() {
            for &b in match_b.best.iter() {
                let pair = if phased || a <= b { (a, b) } else { (b, a) };
                if !candidates.contains(&pair) {
                    candidates.push(pair);
                }
            }
        }
    }

    // deterministic priority, the first entry is reported
    candidates.sort_by(|p1, p2| pair_priority(matrix, *p1).cmp(&pair_priority(matrix, *p2)));
    let diplotypes: Vec<Diplotype> = candidates.iter()
        .map(|&(a, b)| {
            Diplotype::new(matrix.alleles()[a].name(), matrix.alleles()[b].name())
        })
        .collect();

    let status = if missing_evidence || search_truncated {
        CallStatus::Degraded
    } else if diplotypes.len() > 1 {
        CallStatus::Tied
    } else {
        CallStatus::Unambiguous
    };

    let mut diplotypes = diplotypes.into_iter();
    // there is always at least one candidate since every copy has a best allele
    let reported = diplotypes.next()
        .unwrap_or_else(|| {
            let wild_type = matrix.wild_type().name();
            Diplotype::new(wild_type, wild_type)
        });
    Ok(DiplotypeCall::new(reported, status, phased, diplotypes.collect()))
}

/// Sort key for a single allele; lower is preferred.
/// Alleles defined by more alternate states come first, then definition order, with wild-type after any named allele.
fn allele_priority(matrix: &ReferenceMatrix, allele_index: usize) -> (std::cmp::Reverse<usize>, bool, usize) {
    (
        std::cmp::Reverse(matrix.alleles()[allele_index].num_alternate()),
        allele_index == matrix.wild_type_index(),
        allele_index
    )
}

/// Sort key for a pairing; compares the preferred allele of each pair first
#[allow(clippy::type_complexity)]
fn pair_priority(matrix: &ReferenceMatrix, pair: (usize, usize)) -> ((std::cmp::Reverse<usize>, bool, usize), (std::cmp::Reverse<usize>, bool, usize)) {
    let p1 = allele_priority(matrix, pair.0);
    let p2 = allele_priority(matrix, pair.1);
    if p1 <= p2 {
        (p1, p2)
    } else {
        (p2, p1)
    }
}
