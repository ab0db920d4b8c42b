
use serde::Serialize;

use crate::data_types::pgx_diplotype::Diplotype;

/// How much confidence we have in a diplotype call
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[derive(strum_macros::Display, strum_macros::AsRefStr)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    /// Exactly one pairing achieved the best score with no missing evidence
    #[strum(serialize = "unambiguous")]
    Unambiguous,
    /// Multiple pairings achieved the identical best score
    #[strum(serialize = "tied")]
    Tied,
    /// A position that separates candidate alleles was a no-call
    #[strum(serialize = "degraded")]
    Degraded
}

/// The final output of the caller for a single sample
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DiplotypeCall {
    /// The reported pair of star alleles
    diplotype: Diplotype,
    /// Confidence flag for the call
    status: CallStatus,
    /// If true, hap1/hap2 correspond to copy A/copy B; otherwise the pair is unordered
    phased: bool,
    /// Any other pairings that tied with the reported one, in priority order
    alternatives: Vec<Diplotype>
}

impl DiplotypeCall {
    /// Constructor, `alternatives` should not contain the reported diplotype
    pub fn new(diplotype: Diplotype, status: CallStatus, phased: bool, alternatives: Vec<Diplotype>) -> DiplotypeCall {
        DiplotypeCall {
            diplotype,
            status,
            phased,
            alternatives
        }
    }

    pub fn diplotype(&self) -> &Diplotype {
        &self.diplotype
    }

    pub fn status(&self) -> CallStatus {
        self.status
    }

    pub fn is_phased(&self) -> bool {
        self.phased
    }

    pub fn alternatives(&self) -> &[Diplotype] {
        &self.alternatives
    }

    pub fn is_unambiguous(&self) -> bool {
        self.status == CallStatus::Unambiguous
    }
}

impl std::fmt::Display for DiplotypeCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.diplotype.diplotype(), self.status)?;
        if !self.alternatives.is_empty() {
            let others: Vec<&str> = self.alternatives.iter().map(|d| d.diplotype()).collect();
            write!(f, " alternatives: {}", others.join(", "))?;
        }
        Ok(())
    }
}
