
use serde::{Deserialize, Serialize};

/// A pair of star allele labels, one per haplotype copy
#[derive(Clone, Debug, Deserialize, Eq, Serialize)]
pub struct Diplotype {
    /// short string for haplotype 1
    hap1: String,
    /// short string for haplotype 2
    hap2: String,
    /// combination diplotype call
    diplotype: String
}

impl Diplotype {
    pub fn new(hap1: &str, hap2: &str) -> Diplotype {
        Diplotype {
            hap1: hap1.to_string(),
            hap2: hap2.to_string(),
            diplotype: format!("{hap1}/{hap2}")
        }
    }

    // getters
    pub fn hap1(&self) -> &str {
        &self.hap1
    }

    pub fn hap2(&self) -> &str {
        &self.hap2
    }

    pub fn diplotype(&self) -> &str {
        &self.diplotype
    }

    /// Returns true if both orientation and labels are identical; `==` ignores orientation
    pub fn is_same_orientation(&self, other: &Diplotype) -> bool {
        self.hap1 == other.hap1 && self.hap2 == other.hap2
    }
}

impl PartialEq for Diplotype {
    fn eq(&self, other: &Self) -> bool {
        // this allows for a swap in hap1/hap2 and we still report identity
        (self.hap1 == other.hap1 && self.hap2 == other.hap2) ||
            (self.hap1 == other.hap2 && self.hap2 == other.hap1)
    }
}

impl PartialOrd for Diplotype {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Diplotype {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // sort the haplotypes to make sure we are comparing the same ones
        let mut ordered_haps = vec![&self.hap1, &self.hap2];
        let mut ordered_other_haps = vec![&other.hap1, &other.hap2];
        ordered_haps.sort();
        ordered_other_haps.sort();
        ordered_haps.cmp(&ordered_other_haps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diplotype() {
        let diplotype = Diplotype::new("*2", "*1");
        assert_eq!(diplotype.diplotype(), "*2/*1");
        assert_eq!(diplotype.hap1(), "*2");
        assert_eq!(diplotype.hap2(), "*1");
    }

    #[test]
    fn test_unordered_equality() {
        let d1 = Diplotype::new("*2", "*1");
        let d2 = Diplotype::new("*1", "*2");
        assert_eq!(d1, d2);
        assert_eq!(d1.cmp(&d2), std::cmp::Ordering::Equal);
        assert!(!d1.is_same_orientation(&d2));
        assert!(Diplotype::new("*1", "*2") < Diplotype::new("*1", "*3"));
    }
}
