
use serde::{Deserialize, Serialize};

/// Strips a leading "chr" so that "chr10" and "10" compare equal
/// # Arguments
/// * `chrom` - the chromosome label to normalize
pub fn normalize_chrom(chrom: &str) -> &str {
    chrom.strip_prefix("chr").unwrap_or(chrom)
}

/// Wrapper for basic region coordinates, used to describe the span of a gene's defining variants
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Coordinates {
    /// Chromosome string
    chrom: String,
    /// 0-based start, inclusive
    start: u64,
    /// 0-based end, exclusive
    end: u64
}

impl Coordinates {
    /// Typical constructor with some verification
    pub fn new(chrom: String, start: u64, end: u64) -> Coordinates {
        assert!(start <= end);
        Coordinates {
            chrom, start, end
        }
    }

    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // start and end are 0-based, so shift start+1
        write!(f, "{}:{}-{}", self.chrom, self.start+1, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates() {
        let coordinate = Coordinates::new("chr10".to_string(), 10, 20);
        assert_eq!(coordinate.to_string(), "chr10:11-20");
        assert_eq!(coordinate.chrom(), "chr10");
        assert_eq!((coordinate.start(), coordinate.end()), (10, 20));
    }

    #[test]
    fn test_normalize_chrom() {
        assert_eq!(normalize_chrom("chr10"), "10");
        assert_eq!(normalize_chrom("10"), "10");
        assert_eq!(normalize_chrom("chrX"), "X");
    }

    #[test]
    #[should_panic]
    fn test_bad_coordinates() {
        let _coordinate = Coordinates::new("chr1".to_string(), 10, 5);
    }
}
