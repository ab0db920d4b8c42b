
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// Matches assembly labels that indicate GRCh38, e.g. "GRCh38", "hg38", "b38", "GRCh38_full_analysis_set.fa"
    static ref GRCH38_REGEX: Regex = Regex::new(r"(?i)(grch38|hg38|\bb38\b|GCA_000001405\.15|GCF_000001405\.(2[6-9]|[3-9][0-9]))").unwrap();
    /// Matches assembly labels that indicate GRCh37, e.g. "GRCh37", "hg19", "b37", "hs37d5", "human_g1k_v37"
    static ref GRCH37_REGEX: Regex = Regex::new(r"(?i)(grch37|hg19|\bb37\b|hs37d5|g1k_v37|GCF_000001405\.(1[3-9]|2[0-5]))").unwrap();
}

/// The genome assemblies that a gene definition can be expressed in
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[derive(strum_macros::Display, strum_macros::EnumString, strum_macros::EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum GenomeBuild {
    #[strum(to_string = "grch37", serialize = "hg19", serialize = "b37")]
    Grch37,
    #[default]
    #[strum(to_string = "grch38", serialize = "hg38", serialize = "b38")]
    Grch38
}

impl GenomeBuild {
    /// Attempts to identify a build from a free-text assembly label, such as a VCF `##reference` line.
    /// Returns None if the label does not clearly identify a single build.
    /// # Arguments
    /// * `label` - the assembly label to inspect
    pub fn from_assembly_label(label: &str) -> Option<GenomeBuild> {
        let is_38 = GRCH38_REGEX.is_match(label);
        let is_37 = GRCH37_REGEX.is_match(label);
        match (is_37, is_38) {
            (true, false) => Some(GenomeBuild::Grch37),
            (false, true) => Some(GenomeBuild::Grch38),
            // either nothing matched or it is contradictory
            _ => None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_parse_build() {
        assert_eq!(GenomeBuild::from_str("grch38").unwrap(), GenomeBuild::Grch38);
        assert_eq!(GenomeBuild::from_str("GRCh38").unwrap(), GenomeBuild::Grch38);
        assert_eq!(GenomeBuild::from_str("hg19").unwrap(), GenomeBuild::Grch37);
        assert_eq!(GenomeBuild::from_str("b37").unwrap(), GenomeBuild::Grch37);
        assert!(GenomeBuild::from_str("grch36").is_err());

        // display always uses the canonical label
        assert_eq!(GenomeBuild::Grch37.to_string(), "grch37");
        for build in GenomeBuild::iter() {
            assert_eq!(GenomeBuild::from_str(&build.to_string()).unwrap(), build);
        }
    }

    #[test]
    fn test_from_assembly_label() {
        assert_eq!(GenomeBuild::from_assembly_label("file:///refs/GRCh38_full_analysis_set_plus_decoy_hla.fa"), Some(GenomeBuild::Grch38));
        assert_eq!(GenomeBuild::from_assembly_label("hs37d5.fa.gz"), Some(GenomeBuild::Grch37));
        assert_eq!(GenomeBuild::from_assembly_label("hg19"), Some(GenomeBuild::Grch37));
        assert_eq!(GenomeBuild::from_assembly_label("b38"), Some(GenomeBuild::Grch38));
        assert_eq!(GenomeBuild::from_assembly_label("my_custom_reference.fa"), None);
        assert_eq!(GenomeBuild::from_assembly_label("liftover_hg19_to_hg38"), None);
    }
}
