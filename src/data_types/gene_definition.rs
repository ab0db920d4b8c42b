
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The default name of the wild-type allele if a definition does not provide one
pub const DEFAULT_WILD_TYPE: &str = "*1";

fn default_wild_type() -> String {
    DEFAULT_WILD_TYPE.to_string()
}

/// Serialized form of a gene translation table, which maps star alleles to the variants that define them.
/// This is exactly what is stored in a `<GENE>_translation.json` file.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GeneDefinition {
    /// The gene symbol, e.g. "CYP2C19"
    pub gene: String,
    /// The name of the wild-type allele, always present in the reference matrix
    #[serde(default = "default_wild_type")]
    pub wild_type: String,
    /// All the variants that are referenced by at least one allele
    pub variants: Vec<VariantDefinition>,
    /// The named star alleles
    pub alleles: Vec<AlleleDefinition>
}

/// A single defining variant, with coordinates for each build it is known on
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct VariantDefinition {
    /// Identifier referenced by the allele definitions, typically a dbSNP ID
    pub id: String,
    /// Reference sequence at the position
    pub reference: String,
    /// Alternate sequence that defines the variant
    pub alternate: String,
    /// Build label -> coordinates; labels are parsed as a GenomeBuild when loading
    #[serde(default)]
    pub coordinates: BTreeMap<String, BuildCoordinates>
}

/// Coordinates of a variant within one genome build
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BuildCoordinates {
    /// Chromosome label, e.g. "chr10"
    pub chrom: String,
    /// 1-based position, matching the VCF convention
    pub position: u64
}

/// A named star allele
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AlleleDefinition {
    /// Star allele name, e.g. "*2"
    pub name: String,
    /// Variant ID -> expected sequence on this allele
    #[serde(default)]
    pub variants: BTreeMap<String, String>,
    /// Variant IDs whose state does not matter for this allele
    #[serde(default)]
    pub unspecified: Vec<String>
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{
            "gene": "TEST",
            "variants": [
                { "id": "rs1", "reference": "A", "alternate": "G",
                  "coordinates": { "grch38": { "chrom": "chr1", "position": 100 } } }
            ],
            "alleles": [
                { "name": "*2", "variants": { "rs1": "G" } },
                { "name": "*3" }
            ]
        }"#;
        let definition: GeneDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(definition.wild_type, "*1");
        assert_eq!(definition.variants[0].coordinates.get("grch38").unwrap().position, 100);
        assert_eq!(definition.alleles[0].variants.get("rs1").unwrap(), "G");
        assert!(definition.alleles[1].variants.is_empty());
        assert!(definition.alleles[1].unspecified.is_empty());
    }

    #[test]
    fn test_missing_required_field() {
        // no alternate sequence on the variant
        let json = r#"{
            "gene": "TEST",
            "variants": [ { "id": "rs1", "reference": "A" } ],
            "alleles": []
        }"#;
        let result: Result<GeneDefinition, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
