
use log::{debug, warn};
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::data_types::gene_definition::GeneDefinition;
use crate::data_types::genome_build::GenomeBuild;
use crate::data_types::haplotype_matrix::{ExpectedState, ReferenceMatrix, StarAllele, VariantPosition};
use crate::errors::LoaderError;
use crate::util::file_io::load_json;

/// Returns the expected path of a gene's translation table, preferring an uncompressed file if both exist.
/// # Arguments
/// * `definitions_dir` - the folder containing all the `<GENE>_translation.json` files
/// * `gene` - the gene name
pub fn definition_path(definitions_dir: &Path, gene: &str) -> PathBuf {
    let plain = definitions_dir.join(format!("{gene}_translation.json"));
    let compressed = definitions_dir.join(format!("{gene}_translation.json.gz"));
    if !plain.exists() && compressed.exists() {
        compressed
    } else {
        plain
    }
}

/// Loads a gene's translation table from the definitions folder and converts it into a reference matrix.
/// # Arguments
/// * `definitions_dir` - the folder containing the translation tables
/// * `gene` - the gene to load
/// * `build` - the genome build that positions should be expressed in
/// # Errors
/// * `DefinitionNotFound` if there is no translation table for the gene
/// * `MalformedDefinition` if the file cannot be parsed or is structurally invalid
pub fn load_reference_matrix(definitions_dir: &Path, gene: &str, build: GenomeBuild) -> Result<ReferenceMatrix, LoaderError> {
    let path = definition_path(definitions_dir, gene);
    if !path.exists() {
        return Err(LoaderError::DefinitionNotFound {
            gene: gene.to_string(),
            path
        });
    }

    debug!("Loading {gene} definition from {path:?}");
    let definition: GeneDefinition = load_json(&path)
        .map_err(|e| LoaderError::malformed(gene, format!("failed to parse {path:?}: {e}")))?;

    if !definition.gene.eq_ignore_ascii_case(gene) {
        return Err(LoaderError::malformed(gene, format!("file {path:?} describes gene {:?}", definition.gene)));
    }

    build_reference_matrix(&definition, build)
}

/// Converts a parsed translation table into the reference matrix for one build.
/// Rows are sorted by coordinate, columns follow the definition order with the wild-type added first if it was not declared.
/// # Arguments
/// * `definition` - the parsed translation table
/// * `build` - the genome build that positions should be expressed in
/// # Errors
/// * if required fields are empty
/// * if variant IDs or allele names are duplicated
/// * if a variant has no coordinates for the requested build
/// * if an allele references an undefined variant or an unexpected sequence
pub fn build_reference_matrix(definition: &GeneDefinition, build: GenomeBuild) -> Result<ReferenceMatrix, LoaderError> {
    let gene: &str = &definition.gene;
    if gene.is_empty() {
        return Err(LoaderError::malformed("UNKNOWN", "missing gene name"));
    }
    if definition.wild_type.is_empty() {
        return Err(LoaderError::malformed(gene, "missing wild-type allele name"));
    }

    // first pass collects the rows for this build
    let mut positions: Vec<VariantPosition> = Vec::with_capacity(definition.variants.len());
    let mut variant_ids: HashSet<&str> = Default::default();
    for variant in definition.variants.iter() {
        let variant_id: &str = &variant.id;
        if variant_id.is_empty() {
            return Err(LoaderError::malformed(gene, "variant with an empty ID"));
        }
        if !variant_ids.insert(variant_id) {
            return Err(LoaderError::malformed(gene, format!("duplicate variant ID {variant_id}")));
        }
        if variant.reference.is_empty() || variant.alternate.is_empty() {
            return Err(LoaderError::malformed(gene, format!("variant {variant_id} is missing a reference or alternate sequence")));
        }
        if variant.reference == variant.alternate {
            return Err(LoaderError::malformed(gene, format!("variant {variant_id} has identical reference and alternate sequence")));
        }

        // the labels are free text in the file, so parse them here
        let mut build_coordinates = None;
        for (label, coordinates) in variant.coordinates.iter() {
            match GenomeBuild::from_str(label) {
                Ok(b) if b == build => {
                    if build_coordinates.is_some() {
                        return Err(LoaderError::malformed(gene, format!("variant {variant_id} has multiple coordinates for {build}")));
                    }
                    build_coordinates = Some(coordinates);
                },
                Ok(_) => {},
                Err(_) => warn!("Ignoring unknown build label {label:?} on {gene} variant {variant_id}")
            };
        }

        let coordinates = build_coordinates
            .ok_or_else(|| LoaderError::malformed(gene, format!("variant {variant_id} has no coordinates for {build}")))?;
        if coordinates.chrom.is_empty() || coordinates.position == 0 {
            return Err(LoaderError::malformed(gene, format!("variant {variant_id} has invalid coordinates for {build}")));
        }

        positions.push(VariantPosition::new(
            variant_id.to_string(),
            coordinates.chrom.clone(),
            coordinates.position,
            variant.reference.clone(),
            variant.alternate.clone()
        ));
    }
    positions.sort();
    for pair in positions.windows(2) {
        if pair[0].chrom() == pair[1].chrom() && pair[0].position() == pair[1].position() && pair[0].alternate() == pair[1].alternate() {
            return Err(LoaderError::malformed(gene, format!("variants {} and {} have identical coordinates", pair[0], pair[1])));
        }
    }

    let row_lookup: HashMap<&str, usize> = positions.iter()
        .enumerate()
        .map(|(row_index, p)| (p.variant_id(), row_index))
        .collect();

    // second pass fills in the columns
    let mut alleles: Vec<StarAllele> = Vec::with_capacity(definition.alleles.len() + 1);
    for allele_def in definition.alleles.iter() {
        let allele_name: &str = &allele_def.name;
        if allele_name.is_empty() {
            return Err(LoaderError::malformed(gene, "allele with an empty name"));
        }

        // unlisted positions are expected to be reference
        let mut expected: Vec<ExpectedState> = vec![ExpectedState::Reference; positions.len()];
        for (variant_id, sequence) in allele_def.variants.iter() {
            let row_index: usize = *row_lookup.get(variant_id.as_str())
                .ok_or_else(|| LoaderError::malformed(gene, format!("allele {allele_name} references undefined variant {variant_id}")))?;
            let position = &positions[row_index];
            expected[row_index] = if sequence == position.alternate() {
                ExpectedState::Alternate
            } else if sequence == position.reference() {
                ExpectedState::Reference
            } else {
                return Err(LoaderError::malformed(gene, format!(
                    "allele {allele_name} expects {sequence:?} at {position}, which is neither reference nor alternate"
                )));
            };
        }

        for variant_id in allele_def.unspecified.iter() {
            let row_index: usize = *row_lookup.get(variant_id.as_str())
                .ok_or_else(|| LoaderError::malformed(gene, format!("allele {allele_name} references undefined variant {variant_id}")))?;
            if allele_def.variants.contains_key(variant_id) {
                return Err(LoaderError::malformed(gene, format!("allele {allele_name} both specifies and ignores {variant_id}")));
            }
            expected[row_index] = ExpectedState::DontCare;
        }

        alleles.push(StarAllele::new(allele_name.to_string(), expected));
    }

    // the wild-type is a standing candidate even when the file does not list it
    if !alleles.iter().any(|a| a.name() == definition.wild_type) {
        debug!("Adding implicit wild-type allele {} for {gene}", definition.wild_type);
        alleles.insert(0, StarAllele::new(
            definition.wild_type.clone(),
            vec![ExpectedState::Reference; positions.len()]
        ));
    }

    let matrix = ReferenceMatrix::new(gene, build, positions, alleles, &definition.wild_type)?;
    let uninformative = (0..matrix.num_rows()).filter(|&r| !matrix.is_informative(r)).count();
    if uninformative > 0 {
        debug!("{gene} has {uninformative} variant positions that do not separate any alleles");
    }
    debug!("Built {gene} reference matrix with {} positions and {} alleles", matrix.num_rows(), matrix.num_alleles());
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::data_types::gene_definition::{AlleleDefinition, BuildCoordinates, VariantDefinition};
    use crate::util::file_io::save_json;

    fn variant(id: &str, reference: &str, alternate: &str, pos38: u64, pos37: Option<u64>) -> VariantDefinition {
        let mut coordinates = vec![
            ("grch38".to_string(), BuildCoordinates { chrom: "chr10".to_string(), position: pos38 })
        ];
        if let Some(p) = pos37 {
            coordinates.push(("hg19".to_string(), BuildCoordinates { chrom: "10".to_string(), position: p }));
        }
        VariantDefinition {
            id: id.to_string(),
            reference: reference.to_string(),
            alternate: alternate.to_string(),
            coordinates: coordinates.into_iter().collect()
        }
    }

    fn allele(name: &str, variants: &[(&str, &str)], unspecified: &[&str]) -> AlleleDefinition {
        AlleleDefinition {
            name: name.to_string(),
            variants: variants.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            unspecified: unspecified.iter().map(|s| s.to_string()).collect()
        }
    }

    /// Variants are listed out of order on purpose
    fn test_definition() -> GeneDefinition {
        GeneDefinition {
            gene: "TEST".to_string(),
            wild_type: "*1".to_string(),
            variants: vec![
                variant("rs200", "C", "T", 200, Some(1200)),
                variant("rs100", "A", "G", 100, Some(1100))
            ],
            alleles: vec![
                allele("*2", &[("rs100", "G")], &[]),
                allele("*3", &[("rs200", "T")], &["rs100"])
            ]
        }
    }

    #[test]
    fn test_build_reference_matrix() {
        let matrix = build_reference_matrix(&test_definition(), GenomeBuild::Grch38).unwrap();

        // rows are sorted by position
        assert_eq!(matrix.num_rows(), 2);
        assert_eq!(matrix.positions()[0].variant_id(), "rs100");
        assert_eq!(matrix.positions()[1].variant_id(), "rs200");

        // wild-type is added up front, then declaration order
        let names: Vec<&str> = matrix.alleles().iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["*1", "*2", "*3"]);
        assert_eq!(matrix.wild_type_index(), 0);
        assert_eq!(matrix.alleles()[1].expected(), &[ExpectedState::Alternate, ExpectedState::Reference]);
        assert_eq!(matrix.alleles()[2].expected(), &[ExpectedState::DontCare, ExpectedState::Alternate]);
    }

    #[test]
    fn test_build_selection() {
        let matrix = build_reference_matrix(&test_definition(), GenomeBuild::Grch37).unwrap();
        assert_eq!(matrix.build(), GenomeBuild::Grch37);
        assert_eq!(matrix.positions()[0].position(), 1100);
        assert_eq!(matrix.positions()[0].chrom(), "10");

        // remove the GRCh37 coordinates from one variant
        let mut definition = test_definition();
        definition.variants[0] = variant("rs200", "C", "T", 200, None);
        let result = build_reference_matrix(&definition, GenomeBuild::Grch37);
        assert!(matches!(result, Err(LoaderError::MalformedDefinition { .. })));
    }

    #[test]
    fn test_declared_wild_type() {
        let mut definition = test_definition();
        definition.alleles.push(allele("*1", &[("rs100", "A")], &[]));
        let matrix = build_reference_matrix(&definition, GenomeBuild::Grch38).unwrap();
        assert_eq!(matrix.num_alleles(), 3);
        assert_eq!(matrix.wild_type_index(), 2);

        // a wild-type that carries a variant is not allowed
        let mut definition = test_definition();
        definition.alleles.push(allele("*1", &[("rs100", "G")], &[]));
        assert!(build_reference_matrix(&definition, GenomeBuild::Grch38).is_err());
    }

    #[test]
    fn test_malformed_definitions() {
        // duplicate allele
        let mut definition = test_definition();
        definition.alleles.push(allele("*2", &[("rs200", "T")], &[]));
        assert!(build_reference_matrix(&definition, GenomeBuild::Grch38).is_err());

        // undefined variant
        let mut definition = test_definition();
        definition.alleles.push(allele("*4", &[("rs999", "T")], &[]));
        assert!(build_reference_matrix(&definition, GenomeBuild::Grch38).is_err());

        // unexpected sequence
        let mut definition = test_definition();
        definition.alleles.push(allele("*4", &[("rs200", "G")], &[]));
        assert!(build_reference_matrix(&definition, GenomeBuild::Grch38).is_err());

        // duplicate variant id
        let mut definition = test_definition();
        definition.variants.push(variant("rs100", "A", "C", 300, None));
        assert!(build_reference_matrix(&definition, GenomeBuild::Grch38).is_err());

        // duplicate coordinates under different ids
        let mut definition = test_definition();
        definition.variants.push(variant("rs101", "A", "G", 100, None));
        assert!(build_reference_matrix(&definition, GenomeBuild::Grch38).is_err());

        // missing gene
        let mut definition = test_definition();
        definition.gene = String::new();
        assert!(build_reference_matrix(&definition, GenomeBuild::Grch38).is_err());
    }

    #[test]
    fn test_load_reference_matrix() {
        let tmp_dir = tempfile::tempdir().unwrap();

        // nothing written yet
        let result = load_reference_matrix(tmp_dir.path(), "TEST", GenomeBuild::Grch38);
        assert!(matches!(result, Err(LoaderError::DefinitionNotFound { .. })));

        // compressed files are found too
        save_json(&test_definition(), &tmp_dir.path().join("TEST_translation.json.gz")).unwrap();
        let matrix = load_reference_matrix(tmp_dir.path(), "TEST", GenomeBuild::Grch38).unwrap();
        assert_eq!(matrix.gene(), "TEST");

        // unparseable file
        std::fs::write(tmp_dir.path().join("BROKEN_translation.json"), "{ not json").unwrap();
        let result = load_reference_matrix(tmp_dir.path(), "BROKEN", GenomeBuild::Grch38);
        assert!(matches!(result, Err(LoaderError::MalformedDefinition { .. })));

        // file describing another gene
        save_json(&test_definition(), &tmp_dir.path().join("OTHER_translation.json")).unwrap();
        let result = load_reference_matrix(tmp_dir.path(), "OTHER", GenomeBuild::Grch38);
        assert!(matches!(result, Err(LoaderError::MalformedDefinition { .. })));
    }

    #[test]
    fn test_shipped_definitions() {
        let definitions_dir = Path::new("data/definitions");
        for gene in ["CYP2C9", "CYP2C19"] {
            for build in [GenomeBuild::Grch37, GenomeBuild::Grch38] {
                let matrix = load_reference_matrix(definitions_dir, gene, build).unwrap();
                assert_eq!(matrix.wild_type().name(), "*1");
                assert!(matrix.num_rows() > 0);
                assert!((0..matrix.num_rows()).all(|r| matrix.is_informative(r)));
            }
        }
    }
}
