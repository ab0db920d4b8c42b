
/// Contains the observed allele vectors extracted for each sample
pub mod allele_vector;
/// Contains the serializable results of a full run
pub mod call_results;
/// Contains the coordinates functionality
pub mod coordinates;
/// Contains the per-sample diplotype call and its confidence flag
pub mod diplotype_call;
/// Contains serialization for the gene translation tables
pub mod gene_definition;
/// Contains the supported genome builds
pub mod genome_build;
/// Contains the reference haplotype matrix that all samples are scored against
pub mod haplotype_matrix;
/// Contains definitions related to the representation of a final diplotype
pub mod pgx_diplotype;
