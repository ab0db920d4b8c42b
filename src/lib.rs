
/// Contains the scoring and pairing logic that turns allele vectors into diplotype calls
pub mod caller;
/// Contains all the CLI related functionality
pub mod cli;
/// Contains any specialized data types that are shared across the tooling
pub mod data_types;
/// Contains functionality for turning gene definition files into reference matrices
pub mod definition_loader;
/// Contains functionality for displaying gene definition statistics
pub mod describe;
/// Contains the per-gene orchestration of loading, extraction, and calling
pub mod diplotyper;
/// Contains the error types for each stage of the pipeline
pub mod errors;
/// Contains functionality for pulling per-sample allele vectors out of a VCF
pub mod genotype_extractor;
/// Contains generic utilities that are handy wrappers
pub mod util;
