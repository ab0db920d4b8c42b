/// the main CLI module
pub mod core;
/// the call CLI subcommand for calling the diplotypes
pub mod call;
/// The describe CLI subcommand for gene definition statistics
pub mod describe;
