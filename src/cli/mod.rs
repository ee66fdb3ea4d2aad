/*!
# CLI module
Command line interface functionality that is specific to SVbench.
*/

/// The main CLI module that contains the top-level CLI parser and help text
pub mod core;
/// The score CLI subcommand
pub mod score;
