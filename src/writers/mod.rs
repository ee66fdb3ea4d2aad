/*!
# Writers module
Contains the logic for writing the output files for the score command.
*/
/// Generates the summary file
pub mod summary;
/// Generates the per-record decision file
pub mod variant_decisions;
