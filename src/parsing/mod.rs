/*!
# Parsing module
Contains the logic for loading input files into meaningful structs / data.
*/
/// Loads parsed variant records and evaluation configs from JSON
pub mod records;
/// Loads included regions from BED files
pub mod regions;
