
/// Benchmark sessions: record preparation, partitioning, matching, and finalizing
pub mod benchmark;
/// Command line interface functionality
pub mod cli;
/// Evaluation modes and per-type scoring settings
pub mod config;
/// Contains various shared data types
pub mod data_types;
/// Candidate lookup by type and location
pub mod genome_index;
/// Canonical merged interval sets
pub mod interval_store;
/// Core logic for matching query records against truth records
pub mod matcher;
/// Tooling for parsing input files into meaningful structs / data
pub mod parsing;
/// Event and base level statistics
pub mod statistics;
/// Tandem repeat count comparison and phase reconstruction
pub mod tandem_repeat;
/// Various utility functions that tend to be very generic
pub mod util;
/// All output writers
pub mod writers;
