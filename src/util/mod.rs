
/// Helper functions for read/writing JSON via serde, with gzip support
pub mod json_io;
/// Helper functions for generating the progress bars
pub mod progress_bar;
/// Bounded edit distance used for sequence similarity
pub mod sequence_alignment;
