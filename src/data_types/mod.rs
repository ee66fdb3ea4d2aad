
/// Ranked candidate matches attached to records
pub mod annotation;
/// Size bins used for stratifying statistics
pub mod bins;
/// Symmetric breakpoint distance scoring
pub mod border_distance;
/// Per-record decisions, sources, and failure reasons
pub mod decision;
/// The typed record interface supplied by external readers
pub mod input_record;
/// Intervals with per-side inclusivity
pub mod interval;
/// Orthogonal match classification flags
pub mod match_set;
/// Genotype and copy number sample information
pub mod sample;
/// Records prepared for matching
pub mod scored_variant;
/// Contains tracker for TP, FP, FN and derived metrics
pub mod summary_metrics;
/// Structural variant types and their capabilities
pub mod sv_type;
