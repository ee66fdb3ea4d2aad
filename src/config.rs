
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use strum::IntoEnumIterator;
use strum_macros::EnumString;

use crate::data_types::bins::Bins;
use crate::data_types::match_set::{MatchFlag, MatchSet};
use crate::data_types::sv_type::SvType;
use crate::genome_index::RegionIndex;

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum ConfigError {
    #[error("at least one bin floor is required")]
    EmptyBins,
    #[error("bin floors must be strictly ascending, found {floor} after {previous}")]
    UnsortedBins { previous: u64, floor: u64 },
    #[error("{sv_type}: percent distance must be finite and >= 0.0, found {value}")]
    PercentDistance { sv_type: SvType, value: f64 },
    #[error("{sv_type}: similarity threshold must be in [0.0, 1.0], found {value}")]
    SimilarityThreshold { sv_type: SvType, value: f64 },
    #[error("{sv_type}: filter {filter:?} is both included and excluded")]
    ConflictingFilter { sv_type: SvType, filter: String },
    #[error("{sv_type}: tandem repeat tolerance values must be finite and >= 0.0")]
    TrTolerance { sv_type: SvType },
    #[error("no variant types are configured for evaluation")]
    NoTypes
}

/// Evaluation modes, which control cross-type matching and whether genotypes are required for a true positive
#[derive(Clone, Copy, Default, Debug, Deserialize, Eq, PartialEq, Serialize, strum_macros::Display, EnumString, clap::ValueEnum)]
pub enum EvaluationMode {
    /// A matching allele is a true positive, genotypes are reported but not required
    #[default]
    #[serde(rename = "sc")]
    #[strum(ascii_case_insensitive, serialize = "sc")]
    #[clap(name = "sc")]
    SimpleCounting,
    /// A true positive requires both a matching allele and a matching genotype
    #[serde(rename = "gm")]
    #[strum(ascii_case_insensitive, serialize = "gm")]
    #[clap(name = "gm")]
    GenotypeMatching,
    /// Simple counting that also allows paired types (e.g. DEL and CNV loss) to match each other
    #[serde(rename = "cts")]
    #[strum(ascii_case_insensitive, serialize = "cts")]
    #[clap(name = "cts")]
    CrossTypeAndSimpleCounting
}

impl EvaluationMode {
    pub fn cross_type_enabled(&self) -> bool {
        matches!(self, EvaluationMode::CrossTypeAndSimpleCounting)
    }

    pub fn simple_counting_enabled(&self) -> bool {
        !matches!(self, EvaluationMode::GenotypeMatching)
    }

    /// Genotype mismatches only matter as a failure reason when genotypes are required
    pub fn genotype_matters(&self) -> bool {
        !self.simple_counting_enabled()
    }

    /// The flags an annotation must carry for its record to be a true positive
    pub fn required_match(&self) -> MatchSet {
        if self.simple_counting_enabled() {
            MatchSet::from_flags(&[MatchFlag::AlleleMatch])
        } else {
            MatchSet::allele_and_genotype()
        }
    }
}

/// Tolerance for comparing repeat unit counts, in repeat units.
/// The allowed difference for an expected count `c` is `max(absolute, fraction * c)`.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct TrTolerance {
    /// Minimum allowed difference
    pub absolute: f64,
    /// Allowed difference as a fraction of the expected count
    pub fraction: f64
}

impl Default for TrTolerance {
    fn default() -> Self {
        Self {
            absolute: 1.0,
            fraction: 0.05
        }
    }
}

impl TrTolerance {
    pub fn new(absolute: f64, fraction: f64) -> Self {
        Self { absolute, fraction }
    }

    /// Allowed difference (in repeat units) around an expected count
    pub fn threshold(&self, expected_count: f64) -> f64 {
        self.absolute.max(self.fraction * expected_count.abs())
    }

    fn is_valid(&self) -> bool {
        self.absolute.is_finite() && self.absolute >= 0.0 &&
            self.fraction.is_finite() && self.fraction >= 0.0
    }
}

/// Scoring settings for a single variant type
#[derive(Builder, Clone, Debug, Deserialize, Serialize)]
#[builder(default)]
#[serde(default)]
pub struct TypeConfig {
    /// Length bins used for stratifying the statistics
    bins: Bins,
    /// Maximum breakpoint tolerance in bp
    basepair_distance: u64,
    /// Breakpoint tolerance as a fraction of the variant length, capped by `basepair_distance`
    percent_distance: f64,
    /// If non-empty, a record must carry one of these filters; PASS or missing counts as "PASS"
    included_filters: Vec<String>,
    /// A record carrying any of these filters is not assessed
    excluded_filters: Vec<String>,
    /// Maximum annotations retained per record; None means use the record's ALT allele count
    max_matches: Option<usize>,
    /// Length ratio and sequence similarity threshold; 0.0 disables both checks
    similarity_threshold: f64,
    /// Tandem repeat count tolerance
    tr_tolerance: TrTolerance,
    /// Optional regions a record must be fully inside to be assessed
    #[serde(skip)]
    #[builder(setter(strip_option))]
    included_regions: Option<Arc<RegionIndex>>
}

impl Default for TypeConfig {
    fn default() -> Self {
        Self {
            bins: Bins::default(),
            basepair_distance: 500,
            percent_distance: 0.25,
            included_filters: vec!["PASS".to_string()],
            excluded_filters: vec![],
            max_matches: None,
            similarity_threshold: 0.7,
            tr_tolerance: TrTolerance::default(),
            included_regions: None
        }
    }
}

impl TypeConfig {
    /// Type-specific defaults; insertions have no span to scale against so they get a tighter distance
    pub fn default_for(sv_type: SvType) -> Self {
        match sv_type {
            SvType::Insertion => Self {
                basepair_distance: 100,
                ..Default::default()
            },
            _ => Self::default()
        }
    }

    /// Checks value ranges and filter conflicts
    /// # Errors
    /// * if any value is out of range, see `ConfigError`
    pub fn validate(&self, sv_type: SvType) -> Result<(), ConfigError> {
        if !self.percent_distance.is_finite() || self.percent_distance < 0.0 {
            return Err(ConfigError::PercentDistance { sv_type, value: self.percent_distance });
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::SimilarityThreshold { sv_type, value: self.similarity_threshold });
        }
        if !self.tr_tolerance.is_valid() {
            return Err(ConfigError::TrTolerance { sv_type });
        }
        if let Some(filter) = self.included_filters.iter().find(|f| self.excluded_filters.contains(f)) {
            return Err(ConfigError::ConflictingFilter { sv_type, filter: filter.clone() });
        }
        Ok(())
    }

    /// Returns true if a record with these FILTER values should be assessed.
    /// An empty list or "." is treated as PASS.
    pub fn passes_filters(&self, filters: &[String]) -> bool {
        let pass = ["PASS".to_string()];
        let effective: &[String] = if filters.is_empty() || filters.iter().all(|f| f == ".") {
            &pass
        } else {
            filters
        };

        if effective.iter().any(|f| self.excluded_filters.contains(f)) {
            return false;
        }
        self.included_filters.is_empty() ||
            effective.iter().any(|f| self.included_filters.contains(f))
    }

    /// Breakpoint tolerance for a variant of the given type and length
    /// # Arguments
    /// * `sv_type` - the variant type, percent distance only applies to types with a span
    /// * `length` - the variant length, if known
    pub fn breakpoint_tolerance(&self, sv_type: SvType, length: Option<u64>) -> u64 {
        match length {
            Some(length) if sv_type.uses_percent_distance() => {
                let scaled = (self.percent_distance * length as f64).round() as u64;
                scaled.min(self.basepair_distance)
            },
            _ => self.basepair_distance
        }
    }

    // getters
    pub fn bins(&self) -> &Bins {
        &self.bins
    }

    pub fn basepair_distance(&self) -> u64 {
        self.basepair_distance
    }

    pub fn percent_distance(&self) -> f64 {
        self.percent_distance
    }

    pub fn max_matches(&self) -> Option<usize> {
        self.max_matches
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold
    }

    pub fn tr_tolerance(&self) -> TrTolerance {
        self.tr_tolerance
    }

    pub fn included_regions(&self) -> Option<&RegionIndex> {
        self.included_regions.as_deref()
    }

    pub fn set_included_regions(&mut self, regions: Arc<RegionIndex>) {
        self.included_regions = Some(regions);
    }

    pub fn set_max_matches(&mut self, max_matches: Option<usize>) {
        self.max_matches = max_matches;
    }
}

/// Full evaluation settings: the mode plus a config for every type that should be scored.
/// Types missing from `types` are skipped.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub mode: EvaluationMode,
    pub types: BTreeMap<SvType, TypeConfig>
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            mode: EvaluationMode::default(),
            types: SvType::iter()
                .map(|sv_type| (sv_type, TypeConfig::default_for(sv_type)))
                .collect()
        }
    }
}

impl EvaluationConfig {
    /// Validates every type config
    /// # Errors
    /// * if there are no configured types
    /// * if any type config is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.types.is_empty() {
            return Err(ConfigError::NoTypes);
        }
        for (&sv_type, type_config) in self.types.iter() {
            type_config.validate(sv_type)?;
        }
        Ok(())
    }

    /// Config for a type, if the type is scored
    pub fn type_config(&self, sv_type: SvType) -> Option<&TypeConfig> {
        self.types.get(&sv_type)
    }

    /// Applies the same included regions to every type
    pub fn set_included_regions(&mut self, regions: Arc<RegionIndex>) {
        for type_config in self.types.values_mut() {
            type_config.set_included_regions(regions.clone());
        }
    }

    /// Applies the same match limit to every type
    pub fn set_max_matches(&mut self, max_matches: Option<usize>) {
        for type_config in self.types.values_mut() {
            type_config.set_max_matches(max_matches);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    #[test]
    fn test_defaults_validate() {
        let config = EvaluationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.types.len(), 10);
        assert_eq!(config.type_config(SvType::Insertion).unwrap().basepair_distance(), 100);
    }

    #[test]
    fn test_breakpoint_tolerance() {
        let config = TypeConfig::default();
        assert_eq!(config.breakpoint_tolerance(SvType::Deletion, Some(1000)), 250);
        assert_eq!(config.breakpoint_tolerance(SvType::Deletion, Some(100000)), 500);
        assert_eq!(config.breakpoint_tolerance(SvType::Deletion, None), 500);
        assert_eq!(config.breakpoint_tolerance(SvType::Insertion, Some(10)), 500);
    }

    #[test]
    fn test_filters() {
        let config = TypeConfigBuilder::default()
            .included_filters(vec!["PASS".to_string(), "LowQual".to_string()])
            .excluded_filters(vec!["Decoy".to_string()])
            .build().unwrap();
        assert!(config.passes_filters(&[]));
        assert!(config.passes_filters(&[".".to_string()]));
        assert!(config.passes_filters(&["LowQual".to_string()]));
        assert!(!config.passes_filters(&["LowQual".to_string(), "Decoy".to_string()]));
        assert!(!config.passes_filters(&["Other".to_string()]));
    }

    #[test]
    fn test_invalid_configs() {
        let config = TypeConfigBuilder::default()
            .included_filters(vec!["PASS".to_string()])
            .excluded_filters(vec!["PASS".to_string()])
            .build().unwrap();
        assert_eq!(config.validate(SvType::Deletion), Err(ConfigError::ConflictingFilter {
            sv_type: SvType::Deletion, filter: "PASS".to_string()
        }));

        let config = TypeConfigBuilder::default().similarity_threshold(1.5).build().unwrap();
        assert!(matches!(config.validate(SvType::Insertion), Err(ConfigError::SimilarityThreshold { .. })));

        let config = TypeConfigBuilder::default().tr_tolerance(TrTolerance::new(-1.0, 0.0)).build().unwrap();
        assert!(matches!(config.validate(SvType::TandemRepeat), Err(ConfigError::TrTolerance { .. })));

        let empty = EvaluationConfig { mode: EvaluationMode::SimpleCounting, types: BTreeMap::new() };
        assert_eq!(empty.validate(), Err(ConfigError::NoTypes));
    }

    #[test]
    fn test_tr_tolerance() {
        let tolerance = TrTolerance::new(1.0, 0.1);
        assert_approx_eq!(tolerance.threshold(5.0), 1.0);
        assert_approx_eq!(tolerance.threshold(50.0), 5.0);
    }

    #[test]
    fn test_modes() {
        assert!(EvaluationMode::CrossTypeAndSimpleCounting.cross_type_enabled());
        assert!(!EvaluationMode::GenotypeMatching.simple_counting_enabled());
        assert!(EvaluationMode::GenotypeMatching.genotype_matters());
        assert_eq!(EvaluationMode::GenotypeMatching.required_match(), MatchSet::allele_and_genotype());

        let parsed: EvaluationConfig = serde_json::from_str(
            "{\"mode\": \"gm\", \"types\": {\"DEL\": {\"basepair_distance\": 200, \"bins\": [{\"floor\": 50}]}}}"
        ).unwrap();
        assert_eq!(parsed.mode, EvaluationMode::GenotypeMatching);
        assert_eq!(parsed.types.len(), 1);
        assert_eq!(parsed.type_config(SvType::Deletion).unwrap().basepair_distance(), 200);
        assert_approx_eq!(parsed.type_config(SvType::Deletion).unwrap().percent_distance(), 0.25);
    }
}
