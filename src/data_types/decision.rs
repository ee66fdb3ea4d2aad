
use serde::{Deserialize, Serialize};

/// Each variant has a source
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, strum_macros::AsRefStr)]
pub enum VariantSource {
    #[strum(serialize = "TRUTH")]
    Truth,
    #[strum(serialize = "QUERY")]
    Query
}

impl VariantSource {
    /// The decision a record from this source gets when nothing matched it well enough
    pub fn false_decision(&self) -> Decision {
        match self {
            VariantSource::Truth => Decision::FalseNegative,
            VariantSource::Query => Decision::FalsePositive
        }
    }
}

/// Final outcome for a single record, assigned exactly once at finalize
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, strum_macros::AsRefStr)]
pub enum Decision {
    #[strum(serialize = "TP")]
    TruePositive,
    #[strum(serialize = "FP")]
    FalsePositive,
    #[strum(serialize = "FN")]
    FalseNegative,
    #[strum(serialize = "N")]
    NotAssessed
}

/// Why a better classification was not reached.
/// Only one reason survives per annotation, see `FailedReason::resolve(...)`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, strum_macros::AsRefStr)]
pub enum FailedReason {
    /// No failure
    #[default]
    Unset,
    NoOverlap,
    BordersTooFarOff,
    GtMismatch,
    CnMismatch,
    LengthMismatch,
    LengthUnassessed,
    SequenceMismatch,
    SequenceUnassessed,
    BndPartialMatch,
    RucMismatch,
    RucNotFoundOrInvalid,
    RucAlleleCountDiff,
    RucAlleleTruthError,
    OutsideBedRegion,
    FilteredBySettings,
    UnpairedBnd,
    VariantTypeSkipped,
    Other
}

impl FailedReason {
    /// Picks the single surviving reason from everything collected for one annotation.
    /// Precedence: SequenceMismatch, BndPartialMatch, BordersTooFarOff, CnMismatch, GtMismatch (only if genotypes matter),
    /// LengthUnassessed, SequenceUnassessed, then whatever was collected first.
    /// # Arguments
    /// * `reasons` - collected reasons in the order they were found
    /// * `genotype_matters` - true if the active mode requires a genotype match
    pub fn resolve(reasons: &[FailedReason], genotype_matters: bool) -> FailedReason {
        let mut precedence: Vec<FailedReason> = vec![
            FailedReason::SequenceMismatch,
            FailedReason::BndPartialMatch,
            FailedReason::BordersTooFarOff,
            FailedReason::CnMismatch
        ];
        if genotype_matters {
            precedence.push(FailedReason::GtMismatch);
        }
        precedence.push(FailedReason::LengthUnassessed);
        precedence.push(FailedReason::SequenceUnassessed);

        precedence.into_iter()
            .find(|r| reasons.contains(r))
            .or_else(|| reasons.iter().copied().find(|&r| r != FailedReason::Unset))
            .unwrap_or_default()
    }

    /// Returns true if this reason prevents an allele match
    pub fn blocks_allele_match(&self) -> bool {
        matches!(self,
            FailedReason::LengthMismatch |
            FailedReason::SequenceMismatch |
            FailedReason::CnMismatch |
            FailedReason::RucMismatch |
            FailedReason::RucNotFoundOrInvalid |
            FailedReason::RucAlleleCountDiff |
            FailedReason::RucAlleleTruthError
        )
    }

    /// Reasons assigned before matching that exclude a record from assessment entirely
    pub fn is_disqualifying(&self) -> bool {
        matches!(self,
            FailedReason::FilteredBySettings |
            FailedReason::UnpairedBnd |
            FailedReason::VariantTypeSkipped
        )
    }
}
