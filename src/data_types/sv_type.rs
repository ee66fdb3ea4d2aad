
use serde::{Deserialize, Serialize};

/// All the structural variant types we can score
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
    strum_macros::AsRefStr, strum_macros::Display, strum_macros::EnumIter, strum_macros::EnumString)]
pub enum SvType {
    /// SVTYPE=DEL
    #[serde(rename = "DEL")]
    #[strum(ascii_case_insensitive, serialize = "DEL")]
    Deletion=0,
    /// SVTYPE=DUP
    #[serde(rename = "DUP")]
    #[strum(ascii_case_insensitive, serialize = "DUP")]
    Duplication,
    /// SVTYPE=INS
    #[serde(rename = "INS")]
    #[strum(ascii_case_insensitive, serialize = "INS")]
    Insertion,
    /// SVTYPE=INV
    #[serde(rename = "INV")]
    #[strum(ascii_case_insensitive, serialize = "INV")]
    Inversion,
    /// SVTYPE=CNV with a copy number above the reference ploidy
    #[serde(rename = "CNV_GAIN")]
    #[strum(ascii_case_insensitive, serialize = "CNV_GAIN")]
    CopyNumberGain,
    /// SVTYPE=CNV with a copy number below the reference ploidy
    #[serde(rename = "CNV_LOSS")]
    #[strum(ascii_case_insensitive, serialize = "CNV_LOSS")]
    CopyNumberLoss,
    /// SVTYPE=CNV with a copy number equal to the reference ploidy
    #[serde(rename = "CNV_REF")]
    #[strum(ascii_case_insensitive, serialize = "CNV_REF")]
    CopyNumberReference,
    /// Tandem repeat / VNTR allele described by repeat unit counts
    #[serde(rename = "TR")]
    #[strum(ascii_case_insensitive, serialize = "TR")]
    TandemRepeat,
    /// Breakend pair with both mates on the same contig
    #[serde(rename = "BND")]
    #[strum(ascii_case_insensitive, serialize = "BND")]
    IntraChromosomeBreakend,
    /// Breakend pair with mates on different contigs
    #[serde(rename = "TRA")]
    #[strum(ascii_case_insensitive, serialize = "TRA")]
    TranslocationBreakend
}

impl SvType {
    /// Returns true if base-level (overlapping bases) statistics are tracked for this type.
    /// Insertions and breakends do not span reference bases.
    pub fn has_base_level_stats(&self) -> bool {
        match self {
            SvType::Deletion |
            SvType::Duplication |
            SvType::Inversion |
            SvType::CopyNumberGain |
            SvType::CopyNumberLoss |
            SvType::CopyNumberReference |
            SvType::TandemRepeat => true,

            SvType::Insertion |
            SvType::IntraChromosomeBreakend |
            SvType::TranslocationBreakend => false
        }
    }

    /// Types that record an overlap window ("wow") on their annotations
    pub fn has_overlap_window(&self) -> bool {
        self.has_base_level_stats()
    }

    /// Returns true for both breakend flavors
    pub fn is_breakend(&self) -> bool {
        matches!(self, SvType::IntraChromosomeBreakend | SvType::TranslocationBreakend)
    }

    /// Returns true if the per-sample copy number is part of the allele
    pub fn is_copy_number(&self) -> bool {
        matches!(self, SvType::CopyNumberGain | SvType::CopyNumberLoss | SvType::CopyNumberReference)
    }

    /// Returns true if the inserted sequence is part of the allele and can be compared
    pub fn is_sequence_comparable(&self) -> bool {
        matches!(self, SvType::Insertion | SvType::IntraChromosomeBreakend | SvType::TranslocationBreakend)
    }

    /// Returns true if the variant has a distinct second breakpoint; otherwise the end collapses onto the position
    pub fn has_end_breakpoint(&self) -> bool {
        !matches!(self, SvType::Insertion)
    }

    /// Returns true if the percent-distance setting can scale the breakpoint tolerance for this type
    pub fn uses_percent_distance(&self) -> bool {
        !matches!(self, SvType::Insertion) && !self.is_breakend()
    }

    /// Types that may satisfy this type when cross-type matching is enabled
    pub fn cross_type_partners(&self) -> &'static [SvType] {
        match self {
            SvType::Deletion => &[SvType::CopyNumberLoss],
            SvType::CopyNumberLoss => &[SvType::Deletion],
            SvType::Duplication => &[SvType::CopyNumberGain],
            SvType::CopyNumberGain => &[SvType::Duplication],
            _ => &[]
        }
    }

    /// Types whose records can end up annotating each other share a family, and each family is scored independently.
    /// Returns a representative type for the family.
    /// # Arguments
    /// * `cross_type` - if true, cross-type pairings (including tandem repeat reconstruction) merge families
    pub fn family(&self, cross_type: bool) -> SvType {
        if !cross_type {
            return *self;
        }
        match self {
            SvType::Deletion |
            SvType::CopyNumberLoss |
            SvType::Insertion |
            SvType::TandemRepeat => SvType::Deletion,

            SvType::Duplication |
            SvType::CopyNumberGain => SvType::Duplication,

            other => *other
        }
    }
}
