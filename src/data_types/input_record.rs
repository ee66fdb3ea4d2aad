
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::data_types::sample::GenotypeError;
use crate::data_types::sv_type::SvType;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum VariantError {
    #[error("record {id:?}: position must be >= 1")]
    ZeroPosition { id: String },
    #[error("record {id:?}: could not determine a variant type from ALT={alt:?}, SVTYPE={svtype:?}")]
    UnknownType { id: String, alt: String, svtype: Option<String> },
    #[error("record {id:?}: {sv_type} requires END, SVLEN, or a literal REF allele to define its span")]
    MissingSpan { id: String, sv_type: SvType },
    #[error("record {id:?}: END ({end}) is before POS ({position})")]
    InvalidSpan { id: String, position: u64, end: u64 },
    #[error("record {id:?}: copy number variants require a CN value")]
    MissingCopyNumber { id: String },
    #[error("record {id:?}: inserted sequence of ALT {alt:?} after REF {ref_allele:?} is not a nucleotide string")]
    InvalidAllele { id: String, ref_allele: String, alt: String },
    #[error("breakend ALT {alt:?} is invalid: {reason}")]
    InvalidBreakend { alt: String, reason: String },
    #[error("record {id:?}: {source}")]
    Genotype { id: String, source: GenotypeError }
}

/// One parsed structural variant record, as supplied by an external reader.
/// Coordinates follow VCF conventions: `position` is 1-based and `end` is the INFO/END value.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(default, setter(into, strip_option))]
#[serde(default)]
pub struct InputRecord {
    /// Record identifier (ID column), used in reports and for breakend mate pairing
    pub id: String,
    /// Contig name (CHROM)
    #[serde(alias = "CHROM")]
    pub contig: String,
    /// 1-based position (POS)
    #[serde(alias = "POS")]
    pub position: u64,
    /// Reference allele (REF)
    #[serde(alias = "REF")]
    pub ref_allele: String,
    /// The single ALT allele; multi-allelic records are expected to be split upstream
    #[serde(alias = "ALT")]
    pub alt_allele: String,
    /// FILTER values; empty means PASS
    #[serde(alias = "FILTER")]
    pub filters: Vec<String>,
    /// INFO/END
    #[serde(alias = "END")]
    pub end: Option<u64>,
    /// INFO/SVLEN
    #[serde(alias = "SVLEN")]
    pub svlen: Option<i64>,
    /// INFO/SVTYPE
    #[serde(alias = "SVTYPE")]
    pub svtype: Option<String>,
    /// INFO/CIPOS
    #[serde(alias = "CIPOS")]
    pub cipos: Option<(i64, i64)>,
    /// INFO/CIEND
    #[serde(alias = "CIEND")]
    pub ciend: Option<(i64, i64)>,
    /// Repeat unit sequence (RUS)
    #[serde(alias = "RUS")]
    pub repeat_unit: Option<String>,
    /// Repeat unit length (RUL)
    #[serde(alias = "RUL")]
    pub repeat_unit_length: Option<u64>,
    /// Repeat unit count of the reference allele (REFRUC)
    #[serde(alias = "REFRUC")]
    pub reference_repeat_count: Option<f64>,
    /// Repeat unit count(s) of the ALT allele(s) (RUC)
    #[serde(alias = "RUC")]
    pub repeat_counts: Vec<f64>,
    /// Left flank of an incompletely assembled insertion (LEFT_SVINSSEQ)
    #[serde(alias = "LEFT_SVINSSEQ")]
    pub left_insertion_seq: Option<String>,
    /// Right flank of an incompletely assembled insertion (RIGHT_SVINSSEQ)
    #[serde(alias = "RIGHT_SVINSSEQ")]
    pub right_insertion_seq: Option<String>,
    /// INFO/MATEID for breakends
    #[serde(alias = "MATEID")]
    pub mate_id: Option<String>,
    /// Sample GT
    #[serde(alias = "GT")]
    pub genotype: Option<String>,
    /// Sample PS
    #[serde(alias = "PS")]
    pub phase_set: Option<u64>,
    /// Sample CN
    #[serde(alias = "CN")]
    pub copy_number: Option<u32>,
    /// Sample FT
    #[serde(alias = "FT")]
    pub sample_filters: Vec<String>
}

/// Reference ploidy used to split copy number calls into gain/loss/reference
pub const REFERENCE_PLOIDY: u32 = 2;

/// The mate location and any inserted bases described by a bracketed breakend ALT
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BreakendAlt {
    /// Contig of the mate
    pub mate_contig: String,
    /// 0-based position of the mate
    pub mate_position: u64,
    /// Bases between the reference base and the junction, uppercase
    pub inserted: Vec<u8>
}

impl InputRecord {
    /// Returns the inner name of a symbolic ALT, e.g. "DEL" for `<DEL:ME>`
    pub fn symbolic_name(&self) -> Option<&str> {
        let alt = self.alt_allele.trim();
        let inner = alt.strip_prefix('<')?.strip_suffix('>')?;
        inner.split(':').next()
    }

    /// Returns true if ALT is a bracketed breakend
    pub fn is_breakend_alt(&self) -> bool {
        self.alt_allele.contains(['[', ']'])
    }

    /// Returns true if the record carries tandem repeat annotations
    pub fn has_repeat_info(&self) -> bool {
        !self.repeat_counts.is_empty() && (self.repeat_unit.is_some() || self.repeat_unit_length.is_some())
    }

    /// Determines the variant type from SVTYPE, the ALT allele, repeat annotations, and CN.
    /// # Errors
    /// * if no type can be determined
    /// * if a CNV has no copy number
    /// * if a breakend ALT is malformed
    pub fn classify(&self) -> Result<SvType, VariantError> {
        let svtype = self.svtype.as_deref().map(|s| s.to_ascii_uppercase());
        let symbolic = self.symbolic_name().map(|s| s.to_ascii_uppercase());
        let label = svtype.as_deref().or(symbolic.as_deref());

        if matches!(label, Some("TR") | Some("VNTR") | Some("STR")) || self.has_repeat_info() {
            return Ok(SvType::TandemRepeat);
        }

        if matches!(label, Some("BND") | Some("TRA")) || self.is_breakend_alt() {
            let bnd = self.breakend_alt()?;
            return Ok(if bnd.mate_contig == self.contig {
                SvType::IntraChromosomeBreakend
            } else {
                SvType::TranslocationBreakend
            });
        }

        let sv_type = match label {
            Some("DEL") => SvType::Deletion,
            Some("DUP") => SvType::Duplication,
            Some("INS") => SvType::Insertion,
            Some("INV") => SvType::Inversion,
            Some("CNV") => {
                let cn = self.copy_number.ok_or_else(|| VariantError::MissingCopyNumber { id: self.id.clone() })?;
                match cn.cmp(&REFERENCE_PLOIDY) {
                    std::cmp::Ordering::Greater => SvType::CopyNumberGain,
                    std::cmp::Ordering::Less => SvType::CopyNumberLoss,
                    std::cmp::Ordering::Equal => SvType::CopyNumberReference
                }
            },
            _ if symbolic.is_none() && !self.alt_allele.is_empty() => {
                // literal alleles, decided by the length change
                match self.alt_allele.len().cmp(&self.ref_allele.len()) {
                    std::cmp::Ordering::Greater => SvType::Insertion,
                    std::cmp::Ordering::Less => SvType::Deletion,
                    std::cmp::Ordering::Equal => return Err(self.unknown_type())
                }
            },
            _ => return Err(self.unknown_type())
        };
        Ok(sv_type)
    }

    fn unknown_type(&self) -> VariantError {
        VariantError::UnknownType {
            id: self.id.clone(),
            alt: self.alt_allele.clone(),
            svtype: self.svtype.clone()
        }
    }

    /// Parses a bracketed breakend ALT such as `G]17:198982]` or `[13:123456[AGT`.
    /// # Errors
    /// * if the brackets, mate contig, or mate position are malformed
    pub fn breakend_alt(&self) -> Result<BreakendAlt, VariantError> {
        let alt = self.alt_allele.trim();
        let invalid = |reason: &str| VariantError::InvalidBreakend { alt: alt.to_string(), reason: reason.to_string() };

        let first_bracket_idx = alt.find(['[', ']'])
            .ok_or_else(|| invalid("missing '[' or ']'"))?;
        let bracket = &alt[first_bracket_idx..first_bracket_idx+1];
        let second_bracket_idx = alt[first_bracket_idx+1..].find(bracket)
            .map(|rel| rel + first_bracket_idx + 1)
            .ok_or_else(|| invalid("missing closing bracket"))?;

        let mate = &alt[first_bracket_idx+1..second_bracket_idx];
        let (mate_contig, mate_pos) = mate.rsplit_once(':')
            .ok_or_else(|| invalid("mate does not look like contig:pos"))?;
        let mate_pos_1based: u64 = mate_pos.parse()
            .map_err(|_e| invalid("mate position is not an integer"))?;
        if mate_pos_1based == 0 {
            return Err(invalid("mate position must be >= 1"));
        }

        // the reference base sits on the side away from the bracket
        let ref_len = self.ref_allele.len();
        let inserted: &str = if first_bracket_idx == 0 {
            let suffix = &alt[second_bracket_idx+1..];
            &suffix[..suffix.len().saturating_sub(ref_len)]
        } else {
            let prefix = &alt[..first_bracket_idx];
            &prefix[ref_len.min(prefix.len())..]
        };

        Ok(BreakendAlt {
            mate_contig: mate_contig.to_string(),
            mate_position: mate_pos_1based - 1,
            inserted: inserted.to_ascii_uppercase().into_bytes()
        })
    }
}
