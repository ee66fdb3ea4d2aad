
use serde::{Deserialize, Serialize};

/// A single called allele in a genotype
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Allele {
    /// Indicates an unknown allele, usually '.' in a file
    Missing,
    /// The reference allele, 0 in a file
    Reference,
    /// An alternate allele, with the 1-based ALT index from the file
    Alternate(usize)
}

impl Allele {
    /// Converts into a basic count representation. Useful for counting ALT alleles in a batch.
    pub fn to_allele_count(&self) -> usize {
        match self {
            Allele::Missing |
            Allele::Reference => 0,
            Allele::Alternate(_) => 1,
        }
    }

    /// Collapses the ALT index; records are compared one ALT at a time, so any ALT is the same allele class
    fn class(&self) -> u8 {
        match self {
            Allele::Missing => 0,
            Allele::Reference => 1,
            Allele::Alternate(_) => 2
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum GenotypeError {
    #[error("genotype is empty")]
    Empty,
    #[error("unparseable allele {allele:?} in genotype {genotype:?}")]
    BadAllele { allele: String, genotype: String },
    #[error("genotype {genotype:?} mixes phased and unphased delimiters")]
    MixedDelimiters { genotype: String }
}

/// Genotype of one sample at one record
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Genotype {
    /// Called alleles in file order
    alleles: Vec<Allele>,
    /// True if the alleles were joined by '|'
    phased: bool,
    /// Optional phase set identifier (PS)
    phase_set: Option<u64>
}

impl Genotype {
    /// Constructor
    pub fn new(alleles: Vec<Allele>, phased: bool, phase_set: Option<u64>) -> Self {
        Self { alleles, phased, phase_set }
    }

    /// Parses a VCF-style GT string such as `0/1`, `1|0`, `./.`, or `1`.
    /// # Arguments
    /// * `gt` - the GT value
    /// * `phase_set` - the PS value for the sample, if any
    /// # Errors
    /// * if the string is empty, mixes delimiters, or contains a non-numeric allele
    pub fn parse(gt: &str, phase_set: Option<u64>) -> Result<Self, GenotypeError> {
        let gt = gt.trim();
        if gt.is_empty() {
            return Err(GenotypeError::Empty);
        }

        let has_phased = gt.contains('|');
        let has_unphased = gt.contains('/');
        if has_phased && has_unphased {
            return Err(GenotypeError::MixedDelimiters { genotype: gt.to_string() });
        }

        let alleles = gt.split(['|', '/'])
            .map(|a| match a {
                "." => Ok(Allele::Missing),
                "0" => Ok(Allele::Reference),
                other => match other.parse::<usize>() {
                    Ok(index) if index > 0 => Ok(Allele::Alternate(index)),
                    _ => Err(GenotypeError::BadAllele { allele: other.to_string(), genotype: gt.to_string() })
                }
            })
            .collect::<Result<Vec<Allele>, GenotypeError>>()?;

        Ok(Self {
            alleles,
            phased: has_phased,
            phase_set
        })
    }

    // getters
    pub fn alleles(&self) -> &[Allele] {
        &self.alleles
    }

    pub fn is_phased(&self) -> bool {
        self.phased
    }

    pub fn phase_set(&self) -> Option<u64> {
        self.phase_set
    }

    pub fn ploidy(&self) -> usize {
        self.alleles.len()
    }

    /// Number of called alternate alleles
    pub fn non_reference_count(&self) -> usize {
        self.alleles.iter()
            .map(|a| a.to_allele_count())
            .sum()
    }

    /// Returns true if at least one allele is ALT and at least one is REF
    pub fn is_heterozygous(&self) -> bool {
        self.alleles.contains(&Allele::Reference) &&
            self.alleles.iter().any(|a| matches!(a, Allele::Alternate(_)))
    }

    /// Genotype equality ignoring allele order, phasing, and ALT index
    pub fn matches(&self, other: &Genotype) -> bool {
        let mut c1: Vec<u8> = self.alleles.iter().map(|a| a.class()).collect();
        let mut c2: Vec<u8> = other.alleles.iter().map(|a| a.class()).collect();
        c1.sort_unstable();
        c2.sort_unstable();
        c1 == c2
    }
}

impl std::fmt::Display for Genotype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let delim = if self.phased { "|" } else { "/" };
        let values: Vec<String> = self.alleles.iter()
            .map(|a| match a {
                Allele::Missing => ".".to_string(),
                Allele::Reference => "0".to_string(),
                Allele::Alternate(i) => i.to_string()
            })
            .collect();
        write!(f, "{}", values.join(delim))
    }
}

/// Per-sample information carried by a record.
/// This is a closed set, so consumers ask for capabilities instead of checking kinds.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum SampleSummary {
    /// No sample columns, or nothing usable in them
    #[default]
    Plain,
    /// A GT value
    Genotyped(Genotype),
    /// A CN value without a GT
    CopyNumber(u32),
    /// Both GT and CN
    GenotypedCopyNumber { genotype: Genotype, copy_number: u32 }
}

impl SampleSummary {
    /// Builds the matching variant from optional parts
    pub fn from_parts(genotype: Option<Genotype>, copy_number: Option<u32>) -> Self {
        match (genotype, copy_number) {
            (None, None) => SampleSummary::Plain,
            (Some(genotype), None) => SampleSummary::Genotyped(genotype),
            (None, Some(copy_number)) => SampleSummary::CopyNumber(copy_number),
            (Some(genotype), Some(copy_number)) => SampleSummary::GenotypedCopyNumber { genotype, copy_number }
        }
    }

    /// The genotype, if this sample has one
    pub fn genotype(&self) -> Option<&Genotype> {
        match self {
            SampleSummary::Genotyped(genotype) |
            SampleSummary::GenotypedCopyNumber { genotype, .. } => Some(genotype),
            SampleSummary::Plain |
            SampleSummary::CopyNumber(_) => None
        }
    }

    /// The copy number, if this sample has one
    pub fn copy_number(&self) -> Option<u32> {
        match self {
            SampleSummary::CopyNumber(cn) |
            SampleSummary::GenotypedCopyNumber { copy_number: cn, .. } => Some(*cn),
            SampleSummary::Plain |
            SampleSummary::Genotyped(_) => None
        }
    }

    /// Number of alleles that count against the match limit when no explicit limit is configured.
    /// This is the number of non-missing ALT alleles, with a minimum of 1.
    pub fn allele_match_limit(&self) -> usize {
        self.genotype()
            .map(|gt| gt.non_reference_count())
            .unwrap_or(1)
            .max(1)
    }
}
