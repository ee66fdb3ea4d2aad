
use serde::Serialize;
use strum::IntoEnumIterator;

/// The individual classifications a candidate pair can achieve.
/// Declaration order is the quality order, most important first.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum_macros::EnumIter, strum_macros::IntoStaticStr)]
pub enum MatchFlag {
    /// Allele compatible per the type rules (implies the boundaries were compatible)
    AlleleMatch=0,
    /// Genotypes agree
    Genotype,
    /// Boundaries are compatible
    LocalMatch,
    /// Lengths are compatible
    Length,
    /// Inserted sequences are similar
    Sequence,
    /// Inserted sequences are similar on the available flank(s)
    PartialSequence
}

impl MatchFlag {
    fn bit(&self) -> u8 {
        // most important flag gets the highest bit so numeric order is quality order
        1 << (5 - *self as u8)
    }
}

/// Union of the flags achieved by a candidate pair; the empty set is "Unmatched".
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct MatchSet(u8);

impl MatchSet {
    /// No flags achieved
    pub const UNMATCHED: MatchSet = MatchSet(0);

    /// Builds a set from a list of flags
    pub fn from_flags(flags: &[MatchFlag]) -> Self {
        let mut ret = Self::UNMATCHED;
        for &flag in flags.iter() {
            ret.insert(flag);
        }
        ret
    }

    /// Allele match with agreeing genotypes
    pub fn allele_and_genotype() -> Self {
        Self::from_flags(&[MatchFlag::AlleleMatch, MatchFlag::Genotype])
    }

    pub fn insert(&mut self, flag: MatchFlag) {
        self.0 |= flag.bit();
    }

    pub fn remove(&mut self, flag: MatchFlag) {
        self.0 &= !flag.bit();
    }

    pub fn contains(&self, flag: MatchFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    /// Returns true if every flag in `required` is also in this set
    pub fn satisfies(&self, required: MatchSet) -> bool {
        self.0 & required.0 == required.0
    }

    pub fn is_unmatched(&self) -> bool {
        self.0 == 0
    }

    /// Iterates over the flags present, most important first
    pub fn flags(&self) -> impl Iterator<Item=MatchFlag> + '_ {
        MatchFlag::iter().filter(|f| self.contains(*f))
    }

    /// Compares by match quality, where a greater value is the better match
    pub fn quality_cmp(&self, other: &MatchSet) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl std::fmt::Display for MatchSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_unmatched() {
            write!(f, "Unmatched")
        } else {
            let names: Vec<&'static str> = self.flags().map(<&'static str>::from).collect();
            write!(f, "{}", names.join("|"))
        }
    }
}

impl std::fmt::Debug for MatchSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MatchSet({self})")
    }
}

impl Serialize for MatchSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
