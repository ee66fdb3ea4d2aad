
use coitrees::{COITree, Interval as CoiInterval, IntervalTree};
use rustc_hash::FxHashMap as HashMap;

use crate::data_types::annotation::VariantId;
use crate::data_types::interval::Interval;
use crate::data_types::scored_variant::ScoredVariant;
use crate::data_types::sv_type::SvType;
use crate::interval_store::GenomeIntervalStore;

#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    #[error("{contig}:{position} is beyond the supported index coordinate range")]
    CoordinateOverflow { contig: String, position: u64 }
}

/// Lookup of candidate variants by type and location.
/// Implementations must be read-only after construction so they can be shared across threads.
pub trait GenomeIndex: Sync {
    /// Returns every indexed variant of `sv_type` on `contig` whose search interval overlaps `interval`
    /// # Arguments
    /// * `sv_type` - the type to search
    /// * `contig` - the contig to search
    /// * `interval` - the query interval
    fn search(&self, sv_type: SvType, contig: &str, interval: &Interval) -> Vec<VariantId>;
}

/// GenomeIndex backed by one COITree per (type, contig)
#[derive(Default)]
pub struct CoitreeGenomeIndex {
    /// Lookup from (type, contig) to a COITree of 0-based inclusive ranges, metadata is the arena index
    trees: HashMap<(SvType, String), COITree<usize, u32>>
}

impl std::fmt::Debug for CoitreeGenomeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // COITree does not have Debug, so report sizes instead
        let counts: Vec<(String, String, usize)> = self.trees.iter()
            .map(|((sv_type, contig), tree)| (sv_type.to_string(), contig.clone(), tree.len()))
            .collect();
        f.debug_struct("CoitreeGenomeIndex").field("tree_sizes", &counts).finish()
    }
}

impl CoitreeGenomeIndex {
    /// Indexes every variant by its search interval.
    /// # Arguments
    /// * `variants` - the variants to index, typically all eligible truth records of a partition
    /// # Errors
    /// * if a coordinate cannot be represented in the tree
    pub fn new<'a>(variants: impl IntoIterator<Item=&'a ScoredVariant>) -> Result<Self, IndexError> {
        let mut grouped: HashMap<(SvType, String), Vec<CoiInterval<usize>>> = Default::default();
        for variant in variants.into_iter() {
            let Some((first, last)) = variant.search_interval().integer_bounds() else {
                continue;
            };
            let to_i32 = |position: u64| i32::try_from(position)
                .map_err(|_e| IndexError::CoordinateOverflow { contig: variant.contig().to_string(), position });
            let first = to_i32(first)?;
            // expanded upper bounds may run off the representable range, clamp those
            let last = i32::try_from(last).unwrap_or(i32::MAX);
            grouped.entry((variant.sv_type(), variant.contig().to_string()))
                .or_default()
                .push(CoiInterval::new(first, last, variant.id().0));
        }

        let trees = grouped.into_iter()
            .map(|(key, intervals)| (key, COITree::new(&intervals)))
            .collect();
        Ok(Self { trees })
    }

    /// Total number of indexed variants
    pub fn len(&self) -> usize {
        self.trees.values().map(|t| t.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GenomeIndex for CoitreeGenomeIndex {
    fn search(&self, sv_type: SvType, contig: &str, interval: &Interval) -> Vec<VariantId> {
        let Some((first, last)) = interval.integer_bounds() else {
            return vec![];
        };
        let Ok(first) = i32::try_from(first) else {
            return vec![];
        };
        let last = i32::try_from(last).unwrap_or(i32::MAX);

        let mut ret = vec![];
        if let Some(tree) = self.trees.get(&(sv_type, contig.to_string())) {
            tree.query(first, last, |node| {
                let index: usize = node.metadata.clone();
                ret.push(VariantId(index));
            });
        }
        // tree traversal order is not positional, keep results deterministic
        ret.sort_unstable();
        ret
    }
}

/// Regions that records must be fully inside to be assessed (e.g. a high-confidence BED)
#[derive(Clone, Debug, Default)]
pub struct RegionIndex {
    regions: GenomeIntervalStore
}

impl RegionIndex {
    /// Adds a region, merging with any that it touches
    pub fn insert(&mut self, contig: &str, interval: Interval) {
        self.regions.insert(contig, interval);
    }

    /// Returns true if a single merged region covers all of `interval`
    pub fn contains(&self, contig: &str, interval: &Interval) -> bool {
        self.regions.contig_store(contig)
            .map(|store| store.contains(interval))
            .unwrap_or(false)
    }

    /// Returns the parts of `interval` that fall inside the regions, ascending
    pub fn clip(&self, contig: &str, interval: &Interval) -> Vec<Interval> {
        match self.regions.contig_store(contig) {
            Some(store) => store.search(interval).iter()
                .filter_map(|region| region.intersect(interval))
                .collect(),
            None => vec![]
        }
    }

    /// Total number of bases covered by the regions
    pub fn total_length(&self) -> u64 {
        self.regions.total_length()
    }
}
