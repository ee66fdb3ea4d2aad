
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// A single size bin, defined by its inclusive lower bound
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BinFloor {
    /// Smallest length that lands in this bin
    pub floor: u64,
    /// If true, variants in this bin are excluded from reporting
    #[serde(default)]
    pub skip: bool
}

impl BinFloor {
    pub fn new(floor: u64, skip: bool) -> Self {
        Self { floor, skip }
    }
}

/// Ascending list of bin floors for one variant type
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(try_from = "Vec<BinFloor>", into = "Vec<BinFloor>")]
pub struct Bins {
    floors: Vec<BinFloor>
}

impl Default for Bins {
    fn default() -> Self {
        Self {
            floors: [1, 1000, 10000].into_iter()
                .map(|f| BinFloor::new(f, false))
                .collect()
        }
    }
}

impl TryFrom<Vec<BinFloor>> for Bins {
    type Error = ConfigError;

    fn try_from(floors: Vec<BinFloor>) -> Result<Self, Self::Error> {
        Bins::new(floors)
    }
}

impl From<Bins> for Vec<BinFloor> {
    fn from(bins: Bins) -> Self {
        bins.floors
    }
}

impl Bins {
    /// Constructor
    /// # Errors
    /// * if no floors are provided
    /// * if floors are not strictly ascending
    pub fn new(floors: Vec<BinFloor>) -> Result<Self, ConfigError> {
        if floors.is_empty() {
            return Err(ConfigError::EmptyBins);
        }
        for pair in floors.windows(2) {
            if pair[0].floor >= pair[1].floor {
                return Err(ConfigError::UnsortedBins { previous: pair[0].floor, floor: pair[1].floor });
            }
        }
        Ok(Self { floors })
    }

    /// Convenience constructor for a list of floors with no skipped bins
    /// # Errors
    /// * see `new(...)`
    pub fn from_floors(floors: &[u64]) -> Result<Self, ConfigError> {
        Self::new(floors.iter().map(|&f| BinFloor::new(f, false)).collect())
    }

    /// Returns the floor of the bin containing `length`.
    /// Variants with no length land in the first bin; lengths below the first floor are not binned.
    /// # Arguments
    /// * `length` - the variant length, if known
    pub fn classify(&self, length: Option<u64>) -> Option<u64> {
        let Some(length) = length else {
            return self.floors.first().map(|b| b.floor);
        };
        self.floors.iter()
            .take_while(|b| b.floor <= length)
            .last()
            .map(|b| b.floor)
    }

    /// Returns true if the bin with this floor is excluded from reporting
    pub fn is_skipped(&self, floor: u64) -> bool {
        self.floors.iter()
            .any(|b| b.floor == floor && b.skip)
    }

    /// All floors that are reported, ascending
    pub fn reported_floors(&self) -> impl Iterator<Item=u64> + '_ {
        self.floors.iter()
            .filter(|b| !b.skip)
            .map(|b| b.floor)
    }

    /// Human readable label for a bin, e.g. `[100,1000)` or `[10000+)`
    pub fn label(&self, floor: u64) -> String {
        let next = self.floors.iter()
            .map(|b| b.floor)
            .find(|&f| f > floor);
        match next {
            Some(ceiling) => format!("[{floor},{ceiling})"),
            None => format!("[{floor}+)")
        }
    }

    pub fn floors(&self) -> &[BinFloor] {
        &self.floors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let bins = Bins::from_floors(&[50, 1000, 10000]).unwrap();
        assert_eq!(bins.classify(Some(49)), None);
        assert_eq!(bins.classify(Some(50)), Some(50));
        assert_eq!(bins.classify(Some(999)), Some(50));
        assert_eq!(bins.classify(Some(1000)), Some(1000));
        assert_eq!(bins.classify(Some(5_000_000)), Some(10000));
        assert_eq!(bins.classify(None), Some(50));
    }

    #[test]
    fn test_skip_and_labels() {
        let bins = Bins::new(vec![
            BinFloor::new(1, false), BinFloor::new(100000, true), BinFloor::new(200000, false)
        ]).unwrap();
        assert!(bins.is_skipped(100000));
        assert!(!bins.is_skipped(1));
        assert_eq!(bins.reported_floors().collect::<Vec<u64>>(), vec![1, 200000]);
        assert_eq!(bins.label(1), "[1,100000)");
        assert_eq!(bins.label(200000), "[200000+)");
    }

    #[test]
    fn test_invalid() {
        assert_eq!(Bins::new(vec![]), Err(ConfigError::EmptyBins));
        assert_eq!(Bins::from_floors(&[10, 10]), Err(ConfigError::UnsortedBins { previous: 10, floor: 10 }));
        let parsed: Result<Bins, _> = serde_json::from_str("[{\"floor\": 5}, {\"floor\": 1}]");
        assert!(parsed.is_err());
    }
}
