
use serde::Serialize;
use std::ops::AddAssign;

use crate::data_types::decision::{Decision, VariantSource};

/// True/false counts for truth and query, used for both event and base level statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SummaryMetrics {
    /// Number of truth entries found in the query
    pub truth_tp: u64,
    /// Number of truth entries missing in the query
    pub truth_fn: u64,
    /// Number of query entries that match truth
    pub query_tp: u64,
    /// Number of query entries that are not in truth
    pub query_fp: u64,
}

impl AddAssign for SummaryMetrics {
    // Enables += with stats
    fn add_assign(&mut self, rhs: Self) {
        self.truth_tp += rhs.truth_tp;
        self.truth_fn += rhs.truth_fn;
        self.query_tp += rhs.query_tp;
        self.query_fp += rhs.query_fp;
    }
}

impl SummaryMetrics {
    /// Constructor
    pub fn new(truth_tp: u64, truth_fn: u64, query_tp: u64, query_fp: u64) -> Self {
        Self {
            truth_tp, truth_fn, query_tp, query_fp
        }
    }

    /// Adds `count` to the true or false tally of the given source.
    /// Not-assessed decisions are ignored.
    pub fn add_decision(&mut self, source: VariantSource, decision: Decision, count: u64) {
        match (source, decision) {
            (VariantSource::Truth, Decision::TruePositive) => self.truth_tp += count,
            (VariantSource::Query, Decision::TruePositive) => self.query_tp += count,
            (_, Decision::FalseNegative) => self.truth_fn += count,
            (_, Decision::FalsePositive) => self.query_fp += count,
            (_, Decision::NotAssessed) => {}
        }
    }

    /// Sets the true and false tallies of one source
    pub fn set_source(&mut self, source: VariantSource, true_count: u64, false_count: u64) {
        match source {
            VariantSource::Truth => {
                self.truth_tp = true_count;
                self.truth_fn = false_count;
            },
            VariantSource::Query => {
                self.query_tp = true_count;
                self.query_fp = false_count;
            }
        }
    }

    /// Number of truth entries assessed
    pub fn truth_total(&self) -> u64 {
        self.truth_tp + self.truth_fn
    }

    /// Number of query entries assessed
    pub fn query_total(&self) -> u64 {
        self.query_tp + self.query_fp
    }

    /// Calculates recall if it can, which is relative to truth
    pub fn recall(&self) -> Option<f64> {
        let denom = self.truth_total();
        if denom > 0 {
            Some(self.truth_tp as f64 / denom as f64)
        } else {
            None
        }
    }

    /// Calculates precision if it can, which is relative to query
    pub fn precision(&self) -> Option<f64> {
        let denom = self.query_total();
        if denom > 0 {
            Some(self.query_tp as f64 / denom as f64)
        } else {
            None
        }
    }

    /// Calculates F1 score if possible
    pub fn f1(&self) -> Option<f64> {
        if let (Some(recall), Some(precision)) = (self.recall(), self.precision()) {
            if recall + precision > 0.0 {
                Some(2.0 * recall * precision / (recall + precision))
            } else {
                Some(0.0)
            }
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    #[test]
    fn test_scores() {
        // 3 of 4 truth events found, 3 of 6 query events real
        let summary = SummaryMetrics::new(3, 1, 3, 3);
        assert_approx_eq!(summary.recall().unwrap(), 0.75);
        assert_approx_eq!(summary.precision().unwrap(), 0.5);
        assert_approx_eq!(summary.f1().unwrap(), 0.6);
        assert_eq!(SummaryMetrics::default().recall(), None);
        assert_eq!(SummaryMetrics::new(0, 3, 0, 3).f1(), Some(0.0));
    }

    #[test]
    fn test_add_assign() {
        let mut summary = SummaryMetrics::new(5, 0, 5, 1);
        summary += SummaryMetrics::new(2, 4, 1, 0);
        assert_eq!(summary, SummaryMetrics::new(7, 4, 6, 1));
    }

    #[test]
    fn test_add_decision() {
        let mut summary = SummaryMetrics::default();
        summary.add_decision(VariantSource::Truth, Decision::TruePositive, 1);
        summary.add_decision(VariantSource::Truth, Decision::FalseNegative, 2);
        summary.add_decision(VariantSource::Query, Decision::TruePositive, 3);
        summary.add_decision(VariantSource::Query, Decision::FalsePositive, 4);
        summary.add_decision(VariantSource::Query, Decision::NotAssessed, 5);
        assert_eq!(summary, SummaryMetrics::new(1, 2, 3, 4));

        summary.set_source(VariantSource::Truth, 100, 50);
        assert_eq!(summary, SummaryMetrics::new(100, 50, 3, 4));
    }
}
