
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AlignmentError {
    #[error("maximum edit distance ({max_edit_distance}) exceeded")]
    MaxEditDistance { max_edit_distance: usize }
}

/// Edit distance between two sequences using a wavefront (WFA) search that gives up once `max_edit_distance` is exceeded.
/// Run time is O(n + d^2) for a final distance `d`, so bounding it keeps long dissimilar pairs cheap.
/// Conceptually the baseline runs down the rows of the DP grid and `other` runs across the columns.
/// # Arguments
/// * `baseline` - the first sequence
/// * `other` - the second sequence
/// * `max_edit_distance` - the largest distance worth computing
/// # Errors
/// * if the edit distance is larger than `max_edit_distance`
pub fn bounded_edit_distance(baseline: &[u8], other: &[u8], max_edit_distance: usize) -> Result<usize, AlignmentError> {
    let mut edit_distance: usize = 0;
    // index i is a diagonal, the value is the number of `other` bases consumed on it
    let mut wavefront: Vec<usize> = vec![0];
    loop {
        // slide every diagonal forward along exact matches
        for (i, other_offset) in wavefront.iter_mut().enumerate() {
            let Some(mut baseline_offset) = (*other_offset + edit_distance).checked_sub(i) else {
                continue;
            };
            while baseline_offset < baseline.len() && *other_offset < other.len() &&
                baseline[baseline_offset] == other[*other_offset] {
                baseline_offset += 1;
                *other_offset += 1;
            }
            if baseline_offset >= baseline.len() && *other_offset >= other.len() {
                return Ok(edit_distance);
            }
        }

        edit_distance += 1;
        if edit_distance > max_edit_distance {
            return Err(AlignmentError::MaxEditDistance { max_edit_distance });
        }

        // each diagonal spawns a baseline skip, a mismatch, and an `other` skip
        let mut next_wavefront = vec![0; wavefront.len() + 2];
        for (i, &other_offset) in wavefront.iter().enumerate() {
            next_wavefront[i] = next_wavefront[i].max(other_offset);
            next_wavefront[i+1] = next_wavefront[i+1].max(other_offset + 1);
            next_wavefront[i+2] = next_wavefront[i+2].max(other_offset + 1);
        }
        wavefront = next_wavefront;
    }
}
