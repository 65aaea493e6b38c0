//! Peak picking with a minimum distance between peaks.
//!
//! This is a simple heuristic, not a global optimum:
//!
//! 1. Find every local maximum. A run of equal values (plateau) counts as
//!    one peak at its midpoint, rounded down. The first and last samples
//!    are never peaks.
//! 2. Visit peaks from highest to lowest. Each kept peak removes every
//!    not-yet-removed peak closer than `distance` samples on either side.
//!
//! The surviving peak indices are returned in ascending order.

/// Local maxima of `x` (plateau midpoints), in ascending order.
pub fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }

    let last = x.len() - 1;
    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }

    peaks
}

/// Find peaks of `x` that are at least `distance` samples apart.
///
/// A `distance` of 0 behaves like 1 (no suppression).
pub fn find_peaks(x: &[f64], distance: usize) -> Vec<usize> {
    let peaks = local_maxima(x);
    let distance = distance.max(1);
    if distance == 1 || peaks.len() < 2 {
        return peaks;
    }

    // Stable sort, so among equal heights the later peak is visited first.
    let mut by_height: Vec<usize> = (0..peaks.len()).collect();
    by_height.sort_by(|&a, &b| x[peaks[a]].total_cmp(&x[peaks[b]]));

    let mut keep = vec![true; peaks.len()];
    for &j in by_height.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            k -= 1;
            keep[k] = false;
        }
        let mut k = j + 1;
        while k < peaks.len() && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .into_iter()
        .zip(keep)
        .filter_map(|(p, kept)| kept.then_some(p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_maxima() {
        let x = [0.0, 1.0, 0.0, 2.0, 0.0, 3.0, 1.0];
        assert_eq!(local_maxima(&x), vec![1, 3, 5]);
    }

    #[test]
    fn test_edges_are_not_peaks() {
        let x = [5.0, 1.0, 0.0, 1.0, 5.0];
        assert!(local_maxima(&x).is_empty());
    }

    #[test]
    fn test_plateau_midpoint() {
        let x = [0.0, 1.0, 1.0, 1.0, 1.0, 0.0];
        assert_eq!(local_maxima(&x), vec![2]);
        // A plateau running into the last sample is not a peak.
        let x = [0.0, 1.0, 1.0, 1.0];
        assert!(local_maxima(&x).is_empty());
    }

    #[test]
    fn test_distance_keeps_highest() {
        let x = [0.0, 1.0, 0.0, 3.0, 0.0, 2.0, 0.0, 0.5, 0.0, 0.0, 4.0, 0.0];
        // peaks at 1, 3, 5, 7, 10
        assert_eq!(find_peaks(&x, 1), vec![1, 3, 5, 7, 10]);
        // 3 removes 1 and 5, 10 removes 7 (distance 3 < 4)
        assert_eq!(find_peaks(&x, 4), vec![3, 10]);
        assert_eq!(find_peaks(&x, 0), find_peaks(&x, 1));
    }

    #[test]
    fn test_exact_distance_is_allowed() {
        let x = [0.0, 2.0, 0.0, 0.0, 1.0, 0.0];
        assert_eq!(find_peaks(&x, 3), vec![1, 4]);
        assert_eq!(find_peaks(&x, 4), vec![1]);
    }

    #[test]
    fn test_short_input() {
        assert!(find_peaks(&[], 5).is_empty());
        assert!(find_peaks(&[1.0, 2.0], 5).is_empty());
    }
}
