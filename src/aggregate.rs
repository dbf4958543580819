// Grouping, ranking and statistical primitives.
//
// Every function here is a pure pass over the item slice: no shared state,
// deterministic output. Groups are kept in first-seen key order so that
// stable sorts break value ties the same way on every run.
use crate::util::average;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

/// Group items by key and sum the extracted value per group.
///
/// A `None` key excludes the item; an absent value counts as zero within its
/// group's sum. Groups come back in first-seen order.
pub fn sum_by_key<T, K, KF, VF>(items: &[T], key_of: KF, value_of: VF) -> Vec<(K, f64)>
where
    K: Eq + Hash + Clone,
    KF: Fn(&T) -> Option<K>,
    VF: Fn(&T) -> Option<f64>,
{
    let mut groups: Vec<(K, f64)> = Vec::new();
    let mut index: HashMap<K, usize> = HashMap::new();
    for item in items {
        let Some(key) = key_of(item) else { continue };
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key.clone(), 0.0));
            groups.len() - 1
        });
        groups[slot].1 += value_of(item).unwrap_or(0.0);
    }
    groups
}

/// Group items by key and average the extracted value per group, ignoring
/// absent values (the divisor is the count of present values). A group whose
/// values are all absent averages to zero.
pub fn mean_by_key<T, K, KF, VF>(items: &[T], key_of: KF, value_of: VF) -> Vec<(K, f64)>
where
    K: Eq + Hash + Clone,
    KF: Fn(&T) -> Option<K>,
    VF: Fn(&T) -> Option<f64>,
{
    let mut groups: Vec<(K, Vec<f64>)> = Vec::new();
    let mut index: HashMap<K, usize> = HashMap::new();
    for item in items {
        let Some(key) = key_of(item) else { continue };
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key.clone(), Vec::new()));
            groups.len() - 1
        });
        if let Some(v) = value_of(item) {
            groups[slot].1.push(v);
        }
    }
    groups
        .into_iter()
        .map(|(key, values)| (key, average(&values)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Sort grouped sums by value. The sort is stable, so equal values keep the
/// groups' first-seen order. `limit` truncates to the top N afterwards.
pub fn rank_by_value<K>(
    mut groups: Vec<(K, f64)>,
    direction: Direction,
    limit: Option<usize>,
) -> Vec<(K, f64)> {
    groups.sort_by(|a, b| {
        let ord = a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal);
        match direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    });
    if let Some(n) = limit {
        groups.truncate(n);
    }
    groups
}

/// Sum items into time buckets and return them sorted ascending by bucket
/// key, one point per observed bucket.
pub fn time_series<T, KF, VF>(items: &[T], key_of: KF, value_of: VF) -> Vec<(String, f64)>
where
    KF: Fn(&T) -> Option<String>,
    VF: Fn(&T) -> Option<f64>,
{
    let mut series = sum_by_key(items, key_of, value_of);
    series.sort_by(|a, b| a.0.cmp(&b.0));
    series
}

/// Sums of a value split by a tri-state flag. Items with an unknown flag are
/// excluded from both branches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitSums {
    pub flagged: f64,
    pub unflagged: f64,
}

pub fn split_sums<T, FF, VF>(items: &[T], flag_of: FF, value_of: VF) -> SplitSums
where
    FF: Fn(&T) -> Option<bool>,
    VF: Fn(&T) -> Option<f64>,
{
    let mut out = SplitSums {
        flagged: 0.0,
        unflagged: 0.0,
    };
    for item in items {
        let Some(flag) = flag_of(item) else { continue };
        let value = value_of(item).unwrap_or(0.0);
        if flag {
            out.flagged += value;
        } else {
            out.unflagged += value;
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct Histogram {
    /// Lower edge of each bin.
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
    pub mean: f64,
    /// Upper median: element at index len/2 of the sorted values.
    pub median: f64,
}

/// Equal-width histogram over [min, max] of the values.
///
/// The maximum lands exactly on the far edge and is clamped into the last
/// bin; interior values sitting on a bin boundary go to the upper bin by
/// floor division. A zero-width range degrades to a unit step. Returns
/// `None` for an empty value set.
pub fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
    if values.is_empty() || bins == 0 {
        return None;
    }
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for v in values {
        min = min.min(*v);
        max = max.max(*v);
    }
    let mut step = (max - min) / bins as f64;
    if step == 0.0 {
        step = 1.0;
    }
    let edges: Vec<f64> = (0..bins).map(|i| min + i as f64 * step).collect();
    let mut counts = vec![0u64; bins];
    for v in values {
        let idx = (((v - min) / step).floor() as i64).clamp(0, bins as i64 - 1);
        counts[idx as usize] += 1;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let median = sorted[sorted.len() / 2];
    Some(Histogram {
        edges,
        counts,
        mean,
        median,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // (key, value) fixtures standing in for records.
    fn fixture() -> Vec<(Option<&'static str>, Option<f64>)> {
        vec![
            (Some("norte"), Some(10.0)),
            (Some("sur"), Some(5.0)),
            (Some("norte"), None),
            (Some("centro"), Some(7.5)),
            (None, Some(99.0)),
            (Some("sur"), Some(2.5)),
        ]
    }

    #[test]
    fn grouped_sums_match_manual_reduction() {
        let items = fixture();
        let sums = sum_by_key(&items, |i| i.0, |i| i.1);
        for (key, total) in &sums {
            let manual: f64 = items
                .iter()
                .filter(|i| i.0 == Some(*key))
                .map(|i| i.1.unwrap_or(0.0))
                .sum();
            assert_eq!(*total, manual);
        }
        // First-seen order, excluded keyless item, absent-as-zero.
        assert_eq!(
            sums,
            vec![("norte", 10.0), ("sur", 7.5), ("centro", 7.5)]
        );
    }

    #[test]
    fn ranking_is_stable_on_ties() {
        let items = fixture();
        let sums = sum_by_key(&items, |i| i.0, |i| i.1);
        // "sur" and "centro" tie at 7.5; "sur" was seen first.
        let desc = rank_by_value(sums.clone(), Direction::Descending, None);
        assert_eq!(desc, vec![("norte", 10.0), ("sur", 7.5), ("centro", 7.5)]);
        let asc = rank_by_value(sums, Direction::Ascending, Some(2));
        assert_eq!(asc, vec![("sur", 7.5), ("centro", 7.5)]);
    }

    #[test]
    fn mean_ignores_absent_values() {
        let items = vec![
            (Some("a"), Some(4.0)),
            (Some("a"), None),
            (Some("a"), Some(8.0)),
            (Some("b"), None),
        ];
        let means = mean_by_key(&items, |i| i.0, |i| i.1);
        // Divisor is the count of present values; an all-absent group is 0.
        assert_eq!(means, vec![("a", 6.0), ("b", 0.0)]);
    }

    #[test]
    fn time_series_sorts_by_bucket_key() {
        let items = vec![
            (Some("2024-02"), Some(3.0)),
            (Some("2024-01"), Some(1.0)),
            (Some("2024-02"), Some(2.0)),
        ];
        let series = time_series(&items, |i| i.0.map(str::to_string), |i| i.1);
        assert_eq!(
            series,
            vec![("2024-01".to_string(), 1.0), ("2024-02".to_string(), 5.0)]
        );
    }

    #[test]
    fn split_sums_exclude_unknown_flags() {
        let items = vec![
            (Some(true), Some(100.0)),
            (Some(false), Some(50.0)),
            (None, Some(999.0)),
            (Some(true), Some(200.0)),
        ];
        let split = split_sums(&items, |i| i.0, |i| i.1);
        assert_eq!(split.flagged, 300.0);
        assert_eq!(split.unflagged, 50.0);
    }

    #[test]
    fn histogram_counts_are_conserved_for_any_bin_count() {
        let values: Vec<f64> = (0..37).map(|i| i as f64 * 1.7).collect();
        for bins in [1, 2, 7, 30] {
            let h = histogram(&values, bins).unwrap();
            assert_eq!(h.counts.len(), bins);
            assert_eq!(h.counts.iter().sum::<u64>(), values.len() as u64);
        }
    }

    #[test]
    fn histogram_clamps_the_maximum_into_the_last_bin() {
        let values = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let h = histogram(&values, 10).unwrap();
        // 10.0 sits on the far edge; without clamping it would overflow.
        assert_eq!(h.counts[9], 2);
        assert_eq!(h.counts.iter().sum::<u64>(), 11);
    }

    #[test]
    fn histogram_degrades_on_zero_width_range() {
        let h = histogram(&[5.0, 5.0, 5.0], 4).unwrap();
        assert_eq!(h.counts, vec![3, 0, 0, 0]);
        assert_eq!(h.mean, 5.0);
        assert_eq!(h.median, 5.0);
    }

    #[test]
    fn histogram_median_is_the_upper_element() {
        let h = histogram(&[1.0, 4.0, 2.0, 3.0], 2).unwrap();
        assert_eq!(h.median, 3.0);
        assert_eq!(h.mean, 2.5);
    }

    #[test]
    fn histogram_is_unavailable_for_empty_input() {
        assert!(histogram(&[], 30).is_none());
    }
}
