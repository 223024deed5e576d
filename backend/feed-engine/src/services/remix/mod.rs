use crate::error::{EngineError, Result};
use crate::models::{FeedItem, FeedSlice, RemixResult};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Feed Remixer: proportional merge of independently paginated feed pages.
///
/// Each slice contributes `round(limit × weight / totalWeight)` of its leading
/// items. Short slices are not topped up from other sources, so the result may
/// hold fewer than `limit` items. Duplicate URIs keep the copy from the first
/// slice in input order. The merged list is ordered newest first (stable) and
/// capped at `limit`.
pub fn remix_feeds(slices: &[FeedSlice], limit: usize) -> Result<RemixResult> {
    validate_slices(slices)?;

    let total_weight: u64 = slices.iter().map(|s| s.percent_weight as u64).sum();
    if slices.is_empty() || total_weight == 0 {
        return Ok(RemixResult::default());
    }

    let mut combined: Vec<FeedItem> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for slice in slices {
        let take = proportional_take(limit, slice.percent_weight, total_weight);
        let before = combined.len();

        for item in slice.items.iter().take(take) {
            if seen.insert(item.uri.as_str()) {
                combined.push(item.clone());
            }
        }

        debug!(
            source_key = %slice.source_key,
            percent_weight = slice.percent_weight,
            take = take,
            accepted = combined.len() - before,
            "Remix source sampled"
        );
    }

    // sort_by is stable: equal timestamps keep acceptance order
    combined.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    combined.truncate(limit);

    let next_cursors: BTreeMap<String, String> = slices
        .iter()
        .filter_map(|s| {
            s.next_cursor
                .as_ref()
                .map(|cursor| (s.source_key.clone(), cursor.clone()))
        })
        .collect();

    Ok(RemixResult {
        items: combined,
        next_cursors,
    })
}

/// Items one slice may contribute; computed per slice, never rebalanced.
pub fn proportional_take(limit: usize, weight: u32, total_weight: u64) -> usize {
    if total_weight == 0 {
        return 0;
    }
    ((limit as f64 * weight as f64) / total_weight as f64).round() as usize
}

fn validate_slices(slices: &[FeedSlice]) -> Result<()> {
    let mut keys: HashSet<&str> = HashSet::new();

    for slice in slices {
        if slice.percent_weight > 100 {
            return Err(EngineError::invalid(format!(
                "percentWeight for source '{}' must be within 0..=100, got {}",
                slice.source_key, slice.percent_weight
            )));
        }
        if !keys.insert(slice.source_key.as_str()) {
            return Err(EngineError::invalid(format!(
                "duplicate sourceKey '{}'",
                slice.source_key
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    fn items(prefix: &str, count: usize, newest: DateTime<Utc>) -> Vec<FeedItem> {
        (0..count)
            .map(|i| FeedItem {
                uri: format!("{prefix}{}", i + 1),
                created_at: newest - Duration::minutes(i as i64),
            })
            .collect()
    }

    fn slice(key: &str, weight: u32, items: Vec<FeedItem>, cursor: Option<&str>) -> FeedSlice {
        FeedSlice {
            source_key: key.to_string(),
            percent_weight: weight,
            items,
            next_cursor: cursor.map(str::to_string),
        }
    }

    #[test]
    fn test_single_source_takes_most_recent() {
        let now = Utc::now();
        let slices = vec![slice("x", 100, items("p", 5, now), Some("cursor-x"))];

        let result = remix_feeds(&slices, 3).unwrap();

        let uris: Vec<_> = result.items.iter().map(|i| i.uri.as_str()).collect();
        assert_eq!(uris, vec!["p1", "p2", "p3"]);
        assert_eq!(result.next_cursors.get("x").map(String::as_str), Some("cursor-x"));
    }

    #[test]
    fn test_even_split() {
        let now = Utc::now();
        let slices = vec![
            slice("a", 50, items("a", 10, now), None),
            slice("b", 50, items("b", 10, now - Duration::seconds(30)), None),
        ];

        let result = remix_feeds(&slices, 10).unwrap();

        let from_a = result.items.iter().filter(|i| i.uri.starts_with('a')).count();
        let from_b = result.items.iter().filter(|i| i.uri.starts_with('b')).count();
        assert_eq!(result.items.len(), 10);
        assert!(from_a.abs_diff(5) <= 1);
        assert!(from_b.abs_diff(5) <= 1);
    }

    #[test]
    fn test_duplicates_attributed_to_first_source() {
        let now = Utc::now();
        let shared = FeedItem {
            uri: "shared".to_string(),
            created_at: now,
        };
        let slices = vec![
            slice("first", 50, vec![shared.clone()], Some("c1")),
            slice("second", 50, vec![shared], Some("c2")),
        ];

        let result = remix_feeds(&slices, 4).unwrap();

        assert_eq!(result.items.len(), 1);
        assert_eq!(result.next_cursors.len(), 2);
    }

    #[test]
    fn test_short_slice_is_not_rebalanced() {
        let now = Utc::now();
        let slices = vec![
            slice("full", 50, items("f", 10, now), None),
            slice("empty", 50, Vec::new(), Some("more")),
        ];

        let result = remix_feeds(&slices, 10).unwrap();

        assert_eq!(result.items.len(), 5);
        assert_eq!(result.next_cursors.get("empty").map(String::as_str), Some("more"));
    }

    #[test]
    fn test_zero_weight_is_empty() {
        let now = Utc::now();
        let slices = vec![slice("x", 0, items("p", 5, now), Some("c"))];

        assert_eq!(remix_feeds(&slices, 5).unwrap(), RemixResult::default());
        assert_eq!(remix_feeds(&[], 5).unwrap(), RemixResult::default());
    }

    #[test]
    fn test_weights_need_not_sum_to_100() {
        let now = Utc::now();
        let slices = vec![
            slice("a", 30, items("a", 10, now), None),
            slice("b", 10, items("b", 10, now), None),
        ];

        // 8 × 30/40 = 6, 8 × 10/40 = 2
        let result = remix_feeds(&slices, 8).unwrap();
        let from_a = result.items.iter().filter(|i| i.uri.starts_with('a')).count();
        assert_eq!(result.items.len(), 8);
        assert_eq!(from_a, 6);
    }

    #[test]
    fn test_equal_timestamps_keep_acceptance_order() {
        let now = Utc::now();
        let same = |uri: &str| FeedItem {
            uri: uri.to_string(),
            created_at: now,
        };
        let slices = vec![
            slice("a", 50, vec![same("z"), same("y")], None),
            slice("b", 50, vec![same("x")], None),
        ];

        let result = remix_feeds(&slices, 4).unwrap();
        let uris: Vec<_> = result.items.iter().map(|i| i.uri.as_str()).collect();
        assert_eq!(uris, vec!["z", "y", "x"]);
    }

    #[test]
    fn test_rejects_out_of_range_weight() {
        let slices = vec![slice("x", 150, Vec::new(), None)];
        assert!(matches!(
            remix_feeds(&slices, 5),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_source_key() {
        let slices = vec![
            slice("x", 50, Vec::new(), None),
            slice("x", 50, Vec::new(), None),
        ];
        assert!(remix_feeds(&slices, 5).is_err());
    }

    #[test]
    fn test_never_exceeds_limit() {
        let now = Utc::now();
        // at limit 11 each source rounds up to 4, so 12 items are accepted before the cap
        let slices = vec![
            slice("a", 100, items("a", 10, now), None),
            slice("b", 100, items("b", 10, now), None),
            slice("c", 100, items("c", 10, now), None),
        ];

        for limit in 0..15 {
            assert!(remix_feeds(&slices, limit).unwrap().items.len() <= limit);
        }
    }
}
