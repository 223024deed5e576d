// ============================================
// Masonry Distributor
// ============================================
//
// Greedy shortest-column packing of variable-height cards.
//
// Items are placed in input order, each into the column with the smallest
// running height (lowest index on ties). Placement of item i depends only on
// items 0..i, so appending items never moves earlier cards.

use crate::error::{EngineError, Result};
use crate::models::{ColumnAssignment, LayoutItem};
use tracing::debug;

/// Header, text and action row of a text-only card.
pub const BASE_CARD_HEIGHT: f64 = 100.0;
/// Media height when the aspect ratio is unknown.
pub const DEFAULT_MEDIA_HEIGHT: f64 = 300.0;
pub const MIN_MEDIA_HEIGHT: f64 = 150.0;
/// Rendered card width that media is scaled to.
pub const MEDIA_WIDTH: f64 = 300.0;

pub fn estimate_height(item: &LayoutItem) -> f64 {
    if !item.has_media {
        return BASE_CARD_HEIGHT;
    }

    let media = match item.aspect_ratio {
        Some(ratio) => (MEDIA_WIDTH / ratio).max(MIN_MEDIA_HEIGHT),
        None => DEFAULT_MEDIA_HEIGHT,
    };

    BASE_CARD_HEIGHT + media
}

pub fn distribute_columns(items: &[LayoutItem], columns: usize) -> Result<Vec<ColumnAssignment>> {
    validate(items, columns)?;

    let mut heights = vec![0.0_f64; columns];
    let mut assignments = Vec::with_capacity(items.len());

    for item in items {
        let height = estimate_height(item);
        let column = shortest_column(&heights);

        heights[column] += height;
        assignments.push(ColumnAssignment {
            uri: item.uri.clone(),
            column,
            estimated_height: height,
        });
    }

    debug!(
        item_count = items.len(),
        columns = columns,
        tallest = heights.iter().copied().fold(0.0_f64, f64::max),
        "Masonry distribution complete"
    );

    Ok(assignments)
}

/// Index of the minimum height; the first one wins on ties.
fn shortest_column(heights: &[f64]) -> usize {
    let mut best = 0;
    for (i, &height) in heights.iter().enumerate().skip(1) {
        if height < heights[best] {
            best = i;
        }
    }
    best
}

pub(crate) fn validate(items: &[LayoutItem], columns: usize) -> Result<()> {
    if columns == 0 {
        return Err(EngineError::invalid("columns must be at least 1"));
    }

    for item in items {
        if let Some(ratio) = item.aspect_ratio {
            // Tiny ratios would scale media to an infinite height
            if !ratio.is_finite() || ratio <= 0.0 || !(MEDIA_WIDTH / ratio).is_finite() {
                return Err(EngineError::invalid(format!(
                    "aspectRatio for '{}' must be a positive number, got {}",
                    item.uri, ratio
                )));
            }
        }
    }

    Ok(())
}
