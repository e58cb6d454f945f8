//! Row / column / grid classification of box sets.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::types::BoundingBox;

const ALIGNED_VARIANCE: f64 = 50.0;
const SPREAD_VARIANCE: f64 = 100.0;
const ROW_BIN: f64 = 30.0;
const COLUMN_BIN: f64 = 50.0;
const MAX_GAP: f64 = 200.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutType {
    Grid,
    Row,
    Column,
    #[default]
    Scattered,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialArrangement {
    pub is_horizontal: bool,
    pub is_vertical: bool,
    pub is_grid: bool,
    pub columns: usize,
    pub rows: usize,
    /// Mean edge-to-edge gap in px
    pub gap: f64,
    pub layout: LayoutType,
}

impl Default for SpatialArrangement {
    fn default() -> Self {
        Self {
            is_horizontal: false,
            is_vertical: false,
            is_grid: false,
            columns: 1,
            rows: 1,
            gap: 0.0,
            layout: LayoutType::Scattered,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SpatialAnalyzer;

impl SpatialAnalyzer {
    pub fn analyze(&self, boxes: &[BoundingBox]) -> SpatialArrangement {
        if boxes.len() < 2 {
            return SpatialArrangement::default();
        }

        let xs: Vec<f64> = boxes.iter().map(|b| b.x()).collect();
        let ys: Vec<f64> = boxes.iter().map(|b| b.y()).collect();
        let var_x = variance(&xs);
        let var_y = variance(&ys);

        let is_horizontal = var_y < ALIGNED_VARIANCE && var_x > SPREAD_VARIANCE;
        let is_vertical = var_x < ALIGNED_VARIANCE && var_y > SPREAD_VARIANCE;

        let row_bins: BTreeSet<i64> = ys.iter().map(|y| bin(*y, ROW_BIN)).collect();
        let column_bins: BTreeSet<i64> = xs.iter().map(|x| bin(*x, COLUMN_BIN)).collect();
        let is_grid = boxes.len() >= 4 && row_bins.len() >= 2 && column_bins.len() >= 2;

        let (columns, rows) = if is_grid {
            (column_bins.len(), row_bins.len())
        } else if is_horizontal {
            (boxes.len(), 1)
        } else if is_vertical {
            (1, boxes.len())
        } else {
            (1, 1)
        };

        let gap = if is_grid {
            grid_gap(boxes)
        } else if is_horizontal {
            mean_gap(boxes.iter().copied(), Axis::X)
        } else {
            mean_gap(boxes.iter().copied(), Axis::Y)
        };

        let layout = if is_grid {
            LayoutType::Grid
        } else if is_horizontal {
            LayoutType::Row
        } else if is_vertical {
            LayoutType::Column
        } else {
            LayoutType::Scattered
        };

        SpatialArrangement {
            is_horizontal,
            is_vertical,
            is_grid,
            columns,
            rows,
            gap,
            layout,
        }
    }
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

fn bin(value: f64, size: f64) -> i64 {
    (value / size).floor() as i64
}

/// Horizontal gaps measured within each row, so row breaks don't count.
fn grid_gap(boxes: &[BoundingBox]) -> f64 {
    let mut rows: BTreeMap<i64, Vec<BoundingBox>> = BTreeMap::new();
    for b in boxes {
        rows.entry(bin(b.y(), ROW_BIN)).or_default().push(*b);
    }
    let gaps: Vec<f64> = rows
        .into_values()
        .flat_map(|row| gaps_along(row, Axis::X))
        .collect();
    average(&gaps)
}

fn mean_gap(boxes: impl IntoIterator<Item = BoundingBox>, axis: Axis) -> f64 {
    average(&gaps_along(boxes.into_iter().collect(), axis))
}

fn gaps_along(mut boxes: Vec<BoundingBox>, axis: Axis) -> Vec<f64> {
    let start = |b: &BoundingBox| match axis {
        Axis::X => b.x(),
        Axis::Y => b.y(),
    };
    let end = |b: &BoundingBox| match axis {
        Axis::X => b.right(),
        Axis::Y => b.bottom(),
    };
    boxes.sort_by(|a, b| start(a).total_cmp(&start(b)));
    boxes
        .windows(2)
        .map(|pair| start(&pair[1]) - end(&pair[0]))
        .filter(|g| *g > 0.0 && *g < MAX_GAP)
        .collect()
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(x: f64, y: f64, w: f64, h: f64) -> BoundingBox {
        BoundingBox::new(x, y, w, h).unwrap()
    }

    #[test]
    fn two_by_two_grid() {
        let boxes = [
            b(0.0, 0.0, 100.0, 50.0),
            b(300.0, 0.0, 100.0, 50.0),
            b(0.0, 200.0, 100.0, 50.0),
            b(300.0, 200.0, 100.0, 50.0),
        ];
        let arrangement = SpatialAnalyzer.analyze(&boxes);
        assert!(arrangement.is_grid);
        assert_eq!(arrangement.columns, 2);
        assert_eq!(arrangement.rows, 2);
        assert_eq!(arrangement.layout, LayoutType::Grid);
        // 200px column gap sits on the cutoff
        assert_eq!(arrangement.gap, 0.0);
    }

    #[test]
    fn horizontal_row_with_gap() {
        let boxes = [
            b(0.0, 10.0, 100.0, 40.0),
            b(124.0, 10.0, 100.0, 40.0),
            b(248.0, 12.0, 100.0, 40.0),
        ];
        let arrangement = SpatialAnalyzer.analyze(&boxes);
        assert!(arrangement.is_horizontal);
        assert!(!arrangement.is_grid);
        assert_eq!(arrangement.layout, LayoutType::Row);
        assert_eq!((arrangement.columns, arrangement.rows), (3, 1));
        assert!((arrangement.gap - 24.0).abs() < 1e-9);
    }

    #[test]
    fn vertical_column() {
        let boxes = [
            b(20.0, 0.0, 300.0, 60.0),
            b(20.0, 76.0, 300.0, 60.0),
            b(20.0, 152.0, 300.0, 60.0),
        ];
        let arrangement = SpatialAnalyzer.analyze(&boxes);
        assert!(arrangement.is_vertical);
        assert_eq!(arrangement.layout, LayoutType::Column);
        assert_eq!(arrangement.rows, 3);
        assert!((arrangement.gap - 16.0).abs() < 1e-9);
    }

    #[test]
    fn fewer_than_two_boxes_is_default() {
        assert_eq!(SpatialAnalyzer.analyze(&[]), SpatialArrangement::default());
        let single = SpatialAnalyzer.analyze(&[b(0.0, 0.0, 10.0, 10.0)]);
        assert!(!single.is_horizontal && !single.is_vertical && !single.is_grid);
    }

    #[test]
    fn large_gaps_are_ignored() {
        let boxes = [b(0.0, 0.0, 50.0, 20.0), b(500.0, 0.0, 50.0, 20.0)];
        let arrangement = SpatialAnalyzer.analyze(&boxes);
        assert!(arrangement.is_horizontal);
        assert_eq!(arrangement.gap, 0.0);
    }
}
