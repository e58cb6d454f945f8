//! Density-based clustering of components in visual feature space.
//!
//! Standard DBSCAN over [`VisualFeatureVector`] with Euclidean distance.
//! Neighbourhoods include the point itself, cluster ids start at 1 and
//! noise (id 0) is dropped from the output. Expansion uses a FIFO worklist,
//! so for a fixed input order the result is reproducible.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

use super::component::DetectedComponent;
use super::features::VisualFeatureVector;
use super::spatial::{SpatialAnalyzer, SpatialArrangement};
use crate::types::BoundingBox;
use crate::viewport::Viewport;

pub const NOISE: usize = 0;

/// A point handed to the clustering engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterableElement {
    pub id: String,
    pub component_type: String,
    pub bounds: BoundingBox,
    pub features: VisualFeatureVector,
}

impl ClusterableElement {
    pub fn from_component(component: &DetectedComponent, viewport: &Viewport) -> Self {
        Self {
            id: component.id.clone(),
            component_type: component.component_type.clone(),
            bounds: *component.bounds(),
            features: VisualFeatureVector::from_visual(&component.visual, viewport),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualCluster {
    pub id: usize,
    pub member_ids: Vec<String>,
    pub centroid: VisualFeatureVector,
    /// Majority member type, suffixed with `-grid` for grid arrangements
    pub label: String,
    pub arrangement: SpatialArrangement,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualClusteringEngine {
    pub epsilon: f64,
    pub min_points: usize,
}

impl Default for VisualClusteringEngine {
    fn default() -> Self {
        Self {
            epsilon: 0.2,
            min_points: 2,
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Label {
    Unvisited,
    Noise,
    Cluster(usize),
}

impl VisualClusteringEngine {
    pub fn new(epsilon: f64, min_points: usize) -> Self {
        Self {
            epsilon,
            min_points,
        }
    }

    /// Cluster labels per input point (0 = noise), in input order.
    pub fn assign(&self, points: &[ClusterableElement]) -> Vec<usize> {
        let mut labels = vec![Label::Unvisited; points.len()];
        let mut next_id = 1;

        for i in 0..points.len() {
            if labels[i] != Label::Unvisited {
                continue;
            }
            let neighbours = self.region_query(points, i);
            if neighbours.len() < self.min_points {
                labels[i] = Label::Noise;
                continue;
            }

            let cluster = next_id;
            next_id += 1;
            labels[i] = Label::Cluster(cluster);

            let mut worklist: VecDeque<usize> = neighbours.into();
            while let Some(j) = worklist.pop_front() {
                match labels[j] {
                    Label::Noise => {
                        // border point
                        labels[j] = Label::Cluster(cluster);
                        continue;
                    }
                    Label::Cluster(_) => continue,
                    Label::Unvisited => {}
                }
                labels[j] = Label::Cluster(cluster);
                let expansion = self.region_query(points, j);
                if expansion.len() >= self.min_points {
                    worklist.extend(expansion);
                }
            }
        }

        labels
            .into_iter()
            .map(|label| match label {
                Label::Cluster(id) => id,
                Label::Noise | Label::Unvisited => NOISE,
            })
            .collect()
    }

    pub fn cluster(&self, points: &[ClusterableElement]) -> Vec<VisualCluster> {
        let labels = self.assign(points);

        let mut members: BTreeMap<usize, Vec<&ClusterableElement>> = BTreeMap::new();
        for (point, label) in points.iter().zip(&labels) {
            if *label != NOISE {
                members.entry(*label).or_default().push(point);
            }
        }

        let noise = labels.iter().filter(|l| **l == NOISE).count();
        debug!(
            points = points.len(),
            clusters = members.len(),
            noise,
            "visual clustering finished"
        );

        members
            .into_iter()
            .map(|(id, group)| build_cluster(id, &group))
            .collect()
    }

    fn region_query(&self, points: &[ClusterableElement], index: usize) -> Vec<usize> {
        let origin = &points[index].features;
        points
            .iter()
            .enumerate()
            .filter(|(_, p)| origin.distance(&p.features) <= self.epsilon)
            .map(|(i, _)| i)
            .collect()
    }
}

fn build_cluster(id: usize, group: &[&ClusterableElement]) -> VisualCluster {
    let centroid = VisualFeatureVector::centroid(group.iter().map(|p| &p.features))
        .unwrap_or_default();
    let boxes: Vec<BoundingBox> = group.iter().map(|p| p.bounds).collect();
    let arrangement = SpatialAnalyzer.analyze(&boxes);

    let mut label = majority_type(group);
    if arrangement.is_grid {
        label.push_str("-grid");
    }

    VisualCluster {
        id,
        member_ids: group.iter().map(|p| p.id.clone()).collect(),
        centroid,
        label,
        arrangement,
    }
}

/// Most frequent type; ties go to the type seen first.
fn majority_type(group: &[&ClusterableElement]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for point in group {
        match counts.iter_mut().find(|(t, _)| *t == point.component_type) {
            Some((_, n)) => *n += 1,
            None => counts.push((point.component_type.as_str(), 1)),
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for (t, n) in counts {
        if best.map_or(true, |(_, m)| n > m) {
            best = Some((t, n));
        }
    }
    best.map(|(t, _)| t.to_string()).unwrap_or_default()
}
