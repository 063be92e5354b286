// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Screen-distance clustering of observations.
//!
//! Clustering is greedy and runs in source order. Each observation that is
//! not yet in a cluster seeds a new one; every other unclustered observation
//! inside a square of `distance` pixels around the seed joins it. Because
//! the pass only depends on the observations, the distances and the view
//! resolution, the same inputs always produce the same partition, and
//! members keep their source order inside each cluster.

use std::sync::Arc;

use log::debug;

use crate::observation::Observation;
use crate::projection::Coordinate;

/// Default merge distance in pixels.
pub const DEFAULT_DISTANCE: f64 = 30.0;

/// Default minimum separation between cluster anchors in pixels.
pub const DEFAULT_MIN_DISTANCE: f64 = 10.0;

/// Clustering distances, both in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterConfig {
    /// Observations within this many pixels of a seed join its cluster.
    pub distance: f64,
    /// Minimum pixel distance between cluster anchors. Capped at `distance`.
    /// A non-zero value pulls the anchor from the members' centroid toward
    /// the seed, which keeps icons from overlapping.
    pub min_distance: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            distance: DEFAULT_DISTANCE,
            min_distance: DEFAULT_MIN_DISTANCE,
        }
    }
}

impl ClusterConfig {
    /// How far the anchor moves from the centroid toward the seed (0..=1).
    #[must_use]
    pub fn interpolation_ratio(&self) -> f64 {
        if self.distance > 0.0 && self.min_distance > 0.0 {
            (self.min_distance.min(self.distance) / self.distance).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// A group of observations merged for display at the current resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    position: Coordinate,
    members: Vec<Arc<Observation>>,
}

impl Cluster {
    #[must_use]
    pub fn new(position: Coordinate, members: Vec<Arc<Observation>>) -> Self {
        Self { position, members }
    }

    /// Build a cluster anchored at the members' centroid.
    #[must_use]
    pub fn from_observations(observations: impl IntoIterator<Item = Observation>) -> Self {
        let members: Vec<_> = observations.into_iter().map(Arc::new).collect();
        let position = centroid(&members);
        Self { position, members }
    }

    /// Anchor position in render-projection meters.
    #[must_use]
    pub fn position(&self) -> Coordinate {
        self.position
    }

    #[must_use]
    pub fn members(&self) -> &[Arc<Observation>] {
        &self.members
    }

    /// Members in cluster order.
    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.members.iter().map(AsRef::as_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

fn centroid(members: &[Arc<Observation>]) -> Coordinate {
    if members.is_empty() {
        return Coordinate::default();
    }
    let (sx, sy) = members.iter().fold((0.0, 0.0), |(sx, sy), o| {
        let p = o.position();
        (sx + p.x, sy + p.y)
    });
    let n = members.len() as f64;
    Coordinate::new(sx / n, sy / n)
}

/// Partition of a fixed observation set into clusters, recomputed when the
/// view resolution changes.
#[derive(Debug, Clone)]
pub struct ClusterIndex {
    observations: Vec<Arc<Observation>>,
    config: ClusterConfig,
    // Last partition and the resolution it was computed for
    cached: Option<(u64, Vec<Cluster>)>,
}

impl ClusterIndex {
    #[must_use]
    pub fn new(observations: impl IntoIterator<Item = Observation>, config: ClusterConfig) -> Self {
        Self {
            observations: observations.into_iter().map(Arc::new).collect(),
            config,
            cached: None,
        }
    }

    #[must_use]
    pub fn observations(&self) -> &[Arc<Observation>] {
        &self.observations
    }

    #[must_use]
    pub fn config(&self) -> ClusterConfig {
        self.config
    }

    /// Change the clustering distances. The next call to [`Self::clusters`]
    /// recomputes.
    pub fn set_config(&mut self, config: ClusterConfig) {
        if config != self.config {
            self.config = config;
            self.cached = None;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Clusters for a view resolution in map units per pixel.
    ///
    /// The partition is reused while the resolution stays the same.
    pub fn clusters(&mut self, resolution: f64) -> &[Cluster] {
        let key = resolution.to_bits();
        let stale = self.cached.as_ref().map_or(true, |(k, _)| *k != key);
        if stale {
            let clusters = Self::compute(&self.observations, self.config, resolution);
            debug!(
                "Clustered {} observations into {} clusters at {:.1} m/px",
                self.observations.len(),
                clusters.len(),
                resolution
            );
            self.cached = Some((key, clusters));
        }
        self.cached.as_ref().map_or(&[], |(_, clusters)| clusters.as_slice())
    }

    /// Run one clustering pass without touching any cached state.
    #[must_use]
    pub fn compute(
        observations: &[Arc<Observation>],
        config: ClusterConfig,
        resolution: f64,
    ) -> Vec<Cluster> {
        let map_distance = config.distance.max(0.0) * resolution.abs();
        let ratio = config.interpolation_ratio();
        let mut clustered = vec![false; observations.len()];
        let mut clusters = Vec::new();

        for (seed_idx, seed) in observations.iter().enumerate() {
            if clustered[seed_idx] {
                continue;
            }
            let center = seed.position();

            // The seed always joins its own cluster, even at a NaN position
            clustered[seed_idx] = true;
            let mut members = vec![Arc::clone(seed)];
            for (idx, candidate) in observations.iter().enumerate().skip(seed_idx + 1) {
                if clustered[idx] {
                    continue;
                }
                let p = candidate.position();
                if (p.x - center.x).abs() <= map_distance && (p.y - center.y).abs() <= map_distance {
                    clustered[idx] = true;
                    members.push(Arc::clone(candidate));
                }
            }

            let c = centroid(&members);
            let position = Coordinate::new(
                c.x * (1.0 - ratio) + center.x * ratio,
                c.y * (1.0 - ratio) + center.y * ratio,
            );
            clusters.push(Cluster::new(position, members));
        }

        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::WeatherCategory;
    use crate::projection::WebMercator;

    fn obs(name: &str, lon: f64, lat: f64) -> Observation {
        Observation::from_lon_lat(name, lon, lat, 20.0, WeatherCategory::Clear)
    }

    fn sample() -> Vec<Observation> {
        vec![
            obs("Cairo", 31.2357, 30.0444),
            obs("Giza", 31.2089, 30.0131),
            obs("London", -0.1257, 51.5085),
            obs("Alexandria", 29.9187, 31.2001),
            obs("Paris", 2.3488, 48.8534),
        ]
    }

    fn names(cluster: &Cluster) -> Vec<&str> {
        cluster.iter().map(Observation::name).collect()
    }

    #[test]
    fn test_every_observation_in_exactly_one_cluster() {
        let observations: Vec<_> = sample().into_iter().map(Arc::new).collect();
        for zoom in 0..12 {
            let resolution = WebMercator::resolution_for_zoom(f64::from(zoom));
            let clusters = ClusterIndex::compute(&observations, ClusterConfig::default(), resolution);
            let mut seen: Vec<&str> = clusters.iter().flat_map(names).collect();
            seen.sort_unstable();
            assert_eq!(seen, ["Alexandria", "Cairo", "Giza", "London", "Paris"]);
            assert!(clusters.iter().all(|c| !c.is_empty()));
        }
    }

    #[test]
    fn test_zoomed_in_all_singletons() {
        let mut index = ClusterIndex::new(sample(), ClusterConfig::default());
        let clusters = index.clusters(WebMercator::resolution_for_zoom(14.0));
        assert_eq!(clusters.len(), 5);
        assert!(clusters.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn test_zoomed_out_merges_neighbors_in_source_order() {
        let mut index = ClusterIndex::new(sample(), ClusterConfig::default());
        // About 10 km per pixel: Cairo/Giza merge, London/Paris stay apart
        let clusters = index.clusters(WebMercator::resolution_for_zoom(4.0));
        assert_eq!(names(&clusters[0]), ["Cairo", "Giza", "Alexandria"]);
        assert_eq!(names(&clusters[1]), ["London"]);
        assert_eq!(names(&clusters[2]), ["Paris"]);
    }

    #[test]
    fn test_whole_world_single_cluster() {
        let mut index = ClusterIndex::new(sample(), ClusterConfig::default());
        let clusters = index.clusters(WebMercator::resolution_for_zoom(0.0));
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 5);
        assert_eq!(clusters[0].members()[0].name(), "Cairo");
    }

    #[test]
    fn test_resolution_change_recomputes() {
        let mut index = ClusterIndex::new(sample(), ClusterConfig::default());
        let coarse = index.clusters(WebMercator::resolution_for_zoom(0.0)).len();
        let fine = index.clusters(WebMercator::resolution_for_zoom(14.0)).len();
        let coarse_again = index.clusters(WebMercator::resolution_for_zoom(0.0)).len();
        assert_eq!(coarse, 1);
        assert_eq!(fine, 5);
        assert_eq!(coarse_again, 1);
    }

    #[test]
    fn test_same_inputs_same_partition() {
        let observations: Vec<_> = sample().into_iter().map(Arc::new).collect();
        let resolution = WebMercator::resolution_for_zoom(4.0);
        let a = ClusterIndex::compute(&observations, ClusterConfig::default(), resolution);
        let b = ClusterIndex::compute(&observations, ClusterConfig::default(), resolution);
        assert_eq!(a, b);
    }

    #[test]
    fn test_set_config_invalidates() {
        let mut index = ClusterIndex::new(sample(), ClusterConfig::default());
        let resolution = WebMercator::resolution_for_zoom(4.0);
        assert_eq!(index.clusters(resolution).len(), 3);

        index.set_config(ClusterConfig {
            distance: 0.0,
            min_distance: 0.0,
        });
        assert_eq!(index.clusters(resolution).len(), 5);
    }

    #[test]
    fn test_anchor_is_centroid_without_min_distance() {
        let config = ClusterConfig {
            distance: 30.0,
            min_distance: 0.0,
        };
        let observations: Vec<_> = vec![
            Arc::new(obs("A", 0.0, 0.0)),
            Arc::new(obs("B", 0.001, 0.0)),
        ];
        let clusters = ClusterIndex::compute(&observations, config, 100.0);
        assert_eq!(clusters.len(), 1);
        let expected = WebMercator::forward(0.0005, 0.0);
        assert!((clusters[0].position().x - expected.x).abs() < 1e-6);
    }

    #[test]
    fn test_min_distance_pulls_anchor_toward_seed() {
        let config = ClusterConfig {
            distance: 30.0,
            min_distance: 15.0,
        };
        assert!((config.interpolation_ratio() - 0.5).abs() < 1e-12);

        let observations: Vec<_> = vec![
            Arc::new(obs("A", 0.0, 0.0)),
            Arc::new(obs("B", 0.001, 0.0)),
        ];
        let clusters = ClusterIndex::compute(&observations, config, 100.0);
        let seed = observations[0].position().x;
        let mid = WebMercator::forward(0.0005, 0.0).x;
        let expected = (seed + mid) / 2.0;
        assert!((clusters[0].position().x - expected).abs() < 1e-6);
    }

    #[test]
    fn test_min_distance_capped_at_distance() {
        let config = ClusterConfig {
            distance: 10.0,
            min_distance: 40.0,
        };
        assert!((config.interpolation_ratio() - 1.0).abs() < 1e-12);
        let zero = ClusterConfig {
            distance: 0.0,
            min_distance: 10.0,
        };
        assert_eq!(zero.interpolation_ratio(), 0.0);
    }

    #[test]
    fn test_unprojectable_seed_still_clustered() {
        let observations: Vec<_> = vec![
            Arc::new(obs("Cairo", 31.2357, 30.0444)),
            Arc::new(Observation::from_lon_lat(
                "Nowhere",
                10.0,
                95.0,
                20.0,
                WeatherCategory::Clear,
            )),
            Arc::new(obs("Giza", 31.2089, 30.0131)),
        ];
        assert!(observations[1].position().y.is_nan());

        let clusters = ClusterIndex::compute(&observations, ClusterConfig::default(), 1000.0);
        assert!(clusters.iter().all(|c| !c.is_empty()));
        let total: usize = clusters.iter().map(Cluster::len).sum();
        assert_eq!(total, 3);
        assert!(clusters.iter().any(|c| names(c) == ["Nowhere"]));
    }

    #[test]
    fn test_empty_index() {
        let mut index = ClusterIndex::new(Vec::new(), ClusterConfig::default());
        assert!(index.is_empty());
        assert!(index.clusters(1.0).is_empty());
    }
}
