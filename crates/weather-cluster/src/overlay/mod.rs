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

//! Weather cluster overlay: clustering plus styling, one render
//! instruction per cluster.

use log::{debug, info, warn};

use crate::cluster::{Cluster, ClusterConfig, ClusterIndex};
use crate::dataset::{Dataset, DatasetError};
use crate::observation::FeatureFactory;
use crate::projection::Coordinate;
use crate::style::{ClusterStyler, DisplaySymbol};

/// What the renderer needs to draw one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInstruction {
    /// Anchor in render-projection meters.
    pub position: Coordinate,
    pub symbol: DisplaySymbol,
    pub member_count: usize,
    /// Name of the hottest city in the cluster.
    pub representative: String,
    pub temperature: f64,
}

/// Overlay layer built once from a dataset and restyled on every pass.
#[derive(Debug, Clone)]
pub struct ClusterLayer {
    index: ClusterIndex,
    // Resolution of the last pass, so styling anomalies are reported once
    // per recompute rather than once per frame
    last_resolution: Option<u64>,
}

impl ClusterLayer {
    #[must_use]
    pub fn new(index: ClusterIndex) -> Self {
        Self {
            index,
            last_resolution: None,
        }
    }

    /// Build observations from a dataset and index them.
    pub fn from_dataset(
        dataset: &Dataset,
        factory: FeatureFactory,
        config: ClusterConfig,
    ) -> Result<Self, DatasetError> {
        let observations = factory.build_observations(&dataset.cities)?;
        info!(
            "Built {} observations from {} city records",
            observations.len(),
            dataset.len()
        );
        Ok(Self::new(ClusterIndex::new(observations, config)))
    }

    #[must_use]
    pub fn index(&self) -> &ClusterIndex {
        &self.index
    }

    /// Mutable access to the index. Changing its config makes the next
    /// pass report styling anomalies again.
    pub fn index_mut(&mut self) -> &mut ClusterIndex {
        self.last_resolution = None;
        &mut self.index
    }

    /// Cluster at `resolution` and style every cluster.
    ///
    /// Symbols are recomputed on every call. A cluster that cannot be styled
    /// is left out rather than aborting the pass; it is logged at `warn`
    /// the first time a resolution is rendered.
    pub fn render(&mut self, resolution: f64) -> Vec<RenderInstruction> {
        let report = self.is_new_pass(resolution);
        style_clusters(self.index.clusters(resolution), report)
    }

    fn is_new_pass(&mut self, resolution: f64) -> bool {
        let key = resolution.to_bits();
        let changed = self.last_resolution != Some(key);
        self.last_resolution = Some(key);
        changed
    }
}

fn style_clusters(clusters: &[Cluster], report: bool) -> Vec<RenderInstruction> {
    let mut instructions = Vec::with_capacity(clusters.len());

    for cluster in clusters {
        match ClusterStyler::style_with_representative(cluster) {
            Ok((representative, symbol)) => instructions.push(RenderInstruction {
                position: cluster.position(),
                symbol,
                member_count: cluster.len(),
                representative: representative.name().to_string(),
                temperature: representative.temperature(),
            }),
            Err(e) if report => warn!("Skipping cluster at {:?}: {}", cluster.position(), e),
            Err(e) => debug!("Skipping cluster at {:?}: {}", cluster.position(), e),
        }
    }

    instructions
}
