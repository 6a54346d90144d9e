#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dataset family definitions and map configuration types.
//!
//! Family definitions describe how each metrics file names its area key
//! and index columns. The map configuration points each family at its
//! geodata and metrics files on disk.

use std::path::{Path, PathBuf};

use access_map_area_models::DatasetFamily;
use serde::{Deserialize, Serialize};

/// A dataset family definition, deserialized from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyDefinition {
    /// Which family this definition describes.
    pub family: DatasetFamily,
    /// Human-readable name (e.g., "Chicago Census Tracts").
    pub name: String,
    /// Metrics field holding the area id (e.g., `"TRACT"`).
    pub key_field: String,
    /// Metrics field holding the access index.
    pub index_field: String,
}

/// Files backing one dataset family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyPaths {
    /// Geodata rows (`id`, `name`, `geometry`).
    pub geodata: PathBuf,
    /// Per-area metrics JSON.
    pub metrics: PathBuf,
}

impl FamilyPaths {
    /// Resolves relative paths against `base`.
    #[must_use]
    pub fn resolved_against(&self, base: &Path) -> Self {
        let resolve = |p: &Path| {
            if p.is_relative() {
                base.join(p)
            } else {
                p.to_path_buf()
            }
        };

        Self {
            geodata: resolve(&self.geodata),
            metrics: resolve(&self.metrics),
        }
    }
}

/// Top-level map configuration, deserialized from TOML.
///
/// ```toml
/// [census]
/// geodata = "data/census_tracts.json"
/// metrics = "data/census_access.json"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Census tract files.
    pub census: Option<FamilyPaths>,
    /// Community area files.
    pub community: Option<FamilyPaths>,
}

impl MapConfig {
    /// Returns the configured files for `family`, if any.
    #[must_use]
    pub const fn paths(&self, family: DatasetFamily) -> Option<&FamilyPaths> {
        match family {
            DatasetFamily::Census => self.census.as_ref(),
            DatasetFamily::Community => self.community.as_ref(),
        }
    }
}
