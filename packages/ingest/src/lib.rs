#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Library for loading area geodata and access metrics from disk and
//! handing them to the shading engine.

pub mod geodata;
pub mod metrics;
pub mod registry;

use std::path::Path;

use access_map_area_models::{AreaRecord, DatasetFamily, PolygonRef};
use access_map_ingest_models::{FamilyDefinition, MapConfig};
use access_map_shading::ShadingError;
use thiserror::Error;

pub use geodata::{AreaGeometry, AreaShape, build_polygons, parse_rows};
pub use metrics::normalize_metrics;
pub use registry::{all_families, family_definition};

/// Errors that can occur while loading map data.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Reading a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Input data had an unusable shape or type.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of what went wrong.
        message: String,
    },

    /// Shading the loaded data failed.
    #[error(transparent)]
    Shading(#[from] ShadingError),

    /// No definition or configured files for a family.
    #[error("Family '{family}' is not configured")]
    UnknownFamily {
        /// The requested family.
        family: DatasetFamily,
    },
}

impl IngestError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Polygons and metrics for one dataset family.
#[derive(Debug, Clone)]
pub struct LoadedFamily {
    /// Family definition used to read the metrics.
    pub definition: FamilyDefinition,
    /// Area polygons with centroids.
    pub polygons: Vec<PolygonRef>,
    /// Normalized metric records.
    pub records: Vec<AreaRecord>,
}

/// Returns the families to work on, filtered by a comma-separated CLI
/// value or the `ACCESS_MAP_FAMILIES` environment variable. If neither is
/// set, every family is returned.
///
/// # Errors
///
/// * [`IngestError::InvalidInput`] if a listed name is not a family.
pub fn enabled_families(cli_filter: Option<String>) -> Result<Vec<DatasetFamily>, IngestError> {
    let filter = cli_filter.or_else(|| std::env::var("ACCESS_MAP_FAMILIES").ok());

    let Some(filter_str) = filter else {
        return Ok(DatasetFamily::ALL.to_vec());
    };

    filter_str
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| {
            name.parse::<DatasetFamily>()
                .map_err(|_| IngestError::invalid(format!("unknown dataset family '{name}'")))
        })
        .collect()
}

/// Loads the map configuration, resolving relative paths against the
/// config file's directory.
///
/// # Errors
///
/// * [`IngestError::Io`] if the file cannot be read.
/// * [`IngestError::Toml`] if it is not a valid configuration.
pub fn load_config(path: &Path) -> Result<MapConfig, IngestError> {
    let content = std::fs::read_to_string(path)?;
    let config: MapConfig = toml::from_str(&content)?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(MapConfig {
        census: config.census.map(|p| p.resolved_against(base)),
        community: config.community.map(|p| p.resolved_against(base)),
    })
}

/// Reads and normalizes a metrics file.
///
/// # Errors
///
/// * [`IngestError::Io`] or [`IngestError::Json`] if the file cannot be
///   read or parsed.
/// * [`IngestError::InvalidInput`] if the document shape is unusable.
pub fn load_metrics_file(
    path: &Path,
    definition: &FamilyDefinition,
) -> Result<Vec<AreaRecord>, IngestError> {
    log::debug!("Reading metrics from {}", path.display());
    let document: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    normalize_metrics(&document, definition)
}

/// Reads a geodata file and builds its polygons.
///
/// # Errors
///
/// * [`IngestError::Io`] or [`IngestError::Json`] if the file cannot be
///   read or parsed.
/// * [`IngestError::InvalidInput`] if the document has no row array.
pub fn load_geodata_file(path: &Path) -> Result<Vec<PolygonRef>, IngestError> {
    log::debug!("Reading geodata from {}", path.display());
    let document: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    build_polygons(&document)
}

/// Loads polygons and metrics for `family` as configured in `config`.
///
/// # Errors
///
/// * [`IngestError::UnknownFamily`] if the family has no definition or no
///   configured files.
/// * Any error from [`load_geodata_file`] or [`load_metrics_file`].
pub fn load_family(config: &MapConfig, family: DatasetFamily) -> Result<LoadedFamily, IngestError> {
    let definition = family_definition(family).ok_or(IngestError::UnknownFamily { family })?;
    let paths = config
        .paths(family)
        .ok_or(IngestError::UnknownFamily { family })?;

    let polygons = load_geodata_file(&paths.geodata)?;
    let records = load_metrics_file(&paths.metrics, &definition)?;

    log::info!(
        "Loaded {}: {} polygons, {} records",
        definition.name,
        polygons.len(),
        records.len()
    );

    Ok(LoadedFamily {
        definition,
        polygons,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_family_filter() {
        let families = enabled_families(Some("community, census".to_string())).unwrap();
        assert_eq!(
            families,
            vec![DatasetFamily::Community, DatasetFamily::Census]
        );
    }

    #[test]
    fn unknown_family_filter_is_rejected() {
        assert!(matches!(
            enabled_families(Some("wards".to_string())),
            Err(IngestError::InvalidInput { .. })
        ));
    }

    #[test]
    fn unconfigured_family_is_reported() {
        let err = load_family(&MapConfig::default(), DatasetFamily::Census).unwrap_err();
        assert!(matches!(
            err,
            IngestError::UnknownFamily {
                family: DatasetFamily::Census
            }
        ));
    }

    #[test]
    fn loads_family_from_disk() {
        let dir = std::env::temp_dir().join(format!("access_map_ingest_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        std::fs::write(
            dir.join("geodata.json"),
            r#"{"rows": [["8", "Near North", {"type": "Polygon",
                "coordinates": [[[0,0],[2,0],[2,2],[0,2],[0,0]]]}]]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("metrics.json"),
            r#"[{"COMMUNITY_AREA": 8, "ACCESS_INDEX": 0.3}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("map.toml"),
            "[community]\ngeodata = \"geodata.json\"\nmetrics = \"metrics.json\"\n",
        )
        .unwrap();

        let config = load_config(&dir.join("map.toml")).unwrap();
        let loaded = load_family(&config, DatasetFamily::Community).unwrap();

        assert_eq!(loaded.polygons.len(), 1);
        assert_eq!(loaded.polygons[0].area_name, "near north");
        assert_eq!(loaded.records[0].access_index, Some(0.3));

        std::fs::remove_dir_all(&dir).ok();
    }
}
