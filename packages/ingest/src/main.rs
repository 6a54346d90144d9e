#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for loading and shading access map data.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use access_map_area_models::{AreaId, DatasetFamily, LatLng, Shade, ShadingMode, Viewport};
use access_map_ingest::{all_families, enabled_families, load_config, load_family};
use access_map_shading::AreaShadingEngine;
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "access_map_ingest", about = "Access map shading tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered dataset families
    Families,
    /// Shade every configured family and print the result as JSON
    Shade {
        /// Map configuration file
        #[arg(long, default_value = "access_map.toml")]
        config: PathBuf,
        /// Comma-separated list of families (overrides `ACCESS_MAP_FAMILIES` env var)
        #[arg(long)]
        families: Option<String>,
        /// Shading mode: `absolute` or `relative_to_visible`
        #[arg(long, default_value = "absolute", value_parser = parse_mode)]
        mode: ShadingMode,
        /// Viewport as `west,south,east,north`. Required for relative mode.
        #[arg(long)]
        bbox: Option<String>,
    },
    /// Print the metric record for one area
    Lookup {
        /// Map configuration file
        #[arg(long, default_value = "access_map.toml")]
        config: PathBuf,
        /// Dataset family (`census` or `community`)
        #[arg(long, value_parser = parse_family)]
        family: DatasetFamily,
        /// Area id (tract GEOID or community area number)
        area_id: String,
    },
}

/// One shaded polygon as printed by `shade`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShadeRow<'a> {
    area_id: &'a AreaId,
    area_name: &'a str,
    opacity: Option<f64>,
    fill: &'static str,
    shade: Shade,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Families => {
            println!("{:<12} {:<16} NAME", "FAMILY", "KEY FIELD");
            println!("{}", "-".repeat(50));
            for def in &all_families() {
                println!("{:<12} {:<16} {}", def.family, def.key_field, def.name);
            }
        }
        Commands::Shade {
            config,
            families,
            mode,
            bbox,
        } => {
            let explicit = families.is_some();
            let config = load_config(&config)?;
            let families = enabled_families(families)?;

            let viewport = bbox
                .as_deref()
                .map(|s| parse_bbox(s).ok_or_else(|| format!("Invalid bbox: {s}")))
                .transpose()?
                .map(|(ne, sw)| Viewport::new(ne, sw))
                .transpose()?;

            let start = Instant::now();
            let mut output = BTreeMap::new();

            for family in families {
                if !explicit && config.paths(family).is_none() {
                    log::warn!("Skipping {family}: no files configured");
                    continue;
                }

                let loaded = load_family(&config, family)?;
                let engine = AreaShadingEngine::new(loaded.records, mode)?;
                let shades = engine.shade(&loaded.polygons, viewport.as_ref())?;

                let rows: Vec<ShadeRow<'_>> = loaded
                    .polygons
                    .iter()
                    .zip(&shades)
                    .map(|(polygon, shaded)| ShadeRow {
                        area_id: &polygon.area_id,
                        area_name: &polygon.area_name,
                        opacity: shaded.shade.opacity(),
                        fill: shaded.shade.fill().color(),
                        shade: shaded.shade,
                    })
                    .collect();

                output.insert(family, serde_json::to_value(rows)?);
            }

            println!("{}", serde_json::to_string_pretty(&output)?);
            log::info!("Shading complete in {:.1}s", start.elapsed().as_secs_f64());
        }
        Commands::Lookup {
            config,
            family,
            area_id,
        } => {
            let config = load_config(&config)?;
            let loaded = load_family(&config, family)?;
            let engine = AreaShadingEngine::new(loaded.records, ShadingMode::Absolute)?;

            match engine.lookup(&AreaId::from(area_id.trim())) {
                Some(record) => println!("{}", serde_json::to_string_pretty(record)?),
                None => println!("No data for {family} area {area_id}"),
            }
        }
    }

    Ok(())
}

fn parse_mode(s: &str) -> Result<ShadingMode, String> {
    s.parse::<ShadingMode>().map_err(|e| format!("{e}: '{s}'"))
}

fn parse_family(s: &str) -> Result<DatasetFamily, String> {
    s.parse::<DatasetFamily>().map_err(|e| format!("{e}: '{s}'"))
}

/// Parses a bounding box string `"west,south,east,north"` into its
/// `(north_east, south_west)` corners. Every token must be a number.
fn parse_bbox(s: &str) -> Option<(LatLng, LatLng)> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse())
        .collect::<Result<_, _>>()
        .ok()?;
    if parts.len() == 4 {
        Some((
            LatLng::new(parts[3], parts[2]),
            LatLng::new(parts[1], parts[0]),
        ))
    } else {
        None
    }
}
