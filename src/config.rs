use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{anyhow, Context, Result};

use crate::surface::{FillStyle, HeatOptions, IconSpec, MapOptions, StrokeStyle};
use crate::types::LayerKind;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    pub map: MapConfig,
    pub layers: LayerStyleConfig,
    pub controls: ControlsConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub visualization_json: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapConfig {
    pub element_id: String,
    pub tile_url: String,
    pub tile_attribution: String,
    pub options: MapOptions,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LayerStyleConfig {
    pub bus_icon: IconSpec,
    pub existing_park_and_ride_icon: IconSpec,
    pub proposed_park_and_ride_icon: IconSpec,
    pub bike_lane: StrokeStyle,
    pub green_zone: FillStyle,
    pub stop_density_heatmap: HeatOptions,
    pub arrival_heatmap: HeatOptions,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    pub element_id: String,
    pub label: String,
    pub default_visible: bool,
}

// One entry per toggleable layer group; presence of all seven is enforced by
// the TOML parse itself.
#[derive(Debug, Deserialize, Clone)]
pub struct ControlsConfig {
    pub bus_stop_positions: ControlConfig,
    pub stop_density_heatmap: ControlConfig,
    pub arrival_heatmap: ControlConfig,
    pub bike_lanes: ControlConfig,
    pub existing_park_and_ride: ControlConfig,
    pub proposed_park_and_ride: ControlConfig,
    pub green_zone: ControlConfig,
}

impl ControlsConfig {
    pub fn get(&self, kind: LayerKind) -> &ControlConfig {
        match kind {
            LayerKind::BusStopPositions => &self.bus_stop_positions,
            LayerKind::StopDensityHeatmap => &self.stop_density_heatmap,
            LayerKind::ArrivalHeatmap => &self.arrival_heatmap,
            LayerKind::BikeLanes => &self.bike_lanes,
            LayerKind::ExistingParkAndRide => &self.existing_park_and_ride,
            LayerKind::ProposedParkAndRide => &self.proposed_park_and_ride,
            LayerKind::GreenZone => &self.green_zone,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub site_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        validate_gradient("stop_density_heatmap", &self.layers.stop_density_heatmap)?;
        validate_gradient("arrival_heatmap", &self.layers.arrival_heatmap)?;
        Ok(())
    }
}

fn validate_gradient(name: &str, options: &HeatOptions) -> Result<()> {
    if options.gradient.is_empty() {
        return Err(anyhow!("Heatmap '{}' has an empty gradient", name));
    }

    let mut previous: Option<f64> = None;
    for stop in &options.gradient {
        if !(0.0..=1.0).contains(&stop.at) {
            return Err(anyhow!(
                "Heatmap '{}' has gradient stop {} outside [0, 1]",
                name,
                stop.at
            ));
        }
        if let Some(prev) = previous {
            if stop.at <= prev {
                return Err(anyhow!(
                    "Heatmap '{}' gradient stops must be strictly increasing ({} after {})",
                    name,
                    stop.at,
                    prev
                ));
            }
        }
        previous = Some(stop.at);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::GradientStop;

    fn heat_options(stops: &[(f64, &str)]) -> HeatOptions {
        HeatOptions {
            radius: 36,
            blur: 22,
            min_opacity: 0.2,
            gradient: stops
                .iter()
                .map(|(at, color)| GradientStop {
                    at: *at,
                    color: color.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn accepts_increasing_gradient() {
        let options = heat_options(&[(0.25, "#ff1c3e"), (0.5, "#fab41c"), (0.8, "#21ce29")]);
        assert!(validate_gradient("test", &options).is_ok());
    }

    #[test]
    fn rejects_non_monotonic_gradient() {
        let options = heat_options(&[(0.5, "#fab41c"), (0.25, "#ff1c3e")]);
        assert!(validate_gradient("test", &options).is_err());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let options = heat_options(&[(0.5, "#fab41c"), (1.25, "#ff1c3e")]);
        assert!(validate_gradient("test", &options).is_err());
    }

    #[test]
    fn rejects_empty_gradient() {
        let options = heat_options(&[]);
        assert!(validate_gradient("test", &options).is_err());
    }

    #[test]
    fn parses_the_shipped_example_config() {
        let config: AppConfig =
            toml::from_str(include_str!("../config.toml")).expect("example config must parse");
        config.validate().expect("example config must validate");

        assert_eq!(config.map.element_id, "leaflet-map");
        assert!(config.controls.arrival_heatmap.default_visible);
        assert!(!config.controls.bus_stop_positions.default_visible);
        assert_eq!(config.layers.arrival_heatmap.gradient.len(), 4);
    }
}
