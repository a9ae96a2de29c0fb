use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

use crate::types::{VisualizationData, HOURS_PER_DAY};

/// Loads and parses the pre-baked visualization payload. Any failure here
/// aborts startup: there is no retry and no partial-success handling.
pub fn load_visualization_data(path: &Path) -> Result<VisualizationData> {
    println!("Loading visualization data from {:?}...", path);

    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read visualization data file: {:?}", path))?;
    let data: VisualizationData = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse visualization JSON: {:?}", path))?;

    validate(&data)?;

    println!(
        "Loaded {} bus stops, {} bike lanes, {} existing + {} proposed P+R sites",
        data.bus.stops_with_arrivals.len(),
        data.bike.bike_lanes.len(),
        data.p_plus_r.existing.len(),
        data.p_plus_r.proposed.len(),
    );

    Ok(data)
}

// The payload is pre-baked and trusted, but its shape invariants are checked
// so a stale or truncated export fails loudly instead of rendering nonsense.
fn validate(data: &VisualizationData) -> Result<()> {
    for stop in &data.bus.stops_with_arrivals {
        if stop.arrivals_per_hour.len() != HOURS_PER_DAY {
            return Err(anyhow!(
                "Bus stop '{}' has {} hourly arrival counts, expected {}",
                stop.id,
                stop.arrivals_per_hour.len(),
                HOURS_PER_DAY
            ));
        }
    }

    for (index, lane) in data.bike.bike_lanes.iter().enumerate() {
        if lane.line_points.len() < 2 {
            return Err(anyhow!(
                "Bike lane at index {} has {} points, a path needs at least two",
                index,
                lane.line_points.len()
            ));
        }
    }

    let zone = &data.green_zone.green_zone;
    if zone.polygon_bounds.len() < 3 {
        return Err(anyhow!(
            "Green zone boundary has {} points, a polygon needs at least three",
            zone.polygon_bounds.len()
        ));
    }

    Ok(())
}
