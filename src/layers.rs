use crate::config::AppConfig;
use crate::metrics::ArrivalStats;
use crate::surface::{GroupId, LayerId, MapId, MapSurface};
use crate::types::{LayerKind, VisualizationData};

const PARK_RIDE_TOKEN: &str = "P+R";

/// The seven layer groups, addressable by semantic name. Groups are owned by
/// the surface; this struct only holds handles.
#[derive(Debug, Clone)]
pub struct LayerGroups {
    pub bus_stop_positions: GroupId,
    pub stop_density_heatmap: GroupId,
    pub arrival_heatmap: GroupId,
    pub bike_lanes: GroupId,
    pub existing_park_and_ride: GroupId,
    pub proposed_park_and_ride: GroupId,
    pub green_zone: GroupId,
}

impl LayerGroups {
    pub fn get(&self, kind: LayerKind) -> GroupId {
        match kind {
            LayerKind::BusStopPositions => self.bus_stop_positions,
            LayerKind::StopDensityHeatmap => self.stop_density_heatmap,
            LayerKind::ArrivalHeatmap => self.arrival_heatmap,
            LayerKind::BikeLanes => self.bike_lanes,
            LayerKind::ExistingParkAndRide => self.existing_park_and_ride,
            LayerKind::ProposedParkAndRide => self.proposed_park_and_ride,
            LayerKind::GreenZone => self.green_zone,
        }
    }
}

/// Direct handles to the two heat layers. Needed because heat layers are
/// populated point by point after being wrapped in their groups.
#[derive(Debug, Clone)]
pub struct HeatLayers {
    pub stop_density: LayerId,
    pub arrival_weighted: LayerId,
}

/// Output bundle of the layer builder; page-lifetime singleton handed to the
/// toggle controller.
#[derive(Debug, Clone)]
pub struct MapState {
    pub map: MapId,
    pub tiles: LayerId,
    pub groups: LayerGroups,
    pub heatmaps: HeatLayers,
}

/// Transforms the data model into renderable layers, one pass per category.
/// Nothing is attached to the map here except the base tile layer; the toggle
/// controller decides initial visibility.
pub fn build_map<S: MapSurface>(
    surface: &mut S,
    config: &AppConfig,
    data: &VisualizationData,
    stats: &ArrivalStats,
) -> MapState {
    let map = surface.create_map(&config.map.element_id, &config.map.options);
    let tiles = surface.add_tile_layer(map, &config.map.tile_url, &config.map.tile_attribution);

    let groups = LayerGroups {
        bus_stop_positions: surface.create_layer_group(),
        stop_density_heatmap: surface.create_layer_group(),
        arrival_heatmap: surface.create_layer_group(),
        bike_lanes: surface.create_layer_group(),
        existing_park_and_ride: surface.create_layer_group(),
        proposed_park_and_ride: surface.create_layer_group(),
        green_zone: surface.create_layer_group(),
    };

    // Heat layers go into their groups empty, then collect points below.
    let stop_density_heat = surface.create_heat_layer(&config.layers.stop_density_heatmap);
    surface.add_to_group(groups.stop_density_heatmap, stop_density_heat);

    let arrival_heat = surface.create_heat_layer(&config.layers.arrival_heatmap);
    surface.add_to_group(groups.arrival_heatmap, arrival_heat);

    // Bus stops: one marker per stop, plus a point in each heat layer.
    for (index, stop) in data.bus.stops_with_arrivals.iter().enumerate() {
        let marker = surface.create_marker(stop.location, &config.layers.bus_icon);
        surface.bind_popup(marker, &bus_stop_popup(&stop.code.to_string(), &stop.name, stats.daily_total(index)));
        surface.add_to_group(groups.bus_stop_positions, marker);

        surface.add_heat_point(stop_density_heat, stop.location, 1.0);
        surface.add_heat_point(arrival_heat, stop.location, stats.intensity(index));
    }

    // Bike lanes: one polyline per lane, shared stroke style.
    for lane in &data.bike.bike_lanes {
        let polyline = surface.create_polyline(&lane.line_points, &config.layers.bike_lane);
        surface.add_to_group(groups.bike_lanes, polyline);
    }

    // Park and ride: icon and popup wording depend on which collection the
    // entry came from.
    for site in &data.p_plus_r.existing {
        let marker = surface.create_marker(site.location, &config.layers.existing_park_and_ride_icon);
        let name = strip_park_ride_token(&site.name);
        surface.bind_popup(marker, &park_ride_popup("existing", "obstoječi P+R", &name));
        surface.add_to_group(groups.existing_park_and_ride, marker);
    }

    for site in &data.p_plus_r.proposed {
        let marker = surface.create_marker(site.location, &config.layers.proposed_park_and_ride_icon);
        surface.bind_popup(marker, &park_ride_popup("proposed", "predlog za novi P+R", &site.name));
        surface.add_to_group(groups.proposed_park_and_ride, marker);
    }

    // Proposed green zone: a single polygon with the area in its popup.
    let zone = &data.green_zone.green_zone;
    let polygon = surface.create_polygon(&zone.polygon_bounds, &config.layers.green_zone);
    surface.bind_popup(polygon, &green_zone_popup(zone.area_in_square_metres));
    surface.add_to_group(groups.green_zone, polygon);

    MapState {
        map,
        tiles,
        groups,
        heatmaps: HeatLayers {
            stop_density: stop_density_heat,
            arrival_weighted: arrival_heat,
        },
    }
}

fn bus_stop_popup(code: &str, name: &str, daily_total: u32) -> String {
    format!(
        r#"<div class="bus-station-marker">
    <div class="bus-station-marker_top">{code}</div>
    <div class="bus-station-marker_main">Postaja <b>{name}</b></div>
    <div class="bus-station-marker_daily-count">{daily_total} avtobusov na dan</div>
</div>"#
    )
}

fn park_ride_popup(modifier: &str, kind_label: &str, name: &str) -> String {
    format!(
        r#"<div class="par-marker par-marker__{modifier}">
    <div class="par-marker_type">{kind_label}</div>
    <div class="par-marker_name">{name}</div>
</div>"#
    )
}

fn green_zone_popup(area_in_square_metres: f64) -> String {
    let square_kilometres = format!("{:.2}", area_in_square_metres / 1_000_000.0);
    format!(
        r#"<div class="green-zone-marker">
    <div class="green-zone-marker_title">Predlagan zeleni krog</div>
    <div class="green-zone-marker_area">Površina: {square_kilometres} km<sup>2</sup></div>
</div>"#
    )
}

// Existing sites carry a "P+R" token in their display name; drop the first
// occurrence and trim, matching how the names appear in the source data.
fn strip_park_ride_token(name: &str) -> String {
    name.replacen(PARK_RIDE_TOKEN, "", 1).trim().to_string()
}
