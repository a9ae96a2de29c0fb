use serde::Deserialize;

/// Geographic coordinate as `[latitude, longitude]`, matching the order used
/// in the visualization JSON payload.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LatLng(pub f64, pub f64);

impl LatLng {
    pub fn lat(&self) -> f64 {
        self.0
    }

    pub fn lon(&self) -> f64 {
        self.1
    }
}

/// Fixed reporting granularity of the arrival schedules: one count per hour,
/// one day.
pub const HOURS_PER_DAY: usize = 24;

#[derive(Debug, Clone, Deserialize)]
pub struct BusStop {
    pub id: String,
    pub code: u32,
    pub name: String,
    pub location: LatLng,
    // Invariant (checked at load): exactly HOURS_PER_DAY entries.
    pub arrivals_per_hour: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BikeLane {
    // Invariant (checked at load): at least two points.
    pub line_points: Vec<LatLng>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParkAndRide {
    pub name: String,
    pub location: LatLng,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GreenZone {
    // Invariant (checked at load): at least three boundary points.
    pub polygon_bounds: Vec<LatLng>,
    pub area_in_square_metres: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusData {
    pub stops_with_arrivals: Vec<BusStop>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BikeData {
    pub bike_lanes: Vec<BikeLane>,
    pub total_length_in_metres: f64,
}

// Existing vs proposed is collection membership, not a field on the entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ParkAndRideData {
    pub existing: Vec<ParkAndRide>,
    pub proposed: Vec<ParkAndRide>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GreenZoneData {
    pub green_zone: GreenZone,
}

/// Aggregate root of the payload. Constructed once at startup and never
/// mutated afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct VisualizationData {
    pub bus: BusData,
    pub bike: BikeData,
    pub p_plus_r: ParkAndRideData,
    pub green_zone: GreenZoneData,
}

/// Semantic names of the seven toggleable layer groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    BusStopPositions,
    StopDensityHeatmap,
    ArrivalHeatmap,
    BikeLanes,
    ExistingParkAndRide,
    ProposedParkAndRide,
    GreenZone,
}

impl LayerKind {
    pub const ALL: [LayerKind; 7] = [
        LayerKind::BusStopPositions,
        LayerKind::StopDensityHeatmap,
        LayerKind::ArrivalHeatmap,
        LayerKind::BikeLanes,
        LayerKind::ExistingParkAndRide,
        LayerKind::ProposedParkAndRide,
        LayerKind::GreenZone,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LayerKind::BusStopPositions => "bus-stop-positions",
            LayerKind::StopDensityHeatmap => "stop-density-heatmap",
            LayerKind::ArrivalHeatmap => "arrival-heatmap",
            LayerKind::BikeLanes => "bike-lanes",
            LayerKind::ExistingParkAndRide => "existing-park-and-ride",
            LayerKind::ProposedParkAndRide => "proposed-park-and-ride",
            LayerKind::GreenZone => "green-zone",
        }
    }
}
