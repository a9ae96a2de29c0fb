use serde::Deserialize;

use crate::types::LatLng;

// Opaque handles into a rendering surface. The surface owns the actual
// objects; handles are only valid for the surface that issued them.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub(crate) u32);

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapOptions {
    pub center: LatLng,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_snap: f64,
    pub zoom_delta: f64,
    pub max_bounds: [LatLng; 2],
    pub wheel_px_per_zoom_level: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IconSpec {
    pub url: String,
    pub size: [u32; 2],
    pub popup_anchor: [i32; 2],
    pub css_class: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StrokeStyle {
    pub color: String,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FillStyle {
    pub color: String,
    pub opacity: f64,
    pub fill_color: String,
    pub fill_opacity: f64,
}

/// One stop of a heatmap gradient: `at` is a normalized intensity threshold
/// in [0, 1]. Stops must be strictly increasing (checked at config load).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GradientStop {
    pub at: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeatOptions {
    pub radius: u32,
    pub blur: u32,
    pub min_opacity: f64,
    pub gradient: Vec<GradientStop>,
}

/// Capability surface of the tiled-map rendering library. The layer builder
/// and toggle controller only ever talk to this trait, so the same code runs
/// against the HTML page emitter and the in-memory test surface.
pub trait MapSurface {
    fn create_map(&mut self, element_id: &str, options: &MapOptions) -> MapId;
    fn add_tile_layer(&mut self, map: MapId, url_template: &str, attribution: &str) -> LayerId;
    fn create_layer_group(&mut self) -> GroupId;
    fn create_marker(&mut self, location: LatLng, icon: &IconSpec) -> LayerId;
    fn create_polyline(&mut self, points: &[LatLng], style: &StrokeStyle) -> LayerId;
    fn create_polygon(&mut self, points: &[LatLng], style: &FillStyle) -> LayerId;
    // Heat layers start empty and are populated point by point.
    fn create_heat_layer(&mut self, options: &HeatOptions) -> LayerId;
    fn add_heat_point(&mut self, layer: LayerId, location: LatLng, weight: f64);
    fn bind_popup(&mut self, layer: LayerId, html: &str);
    fn add_to_group(&mut self, group: GroupId, layer: LayerId);
    fn attach_to_map(&mut self, map: MapId, group: GroupId);
    fn detach_from_map(&mut self, map: MapId, group: GroupId);
    fn has_layer(&self, map: MapId, group: GroupId) -> bool;
}
