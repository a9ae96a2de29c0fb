use anyhow::{Context, Result};
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::controls::{ControlHost, ControlId};
use crate::layers::MapState;
use crate::surface::{
    FillStyle, GroupId, HeatOptions, IconSpec, LayerId, MapId, MapOptions, MapSurface, StrokeStyle,
};
use crate::types::{LatLng, LayerKind};

const LEAFLET_CSS_URL: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS_URL: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const LEAFLET_HEAT_JS_URL: &str = "https://unpkg.com/leaflet.heat@0.2.0/dist/leaflet-heat.js";

/// Records every drawing operation and replays them as the inline script of a
/// self-contained Leaflet page. Attach/detach are tracked as net state, so
/// the emitted page starts with exactly the default-visible groups on the
/// map.
#[derive(Debug, Default)]
pub struct PageSurface {
    next_id: u32,
    icons: Vec<IconSpec>,
    ops: Vec<Op>,
    heat_points: HashMap<u32, Vec<(LatLng, f64)>>,
    attached: BTreeSet<(u32, u32)>,
}

#[derive(Debug)]
enum Op {
    CreateMap {
        element_id: String,
        options: MapOptions,
    },
    TileLayer {
        id: u32,
        url: String,
        attribution: String,
    },
    Group {
        id: u32,
    },
    Marker {
        id: u32,
        location: LatLng,
        icon_index: usize,
    },
    Polyline {
        id: u32,
        points: Vec<LatLng>,
        style: StrokeStyle,
    },
    Polygon {
        id: u32,
        points: Vec<LatLng>,
        style: FillStyle,
    },
    HeatLayer {
        id: u32,
        options: HeatOptions,
    },
    Popup {
        target: u32,
        html: String,
    },
    AddToGroup {
        group: u32,
        layer: u32,
    },
}

impl PageSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn icon_index(&mut self, icon: &IconSpec) -> usize {
        if let Some(index) = self.icons.iter().position(|known| known == icon) {
            return index;
        }
        self.icons.push(icon.clone());
        self.icons.len() - 1
    }
}

impl MapSurface for PageSurface {
    fn create_map(&mut self, element_id: &str, options: &MapOptions) -> MapId {
        let id = self.next();
        self.ops.push(Op::CreateMap {
            element_id: element_id.to_string(),
            options: options.clone(),
        });
        MapId(id)
    }

    fn add_tile_layer(&mut self, _map: MapId, url_template: &str, attribution: &str) -> LayerId {
        let id = self.next();
        self.ops.push(Op::TileLayer {
            id,
            url: url_template.to_string(),
            attribution: attribution.to_string(),
        });
        LayerId(id)
    }

    fn create_layer_group(&mut self) -> GroupId {
        let id = self.next();
        self.ops.push(Op::Group { id });
        GroupId(id)
    }

    fn create_marker(&mut self, location: LatLng, icon: &IconSpec) -> LayerId {
        let icon_index = self.icon_index(icon);
        let id = self.next();
        self.ops.push(Op::Marker {
            id,
            location,
            icon_index,
        });
        LayerId(id)
    }

    fn create_polyline(&mut self, points: &[LatLng], style: &StrokeStyle) -> LayerId {
        let id = self.next();
        self.ops.push(Op::Polyline {
            id,
            points: points.to_vec(),
            style: style.clone(),
        });
        LayerId(id)
    }

    fn create_polygon(&mut self, points: &[LatLng], style: &FillStyle) -> LayerId {
        let id = self.next();
        self.ops.push(Op::Polygon {
            id,
            points: points.to_vec(),
            style: style.clone(),
        });
        LayerId(id)
    }

    fn create_heat_layer(&mut self, options: &HeatOptions) -> LayerId {
        let id = self.next();
        self.ops.push(Op::HeatLayer {
            id,
            options: options.clone(),
        });
        self.heat_points.insert(id, Vec::new());
        LayerId(id)
    }

    fn add_heat_point(&mut self, layer: LayerId, location: LatLng, weight: f64) {
        self.heat_points
            .entry(layer.0)
            .or_default()
            .push((location, weight));
    }

    fn bind_popup(&mut self, layer: LayerId, html: &str) {
        self.ops.push(Op::Popup {
            target: layer.0,
            html: html.to_string(),
        });
    }

    fn add_to_group(&mut self, group: GroupId, layer: LayerId) {
        self.ops.push(Op::AddToGroup {
            group: group.0,
            layer: layer.0,
        });
    }

    fn attach_to_map(&mut self, map: MapId, group: GroupId) {
        self.attached.insert((map.0, group.0));
    }

    fn detach_from_map(&mut self, map: MapId, group: GroupId) {
        self.attached.remove(&(map.0, group.0));
    }

    fn has_layer(&self, map: MapId, group: GroupId) -> bool {
        self.attached.contains(&(map.0, group.0))
    }
}

/// The checkbox side of the generated page. The binder's lookups materialize
/// the controls, so every checkbox the controller asked for is guaranteed to
/// exist in the emitted document.
#[derive(Debug, Default)]
pub struct PageControls {
    controls: Vec<PageControl>,
}

#[derive(Debug)]
struct PageControl {
    element_id: String,
    checked: bool,
}

impl PageControls {
    pub fn new() -> Self {
        Self::default()
    }

    fn checked(&self, element_id: &str) -> bool {
        self.controls
            .iter()
            .find(|control| control.element_id == element_id)
            .map(|control| control.checked)
            .unwrap_or(false)
    }
}

impl ControlHost for PageControls {
    fn find_checkbox(&mut self, element_id: &str) -> Result<ControlId> {
        if let Some(index) = self
            .controls
            .iter()
            .position(|control| control.element_id == element_id)
        {
            return Ok(ControlId(index as u32));
        }
        self.controls.push(PageControl {
            element_id: element_id.to_string(),
            checked: false,
        });
        Ok(ControlId((self.controls.len() - 1) as u32))
    }

    fn set_checked(&mut self, control: ControlId, checked: bool) {
        self.controls[control.0 as usize].checked = checked;
    }

    fn is_checked(&self, control: ControlId) -> bool {
        self.controls[control.0 as usize].checked
    }
}

/// Renders the page and writes it to `<site_dir>/index.html`.
pub fn write_site(
    config: &AppConfig,
    surface: &PageSurface,
    controls: &PageControls,
    state: &MapState,
) -> Result<PathBuf> {
    fs::create_dir_all(&config.output.site_dir).with_context(|| {
        format!(
            "Failed to create site directory: {:?}",
            config.output.site_dir
        )
    })?;

    let html = render_page(config, surface, controls, state);
    let path = config.output.site_dir.join("index.html");
    fs::write(&path, html).with_context(|| format!("Failed to write page: {:?}", path))?;

    Ok(path)
}

pub fn render_page(
    config: &AppConfig,
    surface: &PageSurface,
    controls: &PageControls,
    state: &MapState,
) -> String {
    let mut page = String::new();

    let _ = write!(
        page,
        r#"<!doctype html>
<html lang="sl">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Zemljevid javnega prometa</title>
<link rel="stylesheet" href="{LEAFLET_CSS_URL}">
<script src="{LEAFLET_JS_URL}"></script>
<script src="{LEAFLET_HEAT_JS_URL}"></script>
<style>
html, body {{ margin: 0; height: 100%; }}
#{map_element} {{ position: absolute; inset: 0; }}
.map-controls {{
    position: absolute; top: 12px; right: 12px; z-index: 1000;
    background: rgba(255, 255, 255, 0.92); border-radius: 6px;
    padding: 10px 14px; font-family: sans-serif; font-size: 14px;
}}
.map-controls label {{ display: block; margin: 4px 0; }}
</style>
</head>
<body>
<div id="{map_element}"></div>
<div class="map-controls">
"#,
        map_element = config.map.element_id,
    );

    for kind in LayerKind::ALL {
        let control = config.controls.get(kind);
        let checked = if controls.checked(&control.element_id) {
            " checked"
        } else {
            ""
        };
        let _ = writeln!(
            page,
            r#"    <label><input type="checkbox" id="{}"{}> {}</label>"#,
            control.element_id, checked, control.label
        );
    }

    page.push_str("</div>\n<script>\n");
    page.push_str(&render_script(config, surface, state));
    page.push_str("</script>\n</body>\n</html>\n");

    page
}

fn render_script(config: &AppConfig, surface: &PageSurface, state: &MapState) -> String {
    let mut script = String::new();
    let map_var = format!("map{}", state.map.0);

    for (index, icon) in surface.icons.iter().enumerate() {
        let _ = writeln!(
            script,
            "const icon{index} = L.icon({{ iconUrl: {url}, iconSize: {size}, popupAnchor: {anchor}, className: {class} }});",
            url = js_string(&icon.url),
            size = format_args!("[{}, {}]", icon.size[0], icon.size[1]),
            anchor = format_args!("[{}, {}]", icon.popup_anchor[0], icon.popup_anchor[1]),
            class = js_string(&icon.css_class),
        );
    }

    for op in &surface.ops {
        match op {
            Op::CreateMap {
                element_id,
                options,
            } => {
                let _ = writeln!(
                    script,
                    "const {map_var} = L.map({id}, {options});",
                    id = js_string(element_id),
                    options = js_map_options(options),
                );
            }
            Op::TileLayer {
                id,
                url,
                attribution,
            } => {
                let _ = writeln!(
                    script,
                    "const layer{id} = L.tileLayer({url}, {{ attribution: {attribution} }});\nlayer{id}.addTo({map_var});",
                    url = js_string(url),
                    attribution = js_string(attribution),
                );
            }
            Op::Group { id } => {
                let _ = writeln!(script, "const group{id} = L.layerGroup();");
            }
            Op::Marker {
                id,
                location,
                icon_index,
            } => {
                let _ = writeln!(
                    script,
                    "const layer{id} = L.marker({at}, {{ icon: icon{icon_index} }});",
                    at = js_latlng(location),
                );
            }
            Op::Polyline { id, points, style } => {
                let _ = writeln!(
                    script,
                    "const layer{id} = L.polyline({points}, {{ color: {color}, opacity: {opacity} }});",
                    points = js_latlng_array(points),
                    color = js_string(&style.color),
                    opacity = style.opacity,
                );
            }
            Op::Polygon { id, points, style } => {
                let _ = writeln!(
                    script,
                    "const layer{id} = L.polygon({points}, {{ color: {color}, opacity: {opacity}, fillColor: {fill_color}, fillOpacity: {fill_opacity} }});",
                    points = js_latlng_array(points),
                    color = js_string(&style.color),
                    opacity = style.opacity,
                    fill_color = js_string(&style.fill_color),
                    fill_opacity = style.fill_opacity,
                );
            }
            Op::HeatLayer { id, options } => {
                let points = surface
                    .heat_points
                    .get(id)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                let _ = writeln!(
                    script,
                    "const layer{id} = L.heatLayer({points}, {options});",
                    points = js_heat_points(points),
                    options = js_heat_options(options),
                );
            }
            Op::Popup { target, html } => {
                let _ = writeln!(script, "layer{target}.bindPopup({});", js_string(html));
            }
            Op::AddToGroup { group, layer } => {
                let _ = writeln!(script, "layer{layer}.addTo(group{group});");
            }
        }
    }

    // Net attachment state after the toggle controller applied the defaults.
    for (map, group) in &surface.attached {
        let _ = writeln!(script, "group{group}.addTo(map{map});");
    }

    let _ = write!(
        script,
        r#"
function requireElement(elementId) {{
    const element = document.getElementById(elementId);
    if (element === null) {{
        throw new Error("Element with id " + elementId + " not found");
    }}
    return element;
}}

function bindLayerToggle(checkboxElement, layerGroup) {{
    function applyVisibility(visible) {{
        if (visible) {{
            if (!{map_var}.hasLayer(layerGroup)) {{
                layerGroup.addTo({map_var});
            }}
        }} else {{
            if ({map_var}.hasLayer(layerGroup)) {{
                layerGroup.removeFrom({map_var});
            }}
        }}
    }}

    checkboxElement.addEventListener("click", () => {{
        applyVisibility(checkboxElement.checked);
    }});

    applyVisibility(checkboxElement.checked);
}}

"#
    );

    for kind in LayerKind::ALL {
        let control = config.controls.get(kind);
        let group = state.groups.get(kind);
        let _ = writeln!(
            script,
            "bindLayerToggle(requireElement({id}), group{group});",
            id = js_string(&control.element_id),
            group = group.0,
        );
    }

    script
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn js_latlng(location: &LatLng) -> String {
    format!("[{}, {}]", location.lat(), location.lon())
}

fn js_latlng_array(points: &[LatLng]) -> String {
    let inner: Vec<String> = points.iter().map(js_latlng).collect();
    format!("[{}]", inner.join(", "))
}

fn js_heat_points(points: &[(LatLng, f64)]) -> String {
    let inner: Vec<String> = points
        .iter()
        .map(|(location, weight)| format!("[{}, {}, {}]", location.lat(), location.lon(), weight))
        .collect();
    format!("[{}]", inner.join(", "))
}

fn js_map_options(options: &MapOptions) -> String {
    format!(
        "{{ minZoom: {}, zoom: {}, maxZoom: {}, zoomDelta: {}, zoomSnap: {}, center: {}, maxBounds: {}, wheelPxPerZoomLevel: {} }}",
        options.min_zoom,
        options.zoom,
        options.max_zoom,
        options.zoom_delta,
        options.zoom_snap,
        js_latlng(&options.center),
        js_latlng_array(&options.max_bounds),
        options.wheel_px_per_zoom_level,
    )
}

fn js_heat_options(options: &HeatOptions) -> String {
    let gradient: Vec<String> = options
        .gradient
        .iter()
        .map(|stop| format!("{}: {}", js_string(&stop.at.to_string()), js_string(&stop.color)))
        .collect();
    format!(
        "{{ radius: {}, blur: {}, minOpacity: {}, gradient: {{ {} }} }}",
        options.radius,
        options.blur,
        options.min_opacity,
        gradient.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::ToggleController;
    use crate::layers::build_map;
    use crate::layers::tests::{test_config, test_data};
    use crate::metrics::ArrivalStats;

    fn rendered_page() -> String {
        let config = test_config();
        let data = test_data();
        let stats = ArrivalStats::compute(&data.bus.stops_with_arrivals);

        let mut surface = PageSurface::new();
        let state = build_map(&mut surface, &config, &data, &stats);

        let mut controls = PageControls::new();
        ToggleController::bind(&mut controls, &mut surface, &state, &config.controls)
            .expect("binding against the page host cannot fail");

        render_page(&config, &surface, &controls, &state)
    }

    #[test]
    fn page_contains_all_seven_checkboxes_with_defaults() {
        let page = rendered_page();

        assert!(page.contains(r#"id="control_bus_station-positions">"#));
        assert!(page.contains(r#"id="control_bus_arrival-heatmap" checked>"#));
        assert!(page.contains(r#"id="control_green-zone" checked>"#));
        assert!(page.contains(r#"id="control_bike_lanes">"#));
    }

    #[test]
    fn default_visible_groups_are_attached_in_the_script() {
        let config = test_config();
        let data = test_data();
        let stats = ArrivalStats::compute(&data.bus.stops_with_arrivals);

        let mut surface = PageSurface::new();
        let state = build_map(&mut surface, &config, &data, &stats);
        let mut controls = PageControls::new();
        ToggleController::bind(&mut controls, &mut surface, &state, &config.controls).unwrap();

        let page = render_page(&config, &surface, &controls, &state);

        let green_zone = state.groups.green_zone.0;
        let bike_lanes = state.groups.bike_lanes.0;
        assert!(page.contains(&format!("group{}.addTo(map{});", green_zone, state.map.0)));
        assert!(!page.contains(&format!("group{}.addTo(map{});", bike_lanes, state.map.0)));
        // The base tile layer is always on the map, independent of toggles.
        assert!(page.contains(&format!("layer{}.addTo(map{});", state.tiles.0, state.map.0)));
    }

    #[test]
    fn toggle_wiring_keeps_the_has_layer_guard() {
        let page = rendered_page();
        assert!(page.contains("hasLayer"));
        assert!(page.contains("bindLayerToggle(requireElement(\"control_green-zone\")"));
    }

    #[test]
    fn heat_layers_carry_points_and_gradient() {
        let page = rendered_page();
        assert!(page.contains("L.heatLayer"));
        assert!(page.contains(r#""0.25": "rgb(255,28,62)""#));
        // One stop at full intensity, one at a quarter.
        assert!(page.contains("[46.05, 14.51, 1]"));
        assert!(page.contains("[46.05, 14.51, 0.25]"));
    }

    #[test]
    fn popups_are_emitted_as_escaped_js_strings() {
        let page = rendered_page();
        assert!(page.contains(r#"Postaja <b>Bavarski dvor</b>"#));
        assert!(page.contains("bindPopup(\"<div class=\\\"bus-station-marker\\\">"));
    }
}
