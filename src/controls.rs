use anyhow::{Context, Result};

use crate::config::ControlsConfig;
use crate::layers::MapState;
use crate::surface::{GroupId, MapId, MapSurface};
use crate::types::LayerKind;

/// Handle to a boolean UI control owned by a [`ControlHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId(pub(crate) u32);

/// The checkbox side of the UI. A missing element is a fatal startup error,
/// surfaced from `find_checkbox`.
pub trait ControlHost {
    fn find_checkbox(&mut self, element_id: &str) -> Result<ControlId>;
    fn set_checked(&mut self, control: ControlId, checked: bool);
    fn is_checked(&self, control: ControlId) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Attached,
    Detached,
}

/// Attach/detach state machine for one layer group. Show when already
/// attached and Hide when already detached are no-ops, so repeated clicks
/// never duplicate a layer.
#[derive(Debug)]
pub struct LayerToggle {
    group: GroupId,
    state: Visibility,
}

impl LayerToggle {
    pub fn new(group: GroupId) -> Self {
        // Groups start life off-map; the builder never attaches them.
        LayerToggle {
            group,
            state: Visibility::Detached,
        }
    }

    pub fn state(&self) -> Visibility {
        self.state
    }

    pub fn set_visible<S: MapSurface>(&mut self, surface: &mut S, map: MapId, visible: bool) {
        if visible {
            self.show(surface, map);
        } else {
            self.hide(surface, map);
        }
    }

    fn show<S: MapSurface>(&mut self, surface: &mut S, map: MapId) {
        if self.state == Visibility::Attached {
            return;
        }
        if !surface.has_layer(map, self.group) {
            surface.attach_to_map(map, self.group);
        }
        self.state = Visibility::Attached;
    }

    fn hide<S: MapSurface>(&mut self, surface: &mut S, map: MapId) {
        if self.state == Visibility::Detached {
            return;
        }
        if surface.has_layer(map, self.group) {
            surface.detach_from_map(map, self.group);
        }
        self.state = Visibility::Detached;
    }
}

#[derive(Debug)]
struct ControlBinding {
    kind: LayerKind,
    control: ControlId,
    toggle: LayerToggle,
}

/// Binds each of the seven checkboxes to exactly one layer group: looks the
/// control up by its configured element id, seeds it with the default checked
/// state, applies that default to the group immediately, and from then on
/// maps every click onto a Show/Hide transition.
#[derive(Debug)]
pub struct ToggleController {
    map: MapId,
    bindings: Vec<ControlBinding>,
}

impl ToggleController {
    pub fn bind<H: ControlHost, S: MapSurface>(
        host: &mut H,
        surface: &mut S,
        state: &MapState,
        controls: &ControlsConfig,
    ) -> Result<Self> {
        let mut bindings = Vec::with_capacity(LayerKind::ALL.len());

        for kind in LayerKind::ALL {
            let control_config = controls.get(kind);
            let control = host
                .find_checkbox(&control_config.element_id)
                .with_context(|| format!("Failed to bind the {} toggle", kind.name()))?;

            host.set_checked(control, control_config.default_visible);

            let mut toggle = LayerToggle::new(state.groups.get(kind));
            toggle.set_visible(surface, state.map, control_config.default_visible);

            bindings.push(ControlBinding {
                kind,
                control,
                toggle,
            });
        }

        Ok(ToggleController {
            map: state.map,
            bindings,
        })
    }

    /// Applies the control's current checked state to its layer group.
    pub fn handle_toggle<H: ControlHost, S: MapSurface>(
        &mut self,
        host: &H,
        surface: &mut S,
        control: ControlId,
    ) {
        for binding in &mut self.bindings {
            if binding.control == control {
                binding
                    .toggle
                    .set_visible(surface, self.map, host.is_checked(control));
            }
        }
    }

    pub fn control_for(&self, kind: LayerKind) -> Option<ControlId> {
        self.bindings
            .iter()
            .find(|binding| binding.kind == kind)
            .map(|binding| binding.control)
    }

    pub fn visibility(&self, kind: LayerKind) -> Option<Visibility> {
        self.bindings
            .iter()
            .find(|binding| binding.kind == kind)
            .map(|binding| binding.toggle.state())
    }
}
