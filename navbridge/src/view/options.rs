use navbridge_types::{CameraPosition, MapPadding};

use crate::error::BridgeError;
use crate::native::MapType;

/// Kind of a view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ViewKind {
    /// Plain map without navigation UI.
    #[default]
    Map,
    /// Map hosting the navigation UI. Can be attached to the navigation session.
    Navigation,
}

/// Whether the navigation UI is turned on when a session is attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NavigationUiPreference {
    /// Enabled as soon as the view has a navigator.
    #[default]
    Automatic,
    /// Stays disabled until the host enables it.
    Disabled,
}

/// Creation parameters of a view.
///
/// ```
/// use navbridge::view::{MapOptions, ViewKind};
///
/// let options = MapOptions::default()
///     .with_kind(ViewKind::Navigation)
///     .with_zoom_preferences(Some(3.0), Some(18.0));
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapOptions {
    /// Kind of the view.
    pub kind: ViewKind,
    /// Camera applied once the surface is ready.
    pub initial_camera: Option<CameraPosition>,
    /// Minimum zoom preference applied once the surface is ready.
    pub min_zoom_preference: Option<f64>,
    /// Maximum zoom preference applied once the surface is ready.
    pub max_zoom_preference: Option<f64>,
    /// Map padding applied once the surface is ready.
    pub padding: Option<MapPadding>,
    /// Map type applied once the surface is ready.
    pub map_type: Option<MapType>,
    /// Navigation UI behavior. Ignored for plain map views.
    pub navigation_ui: NavigationUiPreference,
}

impl MapOptions {
    /// Sets the view kind.
    pub fn with_kind(mut self, kind: ViewKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the initial camera.
    pub fn with_initial_camera(mut self, camera: CameraPosition) -> Self {
        self.initial_camera = Some(camera);
        self
    }

    /// Sets the zoom preferences.
    pub fn with_zoom_preferences(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_zoom_preference = min;
        self.max_zoom_preference = max;
        self
    }

    /// Sets the map padding.
    pub fn with_padding(mut self, padding: MapPadding) -> Self {
        self.padding = Some(padding);
        self
    }

    /// Sets the map type.
    pub fn with_map_type(mut self, map_type: MapType) -> Self {
        self.map_type = Some(map_type);
        self
    }

    /// Sets the navigation UI preference.
    pub fn with_navigation_ui(mut self, preference: NavigationUiPreference) -> Self {
        self.navigation_ui = preference;
        self
    }

    /// Checks that the zoom preferences are consistent.
    pub fn validate(&self) -> Result<(), BridgeError> {
        match (self.min_zoom_preference, self.max_zoom_preference) {
            (Some(min), Some(max)) if min > max => {
                Err(BridgeError::MinZoomGreaterThanMaxZoom { min, max })
            }
            _ => Ok(()),
        }
    }
}
