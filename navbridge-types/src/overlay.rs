//! Overlay (marker, polygon, polyline, circle) options and id-tagged overlay values.
//!
//! Each overlay kind has an `*Options` struct holding everything the host can set, and a
//! `*Dto` struct pairing the options with the logical id the host assigned to the overlay.
//! Ids are unique within one view.

use serde::{Deserialize, Serialize};

use crate::error::NavbridgeTypesError;
use crate::latlng::LatLng;

/// Anchor point of an image, in fractions of its width (`u`) and height (`v`).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Anchor {
    /// Horizontal fraction, 0 is the left edge.
    pub u: f64,
    /// Vertical fraction, 0 is the top edge.
    pub v: f64,
}

impl Anchor {
    /// Creates a new anchor.
    pub const fn new(u: f64, v: f64) -> Self {
        Self { u, v }
    }
}

/// Info window shown when a marker is tapped.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InfoWindow {
    /// Title line.
    pub title: Option<String>,
    /// Text under the title.
    pub snippet: Option<String>,
    /// Anchor of the window relative to the marker image.
    pub anchor: Anchor,
}

impl Default for InfoWindow {
    fn default() -> Self {
        Self {
            title: None,
            snippet: None,
            anchor: Anchor::new(0.5, 0.0),
        }
    }
}

/// Kind of a registered image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum RegisteredImageType {
    /// Custom bitmap uploaded by the host.
    #[default]
    Regular,
    /// Maneuver icon generated from turn-by-turn data.
    Maneuver,
    /// Lane guidance image generated from turn-by-turn data.
    Lane,
}

/// Reference to an image in the image registry.
///
/// A descriptor without `registered_image_id` stands for the default marker icon.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ImageDescriptor {
    /// Id of the registered image.
    pub registered_image_id: Option<String>,
    /// Pixel ratio the image was registered with.
    pub image_pixel_ratio: f64,
    /// Explicit logical width.
    pub width: Option<f64>,
    /// Explicit logical height.
    pub height: Option<f64>,
    /// Kind of the image.
    pub image_type: RegisteredImageType,
}

impl ImageDescriptor {
    /// Descriptor of the default icon.
    pub fn default_icon() -> Self {
        Self {
            registered_image_id: None,
            image_pixel_ratio: 1.0,
            width: None,
            height: None,
            image_type: RegisteredImageType::Regular,
        }
    }

    /// Descriptor for a registered image.
    pub fn registered(
        id: impl Into<String>,
        image_pixel_ratio: f64,
        width: Option<f64>,
        height: Option<f64>,
        image_type: RegisteredImageType,
    ) -> Result<Self, NavbridgeTypesError> {
        if !(image_pixel_ratio.is_finite() && image_pixel_ratio > 0.0) {
            return Err(NavbridgeTypesError::InvalidPixelRatio(image_pixel_ratio));
        }

        Ok(Self {
            registered_image_id: Some(id.into()),
            image_pixel_ratio,
            width,
            height,
            image_type,
        })
    }
}

impl Default for ImageDescriptor {
    fn default() -> Self {
        Self::default_icon()
    }
}

/// Marker options.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MarkerOptions {
    /// Position of the anchor point.
    pub position: LatLng,
    /// Opacity in `0.0..=1.0`.
    pub alpha: f64,
    /// Point of the icon placed at `position`.
    pub anchor: Anchor,
    /// The marker can be dragged by the user.
    pub draggable: bool,
    /// The icon is flat on the map surface.
    pub flat: bool,
    /// If true, the native default tap behaviour (camera move and info window) is suppressed.
    pub consume_tap_events: bool,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Info window shown on tap.
    pub info_window: InfoWindow,
    /// Visibility.
    pub visible: bool,
    /// Draw order.
    pub z_index: f64,
    /// Icon, the default marker icon if not registered.
    pub icon: ImageDescriptor,
    /// Cluster manager the marker belongs to. Unknown managers are ignored and the marker
    /// is shown on its own.
    pub cluster_manager_id: Option<String>,
}

impl Default for MarkerOptions {
    fn default() -> Self {
        Self {
            position: LatLng::default(),
            alpha: 1.0,
            anchor: Anchor::new(0.5, 1.0),
            draggable: false,
            flat: false,
            consume_tap_events: false,
            rotation: 0.0,
            info_window: InfoWindow::default(),
            visible: true,
            z_index: 0.0,
            icon: ImageDescriptor::default_icon(),
            cluster_manager_id: None,
        }
    }
}

/// Marker with its logical id.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MarkerDto {
    /// Logical marker id assigned by the host.
    pub marker_id: String,
    /// Marker options.
    pub options: MarkerOptions,
}

impl MarkerDto {
    /// Creates a new marker value.
    pub fn new(marker_id: impl Into<String>, options: MarkerOptions) -> Self {
        Self {
            marker_id: marker_id.into(),
            options,
        }
    }
}

/// Joint type of polyline segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum StrokeJointType {
    /// Sharp joints.
    #[default]
    Mitered,
    /// Flattened joints.
    Bevel,
    /// Rounded joints.
    Round,
}

/// Polygon options. Colors are ARGB.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PolygonOptions {
    /// Outer ring.
    pub points: Vec<LatLng>,
    /// Inner rings.
    pub holes: Vec<Vec<LatLng>>,
    /// Report clicks.
    pub clickable: bool,
    /// Fill color.
    pub fill_color: u32,
    /// Draw edges as geodesics.
    pub geodesic: bool,
    /// Stroke color.
    pub stroke_color: u32,
    /// Stroke width in pixels.
    pub stroke_width: f64,
    /// Visibility.
    pub visible: bool,
    /// Draw order.
    pub z_index: f64,
}

impl Default for PolygonOptions {
    fn default() -> Self {
        Self {
            points: vec![],
            holes: vec![],
            clickable: false,
            fill_color: 0xFF00_0000,
            geodesic: false,
            stroke_color: 0xFF00_0000,
            stroke_width: 10.0,
            visible: true,
            z_index: 0.0,
        }
    }
}

/// Polygon with its logical id.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PolygonDto {
    /// Logical polygon id assigned by the host.
    pub polygon_id: String,
    /// Polygon options.
    pub options: PolygonOptions,
}

impl PolygonDto {
    /// Creates a new polygon value.
    pub fn new(polygon_id: impl Into<String>, options: PolygonOptions) -> Self {
        Self {
            polygon_id: polygon_id.into(),
            options,
        }
    }
}

/// Polyline options. Colors are ARGB.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PolylineOptions {
    /// Vertices.
    pub points: Vec<LatLng>,
    /// Report clicks.
    pub clickable: bool,
    /// Draw segments as geodesics.
    pub geodesic: bool,
    /// Stroke color.
    pub stroke_color: u32,
    /// Joint type.
    pub stroke_joint_type: StrokeJointType,
    /// Stroke width in pixels.
    pub stroke_width: f64,
    /// Visibility.
    pub visible: bool,
    /// Draw order.
    pub z_index: f64,
}

impl Default for PolylineOptions {
    fn default() -> Self {
        Self {
            points: vec![],
            clickable: false,
            geodesic: false,
            stroke_color: 0xFF00_0000,
            stroke_joint_type: StrokeJointType::Mitered,
            stroke_width: 10.0,
            visible: true,
            z_index: 0.0,
        }
    }
}

/// Polyline with its logical id.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PolylineDto {
    /// Logical polyline id assigned by the host.
    pub polyline_id: String,
    /// Polyline options.
    pub options: PolylineOptions,
}

impl PolylineDto {
    /// Creates a new polyline value.
    pub fn new(polyline_id: impl Into<String>, options: PolylineOptions) -> Self {
        Self {
            polyline_id: polyline_id.into(),
            options,
        }
    }
}

/// Circle options. Colors are ARGB, radius is in meters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CircleOptions {
    /// Center.
    pub center: LatLng,
    /// Radius in meters.
    pub radius: f64,
    /// Report clicks.
    pub clickable: bool,
    /// Fill color.
    pub fill_color: u32,
    /// Stroke color.
    pub stroke_color: u32,
    /// Stroke width in pixels.
    pub stroke_width: f64,
    /// Visibility.
    pub visible: bool,
    /// Draw order.
    pub z_index: f64,
}

impl Default for CircleOptions {
    fn default() -> Self {
        Self {
            center: LatLng::default(),
            radius: 0.0,
            clickable: false,
            fill_color: 0x0000_0000,
            stroke_color: 0xFF00_0000,
            stroke_width: 10.0,
            visible: true,
            z_index: 0.0,
        }
    }
}

/// Circle with its logical id.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CircleDto {
    /// Logical circle id assigned by the host.
    pub circle_id: String,
    /// Circle options.
    pub options: CircleOptions,
}

impl CircleDto {
    /// Creates a new circle value.
    pub fn new(circle_id: impl Into<String>, options: CircleOptions) -> Self {
        Self {
            circle_id: circle_id.into(),
            options,
        }
    }
}

/// A group of clustered markers as reported to the host.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClusterDto {
    /// Manager that produced the cluster.
    pub cluster_manager_id: String,
    /// Centroid of the cluster.
    pub position: LatLng,
    /// Logical ids of the clustered markers.
    pub marker_ids: Vec<String>,
}
