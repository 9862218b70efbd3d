use maybe_sync::{MaybeSend, MaybeSync};
use navbridge_types::LatLng;

use super::map::NativeMarkerOptions;
use super::OverlayHandle;

/// A cluster as computed by the native clustering algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeCluster {
    /// Centroid of the cluster.
    pub position: LatLng,
    /// Ids of the items in the cluster.
    pub item_ids: Vec<String>,
}

/// Native clustering algorithm and renderer pair bound to one surface.
///
/// Items are identified by the logical marker id. The spatial grouping is entirely up to the
/// engine.
pub trait ClusterEngine: MaybeSend + MaybeSync {
    /// Adds an item.
    fn add_item(&self, item_id: &str, position: LatLng);
    /// Removes an item.
    fn remove_item(&self, item_id: &str);
    /// Removes all items.
    fn clear_items(&self);
    /// Recomputes clusters and re-renders glyphs and singleton markers. Calls back into
    /// [`ClusterRenderHooks`].
    fn cluster(&self);
    /// Clusters for the given zoom level.
    fn clusters(&self, zoom: f64) -> Vec<NativeCluster>;
}

/// Callbacks a [`ClusterEngine`] uses while rendering and on taps.
pub trait ClusterRenderHooks: MaybeSend + MaybeSync {
    /// Options for a singleton marker about to be materialized. `None` if the item is unknown.
    fn before_item_rendered(&self, item_id: &str) -> Option<NativeMarkerOptions>;
    /// A singleton marker was materialized with the given native handle.
    fn on_item_rendered(&self, item_id: &str, marker: OverlayHandle);
    /// A cluster glyph was tapped. Returns true to suppress the default behaviour.
    fn on_cluster_click(&self, cluster: &NativeCluster) -> bool;
}
