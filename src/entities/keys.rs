//! Attribute key constants for Attrs access.
//!
//! Keys are the lower-case storage form; markup may use any casing
//! (`toName`, `fillColor`, ...).
//! Usage: `entity.attrs().get_str(A_TO_NAME)`

// === Identity ===
/// Document-unique tag name
pub const A_NAME: &str = "name";
/// Name of the tag this control labels
pub const A_TO_NAME: &str = "toname";

// === Shape style ===
/// Shape opacity (0.0-1.0)
pub const A_OPACITY: &str = "opacity";
/// Fill color
pub const A_FILL_COLOR: &str = "fillcolor";
/// Fill opacity (0.0-1.0)
pub const A_FILL_OPACITY: &str = "fillopacity";
/// Stroke width, numeric string
pub const A_STROKE_WIDTH: &str = "strokewidth";
/// Stroke color
pub const A_STROKE_COLOR: &str = "strokecolor";
/// Show rotation handle
pub const A_CAN_ROTATE: &str = "canrotate";

// === Objects ===
/// Data key of an object tag (e.g. `$img`)
pub const A_VALUE: &str = "value";
/// Display width (CSS length)
pub const A_WIDTH: &str = "width";
/// Allow zooming
pub const A_ZOOM: &str = "zoom";

// === Labels ===
/// Selection mode: single | multiple
pub const A_CHOICE: &str = "choice";
/// Label background color
pub const A_BACKGROUND: &str = "background";

// === Well-known members ===
/// Lifecycle action run once after construction
pub const M_AFTER_CREATE: &str = "afterCreate";
/// Tag type view
pub const M_TYPE: &str = "type";
/// Computed view: any states attached to this control's target
pub const M_HAS_STATES: &str = "hasStates";
