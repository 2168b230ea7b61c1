//! Shared constants for the viewport engine and its overlays.

// ── Fit ─────────────────────────────────────────────────────────

/// The parent share an orientation's major axis fills when fitting.
pub const FIT_PERCENT: f64 = 100.0;

// ── Resize ──────────────────────────────────────────────────────

/// Default delay between the last window resize and the re-fit, in milliseconds.
pub const DEFAULT_RESIZE_DEBOUNCE_MS: f64 = 1.0;

// ── Overlay ─────────────────────────────────────────────────────

/// Default stroke color for overlay shapes.
pub const DEFAULT_STROKE_COLOR: &str = "#ff0000";

/// Default stroke width for overlay shapes, in CSS pixels.
pub const DEFAULT_STROKE_WIDTH: f64 = 4.0;

/// DOM id given to the in-progress scratch element of an SVG surface.
pub const SCRATCH_ELEMENT_ID: &str = "__viewfit_scratch__";

/// SVG namespace used by the browser surface.
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
