//! Fit, pan, and zoom for media viewports, with drawing overlays.
//!
//! A viewport takes over one element inside a parent container: it fits the
//! element's content to the parent while preserving aspect ratio, pans it by
//! pointer drag, and zooms it to explicit levels. A sync group mirrors one pan
//! gesture across several viewports. Overlays and annotation layers are
//! surfaces kept on top of a viewport; the drawing overlay captures shapes in
//! coordinates normalized to its own size.
//!
//! The crate is headless. The page it runs in is reached only through the
//! [`host`] traits, and the host forwards DOM events to the components'
//! `on_*` entry points. Browser implementations live behind the `web` feature.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`viewport`] | Viewport engine: fit, zoom, pan state machine, resize debounce |
//! | [`sync`] | Sync group routing one gesture to every child |
//! | [`overlay`] | Drawing overlay and shape capture |
//! | [`annotation`] | Annotation layer over a viewport |
//! | [`shape`] | Normalized and pixel shapes |
//! | [`natural`] | Natural size measurement and orientation |
//! | [`input`] | Pointer events and pan gestures |
//! | [`events`] | Ordered subscriber lists |
//! | [`config`] | Viewport configuration and validated updates |
//! | [`host`] | Element and layer traits the host implements |
//! | [`geom`] | Points, sizes, rects, CSS lengths |
//! | [`error`] | Error types |
//! | [`consts`] | Shared constants |
//! | `web` | `web-sys` host implementation and DOM listener driver (feature `web`) |

pub mod annotation;
pub mod config;
pub mod consts;
pub mod error;
pub mod events;
pub mod geom;
pub mod host;
pub mod input;
pub mod natural;
pub mod overlay;
pub mod shape;
pub mod sync;
pub mod viewport;

mod tracking;

#[cfg(feature = "web")]
pub mod web;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ConfigError, InvariantError, ViewportError};
pub use overlay::{DrawingOverlay, OverlayMode, OverlayOptions};
pub use sync::SyncGroup;
pub use viewport::Viewport;
