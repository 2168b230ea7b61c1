//! Natural (intrinsic) size measurement and orientation.
//!
//! The measurement strategy is picked once per element from its kind: media
//! reports intrinsic pixels and may not know them until loaded, generic
//! elements report their current layout box right away.

#[cfg(test)]
#[path = "natural_test.rs"]
mod natural_test;

use crate::geom::Size;
use crate::host::{Element, ElementKind};

/// Which axis a fit spans. Square content fits as landscape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
}

impl Orientation {
    /// Orientation of content with the given natural size.
    #[must_use]
    pub fn from_size(size: Size) -> Self {
        if size.height > size.width { Self::Portrait } else { Self::Landscape }
    }
}

/// How an element's natural size is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaturalSizeSource {
    /// Intrinsic media pixels; measurement waits for the load signal.
    Intrinsic,
    /// Current layout box, measured synchronously.
    LayoutBox,
}

impl NaturalSizeSource {
    #[must_use]
    pub fn for_kind(kind: ElementKind) -> Self {
        if kind.is_media() { Self::Intrinsic } else { Self::LayoutBox }
    }

    /// Whether this source needs a load binding before it can be trusted.
    #[must_use]
    pub fn needs_load_signal(self) -> bool {
        matches!(self, Self::Intrinsic)
    }

    /// Measure `element`. `None` when no usable size is available yet.
    pub fn measure<E: Element>(self, element: &E) -> Option<Size> {
        let size = match self {
            Self::Intrinsic => element.intrinsic_size(),
            Self::LayoutBox => element.client_size(),
        };
        (!size.is_empty()).then_some(size)
    }
}

/// A successful measurement together with the orientation fixed by the first one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NaturalSize {
    pub size: Size,
    pub orientation: Orientation,
}

impl NaturalSize {
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self { size, orientation: Orientation::from_size(size) }
    }

    /// Replace the measured size, keeping the orientation.
    #[must_use]
    pub fn remeasured(self, size: Size) -> Self {
        Self { size, orientation: self.orientation }
    }

    /// `min(rendered_h / natural_h, rendered_w / natural_w)`.
    #[must_use]
    pub fn scale_of(&self, rendered: Size) -> f64 {
        (rendered.height / self.size.height).min(rendered.width / self.size.width)
    }
}
