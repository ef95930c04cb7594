//! vision_core: colorization, overlay and heat-map helpers for segmentation outputs.

pub mod colormap;
pub mod overlay;

pub mod prelude {
    pub use crate::colormap::*;
    pub use crate::overlay::*;
}
