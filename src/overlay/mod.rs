mod composer;
#[cfg(feature = "render")]
mod render;

pub use composer::{
    OverlayComposer, OverlayInstruction, ADJUST_MESSAGE, BULLET, HOLD_MESSAGE, INSTRUCTIONS_TITLE,
};
#[cfg(feature = "render")]
pub use render::{box_height, OverlayRenderer};
