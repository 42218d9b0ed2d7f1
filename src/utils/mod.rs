pub(crate) mod misc;

pub use misc::*;
