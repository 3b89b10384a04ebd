//! RGB color triple used for solid-fill layer creation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An 8-bit-per-channel RGB color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Mid-grey used when sampling a layer's color is impossible.
    pub const FALLBACK: Self = Self::new(127, 127, 127);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RGB({}, {}, {})", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        assert_eq!(Rgb::new(65, 105, 225).to_string(), "RGB(65, 105, 225)");
    }

    #[test]
    fn fallback_is_mid_grey() {
        assert_eq!(Rgb::FALLBACK, Rgb::new(127, 127, 127));
    }
}
