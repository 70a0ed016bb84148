//! Viewport profiles used to parametrise the navigation cases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Viewport {
    /// Create a new viewport
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        ViewportProfile::DESKTOP.viewport
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A named viewport simulating a device class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewportProfile {
    /// Profile name used in case names
    pub name: &'static str,
    /// Dimensions
    pub viewport: Viewport,
    /// Whether to emulate a mobile device
    pub is_mobile: bool,
}

impl ViewportProfile {
    /// Desktop 1280x800
    pub const DESKTOP: Self = Self {
        name: "Desktop",
        viewport: Viewport::new(1280, 800),
        is_mobile: false,
    };

    /// Mobile 375x812
    pub const MOBILE: Self = Self {
        name: "Mobile",
        viewport: Viewport::new(375, 812),
        is_mobile: true,
    };

    /// Profiles the navigation group runs under
    pub const NAVIGATION: [Self; 2] = [Self::DESKTOP, Self::MOBILE];
}

impl fmt::Display for ViewportProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles() {
        assert_eq!(ViewportProfile::DESKTOP.viewport, Viewport::new(1280, 800));
        assert_eq!(ViewportProfile::MOBILE.viewport, Viewport::new(375, 812));
        assert!(ViewportProfile::MOBILE.is_mobile);
        assert!(!ViewportProfile::DESKTOP.is_mobile);
    }

    #[test]
    fn test_display() {
        assert_eq!(ViewportProfile::DESKTOP.to_string(), "Desktop (1280x800)");
    }
}
