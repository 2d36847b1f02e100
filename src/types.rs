use serde::{Deserialize, Serialize};
use std::fmt;

/// Which view the renderer produces. Advanced only by the mode-toggle input;
/// never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DisplayMode {
    #[default]
    Info,
    Camera,
    Mask,
}

impl DisplayMode {
    /// INFO → CAMERA → MASK → INFO.
    pub fn next(self) -> Self {
        match self {
            DisplayMode::Info => DisplayMode::Camera,
            DisplayMode::Camera => DisplayMode::Mask,
            DisplayMode::Mask => DisplayMode::Info,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DisplayMode::Info => "INFO",
            DisplayMode::Camera => "CAMERA",
            DisplayMode::Mask => "MASK",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_cycles_through_all_views() {
        let mut mode = DisplayMode::default();
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(mode);
            mode = mode.next();
        }
        assert_eq!(
            seen,
            vec![
                DisplayMode::Info,
                DisplayMode::Camera,
                DisplayMode::Mask,
                DisplayMode::Info
            ]
        );
    }

    #[test]
    fn mode_serializes_uppercase() {
        let json = serde_json::to_string(&DisplayMode::Camera).unwrap();
        assert_eq!(json, "\"CAMERA\"");
    }
}
