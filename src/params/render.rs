//! Window and surface configuration.

use crate::error::ConfigError;

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Initial window width (pixels)
    pub window_width: u32,

    /// Initial window height (pixels)
    pub window_height: u32,

    /// Fraction of the window height covered by the drawing surface
    pub height_fraction: f32,

    /// Window title prefix (play state and time are appended)
    pub title: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            height_fraction: 1.0,
            title: "bassbloom".to_string(),
        }
    }
}

impl RenderConfig {
    /// Check that the surface fraction leaves something to draw on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.height_fraction > 0.0 && self.height_fraction <= 1.0) {
            return Err(ConfigError::HeightFraction(self.height_fraction));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_fraction(height_fraction: f32) -> RenderConfig {
        RenderConfig {
            height_fraction,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn test_default_is_valid() {
        assert!(RenderConfig::default().validate().is_ok());
        assert!(with_fraction(0.8).validate().is_ok());
    }

    #[test]
    fn test_rejects_unusable_height_fraction() {
        assert_eq!(
            with_fraction(0.0).validate(),
            Err(ConfigError::HeightFraction(0.0))
        );
        assert_eq!(
            with_fraction(1.5).validate(),
            Err(ConfigError::HeightFraction(1.5))
        );
        assert!(matches!(
            with_fraction(f32::NAN).validate(),
            Err(ConfigError::HeightFraction(f)) if f.is_nan()
        ));
    }
}
