//! Spectrum analysis configuration.

use crate::error::ConfigError;

/// FFT analysis configuration for the byte magnitude spectrum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FftConfig {
    /// FFT window size (power of 2). Bin count is half of this.
    pub fft_size: usize,

    /// Weight of the previous frame in the magnitude average (0 = no smoothing)
    pub smoothing_time_constant: f32,

    /// Magnitude mapped to byte 0 (dBFS)
    pub min_db: f32,

    /// Magnitude mapped to byte 255 (dBFS)
    pub max_db: f32,
}

impl Default for FftConfig {
    fn default() -> Self {
        Self {
            fft_size: 256, // 128 bins
            smoothing_time_constant: 0.8,
            min_db: -100.0,
            max_db: -30.0,
        }
    }
}

impl FftConfig {
    /// Number of frequency bins produced per sample
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fft_size.is_power_of_two() || !(32..=32768).contains(&self.fft_size) {
            return Err(ConfigError::FftSize(self.fft_size));
        }
        if !(0.0..=1.0).contains(&self.smoothing_time_constant) {
            return Err(ConfigError::Smoothing(self.smoothing_time_constant));
        }
        if self.min_db >= self.max_db {
            return Err(ConfigError::DecibelRange {
                min: self.min_db,
                max: self.max_db,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bin_count() {
        assert_eq!(FftConfig::default().bin_count(), 128);
        assert!(FftConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_fft_size() {
        let config = FftConfig {
            fft_size: 300,
            ..FftConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::FftSize(300)));

        let config = FftConfig {
            fft_size: 16,
            ..FftConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::FftSize(16)));
    }

    #[test]
    fn test_rejects_inverted_db_range() {
        let config = FftConfig {
            min_db: -20.0,
            max_db: -30.0,
            ..FftConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DecibelRange { .. })
        ));
    }
}
