//! Configuration for the surface pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{SurfaceAxis, VolToolError, VolToolResult};

/// Allowed risk-free rate range (inclusive)
pub const RISK_FREE_RATE_MIN: f64 = 0.005;
pub const RISK_FREE_RATE_MAX: f64 = 0.15;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.025;

/// Last day of the dataset scope the tool ships with (March 2023)
pub fn default_quote_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 3, 31).expect("valid calendar date")
}

/// User-selected parameters for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// Continuously compounded, annualized
    pub risk_free_rate: f64,
    /// Second axis of the surface
    pub y_axis: SurfaceAxis,
    /// Overlay the solved points on the surface
    pub show_data_pts: bool,
    /// Draw the underlying price plane (strike axis only)
    pub show_underlying: bool,
    /// Requested quote date; weekends are shifted back to Friday
    pub input_date: NaiveDate,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            y_axis: SurfaceAxis::StrikePrice,
            show_data_pts: false,
            show_underlying: false,
            input_date: default_quote_date(),
        }
    }
}

impl SurfaceConfig {
    /// Default parameters on a given date
    pub fn on_date(input_date: NaiveDate) -> Self {
        Self {
            input_date,
            ..Default::default()
        }
    }

    /// Reject out-of-range input at the collection boundary.
    ///
    /// `covered` is the dataset's first and last quote date, if known.
    pub fn validate(&self, covered: Option<(NaiveDate, NaiveDate)>) -> VolToolResult<()> {
        if !(RISK_FREE_RATE_MIN..=RISK_FREE_RATE_MAX).contains(&self.risk_free_rate) {
            return Err(VolToolError::invalid_input(format!(
                "risk-free rate {} outside [{}, {}]",
                self.risk_free_rate, RISK_FREE_RATE_MIN, RISK_FREE_RATE_MAX
            )));
        }

        if let Some((first, last)) = covered {
            if self.input_date < first || self.input_date > last {
                return Err(VolToolError::invalid_input(format!(
                    "date {} outside dataset range {} to {}",
                    self.input_date, first, last
                )));
            }
        }

        Ok(())
    }

    /// Clamp rate and date into their allowed ranges
    pub fn clamped(mut self, covered: Option<(NaiveDate, NaiveDate)>) -> Self {
        self.risk_free_rate = self
            .risk_free_rate
            .clamp(RISK_FREE_RATE_MIN, RISK_FREE_RATE_MAX);
        if let Some((first, last)) = covered {
            self.input_date = self.input_date.clamp(first, last);
        }
        self
    }

    /// Underlying plane is only meaningful against the strike axis
    pub fn wants_underlying_plane(&self) -> bool {
        self.show_underlying && self.y_axis == SurfaceAxis::StrikePrice
    }
}

/// Scattered-data interpolation settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterpolationConfig {
    /// Normalize both axes to unit range before triangulating
    pub rescale: bool,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self { rescale: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn march() -> Option<(NaiveDate, NaiveDate)> {
        Some((
            NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 3, 31).unwrap(),
        ))
    }

    #[test]
    fn test_defaults() {
        let config = SurfaceConfig::default();
        assert_eq!(config.risk_free_rate, 0.025);
        assert_eq!(config.y_axis, SurfaceAxis::StrikePrice);
        assert!(!config.show_data_pts);
        assert!(!config.show_underlying);
        assert_eq!(config.input_date, NaiveDate::from_ymd_opt(2023, 3, 31).unwrap());
        assert!(InterpolationConfig::default().rescale);
    }

    #[test]
    fn test_validate() {
        assert!(SurfaceConfig::default().validate(march()).is_ok());

        let config = SurfaceConfig {
            risk_free_rate: 0.2,
            ..Default::default()
        };
        assert!(config.validate(march()).is_err());

        let config = SurfaceConfig::on_date(NaiveDate::from_ymd_opt(2023, 4, 3).unwrap());
        assert!(config.validate(march()).is_err());
        assert!(config.validate(None).is_ok());
    }

    #[test]
    fn test_clamped() {
        let config = SurfaceConfig {
            risk_free_rate: 0.001,
            input_date: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
            ..Default::default()
        }
        .clamped(march());

        assert_eq!(config.risk_free_rate, RISK_FREE_RATE_MIN);
        assert_eq!(config.input_date, NaiveDate::from_ymd_opt(2023, 3, 31).unwrap());
    }

    #[test]
    fn test_underlying_plane_requires_strike_axis() {
        let mut config = SurfaceConfig {
            show_underlying: true,
            ..Default::default()
        };
        assert!(config.wants_underlying_plane());

        config.y_axis = SurfaceAxis::Moneyness;
        assert!(!config.wants_underlying_plane());
    }
}
