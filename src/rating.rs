use serde::Serialize;
use std::fmt;

/// Human-readable quality of a measured transfer speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SpeedRating {
    Poor,
    Fair,
    Good,
    #[serde(rename = "Very Good")]
    VeryGood,
    Excellent,
}

impl SpeedRating {
    pub fn from_mbps(mbps: f64) -> Self {
        if mbps >= 100.0 {
            SpeedRating::Excellent
        } else if mbps >= 40.0 {
            SpeedRating::VeryGood
        } else if mbps >= 10.0 {
            SpeedRating::Good
        } else if mbps >= 5.0 {
            SpeedRating::Fair
        } else {
            SpeedRating::Poor
        }
    }

    /// Rate `mbps` as it is displayed, rounded half-up to two decimals.
    pub fn from_rounded_mbps(mbps: f64) -> Self {
        Self::from_mbps((mbps * 100.0).round() / 100.0)
    }
}

impl fmt::Display for SpeedRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeedRating::Excellent => write!(f, "Excellent"),
            SpeedRating::VeryGood => write!(f, "Very Good"),
            SpeedRating::Good => write!(f, "Good"),
            SpeedRating::Fair => write!(f, "Fair"),
            SpeedRating::Poor => write!(f, "Poor"),
        }
    }
}
