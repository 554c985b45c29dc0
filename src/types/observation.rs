//! Raw samples and stored observations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SchemaPolicy;

/// Planar position of the tracked subject.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Activity fields carried by a sample.
///
/// Exactly one variant is valid for a deployment, matching its [`SchemaPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema", rename_all = "snake_case")]
pub enum ActivityFields {
    /// Dominant state of the sample as category flags.
    Flags {
        home: bool,
        eating: bool,
        drinking: bool,
    },
    /// Non-negative duration/intensity contributions. Absent inputs are stored as 0.
    Magnitudes {
        home_data: f64,
        eating_data: f64,
        drinking_data: f64,
    },
}

impl ActivityFields {
    /// Flag variant with every category unset.
    pub const fn no_flags() -> Self {
        Self::Flags {
            home: false,
            eating: false,
            drinking: false,
        }
    }

    /// Magnitude variant with every contribution at zero.
    pub const fn zero_magnitudes() -> Self {
        Self::Magnitudes {
            home_data: 0.0,
            eating_data: 0.0,
            drinking_data: 0.0,
        }
    }

    /// Schema this variant belongs to.
    pub const fn schema(&self) -> SchemaPolicy {
        match self {
            Self::Flags { .. } => SchemaPolicy::Flags,
            Self::Magnitudes { .. } => SchemaPolicy::Magnitudes,
        }
    }
}

/// One submitted observation before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub position: Option<Position>,
    pub activity: ActivityFields,
    /// Valid detection rather than noise
    pub detected: bool,
}

impl Sample {
    pub const fn new(timestamp: DateTime<Utc>, activity: ActivityFields) -> Self {
        Self {
            timestamp,
            position: None,
            activity,
            detected: true,
        }
    }

    #[must_use]
    pub const fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    #[must_use]
    pub const fn with_detected(mut self, detected: bool) -> Self {
        self.detected = detected;
        self
    }
}

/// A stored, fully resolved observation. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Monotonic id assigned by the log
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub position: Option<Position>,
    /// Step from the preceding same-day observation, computed at insertion
    pub distance: f64,
    pub activity: ActivityFields,
    pub detected: bool,
}

impl Observation {
    pub fn from_sample(id: u64, sample: &Sample, distance: f64) -> Self {
        Self {
            id,
            timestamp: sample.timestamp,
            position: sample.position,
            distance,
            activity: sample.activity,
            detected: sample.detected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_schema() {
        assert_eq!(ActivityFields::no_flags().schema(), SchemaPolicy::Flags);
        assert_eq!(
            ActivityFields::zero_magnitudes().schema(),
            SchemaPolicy::Magnitudes
        );
    }

    #[test]
    fn test_observation_json_is_tagged() {
        let sample = Sample::new(Utc::now(), ActivityFields::no_flags()).with_position(1.0, 2.0);
        let obs = Observation::from_sample(7, &sample, 0.0);

        let v = serde_json::to_value(&obs).unwrap();
        assert_eq!(v["activity"]["schema"], "flags");
        assert_eq!(v["position"]["x"], 1.0);

        let back: Observation = serde_json::from_value(v).unwrap();
        assert_eq!(back, obs);
    }
}
