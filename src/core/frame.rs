use serde::{Deserialize, Serialize};

/// Vehicle pose and motion at the time of a frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NaviData {
    #[serde(default)]
    pub east: f64,
    #[serde(default)]
    pub north: f64,
    #[serde(default)]
    pub height: f64,
    /// Heading in radians
    #[serde(default)]
    pub theta: f64,
    #[serde(default)]
    pub alpha: f64,
    #[serde(default)]
    pub beta: f64,
    /// Speed in m/s
    #[serde(default)]
    pub vel: f64,
    #[serde(default)]
    pub yaw_angular_speed: f64,
    #[serde(default)]
    pub ts: f64,
}

/// A single tracked object. The engine never looks inside these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotObject {
    #[serde(default)]
    pub id: i64,
    /// Heading in 0.001 radian
    #[serde(default)]
    pub theta: f64,
    /// Speed in km/h
    #[serde(default)]
    pub vel: f64,
    #[serde(default)]
    pub vel_theta: f64,
    /// Height in cm
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub kind: i64,
    /// Footprint corners `[x, y]` in meters
    #[serde(default)]
    pub vertex_points: Vec<[f64; 2]>,
    #[serde(default)]
    pub lower_z: f64,
    #[serde(default)]
    pub veh_light_kind: i64,
}

/// One timestamped MOT sample: vehicle pose plus tracked objects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Data time in seconds
    pub timestamp: f64,

    pub navi: NaviData,

    #[serde(default)]
    pub objs: Vec<MotObject>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,

    /// Original payload, pretty printed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl Frame {
    /// Create a frame with only a timestamp set
    pub fn at(timestamp: f64) -> Self {
        Self {
            timestamp,
            navi: NaviData {
                ts: timestamp,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Number of tracked objects in this frame
    pub fn object_count(&self) -> usize {
        self.objs.len()
    }

    /// Timestamp formatted as `YYYY-MM-DD HH:MM:SS` (UTC)
    pub fn formatted_time(&self) -> String {
        if self.timestamp == 0.0 {
            return "0000-00-00 00:00:00".to_string();
        }
        let millis = (self.timestamp * 1000.0) as i64;
        chrono::DateTime::from_timestamp_millis(millis)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "0000-00-00 00:00:00".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted_time() {
        assert_eq!(Frame::at(0.0).formatted_time(), "0000-00-00 00:00:00");
        assert_eq!(Frame::at(1_672_574_400.0).formatted_time(), "2023-01-01 12:00:00");
    }

    #[test]
    fn test_frame_deserialize_defaults() {
        let frame: Frame = serde_json::from_str(r#"{"timestamp": 2.5, "navi": {"vel": 3.0}}"#).unwrap();
        assert_eq!(frame.timestamp, 2.5);
        assert_eq!(frame.navi.vel, 3.0);
        assert!(frame.objs.is_empty());
        assert!(frame.vin.is_none());
    }
}
