use serde::{Deserialize, Serialize};

use crate::error::InvalidLaneError;

/// Default number of lanes.
pub const DEFAULT_LANE_COUNT: usize = 4;

/// Maps raw input symbols (keys, pointer positions) onto lane indices.
///
/// The mapping is fixed for the lifetime of a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LaneMap {
    /// Key names per lane, matched case-insensitively. Each lane may have aliases.
    pub keys: Vec<Vec<String>>,
}

impl Default for LaneMap {
    fn default() -> Self {
        Self::with_keys(&["A", "S", "D", "F"])
    }
}

impl LaneMap {
    /// One key per lane.
    pub fn with_keys(keys: &[&str]) -> Self {
        Self {
            keys: keys.iter().map(|k| vec![k.to_string()]).collect(),
        }
    }

    /// Editor layout: A/S/D/F plus the number row 1-4.
    pub fn editor() -> Self {
        Self {
            keys: ["A", "S", "D", "F"]
                .iter()
                .zip(["1", "2", "3", "4"])
                .map(|(letter, digit)| vec![letter.to_string(), digit.to_string()])
                .collect(),
        }
    }

    pub fn lane_count(&self) -> usize {
        self.keys.len()
    }

    /// Look up the lane bound to a key name.
    pub fn map_key(&self, key: &str) -> Result<usize, InvalidLaneError> {
        self.keys
            .iter()
            .position(|aliases| aliases.iter().any(|k| k.eq_ignore_ascii_case(key)))
            .ok_or_else(|| InvalidLaneError::UnboundKey(key.to_string()))
    }

    /// Bucket a horizontal pointer position into a lane.
    ///
    /// Lanes are `total_width / lane_count` wide, starting at x = 0.
    pub fn map_pointer(&self, x: f64, total_width: f64) -> Result<usize, InvalidLaneError> {
        let lane_count = self.lane_count();
        if lane_count == 0 || total_width.is_nan() || total_width <= 0.0 || !x.is_finite() {
            return Err(InvalidLaneError::PointerOutside { x, width: total_width });
        }
        let lane_width = total_width / lane_count as f64;
        let lane = (x / lane_width).floor();
        if lane < 0.0 || lane >= lane_count as f64 {
            return Err(InvalidLaneError::PointerOutside { x, width: total_width });
        }
        Ok(lane as usize)
    }

    /// Check that a lane index produced elsewhere is in range.
    pub fn check(&self, lane: i64) -> Result<usize, InvalidLaneError> {
        check_lane(lane, self.lane_count())
    }
}

/// Check a raw lane index against a lane count.
pub fn check_lane(lane: i64, lane_count: usize) -> Result<usize, InvalidLaneError> {
    if lane < 0 || lane as u64 >= lane_count as u64 {
        return Err(InvalidLaneError::OutOfRange { lane, lane_count });
    }
    Ok(lane as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keys() {
        let map = LaneMap::default();
        assert_eq!(map.lane_count(), DEFAULT_LANE_COUNT);
        assert_eq!(map.map_key("A"), Ok(0));
        assert_eq!(map.map_key("s"), Ok(1));
        assert_eq!(map.map_key("F"), Ok(3));
        assert_eq!(
            map.map_key("Q"),
            Err(InvalidLaneError::UnboundKey("Q".to_string()))
        );
    }

    #[test]
    fn test_editor_aliases() {
        let map = LaneMap::editor();
        assert_eq!(map.map_key("1"), Ok(0));
        assert_eq!(map.map_key("d"), Ok(2));
        assert_eq!(map.map_key("4"), Ok(3));
    }

    #[test]
    fn test_pointer_bucketing() {
        let map = LaneMap::default();
        assert_eq!(map.map_pointer(0.0, 400.0), Ok(0));
        assert_eq!(map.map_pointer(99.9, 400.0), Ok(0));
        assert_eq!(map.map_pointer(100.0, 400.0), Ok(1));
        assert_eq!(map.map_pointer(399.0, 400.0), Ok(3));
        assert!(map.map_pointer(400.0, 400.0).is_err());
        assert!(map.map_pointer(-1.0, 400.0).is_err());
        assert!(map.map_pointer(10.0, 0.0).is_err());
    }

    #[test]
    fn test_check_lane() {
        assert_eq!(check_lane(3, 4), Ok(3));
        assert_eq!(
            check_lane(4, 4),
            Err(InvalidLaneError::OutOfRange {
                lane: 4,
                lane_count: 4
            })
        );
        assert!(check_lane(-2, 4).is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let map = LaneMap::editor();
        let json = serde_json::to_string(&map).unwrap();
        let restored: LaneMap = serde_json::from_str(&json).unwrap();
        assert_eq!(map, restored);
    }
}
