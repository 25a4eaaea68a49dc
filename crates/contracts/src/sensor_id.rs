//! SensorId - cheap-to-clone sensor identifier
//!
//! Sensor ids are cloned into every notification and node name, so they share
//! one `Arc<str>` allocation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Sensor identifier with O(1) cloning.
///
/// # Examples
/// ```
/// use contracts::SensorId;
///
/// let id: SensorId = "roof_lidar".into();
/// assert_eq!(id, "roof_lidar");
/// assert_eq!(id.node("raycast").as_str(), "roof_lidar/raycast");
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SensorId(Arc<str>);

impl SensorId {
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Node id of one of this sensor's pipeline stages
    pub fn node(&self, stage: &str) -> crate::NodeId {
        crate::NodeId::scoped(&self.0, stage)
    }
}

impl Deref for SensorId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Borrow<str> for SensorId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SensorId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SensorId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensorId({:?})", self.0)
    }
}

impl PartialEq<str> for SensorId {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for SensorId {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl Serialize for SensorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SensorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_clone_shares_allocation() {
        let a: SensorId = "front".into();
        let b = a.clone();
        assert_eq!(a.as_str().as_ptr(), b.as_str().as_ptr());
    }

    #[test]
    fn test_lookup_by_str() {
        let mut map: BTreeMap<SensorId, usize> = BTreeMap::new();
        map.insert("front".into(), 16);
        map.insert("rear".into(), 32);
        assert_eq!(map.get("rear"), Some(&32));
    }

    #[test]
    fn test_serde() {
        let id: SensorId = "front".into();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"front\"");
        let parsed: SensorId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
