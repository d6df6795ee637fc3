//! Identifier type for fiducial tags.

use serde::{Deserialize, Serialize};

/// Identifier of a fiducial tag, as decoded by the detector.
///
/// Serialized as a bare integer so World Model documents read as a plain
/// `id: pose` mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(pub u32);

impl TagId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl From<u32> for TagId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tag{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_id_equality() {
        assert_eq!(TagId::new(42), TagId::from(42));
        assert_ne!(TagId::new(42), TagId::new(43));
    }

    #[test]
    fn test_tag_id_display() {
        assert_eq!(format!("{}", TagId::new(7)), "tag7");
    }

    #[test]
    fn test_tag_id_orders_numerically() {
        let mut ids = vec![TagId::new(12), TagId::new(3), TagId::new(7)];
        ids.sort();
        assert_eq!(ids, vec![TagId::new(3), TagId::new(7), TagId::new(12)]);
    }
}
