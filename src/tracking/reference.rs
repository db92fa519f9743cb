//! Reference-frame transform: positions of live tags relative to the reference tag.
//!
//! The origin is the reference tag's *last recorded* translation. While the
//! reference is live that is its latest detection; once it is lost the
//! origin is simply held, so the feed keeps flowing with approximate values
//! instead of failing.

use nalgebra::Vector3;

use crate::detection::TagId;

use super::table::MarkerTable;

/// Position of one tag in the reference tag's (camera-aligned) frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativePosition {
    pub id: TagId,
    /// `last_translation(id) - last_translation(reference)`, metres.
    pub offset: Vector3<f64>,
}

impl RelativePosition {
    pub fn distance(&self) -> f64 {
        self.offset.norm()
    }
}

impl std::fmt::Display for RelativePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Id: {}, distance={:.4}m, x={:.4}, y={:.4}, z={:.4}",
            self.id,
            self.distance(),
            self.offset.x,
            self.offset.y,
            self.offset.z
        )
    }
}

/// Relative positions of every live non-reference tag, in id order.
///
/// Returns an empty list when the reference tag has never been recorded.
/// Tags evicted this frame are already gone from the table and therefore
/// never appear.
pub fn relative_positions(table: &MarkerTable) -> Vec<RelativePosition> {
    let reference_id = table.reference_id();
    let Some(origin) = table.get(reference_id).map(|r| r.last_translation) else {
        return Vec::new();
    };

    table
        .iter()
        .filter(|m| m.id != reference_id && m.is_live())
        .map(|m| RelativePosition {
            id: m.id,
            offset: m.last_translation - origin,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const REF: TagId = TagId(2);

    #[test]
    fn test_offsets_relative_to_reference() {
        let mut table = MarkerTable::new(REF, 20);
        table.upsert(REF, Vector3::new(0.0, 0.0, 1.0), String::new());
        table.upsert(TagId(5), Vector3::new(1.0, 0.0, 1.0), String::new());
        table.upsert(TagId(8), Vector3::new(0.0, 2.0, 3.0), String::new());
        table.age_and_evict();

        let rel = relative_positions(&table);
        assert_eq!(rel.len(), 2);

        assert_eq!(rel[0].id, TagId(5));
        assert_relative_eq!(rel[0].offset, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(rel[0].distance(), 1.0, epsilon = 1e-12);

        assert_eq!(rel[1].id, TagId(8));
        assert_relative_eq!(rel[1].offset, Vector3::new(0.0, 2.0, 2.0), epsilon = 1e-12);
        assert_relative_eq!(rel[1].distance(), 8.0f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_no_origin_without_reference() {
        let mut table = MarkerTable::new(REF, 20);
        table.upsert(TagId(5), Vector3::new(1.0, 0.0, 1.0), String::new());
        table.age_and_evict();

        assert!(relative_positions(&table).is_empty());
    }

    #[test]
    fn test_stale_reference_holds_origin() {
        let mut table = MarkerTable::new(REF, 1);
        table.upsert(REF, Vector3::new(0.5, 0.0, 1.0), String::new());
        table.age_and_evict();
        for _ in 0..5 {
            table.upsert(TagId(5), Vector3::new(1.5, 0.0, 1.0), String::new());
            table.age_and_evict();
        }
        assert!(!table.is_live(REF));

        let rel = relative_positions(&table);
        assert_eq!(rel.len(), 1);
        assert_relative_eq!(rel[0].offset, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_display_format() {
        let pos = RelativePosition {
            id: TagId(5),
            offset: Vector3::new(3.0, 4.0, 12.0),
        };
        assert_eq!(
            pos.to_string(),
            "Id: 5, distance=13.0000m, x=3.0000, y=4.0000, z=12.0000"
        );
    }
}
