use crate::{classify::Point3, config::ShadowConfig, PointList};

/// Flattens points onto a horizontal floor below the cloud.
///
/// `(x, y, 0)` maps to `(x, floor_height, depth_offset - y)`: height in the
/// cloud becomes depth on the floor. Order and length are preserved so
/// shadow `k` always belongs to point `k`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowProjector {
    floor_height: f32,
    depth_offset: f32,
}

impl ShadowProjector {
    pub fn new(floor_height: f32, depth_offset: f32) -> Self {
        Self {
            floor_height,
            depth_offset,
        }
    }

    pub fn project_point(&self, point: Point3) -> Point3 {
        Point3::new(point.x, self.floor_height, -point.y + self.depth_offset)
    }

    pub fn project(&self, points: &[Point3]) -> PointList {
        points.iter().map(|&point| self.project_point(point)).collect()
    }
}

impl Default for ShadowProjector {
    fn default() -> Self {
        ShadowConfig::default().into()
    }
}

impl From<ShadowConfig> for ShadowProjector {
    fn from(config: ShadowConfig) -> Self {
        Self::new(config.floor_height, config.depth_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projects_onto_default_floor() {
        let projector = ShadowProjector::default();
        let shadow = projector.project_point(Point3::new(0.25, 0.5, 0.0));

        assert_eq!(shadow, Point3::new(0.25, -1.5, -2.5));
    }

    #[test]
    fn preserves_length_and_order() {
        let projector = ShadowProjector::new(-1.0, 3.0);
        let points = vec![
            Point3::new(-1.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.5, -0.5, 0.0),
        ];

        let shadows = projector.project(&points);
        assert_eq!(shadows.len(), points.len());
        for (shadow, point) in shadows.iter().zip(&points) {
            assert_eq!(shadow.x, point.x);
            assert_eq!(shadow.y, -1.0);
            assert_eq!(shadow.z, -point.y + 3.0);
        }
    }

    #[test]
    fn empty_list_projects_to_empty_list() {
        assert!(ShadowProjector::default().project(&[]).is_empty());
    }
}
