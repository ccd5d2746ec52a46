use glam::Vec3;
use splines::{Interpolation, Key, Spline};

/// A looping flight path through a list of waypoints, walked at constant speed.
pub struct ViewerPath {
    start: Vec3,
    // Keyed by the distance travelled from the first waypoint
    spline: Spline<f32, Vec3>,
    length: f32,
}

impl ViewerPath {
    pub fn new(waypoints: Vec<Vec3>) -> Self {
        assert!(!waypoints.is_empty(), "A viewer path needs at least one waypoint");
        let start = waypoints[0];

        let mut keys = Vec::with_capacity(waypoints.len() + 1);
        let mut length = 0.0;
        let mut previous = start;
        for waypoint in waypoints.into_iter().chain(std::iter::once(start)) {
            length += previous.distance(waypoint);
            keys.push(Key::new(length, waypoint, Interpolation::Linear));
            previous = waypoint;
        }

        ViewerPath {
            start,
            spline: Spline::from_vec(keys),
            length,
        }
    }

    /// A square loop of `side` blocks centered on `center`, which crosses chunk borders
    /// in every horizontal direction.
    pub fn square(center: Vec3, side: f32) -> Self {
        let half = side / 2.0;
        ViewerPath::new(vec![
            center + Vec3::new(-half, 0.0, -half),
            center + Vec3::new(half, 0.0, -half),
            center + Vec3::new(half, 0.0, half),
            center + Vec3::new(-half, 0.0, half),
        ])
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn position_at(&self, distance: f32) -> Vec3 {
        if self.length <= 0.0 {
            return self.start;
        }

        self.spline
            .clamped_sample(distance.rem_euclid(self.length))
            .unwrap_or(self.start)
    }
}
