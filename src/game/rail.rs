use crate::core::recycler::Recyclable;
use crate::core::scene::{Entity, EntityKind, Scene};
use cgmath::Vector3;

/// Number of lanes shared by the rail set, the player, and the scheduler.
pub const LANE_COUNT: usize = 3;

/// Lane the player rests on when not steering.
pub const DEFAULT_LANE: usize = LANE_COUNT / 2;

pub const RAIL_SPACING: f32 = 1.0;
pub const RAIL_HEIGHT: f32 = -1.0;

/// World units a node travels along a rail per second of time-to-arrival.
pub const RAIL_TRAVEL_PER_SECOND: Vector3<f32> = Vector3::new(0.0, 0.0, 4.0);

const RAIL_VISUAL_SCALE: Vector3<f32> = Vector3::new(0.1, 0.1, 200.0);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rail {
    lane: usize,
    anchor: Vector3<f32>,
    travel: Vector3<f32>,
}

impl Rail {
    pub const fn new(lane: usize, anchor: Vector3<f32>, travel: Vector3<f32>) -> Self {
        Self { lane, anchor, travel }
    }

    #[inline(always)]
    pub const fn lane(&self) -> usize {
        self.lane
    }

    #[inline(always)]
    pub const fn anchor(&self) -> Vector3<f32> {
        self.anchor
    }

    /// Where something `t` seconds away from the judgment line sits on this
    /// rail. `t == 0` is the anchor.
    #[inline(always)]
    pub fn attach_point(&self, t: f32) -> Vector3<f32> {
        self.anchor + self.travel * t
    }
}

#[derive(Clone, Debug)]
pub struct RailSet {
    rails: [Rail; LANE_COUNT],
}

impl RailSet {
    /// Wraps pre-built rails, stored in lane order whatever order they arrive in.
    pub fn from_rails(mut rails: [Rail; LANE_COUNT]) -> Self {
        rails.sort_by_key(Rail::lane);
        Self { rails }
    }

    /// Lanes spaced `RAIL_SPACING` apart and centered on x = 0, each with a
    /// visible rail entity registered in `scene`.
    pub fn evenly_spaced(scene: &mut Scene) -> Self {
        let rails = Self::positions_only();
        for rail in &rails.rails {
            let mut entity = Entity::new(EntityKind::Rail);
            entity.set_position(rail.anchor());
            entity.set_scale(RAIL_VISUAL_SCALE);
            entity.activate();
            scene.register(entity);
        }
        rails
    }

    /// Same layout as [`RailSet::evenly_spaced`] without any scene entities.
    pub fn positions_only() -> Self {
        let center = (LANE_COUNT as f32 - 1.0) * 0.5;
        let rails = std::array::from_fn(|lane| {
            let x = (lane as f32 - center) * RAIL_SPACING;
            Rail::new(lane, Vector3::new(x, RAIL_HEIGHT, 0.0), RAIL_TRAVEL_PER_SECOND)
        });
        Self { rails }
    }

    #[inline(always)]
    pub fn get(&self, lane: usize) -> Option<&Rail> {
        self.rails.get(lane)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rail> {
        self.rails.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-4
    }

    #[test]
    fn attach_point_at_zero_is_anchor() {
        let rails = RailSet::positions_only();
        for rail in rails.iter() {
            assert_eq!(rail.attach_point(0.0), rail.anchor());
        }
    }

    #[test]
    fn attach_point_moves_only_along_travel_axis() {
        let rails = RailSet::positions_only();
        let rail = *rails.get(0).expect("lane 0");
        let samples = [(-1.5f32, 0.25f32), (0.0, 3.0), (2.0, 7.5), (6.0, -2.0)];
        for (t1, t2) in samples {
            let a = rail.attach_point(t1);
            let b = rail.attach_point(t2);
            let d = a - b;
            assert!(approx(d.x, 0.0), "lateral coordinate drifted: {d:?}");
            assert!(approx(d.y, 0.0), "vertical coordinate drifted: {d:?}");
            assert!(
                approx(d.z, (t1 - t2) * RAIL_TRAVEL_PER_SECOND.z),
                "travel offset not proportional for t1={t1} t2={t2}: {d:?}"
            );
        }
    }

    #[test]
    fn lanes_are_centered_and_evenly_spaced() {
        let mut scene = Scene::new();
        let rails = RailSet::evenly_spaced(&mut scene);
        assert_eq!(scene.entity_count(), LANE_COUNT, "one rail entity per lane");

        let xs: Vec<f32> = rails.iter().map(|r| r.anchor().x).collect();
        assert!(approx(xs.iter().sum::<f32>(), 0.0), "lanes not centered: {xs:?}");
        for pair in xs.windows(2) {
            assert!(approx(pair[1] - pair[0], RAIL_SPACING));
        }
        assert!(rails.get(LANE_COUNT).is_none());
    }

    #[test]
    fn prebuilt_rails_are_kept_in_lane_order() {
        let travel = Vector3::new(0.0, 0.0, 2.0);
        let rails = RailSet::from_rails([
            Rail::new(2, Vector3::new(5.0, 0.0, 0.0), travel),
            Rail::new(0, Vector3::new(-5.0, 0.0, 0.0), travel),
            Rail::new(1, Vector3::new(0.0, 0.0, 0.0), travel),
        ]);
        let lanes: Vec<usize> = rails.iter().map(Rail::lane).collect();
        assert_eq!(lanes, vec![0, 1, 2]);
        let first = *rails.get(0).expect("lane 0");
        assert_eq!(first.anchor(), Vector3::new(-5.0, 0.0, 0.0));
        assert_eq!(first.attach_point(1.5), Vector3::new(-5.0, 0.0, 3.0));
    }
}
