use crate::core::particles::BurstSize;
use crate::core::recycler::Recyclable;
use crate::core::scene::{EntityId, Scene};
use crate::game::rail::RailSet;
use crate::game::scheduler::MAX_DELTA_TIME;
use cgmath::Vector3;

/// Smallest time-to-arrival a node may be armed with. Twice the longest
/// frame step, so a node never reaches the line in the tick it spawns.
pub const MIN_ARRIVAL_TIME: f32 = 2.0 * MAX_DELTA_TIME;

/// Height of a node above its rail.
pub const NODE_LANE_HEIGHT: f32 = 0.5;

pub const NODE_REST_SCALE: f32 = 1.0;

/// Scale lost per second while a missed node fades out.
pub const MISS_SHRINK_RATE: f32 = 4.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeState {
    /// Travelling, judgment pending.
    Live,
    /// Judged a hit; retires on the next update.
    Hit,
    /// Judged a miss; shrinks to nothing, then retires.
    Miss,
    /// Inert until re-armed.
    Dead,
}

#[derive(Clone, Debug)]
pub struct MusicNode {
    entity: EntityId,
    rail: usize,
    time: f32,
    state: NodeState,
    scale: f32,
    active: bool,
}

impl MusicNode {
    pub fn new(entity: EntityId, rail: usize, time: f32) -> Self {
        Self {
            entity,
            rail,
            time: time.max(MIN_ARRIVAL_TIME),
            state: NodeState::Live,
            scale: NODE_REST_SCALE,
            active: false,
        }
    }

    #[inline(always)]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    #[inline(always)]
    pub fn rail(&self) -> usize {
        self.rail
    }

    /// Seconds until the node reaches the judgment line. Negative once past it.
    #[inline(always)]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline(always)]
    pub fn state(&self) -> NodeState {
        self.state
    }

    #[inline(always)]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[inline(always)]
    pub fn is_dead(&self) -> bool {
        self.state == NodeState::Dead
    }

    /// Live and at or past the judgment line.
    #[inline(always)]
    pub fn awaiting_judgment(&self) -> bool {
        self.state == NodeState::Live && self.time <= 0.0
    }

    fn rearm(&mut self) {
        self.state = NodeState::Live;
        self.scale = NODE_REST_SCALE;
    }

    pub fn set_time(&mut self, t: f32) {
        self.rearm();
        self.time = t.max(MIN_ARRIVAL_TIME);
    }

    /// Moves the node onto `lane`, re-arms it, and puffs a small burst where it
    /// appears.
    pub fn set_rail(&mut self, lane: usize, rails: &RailSet, scene: &mut Scene) {
        self.rearm();
        self.rail = lane;
        if let Some(spawn_point) = self.world_position(rails) {
            self.place(spawn_point, scene);
            scene.particles.emit_burst(spawn_point, BurstSize::Small);
        }
    }

    fn world_position(&self, rails: &RailSet) -> Option<Vector3<f32>> {
        rails
            .get(self.rail)
            .map(|rail| rail.attach_point(self.time) + Vector3::new(0.0, NODE_LANE_HEIGHT, 0.0))
    }

    fn place(&self, position: Vector3<f32>, scene: &mut Scene) {
        if let Some(entity) = scene.entity_mut(self.entity) {
            entity.set_position(position);
            entity.set_uniform_scale(self.scale);
        }
    }

    pub fn update(&mut self, delta_time: f32, rails: &RailSet, scene: &mut Scene) {
        if self.state == NodeState::Dead {
            return;
        }

        self.time -= delta_time;

        match self.state {
            NodeState::Miss => {
                self.scale = (self.scale - MISS_SHRINK_RATE * delta_time).max(0.0);
                if self.scale <= 0.0 {
                    self.state = NodeState::Dead;
                }
            }
            NodeState::Hit => self.state = NodeState::Dead,
            NodeState::Live | NodeState::Dead => {}
        }

        if let Some(position) = self.world_position(rails) {
            self.place(position, scene);
        }
    }

    /// `Live → Hit`. Returns `false` and changes nothing for any other state.
    pub fn hit(&mut self) -> bool {
        if self.state != NodeState::Live {
            return false;
        }
        self.state = NodeState::Hit;
        true
    }

    /// `Live → Miss`. Returns `false` and changes nothing for any other state.
    pub fn miss(&mut self) -> bool {
        if self.state != NodeState::Live {
            return false;
        }
        self.state = NodeState::Miss;
        true
    }
}

impl Recyclable for MusicNode {
    fn is_active(&self) -> bool {
        self.active
    }
    fn activate(&mut self) {
        self.active = true;
    }
    fn deactivate(&mut self) {
        self.active = false;
    }
}
