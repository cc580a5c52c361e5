use crate::core::input::InputState;
use crate::core::particles::BurstSize;
use crate::core::recycler::Recyclable;
use crate::core::scene::{Entity, EntityId, EntityKind, Scene};
use crate::game::rail::{DEFAULT_LANE, LANE_COUNT, RailSet};

pub const PLAYER_REST_SCALE: f32 = 1.0;
pub const PLAYER_HIT_SCALE: f32 = 1.5;
/// Scale recovered per second after a hit bump.
pub const PLAYER_SCALE_DECAY: f32 = 2.5;
/// Fraction of the remaining distance to the target rail covered per second.
const PLAYER_FOLLOW_RATE: f32 = 20.0;

pub struct Player {
    entity: EntityId,
    current_rail: usize,
    default_rail: usize,
    default_reset: bool,
    scale: f32,
    hits: u32,
}

impl Player {
    pub fn new(rails: &RailSet, scene: &mut Scene, default_reset: bool) -> Self {
        let mut entity = Entity::new(EntityKind::Player);
        if let Some(rail) = rails.get(DEFAULT_LANE) {
            entity.set_position(rail.attach_point(0.0));
        }
        entity.set_uniform_scale(PLAYER_REST_SCALE);
        entity.activate();
        Self {
            entity: scene.register(entity),
            current_rail: DEFAULT_LANE,
            default_rail: DEFAULT_LANE,
            default_reset,
            scale: PLAYER_REST_SCALE,
            hits: 0,
        }
    }

    #[inline(always)]
    pub fn current_rail(&self) -> usize {
        self.current_rail
    }

    #[inline(always)]
    pub fn default_rail(&self) -> usize {
        self.default_rail
    }

    #[inline(always)]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    #[inline(always)]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Number of successful judgments signalled to this player.
    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn move_left(&mut self) {
        self.current_rail = self.current_rail.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.current_rail = (self.current_rail + 1).min(LANE_COUNT - 1);
    }

    pub fn move_default(&mut self) {
        self.current_rail = self.default_rail;
    }

    pub fn update(&mut self, delta_time: f32, input: InputState, rails: &RailSet, scene: &mut Scene) {
        if input.left {
            self.move_left();
        }
        if input.right {
            self.move_right();
        }
        if input.is_idle() && self.default_reset {
            self.move_default();
        }

        self.scale = (self.scale - PLAYER_SCALE_DECAY * delta_time).max(PLAYER_REST_SCALE);

        let Some(target) = rails.get(self.current_rail).map(|r| r.attach_point(0.0)) else {
            return;
        };
        if let Some(entity) = scene.entity_mut(self.entity) {
            let step = (PLAYER_FOLLOW_RATE * delta_time).min(1.0);
            let pos = entity.position();
            entity.set_position(pos + (target - pos) * step);
            entity.set_uniform_scale(self.scale);
        }
    }

    /// Feedback for a successful judgment: scale bump plus a burst where the
    /// player stands.
    pub fn hit(&mut self, scene: &mut Scene) {
        self.hits = self.hits.saturating_add(1);
        self.scale = PLAYER_HIT_SCALE;
        if let Some(entity) = scene.entity_mut(self.entity) {
            entity.set_uniform_scale(self.scale);
            let at = entity.position();
            scene.particles.emit_burst(at, BurstSize::Medium);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::particles::ParticleField;

    fn setup(default_reset: bool) -> (Player, RailSet, Scene) {
        let mut scene = Scene::with_particles(ParticleField::seeded(9));
        let rails = RailSet::positions_only();
        let player = Player::new(&rails, &mut scene, default_reset);
        (player, rails, scene)
    }

    #[test]
    fn starts_on_middle_rail() {
        let (player, _, _) = setup(true);
        assert_eq!(player.current_rail(), LANE_COUNT / 2);
    }

    #[test]
    fn steering_clamps_at_lane_bounds() {
        let (mut player, rails, mut scene) = setup(false);
        for _ in 0..5 {
            player.update(0.016, InputState::LEFT, &rails, &mut scene);
        }
        assert_eq!(player.current_rail(), 0);

        for _ in 0..5 {
            player.update(0.016, InputState::RIGHT, &rails, &mut scene);
        }
        assert_eq!(player.current_rail(), LANE_COUNT - 1);

        player.update(0.016, InputState::NONE, &rails, &mut scene);
        assert_eq!(player.current_rail(), LANE_COUNT - 1, "no snap-back when disabled");
    }

    #[test]
    fn releasing_input_snaps_to_default_rail() {
        let (mut player, rails, mut scene) = setup(true);
        player.update(0.016, InputState::LEFT, &rails, &mut scene);
        assert_eq!(player.current_rail(), DEFAULT_LANE - 1);
        player.update(0.016, InputState::NONE, &rails, &mut scene);
        assert_eq!(player.current_rail(), DEFAULT_LANE);
    }

    #[test]
    fn position_follows_current_rail() {
        let (mut player, rails, mut scene) = setup(false);
        for _ in 0..60 {
            player.update(0.016, InputState::RIGHT, &rails, &mut scene);
        }
        let target = rails.get(LANE_COUNT - 1).map(|r| r.anchor()).expect("last lane");
        let pos = scene.entity(player.entity()).map(|e| e.position()).expect("player entity");
        assert!((pos.x - target.x).abs() < 1e-3, "player at {pos:?}, rail at {target:?}");
    }

    #[test]
    fn hit_bumps_scale_then_decays() {
        let (mut player, rails, mut scene) = setup(true);
        player.hit(&mut scene);
        assert_eq!(player.hits(), 1);
        assert_eq!(player.scale(), PLAYER_HIT_SCALE);
        assert_eq!(scene.particles.bursts_emitted(), 1);

        player.update(0.1, InputState::NONE, &rails, &mut scene);
        assert!(player.scale() < PLAYER_HIT_SCALE);
        for _ in 0..10 {
            player.update(0.1, InputState::NONE, &rails, &mut scene);
        }
        assert_eq!(player.scale(), PLAYER_REST_SCALE);
    }
}
