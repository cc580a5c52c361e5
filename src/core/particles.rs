use crate::core::recycler::{Recyclable, Recycler};
use crate::core::scene::{Entity, EntityKind};
use cgmath::{InnerSpace, Vector3};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SPARK_LIFETIME: f32 = 0.5;
const SPARK_SPEED: f32 = 1.5;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BurstSize {
    /// Spawn puff on a rail.
    Small,
    /// Confirmation flash on a hit.
    Medium,
}

impl BurstSize {
    const fn spark_count(self) -> usize {
        match self {
            BurstSize::Small => 4,
            BurstSize::Medium => 12,
        }
    }

    const fn spark_scale(self) -> f32 {
        match self {
            BurstSize::Small => 0.1,
            BurstSize::Medium => 0.25,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Spark {
    entity: Entity,
    velocity: Vector3<f32>,
    age: f32,
    start_scale: f32,
}

impl Spark {
    fn blank() -> Self {
        Self {
            entity: Entity::new(EntityKind::Spark),
            velocity: Vector3::new(0.0, 0.0, 0.0),
            age: 0.0,
            start_scale: 0.0,
        }
    }

    fn launch(&mut self, at: Vector3<f32>, velocity: Vector3<f32>, scale: f32) {
        self.entity.set_position(at);
        self.entity.set_uniform_scale(scale);
        self.velocity = velocity;
        self.age = 0.0;
        self.start_scale = scale;
    }
}

impl Recyclable for Spark {
    fn is_active(&self) -> bool {
        self.entity.is_active()
    }
    fn activate(&mut self) {
        self.entity.activate();
    }
    fn deactivate(&mut self) {
        self.entity.deactivate();
    }
}

/// Short-lived cosmetic sparks. Nothing here feeds back into judgment.
#[derive(Debug)]
pub struct ParticleField {
    sparks: Recycler<Spark>,
    rng: StdRng,
    bursts_emitted: u32,
}

impl Default for ParticleField {
    fn default() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }
}

impl ParticleField {
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self { sparks: Recycler::with_capacity(64), rng, bursts_emitted: 0 }
    }

    pub fn emit_burst(&mut self, at: Vector3<f32>, size: BurstSize) {
        for _ in 0..size.spark_count() {
            let dir = Vector3::new(
                self.rng.random_range(-1.0f32..1.0),
                self.rng.random_range(0.2f32..1.0),
                self.rng.random_range(-1.0f32..1.0),
            );
            let velocity = if dir.magnitude2() > f32::EPSILON {
                dir.normalize() * SPARK_SPEED
            } else {
                Vector3::unit_y() * SPARK_SPEED
            };

            let slot = match self.sparks.reactivate() {
                Some(slot) => slot,
                None => self.sparks.insert(Spark::blank()),
            };
            if let Some(spark) = self.sparks.get_mut(slot) {
                spark.launch(at, velocity, size.spark_scale());
            }
        }
        self.bursts_emitted = self.bursts_emitted.saturating_add(1);
        debug!("Burst {:?} at ({:.2}, {:.2}, {:.2})", size, at.x, at.y, at.z);
    }

    pub fn update(&mut self, delta_time: f32) {
        for spark in self.sparks.iter_active_mut() {
            spark.age += delta_time;
            if spark.age >= SPARK_LIFETIME {
                spark.deactivate();
                continue;
            }
            let pos = spark.entity.position() + spark.velocity * delta_time;
            spark.entity.set_position(pos);
            let remaining = 1.0 - spark.age / SPARK_LIFETIME;
            spark.entity.set_uniform_scale(spark.start_scale * remaining);
        }
    }

    pub fn sparks(&self) -> impl Iterator<Item = &Entity> {
        self.sparks.iter_active().map(|s| &s.entity)
    }

    pub fn live_sparks(&self) -> usize {
        self.sparks.iter_active().count()
    }

    pub fn bursts_emitted(&self) -> u32 {
        self.bursts_emitted
    }

    /// Total spark objects ever allocated.
    pub fn capacity_used(&self) -> usize {
        self.sparks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparks_expire_and_are_reused() {
        let mut field = ParticleField::seeded(42);
        field.emit_burst(Vector3::new(0.0, 0.0, 0.0), BurstSize::Medium);
        assert_eq!(field.live_sparks(), 12);

        field.update(SPARK_LIFETIME + 0.01);
        assert_eq!(field.live_sparks(), 0, "sparks must die after their lifetime");

        field.emit_burst(Vector3::new(1.0, 0.0, 0.0), BurstSize::Small);
        assert_eq!(field.live_sparks(), 4);
        assert_eq!(field.capacity_used(), 12, "second burst must reuse expired sparks");
        assert_eq!(field.bursts_emitted(), 2);
    }

    #[test]
    fn sparks_shrink_while_alive() {
        let mut field = ParticleField::seeded(1);
        field.emit_burst(Vector3::new(0.0, 0.0, 0.0), BurstSize::Medium);
        field.update(SPARK_LIFETIME * 0.5);
        for spark in field.sparks() {
            assert!(spark.scale().x < BurstSize::Medium.spark_scale());
            assert!(spark.scale().x > 0.0);
        }
    }
}
