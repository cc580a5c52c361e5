use crate::core::particles::ParticleField;
use crate::core::recycler::Recyclable;
use cgmath::Vector3;

/// What a renderer should draw for an entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Rail,
    Player,
    Node,
    Spark,
}

#[derive(Clone, Debug)]
pub struct Entity {
    pub kind: EntityKind,
    position: Vector3<f32>,
    scale: Vector3<f32>,
    active: bool,
}

impl Entity {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            position: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
            active: false,
        }
    }

    #[inline(always)]
    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    #[inline(always)]
    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
    }

    #[inline(always)]
    pub fn scale(&self) -> Vector3<f32> {
        self.scale
    }

    #[inline(always)]
    pub fn set_scale(&mut self, scale: Vector3<f32>) {
        self.scale = scale;
    }

    #[inline(always)]
    pub fn set_uniform_scale(&mut self, s: f32) {
        self.scale = Vector3::new(s, s, s);
    }
}

impl Recyclable for Entity {
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

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityId(usize);

/// The scene's entity list plus the particle field. Gameplay objects hold
/// [`EntityId`]s into it; the renderer only ever reads it.
#[derive(Debug, Default)]
pub struct Scene {
    entities: Vec<Entity>,
    pub particles: ParticleField,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_particles(particles: ParticleField) -> Self {
        Self { entities: Vec::new(), particles }
    }

    pub fn register(&mut self, entity: Entity) -> EntityId {
        self.entities.push(entity);
        EntityId(self.entities.len() - 1)
    }

    #[inline(always)]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0)
    }

    #[inline(always)]
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.0)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Active entities of one kind, sparks excluded.
    pub fn active_count(&self, kind: EntityKind) -> usize {
        self.entities
            .iter()
            .filter(|e| e.kind == kind && e.is_active())
            .count()
    }

    pub fn update(&mut self, delta_time: f32) {
        self.particles.update(delta_time);
    }
}
