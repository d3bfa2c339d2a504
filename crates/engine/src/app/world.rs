use crate::resource::ResourceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_sq(self, other: Self) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        dx * dx + dy * dy + dz * dz
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn around(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: Vec3::new(
                center.x - half_extents.x,
                center.y - half_extents.y,
                center.z - half_extents.z,
            ),
            max: Vec3::new(
                center.x + half_extents.x,
                center.y + half_extents.y,
                center.z + half_extents.z,
            ),
        }
    }

    pub fn inflate(&self, amount: f64) -> Self {
        Self {
            min: Vec3::new(self.min.x - amount, self.min.y - amount, self.min.z - amount),
            max: Vec3::new(self.max.x + amount, self.max.y + amount, self.max.z + amount),
        }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub type_id: ResourceId,
    pub position: Vec3,
    pub half_extents: Vec3,
}

impl Entity {
    pub fn bounding_box(&self) -> Aabb {
        Aabb::around(self.position, self.half_extents)
    }

    pub fn distance_sq_to(&self, other: &Entity) -> f64 {
        self.position.distance_sq(other.position)
    }
}

#[derive(Debug)]
enum PendingChange {
    Spawn(Entity),
    Despawn(EntityId),
}

/// Client-side view of the loaded world.
///
/// Spawns and despawns queue up until [`ClientWorld::apply_pending`], so
/// handlers see the same entity list for the whole tick. Entities iterate in
/// the order their spawns were applied.
#[derive(Debug, Default)]
pub struct ClientWorld {
    next_id: u64,
    entities: Vec<Entity>,
    pending: Vec<PendingChange>,
}

impl ClientWorld {
    pub fn spawn(&mut self, type_id: ResourceId, position: Vec3, half_extents: Vec3) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.pending.push(PendingChange::Spawn(Entity {
            id,
            type_id,
            position,
            half_extents,
        }));
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let queued = self
            .pending
            .iter()
            .any(|change| matches!(change, PendingChange::Spawn(entity) if entity.id == id));
        if !queued && self.find_entity(id).is_none() {
            return false;
        }
        self.pending.push(PendingChange::Despawn(id));
        true
    }

    pub fn apply_pending(&mut self) {
        for change in std::mem::take(&mut self.pending) {
            match change {
                PendingChange::Spawn(entity) => self.entities.push(entity),
                PendingChange::Despawn(id) => self.entities.retain(|entity| entity.id != id),
            }
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn set_position(&mut self, id: EntityId, position: Vec3) -> bool {
        let Some(entity) = self.entities.iter_mut().find(|entity| entity.id == id) else {
            return false;
        };
        entity.position = position;
        true
    }

    pub fn entities_within<'a>(
        &'a self,
        bounds: &'a Aabb,
        except: Option<EntityId>,
    ) -> impl Iterator<Item = &'a Entity> + 'a {
        self.entities.iter().filter(move |entity| {
            Some(entity.id) != except && entity.bounding_box().intersects(bounds)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zombie() -> ResourceId {
        ResourceId::parse("test:zombie").expect("id")
    }

    fn unit_box() -> Vec3 {
        Vec3::new(0.5, 1.0, 0.5)
    }

    #[test]
    fn ids_are_never_reused() {
        let mut world = ClientWorld::default();
        let first = world.spawn(zombie(), Vec3::ZERO, unit_box());
        world.apply_pending();
        assert!(world.despawn(first));
        world.apply_pending();

        let second = world.spawn(zombie(), Vec3::ZERO, unit_box());
        assert_eq!(second.0, first.0 + 1);
    }

    #[test]
    fn spawns_wait_for_apply_and_keep_their_order() {
        let mut world = ClientWorld::default();
        let a = world.spawn(zombie(), Vec3::ZERO, unit_box());
        let b = world.spawn(zombie(), Vec3::new(2.0, 0.0, 0.0), unit_box());
        assert_eq!(world.entity_count(), 0);
        assert!(world.find_entity(a).is_none());

        world.apply_pending();
        let order = world.entities().iter().map(|entity| entity.id).collect::<Vec<_>>();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn duplicate_despawns_are_idempotent() {
        let mut world = ClientWorld::default();
        let id = world.spawn(zombie(), Vec3::ZERO, unit_box());
        world.apply_pending();

        assert!(world.despawn(id));
        assert!(world.despawn(id));
        world.apply_pending();
        assert_eq!(world.entity_count(), 0);
        assert!(!world.despawn(id), "gone once applied");
    }

    #[test]
    fn despawn_of_pending_spawn_drops_it() {
        let mut world = ClientWorld::default();
        let id = world.spawn(zombie(), Vec3::ZERO, unit_box());
        assert!(world.despawn(id));
        world.apply_pending();
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn inflate_grows_every_axis() {
        let bounds = Aabb::around(Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0)).inflate(2.0);
        assert_eq!(bounds.min, Vec3::new(-3.0, -3.0, -3.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 3.0, 3.0));
    }

    #[test]
    fn entities_within_filters_by_bounds_and_excludes_self() {
        let mut world = ClientWorld::default();
        let listener = world.spawn(zombie(), Vec3::ZERO, unit_box());
        let near = world.spawn(zombie(), Vec3::new(10.0, 0.0, 0.0), unit_box());
        let far = world.spawn(zombie(), Vec3::new(100.0, 0.0, 0.0), unit_box());
        world.apply_pending();

        let bounds = world
            .find_entity(listener)
            .expect("listener")
            .bounding_box()
            .inflate(30.0);
        let found = world
            .entities_within(&bounds, Some(listener))
            .map(|entity| entity.id)
            .collect::<Vec<_>>();
        assert_eq!(found, vec![near]);
        assert!(!found.contains(&far));
    }

    #[test]
    fn set_position_moves_applied_entities_only() {
        let mut world = ClientWorld::default();
        let id = world.spawn(zombie(), Vec3::ZERO, unit_box());
        assert!(!world.set_position(id, Vec3::new(1.0, 0.0, 0.0)));
        world.apply_pending();
        assert!(world.set_position(id, Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(
            world.find_entity(id).expect("entity").position,
            Vec3::new(1.0, 0.0, 0.0)
        );
    }

    #[test]
    fn distance_sq_avoids_square_root() {
        assert_eq!(Vec3::ZERO.distance_sq(Vec3::new(3.0, 4.0, 0.0)), 25.0);
    }
}
