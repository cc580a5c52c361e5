// Object pool shared by note nodes and particle entities.
//
// Lookup of a reusable object is a linear scan over every tracked object. At
// the sizes this game runs (tens of nodes) that is fine; a free-list of
// inactive slots would make `reactivate` O(1) if pools ever grow large.

/// Anything the recycler can track. The active flag is independent of any
/// gameplay state the object carries.
pub trait Recyclable {
    fn is_active(&self) -> bool;
    fn activate(&mut self);
    fn deactivate(&mut self);
}

/// Stable handle to an object stored in a [`Recycler`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Slot(usize);

#[derive(Debug)]
pub struct Recycler<T> {
    objects: Vec<T>,
}

impl<T> Default for Recycler<T> {
    fn default() -> Self {
        Self { objects: Vec::new() }
    }
}

impl<T: Recyclable> Recycler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { objects: Vec::with_capacity(capacity) }
    }

    /// Takes ownership of a freshly built object and marks it active.
    pub fn insert(&mut self, mut object: T) -> Slot {
        object.activate();
        self.objects.push(object);
        Slot(self.objects.len() - 1)
    }

    /// Takes ownership of an object and parks it as available for reuse.
    pub fn retire(&mut self, mut object: T) -> Slot {
        object.deactivate();
        self.objects.push(object);
        Slot(self.objects.len() - 1)
    }

    /// Flags a tracked object inactive. Repeated calls are harmless and never
    /// grow the tracking list. Returns `false` for an unknown slot.
    pub fn deactivate(&mut self, slot: Slot) -> bool {
        match self.objects.get_mut(slot.0) {
            Some(object) => {
                object.deactivate();
                true
            }
            None => false,
        }
    }

    /// First tracked object whose active flag is clear, now flagged active.
    /// `None` when the pool is empty or every object is in use.
    pub fn reactivate(&mut self) -> Option<Slot> {
        let index = self.objects.iter().position(|o| !o.is_active())?;
        self.objects[index].activate();
        Some(Slot(index))
    }

    #[inline(always)]
    pub fn get(&self, slot: Slot) -> Option<&T> {
        self.objects.get(slot.0)
    }

    #[inline(always)]
    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut T> {
        self.objects.get_mut(slot.0)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn available(&self) -> usize {
        self.objects.iter().filter(|o| !o.is_active()).count()
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &T> {
        self.objects.iter().filter(|o| o.is_active())
    }

    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.objects.iter_mut().filter(|o| o.is_active())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Crate {
        active: bool,
        id: u32,
    }

    impl Recyclable for Crate {
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

    #[test]
    fn empty_pool_reports_nothing_available() {
        let mut pool: Recycler<Crate> = Recycler::new();
        assert!(pool.reactivate().is_none(), "empty pool must not hand out objects");
    }

    #[test]
    fn exhausted_pool_reports_nothing_available() {
        let mut pool = Recycler::new();
        pool.insert(Crate { id: 1, ..Default::default() });
        pool.insert(Crate { id: 2, ..Default::default() });
        assert!(pool.reactivate().is_none(), "all objects are in use");
    }

    #[test]
    fn double_deactivate_keeps_single_entry() {
        let mut pool = Recycler::new();
        let slot = pool.insert(Crate { id: 7, ..Default::default() });
        assert!(pool.deactivate(slot));
        assert!(pool.deactivate(slot));
        assert_eq!(pool.len(), 1, "tracking list must not grow on repeat deactivate");
        assert_eq!(pool.available(), 1);

        assert_eq!(pool.reactivate(), Some(slot));
        assert!(pool.reactivate().is_none(), "object must be handed out only once");
    }

    #[test]
    fn reactivate_scans_for_first_inactive() {
        let mut pool = Recycler::new();
        let a = pool.insert(Crate { id: 1, ..Default::default() });
        let b = pool.retire(Crate { id: 2, ..Default::default() });
        let c = pool.retire(Crate { id: 3, ..Default::default() });
        assert!(pool.get(a).is_some_and(|o| o.is_active()));

        assert_eq!(pool.reactivate(), Some(b));
        assert_eq!(pool.reactivate(), Some(c));
        assert_eq!(pool.get(c).map(|o| o.id), Some(3));
        assert!(pool.reactivate().is_none());
    }

    #[test]
    fn unknown_slot_is_rejected() {
        let mut pool: Recycler<Crate> = Recycler::new();
        assert!(!pool.deactivate(Slot(3)));
        assert!(pool.get(Slot(0)).is_none());
    }
}
