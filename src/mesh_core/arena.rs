use std::marker::PhantomData;

use super::handles::FixedHandleImpl;

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational storage for simplices.
///
/// Removing an element frees its slot for reuse and increments the slot's generation,
/// handles pointing to the removed element become stale. Accessing an element through a
/// stale handle with [Self::get] or [Self::get_mut] panics, [Self::try_get] returns `None`.
pub(crate) struct SimplexArena<T, Tag> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
    tag: PhantomData<Tag>,
}

impl<T, Tag: Default + Copy> Default for SimplexArena<T, Tag> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, Tag: Default + Copy> SimplexArena<T, Tag> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            tag: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn insert(&mut self, value: T) -> FixedHandleImpl<Tag> {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.value.is_none());
            slot.value = Some(value);
            FixedHandleImpl::new(index as usize, slot.generation)
        } else {
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            FixedHandleImpl::new(self.slots.len() - 1, 0)
        }
    }

    /// Removes an element. Returns `None` if the handle is stale.
    pub fn remove(&mut self, handle: FixedHandleImpl<Tag>) -> Option<T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation() {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index() as u32);
        self.len -= 1;
        Some(value)
    }

    pub fn try_get(&self, handle: FixedHandleImpl<Tag>) -> Option<&T> {
        let slot = self.slots.get(handle.index())?;
        if slot.generation == handle.generation() {
            slot.value.as_ref()
        } else {
            None
        }
    }

    pub fn try_get_mut(&mut self, handle: FixedHandleImpl<Tag>) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation == handle.generation() {
            slot.value.as_mut()
        } else {
            None
        }
    }

    #[track_caller]
    pub fn get(&self, handle: FixedHandleImpl<Tag>) -> &T {
        match self.try_get(handle) {
            Some(value) => value,
            None => panic!("Access to a removed simplex: {:?}", handle),
        }
    }

    #[track_caller]
    pub fn get_mut(&mut self, handle: FixedHandleImpl<Tag>) -> &mut T {
        match self.try_get_mut(handle) {
            Some(value) => value,
            None => panic!("Access to a removed simplex: {:?}", handle),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (FixedHandleImpl<Tag>, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|value| (FixedHandleImpl::new(index, slot.generation), value))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (FixedHandleImpl<Tag>, &mut T)> + '_ {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.value
                .as_mut()
                .map(|value| (FixedHandleImpl::new(index, generation), value))
        })
    }

    pub fn handles(&self) -> Vec<FixedHandleImpl<Tag>> {
        self.iter().map(|(handle, _)| handle).collect()
    }
}

#[cfg(test)]
mod test {
    use super::SimplexArena;
    use crate::handles::TriangleTag;

    #[test]
    fn test_insert_remove_reuse() {
        let mut arena = SimplexArena::<&str, TriangleTag>::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.len(), 2);
        assert_eq!(*arena.get(a), "a");

        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.remove(a), None);
        assert!(arena.try_get(a).is_none());
        assert_eq!(arena.len(), 1);

        let c = arena.insert("c");
        assert_eq!(c.index(), a.index());
        assert_ne!(c, a);
        assert!(arena.try_get(a).is_none());
        assert_eq!(*arena.get(c), "c");

        let handles = arena.handles();
        assert_eq!(handles, vec![c, b]);
        for (_, value) in arena.iter_mut() {
            *value = "x";
        }
        assert!(arena.iter().all(|(_, value)| *value == "x"));
    }

    #[test]
    #[should_panic]
    fn test_stale_access_panics() {
        let mut arena = SimplexArena::<u32, TriangleTag>::new();
        let handle = arena.insert(1);
        arena.remove(handle);
        arena.get(handle);
    }
}
