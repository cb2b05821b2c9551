//! Slot arena shared by the memory providers.
//!
//! Records never move: a slot index is stable for the provider's lifetime.
//! Free slots sit on a LIFO stack so the most recently released record is the
//! next one leased; leased slots are flagged in place, which makes release a
//! constant-time lookup instead of a search.

use super::provider::BufferId;

#[derive(Debug)]
pub(crate) struct Slot<B> {
    pub backing: Option<B>,
    pub capacity: usize,
    generation: u32,
    in_use: bool,
}

impl<B> Slot<B> {
    fn empty() -> Self {
        Self {
            backing: None,
            capacity: 0,
            generation: 0,
            in_use: false,
        }
    }
}

#[derive(Debug)]
pub(crate) struct BufferArena<B> {
    slots: Vec<Slot<B>>,
    free: Vec<u32>,
    used: usize,
}

impl<B> Default for BufferArena<B> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            used: 0,
        }
    }
}

impl<B> BufferArena<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the slot the next lease will use, creating an empty record
    /// when the free stack is exhausted. The slot stays free until
    /// [`BufferArena::lease`] is called.
    pub fn next_free(&mut self) -> u32 {
        if let Some(&index) = self.free.last() {
            return index;
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot::empty());
        self.free.push(index);
        index
    }

    pub fn slot_mut(&mut self, index: u32) -> &mut Slot<B> {
        &mut self.slots[index as usize]
    }

    /// Move the slot returned by [`BufferArena::next_free`] to the used set.
    pub fn lease(&mut self, index: u32) -> BufferId {
        let popped = self.free.pop();
        debug_assert_eq!(popped, Some(index));

        let slot = &mut self.slots[index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        slot.in_use = true;
        self.used += 1;
        BufferId::new(index, slot.generation)
    }

    /// Move a leased slot back to the free stack.
    ///
    /// Returns `None`, leaving every record untouched, when `id` does not name
    /// a current lease.
    pub fn release(&mut self, id: BufferId) -> Option<&mut Slot<B>> {
        let index = id.slot();
        let slot = self.slots.get_mut(index as usize)?;
        if !slot.in_use || slot.generation != id.generation() {
            return None;
        }

        slot.in_use = false;
        self.used -= 1;
        self.free.push(index);
        Some(slot)
    }

    /// Slot of a current lease.
    pub fn leased(&self, id: BufferId) -> Option<&Slot<B>> {
        self.slots
            .get(id.slot() as usize)
            .filter(|slot| slot.in_use && slot.generation == id.generation())
    }

    /// First current lease whose backing satisfies `pred`.
    pub fn find_leased(&self, mut pred: impl FnMut(&B) -> bool) -> Option<BufferId> {
        self.slots.iter().enumerate().find_map(|(index, slot)| {
            let backing = slot.backing.as_ref()?;
            (slot.in_use && pred(backing)).then(|| BufferId::new(index as u32, slot.generation))
        })
    }

    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    pub fn used_len(&self) -> usize {
        self.used
    }

    pub fn bytes_reserved(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.backing.is_some())
            .map(|slot| slot.capacity)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partitioned<B>(arena: &BufferArena<B>) {
        for (index, slot) in arena.slots.iter().enumerate() {
            let on_free = arena.free.contains(&(index as u32));
            assert_ne!(on_free, slot.in_use, "slot {} must be free xor used", index);
        }
        assert_eq!(arena.free_len() + arena.used_len(), arena.slots.len());
    }

    #[test]
    fn test_lease_and_release() {
        let mut arena: BufferArena<Vec<u8>> = BufferArena::new();

        let index = arena.next_free();
        let id = arena.lease(index);
        assert_eq!(arena.used_len(), 1);
        assert_eq!(arena.free_len(), 0);
        assert_partitioned(&arena);

        assert!(arena.release(id).is_some());
        assert_eq!(arena.used_len(), 0);
        assert_eq!(arena.free_len(), 1);
        assert_partitioned(&arena);
    }

    #[test]
    fn test_double_release_is_rejected() {
        let mut arena: BufferArena<Vec<u8>> = BufferArena::new();
        let index = arena.next_free();
        let id = arena.lease(index);

        assert!(arena.release(id).is_some());
        assert!(arena.release(id).is_none());
        assert_eq!(arena.free_len(), 1);
        assert_partitioned(&arena);
    }

    #[test]
    fn test_stale_generation_is_rejected() {
        let mut arena: BufferArena<Vec<u8>> = BufferArena::new();
        let index = arena.next_free();
        let stale = arena.lease(index);
        arena.release(stale);

        let index = arena.next_free();
        let current = arena.lease(index);
        assert_eq!(stale.slot(), current.slot());
        assert_ne!(stale, current);

        assert!(arena.release(stale).is_none());
        assert!(arena.leased(current).is_some());
        assert_eq!(arena.used_len(), 1);
    }

    #[test]
    fn test_last_released_is_reused_first() {
        let mut arena: BufferArena<Vec<u8>> = BufferArena::new();
        let a = {
            let i = arena.next_free();
            arena.lease(i)
        };
        let b = {
            let i = arena.next_free();
            arena.lease(i)
        };

        arena.release(a);
        arena.release(b);

        assert_eq!(arena.next_free(), b.slot());
    }

    #[test]
    fn test_out_of_range_id() {
        let mut arena: BufferArena<Vec<u8>> = BufferArena::new();
        assert!(arena.release(BufferId::new(7, 1)).is_none());
        assert!(arena.leased(BufferId::new(7, 1)).is_none());
    }

    #[test]
    fn test_find_leased() {
        let mut arena: BufferArena<u64> = BufferArena::new();
        let index = arena.next_free();
        arena.slot_mut(index).backing = Some(42);
        let id = arena.lease(index);

        assert_eq!(arena.find_leased(|b| *b == 42), Some(id));
        assert_eq!(arena.find_leased(|b| *b == 7), None);

        arena.release(id);
        assert_eq!(arena.find_leased(|b| *b == 42), None);
    }
}
