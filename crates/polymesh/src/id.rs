//! Id allocation for mesh elements.

/// Issues unique, monotonically increasing ids for one mesh.
///
/// Every collection of a [`MeshStore`](crate::MeshStore) draws from the same
/// allocator, so an id is never reused within a mesh, even across kinds.
/// Independent stores own independent allocators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start issuing ids at `first`
    pub fn starting_at(first: u32) -> Self {
        Self { next: first }
    }

    /// Issue the next id
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The id the next call to [`next_id`](Self::next_id) will return
    pub fn peek(&self) -> u32 {
        self.next
    }

    /// Make sure future ids are strictly greater than `id`
    pub fn reserve_through(&mut self, id: u32) {
        if id >= self.next {
            self.next = id + 1;
        }
    }
}
