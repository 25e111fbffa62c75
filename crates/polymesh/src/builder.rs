//! Deduplicating construction layer over [`MeshStore`].
//!
//! The builder hands out stable ids for "the vertex at position P" and "the
//! edge between A and B", so faces assembled through it share corners and
//! edges without manual bookkeeping. A face's edges are always derived by
//! walking its corner cycle through the same edge table its neighbours used.

use std::collections::HashMap;

use glam::Vec3;
use polymesh_config::Tolerances;
use tracing::debug;

use crate::store::MeshStore;
use crate::types::{EdgeId, FaceId, VertexId};

/// Canonical edge key: endpoints ordered by numeric id
pub(crate) fn edge_key(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Collapse consecutive repeated ids, including across the wrap-around
pub fn collapse_repeats(vertex_ids: &[VertexId]) -> Vec<VertexId> {
    let mut cycle: Vec<VertexId> = Vec::with_capacity(vertex_ids.len());
    for &v in vertex_ids {
        if cycle.last() != Some(&v) {
            cycle.push(v);
        }
    }
    while cycle.len() > 1 && cycle.first() == cycle.last() {
        cycle.pop();
    }
    cycle
}

/// Deduplicating façade over a borrowed [`MeshStore`]
#[derive(Debug)]
pub struct MeshBuilder<'a> {
    store: &'a mut MeshStore,
    tolerances: Tolerances,
    vertex_table: HashMap<[i64; 3], VertexId>,
    edge_table: HashMap<(VertexId, VertexId), EdgeId>,
}

impl<'a> MeshBuilder<'a> {
    /// Create a builder with empty dedup tables
    pub fn new(store: &'a mut MeshStore) -> Self {
        Self::with_tolerances(store, Tolerances::default())
    }

    /// Create a builder with empty dedup tables and custom tolerances
    pub fn with_tolerances(store: &'a mut MeshStore, tolerances: Tolerances) -> Self {
        Self {
            store,
            tolerances,
            vertex_table: HashMap::new(),
            edge_table: HashMap::new(),
        }
    }

    /// Create a builder whose tables already know the store's vertices and edges.
    ///
    /// When the store holds duplicates, the lowest id wins.
    pub fn indexing(store: &'a mut MeshStore) -> Self {
        Self::indexing_with(store, Tolerances::default())
    }

    /// [`indexing`](Self::indexing) with custom tolerances
    pub fn indexing_with(store: &'a mut MeshStore, tolerances: Tolerances) -> Self {
        let mut vertex_table = HashMap::new();
        for v in store.vertices() {
            vertex_table
                .entry(tolerances.weld_key(v.position.to_array()))
                .or_insert(v.id);
        }
        let mut edge_table = HashMap::new();
        for e in store.edges() {
            if e.vertex_ids[0] != e.vertex_ids[1] {
                edge_table
                    .entry(edge_key(e.vertex_ids[0], e.vertex_ids[1]))
                    .or_insert(e.id);
            }
        }
        Self {
            store,
            tolerances,
            vertex_table,
            edge_table,
        }
    }

    /// Read access to the underlying store
    pub fn store(&self) -> &MeshStore {
        &*self.store
    }

    /// Unchecked access to the underlying store.
    ///
    /// Elements removed or moved through this handle are detected lazily:
    /// stale table entries are re-created on the next request.
    pub fn store_mut(&mut self) -> &mut MeshStore {
        &mut *self.store
    }

    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    // ========================================================================
    // Vertices and edges
    // ========================================================================

    /// The vertex at `position`, created if no vertex shares its weld key
    pub fn vertex(&mut self, position: Vec3) -> VertexId {
        self.named_vertex(position, None)
    }

    /// Like [`vertex`](Self::vertex); the name is only used when a vertex is created
    pub fn named_vertex(&mut self, position: Vec3, name: Option<String>) -> VertexId {
        let key = self.tolerances.weld_key(position.to_array());
        if let Some(&id) = self.vertex_table.get(&key) {
            let still_there = self
                .store
                .position(id)
                .is_some_and(|p| self.tolerances.weld_key(p.to_array()) == key);
            if still_there {
                return id;
            }
        }
        let id = self.store.add_vertex(position, name);
        self.vertex_table.insert(key, id);
        id
    }

    /// Record an existing vertex under its current position key.
    ///
    /// Does nothing if another live vertex already owns the key.
    pub fn register_vertex(&mut self, vertex_id: VertexId) {
        let Some(position) = self.store.position(vertex_id) else {
            return;
        };
        let key = self.tolerances.weld_key(position.to_array());
        let owner_alive = self
            .vertex_table
            .get(&key)
            .is_some_and(|&owner| self.store.vertex(owner).is_some());
        if !owner_alive {
            self.vertex_table.insert(key, vertex_id);
        }
    }

    /// The edge joining `a` and `b` in either direction, created on demand.
    ///
    /// Returns `None` when `a == b`, since an edge needs two distinct endpoints.
    pub fn edge(&mut self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        if a == b {
            return None;
        }
        let key = edge_key(a, b);
        if let Some(&id) = self.edge_table.get(&key) {
            if self.store.edge(id).is_some_and(|e| e.connects(a, b)) {
                return Some(id);
            }
        }
        let id = self.store.add_edge(key.0, key.1, None);
        self.edge_table.insert(key, id);
        Some(id)
    }

    /// Edge ids for a corner cycle, one per consecutive pair including the wrap
    pub fn cycle_edges(&mut self, vertex_ids: &[VertexId]) -> Option<Vec<EdgeId>> {
        let n = vertex_ids.len();
        (0..n)
            .map(|i| self.edge(vertex_ids[i], vertex_ids[(i + 1) % n]))
            .collect()
    }

    // ========================================================================
    // Faces
    // ========================================================================

    /// Add a triangle from an already deduplicated corner cycle
    pub fn add_triangle(&mut self, vertex_ids: [VertexId; 3]) -> Option<FaceId> {
        self.add_ngon(&vertex_ids)
    }

    /// Add a quad from an already deduplicated corner cycle
    pub fn add_quad(&mut self, vertex_ids: [VertexId; 4]) -> Option<FaceId> {
        self.add_ngon(&vertex_ids)
    }

    /// Add a polygon from an already deduplicated corner cycle.
    ///
    /// Consecutive repeats are collapsed first. Returns `None` if fewer than
    /// three corners remain.
    pub fn add_ngon(&mut self, vertex_ids: &[VertexId]) -> Option<FaceId> {
        let cycle = collapse_repeats(vertex_ids);
        if cycle.len() < 3 {
            return None;
        }
        let edges = self.cycle_edges(&cycle)?;
        Some(self.store.add_face(cycle, edges, None))
    }

    /// Add a polygon from corner positions, welding each through the vertex table
    pub fn add_polygon(&mut self, positions: &[Vec3]) -> Option<FaceId> {
        let ids: Vec<VertexId> = positions.iter().map(|&p| self.vertex(p)).collect();
        self.add_ngon(&ids)
    }

    // ========================================================================
    // Grids
    // ========================================================================

    /// Build a `rows × cols` grid of deduplicated vertices.
    ///
    /// `position(row, col)` supplies each point. Coincident points (seams,
    /// poles) resolve to the same id. A zero dimension yields an empty grid.
    pub fn create_vertex_grid(
        &mut self,
        rows: usize,
        cols: usize,
        mut position: impl FnMut(usize, usize) -> Vec3,
    ) -> Vec<Vec<VertexId>> {
        if rows == 0 || cols == 0 {
            return Vec::new();
        }
        let before = self.store.vertex_count();
        let grid: Vec<Vec<VertexId>> = (0..rows)
            .map(|r| (0..cols).map(|c| self.vertex(position(r, c))).collect())
            .collect();
        debug!(
            "create_vertex_grid: {}x{} requested, {} new vertices",
            rows,
            cols,
            self.store.vertex_count() - before
        );
        grid
    }

    /// Tile a vertex grid with quads.
    ///
    /// Each cell is wound `(r, c) → (r, c+1) → (r+1, c+1) → (r+1, c)`. With
    /// `wrap_columns` the last column also connects back to the first.
    /// Cells collapsing to a triangle are emitted as triangles; fully
    /// degenerate cells are skipped.
    pub fn create_faces_from_grid(
        &mut self,
        grid: &[Vec<VertexId>],
        wrap_columns: bool,
    ) -> Vec<FaceId> {
        let mut faces = Vec::new();
        if grid.len() < 2 {
            return faces;
        }
        let cols = grid.iter().map(Vec::len).min().unwrap_or(0);
        if cols == 0 {
            return faces;
        }
        let cells = if wrap_columns { cols } else { cols - 1 };

        for r in 0..grid.len() - 1 {
            for c in 0..cells {
                let c1 = (c + 1) % cols;
                let quad = [grid[r][c], grid[r][c1], grid[r + 1][c1], grid[r + 1][c]];
                if let Some(face) = self.add_quad(quad) {
                    faces.push(face);
                }
            }
        }
        faces
    }
}
