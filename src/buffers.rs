//! Flat vertex buffers for a particle pool.
//!
//! Every particle slot owns one contiguous block of `mesh_vertex_count`
//! vertices in every attribute array. Slot `i` of an attribute with `c`
//! components occupies
//!
//! ```text
//! [i * mesh_vertex_count * c, (i + 1) * mesh_vertex_count * c)
//! ```
//!
//! and the same per-particle values are repeated for each of those vertices.
//! The mesh-template attributes (`POSITION`, `TEXCOORD0`) are copied unchanged
//! into every slot. With this layout a single indexed draw renders the whole
//! pool and the vertex shader reconstructs each particle from `TIME_INFO`,
//! `START_POS` and `START_DIR` alone.
//!
//! | Attribute | Components | Contents |
//! |-----------|------------|----------|
//! | `POSITION` | 3 | template vertex position |
//! | `TEXCOORD0` | 2 | template texture coordinate |
//! | `TIME_INFO` | 4 | `(life_time, active, life_time, emit_time)` |
//! | `START_POS` | 3 | particle start position |
//! | `START_DIR` | 3 | particle start direction |
//!
//! Writes set a per-attribute dirty flag; uploading is whole-buffer.

use std::ops::Range;

use crate::mesh::MeshTemplate;
use crate::particle::Particle;

/// Named vertex attribute of a packed pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Position,
    TexCoord0,
    TimeInfo,
    StartPos,
    StartDir,
}

impl Attribute {
    /// All attributes in shader-location order.
    pub const ALL: [Attribute; 5] = [
        Attribute::Position,
        Attribute::TexCoord0,
        Attribute::TimeInfo,
        Attribute::StartPos,
        Attribute::StartDir,
    ];

    /// Floats per vertex.
    pub const fn components(self) -> usize {
        match self {
            Attribute::Position => 3,
            Attribute::TexCoord0 => 2,
            Attribute::TimeInfo => 4,
            Attribute::StartPos => 3,
            Attribute::StartDir => 3,
        }
    }

    /// Attribute name as seen by the graphics collaborator.
    pub const fn name(self) -> &'static str {
        match self {
            Attribute::Position => "POSITION",
            Attribute::TexCoord0 => "TEXCOORD0",
            Attribute::TimeInfo => "TIME_INFO",
            Attribute::StartPos => "START_POS",
            Attribute::StartDir => "START_DIR",
        }
    }

    /// Vertex shader input location.
    pub const fn shader_location(self) -> u32 {
        self.index() as u32
    }

    const fn index(self) -> usize {
        match self {
            Attribute::Position => 0,
            Attribute::TexCoord0 => 1,
            Attribute::TimeInfo => 2,
            Attribute::StartPos => 3,
            Attribute::StartDir => 4,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct AttributeBuffer {
    data: Vec<f32>,
    dirty: bool,
}

/// The packed GPU-bound arrays of one particle pool.
#[derive(Clone, Debug)]
pub struct VertexBuffers {
    capacity: usize,
    mesh_vertex_count: usize,
    mesh_index_count: usize,
    attributes: [AttributeBuffer; 5],
    indices: Vec<u32>,
    indices_dirty: bool,
}

impl VertexBuffers {
    /// Allocate zeroed buffers for `capacity` slots of `mesh`.
    pub fn new(capacity: usize, mesh: &MeshTemplate) -> Self {
        let mut buffers = Self {
            capacity: 0,
            mesh_vertex_count: 0,
            mesh_index_count: 0,
            attributes: Default::default(),
            indices: Vec::new(),
            indices_dirty: false,
        };
        buffers.resize(capacity, mesh);
        buffers
    }

    /// Reallocate for a new capacity or template. Contents are zeroed.
    pub fn resize(&mut self, capacity: usize, mesh: &MeshTemplate) {
        self.capacity = capacity;
        self.mesh_vertex_count = mesh.vertex_count();
        self.mesh_index_count = mesh.index_count();

        let vertices = capacity * self.mesh_vertex_count;
        for attribute in Attribute::ALL {
            let buffer = &mut self.attributes[attribute.index()];
            buffer.data.clear();
            buffer.data.resize(vertices * attribute.components(), 0.0);
            buffer.dirty = true;
        }
        self.indices.clear();
        self.indices.resize(capacity * self.mesh_index_count, 0);
        self.indices_dirty = true;
    }

    /// Number of particle slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Vertices per slot.
    #[inline]
    pub fn mesh_vertex_count(&self) -> usize {
        self.mesh_vertex_count
    }

    /// Total vertices across all slots.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.capacity * self.mesh_vertex_count
    }

    /// Total indices across all slots.
    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Raw floats of one attribute.
    pub fn data(&self, attribute: Attribute) -> &[f32] {
        &self.attributes[attribute.index()].data
    }

    /// Attribute contents as bytes for upload.
    pub fn bytes(&self, attribute: Attribute) -> &[u8] {
        bytemuck::cast_slice(self.data(attribute))
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Float range of `slot` within `attribute`'s array.
    pub fn slot_range(&self, attribute: Attribute, slot: usize) -> Range<usize> {
        let stride = self.mesh_vertex_count * attribute.components();
        slot * stride..(slot + 1) * stride
    }

    /// Floats of `slot` within `attribute`'s array.
    pub fn slot_data(&self, attribute: Attribute, slot: usize) -> &[f32] {
        &self.data(attribute)[self.slot_range(attribute, slot)]
    }

    /// Whether `attribute` changed since it was last uploaded.
    pub fn is_dirty(&self, attribute: Attribute) -> bool {
        self.attributes[attribute.index()].dirty
    }

    pub fn indices_dirty(&self) -> bool {
        self.indices_dirty
    }

    /// Attributes that need re-upload.
    pub fn dirty_attributes(&self) -> impl Iterator<Item = Attribute> + '_ {
        Attribute::ALL.into_iter().filter(|a| self.is_dirty(*a))
    }

    pub fn mark_dirty(&mut self, attribute: Attribute) {
        self.attributes[attribute.index()].dirty = true;
    }

    /// Mark one attribute as uploaded.
    pub fn clear_dirty(&mut self, attribute: Attribute) {
        self.attributes[attribute.index()].dirty = false;
    }

    /// Mark everything as uploaded.
    pub fn clear_all_dirty(&mut self) {
        for buffer in &mut self.attributes {
            buffer.dirty = false;
        }
        self.indices_dirty = false;
    }

    /// Copy the mesh template into every slot: `POSITION`, `TEXCOORD0` and indices.
    pub fn pack_template(&mut self, mesh: &MeshTemplate) {
        if mesh.vertex_count() != self.mesh_vertex_count || mesh.index_count() != self.mesh_index_count {
            self.resize(self.capacity, mesh);
        }

        for (attribute, source) in [
            (Attribute::Position, mesh.positions()),
            (Attribute::TexCoord0, mesh.uvs()),
        ] {
            let buffer = &mut self.attributes[attribute.index()];
            for block in buffer.data.chunks_exact_mut(source.len()) {
                block.copy_from_slice(source);
            }
            buffer.dirty = true;
        }

        let vertex_count = self.mesh_vertex_count as u32;
        let template = mesh.indices();
        if !template.is_empty() {
            for (slot, block) in self.indices.chunks_exact_mut(template.len()).enumerate() {
                let base = slot as u32 * vertex_count;
                for (dst, &src) in block.iter_mut().zip(template) {
                    *dst = src + base;
                }
            }
        }
        self.indices_dirty = true;
    }

    /// Re-serialize one slot's `TIME_INFO`, `START_POS` and `START_DIR`.
    ///
    /// The caller guarantees `slot < capacity`.
    pub fn pack_one(&mut self, slot: usize, particle: &Particle) {
        debug_assert!(slot < self.capacity, "slot {slot} out of range");

        let time_info = [
            particle.life_time,
            particle.active,
            particle.life_time,
            particle.emit_time,
        ];
        self.write_slot(Attribute::TimeInfo, slot, &time_info);
        self.write_slot(Attribute::StartPos, slot, &particle.start_position.to_array());
        self.write_slot(Attribute::StartDir, slot, &particle.start_direction.to_array());
    }

    /// Full re-serialization: the template plus every slot in order.
    ///
    /// `particles` yields the particle for slot 0, 1, 2, ...
    pub fn pack_all<'a, I>(&mut self, particles: I, mesh: &MeshTemplate)
    where
        I: IntoIterator<Item = &'a Particle>,
    {
        self.pack_template(mesh);
        let mut packed = 0;
        for (slot, particle) in particles.into_iter().enumerate() {
            self.pack_one(slot, particle);
            packed += 1;
        }
        debug_assert_eq!(packed, self.capacity, "pool and buffer capacity differ");
    }

    fn write_slot(&mut self, attribute: Attribute, slot: usize, values: &[f32]) {
        debug_assert_eq!(values.len(), attribute.components());
        let range = self.slot_range(attribute, slot);
        let buffer = &mut self.attributes[attribute.index()];
        for vertex in buffer.data[range].chunks_exact_mut(values.len()) {
            vertex.copy_from_slice(values);
        }
        buffer.dirty = true;
    }
}
