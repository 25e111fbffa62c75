//! Binary glTF 2.0 (GLB) codec.
//!
//! Layout: a 12-byte header (magic, version, total length) followed by
//! chunks of `{u32 length, u32 type, payload}`. The first chunk is the JSON
//! document, the optional second one the binary buffer. Chunk headers and
//! payloads are little-endian; the file header is written big-endian unless
//! configured otherwise, and either order is detected from the magic on import.
//!
//! The JSON chunk is read and written through the `gltf` crate's document
//! model. The container and accessor decoding stay here so that headers in
//! either byte order load and out-of-range buffer views read as zeros.
//!
//! Polygons are written as fan-triangulated index lists. Each primitive
//! carries `extras.faceVertexCounts` so faces with more than three corners
//! come back as the same polygons.

use std::collections::{BTreeMap, HashMap};

use glam::{Vec2, Vec3};
use gltf::json;
use gltf::json::accessor::{GenericComponentType, Type};
use gltf::json::buffer::Target;
use gltf::json::material::{AlphaMode, PbrBaseColorFactor, PbrMetallicRoughness};
use gltf::json::mesh::{Mode, Primitive, Semantic};
use gltf::json::validation::{Checked, USize64};
use gltf::json::{Index, Root};
use polymesh::{MaterialId, MeshBuilder, MeshStore, VertexId};
use polymesh_config::CodecConfig;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{CodecError, CodecResult};

/// `glTF` in ASCII, read as a little-endian u32
pub const GLB_MAGIC: u32 = 0x46546C67;
pub const GLB_VERSION: u32 = 2;
/// `JSON` chunk type
pub const CHUNK_JSON: u32 = 0x4E4F534A;
/// `BIN\0` chunk type
pub const CHUNK_BIN: u32 = 0x004E4942;

const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

/// Accessors read as zeros may declare at most this many elements
const MAX_ZERO_FILL_ELEMENTS: usize = 1 << 24;

/// Key of the per-primitive polygon sizes in `extras`
const FACE_VERTEX_COUNTS: &str = "faceVertexCounts";

// ============================================================================
// Binary layout
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn read_u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Self::Little => u32::from_le_bytes(bytes),
            Self::Big => u32::from_be_bytes(bytes),
        }
    }

    fn write_u32(self, value: u32) -> [u8; 4] {
        match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        }
    }
}

fn word(bytes: &[u8], at: usize) -> [u8; 4] {
    [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]
}

/// Scalar type of accessor components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    fn from_json(kind: &json::accessor::ComponentType) -> Self {
        use json::accessor::ComponentType as Json;
        match kind {
            Json::I8 => Self::I8,
            Json::U8 => Self::U8,
            Json::I16 => Self::I16,
            Json::U16 => Self::U16,
            Json::U32 => Self::U32,
            Json::F32 => Self::F32,
        }
    }

    /// Size of one component in bytes
    pub fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }

    /// Decode one little-endian component; `bytes` holds exactly `size()` bytes
    fn read(self, bytes: &[u8], normalized: bool) -> f64 {
        let raw = match self {
            Self::I8 => f64::from(bytes[0] as i8),
            Self::U8 => f64::from(bytes[0]),
            Self::I16 => f64::from(i16::from_le_bytes([bytes[0], bytes[1]])),
            Self::U16 => f64::from(u16::from_le_bytes([bytes[0], bytes[1]])),
            Self::U32 => f64::from(u32::from_le_bytes(word(bytes, 0))),
            Self::F32 => f64::from(f32::from_le_bytes(word(bytes, 0))),
        };
        if !normalized {
            return raw;
        }
        match self {
            Self::I8 => (raw / 127.0).max(-1.0),
            Self::U8 => raw / 255.0,
            Self::I16 => (raw / 32767.0).max(-1.0),
            Self::U16 => raw / 65535.0,
            Self::U32 | Self::F32 => raw,
        }
    }
}

/// Number of components for an accessor type; matrices are not supported
fn component_count(kind: &Type) -> Option<usize> {
    match kind {
        Type::Scalar => Some(1),
        Type::Vec2 => Some(2),
        Type::Vec3 => Some(3),
        Type::Vec4 => Some(4),
        _ => None,
    }
}

fn to_usize(value: u64, what: &str) -> CodecResult<usize> {
    usize::try_from(value)
        .map_err(|_| CodecError::Malformed(format!("{what} {value} does not fit in memory")))
}

fn push<T>(items: &mut Vec<T>, item: T) -> Index<T> {
    items.push(item);
    Index::new((items.len() - 1) as u32)
}

// ============================================================================
// Import
// ============================================================================

/// Split a GLB into its parsed JSON document and BIN payload
fn split_chunks(bytes: &[u8]) -> CodecResult<(Root, &[u8])> {
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::Malformed(format!(
            "GLB is {} bytes, shorter than its header",
            bytes.len()
        )));
    }
    let magic = word(bytes, 0);
    let order = if u32::from_le_bytes(magic) == GLB_MAGIC {
        ByteOrder::Little
    } else if u32::from_be_bytes(magic) == GLB_MAGIC {
        ByteOrder::Big
    } else {
        return Err(CodecError::Malformed(format!(
            "bad GLB magic 0x{:08X}",
            u32::from_le_bytes(magic)
        )));
    };
    let version = order.read_u32(word(bytes, 4));
    if version != GLB_VERSION {
        return Err(CodecError::Unsupported(format!("glTF container version {version}")));
    }
    let length = order.read_u32(word(bytes, 8)) as usize;
    if length > bytes.len() || length < HEADER_LEN {
        return Err(CodecError::Malformed(format!(
            "GLB declares {length} bytes, {} available",
            bytes.len()
        )));
    }
    let bytes = &bytes[..length];

    let mut json: Option<&[u8]> = None;
    let mut bin: &[u8] = &[];
    let mut offset = HEADER_LEN;
    while offset + CHUNK_HEADER_LEN <= bytes.len() {
        let chunk_len = u32::from_le_bytes(word(bytes, offset)) as usize;
        let chunk_type = u32::from_le_bytes(word(bytes, offset + 4));
        let start = offset + CHUNK_HEADER_LEN;
        let end = start
            .checked_add(chunk_len)
            .filter(|&end| end <= bytes.len())
            .ok_or_else(|| {
                CodecError::Malformed(format!("chunk at byte {offset} runs past the end of the file"))
            })?;
        match chunk_type {
            CHUNK_JSON if json.is_none() => json = Some(&bytes[start..end]),
            CHUNK_BIN if bin.is_empty() => bin = &bytes[start..end],
            other => debug!("skipping GLB chunk type 0x{:08X}", other),
        }
        offset = end;
    }

    let json = json.ok_or_else(|| CodecError::Malformed("GLB has no JSON chunk".to_string()))?;
    Ok((serde_json::from_slice(json)?, bin))
}

fn zero_filled(index: usize, count: usize, width: usize) -> CodecResult<(usize, Vec<f64>)> {
    if count > MAX_ZERO_FILL_ELEMENTS {
        return Err(CodecError::Malformed(format!(
            "accessor {index} declares {count} elements with no data behind them"
        )));
    }
    Ok((width, vec![0.0; count * width]))
}

/// Read an accessor as `(components per element, flat values)`.
///
/// Accessors without a buffer view, or whose range does not fit in the BIN
/// payload, read as zeros; the latter also logs a warning. Counts too large
/// to zero-fill are malformed.
fn read_accessor(root: &Root, bin: &[u8], index: usize) -> CodecResult<(usize, Vec<f64>)> {
    let accessor = root
        .accessors
        .get(index)
        .ok_or_else(|| CodecError::Malformed(format!("accessor {index} does not exist")))?;
    let component = match &accessor.component_type {
        Checked::Valid(GenericComponentType(kind)) => ComponentType::from_json(kind),
        Checked::Invalid => {
            return Err(CodecError::Unsupported(format!(
                "accessor {index} has an unknown component type"
            )));
        }
    };
    let width = match &accessor.type_ {
        Checked::Valid(kind) => component_count(kind),
        Checked::Invalid => None,
    }
    .ok_or_else(|| {
        CodecError::Unsupported(format!("accessor {index} is not SCALAR, VEC2, VEC3 or VEC4"))
    })?;
    let count = to_usize(accessor.count.0, "accessor count")?;
    let total = count.checked_mul(width).ok_or_else(|| {
        CodecError::Malformed(format!("accessor {index} declares {count} elements"))
    })?;

    let Some(view_index) = accessor.buffer_view.as_ref().map(|v| v.value()) else {
        return zero_filled(index, count, width);
    };
    let view = root
        .buffer_views
        .get(view_index)
        .ok_or_else(|| CodecError::Malformed(format!("buffer view {view_index} does not exist")))?;

    let element = component.size() * width;
    let stride = view.byte_stride.as_ref().map_or(element, |s| s.0).max(element);
    let accessor_offset = to_usize(
        accessor.byte_offset.as_ref().map_or(0, |o| o.0),
        "accessor offset",
    )?;
    let view_offset = to_usize(view.byte_offset.as_ref().map_or(0, |o| o.0), "view offset")?;
    let view_length = to_usize(view.byte_length.0, "view length")?;
    let needed = match count {
        0 => Some(0),
        n => (n - 1)
            .checked_mul(stride)
            .and_then(|span| span.checked_add(element)),
    };
    let fits = view.buffer.value() == 0
        && needed
            .and_then(|n| accessor_offset.checked_add(n))
            .is_some_and(|end| end <= view_length)
        && view_offset
            .checked_add(view_length)
            .is_some_and(|end| end <= bin.len());
    if !fits {
        warn!(
            "accessor {} ({} elements) does not fit buffer view {} ({} bytes at {}, BIN has {}); zero-filling",
            index,
            count,
            view_index,
            view_length,
            view_offset,
            bin.len()
        );
        return zero_filled(index, count, width);
    }

    let start = view_offset + accessor_offset;
    let mut values = Vec::with_capacity(total);
    for i in 0..count {
        let base = start + i * stride;
        for c in 0..width {
            let at = base + c * component.size();
            values.push(component.read(&bin[at..at + component.size()], accessor.normalized));
        }
    }
    Ok((width, values))
}

/// Polygon sizes from `extras`; empty when absent or not a list of integers
fn face_vertex_counts(primitive: &Primitive) -> Vec<usize> {
    primitive
        .extras
        .as_deref()
        .and_then(|raw| serde_json::from_str::<Value>(raw.get()).ok())
        .and_then(|extras| {
            extras.get(FACE_VERTEX_COUNTS)?.as_array()?
                .iter()
                .map(|c| c.as_u64().and_then(|n| usize::try_from(n).ok()))
                .collect::<Option<Vec<usize>>>()
        })
        .unwrap_or_default()
}

/// Rebuild polygons from fan triangles, or keep triangles when the counts
/// do not describe the index list
fn polygons(indices: &[usize], counts: &[usize]) -> Vec<Vec<usize>> {
    let triangles: Vec<&[usize]> = indices.chunks_exact(3).collect();
    if indices.len() % 3 != 0 {
        warn!("{} trailing indices ignored", indices.len() % 3);
    }
    let expected = counts
        .iter()
        .try_fold(0usize, |sum, &n| sum.checked_add(n.saturating_sub(2)));
    if counts.is_empty() || counts.iter().any(|&n| n < 3) || expected != Some(triangles.len()) {
        if !counts.is_empty() {
            warn!(
                "{} does not match {} triangles, importing triangles",
                FACE_VERTEX_COUNTS,
                triangles.len()
            );
        }
        return triangles.into_iter().map(<[usize]>::to_vec).collect();
    }

    let mut result = Vec::with_capacity(counts.len());
    let mut next = 0;
    for &n in counts {
        let fan = &triangles[next..next + n - 2];
        next += n - 2;
        let mut ring = fan[0].to_vec();
        ring.extend(fan[1..].iter().map(|t| t[2]));
        result.push(ring);
    }
    result
}

/// Parse a GLB into a new mesh.
///
/// Every element of a POSITION accessor becomes a vertex; primitives sharing
/// an accessor share vertices. Point primitives contribute vertices only.
pub fn read_glb(bytes: &[u8]) -> CodecResult<MeshStore> {
    let (root, bin) = split_chunks(bytes)?;
    let mut store = MeshStore::new();

    let materials: Vec<MaterialId> = root
        .materials
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let name = m.name.clone().unwrap_or_else(|| format!("material_{i}"));
            let [r, g, b, a] = m.pbr_metallic_roughness.base_color_factor.0;
            let blend = matches!(m.alpha_mode, Checked::Valid(AlphaMode::Blend));
            let opacity = (a < 1.0 || blend).then_some(a);
            store.add_material(name, Some([r, g, b]), opacity)
        })
        .collect();

    let mut vertex_sets: HashMap<usize, Vec<VertexId>> = HashMap::new();
    let mut builder = MeshBuilder::new(&mut store);
    for mesh in &root.meshes {
        for primitive in &mesh.primitives {
            let Some(position_accessor) = primitive
                .attributes
                .get(&Checked::Valid(Semantic::Positions))
                .map(|a| a.value())
            else {
                warn!("primitive without POSITION skipped");
                continue;
            };
            if !vertex_sets.contains_key(&position_accessor) {
                let (width, values) = read_accessor(&root, bin, position_accessor)?;
                if width != 3 {
                    return Err(CodecError::Malformed("POSITION accessor is not VEC3".to_string()));
                }
                let ids: Vec<VertexId> = values
                    .chunks_exact(3)
                    .map(|c| {
                        let position = Vec3::new(c[0] as f32, c[1] as f32, c[2] as f32);
                        builder.store_mut().add_vertex(position, None)
                    })
                    .collect();
                let uv_accessor = primitive
                    .attributes
                    .get(&Checked::Valid(Semantic::TexCoords(0)))
                    .map(|a| a.value());
                if let Some(uv_accessor) = uv_accessor {
                    let (width, uvs) = read_accessor(&root, bin, uv_accessor)?;
                    if width == 2 && uvs.len() == ids.len() * 2 {
                        for (&id, uv) in ids.iter().zip(uvs.chunks_exact(2)) {
                            builder
                                .store_mut()
                                .add_uv(id, Vec2::new(uv[0] as f32, uv[1] as f32));
                        }
                    } else {
                        warn!("TEXCOORD_0 does not match POSITION, ignored");
                    }
                }
                vertex_sets.insert(position_accessor, ids);
            }
            let Some(vertices) = vertex_sets.get(&position_accessor) else {
                continue;
            };

            match &primitive.mode {
                Checked::Valid(Mode::Points) => continue,
                Checked::Valid(Mode::Triangles) => {}
                other => {
                    warn!("primitive mode {:?} is not supported, skipped", other);
                    continue;
                }
            }

            let indices: Vec<usize> = match primitive.indices.as_ref().map(|i| i.value()) {
                Some(accessor) => {
                    let (width, values) = read_accessor(&root, bin, accessor)?;
                    if width != 1 {
                        return Err(CodecError::Malformed("index accessor is not SCALAR".to_string()));
                    }
                    values.into_iter().map(|v| v as usize).collect()
                }
                None => (0..vertices.len()).collect(),
            };
            if let Some(bad) = indices.iter().find(|&&i| i >= vertices.len()) {
                return Err(CodecError::Malformed(format!(
                    "index {bad} out of range ({} vertices)",
                    vertices.len()
                )));
            }

            let material = primitive
                .material
                .as_ref()
                .and_then(|m| materials.get(m.value()).copied());
            for polygon in polygons(&indices, &face_vertex_counts(primitive)) {
                let corners: Vec<VertexId> = polygon.iter().map(|&i| vertices[i]).collect();
                if let Some(face) = builder.add_ngon(&corners) {
                    if material.is_some() {
                        builder.store_mut().set_face_material(face, material)?;
                    }
                }
            }
        }
    }

    debug!(
        "read_glb: {} vertices, {} faces, {} materials",
        store.vertex_count(),
        store.face_count(),
        store.material_count()
    );
    Ok(store)
}

// ============================================================================
// Export
// ============================================================================

/// BIN payload under construction; every view starts 4-byte aligned
#[derive(Default)]
struct BinWriter {
    bytes: Vec<u8>,
}

impl BinWriter {
    fn push_view(&mut self, root: &mut Root, data: Vec<u8>, target: Target) -> Index<json::buffer::View> {
        while self.bytes.len() % 4 != 0 {
            self.bytes.push(0);
        }
        let view = json::buffer::View {
            buffer: Index::new(0),
            byte_length: USize64::from(data.len()),
            byte_offset: Some(USize64::from(self.bytes.len())),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: Some(Checked::Valid(target)),
        };
        self.bytes.extend(data);
        push(&mut root.buffer_views, view)
    }

    /// Push `data` as its own view and describe it with a new accessor
    fn push_accessor(
        &mut self,
        root: &mut Root,
        data: Vec<u8>,
        target: Target,
        component: json::accessor::ComponentType,
        kind: Type,
        count: usize,
        bounds: Option<(Vec3, Vec3)>,
    ) -> Index<json::Accessor> {
        let view = self.push_view(root, data, target);
        let accessor = json::Accessor {
            buffer_view: Some(view),
            byte_offset: None,
            count: USize64::from(count),
            component_type: Checked::Valid(GenericComponentType(component)),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Checked::Valid(kind),
            min: bounds.map(|(lo, _)| Value::from(lo.to_array().to_vec())),
            max: bounds.map(|(_, hi)| Value::from(hi.to_array().to_vec())),
            name: None,
            normalized: false,
            sparse: None,
        };
        push(&mut root.accessors, accessor)
    }
}

fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn u32_bytes(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Fan-triangulated indices and polygon sizes of one primitive
#[derive(Default)]
struct FaceGroup {
    indices: Vec<u32>,
    counts: Vec<u32>,
}

fn make_primitive(
    attributes: &BTreeMap<Checked<Semantic>, Index<json::Accessor>>,
    indices: Option<Index<json::Accessor>>,
    material: Option<Index<json::Material>>,
    mode: Mode,
    extras: json::Extras,
) -> Primitive {
    Primitive {
        attributes: attributes.clone(),
        extensions: Default::default(),
        extras,
        indices,
        material,
        mode: Checked::Valid(mode),
        targets: None,
    }
}

/// Encode a mesh as GLB.
///
/// One mesh with one primitive per material (faces without a material form
/// their own primitive). All primitives share the POSITION accessor, which
/// holds every vertex in id order. A mesh without faces is written as a
/// point primitive so loose vertices survive.
pub fn write_glb(store: &MeshStore, config: &CodecConfig) -> CodecResult<Vec<u8>> {
    let mut root = Root {
        asset: json::Asset {
            version: "2.0".to_string(),
            generator: Some("polymesh".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let mut bin = BinWriter::default();

    let mut material_slots: HashMap<MaterialId, Index<json::Material>> = HashMap::new();
    for material in store.materials() {
        let [r, g, b] = material.color.unwrap_or([1.0, 1.0, 1.0]);
        let alpha = material.opacity.unwrap_or(1.0);
        let def = json::Material {
            name: Some(material.name.clone()),
            alpha_mode: Checked::Valid(if material.transparent {
                AlphaMode::Blend
            } else {
                AlphaMode::Opaque
            }),
            pbr_metallic_roughness: PbrMetallicRoughness {
                base_color_factor: PbrBaseColorFactor([r, g, b, alpha]),
                ..Default::default()
            },
            ..Default::default()
        };
        material_slots.insert(material.id, push(&mut root.materials, def));
    }

    let mut nodes = Vec::new();
    if store.vertex_count() > 0 {
        let mesh = write_mesh(store, &mut root, &mut bin, &material_slots)?;
        let node = json::Node {
            mesh: Some(mesh),
            ..Default::default()
        };
        nodes.push(push(&mut root.nodes, node));
    }
    let scene = json::Scene {
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        nodes,
    };
    root.scene = Some(push(&mut root.scenes, scene));

    if !bin.bytes.is_empty() {
        let buffer = json::Buffer {
            byte_length: USize64::from(bin.bytes.len()),
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            uri: None,
        };
        push(&mut root.buffers, buffer);
    }

    let json = serde_json::to_vec(&root)?;
    Ok(assemble(json, bin.bytes, config.glb_big_endian_header))
}

/// Vertex attributes and per-material primitives of a non-empty mesh
fn write_mesh(
    store: &MeshStore,
    root: &mut Root,
    bin: &mut BinWriter,
    material_slots: &HashMap<MaterialId, Index<json::Material>>,
) -> CodecResult<Index<json::Mesh>> {
    use json::accessor::ComponentType as Component;

    // ===== Vertex attributes =====
    let slots: HashMap<VertexId, u32> = store
        .vertices()
        .enumerate()
        .map(|(i, v)| (v.id, i as u32))
        .collect();
    let positions: Vec<f32> = store.vertices().flat_map(|v| v.position.to_array()).collect();
    let bounds = store.vertices().fold(
        (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
        |(lo, hi), v| (lo.min(v.position), hi.max(v.position)),
    );
    let mut attributes = BTreeMap::new();
    let position_accessor = bin.push_accessor(
        root,
        f32_bytes(&positions),
        Target::ArrayBuffer,
        Component::F32,
        Type::Vec3,
        slots.len(),
        Some(bounds),
    );
    attributes.insert(Checked::Valid(Semantic::Positions), position_accessor);

    if store.uv_count() > 0 {
        let mut coords = vec![Vec2::ZERO; slots.len()];
        let mut seen = vec![false; slots.len()];
        for uv in store.uvs() {
            if let Some(&slot) = slots.get(&uv.vertex_id) {
                if !seen[slot as usize] {
                    seen[slot as usize] = true;
                    coords[slot as usize] = uv.coord;
                }
            }
        }
        let flat: Vec<f32> = coords.iter().flat_map(|c| c.to_array()).collect();
        let uv_accessor = bin.push_accessor(
            root,
            f32_bytes(&flat),
            Target::ArrayBuffer,
            Component::F32,
            Type::Vec2,
            slots.len(),
            None,
        );
        attributes.insert(Checked::Valid(Semantic::TexCoords(0)), uv_accessor);
    }

    // ===== Faces, grouped by material =====
    let mut groups: BTreeMap<Option<MaterialId>, FaceGroup> = BTreeMap::new();
    for face in store.faces() {
        let Some(corners) = face
            .vertex_ids
            .iter()
            .map(|v| slots.get(v).copied())
            .collect::<Option<Vec<u32>>>()
        else {
            warn!("face {:?} refers to a missing vertex, not exported", face.id);
            continue;
        };
        if corners.len() < 3 {
            continue;
        }
        let material = face.material.filter(|m| material_slots.contains_key(m));
        let group = groups.entry(material).or_default();
        for i in 1..corners.len() - 1 {
            group
                .indices
                .extend_from_slice(&[corners[0], corners[i], corners[i + 1]]);
        }
        group.counts.push(corners.len() as u32);
    }

    let mut primitives = Vec::new();
    if groups.is_empty() {
        primitives.push(make_primitive(&attributes, None, None, Mode::Points, None));
    }
    for (material, group) in groups {
        let mut extras = serde_json::Map::new();
        extras.insert(FACE_VERTEX_COUNTS.to_string(), Value::from(group.counts));
        let index_accessor = bin.push_accessor(
            root,
            u32_bytes(&group.indices),
            Target::ElementArrayBuffer,
            Component::U32,
            Type::Scalar,
            group.indices.len(),
            None,
        );
        primitives.push(make_primitive(
            &attributes,
            Some(index_accessor),
            material.and_then(|m| material_slots.get(&m).copied()),
            Mode::Triangles,
            Some(serde_json::value::to_raw_value(&extras)?),
        ));
    }

    let mesh = json::Mesh {
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        primitives,
        weights: None,
    };
    Ok(push(&mut root.meshes, mesh))
}

/// Pad and frame the JSON and BIN chunks behind a GLB header
fn assemble(mut json: Vec<u8>, mut bin: Vec<u8>, big_endian_header: bool) -> Vec<u8> {
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let bin_chunk = if bin.is_empty() { 0 } else { CHUNK_HEADER_LEN + bin.len() };
    let total = HEADER_LEN + CHUNK_HEADER_LEN + json.len() + bin_chunk;
    let order = if big_endian_header {
        ByteOrder::Big
    } else {
        ByteOrder::Little
    };

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&order.write_u32(GLB_MAGIC));
    out.extend_from_slice(&order.write_u32(GLB_VERSION));
    out.extend_from_slice(&order.write_u32(total as u32));
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json);
    if !bin.is_empty() {
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(&bin);
    }
    out
}
