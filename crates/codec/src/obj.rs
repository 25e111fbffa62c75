//! Wavefront OBJ text codec.
//!
//! Reads `v`, `vt`, `f` and `usemtl` records. Face corners may be written as
//! `v`, `v/t`, `v//n` or `v/t/n`, with 1-based or negative (relative) indices.
//! Normals, groups, objects and smoothing groups are ignored.

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};

use glam::{Vec2, Vec3};
use polymesh::{MaterialId, MeshBuilder, MeshStore, VertexId};
use polymesh_config::CodecConfig;
use tracing::{debug, trace, warn};

use crate::error::{CodecError, CodecResult};

/// Resolve a 1-based or negative OBJ index against the number of records seen
fn resolve_index(raw: &str, count: usize, kind: &str, line: usize) -> CodecResult<usize> {
    let index: i64 = raw
        .parse()
        .map_err(|_| CodecError::Malformed(format!("line {line}: bad {kind} index '{raw}'")))?;
    let resolved = match index {
        0 => None,
        i if i > 0 => Some(i as usize - 1),
        i => count.checked_sub(i.unsigned_abs() as usize),
    };
    resolved.filter(|&i| i < count).ok_or_else(|| {
        CodecError::Malformed(format!(
            "line {line}: {kind} index {index} out of range ({count} defined)"
        ))
    })
}

fn parse_floats<'a>(
    tokens: impl Iterator<Item = &'a str>,
    needed: usize,
    line: usize,
) -> CodecResult<Vec<f32>> {
    let values = tokens
        .map(|t| {
            t.parse::<f32>()
                .map_err(|_| CodecError::Malformed(format!("line {line}: bad number '{t}'")))
        })
        .collect::<CodecResult<Vec<f32>>>()?;
    if values.len() < needed {
        return Err(CodecError::Malformed(format!(
            "line {line}: expected {needed} coordinates, found {}",
            values.len()
        )));
    }
    Ok(values)
}

/// Parse OBJ text into a new mesh.
///
/// Every `v` record becomes a vertex, even when positions repeat. Edges are
/// shared between faces. Faces with fewer than three distinct corners are
/// skipped with a warning.
pub fn read_obj(text: &str) -> CodecResult<MeshStore> {
    let mut store = MeshStore::new();
    let mut vertices: Vec<VertexId> = Vec::new();
    let mut coords: Vec<Vec2> = Vec::new();
    let mut materials: HashMap<String, MaterialId> = HashMap::new();
    let mut current_material: Option<MaterialId> = None;
    let mut attached: HashSet<(VertexId, usize)> = HashSet::new();
    let mut skipped_faces = 0usize;

    let mut builder = MeshBuilder::new(&mut store);
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.split('#').next().unwrap_or_default();
        let mut tokens = content.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword {
            "v" => {
                let p = parse_floats(tokens, 3, line)?;
                let id = builder
                    .store_mut()
                    .add_vertex(Vec3::new(p[0], p[1], p[2]), None);
                vertices.push(id);
            }
            "vt" => {
                let t = parse_floats(tokens, 2, line)?;
                coords.push(Vec2::new(t[0], t[1]));
            }
            "f" => {
                let mut corners = Vec::new();
                let mut corner_uvs = Vec::new();
                for token in tokens {
                    let mut parts = token.split('/');
                    let v = resolve_index(
                        parts.next().unwrap_or_default(),
                        vertices.len(),
                        "vertex",
                        line,
                    )?;
                    let vertex = vertices[v];
                    corners.push(vertex);
                    if let Some(t) = parts.next().filter(|t| !t.is_empty()) {
                        let t = resolve_index(t, coords.len(), "texture", line)?;
                        corner_uvs.push((vertex, t));
                    }
                }

                let Some(face) = builder.add_ngon(&corners) else {
                    warn!(
                        "OBJ line {}: face with {} corners skipped, needs at least 3",
                        line,
                        corners.len()
                    );
                    skipped_faces += 1;
                    continue;
                };
                if current_material.is_some() {
                    builder.store_mut().set_face_material(face, current_material)?;
                }
                for (vertex, t) in corner_uvs {
                    if attached.insert((vertex, t)) {
                        builder.store_mut().add_uv(vertex, coords[t]);
                    }
                }
            }
            "usemtl" => {
                let name = tokens.collect::<Vec<_>>().join(" ");
                current_material = if name.is_empty() {
                    None
                } else {
                    let store = builder.store_mut();
                    Some(
                        *materials
                            .entry(name.clone())
                            .or_insert_with(|| store.add_material(name, None, None)),
                    )
                };
            }
            "vn" | "o" | "g" | "s" | "mtllib" => {}
            other => trace!("OBJ line {}: ignoring '{}' record", line, other),
        }
    }

    debug!(
        "read_obj: {} vertices, {} faces, {} materials, {} faces skipped",
        store.vertex_count(),
        store.face_count(),
        store.material_count(),
        skipped_faces
    );
    Ok(store)
}

/// Write a mesh as OBJ text.
///
/// Vertices are written in id order. Faces are grouped by material, faces
/// without one first, and each group is introduced by a `usemtl` line. A
/// vertex's first UV is used for every corner that references it.
pub fn write_obj<W: Write>(store: &MeshStore, writer: &mut W, config: &CodecConfig) -> io::Result<()> {
    let p = config.obj_precision;
    writeln!(writer, "# polymesh OBJ export")?;
    writeln!(
        writer,
        "# Vertices: {}, Faces: {}",
        store.vertex_count(),
        store.face_count()
    )?;

    // Vertex positions (OBJ indices are 1-based)
    let mut slots: HashMap<VertexId, usize> = HashMap::new();
    for (i, vertex) in store.vertices().enumerate() {
        let v = vertex.position;
        writeln!(writer, "v {:.*} {:.*} {:.*}", p, v.x, p, v.y, p, v.z)?;
        slots.insert(vertex.id, i + 1);
    }

    // Texture coordinates
    let mut uv_slots: HashMap<VertexId, usize> = HashMap::new();
    let mut written = 0;
    for uv in store.uvs() {
        if !slots.contains_key(&uv.vertex_id) || uv_slots.contains_key(&uv.vertex_id) {
            continue;
        }
        writeln!(writer, "vt {:.*} {:.*}", p, uv.coord.x, p, uv.coord.y)?;
        written += 1;
        uv_slots.insert(uv.vertex_id, written);
    }

    // Faces
    let mut faces: Vec<_> = store.faces().collect();
    faces.sort_by_key(|f| f.material);
    let mut current: Option<MaterialId> = None;
    for face in faces {
        let Some(corners) = face
            .vertex_ids
            .iter()
            .map(|v| slots.get(v).map(|&i| (i, uv_slots.get(v).copied())))
            .collect::<Option<Vec<_>>>()
        else {
            continue;
        };
        if face.material != current {
            if let Some(material) = face.material.and_then(|m| store.material(m)) {
                writeln!(writer, "usemtl {}", material.name)?;
            }
            current = face.material;
        }
        write!(writer, "f")?;
        for (v, t) in corners {
            match t {
                Some(t) => write!(writer, " {v}/{t}")?,
                None => write!(writer, " {v}")?,
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// [`write_obj`] into a string
pub fn to_obj_string(store: &MeshStore, config: &CodecConfig) -> CodecResult<String> {
    let mut buf = Vec::new();
    write_obj(store, &mut buf, config)?;
    String::from_utf8(buf).map_err(|e| CodecError::Malformed(e.to_string()))
}
