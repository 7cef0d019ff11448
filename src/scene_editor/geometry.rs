use crate::scene_editor::error::EditorError;
use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    #[serde(alias = "cube")]
    Box,
    Sphere,
    Cylinder,
    Torus,
    Cone,
    Octahedron,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 6] = [
        PrimitiveKind::Box,
        PrimitiveKind::Sphere,
        PrimitiveKind::Cylinder,
        PrimitiveKind::Torus,
        PrimitiveKind::Cone,
        PrimitiveKind::Octahedron,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Sphere => "sphere",
            Self::Cylinder => "cylinder",
            Self::Torus => "torus",
            Self::Cone => "cone",
            Self::Octahedron => "octahedron",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Box => "Box",
            Self::Sphere => "Sphere",
            Self::Cylinder => "Cylinder",
            Self::Torus => "Torus",
            Self::Cone => "Cone",
            Self::Octahedron => "Octahedron",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PrimitiveKind {
    type Err = EditorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "box" | "cube" => Ok(Self::Box),
            "sphere" => Ok(Self::Sphere),
            "cylinder" => Ok(Self::Cylinder),
            "torus" => Ok(Self::Torus),
            "cone" => Ok(Self::Cone),
            "octahedron" => Ok(Self::Octahedron),
            _ => Err(EditorError::UnknownPrimitiveKind(raw.to_string())),
        }
    }
}

/// Dimensions of a primitive in its local frame. Every shape is centred on
/// the origin; cylinders, cones and the torus ring share the Y axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParametricShape {
    Box {
        half_extents: Vec3,
    },
    Sphere {
        radius: f32,
        sectors: u32,
        stacks: u32,
    },
    Cylinder {
        radius: f32,
        half_height: f32,
        resolution: u32,
    },
    Torus {
        major_radius: f32,
        minor_radius: f32,
        major_resolution: u32,
        minor_resolution: u32,
    },
    /// Base disc at `-half_height`, apex at `+half_height`.
    Cone {
        radius: f32,
        half_height: f32,
        resolution: u32,
    },
    /// Vertices on the axes at distance `radius`.
    Octahedron {
        radius: f32,
    },
}

impl ParametricShape {
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Self::Box { half_extents } => half_extents.length(),
            Self::Sphere { radius, .. } => radius,
            Self::Cylinder {
                radius,
                half_height,
                ..
            }
            | Self::Cone {
                radius,
                half_height,
                ..
            } => Vec2::new(radius, half_height).length(),
            Self::Torus {
                major_radius,
                minor_radius,
                ..
            } => major_radius + minor_radius,
            Self::Octahedron { radius } => radius,
        }
    }

    /// Lit, smooth-shaded triangle mesh for the surface handle.
    pub fn surface_mesh(&self) -> Mesh {
        match *self {
            Self::Box { half_extents } => Cuboid {
                half_size: half_extents,
            }
            .mesh()
            .build(),
            Self::Sphere {
                radius,
                sectors,
                stacks,
            } => Sphere::new(radius).mesh().uv(sectors, stacks),
            Self::Cylinder {
                radius,
                half_height,
                resolution,
            } => Cylinder::new(radius, half_height * 2.0)
                .mesh()
                .resolution(resolution)
                .build(),
            Self::Torus {
                major_radius,
                minor_radius,
                major_resolution,
                minor_resolution,
            } => Torus {
                minor_radius,
                major_radius,
            }
            .mesh()
            .major_resolution(major_resolution as usize)
            .minor_resolution(minor_resolution as usize)
            .build(),
            Self::Cone {
                radius,
                half_height,
                resolution,
            } => Cone {
                radius,
                height: half_height * 2.0,
            }
            .mesh()
            .resolution(resolution)
            .build(),
            Self::Octahedron { radius } => build_octahedron_mesh(radius),
        }
    }

    /// Same surface with per-face normals, used by the flat-shaded treatments.
    pub fn flat_surface_mesh(&self) -> Mesh {
        let mut mesh = self.surface_mesh();
        mesh.duplicate_vertices();
        mesh.compute_flat_normals();
        mesh
    }

    /// Line-list twin made of every unique triangle edge of the surface mesh.
    pub fn outline_mesh(&self) -> Mesh {
        build_edge_mesh(&self.surface_mesh())
    }
}

pub fn shape_for(kind: PrimitiveKind) -> ParametricShape {
    match kind {
        PrimitiveKind::Box => ParametricShape::Box {
            half_extents: Vec3::splat(1.0),
        },
        PrimitiveKind::Sphere => ParametricShape::Sphere {
            radius: 1.2,
            sectors: 32,
            stacks: 32,
        },
        PrimitiveKind::Cylinder => ParametricShape::Cylinder {
            radius: 1.0,
            half_height: 1.0,
            resolution: 32,
        },
        PrimitiveKind::Torus => ParametricShape::Torus {
            major_radius: 1.0,
            minor_radius: 0.4,
            major_resolution: 100,
            minor_resolution: 16,
        },
        PrimitiveKind::Cone => ParametricShape::Cone {
            radius: 1.0,
            half_height: 1.0,
            resolution: 32,
        },
        PrimitiveKind::Octahedron => ParametricShape::Octahedron { radius: 1.5 },
    }
}

fn build_octahedron_mesh(radius: f32) -> Mesh {
    let axes = [
        Vec3::X * radius,
        -Vec3::X * radius,
        Vec3::Y * radius,
        -Vec3::Y * radius,
        Vec3::Z * radius,
        -Vec3::Z * radius,
    ];

    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(24);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(24);
    let mut uvs: Vec<[f32; 2]> = Vec::with_capacity(24);
    let mut indices: Vec<u32> = Vec::with_capacity(24);

    for x in [axes[0], axes[1]] {
        for y in [axes[2], axes[3]] {
            for z in [axes[4], axes[5]] {
                add_triangle(
                    &mut positions,
                    &mut normals,
                    &mut uvs,
                    &mut indices,
                    [x, y, z],
                    (x + y + z).normalize_or_zero(),
                );
            }
        }
    }

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

fn add_triangle(
    positions: &mut Vec<[f32; 3]>,
    normals: &mut Vec<[f32; 3]>,
    uvs: &mut Vec<[f32; 2]>,
    indices: &mut Vec<u32>,
    mut corners: [Vec3; 3],
    expected_normal: Vec3,
) {
    let mut normal = (corners[1] - corners[0]).cross(corners[2] - corners[0]);
    if normal.dot(expected_normal) < 0.0 {
        corners = [corners[0], corners[2], corners[1]];
        normal = (corners[1] - corners[0]).cross(corners[2] - corners[0]);
    }
    let normal = normal.normalize_or_zero();

    let base = positions.len() as u32;
    for corner in corners {
        positions.push([corner.x, corner.y, corner.z]);
        normals.push([normal.x, normal.y, normal.z]);
    }
    uvs.extend_from_slice(&[[0.0, 0.0], [1.0, 0.0], [0.5, 1.0]]);
    indices.extend_from_slice(&[base, base + 1, base + 2]);
}

fn build_edge_mesh(surface: &Mesh) -> Mesh {
    let positions: Vec<[f32; 3]> = surface
        .attribute(Mesh::ATTRIBUTE_POSITION)
        .and_then(|values| values.as_float3())
        .map(|values| values.to_vec())
        .unwrap_or_default();

    let corners: Vec<u32> = match surface.indices() {
        Some(indices) => indices.iter().map(|i| i as u32).collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let edges = unique_edges(&corners);
    let mut line_indices = Vec::with_capacity(edges.len() * 2);
    for (a, b) in edges {
        line_indices.push(a);
        line_indices.push(b);
    }

    let normals: Vec<[f32; 3]> = positions
        .iter()
        .map(|p| Vec3::from_array(*p).normalize_or(Vec3::Y).to_array())
        .collect();

    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_indices(Indices::U32(line_indices));
    mesh
}

fn unique_edges(triangle_corners: &[u32]) -> BTreeSet<(u32, u32)> {
    let mut edges = BTreeSet::new();
    for tri in triangle_corners.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            if a != b {
                edges.insert((a.min(b), a.max(b)));
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case("box", PrimitiveKind::Box)]
    #[case("cube", PrimitiveKind::Box)]
    #[case("Sphere", PrimitiveKind::Sphere)]
    #[case(" cylinder ", PrimitiveKind::Cylinder)]
    #[case("TORUS", PrimitiveKind::Torus)]
    #[case("cone", PrimitiveKind::Cone)]
    #[case("octahedron", PrimitiveKind::Octahedron)]
    fn parses_known_kind_names(#[case] raw: &str, #[case] expected: PrimitiveKind) {
        assert_eq!(raw.parse::<PrimitiveKind>().ok(), Some(expected));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = "teapot".parse::<PrimitiveKind>().unwrap_err();
        assert!(matches!(err, EditorError::UnknownPrimitiveKind(ref name) if name == "teapot"));
        assert_eq!(err.to_string(), "unknown primitive kind 'teapot'");
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(kind.name().parse::<PrimitiveKind>().ok(), Some(kind));
        }
    }

    #[test]
    fn catalog_dimensions() {
        assert_eq!(
            shape_for(PrimitiveKind::Box),
            ParametricShape::Box {
                half_extents: Vec3::ONE
            }
        );
        assert_relative_eq!(shape_for(PrimitiveKind::Sphere).bounding_radius(), 1.2);
        assert_relative_eq!(shape_for(PrimitiveKind::Torus).bounding_radius(), 1.4);
        assert_relative_eq!(shape_for(PrimitiveKind::Octahedron).bounding_radius(), 1.5);
        assert_relative_eq!(
            shape_for(PrimitiveKind::Cone).bounding_radius(),
            2.0_f32.sqrt()
        );
    }

    #[test]
    fn octahedron_mesh_has_eight_outward_faces() {
        let mesh = build_octahedron_mesh(1.5);
        let positions = mesh
            .attribute(Mesh::ATTRIBUTE_POSITION)
            .and_then(|values| values.as_float3())
            .unwrap();
        let normals = mesh
            .attribute(Mesh::ATTRIBUTE_NORMAL)
            .and_then(|values| values.as_float3())
            .unwrap();
        assert_eq!(positions.len(), 24);
        for (p, n) in positions.iter().zip(normals) {
            assert!(Vec3::from_array(*p).dot(Vec3::from_array(*n)) > 0.0);
        }
    }

    #[test]
    fn octahedron_outline_traces_every_face() {
        let outline = ParametricShape::Octahedron { radius: 1.0 }.outline_mesh();
        // Faces do not share vertices, so every face contributes its own 3 edges.
        assert_eq!(outline.indices().map(|i| i.len()), Some(8 * 3 * 2));
        assert_eq!(outline.primitive_topology(), PrimitiveTopology::LineList);
    }

    #[test]
    fn shared_edges_are_deduplicated() {
        // Two triangles of a quad share the diagonal.
        let edges = unique_edges(&[0, 1, 2, 0, 2, 3]);
        assert_eq!(edges.len(), 5);
        assert!(edges.contains(&(0, 2)));
    }

    #[test]
    fn every_kind_builds_a_surface() {
        for kind in PrimitiveKind::ALL {
            let mesh = shape_for(kind).surface_mesh();
            assert!(mesh.count_vertices() > 0, "{kind} mesh is empty");
        }
    }
}
