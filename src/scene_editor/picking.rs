use crate::scene_editor::geometry::ParametricShape;
use crate::scene_editor::registry::{ObjectId, SceneRegistry};
use crate::scene_editor::viewport::{ProjectionKind, ViewCamera};
use bevy::prelude::*;
use std::cmp::Ordering;

const EPSILON: f32 = 1e-6;
const TORUS_MAX_STEPS: usize = 256;
const TORUS_HIT_DISTANCE: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickRay {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl PickRay {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub id: ObjectId,
    pub distance: f32,
    pub point: Vec3,
}

/// World-space ray through a pointer position given in normalized device
/// coordinates (x right, y up, both in -1..=1).
pub fn ray_from_ndc(ndc: Vec2, camera: &ViewCamera) -> Option<PickRay> {
    if !ndc.is_finite() {
        return None;
    }
    let inverse = camera.view_projection().inverse();
    let near = inverse.project_point3(ndc.extend(0.0));
    let far = inverse.project_point3(ndc.extend(1.0));
    let direction = (far - near).normalize_or_zero();
    if direction == Vec3::ZERO || !near.is_finite() {
        return None;
    }
    let origin = match camera.kind {
        ProjectionKind::Perspective => camera.position,
        ProjectionKind::Orthographic => near,
    };
    Some(PickRay { origin, direction })
}

/// Every registered object the ray crosses, nearest first. Only registry
/// members are candidates, so helpers such as the grid never show up.
pub fn pick(ndc: Vec2, camera: &ViewCamera, registry: &SceneRegistry) -> Vec<PickHit> {
    let Some(ray) = ray_from_ndc(ndc, camera) else {
        return Vec::new();
    };
    pick_ray(&ray, registry)
}

pub fn pick_ray(ray: &PickRay, registry: &SceneRegistry) -> Vec<PickHit> {
    let mut hits: Vec<PickHit> = registry
        .iter()
        .filter_map(|obj| {
            let point = intersect_object(ray, &obj.shape(), obj.transform.matrix())?;
            Some(PickHit {
                id: obj.id(),
                distance: (point - ray.origin).length(),
                point,
            })
        })
        .collect();
    hits.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(Ordering::Equal)
    });
    hits
}

/// Rounds each axis to the nearest multiple of `cell_size`.
pub fn snap(point: Vec3, cell_size: f32) -> Vec3 {
    if !(cell_size.is_finite() && cell_size > 0.0) {
        return point;
    }
    (point / cell_size).round() * cell_size
}

/// World-space entry point of `ray` into a shape placed by `matrix`.
fn intersect_object(ray: &PickRay, shape: &ParametricShape, matrix: Mat4) -> Option<Vec3> {
    if matrix.determinant().abs() < EPSILON {
        return None;
    }
    let inverse = matrix.inverse();
    let local_origin = inverse.transform_point3(ray.origin);
    let local_direction = inverse.transform_vector3(ray.direction).normalize_or_zero();
    if local_direction == Vec3::ZERO {
        return None;
    }
    let local = PickRay {
        origin: local_origin,
        direction: local_direction,
    };
    let t = intersect_shape(&local, shape)?;
    Some(matrix.transform_point3(local.at(t)))
}

/// Distance along a local-frame ray to the first surface crossing ahead of
/// its origin.
pub fn intersect_shape(ray: &PickRay, shape: &ParametricShape) -> Option<f32> {
    if !hits_sphere(ray, shape.bounding_radius()) {
        return None;
    }
    match *shape {
        ParametricShape::Box { half_extents } => intersect_box(ray, half_extents),
        ParametricShape::Sphere { radius, .. } => intersect_sphere(ray, radius),
        ParametricShape::Cylinder {
            radius,
            half_height,
            ..
        } => intersect_cylinder(ray, radius, half_height),
        ParametricShape::Cone {
            radius,
            half_height,
            ..
        } => intersect_cone(ray, radius, half_height),
        ParametricShape::Torus {
            major_radius,
            minor_radius,
            ..
        } => intersect_torus(ray, major_radius, minor_radius),
        ParametricShape::Octahedron { radius } => intersect_octahedron(ray, radius),
    }
}

fn hits_sphere(ray: &PickRay, radius: f32) -> bool {
    sphere_span(ray, radius).is_some_and(|(_, exit)| exit >= 0.0)
}

fn sphere_span(ray: &PickRay, radius: f32) -> Option<(f32, f32)> {
    let b = ray.origin.dot(ray.direction);
    let c = ray.origin.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    Some((-b - root, -b + root))
}

fn first_ahead(enter: f32, exit: f32) -> Option<f32> {
    if exit < 0.0 || enter > exit {
        None
    } else if enter >= 0.0 {
        Some(enter)
    } else {
        Some(exit)
    }
}

fn intersect_sphere(ray: &PickRay, radius: f32) -> Option<f32> {
    let (enter, exit) = sphere_span(ray, radius)?;
    first_ahead(enter, exit)
}

fn intersect_box(ray: &PickRay, half_extents: Vec3) -> Option<f32> {
    let mut enter = f32::NEG_INFINITY;
    let mut exit = f32::INFINITY;
    for axis in 0..3 {
        let origin = ray.origin[axis];
        let direction = ray.direction[axis];
        let half = half_extents[axis];
        if direction.abs() < EPSILON {
            if origin.abs() > half {
                return None;
            }
            continue;
        }
        let t1 = (-half - origin) / direction;
        let t2 = (half - origin) / direction;
        enter = enter.max(t1.min(t2));
        exit = exit.min(t1.max(t2));
    }
    first_ahead(enter, exit)
}

/// Convex solid |x| + |y| + |z| <= radius, clipped against its eight planes.
fn intersect_octahedron(ray: &PickRay, radius: f32) -> Option<f32> {
    let mut enter = f32::NEG_INFINITY;
    let mut exit = f32::INFINITY;
    for sx in [-1.0, 1.0] {
        for sy in [-1.0, 1.0] {
            for sz in [-1.0, 1.0] {
                let normal = Vec3::new(sx, sy, sz);
                let denom = normal.dot(ray.direction);
                let slack = radius - normal.dot(ray.origin);
                if denom.abs() < EPSILON {
                    if slack < 0.0 {
                        return None;
                    }
                    continue;
                }
                let t = slack / denom;
                if denom > 0.0 {
                    exit = exit.min(t);
                } else {
                    enter = enter.max(t);
                }
            }
        }
    }
    first_ahead(enter, exit)
}

fn smallest_ahead(candidates: impl IntoIterator<Item = f32>) -> Option<f32> {
    candidates
        .into_iter()
        .filter(|t| t.is_finite() && *t >= 0.0)
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
}

fn quadratic_roots(a: f32, b: f32, c: f32) -> Vec<f32> {
    if a.abs() < EPSILON {
        if b.abs() < EPSILON {
            return Vec::new();
        }
        return vec![-c / b];
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return Vec::new();
    }
    let root = disc.sqrt();
    vec![(-b - root) / (2.0 * a), (-b + root) / (2.0 * a)]
}

fn cap_hit(ray: &PickRay, height: f32, radius: f32) -> Option<f32> {
    if ray.direction.y.abs() < EPSILON {
        return None;
    }
    let t = (height - ray.origin.y) / ray.direction.y;
    let p = ray.at(t);
    (p.x * p.x + p.z * p.z <= radius * radius).then_some(t)
}

fn intersect_cylinder(ray: &PickRay, radius: f32, half_height: f32) -> Option<f32> {
    let (o, d) = (ray.origin, ray.direction);
    let a = d.x * d.x + d.z * d.z;
    let b = 2.0 * (o.x * d.x + o.z * d.z);
    let c = o.x * o.x + o.z * o.z - radius * radius;
    let side = quadratic_roots(a, b, c)
        .into_iter()
        .filter(|t| ray.at(*t).y.abs() <= half_height);
    let caps = [
        cap_hit(ray, half_height, radius),
        cap_hit(ray, -half_height, radius),
    ];
    smallest_ahead(side.chain(caps.into_iter().flatten()))
}

/// Apex at `+half_height`, base disc of `radius` at `-half_height`.
fn intersect_cone(ray: &PickRay, radius: f32, half_height: f32) -> Option<f32> {
    let (o, d) = (ray.origin, ray.direction);
    let k = radius / (2.0 * half_height);
    let k2 = k * k;
    let h = half_height - o.y;
    let a = d.x * d.x + d.z * d.z - k2 * d.y * d.y;
    let b = 2.0 * (o.x * d.x + o.z * d.z) + 2.0 * k2 * h * d.y;
    let c = o.x * o.x + o.z * o.z - k2 * h * h;
    let side = quadratic_roots(a, b, c)
        .into_iter()
        .filter(|t| ray.at(*t).y.abs() <= half_height);
    let base = cap_hit(ray, -half_height, radius);
    smallest_ahead(side.chain(base))
}

fn torus_distance(p: Vec3, major_radius: f32, minor_radius: f32) -> f32 {
    let ring = Vec2::new(p.x, p.z).length() - major_radius;
    Vec2::new(ring, p.y).length() - minor_radius
}

/// Sphere tracing against the exact torus distance field, bounded by the
/// enclosing sphere.
fn intersect_torus(ray: &PickRay, major_radius: f32, minor_radius: f32) -> Option<f32> {
    let (enter, exit) = sphere_span(ray, major_radius + minor_radius)?;
    let mut t = enter.max(0.0);
    if torus_distance(ray.at(t), major_radius, minor_radius) < 0.0 {
        // Origin inside the tube: the first crossing is on the way out.
        return None;
    }
    for _ in 0..TORUS_MAX_STEPS {
        if t > exit {
            return None;
        }
        let distance = torus_distance(ray.at(t), major_radius, minor_radius);
        if distance < TORUS_HIT_DISTANCE {
            return Some(t);
        }
        t += distance;
    }
    None
}
