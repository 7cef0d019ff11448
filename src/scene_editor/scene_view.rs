use crate::scene_editor::animation::AnimatedPointLight;
use crate::scene_editor::geometry::{PrimitiveKind, shape_for};
use crate::scene_editor::interaction::EditorSession;
use crate::scene_editor::material::VisualPair;
use crate::scene_editor::registry::{ObjectId, SceneChange, SceneObject};
use crate::scene_editor::viewport::{ProjectionKind, ViewCamera};
use bevy::app::AppExit;
use bevy::camera::visibility::RenderLayers;
use bevy::camera::{ClearColorConfig, ScalingMode};
use bevy::prelude::*;
use bevy_egui::PrimaryEguiContext;
use std::collections::HashMap;
use tracing::info;

const AMBIENT_BRIGHTNESS_PER_UNIT: f32 = 250.0;
const KEY_LIGHT_LUX_PER_UNIT: f32 = 12_000.0;
const POINT_LIGHT_LUMENS: f32 = 400_000.0;
const POINT_LIGHT_RANGE: f32 = 100.0;

#[derive(Component)]
pub struct EditorCamera;

#[derive(Component)]
pub struct KeyLight;

/// Parent of an object's surface and outline nodes.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneObjectRoot(pub ObjectId);

#[derive(Component)]
pub struct SurfaceNode;

#[derive(Component)]
pub struct OutlineNode;

#[derive(Debug, Clone)]
pub struct PrimitiveMeshSet {
    pub surface: Handle<Mesh>,
    pub flat_surface: Handle<Mesh>,
    pub outline: Handle<Mesh>,
}

/// Meshes are shared per kind; every object of a kind points at the same set.
#[derive(Resource, Debug, Clone)]
pub struct PrimitiveMeshes {
    sets: HashMap<PrimitiveKind, PrimitiveMeshSet>,
}

impl PrimitiveMeshes {
    pub fn build(meshes: &mut Assets<Mesh>) -> Self {
        let sets = PrimitiveKind::ALL
            .into_iter()
            .map(|kind| {
                let shape = shape_for(kind);
                let set = PrimitiveMeshSet {
                    surface: meshes.add(shape.surface_mesh()),
                    flat_surface: meshes.add(shape.flat_surface_mesh()),
                    outline: meshes.add(shape.outline_mesh()),
                };
                (kind, set)
            })
            .collect();
        Self { sets }
    }

    pub fn get(&self, kind: PrimitiveKind) -> Option<&PrimitiveMeshSet> {
        self.sets.get(&kind)
    }

    fn surface_for(&self, kind: PrimitiveKind, visuals: &VisualPair) -> Option<Handle<Mesh>> {
        let set = self.get(kind)?;
        Some(if visuals.surface.flat_shaded {
            set.flat_surface.clone()
        } else {
            set.surface.clone()
        })
    }

    fn handles(&self) -> impl Iterator<Item = &Handle<Mesh>> {
        self.sets
            .values()
            .flat_map(|set| [&set.surface, &set.flat_surface, &set.outline])
    }
}

#[derive(Debug, Clone)]
pub struct ObjectHandles {
    pub root: Entity,
    pub surface: Entity,
    pub outline: Entity,
    pub surface_material: Handle<StandardMaterial>,
    pub outline_material: Handle<StandardMaterial>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReleaseReport {
    pub objects: usize,
    pub materials: usize,
    pub meshes: usize,
}

/// Every render-side resource the session acquired, keyed by object.
#[derive(Resource, Debug, Default)]
pub struct SceneHandles {
    objects: HashMap<ObjectId, ObjectHandles>,
    released: bool,
}

impl SceneHandles {
    pub fn get(&self, id: ObjectId) -> Option<&ObjectHandles> {
        self.objects.get(&id)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn spawn_object(
        &mut self,
        commands: &mut Commands,
        primitive_meshes: &PrimitiveMeshes,
        materials: &mut Assets<StandardMaterial>,
        obj: &SceneObject,
    ) {
        let Some(set) = primitive_meshes.get(obj.kind()) else {
            return;
        };
        let visuals = obj.visuals();
        let surface_mesh = primitive_meshes
            .surface_for(obj.kind(), visuals)
            .unwrap_or_else(|| set.surface.clone());
        let surface_material = materials.add(visuals.surface.to_material());
        let outline_material = materials.add(visuals.outline.to_material());

        let root = commands
            .spawn((
                SceneObjectRoot(obj.id()),
                obj.transform.to_transform(),
                Visibility::Visible,
            ))
            .id();
        let surface = commands
            .spawn((
                SurfaceNode,
                Mesh3d(surface_mesh),
                MeshMaterial3d(surface_material.clone()),
                visibility_of(visuals.surface.visible),
                ChildOf(root),
            ))
            .id();
        let outline = commands
            .spawn((
                OutlineNode,
                Mesh3d(set.outline.clone()),
                MeshMaterial3d(outline_material.clone()),
                visibility_of(visuals.outline.visible),
                ChildOf(root),
            ))
            .id();

        self.objects.insert(
            obj.id(),
            ObjectHandles {
                root,
                surface,
                outline,
                surface_material,
                outline_material,
            },
        );
    }

    /// Swaps in freshly built materials; the old ones are removed, never patched.
    fn restyle_object(
        &mut self,
        commands: &mut Commands,
        primitive_meshes: &PrimitiveMeshes,
        materials: &mut Assets<StandardMaterial>,
        obj: &SceneObject,
    ) {
        let Some(handles) = self.objects.get_mut(&obj.id()) else {
            return;
        };
        let visuals = obj.visuals();

        materials.remove(&handles.surface_material);
        materials.remove(&handles.outline_material);
        handles.surface_material = materials.add(visuals.surface.to_material());
        handles.outline_material = materials.add(visuals.outline.to_material());

        let mut surface = commands.entity(handles.surface);
        surface.insert((
            MeshMaterial3d(handles.surface_material.clone()),
            visibility_of(visuals.surface.visible),
        ));
        if let Some(mesh) = primitive_meshes.surface_for(obj.kind(), visuals) {
            surface.insert(Mesh3d(mesh));
        }
        commands.entity(handles.outline).insert((
            MeshMaterial3d(handles.outline_material.clone()),
            visibility_of(visuals.outline.visible),
        ));
    }

    fn despawn_object(
        &mut self,
        commands: &mut Commands,
        materials: &mut Assets<StandardMaterial>,
        id: ObjectId,
    ) -> bool {
        let Some(handles) = self.objects.remove(&id) else {
            return false;
        };
        materials.remove(&handles.surface_material);
        materials.remove(&handles.outline_material);
        commands.entity(handles.root).despawn();
        true
    }

    /// Releases every object and the shared meshes. A second call is a no-op.
    pub fn release_all(
        &mut self,
        commands: &mut Commands,
        primitive_meshes: Option<&PrimitiveMeshes>,
        meshes: &mut Assets<Mesh>,
        materials: &mut Assets<StandardMaterial>,
    ) -> Option<ReleaseReport> {
        if self.released {
            return None;
        }
        self.released = true;

        let mut report = ReleaseReport::default();
        for (_, handles) in self.objects.drain() {
            for material in [&handles.surface_material, &handles.outline_material] {
                if materials.remove(material).is_some() {
                    report.materials += 1;
                }
            }
            commands.entity(handles.root).despawn();
            report.objects += 1;
        }
        if let Some(primitive_meshes) = primitive_meshes {
            for mesh in primitive_meshes.handles() {
                if meshes.remove(mesh).is_some() {
                    report.meshes += 1;
                }
            }
        }
        Some(report)
    }
}

fn visibility_of(visible: bool) -> Visibility {
    if visible {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

pub fn setup_editor_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    view_camera: Res<ViewCamera>,
    session: Res<EditorSession>,
) {
    commands.spawn((
        Camera3d::default(),
        projection_for(&view_camera),
        view_camera.transform(),
        EditorCamera,
    ));
    commands.spawn((
        Camera2d,
        Camera {
            order: 1,
            clear_color: ClearColorConfig::None,
            ..default()
        },
        RenderLayers::layer(31),
        PrimaryEguiContext,
    ));

    let lighting = session.viewport().lighting;
    commands.spawn((
        DirectionalLight {
            color: Color::WHITE,
            shadows_enabled: lighting.shadows,
            illuminance: lighting.directional_intensity * KEY_LIGHT_LUX_PER_UNIT,
            ..default()
        },
        Transform::from_translation(lighting.direction_vec3()).looking_at(Vec3::ZERO, Vec3::Y),
        KeyLight,
    ));
    for light in AnimatedPointLight::ALL {
        commands.spawn((
            PointLight {
                color: light.color(),
                intensity: POINT_LIGHT_LUMENS,
                range: POINT_LIGHT_RANGE,
                ..default()
            },
            Transform::from_translation(light.home_position()),
            light,
        ));
    }

    commands.insert_resource(PrimitiveMeshes::build(&mut meshes));
}

/// Mirrors structural registry changes into the scene graph, then copies
/// every object's transform.
pub fn sync_scene_objects(
    mut commands: Commands,
    mut session: ResMut<EditorSession>,
    primitive_meshes: Res<PrimitiveMeshes>,
    mut handles: ResMut<SceneHandles>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut roots: Query<&mut Transform, With<SceneObjectRoot>>,
) {
    if handles.is_released() {
        return;
    }

    for change in session.drain_changes() {
        match change {
            SceneChange::Spawned(id) => {
                if let Some(obj) = session.registry().get(id) {
                    handles.spawn_object(&mut commands, &primitive_meshes, &mut materials, obj);
                }
            }
            SceneChange::Restyled(id) => {
                if let Some(obj) = session.registry().get(id) {
                    handles.restyle_object(&mut commands, &primitive_meshes, &mut materials, obj);
                }
            }
            SceneChange::Despawned(id) => {
                handles.despawn_object(&mut commands, &mut materials, id);
            }
        }
    }

    for obj in session.registry().iter() {
        let Some(object_handles) = handles.get(obj.id()) else {
            continue;
        };
        let Ok(mut transform) = roots.get_mut(object_handles.root) else {
            continue;
        };
        let next = obj.transform.to_transform();
        if *transform != next {
            *transform = next;
        }
    }
}

pub fn projection_for(camera: &ViewCamera) -> Projection {
    match camera.kind {
        ProjectionKind::Perspective => Projection::Perspective(PerspectiveProjection {
            fov: camera.fov_y,
            aspect_ratio: camera.aspect_ratio,
            near: camera.near,
            far: camera.far,
            ..default()
        }),
        ProjectionKind::Orthographic => Projection::Orthographic(OrthographicProjection {
            near: camera.near,
            far: camera.far,
            scaling_mode: ScalingMode::FixedVertical {
                viewport_height: camera.ortho_view_height(),
            },
            ..OrthographicProjection::default_3d()
        }),
    }
}

pub fn sync_editor_camera(
    view_camera: Res<ViewCamera>,
    mut cameras: Query<(&mut Transform, &mut Projection), With<EditorCamera>>,
) {
    if !view_camera.is_changed() {
        return;
    }
    for (mut transform, mut projection) in &mut cameras {
        *transform = view_camera.transform();
        *projection = projection_for(&view_camera);
    }
}

pub fn apply_lighting(
    session: Res<EditorSession>,
    mut applied_revision: Local<Option<u64>>,
    mut ambient: ResMut<GlobalAmbientLight>,
    mut key_lights: Query<(&mut DirectionalLight, &mut Transform), With<KeyLight>>,
) {
    let revision = session.viewport_revision();
    if *applied_revision == Some(revision) {
        return;
    }
    let lighting = session.viewport().lighting;

    ambient.brightness = lighting.ambient_intensity * AMBIENT_BRIGHTNESS_PER_UNIT;
    for (mut light, mut transform) in &mut key_lights {
        light.illuminance = lighting.directional_intensity * KEY_LIGHT_LUX_PER_UNIT;
        light.shadows_enabled = lighting.shadows;
        *transform =
            Transform::from_translation(lighting.direction_vec3()).looking_at(Vec3::ZERO, Vec3::Y);
    }
    *applied_revision = Some(revision);
}

pub fn draw_grid_system(mut gizmos: Gizmos, session: Res<EditorSession>) {
    let grid = session.viewport().grid;
    if !grid.visible {
        return;
    }

    let half = grid.extent_cells as f32 * grid.cell_size * 0.5;
    let y = grid.plane_height;
    let color = Color::srgb_u8(0x44, 0x44, 0x44);

    for i in 0..=grid.extent_cells {
        let offset = -half + i as f32 * grid.cell_size;
        gizmos.line(Vec3::new(-half, y, offset), Vec3::new(half, y, offset), color);
        gizmos.line(Vec3::new(offset, y, -half), Vec3::new(offset, y, half), color);
    }
}

pub fn release_scene(
    mut commands: Commands,
    mut handles: ResMut<SceneHandles>,
    primitive_meshes: Option<Res<PrimitiveMeshes>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let report = handles.release_all(
        &mut commands,
        primitive_meshes.as_deref(),
        &mut meshes,
        &mut materials,
    );
    if let Some(report) = report {
        info!(
            "released {} objects, {} materials, {} meshes",
            report.objects, report.materials, report.meshes
        );
    }
}

pub fn release_scene_on_exit(
    mut exits: MessageReader<AppExit>,
    commands: Commands,
    handles: ResMut<SceneHandles>,
    primitive_meshes: Option<Res<PrimitiveMeshes>>,
    meshes: ResMut<Assets<Mesh>>,
    materials: ResMut<Assets<StandardMaterial>>,
) {
    if exits.read().last().is_none() {
        return;
    }
    release_scene(commands, handles, primitive_meshes, meshes, materials);
}
