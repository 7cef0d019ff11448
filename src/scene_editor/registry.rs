use crate::scene_editor::geometry::{ParametricShape, PrimitiveKind, shape_for};
use crate::scene_editor::material::{RenderMode, VisualPair, materials_for};
use bevy::prelude::*;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectTransform {
    pub translation: Vec3,
    /// XYZ Euler angles in radians.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl ObjectTransform {
    pub fn at(translation: Vec3) -> Self {
        Self {
            translation,
            ..default()
        }
    }

    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation_quat(), self.translation)
    }

    pub fn to_transform(&self) -> Transform {
        Transform {
            translation: self.translation,
            rotation: self.rotation_quat(),
            scale: self.scale,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    id: ObjectId,
    kind: PrimitiveKind,
    pub transform: ObjectTransform,
    selected: bool,
    visuals: VisualPair,
}

impl SceneObject {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    pub fn shape(&self) -> ParametricShape {
        shape_for(self.kind)
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn visuals(&self) -> &VisualPair {
        &self.visuals
    }
}

/// Structural changes the scene graph has not yet mirrored. Transforms are
/// not logged; they are copied every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneChange {
    Spawned(ObjectId),
    Despawned(ObjectId),
    Restyled(ObjectId),
}

#[derive(Debug)]
pub struct SceneRegistry {
    objects: Vec<SceneObject>,
    next_id: u64,
    changes: Vec<SceneChange>,
}

impl Default for SceneRegistry {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
            next_id: 1,
            changes: Vec::new(),
        }
    }
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(
        &mut self,
        kind: PrimitiveKind,
        transform: ObjectTransform,
        mode: RenderMode,
    ) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.push(SceneObject {
            id,
            kind,
            transform,
            selected: false,
            visuals: materials_for(mode, false),
        });
        self.changes.push(SceneChange::Spawned(id));
        info!(
            "created {kind} {id} at ({:.2}, {:.2}, {:.2})",
            transform.translation.x, transform.translation.y, transform.translation.z
        );
        id
    }

    pub fn despawn(&mut self, id: ObjectId) -> Option<SceneObject> {
        let index = self.objects.iter().position(|obj| obj.id == id)?;
        let removed = self.objects.remove(index);
        self.changes.push(SceneChange::Despawned(id));
        info!("deleted {} {id}", removed.kind);
        Some(removed)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|obj| obj.id == id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    /// Objects in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SceneObject> {
        self.objects.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn selected_id(&self) -> Option<ObjectId> {
        self.objects.iter().find(|obj| obj.selected).map(|obj| obj.id)
    }

    /// Makes `id` the only selected object. Returns false when `id` is not
    /// registered, in which case the selection is left untouched.
    pub fn select(&mut self, id: ObjectId, mode: RenderMode) -> bool {
        if !self.contains(id) {
            return false;
        }
        for obj in &mut self.objects {
            let selected = obj.id == id;
            if obj.selected != selected {
                obj.selected = selected;
                obj.visuals = materials_for(mode, selected);
                self.changes.push(SceneChange::Restyled(obj.id));
            }
        }
        debug!("selected {id}");
        true
    }

    pub fn clear_selection(&mut self, mode: RenderMode) {
        for obj in &mut self.objects {
            if obj.selected {
                obj.selected = false;
                obj.visuals = materials_for(mode, false);
                self.changes.push(SceneChange::Restyled(obj.id));
            }
        }
    }

    /// Recomputes every object's visuals for `mode`; returns how many were
    /// restyled.
    pub fn apply_render_mode(&mut self, mode: RenderMode) -> usize {
        let mut restyled = 0;
        for obj in &mut self.objects {
            let visuals = materials_for(mode, obj.selected);
            if obj.visuals != visuals {
                obj.visuals = visuals;
                self.changes.push(SceneChange::Restyled(obj.id));
                restyled += 1;
            }
        }
        restyled
    }

    pub fn drain_changes(&mut self) -> Vec<SceneChange> {
        std::mem::take(&mut self.changes)
    }
}
