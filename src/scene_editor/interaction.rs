use crate::scene_editor::config::EditorConfig;
use crate::scene_editor::error::EditorResult;
use crate::scene_editor::geometry::PrimitiveKind;
use crate::scene_editor::material::RenderMode;
use crate::scene_editor::picking::{pick, snap};
use crate::scene_editor::animation::advance_idle_spin;
use crate::scene_editor::registry::{ObjectId, ObjectTransform, SceneChange, SceneRegistry};
use crate::scene_editor::viewport::{GridConfig, LightingConfig, ViewCamera, ViewPreset, ViewportConfig};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    #[default]
    Create,
    Select,
    Move,
    Rotate,
    Scale,
}

impl ToolMode {
    pub const ALL: [ToolMode; 5] = [
        ToolMode::Create,
        ToolMode::Select,
        ToolMode::Move,
        ToolMode::Rotate,
        ToolMode::Scale,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Select => "Select",
            Self::Move => "Move",
            Self::Rotate => "Rotate",
            Self::Scale => "Scale",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    Created(ObjectId),
    Selected(ObjectId),
    SelectionCleared,
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionState {
    pub mode: ToolMode,
    pub primitive: PrimitiveKind,
    pub pointer_down: bool,
    pub pointer_ndc: Vec2,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            mode: ToolMode::Create,
            primitive: PrimitiveKind::Box,
            pointer_down: false,
            pointer_ndc: Vec2::ZERO,
        }
    }
}

/// Everything one editing session owns. Input adapters drive it, the scene
/// view mirrors it. Registry writes go through the session so every object
/// is styled for the current render mode.
#[derive(Resource, Debug)]
pub struct EditorSession {
    registry: SceneRegistry,
    pub interaction: InteractionState,
    viewport: ViewportConfig,
    viewport_revision: u64,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl EditorSession {
    pub fn new(config: &EditorConfig) -> Self {
        let mut session = Self {
            registry: SceneRegistry::new(),
            interaction: InteractionState {
                mode: config.initial_tool,
                primitive: config.initial_primitive,
                ..default()
            },
            viewport: config.viewport.sanitized(),
            viewport_revision: 0,
        };
        if config.seed_initial_object {
            session.spawn(session.interaction.primitive, ObjectTransform::default());
        }
        session
    }

    pub fn viewport(&self) -> &ViewportConfig {
        &self.viewport
    }

    /// Bumped on every viewport configuration change.
    pub fn viewport_revision(&self) -> u64 {
        self.viewport_revision
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    /// The registry holds the only selection flag.
    pub fn selected_id(&self) -> Option<ObjectId> {
        self.registry.selected_id()
    }

    pub fn spawn(&mut self, kind: PrimitiveKind, transform: ObjectTransform) -> ObjectId {
        self.registry.spawn(kind, transform, self.viewport.render_mode)
    }

    pub fn drain_changes(&mut self) -> Vec<SceneChange> {
        self.registry.drain_changes()
    }

    pub fn spin_idle_objects(&mut self) {
        advance_idle_spin(&mut self.registry);
    }

    pub fn set_mode(&mut self, mode: ToolMode) {
        if self.interaction.mode != mode {
            debug!("tool mode {:?} -> {:?}", self.interaction.mode, mode);
            self.interaction.mode = mode;
        }
    }

    pub fn set_primitive(&mut self, kind: PrimitiveKind) {
        self.interaction.primitive = kind;
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        if self.viewport.render_mode == mode {
            return;
        }
        self.viewport.render_mode = mode;
        let restyled = self.registry.apply_render_mode(mode);
        self.viewport_revision += 1;
        info!("render mode {:?}: restyled {restyled} objects", mode);
    }

    pub fn set_view(&mut self, view: ViewPreset) {
        self.viewport.view = view;
        self.viewport_revision += 1;
        info!("view preset {}", view.label());
    }

    /// Clamps intensities; an unusable direction keeps the current one.
    pub fn set_lighting(&mut self, mut lighting: LightingConfig) {
        if !lighting.has_usable_direction() {
            warn!("rejected light direction {:?}", lighting.direction);
            lighting.direction = self.viewport.lighting.direction;
        }
        let lighting = lighting.sanitized();
        if self.viewport.lighting != lighting {
            self.viewport.lighting = lighting;
            self.viewport_revision += 1;
        }
    }

    pub fn set_grid_visible(&mut self, visible: bool) {
        self.update_grid(|grid| grid.visible = visible);
    }

    pub fn set_snap_to_grid(&mut self, snap: bool) {
        self.update_grid(|grid| grid.snap = snap);
    }

    pub fn set_grid_cell_size(&mut self, cell_size: f32) -> EditorResult<()> {
        let cell_size = GridConfig::validate_cell_size(cell_size)?;
        self.update_grid(|grid| grid.cell_size = cell_size);
        Ok(())
    }

    pub fn set_legacy_animation(&mut self, enabled: bool) {
        if self.viewport.legacy_animation != enabled {
            self.viewport.legacy_animation = enabled;
            self.viewport_revision += 1;
        }
    }

    fn update_grid(&mut self, edit: impl FnOnce(&mut GridConfig)) {
        let mut grid = self.viewport.grid;
        edit(&mut grid);
        if grid != self.viewport.grid {
            self.viewport.grid = grid;
            self.viewport_revision += 1;
        }
    }

    pub fn pointer_move(&mut self, ndc: Vec2) {
        self.interaction.pointer_ndc = ndc;
    }

    pub fn pointer_up(&mut self) {
        self.interaction.pointer_down = false;
    }

    pub fn pointer_down(&mut self, ndc: Vec2, camera: &ViewCamera) -> PointerOutcome {
        self.interaction.pointer_ndc = ndc;
        self.interaction.pointer_down = true;
        match self.interaction.mode {
            ToolMode::Create => PointerOutcome::Created(self.create_at_pointer(camera)),
            ToolMode::Select => self.select_at_pointer(camera),
            // Declared tools without drag editing yet.
            ToolMode::Move | ToolMode::Rotate | ToolMode::Scale => PointerOutcome::Ignored,
        }
    }

    fn create_at_pointer(&mut self, camera: &ViewCamera) -> ObjectId {
        let grid = self.viewport.grid;
        let position = pick(self.interaction.pointer_ndc, camera, &self.registry)
            .first()
            .map(|hit| {
                if grid.snap {
                    snap(hit.point, grid.cell_size)
                } else {
                    hit.point
                }
            })
            .unwrap_or(Vec3::ZERO);
        self.spawn(self.interaction.primitive, ObjectTransform::at(position))
    }

    fn select_at_pointer(&mut self, camera: &ViewCamera) -> PointerOutcome {
        let nearest = pick(self.interaction.pointer_ndc, camera, &self.registry)
            .first()
            .map(|hit| hit.id);
        match nearest {
            Some(id) => {
                self.select(id);
                PointerOutcome::Selected(id)
            }
            None => {
                self.clear_selection();
                PointerOutcome::SelectionCleared
            }
        }
    }

    /// Selects a registered object directly, as the object list does.
    pub fn select(&mut self, id: ObjectId) -> bool {
        self.registry.select(id, self.viewport.render_mode)
    }

    pub fn clear_selection(&mut self) {
        if self.selected_id().is_some() {
            self.registry.clear_selection(self.viewport.render_mode);
            debug!("selection cleared");
        }
    }

    pub fn key_down(&mut self, key: EditorKey) -> Option<ObjectId> {
        match key {
            EditorKey::Delete => self.delete_selected(),
        }
    }

    /// Removes the selected object. Without a selection this does nothing.
    pub fn delete_selected(&mut self) -> Option<ObjectId> {
        let id = self.selected_id()?;
        self.registry.despawn(id).map(|obj| obj.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_editor::viewport::{ProjectionKind, build_camera};
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    fn front_camera() -> ViewCamera {
        let mut camera = build_camera(ProjectionKind::Perspective, 1.0);
        camera.look_from(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        camera
    }

    fn empty_session() -> EditorSession {
        EditorSession::new(&EditorConfig {
            seed_initial_object: false,
            ..default()
        })
    }

    fn assert_single_selection(session: &EditorSession) {
        let flagged: Vec<_> = session
            .registry()
            .iter()
            .filter(|o| o.is_selected())
            .map(|o| o.id())
            .collect();
        assert!(flagged.len() <= 1);
        assert_eq!(session.selected_id(), flagged.first().copied());
    }

    #[test]
    fn default_session_seeds_one_object_at_origin() {
        let session = EditorSession::default();
        assert_eq!(session.registry().len(), 1);
        let seed = session.registry().iter().next().unwrap();
        assert_eq!(seed.transform.translation, Vec3::ZERO);
        assert!(!seed.is_selected());
    }

    #[test]
    fn create_without_hit_places_at_origin() {
        let mut session = empty_session();
        let outcome = session.pointer_down(Vec2::new(0.9, 0.9), &front_camera());
        let PointerOutcome::Created(id) = outcome else {
            panic!("expected a created object, got {outcome:?}");
        };
        assert_eq!(session.registry().len(), 1);
        let obj = session.registry().get(id).unwrap();
        assert_eq!(obj.transform.translation, Vec3::ZERO);
        assert_eq!(obj.kind(), PrimitiveKind::Box);
        assert!(!obj.is_selected());
    }

    #[test]
    fn create_on_hit_snaps_to_grid() {
        let mut session = empty_session();
        session.spawn(PrimitiveKind::Box, ObjectTransform::at(Vec3::new(0.0, 0.0, -0.4)));
        // Front face of the box sits at z = 0.6, snapped up to 1.
        let PointerOutcome::Created(id) = session.pointer_down(Vec2::ZERO, &front_camera()) else {
            panic!("expected a created object");
        };
        assert_eq!(
            session.registry().get(id).unwrap().transform.translation,
            Vec3::new(0.0, 0.0, 1.0)
        );
    }

    #[test]
    fn create_on_hit_without_snap_keeps_raw_point() {
        let mut session = empty_session();
        session.set_snap_to_grid(false);
        session.spawn(PrimitiveKind::Box, ObjectTransform::at(Vec3::new(0.0, 0.0, -0.4)));
        let PointerOutcome::Created(id) = session.pointer_down(Vec2::ZERO, &front_camera()) else {
            panic!("expected a created object");
        };
        let z = session.registry().get(id).unwrap().transform.translation.z;
        assert_relative_eq!(z, 0.6, epsilon = 1e-4);
    }

    #[test]
    fn select_hit_shows_outline() {
        let mut session = EditorSession::default();
        session.set_mode(ToolMode::Select);
        let seeded = session.registry().iter().next().unwrap().id();

        let outcome = session.pointer_down(Vec2::ZERO, &front_camera());
        assert_eq!(outcome, PointerOutcome::Selected(seeded));
        assert_eq!(session.selected_id(), Some(seeded));
        assert!(session.registry().get(seeded).unwrap().visuals().outline.visible);
        assert_single_selection(&session);
    }

    #[test]
    fn select_miss_clears_selection() {
        let mut session = EditorSession::default();
        session.set_mode(ToolMode::Select);
        session.pointer_down(Vec2::ZERO, &front_camera());
        session.pointer_up();

        let outcome = session.pointer_down(Vec2::new(0.95, -0.95), &front_camera());
        assert_eq!(outcome, PointerOutcome::SelectionCleared);
        assert_eq!(session.selected_id(), None);
        assert!(session.registry().iter().all(|o| !o.visuals().outline.visible));
        assert_single_selection(&session);
    }

    #[test]
    fn selecting_another_object_moves_the_selection() {
        let mut session = EditorSession::default();
        let first = session.registry().iter().next().unwrap().id();
        let second = session.spawn(PrimitiveKind::Cone, ObjectTransform::at(Vec3::X * 4.0));
        assert!(session.select(first));
        assert!(session.select(second));
        assert!(!session.registry().get(first).unwrap().is_selected());
        assert_single_selection(&session);
    }

    #[test]
    fn delete_removes_selection_once() {
        let mut session = EditorSession::default();
        session.set_mode(ToolMode::Select);
        let seeded = session.registry().iter().next().unwrap().id();
        session.pointer_down(Vec2::ZERO, &front_camera());

        assert_eq!(session.key_down(EditorKey::Delete), Some(seeded));
        assert_eq!(session.registry().len(), 0);
        assert_eq!(session.selected_id(), None);

        assert_eq!(session.key_down(EditorKey::Delete), None);
        assert_eq!(session.registry().len(), 0);
    }

    #[test]
    fn transform_tools_are_inert() {
        let mut session = EditorSession::default();
        for mode in [ToolMode::Move, ToolMode::Rotate, ToolMode::Scale] {
            session.set_mode(mode);
            assert_eq!(
                session.pointer_down(Vec2::ZERO, &front_camera()),
                PointerOutcome::Ignored
            );
            session.pointer_up();
        }
        assert_eq!(session.registry().len(), 1);
        assert!(!session.interaction.pointer_down);
    }

    #[test]
    fn render_mode_switch_restyles_live_objects() {
        let mut session = EditorSession::default();
        session.set_render_mode(RenderMode::Solid);
        let revision = session.viewport_revision();
        session.set_render_mode(RenderMode::Wireframe);
        session.set_render_mode(RenderMode::Solid);
        assert_eq!(session.viewport_revision(), revision + 2);
        for obj in session.registry().iter() {
            assert!(obj.visuals().surface.visible);
            assert!(!obj.visuals().outline.visible);
        }
    }

    #[test]
    fn invalid_cell_size_keeps_previous_grid() {
        let mut session = empty_session();
        assert!(session.set_grid_cell_size(-1.0).is_err());
        assert_relative_eq!(session.viewport().grid.cell_size, 1.0);
        session.set_grid_cell_size(0.5).unwrap();
        assert_relative_eq!(session.viewport().grid.cell_size, 0.5);
    }

    #[test]
    fn zero_light_direction_keeps_the_previous_one() {
        let mut session = empty_session();
        let mut lighting = session.viewport().lighting;
        lighting.direction = [1.0, 2.0, 3.0];
        session.set_lighting(lighting);
        lighting.direction = [0.0, 0.0, 0.0];
        lighting.ambient_intensity = 7.0;
        session.set_lighting(lighting);
        assert_eq!(session.viewport().lighting.direction, [1.0, 2.0, 3.0]);
        assert_relative_eq!(session.viewport().lighting.ambient_intensity, 4.0);
    }

    #[test]
    fn pointer_move_only_tracks_position() {
        let mut session = EditorSession::default();
        session.pointer_move(Vec2::new(0.25, -0.5));
        assert_eq!(session.interaction.pointer_ndc, Vec2::new(0.25, -0.5));
        assert_eq!(session.registry().len(), 1);
        assert!(!session.interaction.pointer_down);
    }

    #[test]
    fn deleting_a_selected_object_leaves_no_selection_behind() {
        let mut session = EditorSession::default();
        let cone = session.spawn(PrimitiveKind::Cone, ObjectTransform::at(Vec3::X * 4.0));
        session.select(cone);
        assert_eq!(session.delete_selected(), Some(cone));
        assert_eq!(session.selected_id(), None);
        assert!(!session.select(cone));
        assert_single_selection(&session);
    }

    #[test]
    fn spawned_objects_follow_the_current_render_mode() {
        let mut session = empty_session();
        session.set_render_mode(RenderMode::Wireframe);
        let id = session.spawn(PrimitiveKind::Sphere, ObjectTransform::default());
        let visuals = session.registry().get(id).unwrap().visuals();
        assert!(!visuals.surface.visible);
        assert!(visuals.outline.visible);
    }
}
