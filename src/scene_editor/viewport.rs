use crate::scene_editor::error::{EditorError, EditorResult};
use crate::scene_editor::material::RenderMode;
use crate::scene_editor::{
    CAMERA_FAR, CAMERA_FOV_DEG, CAMERA_NEAR, GRID_EXTENT_CELLS, GRID_PLANE_HEIGHT,
    MAX_LIGHT_INTENSITY, ORTHO_FRUSTUM_SIZE, PRESET_DISTANCE,
};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionKind {
    Perspective,
    Orthographic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewPreset {
    #[default]
    Perspective,
    Orthographic,
    Top,
    Front,
    Side,
}

impl ViewPreset {
    pub const ALL: [ViewPreset; 5] = [
        ViewPreset::Perspective,
        ViewPreset::Orthographic,
        ViewPreset::Top,
        ViewPreset::Front,
        ViewPreset::Side,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Perspective => "Perspective",
            Self::Orthographic => "Orthographic",
            Self::Top => "Top",
            Self::Front => "Front",
            Self::Side => "Side",
        }
    }

    pub fn projection(self) -> ProjectionKind {
        match self {
            Self::Perspective => ProjectionKind::Perspective,
            Self::Orthographic | Self::Top | Self::Front | Self::Side => {
                ProjectionKind::Orthographic
            }
        }
    }
}

/// Camera position and look-at target for a preset view.
pub fn preset_view(view: ViewPreset) -> (Vec3, Vec3) {
    let position = match view {
        ViewPreset::Top => Vec3::Y * PRESET_DISTANCE,
        ViewPreset::Front => Vec3::Z * PRESET_DISTANCE,
        ViewPreset::Side => Vec3::X * PRESET_DISTANCE,
        ViewPreset::Perspective | ViewPreset::Orthographic => Vec3::splat(5.0),
    };
    (position, Vec3::ZERO)
}

/// The editor camera in plain numbers. The scene graph camera is a mirror of
/// this value, so picking never has to read ECS state.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ViewCamera {
    pub kind: ProjectionKind,
    pub aspect_ratio: f32,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub frustum_size: f32,
    /// Orthographic magnification; the visible height is `frustum_size / zoom`.
    pub zoom: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for ViewCamera {
    fn default() -> Self {
        let mut camera = build_camera(ProjectionKind::Perspective, 16.0 / 9.0);
        let (position, target) = preset_view(ViewPreset::Perspective);
        camera.look_from(position, target);
        camera
    }
}

pub fn build_camera(kind: ProjectionKind, aspect_ratio: f32) -> ViewCamera {
    ViewCamera {
        kind,
        aspect_ratio: sanitize_aspect(aspect_ratio),
        fov_y: CAMERA_FOV_DEG.to_radians(),
        near: CAMERA_NEAR,
        far: CAMERA_FAR,
        frustum_size: ORTHO_FRUSTUM_SIZE,
        zoom: 1.0,
        position: Vec3::Z * 5.0,
        target: Vec3::ZERO,
    }
}

fn sanitize_aspect(aspect_ratio: f32) -> f32 {
    if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
        aspect_ratio
    } else {
        1.0
    }
}

impl ViewCamera {
    pub fn look_from(&mut self, position: Vec3, target: Vec3) {
        self.position = position;
        self.target = target;
    }

    pub fn apply_preset(&mut self, view: ViewPreset) {
        self.kind = view.projection();
        self.zoom = 1.0;
        let (position, target) = preset_view(view);
        self.look_from(position, target);
    }

    /// Ignores non-positive or non-finite factors.
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_finite() && zoom > 0.0 {
            self.zoom = zoom;
        }
    }

    /// World-space height the orthographic frustum covers.
    pub fn ortho_view_height(&self) -> f32 {
        self.frustum_size / self.zoom
    }

    /// Resize in place: only the projection parameters change.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = sanitize_aspect(aspect_ratio);
    }

    /// Up vector that stays valid when looking straight down an axis.
    pub fn up(&self) -> Vec3 {
        let forward = (self.target - self.position).normalize_or_zero();
        if forward.cross(Vec3::Y).length_squared() < 1e-6 {
            -Vec3::Z
        } else {
            Vec3::Y
        }
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position).looking_at(self.target, self.up())
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up())
    }

    /// Half width and half height of the orthographic frustum.
    pub fn ortho_half_extents(&self) -> Vec2 {
        let half_height = self.ortho_view_height() * 0.5;
        Vec2::new(half_height * self.aspect_ratio, half_height)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        match self.kind {
            ProjectionKind::Perspective => {
                Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.near, self.far)
            }
            ProjectionKind::Orthographic => {
                let half = self.ortho_half_extents();
                Mat4::orthographic_rh(-half.x, half.x, -half.y, half.y, self.near, self.far)
            }
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub ambient_intensity: f32,
    pub directional_intensity: f32,
    pub direction: [f32; 3],
    pub shadows: bool,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_intensity: 0.6,
            directional_intensity: 0.8,
            direction: [5.0, 5.0, 5.0],
            shadows: true,
        }
    }
}

impl LightingConfig {
    pub fn direction_vec3(&self) -> Vec3 {
        Vec3::from_array(self.direction)
    }

    pub fn has_usable_direction(&self) -> bool {
        let direction = self.direction_vec3();
        direction.is_finite() && direction.length_squared() > 1e-8
    }

    /// Clamps intensities into range and drops an unusable light direction.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let direction = if self.has_usable_direction() {
            self.direction
        } else {
            warn!(
                "rejected light direction {:?}; using {:?}",
                self.direction, defaults.direction
            );
            defaults.direction
        };
        Self {
            ambient_intensity: clamp_intensity(
                "ambient_intensity",
                self.ambient_intensity,
                defaults.ambient_intensity,
            ),
            directional_intensity: clamp_intensity(
                "directional_intensity",
                self.directional_intensity,
                defaults.directional_intensity,
            ),
            direction,
            shadows: self.shadows,
        }
    }
}

fn clamp_intensity(field: &str, value: f32, fallback: f32) -> f32 {
    if !value.is_finite() {
        warn!("{field} is not finite; using {fallback}");
        return fallback;
    }
    let clamped = value.clamp(0.0, MAX_LIGHT_INTENSITY);
    if clamped != value {
        warn!("{field} {value} clamped to {clamped}");
    }
    clamped
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub visible: bool,
    pub snap: bool,
    pub cell_size: f32,
    pub extent_cells: i32,
    pub plane_height: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            visible: true,
            snap: true,
            cell_size: 1.0,
            extent_cells: GRID_EXTENT_CELLS,
            plane_height: GRID_PLANE_HEIGHT,
        }
    }
}

impl GridConfig {
    pub fn validate_cell_size(cell_size: f32) -> EditorResult<f32> {
        if cell_size.is_finite() && cell_size > 0.0 {
            Ok(cell_size)
        } else {
            Err(EditorError::InvalidConfig {
                field: "grid.cell_size",
                reason: format!("{cell_size} is not a positive finite number"),
            })
        }
    }

    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let cell_size = Self::validate_cell_size(self.cell_size).unwrap_or_else(|err| {
            warn!("{err}; using {}", defaults.cell_size);
            defaults.cell_size
        });
        Self {
            cell_size,
            extent_cells: self.extent_cells.max(1),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub view: ViewPreset,
    pub render_mode: RenderMode,
    pub lighting: LightingConfig,
    pub grid: GridConfig,
    pub legacy_animation: bool,
}

impl ViewportConfig {
    pub fn sanitized(self) -> Self {
        Self {
            lighting: self.lighting.sanitized(),
            grid: self.grid.sanitized(),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(ViewPreset::Top, Vec3::new(0.0, 10.0, 0.0))]
    #[case(ViewPreset::Front, Vec3::new(0.0, 0.0, 10.0))]
    #[case(ViewPreset::Side, Vec3::new(10.0, 0.0, 0.0))]
    #[case(ViewPreset::Perspective, Vec3::splat(5.0))]
    #[case(ViewPreset::Orthographic, Vec3::splat(5.0))]
    fn presets_look_at_origin(#[case] view: ViewPreset, #[case] expected: Vec3) {
        let (position, target) = preset_view(view);
        assert_eq!(position, expected);
        assert_eq!(target, Vec3::ZERO);
    }

    #[test]
    fn perspective_camera_constants() {
        let camera = build_camera(ProjectionKind::Perspective, 2.0);
        assert_relative_eq!(camera.fov_y, 75.0_f32.to_radians());
        assert_relative_eq!(camera.near, 0.1);
        assert_relative_eq!(camera.far, 1000.0);
        assert_relative_eq!(camera.aspect_ratio, 2.0);
    }

    #[test]
    fn orthographic_frustum_follows_aspect() {
        let mut camera = build_camera(ProjectionKind::Orthographic, 2.0);
        assert_eq!(camera.ortho_half_extents(), Vec2::new(10.0, 5.0));
        let before = camera.position;
        camera.set_aspect_ratio(0.5);
        assert_eq!(camera.ortho_half_extents(), Vec2::new(2.5, 5.0));
        assert_eq!(camera.position, before);
    }

    #[test]
    fn zoom_shrinks_the_orthographic_frustum_until_the_next_preset() {
        let mut camera = ViewCamera::default();
        camera.apply_preset(ViewPreset::Front);
        camera.set_zoom(2.0);
        assert_relative_eq!(camera.ortho_view_height(), 5.0);
        camera.set_zoom(0.0);
        camera.set_zoom(f32::NAN);
        assert_relative_eq!(camera.zoom, 2.0);

        camera.apply_preset(ViewPreset::Side);
        assert_relative_eq!(camera.ortho_view_height(), ORTHO_FRUSTUM_SIZE);
    }

    #[test]
    fn degenerate_aspect_falls_back_to_square() {
        let mut camera = build_camera(ProjectionKind::Perspective, 0.0);
        assert_relative_eq!(camera.aspect_ratio, 1.0);
        camera.set_aspect_ratio(f32::NAN);
        assert_relative_eq!(camera.aspect_ratio, 1.0);
    }

    #[test]
    fn top_view_uses_a_valid_up_vector() {
        let mut camera = ViewCamera::default();
        camera.apply_preset(ViewPreset::Top);
        assert_eq!(camera.kind, ProjectionKind::Orthographic);
        assert_eq!(camera.up(), -Vec3::Z);
        assert!(camera.view_matrix().is_finite());
    }

    #[test]
    fn lighting_is_clamped_at_the_boundary() {
        let lighting = LightingConfig {
            ambient_intensity: -1.0,
            directional_intensity: 12.0,
            direction: [0.0, 0.0, 0.0],
            shadows: false,
        }
        .sanitized();
        assert_relative_eq!(lighting.ambient_intensity, 0.0);
        assert_relative_eq!(lighting.directional_intensity, MAX_LIGHT_INTENSITY);
        assert_eq!(lighting.direction, LightingConfig::default().direction);
        assert!(!lighting.shadows);
    }

    #[test]
    fn non_finite_intensity_uses_default() {
        let lighting = LightingConfig {
            ambient_intensity: f32::NAN,
            ..default()
        }
        .sanitized();
        assert_relative_eq!(lighting.ambient_intensity, 0.6);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-2.0)]
    #[case(f32::INFINITY)]
    fn bad_cell_size_is_rejected(#[case] size: f32) {
        assert!(matches!(
            GridConfig::validate_cell_size(size),
            Err(EditorError::InvalidConfig { field: "grid.cell_size", .. })
        ));
    }
}
