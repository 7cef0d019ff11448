use crate::scene_editor::interaction::EditorSession;
use crate::scene_editor::scene_view::EditorCamera;
use crate::scene_editor::viewport::{ViewCamera, ViewPreset};
use bevy::camera::Viewport;
use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll};
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, CursorOptions, PrimaryWindow, Window};
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitSettings {
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            damping_factor: 0.05,
            rotate_speed: 0.006,
            pan_speed: 0.0018,
            zoom_speed: 0.10,
            min_distance: 0.5,
            max_distance: 200.0,
        }
    }
}

impl OrbitSettings {
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let positive = |value: f32, fallback: f32| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };
        let min_distance = positive(self.min_distance, defaults.min_distance);
        Self {
            damping_factor: positive(self.damping_factor, defaults.damping_factor).min(1.0),
            rotate_speed: positive(self.rotate_speed, defaults.rotate_speed),
            pan_speed: positive(self.pan_speed, defaults.pan_speed),
            zoom_speed: positive(self.zoom_speed, defaults.zoom_speed),
            min_distance,
            max_distance: positive(self.max_distance, defaults.max_distance).max(min_distance),
        }
    }
}

/// Damped orbit/pan/zoom around a target. Input accumulates into pending
/// deltas and `update` releases a `damping_factor` share of them per frame.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub settings: OrbitSettings,
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    seated_distance: f32,
    yaw_delta: f32,
    pitch_delta: f32,
    pan_delta: Vec3,
    zoom_scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        let camera = ViewCamera::default();
        Self::new(OrbitSettings::default(), camera.position, camera.target)
    }
}

impl OrbitControls {
    pub fn new(settings: OrbitSettings, position: Vec3, target: Vec3) -> Self {
        let mut controls = Self {
            settings: settings.sanitized(),
            target,
            yaw: 0.0,
            pitch: 0.0,
            distance: 1.0,
            seated_distance: 1.0,
            yaw_delta: 0.0,
            pitch_delta: 0.0,
            pan_delta: Vec3::ZERO,
            zoom_scale: 1.0,
        };
        controls.seat(position, target);
        controls
    }

    /// Places the camera exactly at `position` and drops any pending motion.
    pub fn seat(&mut self, position: Vec3, target: Vec3) {
        let offset = position - target;
        let distance = offset.length().max(self.settings.min_distance);
        self.target = target;
        self.distance = distance;
        self.seated_distance = distance;
        self.yaw = offset.x.atan2(offset.z);
        self.pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
        self.yaw_delta = 0.0;
        self.pitch_delta = 0.0;
        self.pan_delta = Vec3::ZERO;
        self.zoom_scale = 1.0;
    }

    pub fn position(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target
            + Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw) * self.distance
    }

    pub fn rotate(&mut self, pointer_delta: Vec2) {
        self.yaw_delta -= pointer_delta.x * self.settings.rotate_speed;
        self.pitch_delta += pointer_delta.y * self.settings.rotate_speed;
    }

    pub fn pan(&mut self, pointer_delta: Vec2) {
        let forward = (self.target - self.position()).normalize_or_zero();
        let mut right = forward.cross(Vec3::Y);
        if right.length_squared() < 1e-6 {
            right = Vec3::X;
        }
        let right = right.normalize();
        let up = right.cross(forward).normalize_or_zero();
        let scale = self.distance * self.settings.pan_speed;
        self.pan_delta += (-pointer_delta.x * right + pointer_delta.y * up) * scale;
    }

    pub fn zoom(&mut self, scroll: f32) {
        self.zoom_scale *= (1.0 - scroll * self.settings.zoom_speed).clamp(0.2, 5.0);
    }

    /// Magnification relative to the seated distance. Orthographic cameras
    /// apply it to the frustum since dollying does not change their image.
    pub fn ortho_zoom(&self) -> f32 {
        self.seated_distance / self.distance
    }

    pub fn is_settled(&self) -> bool {
        self.yaw_delta.abs() < 1e-6
            && self.pitch_delta.abs() < 1e-6
            && self.pan_delta.length_squared() < 1e-12
            && self.zoom_scale == 1.0
    }

    /// One damping step; returns the new camera position.
    pub fn update(&mut self) -> Vec3 {
        let damping = self.settings.damping_factor;

        self.yaw += self.yaw_delta * damping;
        if self.pitch_delta != 0.0 {
            self.pitch = (self.pitch + self.pitch_delta * damping).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
        self.target += self.pan_delta * damping;
        self.distance = (self.distance * self.zoom_scale)
            .clamp(self.settings.min_distance, self.settings.max_distance);

        let keep = 1.0 - damping;
        self.yaw_delta *= keep;
        self.pitch_delta *= keep;
        self.pan_delta *= keep;
        if self.yaw_delta.abs() < 1e-7 {
            self.yaw_delta = 0.0;
        }
        if self.pitch_delta.abs() < 1e-7 {
            self.pitch_delta = 0.0;
        }
        if self.pan_delta.length_squared() < 1e-14 {
            self.pan_delta = Vec3::ZERO;
        }
        self.zoom_scale = 1.0;

        self.position()
    }
}

/// One damping step applied to the view camera.
pub fn drive_camera(controls: &mut OrbitControls, camera: &mut ViewCamera) {
    let position = controls.update();
    camera.look_from(position, controls.target);
    camera.set_zoom(controls.ortho_zoom());
}

/// What the panel pass reported for the last frame.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct PanelFocus {
    pub pointer_over_panel: bool,
    pub typing: bool,
    pub panel_width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrabChange {
    Lock,
    Release { restore: Vec2 },
    Unchanged,
}

/// Cursor lock held during a camera drag. Remembers where the cursor was
/// so releasing puts it back.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct CursorGrab {
    held_at: Option<Vec2>,
}

impl CursorGrab {
    /// Locking needs a cursor position; a held lock survives frames where
    /// the window reports none.
    pub fn step(&mut self, dragging: bool, cursor: Option<Vec2>) -> GrabChange {
        match (self.held_at, dragging, cursor) {
            (None, true, Some(at)) => {
                self.held_at = Some(at);
                GrabChange::Lock
            }
            (Some(restore), false, _) => {
                self.held_at = None;
                GrabChange::Release { restore }
            }
            _ => GrabChange::Unchanged,
        }
    }
}

pub fn camera_drag_pressed(mouse_buttons: &ButtonInput<MouseButton>) -> bool {
    mouse_buttons.any_pressed([MouseButton::Right, MouseButton::Middle])
}

/// Logical-pixel rectangle the 3D view occupies inside the window.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Default for ViewportRect {
    fn default() -> Self {
        Self {
            min: Vec2::ZERO,
            size: Vec2::new(1280.0, 720.0),
        }
    }
}

impl ViewportRect {
    pub fn aspect_ratio(&self) -> f32 {
        self.size.x / self.size.y.max(1.0)
    }

    /// Cursor position (logical px, origin top-left) to normalized device
    /// coordinates; `None` outside the viewport.
    pub fn to_ndc(&self, cursor: Vec2) -> Option<Vec2> {
        if self.size.x <= 0.0 || self.size.y <= 0.0 {
            return None;
        }
        let local = (cursor - self.min) / self.size;
        if !(0.0..=1.0).contains(&local.x) || !(0.0..=1.0).contains(&local.y) {
            return None;
        }
        Some(Vec2::new(local.x * 2.0 - 1.0, 1.0 - local.y * 2.0))
    }
}

pub fn apply_view_preset(
    session: &mut EditorSession,
    camera: &mut ViewCamera,
    controls: &mut OrbitControls,
    view: ViewPreset,
) {
    session.set_view(view);
    camera.apply_preset(view);
    controls.seat(camera.position, camera.target);
}

pub fn update_camera_viewport(
    windows: Query<&Window, With<PrimaryWindow>>,
    focus: Res<PanelFocus>,
    mut rect: ResMut<ViewportRect>,
    mut view_camera: ResMut<ViewCamera>,
    mut camera_query: Query<&mut Camera, With<EditorCamera>>,
) {
    let Ok(window) = windows.single() else {
        return;
    };

    let physical_width = window.physical_width();
    let physical_height = window.physical_height().max(1);
    if physical_width == 0 {
        return;
    }

    let scale = window.scale_factor();
    let panel_px = (focus.panel_width.max(0.0) * scale) as u32;
    let viewport_x = panel_px.min(physical_width.saturating_sub(1));
    let viewport_width = physical_width.saturating_sub(viewport_x).max(1);

    let next_rect = ViewportRect {
        min: Vec2::new(viewport_x as f32 / scale, 0.0),
        size: Vec2::new(viewport_width as f32, physical_height as f32) / scale,
    };
    if *rect != next_rect {
        *rect = next_rect;
        view_camera.set_aspect_ratio(next_rect.aspect_ratio());
    }

    let viewport = Some(Viewport {
        physical_position: UVec2::new(viewport_x, 0),
        physical_size: UVec2::new(viewport_width, physical_height),
        depth: 0.0..1.0,
    });

    for mut camera in &mut camera_query {
        camera.viewport = viewport.clone();
    }
}

pub fn orbit_camera_system(
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    focus: Res<PanelFocus>,
    mut controls: ResMut<OrbitControls>,
    mut view_camera: ResMut<ViewCamera>,
) {
    let mouse_delta = Vec2::new(mouse_motion.delta.x, -mouse_motion.delta.y);
    let scroll_delta = mouse_scroll.delta.y;

    let pointer_in_window = windows
        .single()
        .ok()
        .and_then(|w| w.cursor_position())
        .is_some();
    if pointer_in_window && !focus.pointer_over_panel {
        if mouse_buttons.pressed(MouseButton::Right) && mouse_delta.length_squared() > 0.0 {
            controls.rotate(mouse_delta);
        }
        if mouse_buttons.pressed(MouseButton::Middle) && mouse_delta.length_squared() > 0.0 {
            controls.pan(mouse_delta);
        }
        if scroll_delta.abs() > f32::EPSILON {
            controls.zoom(scroll_delta);
        }
    }

    if controls.is_settled() && view_camera.target == controls.target {
        return;
    }
    drive_camera(&mut controls, &mut view_camera);
}

pub fn sync_cursor_grab(
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    focus: Res<PanelFocus>,
    mut grab: ResMut<CursorGrab>,
    mut windows: Query<(&mut Window, &mut CursorOptions), With<PrimaryWindow>>,
) {
    let Ok((mut window, mut cursor_options)) = windows.single_mut() else {
        return;
    };

    let dragging = window.focused && camera_drag_pressed(&mouse_buttons) && !focus.pointer_over_panel;
    match grab.step(dragging, window.cursor_position()) {
        GrabChange::Lock => {
            cursor_options.visible = false;
            cursor_options.grab_mode = CursorGrabMode::Locked;
        }
        GrabChange::Release { restore } => {
            window.set_cursor_position(Some(restore));
            cursor_options.visible = true;
            cursor_options.grab_mode = CursorGrabMode::None;
        }
        GrabChange::Unchanged => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn settle(controls: &mut OrbitControls) {
        for _ in 0..2000 {
            controls.update();
        }
    }

    #[test]
    fn seat_reproduces_position() {
        let controls = OrbitControls::new(
            OrbitSettings::default(),
            Vec3::new(5.0, 5.0, 5.0),
            Vec3::ZERO,
        );
        let position = controls.position();
        assert_relative_eq!(position.x, 5.0, epsilon = 1e-4);
        assert_relative_eq!(position.y, 5.0, epsilon = 1e-4);
        assert_relative_eq!(position.z, 5.0, epsilon = 1e-4);
        assert!(controls.is_settled());
    }

    #[test]
    fn rotation_is_released_gradually() {
        let mut controls = OrbitControls::default();
        let start = controls.yaw;
        controls.rotate(Vec2::new(-100.0, 0.0));
        controls.update();
        let first_step = controls.yaw - start;
        assert_relative_eq!(first_step, 100.0 * 0.006 * 0.05, epsilon = 1e-5);

        settle(&mut controls);
        assert_relative_eq!(controls.yaw - start, 100.0 * 0.006, epsilon = 1e-3);
        assert!(controls.is_settled());
    }

    #[test]
    fn pitch_stays_short_of_the_poles() {
        let mut controls = OrbitControls::default();
        controls.rotate(Vec2::new(0.0, 10_000.0));
        settle(&mut controls);
        assert!(controls.pitch <= PITCH_LIMIT);
        assert!(controls.position().is_finite());
    }

    #[test]
    fn zoom_respects_distance_limits() {
        let mut controls = OrbitControls::default();
        for _ in 0..200 {
            controls.zoom(5.0);
            controls.update();
        }
        assert_relative_eq!(controls.distance, controls.settings.min_distance);
        for _ in 0..200 {
            controls.zoom(-5.0);
            controls.update();
        }
        assert_relative_eq!(controls.distance, controls.settings.max_distance);
    }

    #[test]
    fn scroll_zoom_magnifies_orthographic_views() {
        let mut camera = ViewCamera::default();
        let mut controls = OrbitControls::default();
        let mut session = EditorSession::default();
        apply_view_preset(&mut session, &mut camera, &mut controls, ViewPreset::Front);

        let screen_gap = |camera: &ViewCamera| {
            let vp = camera.view_projection();
            let a = vp.project_point3(Vec3::new(-1.0, 0.0, 0.0));
            let b = vp.project_point3(Vec3::new(1.0, 0.0, 0.0));
            (b - a).truncate().length()
        };
        let before = screen_gap(&camera);

        controls.zoom(3.0);
        drive_camera(&mut controls, &mut camera);
        let zoomed_in = screen_gap(&camera);
        assert!(zoomed_in > before * 1.2, "{zoomed_in} vs {before}");
        assert_relative_eq!(camera.zoom, 10.0 / 7.0, epsilon = 1e-4);

        controls.zoom(-3.0);
        drive_camera(&mut controls, &mut camera);
        assert!(screen_gap(&camera) < zoomed_in);
    }

    #[test]
    fn preset_drops_accumulated_zoom() {
        let mut camera = ViewCamera::default();
        let mut controls = OrbitControls::default();
        let mut session = EditorSession::default();
        apply_view_preset(&mut session, &mut camera, &mut controls, ViewPreset::Top);
        controls.zoom(4.0);
        drive_camera(&mut controls, &mut camera);
        assert!(camera.zoom > 1.0);

        apply_view_preset(&mut session, &mut camera, &mut controls, ViewPreset::Side);
        assert_relative_eq!(camera.zoom, 1.0);
        assert_relative_eq!(controls.ortho_zoom(), 1.0);
    }

    #[test]
    fn grab_locks_on_drag_and_restores_on_release() {
        let mut grab = CursorGrab::default();
        assert_eq!(grab.step(false, Some(Vec2::new(40.0, 30.0))), GrabChange::Unchanged);
        assert_eq!(grab.step(true, None), GrabChange::Unchanged);
        assert_eq!(grab, CursorGrab::default());

        assert_eq!(grab.step(true, Some(Vec2::new(40.0, 30.0))), GrabChange::Lock);
        assert_eq!(grab.step(true, Some(Vec2::new(90.0, 10.0))), GrabChange::Unchanged);
        assert_eq!(grab.step(true, None), GrabChange::Unchanged);
        assert_ne!(grab, CursorGrab::default());

        assert_eq!(
            grab.step(false, None),
            GrabChange::Release {
                restore: Vec2::new(40.0, 30.0)
            }
        );
        assert_eq!(grab, CursorGrab::default());
    }

    #[test]
    fn only_camera_buttons_start_a_drag() {
        let mut buttons = ButtonInput::<MouseButton>::default();
        buttons.press(MouseButton::Left);
        assert!(!camera_drag_pressed(&buttons));
        buttons.press(MouseButton::Middle);
        assert!(camera_drag_pressed(&buttons));
    }

    #[test]
    fn pan_moves_target_and_camera_together() {
        let mut controls = OrbitControls::default();
        let offset_before = controls.position() - controls.target;
        controls.pan(Vec2::new(50.0, 0.0));
        settle(&mut controls);
        assert!(controls.target.length() > 0.1);
        let offset_after = controls.position() - controls.target;
        assert_relative_eq!(offset_before.x, offset_after.x, epsilon = 1e-3);
        assert_relative_eq!(offset_before.z, offset_after.z, epsilon = 1e-3);
    }

    #[test]
    fn preset_reseats_camera_and_controls() {
        let mut session = EditorSession::default();
        let mut camera = ViewCamera::default();
        let mut controls = OrbitControls::default();
        controls.rotate(Vec2::new(30.0, 30.0));

        apply_view_preset(&mut session, &mut camera, &mut controls, ViewPreset::Front);
        assert_eq!(session.viewport().view, ViewPreset::Front);
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 10.0));
        assert!(controls.is_settled());
        let position = controls.position();
        assert_relative_eq!(position.z, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn viewport_ndc_conversion() {
        let rect = ViewportRect {
            min: Vec2::new(200.0, 0.0),
            size: Vec2::new(800.0, 600.0),
        };
        assert_eq!(rect.to_ndc(Vec2::new(600.0, 300.0)), Some(Vec2::ZERO));
        assert_eq!(rect.to_ndc(Vec2::new(200.0, 0.0)), Some(Vec2::new(-1.0, 1.0)));
        assert_eq!(rect.to_ndc(Vec2::new(1000.0, 600.0)), Some(Vec2::new(1.0, -1.0)));
        assert_eq!(rect.to_ndc(Vec2::new(100.0, 300.0)), None);
        assert_relative_eq!(rect.aspect_ratio(), 800.0 / 600.0);
    }

    #[test]
    fn bad_orbit_settings_fall_back() {
        let settings = OrbitSettings {
            damping_factor: 0.0,
            min_distance: 10.0,
            max_distance: 1.0,
            ..Default::default()
        }
        .sanitized();
        assert_relative_eq!(settings.damping_factor, 0.05);
        assert_relative_eq!(settings.max_distance, 10.0);
    }
}
