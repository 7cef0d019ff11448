use crate::scene_editor::animation::legacy_animation_system;
use crate::scene_editor::config::{ConfigPath, EditorConfig, load_startup_config};
use crate::scene_editor::controls::{
    CursorGrab, OrbitControls, PanelFocus, ViewportRect, orbit_camera_system, sync_cursor_grab,
    update_camera_viewport,
};
use crate::scene_editor::error::EditorResult;
use crate::scene_editor::geometry::PrimitiveKind;
use crate::scene_editor::input::{keyboard_input_system, pointer_input_system};
use crate::scene_editor::interaction::EditorSession;
use crate::scene_editor::scene_view::{
    SceneHandles, apply_lighting, draw_grid_system, release_scene_on_exit, setup_editor_scene,
    sync_editor_camera, sync_scene_objects,
};
use crate::scene_editor::ui::ui_system;
use crate::scene_editor::viewport::ViewCamera;
use bevy::prelude::*;
use bevy::window::{PresentMode, Window, WindowPlugin};
use bevy_egui::{EguiPlugin, EguiPrimaryContextPass};
use std::path::PathBuf;
use tracing::info;

/// Camera and controls seated at the configured starting view.
pub fn initial_camera(config: &EditorConfig) -> (ViewCamera, OrbitControls) {
    let mut camera = ViewCamera::default();
    camera.apply_preset(config.viewport.view);
    let controls = OrbitControls::new(config.orbit, camera.position, camera.target);
    (camera, controls)
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaunchOptions {
    pub config_path: PathBuf,
    /// An explicitly named settings file must exist and parse.
    pub config_required: bool,
    pub primitive: Option<PrimitiveKind>,
}

/// Loads the settings file and applies command line overrides.
pub fn launch_config(options: &LaunchOptions) -> EditorResult<EditorConfig> {
    let mut config = load_startup_config(&options.config_path, options.config_required)?;
    if let Some(kind) = options.primitive {
        config.initial_primitive = kind;
    }
    Ok(config)
}

/// Builds and runs the editor. Settings are loaded after the default plugins
/// so load warnings go through the installed log subscriber.
pub fn run(options: LaunchOptions) -> EditorResult<()> {
    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "primforge".to_string(),
            resolution: (1400, 900).into(),
            present_mode: PresentMode::AutoVsync,
            ..Default::default()
        }),
        ..Default::default()
    }))
    .add_plugins(EguiPlugin::default());

    let config = launch_config(&options)?;
    let (view_camera, controls) = initial_camera(&config);
    let session = EditorSession::new(&config);
    info!(
        "starting editor: view {}, render mode {}, {} seeded objects",
        config.viewport.view.label(),
        config.viewport.render_mode.label(),
        session.registry().len()
    );

    app.insert_resource(session)
        .insert_resource(config)
        .insert_resource(ConfigPath(options.config_path))
        .insert_resource(view_camera)
        .insert_resource(controls)
        .insert_resource(PanelFocus::default())
        .insert_resource(CursorGrab::default())
        .insert_resource(ViewportRect::default())
        .insert_resource(SceneHandles::default())
        .insert_resource(ClearColor(Color::srgb(0.10, 0.10, 0.12)))
        .insert_resource(GlobalAmbientLight {
            color: Color::WHITE,
            brightness: 150.0,
            affects_lightmapped_meshes: true,
        })
        .add_systems(Startup, setup_editor_scene)
        .add_systems(
            Update,
            (
                update_camera_viewport,
                orbit_camera_system,
                sync_cursor_grab,
                pointer_input_system,
                keyboard_input_system,
                legacy_animation_system,
                sync_scene_objects,
                sync_editor_camera,
                apply_lighting,
                draw_grid_system,
            )
                .chain(),
        )
        .add_systems(EguiPrimaryContextPass, ui_system)
        .add_systems(Last, release_scene_on_exit);

    app.run();
    Ok(())
}
