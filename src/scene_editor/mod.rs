pub mod animation;
pub mod config;
pub mod controls;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod input;
pub mod interaction;
pub mod material;
pub mod picking;
pub mod registry;
pub mod scene_view;
pub mod ui;
pub mod viewport;

pub const EDITOR_CONFIG_PATH: &str = "config/primforge.ron";
pub const GRID_EXTENT_CELLS: i32 = 20;
pub const GRID_PLANE_HEIGHT: f32 = -1.0;
pub const CAMERA_FOV_DEG: f32 = 75.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;
pub const ORTHO_FRUSTUM_SIZE: f32 = 10.0;
pub const PRESET_DISTANCE: f32 = 10.0;
pub const MAX_LIGHT_INTENSITY: f32 = 4.0;
