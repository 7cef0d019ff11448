use crate::scene_editor::interaction::EditorSession;
use crate::scene_editor::registry::SceneRegistry;
use bevy::prelude::*;

/// Radians added to x and y of every unselected object each frame.
pub const IDLE_SPIN_STEP: f32 = 0.01;
pub const POINT_LIGHT_SWING: f32 = 5.0;

/// The two auxiliary point lights; each swings along x on its own phase.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatedPointLight {
    Warm,
    Cool,
}

impl AnimatedPointLight {
    pub const ALL: [AnimatedPointLight; 2] = [AnimatedPointLight::Warm, AnimatedPointLight::Cool];

    pub fn color(self) -> Color {
        match self {
            Self::Warm => Color::srgb_u8(0xff, 0x6b, 0x6b),
            Self::Cool => Color::srgb_u8(0x4e, 0xcd, 0xc4),
        }
    }

    pub fn home_position(self) -> Vec3 {
        match self {
            Self::Warm => Vec3::new(-5.0, 5.0, 5.0),
            Self::Cool => Vec3::new(5.0, -5.0, -5.0),
        }
    }

    pub fn swing_x(self, elapsed_secs: f32) -> f32 {
        match self {
            Self::Warm => elapsed_secs.sin() * POINT_LIGHT_SWING,
            Self::Cool => elapsed_secs.cos() * POINT_LIGHT_SWING,
        }
    }
}

pub fn advance_idle_spin(registry: &mut SceneRegistry) {
    for obj in registry.iter_mut().filter(|obj| !obj.is_selected()) {
        obj.transform.rotation.x += IDLE_SPIN_STEP;
        obj.transform.rotation.y += IDLE_SPIN_STEP;
    }
}

pub fn legacy_animation_system(
    time: Res<Time>,
    mut session: ResMut<EditorSession>,
    mut lights: Query<(&AnimatedPointLight, &mut Transform)>,
) {
    if !session.viewport().legacy_animation {
        for (light, mut transform) in &mut lights {
            let home = light.home_position();
            if transform.translation != home {
                transform.translation = home;
            }
        }
        return;
    }

    session.spin_idle_objects();

    let elapsed = time.elapsed_secs();
    for (light, mut transform) in &mut lights {
        transform.translation.x = light.swing_x(elapsed);
    }
}
