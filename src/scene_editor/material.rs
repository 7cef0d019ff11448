use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub const BASE_COLOR: Color = Color::srgb(0.0, 1.0, 0.533);
pub const ACCENT_COLOR: Color = Color::srgb(1.0, 0.42, 0.42);
pub const NEUTRAL_COLOR: Color = Color::srgb(0.847, 0.831, 0.8);
pub const INK_COLOR: Color = Color::srgb(0.102, 0.102, 0.102);
pub const OUTLINE_COLOR: Color = Color::WHITE;

pub const SURFACE_OPACITY: f32 = 0.8;
pub const OUTLINE_OPACITY: f32 = 0.3;
pub const PEN_OUTLINE_OPACITY: f32 = 0.7;
pub const INK_SURFACE_OPACITY: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    Solid,
    Wireframe,
    #[default]
    Both,
    Artistic,
    Pen,
    Ink,
}

impl RenderMode {
    pub const ALL: [RenderMode; 6] = [
        RenderMode::Solid,
        RenderMode::Wireframe,
        RenderMode::Both,
        RenderMode::Artistic,
        RenderMode::Pen,
        RenderMode::Ink,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Solid => "Solid",
            Self::Wireframe => "Wireframe",
            Self::Both => "Solid + Wireframe",
            Self::Artistic => "Artistic",
            Self::Pen => "Pen",
            Self::Ink => "Ink",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceTreatment {
    pub visible: bool,
    pub color: Color,
    pub opacity: f32,
    pub flat_shaded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlineTreatment {
    pub visible: bool,
    pub color: Color,
    pub opacity: f32,
}

/// The two treatments applied to one scene object, always derived from
/// `materials_for` and never edited in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualPair {
    pub surface: SurfaceTreatment,
    pub outline: OutlineTreatment,
}

pub fn materials_for(mode: RenderMode, selected: bool) -> VisualPair {
    let tinted = if selected { ACCENT_COLOR } else { BASE_COLOR };
    let hidden_surface = SurfaceTreatment {
        visible: false,
        color: tinted,
        opacity: SURFACE_OPACITY,
        flat_shaded: false,
    };
    let twin = OutlineTreatment {
        visible: false,
        color: OUTLINE_COLOR,
        opacity: OUTLINE_OPACITY,
    };

    match mode {
        RenderMode::Solid => VisualPair {
            surface: SurfaceTreatment {
                visible: true,
                ..hidden_surface
            },
            outline: twin,
        },
        RenderMode::Wireframe => VisualPair {
            surface: hidden_surface,
            outline: OutlineTreatment {
                visible: true,
                color: if selected { ACCENT_COLOR } else { OUTLINE_COLOR },
                opacity: 1.0,
            },
        },
        RenderMode::Both => VisualPair {
            surface: SurfaceTreatment {
                visible: true,
                ..hidden_surface
            },
            outline: OutlineTreatment {
                visible: selected,
                ..twin
            },
        },
        RenderMode::Artistic => VisualPair {
            surface: SurfaceTreatment {
                visible: true,
                color: NEUTRAL_COLOR,
                opacity: 1.0,
                flat_shaded: true,
            },
            outline: twin,
        },
        RenderMode::Pen => VisualPair {
            surface: SurfaceTreatment {
                visible: false,
                color: NEUTRAL_COLOR,
                opacity: 1.0,
                flat_shaded: false,
            },
            outline: OutlineTreatment {
                visible: true,
                color: INK_COLOR,
                opacity: PEN_OUTLINE_OPACITY,
            },
        },
        RenderMode::Ink => VisualPair {
            surface: SurfaceTreatment {
                visible: true,
                color: INK_COLOR,
                opacity: INK_SURFACE_OPACITY,
                flat_shaded: false,
            },
            outline: twin,
        },
    }
}

impl SurfaceTreatment {
    pub fn to_material(&self) -> StandardMaterial {
        StandardMaterial {
            base_color: self.color.with_alpha(self.opacity),
            alpha_mode: alpha_mode_for(self.opacity),
            perceptual_roughness: if self.flat_shaded { 0.95 } else { 0.35 },
            reflectance: if self.flat_shaded { 0.1 } else { 0.5 },
            ..default()
        }
    }
}

impl OutlineTreatment {
    pub fn to_material(&self) -> StandardMaterial {
        StandardMaterial {
            base_color: self.color.with_alpha(self.opacity),
            alpha_mode: alpha_mode_for(self.opacity),
            unlit: true,
            ..default()
        }
    }
}

fn alpha_mode_for(opacity: f32) -> AlphaMode {
    if opacity < 1.0 {
        AlphaMode::Blend
    } else {
        AlphaMode::Opaque
    }
}
