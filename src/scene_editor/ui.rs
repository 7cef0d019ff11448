use crate::scene_editor::config::{ConfigPath, EditorConfig, save_editor_config};
use crate::scene_editor::controls::{OrbitControls, PanelFocus, apply_view_preset};
use crate::scene_editor::geometry::PrimitiveKind;
use crate::scene_editor::interaction::{EditorSession, ToolMode};
use crate::scene_editor::material::RenderMode;
use crate::scene_editor::registry::{ObjectId, SceneObject, SceneRegistry};
use crate::scene_editor::viewport::{ViewCamera, ViewPreset};
use crate::scene_editor::MAX_LIGHT_INTENSITY;
use bevy::prelude::{Local, Res, ResMut};
use bevy_egui::{EguiContexts, egui};

pub struct ObjectListEntry {
    pub id: ObjectId,
    pub label: String,
    pub selected: bool,
}

/// "`<kind> #<n>`" with `n` counting from 1 in creation order.
pub fn object_list(registry: &SceneRegistry) -> Vec<ObjectListEntry> {
    registry
        .iter()
        .enumerate()
        .map(|(index, obj)| ObjectListEntry {
            id: obj.id(),
            label: format!("{} #{}", obj.kind().name(), index + 1),
            selected: obj.is_selected(),
        })
        .collect()
}

pub fn properties_text(obj: &SceneObject) -> [String; 3] {
    let t = obj.transform.translation;
    let r = obj.transform.rotation;
    [
        format!("Type: {}", obj.kind().label()),
        format!("Position: ({:.2}, {:.2}, {:.2})", t.x, t.y, t.z),
        format!("Rotation: ({:.2}, {:.2}, {:.2})", r.x, r.y, r.z),
    ]
}

/// Current session settings in the shape of the config file.
pub fn settings_snapshot(
    base: &EditorConfig,
    session: &EditorSession,
    controls: &OrbitControls,
) -> EditorConfig {
    EditorConfig {
        viewport: *session.viewport(),
        initial_tool: session.interaction.mode,
        initial_primitive: session.interaction.primitive,
        orbit: controls.settings,
        ..base.clone()
    }
}

#[allow(clippy::too_many_arguments)]
pub fn ui_system(
    mut contexts: EguiContexts,
    mut session: ResMut<EditorSession>,
    mut view_camera: ResMut<ViewCamera>,
    mut controls: ResMut<OrbitControls>,
    mut focus: ResMut<PanelFocus>,
    base_config: Res<EditorConfig>,
    config_path: Res<ConfigPath>,
    mut status: Local<String>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    egui::TopBottomPanel::top("primforge_top_bar").show(ctx, |ui| {
        ui.horizontal_wrapped(|ui| {
            ui.heading("primforge");
            ui.separator();
            ui.label(format!("Objects: {}", session.registry().len()));
            if !status.is_empty() {
                ui.separator();
                ui.label(status.as_str());
            }
            ui.separator();
            ui.small("LMB: tool, RMB rotate, MMB pan, wheel zoom, Delete removes selection.");
        });
    });

    let side_panel_response = egui::SidePanel::left("primforge_controls")
        .resizable(true)
        .default_width(300.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Tools");
                let mut mode = session.interaction.mode;
                ui.horizontal_wrapped(|ui| {
                    for candidate in ToolMode::ALL {
                        ui.selectable_value(&mut mode, candidate, candidate.label());
                    }
                });
                session.set_mode(mode);

                ui.heading("Primitives");
                let mut primitive = session.interaction.primitive;
                ui.horizontal_wrapped(|ui| {
                    for candidate in PrimitiveKind::ALL {
                        ui.selectable_value(&mut primitive, candidate, candidate.label());
                    }
                });
                if primitive != session.interaction.primitive {
                    session.set_primitive(primitive);
                }

                ui.separator();
                ui.heading("Viewport");
                let mut render_mode = session.viewport().render_mode;
                egui::ComboBox::from_label("Render mode")
                    .selected_text(render_mode.label())
                    .show_ui(ui, |ui| {
                        for candidate in RenderMode::ALL {
                            ui.selectable_value(&mut render_mode, candidate, candidate.label());
                        }
                    });
                session.set_render_mode(render_mode);

                ui.horizontal_wrapped(|ui| {
                    ui.label("View:");
                    let mut current = session.viewport().view;
                    for view in ViewPreset::ALL {
                        if ui.selectable_value(&mut current, view, view.label()).clicked() {
                            apply_view_preset(&mut session, &mut view_camera, &mut controls, view);
                        }
                    }
                });

                ui.separator();
                ui.heading("Lighting");
                let mut lighting = session.viewport().lighting;
                ui.add(
                    egui::Slider::new(&mut lighting.ambient_intensity, 0.0..=MAX_LIGHT_INTENSITY)
                        .text("Ambient"),
                );
                ui.add(
                    egui::Slider::new(
                        &mut lighting.directional_intensity,
                        0.0..=MAX_LIGHT_INTENSITY,
                    )
                    .text("Directional"),
                );
                ui.horizontal(|ui| {
                    ui.label("Direction");
                    for axis in &mut lighting.direction {
                        ui.add(egui::DragValue::new(axis).speed(0.1));
                    }
                });
                ui.checkbox(&mut lighting.shadows, "Shadows");
                session.set_lighting(lighting);

                ui.separator();
                ui.heading("Grid");
                let mut grid = session.viewport().grid;
                ui.horizontal(|ui| {
                    ui.checkbox(&mut grid.visible, "Show grid");
                    ui.checkbox(&mut grid.snap, "Snap to grid");
                });
                ui.horizontal(|ui| {
                    ui.label("Cell size");
                    ui.add(egui::DragValue::new(&mut grid.cell_size).speed(0.05));
                });
                session.set_grid_visible(grid.visible);
                session.set_snap_to_grid(grid.snap);
                if grid.cell_size != session.viewport().grid.cell_size {
                    if let Err(err) = session.set_grid_cell_size(grid.cell_size) {
                        *status = err.to_string();
                    }
                }

                let mut legacy = session.viewport().legacy_animation;
                ui.checkbox(&mut legacy, "Idle animation");
                session.set_legacy_animation(legacy);

                ui.separator();
                ui.heading("Objects");
                let mut clicked = None;
                if session.registry().is_empty() {
                    ui.weak("No objects. Click in the viewport with Create.");
                }
                egui::ScrollArea::vertical()
                    .id_salt("primforge_object_list")
                    .max_height(200.0)
                    .show(ui, |ui| {
                        let mut highlighted = session.selected_id();
                        for entry in object_list(session.registry()) {
                            if ui
                                .selectable_value(&mut highlighted, Some(entry.id), entry.label)
                                .clicked()
                            {
                                clicked = Some(entry.id);
                            }
                        }
                    });
                if let Some(id) = clicked {
                    session.select(id);
                }

                if let Some(obj) = session
                    .selected_id()
                    .and_then(|id| session.registry().get(id))
                {
                    ui.separator();
                    ui.heading("Properties");
                    for line in properties_text(obj) {
                        ui.label(line);
                    }
                }
                if session.selected_id().is_some() && ui.button("Delete selected").clicked() {
                    session.delete_selected();
                }

                ui.separator();
                if ui.button("Save settings").clicked() {
                    let snapshot = settings_snapshot(&base_config, &session, &controls);
                    *status = match save_editor_config(&config_path.0, &snapshot) {
                        Ok(()) => format!("Settings saved to {}", config_path.0.display()),
                        Err(err) => format!("Save failed: {err}"),
                    };
                }
            });
        });

    *focus = PanelFocus {
        pointer_over_panel: ctx.wants_pointer_input() || ctx.is_pointer_over_area(),
        typing: ctx.wants_keyboard_input(),
        panel_width: side_panel_response.response.rect.width(),
    };
}
