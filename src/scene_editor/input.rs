use crate::scene_editor::controls::{PanelFocus, ViewportRect};
use crate::scene_editor::interaction::{EditorKey, EditorSession, PointerOutcome};
use crate::scene_editor::viewport::ViewCamera;
use bevy::prelude::*;
use bevy::window::{PrimaryWindow, Window};
use tracing::debug;

/// Pointer adapter: cursor in the 3D viewport becomes NDC for the session.
pub fn pointer_input_system(
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    rect: Res<ViewportRect>,
    focus: Res<PanelFocus>,
    view_camera: Res<ViewCamera>,
    mut session: ResMut<EditorSession>,
) {
    if mouse_buttons.just_released(MouseButton::Left) {
        session.pointer_up();
    }

    let Ok(window) = windows.single() else {
        return;
    };
    let Some(ndc) = window.cursor_position().and_then(|cursor| rect.to_ndc(cursor)) else {
        return;
    };
    if focus.pointer_over_panel {
        return;
    }

    if session.interaction.pointer_ndc != ndc {
        session.pointer_move(ndc);
    }
    if mouse_buttons.just_pressed(MouseButton::Left) {
        match session.pointer_down(ndc, &view_camera) {
            PointerOutcome::Ignored => {}
            outcome => debug!("pointer down at ({:.3}, {:.3}): {outcome:?}", ndc.x, ndc.y),
        }
    }
}

pub fn keyboard_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    focus: Res<PanelFocus>,
    mut session: ResMut<EditorSession>,
) {
    if focus.typing {
        return;
    }
    for key in keys.get_just_pressed() {
        if let Some(editor_key) = editor_key(*key) {
            session.key_down(editor_key);
        }
    }
}

pub fn editor_key(key: KeyCode) -> Option<EditorKey> {
    match key {
        KeyCode::Delete => Some(EditorKey::Delete),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_editor::config::EditorConfig;
    use crate::scene_editor::interaction::ToolMode;
    use bevy::ecs::system::RunSystemOnce;

    #[test]
    fn only_the_delete_key_is_bound() {
        assert_eq!(editor_key(KeyCode::Delete), Some(EditorKey::Delete));
        assert_eq!(editor_key(KeyCode::Backspace), None);
        assert_eq!(editor_key(KeyCode::KeyD), None);
    }

    fn keyboard_app(typing: bool) -> App {
        let mut app = App::new();
        let mut session = EditorSession::new(&EditorConfig::default());
        session.set_mode(ToolMode::Select);
        let seeded = session.registry().iter().next().map(|obj| obj.id());
        if let Some(id) = seeded {
            session.select(id);
        }
        let mut keys = ButtonInput::<KeyCode>::default();
        keys.press(KeyCode::Delete);
        app.insert_resource(session)
            .insert_resource(keys)
            .insert_resource(PanelFocus {
                typing,
                ..default()
            });
        app
    }

    #[test]
    fn delete_key_removes_the_selection() {
        let mut app = keyboard_app(false);
        app.world_mut().run_system_once(keyboard_input_system).unwrap();
        let session = app.world().resource::<EditorSession>();
        assert!(session.registry().is_empty());
        assert_eq!(session.selected_id(), None);
    }

    #[test]
    fn delete_key_is_ignored_while_typing_in_the_panel() {
        let mut app = keyboard_app(true);
        app.world_mut().run_system_once(keyboard_input_system).unwrap();
        let session = app.world().resource::<EditorSession>();
        assert_eq!(session.registry().len(), 1);
        assert!(session.selected_id().is_some());
    }
}
