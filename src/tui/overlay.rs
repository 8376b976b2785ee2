//! Overlays drawn on top of the configurator
//!
//! An open overlay captures every key. `handle_key` only edits the overlay's
//! own state and reports what the app should do next; network calls and
//! state outside the overlay belong to the app.

use super::form::{AuthForm, FormKind, FormOutcome};
use crate::catalog::{Component, Notification, Offer};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Where a build in the picker came from
#[derive(Debug, Clone, PartialEq)]
pub enum BuildSource {
    /// Curated build for a use case
    Curated,
    /// One of the user's saved builds
    Saved { id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildEntry {
    pub label: String,
    pub source: BuildSource,
    pub components: Vec<Component>,
}

#[derive(Debug, Clone)]
pub enum Overlay {
    Help,
    Auth(AuthForm),
    Details(Component),
    Offers {
        component: Component,
        /// `None` while loading
        offers: Option<Vec<Offer>>,
        error: Option<String>,
        selected: usize,
    },
    Notifications {
        items: Option<Vec<Notification>>,
        error: Option<String>,
        selected: usize,
    },
    SaveBuild {
        name: String,
        /// Saved build being edited; `None` saves a new one
        update: Option<String>,
        error: Option<String>,
        saving: bool,
    },
    Builds {
        entries: Vec<BuildEntry>,
        loading: bool,
        selected: usize,
    },
}

/// What the app should do after a key press in an overlay
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayAction {
    None,
    Close,
    SubmitAuth,
    SwitchAuth,
    OpenOffers(Component),
    ToggleAlert(String),
    MarkRead(String),
    SaveBuild { name: String, update: Option<String> },
    LoadBuild(usize),
    DeleteBuild(usize),
}

impl Overlay {
    pub fn offers(component: Component) -> Self {
        Overlay::Offers {
            component,
            offers: None,
            error: None,
            selected: 0,
        }
    }

    pub fn notifications() -> Self {
        Overlay::Notifications {
            items: None,
            error: None,
            selected: 0,
        }
    }

    pub fn save_build(name: impl Into<String>, update: Option<String>) -> Self {
        Overlay::SaveBuild {
            name: name.into(),
            update,
            error: None,
            saving: false,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Overlay::Help => " Keys ",
            Overlay::Auth(form) => match form.kind {
                FormKind::Login => " Log in ",
                FormKind::Register => " Create account ",
            },
            Overlay::Details(_) => " Component ",
            Overlay::Offers { .. } => " Offers ",
            Overlay::Notifications { .. } => " Notifications ",
            Overlay::SaveBuild { .. } => " Save build ",
            Overlay::Builds { .. } => " Builds ",
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> OverlayAction {
        let close = matches!(key.code, KeyCode::Esc | KeyCode::Char('q'));

        match self {
            Overlay::Help => {
                if close || key.code == KeyCode::Char('?') {
                    return OverlayAction::Close;
                }
                OverlayAction::None
            }

            Overlay::Auth(form) => match form.handle_key(key) {
                FormOutcome::None => OverlayAction::None,
                FormOutcome::Submit => OverlayAction::SubmitAuth,
                FormOutcome::Cancel => OverlayAction::Close,
                FormOutcome::Switch => OverlayAction::SwitchAuth,
            },

            Overlay::Details(component) => match key.code {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => OverlayAction::Close,
                KeyCode::Char('o') => OverlayAction::OpenOffers(component.clone()),
                KeyCode::Char('a') => OverlayAction::ToggleAlert(component.id.clone()),
                _ => OverlayAction::None,
            },

            Overlay::Offers {
                offers, selected, ..
            } => {
                if close {
                    return OverlayAction::Close;
                }
                let len = offers.as_ref().map_or(0, Vec::len);
                move_selection(selected, len, key.code);
                OverlayAction::None
            }

            Overlay::Notifications {
                items, selected, ..
            } => {
                if close {
                    return OverlayAction::Close;
                }
                let list = items.as_deref().unwrap_or_default();
                match key.code {
                    KeyCode::Enter | KeyCode::Char('r') => list
                        .get(*selected)
                        .filter(|n| !n.is_read)
                        .map(|n| OverlayAction::MarkRead(n.id.clone()))
                        .unwrap_or(OverlayAction::None),
                    code => {
                        move_selection(selected, list.len(), code);
                        OverlayAction::None
                    }
                }
            }

            Overlay::SaveBuild {
                name,
                update,
                error,
                saving,
            } => {
                if key.code == KeyCode::Esc {
                    return OverlayAction::Close;
                }
                if *saving {
                    return OverlayAction::None;
                }
                let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
                match key.code {
                    KeyCode::Char('n') if ctrl => *update = None,
                    KeyCode::Enter => {
                        if name.trim().is_empty() {
                            *error = Some("Give the build a name.".to_string());
                        } else {
                            *error = None;
                            *saving = true;
                            return OverlayAction::SaveBuild {
                                name: name.trim().to_string(),
                                update: update.clone(),
                            };
                        }
                    }
                    KeyCode::Backspace => {
                        name.pop();
                    }
                    KeyCode::Char(c) if !ctrl => name.push(c),
                    _ => {}
                }
                OverlayAction::None
            }

            Overlay::Builds {
                entries, selected, ..
            } => {
                if close {
                    return OverlayAction::Close;
                }
                match key.code {
                    KeyCode::Enter if *selected < entries.len() => {
                        OverlayAction::LoadBuild(*selected)
                    }
                    KeyCode::Char('d') => match entries.get(*selected) {
                        Some(BuildEntry {
                            source: BuildSource::Saved { .. },
                            ..
                        }) => OverlayAction::DeleteBuild(*selected),
                        _ => OverlayAction::None,
                    },
                    code => {
                        move_selection(selected, entries.len(), code);
                        OverlayAction::None
                    }
                }
            }
        }
    }
}

/// Up/Down/Home/End over a list of `len` items
fn move_selection(selected: &mut usize, len: usize, code: KeyCode) {
    if len == 0 {
        *selected = 0;
        return;
    }
    match code {
        KeyCode::Up | KeyCode::Char('k') => *selected = selected.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => *selected = (*selected + 1).min(len - 1),
        KeyCode::Home | KeyCode::Char('g') => *selected = 0,
        KeyCode::End | KeyCode::Char('G') => *selected = len - 1,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;
    use chrono::Utc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn comp(id: &str) -> Component {
        Component {
            id: id.into(),
            name: format!("Part {id}"),
            category: Category::Cpu,
            brand: "AMD".into(),
            specs: Default::default(),
        }
    }

    fn notification(id: &str, is_read: bool) -> Notification {
        Notification {
            id: id.into(),
            component_id: "cpu-1".into(),
            shop_id: "dns".into(),
            old_price: 100.0,
            new_price: 90.0,
            is_read,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn help_closes_on_question_mark() {
        assert_eq!(
            Overlay::Help.handle_key(key(KeyCode::Char('?'))),
            OverlayAction::Close
        );
        assert_eq!(
            Overlay::Help.handle_key(key(KeyCode::Char('x'))),
            OverlayAction::None
        );
    }

    #[test]
    fn auth_form_typing_q_does_not_close() {
        let mut overlay = Overlay::Auth(AuthForm::login());
        assert_eq!(overlay.handle_key(key(KeyCode::Char('q'))), OverlayAction::None);
        match &overlay {
            Overlay::Auth(form) => assert_eq!(form.email, "q"),
            other => panic!("unexpected overlay: {other:?}"),
        }
        assert_eq!(overlay.handle_key(key(KeyCode::Esc)), OverlayAction::Close);
    }

    #[test]
    fn details_forwards_offers_and_alert() {
        let mut overlay = Overlay::Details(comp("cpu-1"));
        assert_eq!(
            overlay.handle_key(key(KeyCode::Char('o'))),
            OverlayAction::OpenOffers(comp("cpu-1"))
        );
        assert_eq!(
            overlay.handle_key(key(KeyCode::Char('a'))),
            OverlayAction::ToggleAlert("cpu-1".into())
        );
    }

    #[test]
    fn notifications_mark_only_unread() {
        let mut overlay = Overlay::Notifications {
            items: Some(vec![notification("n1", true), notification("n2", false)]),
            error: None,
            selected: 0,
        };
        assert_eq!(overlay.handle_key(key(KeyCode::Enter)), OverlayAction::None);
        overlay.handle_key(key(KeyCode::Down));
        assert_eq!(
            overlay.handle_key(key(KeyCode::Enter)),
            OverlayAction::MarkRead("n2".into())
        );
        // Clamped at the end
        overlay.handle_key(key(KeyCode::Down));
        match overlay {
            Overlay::Notifications { selected, .. } => assert_eq!(selected, 1),
            other => panic!("unexpected overlay: {other:?}"),
        }
    }

    #[test]
    fn save_build_requires_name() {
        let mut overlay = Overlay::save_build("", None);
        assert_eq!(overlay.handle_key(key(KeyCode::Enter)), OverlayAction::None);
        match &overlay {
            Overlay::SaveBuild { error, saving, .. } => {
                assert!(error.is_some());
                assert!(!saving);
            }
            other => panic!("unexpected overlay: {other:?}"),
        }

        for c in "Box ".chars() {
            overlay.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(
            overlay.handle_key(key(KeyCode::Enter)),
            OverlayAction::SaveBuild {
                name: "Box".into(),
                update: None
            }
        );
    }

    #[test]
    fn save_build_ctrl_n_saves_as_new() {
        let mut overlay = Overlay::save_build("Rig", Some("7".into()));
        overlay.handle_key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL));
        assert_eq!(
            overlay.handle_key(key(KeyCode::Enter)),
            OverlayAction::SaveBuild {
                name: "Rig".into(),
                update: None
            }
        );
    }

    #[test]
    fn builds_delete_only_saved() {
        let mut overlay = Overlay::Builds {
            entries: vec![
                BuildEntry {
                    label: "Gaming".into(),
                    source: BuildSource::Curated,
                    components: vec![comp("cpu-1")],
                },
                BuildEntry {
                    label: "Mine".into(),
                    source: BuildSource::Saved { id: "3".into() },
                    components: vec![],
                },
            ],
            loading: false,
            selected: 0,
        };
        assert_eq!(overlay.handle_key(key(KeyCode::Char('d'))), OverlayAction::None);
        assert_eq!(overlay.handle_key(key(KeyCode::Enter)), OverlayAction::LoadBuild(0));
        overlay.handle_key(key(KeyCode::Char('j')));
        assert_eq!(
            overlay.handle_key(key(KeyCode::Char('d'))),
            OverlayAction::DeleteBuild(1)
        );
    }

    #[test]
    fn empty_offers_list_stays_at_zero() {
        let mut overlay = Overlay::offers(comp("cpu-1"));
        overlay.handle_key(key(KeyCode::Down));
        match overlay {
            Overlay::Offers { selected, .. } => assert_eq!(selected, 0),
            other => panic!("unexpected overlay: {other:?}"),
        }
    }
}
