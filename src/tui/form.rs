//! Login and registration form
//!
//! Plain text fields with a focus cursor. Validation runs on submit, before
//! anything is sent.

use crate::api::{validate_email, validate_password, validate_registration};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Password,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Email => "Email",
            Field::Password => "Password",
        }
    }
}

/// What a key press did to the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    None,
    Submit,
    Cancel,
    /// Ctrl-R: switch between login and registration
    Switch,
}

#[derive(Debug, Clone)]
pub struct AuthForm {
    pub kind: FormKind,
    pub name: String,
    pub email: String,
    pub password: String,
    pub focus: Field,
    /// Validation error, backend error, or a prompt explaining why the form opened
    pub message: Option<String>,
    /// A submit is in flight; input is ignored until it resolves
    pub pending: bool,
}

impl AuthForm {
    pub fn login() -> Self {
        Self::new(FormKind::Login)
    }

    pub fn register() -> Self {
        Self::new(FormKind::Register)
    }

    fn new(kind: FormKind) -> Self {
        Self {
            kind,
            name: String::new(),
            email: String::new(),
            password: String::new(),
            focus: Self::fields_for(kind)[0],
            message: None,
            pending: false,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Same form in the other mode, keeping what was typed
    pub fn switched(&self) -> Self {
        let kind = match self.kind {
            FormKind::Login => FormKind::Register,
            FormKind::Register => FormKind::Login,
        };
        Self {
            kind,
            name: self.name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            focus: Self::fields_for(kind)[0],
            message: None,
            pending: false,
        }
    }

    fn fields_for(kind: FormKind) -> &'static [Field] {
        match kind {
            FormKind::Login => &[Field::Email, Field::Password],
            FormKind::Register => &[Field::Name, Field::Email, Field::Password],
        }
    }

    pub fn fields(&self) -> &'static [Field] {
        Self::fields_for(self.kind)
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Password => &self.password,
        }
    }

    fn value_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Password => &mut self.password,
        }
    }

    fn focus_index(&self) -> usize {
        self.fields()
            .iter()
            .position(|f| *f == self.focus)
            .unwrap_or(0)
    }

    pub fn focus_next(&mut self) {
        let fields = self.fields();
        self.focus = fields[(self.focus_index() + 1) % fields.len()];
    }

    pub fn focus_prev(&mut self) {
        let fields = self.fields();
        self.focus = fields[(self.focus_index() + fields.len() - 1) % fields.len()];
    }

    fn is_last_field(&self) -> bool {
        self.focus_index() + 1 == self.fields().len()
    }

    /// Check the fields; the error is shown in the form
    pub fn validate(&self) -> Result<(), String> {
        match self.kind {
            FormKind::Login => {
                validate_email(&self.email)?;
                validate_password(&self.password)
            }
            FormKind::Register => validate_registration(&self.email, &self.password, &self.name),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormOutcome {
        if key.code == KeyCode::Esc {
            return FormOutcome::Cancel;
        }
        if self.pending {
            return FormOutcome::None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('r') {
            return FormOutcome::Switch;
        }

        match key.code {
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_prev(),
            KeyCode::Enter => {
                if !self.is_last_field() {
                    self.focus_next();
                    return FormOutcome::None;
                }
                match self.validate() {
                    Ok(()) => {
                        self.message = None;
                        self.pending = true;
                        return FormOutcome::Submit;
                    }
                    Err(msg) => self.message = Some(msg),
                }
            }
            KeyCode::Backspace => {
                let focus = self.focus;
                self.value_mut(focus).pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                let focus = self.focus;
                self.value_mut(focus).push(c);
            }
            _ => {}
        }
        FormOutcome::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(form: &mut AuthForm, code: KeyCode) -> FormOutcome {
        form.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(form: &mut AuthForm, s: &str) {
        for c in s.chars() {
            press(form, KeyCode::Char(c));
        }
    }

    #[test]
    fn login_fields_and_focus_cycle() {
        let mut form = AuthForm::login();
        assert_eq!(form.focus, Field::Email);
        form.focus_next();
        assert_eq!(form.focus, Field::Password);
        form.focus_next();
        assert_eq!(form.focus, Field::Email);
        form.focus_prev();
        assert_eq!(form.focus, Field::Password);
    }

    #[test]
    fn typing_goes_to_focused_field() {
        let mut form = AuthForm::login();
        type_str(&mut form, "a@b.io");
        press(&mut form, KeyCode::Tab);
        type_str(&mut form, "secret12");
        press(&mut form, KeyCode::Backspace);
        assert_eq!(form.email, "a@b.io");
        assert_eq!(form.password, "secret1");
    }

    #[test]
    fn enter_on_first_field_moves_focus() {
        let mut form = AuthForm::login();
        assert_eq!(press(&mut form, KeyCode::Enter), FormOutcome::None);
        assert_eq!(form.focus, Field::Password);
    }

    #[test]
    fn invalid_submit_shows_message() {
        let mut form = AuthForm::login();
        type_str(&mut form, "not-an-email");
        press(&mut form, KeyCode::Tab);
        type_str(&mut form, "secret123");
        assert_eq!(press(&mut form, KeyCode::Enter), FormOutcome::None);
        assert!(form.message.as_deref().unwrap().contains("email"));
        assert!(!form.pending);
    }

    #[test]
    fn short_password_is_rejected() {
        let mut form = AuthForm::login();
        form.email = "user@example.com".into();
        form.password = "short".into();
        assert!(form.validate().is_err());
    }

    #[test]
    fn valid_submit_marks_pending_and_locks_input() {
        let mut form = AuthForm::login();
        type_str(&mut form, "user@example.com");
        press(&mut form, KeyCode::Tab);
        type_str(&mut form, "secret123");
        assert_eq!(press(&mut form, KeyCode::Enter), FormOutcome::Submit);
        assert!(form.pending);

        type_str(&mut form, "xyz");
        assert_eq!(form.password, "secret123");
        assert_eq!(press(&mut form, KeyCode::Esc), FormOutcome::Cancel);
    }

    #[test]
    fn register_requires_name() {
        let mut form = AuthForm::register();
        assert_eq!(form.focus, Field::Name);
        form.email = "user@example.com".into();
        form.password = "secret123".into();
        assert!(form.validate().is_err());
        form.name = "Ann".into();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn ctrl_r_switches_and_keeps_input() {
        let mut form = AuthForm::login();
        type_str(&mut form, "user@example.com");
        let outcome = form.handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL));
        assert_eq!(outcome, FormOutcome::Switch);

        let register = form.switched();
        assert_eq!(register.kind, FormKind::Register);
        assert_eq!(register.email, "user@example.com");
        assert_eq!(register.focus, Field::Name);
    }
}
