//! Session state: auth token and cached catalog metadata
//!
//! Passed explicitly to whoever needs it. Populated on `start`, cleared on
//! `logout`.

use super::{ApiClient, AuthToken};
use crate::catalog::{BrandFilter, Category, UseCaseInfo};
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ─────────────────────────────────────────────────────────────────────────────
// Token store
// ─────────────────────────────────────────────────────────────────────────────

/// Token persisted as TOML, by default at `~/.config/uconf/auth.toml`
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".config").join("uconf").join("auth.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<AuthToken>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let token = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(Some(token))
    }

    pub fn save(&self, token: &AuthToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string(token)?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        // Owner-only: the file holds bearer tokens
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to restrict {}", self.path.display()))?;
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// Use cases and per-category brands
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub usecases: Vec<UseCaseInfo>,
    pub brands: HashMap<Category, Vec<String>>,
}

impl Metadata {
    /// Fetch everything. A failed lookup leaves its part empty.
    pub async fn fetch(client: &ApiClient) -> Self {
        let mut metadata = Metadata::default();
        match client.usecases().await {
            Ok(list) => metadata.usecases = list,
            Err(e) => tracing::warn!("Use-case list unavailable: {}", e),
        }

        let lookups = Category::ALL.map(|category| async move {
            (category, client.brands(category).await)
        });
        for (category, result) in futures::future::join_all(lookups).await {
            match result {
                Ok(brands) => {
                    metadata.brands.insert(category, brands);
                }
                Err(e) => tracing::debug!(category = %category, "Brands unavailable: {}", e),
            }
        }
        metadata
    }
}

#[derive(Debug)]
pub struct Session {
    store: TokenStore,
    token: Option<AuthToken>,
    usecases: Vec<UseCaseInfo>,
    brands: HashMap<Category, Vec<String>>,
}

impl Session {
    /// Restore a session from the token store. A corrupt token file is
    /// logged and treated as logged out.
    pub fn restore(store: TokenStore) -> Self {
        let token = match store.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Ignoring unreadable token file: {:#}", e);
                None
            }
        };
        Self {
            store,
            token,
            usecases: Vec::new(),
            brands: HashMap::new(),
        }
    }

    /// Populate cached metadata. Each lookup fails independently.
    pub async fn start(&mut self, client: &ApiClient) {
        let metadata = Metadata::fetch(client).await;
        self.apply_metadata(metadata);
    }

    /// Install metadata fetched elsewhere, e.g. on a background task
    pub fn apply_metadata(&mut self, metadata: Metadata) {
        tracing::debug!(
            usecases = metadata.usecases.len(),
            categories = metadata.brands.len(),
            "Session metadata loaded"
        );
        self.usecases = metadata.usecases;
        self.brands = metadata.brands;
    }

    pub fn login(&mut self, token: AuthToken) -> Result<()> {
        self.store.save(&token)?;
        tracing::info!(email = ?token.email, "Logged in");
        self.token = Some(token);
        Ok(())
    }

    /// Drop the token and every cached list
    pub fn logout(&mut self) -> Result<()> {
        self.token = None;
        self.usecases.clear();
        self.brands.clear();
        self.store.clear()?;
        tracing::info!("Logged out");
        Ok(())
    }

    pub fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    pub fn bearer(&self) -> Option<String> {
        self.token.as_ref().map(|t| t.access_token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn usecases(&self) -> &[UseCaseInfo] {
        &self.usecases
    }

    /// Brand choices for a category, "all brands" first
    pub fn brand_options(&self, category: Category) -> Vec<BrandFilter> {
        std::iter::once(BrandFilter::All)
            .chain(
                self.brands
                    .get(&category)
                    .into_iter()
                    .flatten()
                    .map(|b| BrandFilter::Brand(b.clone())),
            )
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Form validation
// ─────────────────────────────────────────────────────────────────────────────

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[\w.-]+@[a-zA-Z\d.-]+\.[a-zA-Z]{2,}$").expect("email pattern is valid")
    })
}

fn password_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^[A-Za-z\d!@#$%^&*()_+{}\[\]:;'"\\|,.<>/?~`-]{8,}$"#)
            .expect("password pattern is valid")
    })
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email_regex().is_match(email.trim()) {
        Ok(())
    } else {
        Err("Enter a valid email address.".to_string())
    }
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password_regex().is_match(password) {
        Ok(())
    } else {
        Err("Password must be at least 8 characters (letters, digits, symbols).".to_string())
    }
}

pub fn validate_registration(email: &str, password: &str, name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Enter your name.".to_string());
    }
    validate_email(email)?;
    validate_password(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(access: &str) -> AuthToken {
        AuthToken {
            access_token: access.to_string(),
            expires_at: None,
            refresh_token: Some("refresh".into()),
            refresh_expires_at: None,
            email: Some("user@example.com".into()),
        }
    }

    #[test]
    fn token_store_roundtrip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested").join("auth.toml"));
        assert!(store.load().unwrap().is_none());

        store.save(&token("abc")).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access_token, "abc");
        assert_eq!(loaded.email.as_deref(), Some("user@example.com"));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn saved_token_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("auth.toml"));
        store.save(&token("abc")).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn session_logout_clears_token_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("auth.toml"));
        let mut session = Session::restore(store.clone());
        assert!(!session.is_authenticated());

        session.login(token("abc")).unwrap();
        assert_eq!(session.bearer().as_deref(), Some("abc"));
        assert!(Session::restore(store.clone()).is_authenticated());

        session.logout().unwrap();
        assert!(!session.is_authenticated());
        assert!(!store.path().exists());
    }

    #[test]
    fn corrupt_token_file_restores_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.toml");
        fs::write(&path, "not = [valid").unwrap();
        let session = Session::restore(TokenStore::new(path));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn brand_options_lead_with_all() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::restore(TokenStore::new(dir.path().join("auth.toml")));
        session
            .brands
            .insert(Category::Cpu, vec!["AMD".into(), "Intel".into()]);
        let options = session.brand_options(Category::Cpu);
        assert_eq!(options[0], BrandFilter::All);
        assert_eq!(options.len(), 3);
        assert_eq!(session.brand_options(Category::Psu), vec![BrandFilter::All]);
    }

    #[test]
    fn validates_email_shape() {
        assert!(validate_email("jane.doe@example.com").is_ok());
        assert!(validate_email("jane@localhost").is_err());
        assert!(validate_email("not an email").is_err());
    }

    #[test]
    fn validates_password_length_and_charset() {
        assert!(validate_password("hunter22").is_ok());
        assert!(validate_password("short1").is_err());
        assert!(validate_password("has space in it").is_err());
    }

    #[test]
    fn registration_requires_name() {
        assert!(validate_registration("a@b.io", "password1", " ").is_err());
        assert!(validate_registration("a@b.io", "password1", "Ann").is_ok());
    }
}
