//! Post-auth project resolver.
//!
//! DESIGN
//! ======
//! After a sign-in or sign-up attempt the user must land on exactly one
//! project. `AuthFlow` verifies the credentials, then picks the target:
//!
//! 1. pending anonymous work (non-empty messages) becomes a new project,
//!    and the snapshot is cleared once that project exists;
//! 2. otherwise the most recent existing project is reused;
//! 3. otherwise a blank project is created.
//!
//! Exactly one navigation to `/<project id>` follows a successful attempt.
//! Failed attempts return the failure as data and never navigate.
//!
//! ERROR HANDLING
//! ==============
//! Collaborator faults propagate unchanged through `?`. The loading flag is
//! lowered by a drop guard, so it resets on every exit path, faults included.
//! Nothing here retries or logs faults; that belongs to the caller.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use super::ServiceError;

const BLANK_PROJECT_SUFFIX_MAX: u32 = 100_000;

// =============================================================================
// TYPES
// =============================================================================

/// Which credential check to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    SignIn,
    SignUp,
}

/// One credential attempt. Not persisted.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Authenticated identity carried by a successful attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: Uuid,
    pub email: String,
    /// Raw session token; only its digest is stored server-side.
    pub token: String,
}

/// Outcome of a credential check. Failures are expected data, not faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    Success(AuthSession),
    Failure { error: String },
}

impl AuthResult {
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure { error: error.into() }
    }
}

/// A single chat message. Fields beyond `role` and `content` are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
impl ChatMessage {
    #[must_use]
    pub(crate) fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self { role: role.into(), content: content.into(), extra: serde_json::Map::new() }
    }
}

/// Serialized virtual file system: path -> node.
pub type FileSystemData = BTreeMap<String, serde_json::Value>;

/// Chat and file-system state accumulated before the user authenticated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonWork {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub file_system_data: FileSystemData,
}

impl AnonWork {
    /// A snapshot only counts when it carries messages; file data alone is ignored.
    #[must_use]
    pub fn is_present(&self) -> bool {
        !self.messages.is_empty()
    }
}

/// Listing entry for a user's project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Input for project creation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub messages: Vec<ChatMessage>,
    pub data: FileSystemData,
}

impl NewProject {
    /// Project carrying over anonymous work, named after the current time.
    #[must_use]
    pub fn from_anon_work(work: AnonWork, now: OffsetDateTime) -> Self {
        Self {
            name: format!("Design from {}", clock_label(now)),
            messages: work.messages,
            data: work.file_system_data,
        }
    }

    /// Empty project with a random numeric suffix.
    #[must_use]
    pub fn blank() -> Self {
        let suffix = rand::rng().random_range(0..BLANK_PROJECT_SUFFIX_MAX);
        Self { name: format!("New Design #{suffix}"), messages: Vec::new(), data: FileSystemData::new() }
    }
}

fn clock_label(now: OffsetDateTime) -> String {
    format!("{:02}:{:02}:{:02}", now.hour(), now.minute(), now.second())
}

/// Navigation path for a project.
#[must_use]
pub fn project_path(id: Uuid) -> String {
    format!("/{id}")
}

// =============================================================================
// COLLABORATORS
// =============================================================================

/// Checks credentials and opens a session on success.
#[async_trait::async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`ServiceError`] when verification cannot run at all.
    /// Wrong credentials are an `Ok(AuthResult::Failure)`.
    async fn verify(&self, kind: AuthKind, credentials: &Credentials) -> Result<AuthResult, ServiceError>;
}

/// Storage for work done before signing in.
#[async_trait::async_trait]
pub trait AnonWorkStore: Send + Sync {
    async fn read(&self) -> Result<Option<AnonWork>, ServiceError>;
    async fn clear(&self) -> Result<(), ServiceError>;
}

/// Project listing and creation, scoped to the authenticated user.
#[async_trait::async_trait]
pub trait ProjectStore: Send + Sync {
    /// Projects ordered most-recent-first.
    async fn list_projects(&self, session: &AuthSession) -> Result<Vec<ProjectSummary>, ServiceError>;
    async fn create_project(&self, session: &AuthSession, project: NewProject) -> Result<ProjectSummary, ServiceError>;
}

/// Client-side navigation. Fire-and-forget.
pub trait Navigator: Send + Sync {
    fn go_to(&self, path: &str);
}

// =============================================================================
// LOADING FLAG
// =============================================================================

/// Raises the loading flag for its lifetime.
struct LoadingGuard<'a> {
    flag: &'a watch::Sender<bool>,
}

impl<'a> LoadingGuard<'a> {
    fn raise(flag: &'a watch::Sender<bool>) -> Self {
        flag.send_replace(true);
        Self { flag }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.flag.send_replace(false);
    }
}

// =============================================================================
// AUTH FLOW
// =============================================================================

/// Sign-in/sign-up entry point with post-auth project resolution.
///
/// Overlapping calls are not serialized; each one toggles the loading flag
/// and the last writer wins.
pub struct AuthFlow<V, A, P, N> {
    verifier: V,
    anon_work: A,
    projects: P,
    navigator: N,
    loading: watch::Sender<bool>,
}

impl<V, A, P, N> AuthFlow<V, A, P, N>
where
    V: CredentialVerifier,
    A: AnonWorkStore,
    P: ProjectStore,
    N: Navigator,
{
    #[must_use]
    pub fn new(verifier: V, anon_work: A, projects: P, navigator: N) -> Self {
        let (loading, _) = watch::channel(false);
        Self { verifier, anon_work, projects, navigator, loading }
    }

    /// True while a sign-in or sign-up call is in flight.
    ///
    /// The HTTP layer builds one flow per request and never polls the flag.
    #[cfg(test)]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Watch the loading flag.
    #[cfg(test)]
    #[must_use]
    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    #[must_use]
    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    #[must_use]
    pub fn anon_work(&self) -> &A {
        &self.anon_work
    }

    #[must_use]
    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Sign in and navigate to the resolved project.
    ///
    /// # Errors
    ///
    /// Propagates any collaborator fault after the loading flag is reset.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResult, ServiceError> {
        self.authenticate(AuthKind::SignIn, email, password).await
    }

    /// Sign up and navigate to the resolved project.
    ///
    /// # Errors
    ///
    /// Propagates any collaborator fault after the loading flag is reset.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResult, ServiceError> {
        self.authenticate(AuthKind::SignUp, email, password).await
    }

    async fn authenticate(&self, kind: AuthKind, email: &str, password: &str) -> Result<AuthResult, ServiceError> {
        let _loading = LoadingGuard::raise(&self.loading);

        let credentials = Credentials { email: email.to_owned(), password: password.to_owned() };
        let result = self.verifier.verify(kind, &credentials).await?;
        let AuthResult::Success(session) = &result else {
            return Ok(result);
        };

        let project_id = self.resolve_project(session).await?;
        self.navigator.go_to(&project_path(project_id));
        Ok(result)
    }

    async fn resolve_project(&self, session: &AuthSession) -> Result<Uuid, ServiceError> {
        match self.anon_work.read().await?.filter(AnonWork::is_present) {
            Some(work) => {
                let project = self
                    .projects
                    .create_project(session, NewProject::from_anon_work(work, OffsetDateTime::now_utc()))
                    .await?;
                self.anon_work.clear().await?;
                debug!(project_id = %project.id, "anonymous work moved into new project");
                Ok(project.id)
            }
            None => {
                let projects = self.projects.list_projects(session).await?;
                if let Some(recent) = projects.first() {
                    debug!(project_id = %recent.id, "reusing most recent project");
                    return Ok(recent.id);
                }
                let project = self.projects.create_project(session, NewProject::blank()).await?;
                debug!(project_id = %project.id, "created blank project");
                Ok(project.id)
            }
        }
    }
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
