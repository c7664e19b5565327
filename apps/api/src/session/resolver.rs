//! SessionResolver: decides, from the stored credential and the outcome of the
//! profile lookup, which state a session is in.
//!
//! States:
//!
//! ```text
//! Anonymous ──authenticate──▶ Authenticating ──ok──▶ ProfileUnknown ──lookup──▶ ProfileComplete
//!     ▲                            │ err                                  └──▶ ProfileMissing
//!     └────────────────────────────┴──────────── logout / credential expiry ◀──────┘
//! ```
//!
//! Every remote step is split into `begin_*` (captures a ticket) and
//! `complete_*` (applies the outcome only if the ticket is still live). The
//! resolver is the only code that creates or clears a [`Credential`].

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::profile::Profile;
use crate::upstream::UpstreamError;

/// The authenticated identity: token and user identifier, always together.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    user_id: String,
}

impl Credential {
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The login email, which the backend uses as the user identifier.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    #[serde(rename = "anonymous")]
    Anonymous,
    #[serde(rename = "authenticating")]
    Authenticating,
    #[serde(rename = "authenticated_profile_unknown")]
    ProfileUnknown,
    #[serde(rename = "authenticated_profile_complete")]
    ProfileComplete,
    #[serde(rename = "authenticated_profile_missing")]
    ProfileMissing,
}

/// Where the frontend should send the user after a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Landing {
    Login,
    Profile,
    EditProfile,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(
            self,
            SessionState::ProfileUnknown
                | SessionState::ProfileComplete
                | SessionState::ProfileMissing
        )
    }

    pub fn landing(&self) -> Landing {
        match self {
            SessionState::ProfileComplete => Landing::Profile,
            SessionState::ProfileMissing | SessionState::ProfileUnknown => Landing::EditProfile,
            SessionState::Anonymous | SessionState::Authenticating => Landing::Login,
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("{0}")]
    AuthenticationFailed(String),

    #[error("authentication request failed: {0}")]
    AuthenticationUnavailable(UpstreamError),

    #[error("credential expired")]
    CredentialExpired,

    #[error("profile lookup failed: {0}")]
    LookupFailed(UpstreamError),

    #[error("profile required")]
    ProfileRequired,

    /// The outcome belongs to a superseded or abandoned request and was dropped.
    #[error("stale result discarded")]
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupTicket(u64);

/// The result of a lookup that completed normally. Absence is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileOutcome {
    Complete,
    Missing,
}

#[derive(Debug)]
pub struct SessionResolver {
    state: SessionState,
    credential: Option<Credential>,
    profile: Option<Profile>,
    epoch: u64,
    pending_auth: Option<(u64, String)>,
    pending_lookup: Option<u64>,
}

impl Default for SessionResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionResolver {
    pub fn new() -> Self {
        Self {
            state: SessionState::Anonymous,
            credential: None,
            profile: None,
            epoch: 0,
            pending_auth: None,
            pending_lookup: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn lookup_pending(&self) -> bool {
        self.pending_lookup.is_some()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.credential.as_ref().map(Credential::user_id)
    }

    /// The stored credential. Identity-bound calls short-circuit on `Err`.
    pub fn credential(&self) -> Result<&Credential, ResolverError> {
        self.credential.as_ref().ok_or(ResolverError::NotAuthenticated)
    }

    /// The profile, available only once a fetch for this identity succeeded.
    pub fn profile(&self) -> Option<&Profile> {
        match self.state {
            SessionState::ProfileComplete => self.profile.as_ref(),
            _ => None,
        }
    }

    /// Gate for every tailoring / interview / document action.
    pub fn require_profile(&self) -> Result<(&Credential, &Profile), ResolverError> {
        let credential = self.credential()?;
        let profile = self.profile().ok_or(ResolverError::ProfileRequired)?;
        Ok((credential, profile))
    }

    fn next_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    /// Starts an authentication attempt for `identity`. Any previous identity is
    /// dropped; nothing is stored until the attempt completes. A newer attempt
    /// supersedes one still pending, whose outcome then comes back `Stale`.
    pub fn begin_authenticate(&mut self, identity: &str) -> AuthTicket {
        if let Some((_, pending)) = &self.pending_auth {
            info!("Authentication for {pending} superseded by {identity}");
        }
        self.clear();
        let ticket = self.next_epoch();
        self.pending_auth = Some((ticket, identity.to_string()));
        self.state = SessionState::Authenticating;
        AuthTicket(ticket)
    }

    /// Applies the authentication outcome. On success the credential is stored
    /// whole and the state becomes `ProfileUnknown`; on failure the session is
    /// back to `Anonymous` with no credential.
    pub fn complete_authenticate(
        &mut self,
        ticket: AuthTicket,
        outcome: Result<String, UpstreamError>,
    ) -> Result<Credential, ResolverError> {
        let identity = match self.pending_auth.take() {
            Some((t, identity)) if t == ticket.0 => identity,
            other => {
                self.pending_auth = other;
                return Err(ResolverError::Stale);
            }
        };

        match outcome {
            Ok(token) if !token.trim().is_empty() => {
                let credential = Credential {
                    token,
                    user_id: identity,
                };
                self.credential = Some(credential.clone());
                self.state = SessionState::ProfileUnknown;
                info!("Authenticated {}", credential.user_id());
                Ok(credential)
            }
            Ok(_) => {
                self.state = SessionState::Anonymous;
                Err(ResolverError::AuthenticationFailed(
                    "backend returned an empty token".to_string(),
                ))
            }
            Err(UpstreamError::Rejected { detail, .. }) => {
                self.state = SessionState::Anonymous;
                Err(ResolverError::AuthenticationFailed(detail))
            }
            Err(UpstreamError::Unauthorized) => {
                self.state = SessionState::Anonymous;
                Err(ResolverError::AuthenticationFailed(
                    "Invalid credentials".to_string(),
                ))
            }
            Err(e) => {
                self.state = SessionState::Anonymous;
                Err(ResolverError::AuthenticationUnavailable(e))
            }
        }
    }

    /// Starts a profile lookup. A newer lookup supersedes an older one.
    pub fn begin_lookup(&mut self) -> Result<(LookupTicket, Credential), ResolverError> {
        let credential = self.credential()?.clone();
        let ticket = self.next_epoch();
        self.pending_lookup = Some(ticket);
        Ok((LookupTicket(ticket), credential))
    }

    /// Applies the lookup outcome. "Not found" moves to `ProfileMissing`; a
    /// refused credential forces re-authentication; any other failure leaves
    /// the state exactly as it was.
    pub fn complete_lookup(
        &mut self,
        ticket: LookupTicket,
        outcome: Result<Profile, UpstreamError>,
    ) -> Result<ProfileOutcome, ResolverError> {
        if self.pending_lookup != Some(ticket.0) {
            return Err(ResolverError::Stale);
        }
        self.pending_lookup = None;

        match outcome {
            Ok(profile) => {
                self.profile = Some(profile);
                self.state = SessionState::ProfileComplete;
                Ok(ProfileOutcome::Complete)
            }
            Err(UpstreamError::NotFound(_)) => {
                self.profile = None;
                self.state = SessionState::ProfileMissing;
                info!(
                    "No profile for {}; completion required",
                    self.user_id().unwrap_or_default()
                );
                Ok(ProfileOutcome::Missing)
            }
            Err(UpstreamError::Unauthorized) => {
                self.invalidate();
                Err(ResolverError::CredentialExpired)
            }
            Err(e) => Err(ResolverError::LookupFailed(e)),
        }
    }

    /// Clears the credential. Always succeeds; calling it twice is harmless.
    pub fn logout(&mut self) {
        if let Some(user) = self.user_id() {
            info!("Logged out {user}");
        }
        self.clear();
        self.next_epoch();
    }

    /// Called when any remote call refused the stored credential.
    pub fn invalidate(&mut self) {
        if let Some(user) = self.user_id() {
            warn!("Credential for {user} was refused; re-authentication required");
        }
        self.clear();
        self.next_epoch();
    }

    fn clear(&mut self) {
        self.credential = None;
        self.profile = None;
        self.pending_auth = None;
        self.pending_lookup = None;
        self.state = SessionState::Anonymous;
    }
}
