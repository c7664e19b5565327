//! Identity and profile flows: signup, login, profile resolution, save and
//! autofill. Each flow follows lock → begin → unlock → remote → lock → complete.

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::profile::Profile;
use crate::session::resolver::{Landing, ProfileOutcome, SessionState};
use crate::session::store::SharedContext;
use crate::upstream::{JobAssistantApi, ResumeFile, UpstreamError};

const ALLOWED_RESUME_EXTENSIONS: [&str; 2] = ["pdf", "docx"];

/// Where the resolver put the session, and where the frontend should go.
#[derive(Debug, Serialize)]
pub struct Resolution {
    pub state: SessionState,
    pub landing: Landing,
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

#[derive(Debug, Serialize)]
pub struct ExtractedResume {
    pub file_name: String,
    pub text: String,
}

/// Authenticates, then resolves the profile.
pub async fn login(
    api: &dyn JobAssistantApi,
    ctx: &SharedContext,
    email: &str,
    password: &str,
) -> Result<Resolution, AppError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "email and password are required".to_string(),
        ));
    }

    let ticket = ctx.lock().await.begin_login(email);
    let outcome = api.authenticate(email, password).await;
    ctx.lock()
        .await
        .resolver
        .complete_authenticate(ticket, outcome)?;

    resolve_profile(api, ctx).await
}

/// Registers the account, then logs in with the same secret.
pub async fn signup(
    api: &dyn JobAssistantApi,
    ctx: &SharedContext,
    name: &str,
    email: &str,
    password: &str,
) -> Result<Resolution, AppError> {
    if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "name, email and password are required".to_string(),
        ));
    }

    api.signup(name.trim(), email.trim(), password).await?;
    info!("Registered {}", email.trim());
    login(api, ctx, email, password).await
}

/// Fetches the profile for the stored credential. "Not found" is a normal
/// outcome that lands the user on profile completion.
pub async fn resolve_profile(
    api: &dyn JobAssistantApi,
    ctx: &SharedContext,
) -> Result<Resolution, AppError> {
    let (ticket, credential) = ctx.lock().await.resolver.begin_lookup()?;
    let outcome = api.get_profile(&credential).await;

    let mut guard = ctx.lock().await;
    let expired = matches!(outcome, Err(UpstreamError::Unauthorized));
    let result = guard.resolver.complete_lookup(ticket, outcome);
    if expired {
        // The resolver already dropped the credential; drop what hung off it.
        guard.logout();
    }

    let resolved = result?;
    let state = guard.resolver.state();
    Ok(Resolution {
        state,
        landing: state.landing(),
        user_id: guard.resolver.user_id().map(str::to_string),
        profile: match resolved {
            ProfileOutcome::Complete => guard.resolver.profile().cloned(),
            ProfileOutcome::Missing => None,
        },
    })
}

/// Saves the profile (update, falling back to create only when the backend
/// has no profile yet), then re-resolves so "complete" reflects a real fetch.
pub async fn save_profile(
    api: &dyn JobAssistantApi,
    ctx: &SharedContext,
    profile: Profile,
) -> Result<Resolution, AppError> {
    let profile = profile.normalized();
    profile.validate()?;

    let credential = ctx.lock().await.resolver.credential()?.clone();
    let outcome = match api.update_profile(&credential, &profile).await {
        Err(UpstreamError::NotFound(_)) => {
            info!("No profile for {} yet; creating", credential.user_id());
            api.create_profile(&credential, &profile).await
        }
        other => other,
    };

    ctx.lock().await.observe(&credential, &outcome)?;
    outcome?;
    info!("Profile saved for {}", credential.user_id());

    resolve_profile(api, ctx).await
}

/// Forwards a résumé file to the backend's autofill, then re-resolves.
pub async fn autofill_profile(
    api: &dyn JobAssistantApi,
    ctx: &SharedContext,
    file: ResumeFile,
) -> Result<Resolution, AppError> {
    check_resume_file(&file)?;

    let credential = ctx.lock().await.resolver.credential()?.clone();
    let outcome = api.autofill_profile(&credential, &file).await;
    ctx.lock().await.observe(&credential, &outcome)?;
    outcome?;
    info!("Profile autofilled for {} from {}", credential.user_id(), file.file_name);

    resolve_profile(api, ctx).await
}

/// Extracts text from an uploaded résumé.
pub async fn upload_resume(
    api: &dyn JobAssistantApi,
    file: ResumeFile,
) -> Result<ExtractedResume, AppError> {
    check_resume_file(&file)?;
    let text = api.upload_resume(&file).await?;
    if text.trim().is_empty() {
        warn!("No text could be extracted from {}", file.file_name);
    }
    Ok(ExtractedResume {
        file_name: file.file_name,
        text,
    })
}

pub async fn logout(ctx: &SharedContext) -> Resolution {
    let mut guard = ctx.lock().await;
    guard.logout();
    let state = guard.resolver.state();
    Resolution {
        state,
        landing: state.landing(),
        user_id: None,
        profile: None,
    }
}

fn check_resume_file(file: &ResumeFile) -> Result<(), AppError> {
    if file.bytes.is_empty() {
        return Err(AppError::Validation("uploaded file is empty".to_string()));
    }
    let extension = file
        .file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !ALLOWED_RESUME_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::Validation(format!(
            "'{}' is not a .pdf or .docx file",
            file.file_name
        )));
    }
    Ok(())
}
