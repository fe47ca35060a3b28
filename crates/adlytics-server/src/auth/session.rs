//! Bearer-credential resolution with dual token acceptance.

use thiserror::Error;

use adlytics_core::identity::{namespaced_id, Identity, UpstreamProfile};

use crate::auth::jwt::decode_session;
use crate::state::AppState;

/// How a bearer credential was accepted.
///
/// The two variants are tried in this fixed order: a locally signed session
/// first, then the raw token as an upstream passthrough against the
/// provider's userinfo endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionKind {
    Local,
    UpstreamPassthrough,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub identity: Identity,
    pub kind: SessionKind,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid token")]
    InvalidSession,
}

/// Build an [`Identity`] from an upstream profile, filling the placeholder
/// fields the original record shape expects.
pub fn identity_from_profile(id: &str, profile: UpstreamProfile) -> Identity {
    Identity {
        id: id.to_string(),
        name: profile.name.unwrap_or_else(|| "Unknown User".to_string()),
        email: profile
            .email
            .unwrap_or_else(|| "unknown@example.com".to_string()),
        picture: profile.picture,
    }
}

/// Resolve a bearer credential to an authenticated identity.
///
/// A valid local session whose subject is unknown to the identity store is
/// rejected — the store is process-lifetime, so such a session predates the
/// current process and the user must re-authenticate.
pub async fn resolve_session(state: &AppState, token: &str) -> Result<AuthSession, SessionError> {
    match decode_session(token, &state.config.secret_key) {
        Ok(claims) => match state.identities.get(&claims.sub).await {
            Some(identity) => Ok(AuthSession {
                identity,
                kind: SessionKind::Local,
            }),
            None => Err(SessionError::InvalidSession),
        },
        Err(_) => {
            let provider = state
                .provider
                .as_ref()
                .ok_or(SessionError::InvalidSession)?;
            let profile = provider
                .fetch_profile(token)
                .await
                .map_err(|_| SessionError::InvalidSession)?;

            let id = namespaced_id(&profile.id);
            let identity = identity_from_profile(&id, profile);
            state.identities.upsert(&id, identity.clone()).await;

            Ok(AuthSession {
                identity,
                kind: SessionKind::UpstreamPassthrough,
            })
        }
    }
}
