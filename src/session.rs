use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
};
use anyhow::Context;
use jsonwebtoken::{decode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{models::PlayerId, AppState};

/// Subject used for the host's token, which has no player id
const HOST_SUBJECT: &str = "host";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,     // Player ID, or "host"
    pub game_id: String, // Game code
    pub exp: usize,      // Expiration time
}

/// Which game a request belongs to and in what role.
///
/// It says who a connection is; it does not prove anything about them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub game_id: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Player(PlayerId),
}

impl Session {
    pub fn host(game_id: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            role: Role::Host,
        }
    }

    pub fn player(game_id: impl Into<String>, player_id: PlayerId) -> Self {
        Self {
            game_id: game_id.into(),
            role: Role::Player(player_id),
        }
    }

    pub fn is_host(&self) -> bool {
        matches!(self.role, Role::Host)
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        match self.role {
            Role::Player(id) => Some(id),
            Role::Host => None,
        }
    }
}

/// Extractor for sessions from a bearer header or `token` query parameter
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let app_state = Arc::<AppState>::from_ref(state);

        // WebSocket clients in browsers cannot set headers, so fall back to the query
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(String::from)
            .or_else(|| {
                parts
                    .uri
                    .query()
                    .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
                    .and_then(|params| {
                        params
                            .iter()
                            .find(|(k, _)| k == "token")
                            .map(|(_, v)| v.clone())
                    })
            });

        async move {
            let token = token.ok_or(StatusCode::UNAUTHORIZED)?;
            decode_token(&token, &app_state.config.session.secret).map_err(|e| {
                tracing::debug!("Rejected session token: {}", e);
                StatusCode::UNAUTHORIZED
            })
        }
    }
}

/// Sign a session token valid for `ttl_hours`
pub fn issue_token(session: &Session, secret: &str, ttl_hours: i64) -> anyhow::Result<String> {
    let expiration = chrono::Duration::try_hours(ttl_hours)
        .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl))
        .with_context(|| format!("session lifetime of {} hours is out of range", ttl_hours))?
        .timestamp();

    let sub = match session.role {
        Role::Host => HOST_SUBJECT.to_string(),
        Role::Player(id) => id.to_string(),
    };

    let claims = Claims {
        sub,
        game_id: session.game_id.clone(),
        exp: expiration as usize,
    };

    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;
    Ok(token)
}

/// Verify a session token and recover the session
pub fn decode_token(token: &str, secret: &str) -> anyhow::Result<Session> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;

    let claims = token_data.claims;
    let role = if claims.sub == HOST_SUBJECT {
        Role::Host
    } else {
        Role::Player(claims.sub.parse::<Uuid>()?)
    };

    Ok(Session {
        game_id: claims.game_id,
        role,
    })
}
