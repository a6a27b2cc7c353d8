// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
    RequestExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::error::AppError, config::AppState, models::business::Business};

// Claims do token emitido pelo serviço de identidade (aqui só validamos)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // ID do ator (dono ou funcionário)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_id: Option<Uuid>, // Escopo: estabelecimento que o token administra
    pub exp: usize,
    #[serde(default)]
    pub iat: usize,
}

/// Quem está chamando uma rota protegida.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedActor {
    pub id: Uuid,
    pub business_id: Option<Uuid>,
}

impl From<Claims> for AuthenticatedActor {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            business_id: claims.business_id,
        }
    }
}

impl AuthenticatedActor {
    /// Dono do estabelecimento, ou token com escopo nele.
    pub fn can_manage(&self, business: &Business) -> bool {
        business.owner_id == self.id || self.business_id == Some(business.id)
    }
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Token recusado: {}", e);
        AppError::Unauthorized
    })?;
    Ok(token_data.claims)
}

// O middleware: valida o Bearer e guarda o ator nos "extensions" da requisição
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = request
        .extract_parts::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|_| AppError::Unauthorized)?;

    let claims = decode_token(&app_state.config.jwt_secret, bearer.token())?;
    request.extensions_mut().insert(AuthenticatedActor::from(claims));

    Ok(next.run(request).await)
}

// Extrator para obter o ator autenticado diretamente nos handlers
impl<S> FromRequestParts<S> for AuthenticatedActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedActor>()
            .copied()
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "segredo-de-teste";

    fn token(secret: &str, business_id: Option<Uuid>, exp_offset: i64) -> (Uuid, String) {
        let sub = Uuid::new_v4();
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub,
            business_id,
            exp: (now + exp_offset) as usize,
            iat: now as usize,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap();
        (sub, token)
    }

    #[test]
    fn decodes_owner_claims() {
        let business_id = Uuid::new_v4();
        let (sub, token) = token(SECRET, Some(business_id), 3600);

        let actor = AuthenticatedActor::from(decode_token(SECRET, &token).unwrap());
        assert_eq!(actor.id, sub);
        assert_eq!(actor.business_id, Some(business_id));
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let (_, forged) = token("outro-segredo", None, 3600);
        assert!(matches!(decode_token(SECRET, &forged), Err(AppError::Unauthorized)));

        let (_, expired) = token(SECRET, None, -3600);
        assert!(matches!(decode_token(SECRET, &expired), Err(AppError::Unauthorized)));

        assert!(matches!(decode_token(SECRET, "nem-e-um-jwt"), Err(AppError::Unauthorized)));
    }
}
