// src/services/auth.rs

use bcrypt::verify;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, User},
};

/// Emite o token de identidade: função pura de (usuário, segredo, relógio).
/// As claims carregam o tenant do MOMENTO DO LOGIN; a revalidação contra o
/// estado atual acontece em `validate_token`.
pub fn create_token(user: &User, jwt_secret: &str) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = now + chrono::Duration::days(7);

    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        role: user.role,
        tenant_id: user.tenant_id,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    )?)
}

/// Decodifica e verifica assinatura + expiração. Qualquer falha vira
/// `InvalidToken` — o chamador nunca sabe o motivo exato.
pub fn decode_token(token: &str, jwt_secret: &str) -> Result<Claims, AppError> {
    let validation = Validation::default();
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &validation,
    )
    .map_err(|_| AppError::InvalidToken)?;
    Ok(token_data.claims)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String) -> Self {
        Self { user_repo, jwt_secret }
    }

    /// Login: verifica a senha (em thread separada, bcrypt é caro) e emite
    /// o token. Usuário inexistente e senha errada produzem o MESMO erro.
    pub async fn login_user(&self, username: &str, password: &str) -> Result<(String, User), AppError> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?
            .into_user()?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let token = create_token(&user, &self.jwt_secret)?;
        Ok((token, user))
    }

    /// O guardião de tenant. Ordem das verificações:
    ///   1. assinatura/expiração do token;
    ///   2. presença das claims de usuário e de tenant;
    ///   3. o usuário ainda existe (recarregado do banco, nunca de cache);
    ///   4. o tenant da claim bate com o tenant ATUAL do usuário.
    /// O passo 4 invalida tokens emitidos antes de uma troca/remoção de
    /// membresia, sem precisar de revogação de token.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = decode_token(token, &self.jwt_secret)?;

        let Some(token_tenant) = claims.tenant_id else {
            return Err(AppError::MissingClaims);
        };

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::TokenUserNotFound)?
            .into_user()?;

        if user.tenant_id != Some(token_tenant) {
            return Err(AppError::TenantMismatch);
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "segredo-de-teste";

    fn sample_user(tenant_id: Option<i64>) -> User {
        User {
            id: 42,
            username: "fornecedor1".to_string(),
            password_hash: "$2b$irrelevante".to_string(),
            role: Role::Supplier,
            tenant_id,
            tenant_name: tenant_id.map(|_| "Empresa A".to_string()),
            fulfillment_id: None,
            fulfillment_name: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn token_roundtrip_preserva_as_claims() {
        let token = create_token(&sample_user(Some(3)), SECRET).unwrap();
        let claims = decode_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "fornecedor1");
        assert_eq!(claims.role, Role::Supplier);
        assert_eq!(claims.tenant_id, Some(3));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_de_usuario_sem_tenant_carrega_claim_nula() {
        let token = create_token(&sample_user(None), SECRET).unwrap();
        let claims = decode_token(&token, SECRET).unwrap();
        assert_eq!(claims.tenant_id, None);
    }

    #[test]
    fn token_adulterado_e_rejeitado() {
        let token = create_token(&sample_user(Some(3)), SECRET).unwrap();
        // Corrompe a assinatura (último bloco do JWT).
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });
        assert!(matches!(
            decode_token(&tampered, SECRET),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn token_com_segredo_errado_e_rejeitado() {
        let token = create_token(&sample_user(Some(3)), SECRET).unwrap();
        assert!(matches!(
            decode_token(&token, "outro-segredo"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn token_expirado_e_rejeitado() {
        let now = Utc::now();
        let claims = Claims {
            sub: 42,
            username: "fornecedor1".to_string(),
            role: Role::Supplier,
            tenant_id: Some(3),
            exp: (now.timestamp() - 3600) as usize,
            iat: (now.timestamp() - 7200) as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_ref()),
        )
        .unwrap();
        assert!(matches!(
            decode_token(&token, SECRET),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn lixo_nao_e_token() {
        assert!(matches!(
            decode_token("nem.um.jwt", SECRET),
            Err(AppError::InvalidToken)
        ));
    }
}
