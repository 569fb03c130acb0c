//! Session-based authentication: identity claims, the request extractor and
//! password hashing.

use actix_identity::IdentityExt;
use actix_web::dev::Payload;
use actix_web::error::ErrorUnauthorized;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};

use crate::domain::types::{UserId, UserRole};
use crate::domain::user::User;

/// Claims stored in the identity cookie and attached to every authenticated
/// request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// User identifier.
    pub sub: i32,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl AuthenticatedUser {
    /// Build claims from a stored user.
    pub fn from_user(user: &User) -> Self {
        Self {
            sub: user.id.get(),
            email: user.email.as_str().to_string(),
            name: user.name.as_str().to_string(),
            role: user.role.as_str().to_string(),
        }
    }

    /// Typed user id from the claims.
    pub fn user_id(&self) -> Result<UserId, crate::domain::types::TypeConstraintError> {
        UserId::new(self.sub)
    }

    /// Parsed role, if the stored string is valid.
    pub fn parsed_role(&self) -> Option<UserRole> {
        UserRole::try_from(self.role.as_str()).ok()
    }

    /// Establish the identity session for this user.
    pub fn login(&self, request: &HttpRequest) -> Result<(), actix_web::Error> {
        let claims = serde_json::to_string(self)
            .map_err(|_| ErrorUnauthorized("failed to serialize session claims"))?;
        actix_identity::Identity::login(&request.extensions(), claims)
            .map_err(|_| ErrorUnauthorized("failed to establish session"))?;
        Ok(())
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = std::future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = req
            .get_identity()
            .map_err(|_| ErrorUnauthorized("authentication required"))
            .and_then(|identity| {
                identity
                    .id()
                    .map_err(|_| ErrorUnauthorized("authentication required"))
            })
            .and_then(|claims| {
                serde_json::from_str::<AuthenticatedUser>(&claims)
                    .map_err(|_| ErrorUnauthorized("invalid session claims"))
            });
        std::future::ready(result)
    }
}

/// Whether the claims carry the given role.
pub fn check_role(role: UserRole, user: &AuthenticatedUser) -> bool {
    user.parsed_role() == Some(role)
}

/// Hash a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC string. Malformed hashes fail closed.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn malformed_hash_fails_closed() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn role_check_matches_claims() {
        let user = AuthenticatedUser {
            sub: 1,
            email: "owner@example.com".into(),
            name: "Owner".into(),
            role: "business_owner".into(),
        };
        assert!(check_role(UserRole::BusinessOwner, &user));
        assert!(!check_role(UserRole::Admin, &user));
    }
}
