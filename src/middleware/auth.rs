use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use sea_orm::EntityTrait;

use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::{verify_token, Claims};
use crate::AppState;

/// Extract and validate JWT token from Authorization header, then check the
/// account it was issued for still exists and is active
pub async fn auth_middleware(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let claims = verify_token(auth.token(), &state.config.jwt_secret)?;
    let account = user::Entity::find_by_id(claims.sub).one(&state.db).await?;

    request.extensions_mut().insert(authorize(claims, account)?);
    Ok(next.run(request).await)
}

/// Reconcile token claims with the stored account.
///
/// The stored role wins over the one in the token, so role changes apply
/// before the token expires.
fn authorize(mut claims: Claims, account: Option<user::Model>) -> AppResult<Claims> {
    let account =
        account.ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    if !account.is_active {
        return Err(AppError::Forbidden("Account is deactivated".to_string()));
    }

    claims.role = account.role;
    Ok(claims)
}

fn claims(request: &Request) -> AppResult<&Claims> {
    request
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::Unauthorized("No authentication found".to_string()))
}

/// Require admin role
pub async fn require_admin(request: Request, next: Next) -> AppResult<Response> {
    if claims(&request)?.role != UserRole::Admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    Ok(next.run(request).await)
}

/// Require a role that may publish listings (farmer or admin)
pub async fn require_seller(request: Request, next: Next) -> AppResult<Response> {
    if !claims(&request)?.role.can_sell() {
        return Err(AppError::Forbidden(
            "Farmer account required to manage listings".to_string(),
        ));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn account(role: UserRole, is_active: bool) -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            email: "gopal@example.com".to_string(),
            password_hash: String::new(),
            name: "Gopal".to_string(),
            phone: "+919333333333".to_string(),
            latitude: None,
            longitude: None,
            role,
            is_active,
            created_at: Utc::now().fixed_offset(),
        }
    }

    fn claims_for(user: &user::Model, role: UserRole) -> Claims {
        Claims {
            sub: user.id,
            email: user.email.clone(),
            role,
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn test_active_account_passes() {
        let user = account(UserRole::Farmer, true);
        let claims = authorize(claims_for(&user, UserRole::Farmer), Some(user)).unwrap();
        assert_eq!(claims.role, UserRole::Farmer);
    }

    #[test]
    fn test_deactivated_account_is_forbidden() {
        let user = account(UserRole::Farmer, false);
        let result = authorize(claims_for(&user, UserRole::Farmer), Some(user));
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_deleted_account_is_unauthorized() {
        let user = account(UserRole::Customer, true);
        let result = authorize(claims_for(&user, UserRole::Customer), None);
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_demoted_farmer_loses_seller_role() {
        let user = account(UserRole::Customer, true);
        let claims = authorize(claims_for(&user, UserRole::Farmer), Some(user)).unwrap();

        assert_eq!(claims.role, UserRole::Customer);
        assert!(!claims.role.can_sell());
    }
}
