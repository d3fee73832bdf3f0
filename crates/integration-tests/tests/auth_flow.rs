//! Registration and sign-in flow against the in-memory backend.
//!
//! Exercises the pieces an HTTP layer would chain together: password
//! validation and hashing, user persistence, token issuance and
//! verification, then the access policy over the verified principal.

#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use storeroom_core::Role;
use storeroom_server::Stores;
use storeroom_server::auth::{AuthError, TokenService, password, policy};
use storeroom_server::models::{NewOrder, NewOrderState, NewUser};
use storeroom_server::store::{OrderStateStore as _, OrderStore as _, UserStore as _};

fn token_service() -> TokenService {
    TokenService::with_default_ttl(SecretString::from(
        "integration-test-secret-0123456789abcdef",
    ))
}

#[tokio::test]
async fn test_register_sign_in_and_access_own_order() {
    let stores = Stores::in_memory();
    let tokens = token_service();

    // Register.
    password::validate_password("hunter2hunter2").unwrap();
    let hash = password::hash_password("hunter2hunter2").unwrap();
    let user = stores
        .users
        .create(NewUser::new("buyer@cmd.ru", hash, "regular").unwrap())
        .await
        .unwrap();

    // Sign in: look the user up, check the password, issue a token.
    let stored = stores.users.get_by_login(&user.login).await.unwrap();
    password::verify_password("hunter2hunter2", &stored.password_hash).unwrap();
    let token = tokens.generate(&stored).unwrap();

    // The verified principal matches the registered user.
    let principal = tokens.verify(&token).unwrap();
    assert_eq!(principal.id, user.id);
    assert_eq!(principal.role, Role::Regular);

    // The principal reaches their own order but not admin surface.
    stores
        .order_states
        .create(NewOrderState::new("Created".into()).unwrap())
        .await
        .unwrap();
    let order = stores
        .orders
        .create(NewOrder::for_user(user.id).unwrap())
        .await
        .unwrap();
    policy::require_order_access(&principal, &order).unwrap();
    assert_eq!(policy::require_admin(&principal), Err(AuthError::Forbidden));
}

#[tokio::test]
async fn test_foreign_order_is_forbidden_except_for_admins() {
    let stores = Stores::in_memory();
    let tokens = token_service();

    let owner = stores
        .users
        .create(NewUser::new("owner@cmd.ru", "hash".into(), "regular").unwrap())
        .await
        .unwrap();
    let outsider = stores
        .users
        .create(NewUser::new("outsider@cmd.ru", "hash".into(), "regular").unwrap())
        .await
        .unwrap();
    let admin = stores
        .users
        .create(NewUser::new("root@cmd.ru", "hash".into(), "admin").unwrap())
        .await
        .unwrap();

    stores
        .order_states
        .create(NewOrderState::new("Created".into()).unwrap())
        .await
        .unwrap();
    let order = stores
        .orders
        .create(NewOrder::for_user(owner.id).unwrap())
        .await
        .unwrap();

    let outsider_principal = tokens
        .verify(&tokens.generate(&outsider).unwrap())
        .unwrap();
    assert_eq!(
        policy::require_order_access(&outsider_principal, &order),
        Err(AuthError::Forbidden)
    );

    let admin_principal = tokens.verify(&tokens.generate(&admin).unwrap()).unwrap();
    policy::require_order_access(&admin_principal, &order).unwrap();
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let hash = password::hash_password("correct-password").unwrap();
    assert_eq!(
        password::verify_password("wrong-password", &hash),
        Err(AuthError::InvalidCredentials)
    );
}

#[tokio::test]
async fn test_token_survives_user_deletion_until_expiry() {
    let stores = Stores::in_memory();
    let tokens = token_service();

    let user = stores
        .users
        .create(NewUser::new("gone@cmd.ru", "hash".into(), "regular").unwrap())
        .await
        .unwrap();
    let token = tokens.generate(&user).unwrap();

    stores.users.delete(user.id).await.unwrap();

    // Verification is stateless; the token stays valid until it expires.
    let principal = tokens.verify(&token).unwrap();
    assert_eq!(principal.id, user.id);
}
