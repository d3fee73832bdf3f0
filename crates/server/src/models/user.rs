//! User domain types.

use storeroom_core::{Login, Role, UserId};

use super::DomainError;

/// A persisted user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Store-assigned ID.
    pub id: UserId,
    /// Globally unique, email-shaped login.
    pub login: Login,
    /// Argon2id password hash; never the clear-text password.
    pub password_hash: String,
    /// Access level for authorization gates.
    pub role: Role,
    /// Last issued session token, if any.
    pub token: Option<String>,
}

/// A user draft awaiting persistence.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: Login,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    /// Validate and build a user draft.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] if the login is not email-shaped, the role is
    /// unknown, or the password hash is empty.
    pub fn new(login: &str, password_hash: String, role: &str) -> Result<Self, DomainError> {
        let login = Login::parse(login)?;
        let role: Role = role.parse()?;
        super::require_text(&password_hash, "password")?;
        Ok(Self {
            login,
            password_hash,
            role,
        })
    }

    /// Attach a store-assigned ID, producing the persisted entity.
    #[must_use]
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            login: self.login,
            password_hash: self.password_hash,
            role: self.role,
            token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_valid() {
        let draft = NewUser::new("cmd@cmd.ru", "$argon2id$stub".into(), "regular")
            .expect("valid draft");
        assert_eq!(draft.login.as_str(), "cmd@cmd.ru");
        assert_eq!(draft.role, Role::Regular);
    }

    #[test]
    fn test_new_user_rejects_bad_login() {
        assert!(matches!(
            NewUser::new("not-an-email", "hash".into(), "regular"),
            Err(DomainError::Login(_))
        ));
    }

    #[test]
    fn test_new_user_rejects_unknown_role() {
        assert!(matches!(
            NewUser::new("cmd@cmd.ru", "hash".into(), "super"),
            Err(DomainError::Role(_))
        ));
    }

    #[test]
    fn test_new_user_rejects_empty_password() {
        assert_eq!(
            NewUser::new("cmd@cmd.ru", String::new(), "regular").unwrap_err(),
            DomainError::Required { field: "password" }
        );
    }

    #[test]
    fn test_into_user_assigns_id() {
        let draft = NewUser::new("cmd@cmd.ru", "hash".into(), "admin").expect("valid draft");
        let user = draft.into_user(UserId::new(3));
        assert_eq!(user.id, UserId::new(3));
        assert_eq!(user.role, Role::Admin);
        assert!(user.token.is_none());
    }
}
