use crate::model::{Id, password::HashedPassword};
use thiserror::Error;

pub const USERNAME_MAX_LEN: usize = 50;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct User {
    pub id: Id<UserMarker>,
    pub name: Username,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct CreateUser {
    pub name: Username,
    pub password_hash: HashedPassword,
}

/// Login read model: the account plus its stored credential.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Credential {
    pub user: User,
    pub password_hash: HashedPassword,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct Username(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The username is invalid: {0:?}")]
pub struct InvalidUsernameError(String);

impl Username {
    /// Usernames are case-sensitive, non-empty, and at most
    /// [`USERNAME_MAX_LEN`] characters.
    pub fn new(name: String) -> Result<Self, InvalidUsernameError> {
        let length = name.chars().count();
        if length == 0 || length > USERNAME_MAX_LEN {
            Err(InvalidUsernameError(name))
        } else {
            Ok(Username(name))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use crate::model::user::{USERNAME_MAX_LEN, Username};

    #[test]
    fn legal_usernames() {
        assert!(Username::new("alice".to_owned()).is_ok());
        assert!(Username::new("a".to_owned()).is_ok());
        assert!(Username::new("x".repeat(USERNAME_MAX_LEN)).is_ok());
    }

    #[test]
    fn illegal_usernames() {
        assert!(Username::new(String::new()).is_err());
        assert!(Username::new("x".repeat(USERNAME_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn usernames_are_case_sensitive() {
        let lower = Username::new("alice".to_owned()).unwrap();
        let upper = Username::new("Alice".to_owned()).unwrap();
        assert_ne!(lower, upper);
    }
}
