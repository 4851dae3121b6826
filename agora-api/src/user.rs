use std::{fmt, str::FromStr};

use chrono::Utc;

use crate::{Error, EventId, ObjectId, OrgId, Time, STUB_OID};

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    bolero::generator::TypeGenerator,
    serde::Deserialize,
    serde::Serialize,
)]
pub struct UserId(pub ObjectId);

impl UserId {
    pub fn stub() -> UserId {
        UserId(STUB_OID)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for UserId {
    type Err = Error;

    fn from_str(s: &str) -> Result<UserId, Error> {
        Ok(UserId(s.parse()?))
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: UserId,
    pub name: String,
    pub login: Login,
    pub age: u32,
    pub email_notifs: EmailNotifs,
    pub following_orgs: Vec<OrgId>,
    pub interested_event_history: Vec<EventId>,
    pub hosted_events: Vec<EventId>,
    pub created_datetime: Time,
}

impl User {
    pub fn new(name: String, email: String, hashed_password: String, age: u32) -> User {
        User {
            user_id: UserId(ObjectId::new()),
            name,
            login: Login {
                email: email.to_lowercase(),
                password: hashed_password,
                verified: false,
            },
            age,
            email_notifs: EmailNotifs::default(),
            following_orgs: Vec::new(),
            interested_event_history: Vec::new(),
            hosted_events: Vec::new(),
            created_datetime: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Login {
    pub email: String,
    /// bcrypt hash, never the cleartext. Kept out of every response body.
    #[serde(default, skip_serializing)]
    pub password: String,
    pub verified: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailNotifs {
    pub new_event_by_org: bool,
    pub new_post_for_event: bool,
    pub upcoming_events: bool,
}

impl Default for EmailNotifs {
    fn default() -> EmailNotifs {
        EmailNotifs {
            new_event_by_org: true,
            new_post_for_event: true,
            upcoming_events: true,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: u32,
}

impl NewUser {
    // See comments on other `validate` functions throughout agora-api
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.name)?;
        crate::validate_string(&self.email)?;
        crate::validate_string(&self.password)?;
        crate::require_nonempty("name", &self.name)?;
        crate::require_nonempty("email", &self.email)?;
        if self.password.len() < crate::MIN_PASSWORD_LEN {
            return Err(Error::PasswordTooShort);
        }
        crate::validate_age(self.age)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    // See comments on other `validate` functions throughout agora-api
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.email)?;
        crate::validate_string(&self.password)?;
        crate::require_nonempty("email", &self.email)
    }
}

/// What both register and login hand back to the client.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: UserId,
    pub name: String,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct UserPatch {
    pub name: String,
    pub age: u32,
}

impl UserPatch {
    // See comments on other `validate` functions throughout agora-api
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.name)?;
        crate::require_nonempty("name", &self.name)?;
        crate::validate_age(self.age)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifsPatch {
    pub new_event_by_org: bool,
    pub new_post_for_event: bool,
    pub upcoming_events: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_never_serialized() {
        let user = User::new(
            String::from("Ada"),
            String::from("Ada@Example.Edu"),
            String::from("$2b$10$abcdefghijklmnopqrstuv"),
            21,
        );
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["login"]["email"], "ada@example.edu");
        assert!(json["login"].get("password").is_none());
        let back: User = serde_json::from_value(json).unwrap();
        assert_eq!(back.login.password, "");
        assert_eq!(back.user_id, user.user_id);
    }

    #[test]
    fn new_user_validation() {
        let good = NewUser {
            name: String::from("Ada"),
            email: String::from("ada@example.edu"),
            password: String::from("hunter22"),
            age: 21,
        };
        assert_eq!(good.validate(), Ok(()));
        assert_eq!(
            NewUser {
                password: String::from("abc"),
                ..good.clone()
            }
            .validate(),
            Err(Error::PasswordTooShort)
        );
        assert_eq!(
            NewUser {
                name: String::new(),
                ..good.clone()
            }
            .validate(),
            Err(Error::EmptyField("name"))
        );
        assert_eq!(
            NewUser {
                age: 0,
                ..good.clone()
            }
            .validate(),
            Err(Error::AgeOutOfBounds(0))
        );
        assert_eq!(
            NewUser {
                name: String::from("A\0da"),
                ..good
            }
            .validate(),
            Err(Error::NullByteInString(String::from("A\0da")))
        );
    }
}
