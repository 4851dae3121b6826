use anyhow::{anyhow, Context};
use serde_json::json;

use crate::{CommentReplyId, EventId, OrgId, PostId, ReplyId, UserId};

// No Eq because RatingOutOfBounds carries the offending f64.
#[derive(Debug, PartialEq, bolero::generator::TypeGenerator, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Invalid object id {0:?}")]
    InvalidObjectId(String),

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("Empty required field {0}")]
    EmptyField(#[generator(bolero::generator::constant("name"))] &'static str),

    #[error("User {0} not found")]
    UserNotFound(UserId),

    #[error("Org {0} not found")]
    OrgNotFound(OrgId),

    #[error("Event {0} not found")]
    EventNotFound(EventId),

    #[error("Post {0} not found")]
    PostNotFound(PostId),

    #[error("Comment {0} not found")]
    CommentNotFound(ReplyId),

    #[error("Comment reply {0} not found")]
    CommentReplyNotFound(CommentReplyId),

    #[error("No account registered for email {0}")]
    EmailNotFound(String),

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("User already follows this org")]
    AlreadyFollowingOrg,

    #[error("User does not follow this org")]
    NotFollowingOrg,

    #[error("User is already interested in this event")]
    AlreadyJoinedEvent,

    #[error("User is not interested in this event")]
    NotJoinedEvent,

    #[error("Rating {0} is out of bounds")]
    RatingOutOfBounds(f64),

    #[error("User has no rating for this org")]
    NoRatingFound,

    #[error("Email already registered {0}")]
    EmailAlreadyRegistered(String),

    #[error("Password is too short")]
    PasswordTooShort,

    #[error("Age {0} is out of bounds")]
    AgeOutOfBounds(u32),
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::InvalidObjectId(_) => StatusCode::BAD_REQUEST,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
            Error::EmptyField(_) => StatusCode::BAD_REQUEST,
            Error::UserNotFound(_) => StatusCode::NOT_FOUND,
            Error::OrgNotFound(_) => StatusCode::NOT_FOUND,
            Error::EventNotFound(_) => StatusCode::NOT_FOUND,
            Error::PostNotFound(_) => StatusCode::NOT_FOUND,
            Error::CommentNotFound(_) => StatusCode::NOT_FOUND,
            Error::CommentReplyNotFound(_) => StatusCode::NOT_FOUND,
            Error::EmailNotFound(_) => StatusCode::NOT_FOUND,
            Error::IncorrectPassword => StatusCode::UNAUTHORIZED,
            Error::AlreadyFollowingOrg => StatusCode::INTERNAL_SERVER_ERROR,
            Error::NotFollowingOrg => StatusCode::INTERNAL_SERVER_ERROR,
            Error::AlreadyJoinedEvent => StatusCode::INTERNAL_SERVER_ERROR,
            Error::NotJoinedEvent => StatusCode::INTERNAL_SERVER_ERROR,
            Error::RatingOutOfBounds(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::NoRatingFound => StatusCode::INTERNAL_SERVER_ERROR,
            Error::EmailAlreadyRegistered(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PasswordTooShort => StatusCode::INTERNAL_SERVER_ERROR,
            Error::AgeOutOfBounds(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "type": "unknown",
            }),
            Error::InvalidObjectId(s) => json!({
                "message": "the provided id is not a 24-character hex string",
                "type": "invalid-object-id",
                "id": s,
            }),
            Error::NullByteInString(s) => json!({
                "message": "there was a null byte in argument string",
                "type": "null-byte",
                "string": s,
            }),
            Error::EmptyField(field) => json!({
                "message": "a required field was empty",
                "type": "empty-field",
                "field": field,
            }),
            Error::UserNotFound(u) => json!({
                "message": "User not found.",
                "type": "user-not-found",
                "userId": u,
            }),
            Error::OrgNotFound(o) => json!({
                "message": "Org not found.",
                "type": "org-not-found",
                "orgId": o,
            }),
            Error::EventNotFound(e) => json!({
                "message": "Event not found.",
                "type": "event-not-found",
                "eventId": e,
            }),
            Error::PostNotFound(p) => json!({
                "message": format!("Post with id {p} not found."),
                "type": "post-not-found",
                "postId": p,
            }),
            Error::CommentNotFound(r) => json!({
                "message": format!("Comment with id {r} not found."),
                "type": "comment-not-found",
                "replyId": r,
            }),
            Error::CommentReplyNotFound(r) => json!({
                "message": format!("Comment reply with commentReplyId {r} was not found."),
                "type": "comment-reply-not-found",
                "commentReplyId": r,
            }),
            Error::EmailNotFound(email) => json!({
                "message": "Email not found.",
                "type": "email-not-found",
                "email": email,
            }),
            Error::IncorrectPassword => json!({
                "message": "Incorrect password.",
                "type": "incorrect-password",
            }),
            Error::AlreadyFollowingOrg => json!({
                "message": "User is already following this org.",
                "type": "already-following-org",
            }),
            Error::NotFollowingOrg => json!({
                "message": "User was not following the org.",
                "type": "not-following-org",
            }),
            Error::AlreadyJoinedEvent => json!({
                "message": "User is already following this event.",
                "type": "already-joined-event",
            }),
            Error::NotJoinedEvent => json!({
                "message": "User was not following the event.",
                "type": "not-joined-event",
            }),
            Error::RatingOutOfBounds(v) => json!({
                "message": "Rating Out of Bound",
                "type": "rating-out-of-bounds",
                "value": v,
            }),
            Error::NoRatingFound => json!({
                "message": "No User Rating Found",
                "type": "no-rating-found",
            }),
            Error::EmailAlreadyRegistered(email) => json!({
                "message": "User with that email already exists.",
                "type": "conflict-email",
                "email": email,
            }),
            Error::PasswordTooShort => json!({
                "message": "Password length is less than 6!",
                "type": "password-too-short",
            }),
            Error::AgeOutOfBounds(age) => json!({
                "message": "Age out of bound",
                "type": "age-out-of-bounds",
                "age": age,
            }),
        })
        .expect("serializing error contents")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let id_field = |field: &str| {
            data.get(field)
                .and_then(|v| v.as_str())
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| anyhow!("error contents has no valid {field:?} id"))
        };
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "unknown" => Error::Unknown(String::from(
                    data.get("message")
                        .and_then(|msg| msg.as_str())
                        .unwrap_or(""),
                )),
                "invalid-object-id" => Error::InvalidObjectId(String::from(
                    data.get("id")
                        .and_then(|s| s.as_str())
                        .ok_or_else(|| anyhow!("error is about an invalid id without the id"))?,
                )),
                "null-byte" => Error::NullByteInString(String::from(
                    data.get("string").and_then(|s| s.as_str()).ok_or_else(|| {
                        anyhow!("error is a null-byte-in-string without a string")
                    })?,
                )),
                "empty-field" => Error::EmptyField(
                    match data
                        .get("field")
                        .and_then(|f| f.as_str())
                        .ok_or_else(|| anyhow!("error is an empty-field without a field"))?
                    {
                        "name" => "name",
                        "email" => "email",
                        "title" => "title",
                        "content" => "content",
                        "shorthand" => "shorthand",
                        _ => "field",
                    },
                ),
                "user-not-found" => Error::UserNotFound(UserId(id_field("userId")?)),
                "org-not-found" => Error::OrgNotFound(OrgId(id_field("orgId")?)),
                "event-not-found" => Error::EventNotFound(EventId(id_field("eventId")?)),
                "post-not-found" => Error::PostNotFound(PostId(id_field("postId")?)),
                "comment-not-found" => Error::CommentNotFound(ReplyId(id_field("replyId")?)),
                "comment-reply-not-found" => {
                    Error::CommentReplyNotFound(CommentReplyId(id_field("commentReplyId")?))
                }
                "email-not-found" => Error::EmailNotFound(String::from(
                    data.get("email")
                        .and_then(|e| e.as_str())
                        .ok_or_else(|| anyhow!("error is an unknown-email without the email"))?,
                )),
                "incorrect-password" => Error::IncorrectPassword,
                "already-following-org" => Error::AlreadyFollowingOrg,
                "not-following-org" => Error::NotFollowingOrg,
                "already-joined-event" => Error::AlreadyJoinedEvent,
                "not-joined-event" => Error::NotJoinedEvent,
                "rating-out-of-bounds" => Error::RatingOutOfBounds(
                    data.get("value")
                        .and_then(|v| v.as_f64())
                        .ok_or_else(|| anyhow!("error is a bad rating without the value"))?,
                ),
                "no-rating-found" => Error::NoRatingFound,
                "conflict-email" => Error::EmailAlreadyRegistered(String::from(
                    data.get("email")
                        .and_then(|e| e.as_str())
                        .ok_or_else(|| anyhow!("error is an email conflict without the email"))?,
                )),
                "password-too-short" => Error::PasswordTooShort,
                "age-out-of-bounds" => Error::AgeOutOfBounds(
                    data.get("age")
                        .and_then(|a| a.as_u64())
                        .and_then(|a| u32::try_from(a).ok())
                        .ok_or_else(|| anyhow!("error is a bad age without the age"))?,
                ),
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::STUB_OID;

    #[test]
    fn statuses_match_wire_contract() {
        use http::StatusCode;
        assert_eq!(
            Error::InvalidObjectId(String::from("nope")).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::UserNotFound(UserId::stub()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::IncorrectPassword.status_code(),
            StatusCode::UNAUTHORIZED
        );
        for e in [
            Error::AlreadyFollowingOrg,
            Error::NotFollowingOrg,
            Error::AlreadyJoinedEvent,
            Error::NotJoinedEvent,
            Error::RatingOutOfBounds(5.1),
            Error::NoRatingFound,
        ] {
            assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn container_and_item_messages_differ() {
        let post = Error::PostNotFound(PostId::stub()).contents();
        let comment = Error::CommentNotFound(ReplyId::stub()).contents();
        let reply = Error::CommentReplyNotFound(CommentReplyId::stub()).contents();
        let message = |body: &[u8]| {
            serde_json::from_slice::<serde_json::Value>(body).unwrap()["message"]
                .as_str()
                .unwrap()
                .to_owned()
        };
        assert_ne!(message(&post), message(&comment));
        assert_ne!(message(&comment), message(&reply));
    }

    #[test]
    fn original_wire_messages() {
        let message = |e: &Error| {
            serde_json::from_slice::<serde_json::Value>(&e.contents()).unwrap()["message"]
                .as_str()
                .unwrap()
                .to_owned()
        };
        assert_eq!(
            message(&Error::AlreadyFollowingOrg),
            "User is already following this org."
        );
        assert_eq!(
            message(&Error::NotFollowingOrg),
            "User was not following the org."
        );
        assert_eq!(message(&Error::RatingOutOfBounds(5.1)), "Rating Out of Bound");
        assert_eq!(message(&Error::NoRatingFound), "No User Rating Found");
        assert_eq!(
            message(&Error::PostNotFound(PostId(STUB_OID))),
            "Post with id ffffffffffffffffffffffff not found."
        );
    }

    #[test]
    fn fuzz_contents_parse_roundtrip() {
        bolero::check!().with_type::<Error>().for_each(|e| {
            if let Error::RatingOutOfBounds(v) = e {
                if !v.is_finite() {
                    return; // json has no representation for nan/inf
                }
            }
            let parsed = Error::parse(&e.contents()).expect("parsing generated error");
            assert_eq!(&parsed, e);
        });
    }
}
