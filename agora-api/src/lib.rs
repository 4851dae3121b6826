mod error;
pub use error::Error;

mod oid;
pub use oid::{ObjectId, STUB_OID};

mod user;
pub use user::{
    Credentials, EmailNotifs, Login, NewUser, NotifsPatch, Session, User, UserId, UserPatch,
};

mod org;
pub use org::{
    normalize_rating, ContactInfo, Member, NewOrg, NewRating, Org, OrgCreated, OrgHeader, OrgId,
    OrgPatch, OrgView, Rating, Ratings, Upsert, RATING_MAX, RATING_MIN,
};

mod event;
pub use event::{
    Event, EventCreated, EventId, EventPatch, EventSummary, HostedEvent, InterestedUser, NewEvent,
    Visibility,
};

mod post;
pub use post::{
    Comment, CommentCreated, CommentReply, CommentReplyId, CommentReplyView, CommentView,
    NewComment, NewPost, Post, PostCreated, PostId, PostSummary, PostView, ReplyCreated, ReplyId,
};

pub type Time = chrono::DateTime<chrono::Utc>;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_AGE: u32 = 1;
pub const MAX_AGE: u32 = 100;

// The `validate` functions are run by the server on every payload before it
// touches the store. They only reject input no honest client ever produces;
// per-route domain rules live with the handlers, not here.
pub fn validate_string(s: &str) -> Result<(), Error> {
    if s.contains('\0') {
        return Err(Error::NullByteInString(String::from(s)));
    }
    Ok(())
}

pub fn require_nonempty(field: &'static str, s: &str) -> Result<(), Error> {
    if s.is_empty() {
        return Err(Error::EmptyField(field));
    }
    Ok(())
}

pub fn validate_age(age: u32) -> Result<(), Error> {
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(Error::AgeOutOfBounds(age));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_validation() {
        assert_eq!(validate_string("hello"), Ok(()));
        assert_eq!(validate_string(""), Ok(()));
        assert_eq!(
            validate_string("he\0llo"),
            Err(Error::NullByteInString(String::from("he\0llo")))
        );
    }

    #[test]
    fn age_validation() {
        assert_eq!(validate_age(1), Ok(()));
        assert_eq!(validate_age(100), Ok(()));
        assert_eq!(validate_age(0), Err(Error::AgeOutOfBounds(0)));
        assert_eq!(validate_age(101), Err(Error::AgeOutOfBounds(101)));
    }
}
