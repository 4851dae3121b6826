use std::{fmt, str::FromStr};

use chrono::Utc;

use crate::{Error, EventId, ObjectId, Time, UserId, STUB_OID};

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
pub struct PostId(pub ObjectId);

impl PostId {
    pub fn stub() -> PostId {
        PostId(STUB_OID)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PostId {
    type Err = Error;

    fn from_str(s: &str) -> Result<PostId, Error> {
        Ok(PostId(s.parse()?))
    }
}

/// Id of a level-1 comment on a post.
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
pub struct ReplyId(pub ObjectId);

impl ReplyId {
    pub fn stub() -> ReplyId {
        ReplyId(STUB_OID)
    }
}

impl fmt::Display for ReplyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ReplyId {
    type Err = Error;

    fn from_str(s: &str) -> Result<ReplyId, Error> {
        Ok(ReplyId(s.parse()?))
    }
}

/// Id of a level-2 reply under a comment. Never usable where a [`ReplyId`]
/// is expected; the tree stops at this depth.
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
pub struct CommentReplyId(pub ObjectId);

impl CommentReplyId {
    pub fn stub() -> CommentReplyId {
        CommentReplyId(STUB_OID)
    }
}

impl fmt::Display for CommentReplyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for CommentReplyId {
    type Err = Error;

    fn from_str(s: &str) -> Result<CommentReplyId, Error> {
        Ok(CommentReplyId(s.parse()?))
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub post_id: PostId,
    pub title: String,
    pub content: String,
    pub event_id: EventId,
    pub posted_datetime: Time,
    pub liked_by: Vec<UserId>,
}

impl Post {
    pub fn new(data: NewPost) -> Post {
        Post {
            post_id: PostId(ObjectId::new()),
            title: data.title,
            content: data.content,
            event_id: data.event_id,
            posted_datetime: Utc::now(),
            liked_by: Vec::new(),
        }
    }
}

/// Stored comment. `author_id` is resolved to a display name at read time,
/// not here.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub reply_id: ReplyId,
    pub content: String,
    pub author_id: UserId,
    pub posted_datetime: Time,
    pub replies: Vec<CommentReply>,
}

impl Comment {
    pub fn new(author_id: UserId, content: String) -> Comment {
        Comment {
            reply_id: ReplyId(ObjectId::new()),
            content,
            author_id,
            posted_datetime: Utc::now(),
            replies: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentReply {
    pub comment_reply_id: CommentReplyId,
    pub content: String,
    pub author_id: UserId,
    pub posted_datetime: Time,
}

impl CommentReply {
    pub fn new(author_id: UserId, content: String) -> CommentReply {
        CommentReply {
            comment_reply_id: CommentReplyId(ObjectId::new()),
            content,
            author_id,
            posted_datetime: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub event_id: EventId,
}

impl NewPost {
    // See comments on other `validate` functions throughout agora-api
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.title)?;
        crate::validate_string(&self.content)?;
        crate::require_nonempty("title", &self.title)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub content: String,
}

impl NewComment {
    // See comments on other `validate` functions throughout agora-api
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.content)?;
        crate::require_nonempty("content", &self.content)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCreated {
    pub post_id: PostId,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreated {
    pub reply_id: ReplyId,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyCreated {
    pub comment_reply_id: CommentReplyId,
}

/// Full post as served by the single-post read: author names resolved live
/// at both comment levels. A resolved name is omitted entirely when the
/// author no longer exists.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_author_name: Option<String>,
    pub replies: Vec<CommentView>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub reply_id: ReplyId,
    pub content: String,
    pub author_id: UserId,
    pub posted_datetime: Time,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    pub replies: Vec<CommentReplyView>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentReplyView {
    pub comment_reply_id: CommentReplyId,
    pub content: String,
    pub author_id: UserId,
    pub posted_datetime: Time,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
}

/// Listing row: the raw comment subtree rides along unresolved, only the
/// post author's name is attached.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    #[serde(flatten)]
    pub post: Post,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_author_name: Option<String>,
    pub replies: Vec<Comment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_view_wire_shape() {
        let author = UserId(ObjectId([1; 12]));
        let post = Post::new(NewPost {
            title: String::from("title"),
            content: String::from("content"),
            event_id: EventId(ObjectId([2; 12])),
        });
        let comment = Comment::new(author, String::from("first"));
        let view = PostView {
            post: post.clone(),
            post_author_name: Some(String::from("Ada")),
            replies: vec![CommentView {
                reply_id: comment.reply_id,
                content: comment.content,
                author_id: comment.author_id,
                posted_datetime: comment.posted_datetime,
                author_name: None,
                replies: Vec::new(),
            }],
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["postId"], serde_json::to_value(post.post_id).unwrap());
        assert_eq!(json["postAuthorName"], "Ada");
        assert_eq!(json["replies"][0]["content"], "first");
        // unresolved author leaves no authorName key at all
        assert!(json["replies"][0].get("authorName").is_none());
    }
}
