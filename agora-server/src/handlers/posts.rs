use std::sync::Arc;

use agora_api::{
    Comment, CommentCreated, CommentReply, CommentReplyId, Error as ApiError, NewComment,
    NewPost, OrgId, Post, PostCreated, PostId, PostSummary, PostView, ReplyCreated, ReplyId,
    UserId,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{comments, error::Error, notify::Notifier, store::Store};

pub async fn create_post(
    State(store): State<Arc<Store>>,
    State(notifier): State<Notifier>,
    Path(user_id): Path<String>,
    Json(data): Json<NewPost>,
) -> Result<(StatusCode, Json<PostCreated>), Error> {
    data.validate()?;
    let user_id: UserId = user_id.parse()?;
    let author = store
        .users
        .find_one(user_id)
        .await
        .ok_or(ApiError::UserNotFound(user_id))?;
    let post = Post::new(data);
    let post_id = store.posts.add_post(user_id, post.clone()).await;
    notifier.spawn_new_post(&store, &post, author.name);
    Ok((StatusCode::CREATED, Json(PostCreated { post_id })))
}

pub async fn list_posts(State(store): State<Arc<Store>>) -> Result<Json<Vec<PostSummary>>, Error> {
    let rows = store.posts.all().await;
    Ok(Json(comments::summarize(&store, rows).await))
}

pub async fn get_post(
    State(store): State<Arc<Store>>,
    Path(post_id): Path<String>,
) -> Result<Json<PostView>, Error> {
    let post_id: PostId = post_id.parse()?;
    Ok(Json(comments::post_view(&store, post_id).await?))
}

pub async fn user_posts(
    State(store): State<Arc<Store>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<PostSummary>>, Error> {
    let user_id: UserId = user_id.parse()?;
    let rows = store.posts.by_author(user_id).await;
    Ok(Json(comments::summarize(&store, rows).await))
}

/// Posts under any of the org's events.
pub async fn org_posts(
    State(store): State<Arc<Store>>,
    Path(org_id): Path<String>,
) -> Result<Json<Vec<PostSummary>>, Error> {
    let org_id: OrgId = org_id.parse()?;
    let org = store
        .orgs
        .find_one(org_id)
        .await
        .ok_or(ApiError::OrgNotFound(org_id))?;
    let rows = store.posts.for_events(&org.events).await;
    Ok(Json(comments::summarize(&store, rows).await))
}

pub async fn delete_post(
    State(store): State<Arc<Store>>,
    Path((user_id, post_id)): Path<(String, String)>,
) -> Result<Json<&'static str>, Error> {
    let user_id: UserId = user_id.parse()?;
    let post_id: PostId = post_id.parse()?;
    store.posts.remove_post(user_id, post_id).await?;
    Ok(Json("Post deleted successfully."))
}

pub async fn like_post(
    State(store): State<Arc<Store>>,
    Path((post_id, user_id)): Path<(String, String)>,
) -> Result<Json<Vec<UserId>>, Error> {
    let post_id: PostId = post_id.parse()?;
    let user_id: UserId = user_id.parse()?;
    Ok(Json(store.posts.toggle_like(post_id, user_id).await?))
}

pub async fn comment_post(
    State(store): State<Arc<Store>>,
    Path((post_id, user_id)): Path<(String, String)>,
    Json(data): Json<NewComment>,
) -> Result<Json<CommentCreated>, Error> {
    data.validate()?;
    let post_id: PostId = post_id.parse()?;
    let user_id: UserId = user_id.parse()?;
    let reply_id = store
        .posts
        .add_comment(post_id, Comment::new(user_id, data.content))
        .await?;
    Ok(Json(CommentCreated { reply_id }))
}

pub async fn uncomment_post(
    State(store): State<Arc<Store>>,
    Path((post_id, reply_id)): Path<(String, String)>,
) -> Result<Json<&'static str>, Error> {
    let post_id: PostId = post_id.parse()?;
    let reply_id: ReplyId = reply_id.parse()?;
    store.posts.remove_comment(post_id, reply_id).await?;
    Ok(Json("Comment removed successfully"))
}

pub async fn reply_to_comment(
    State(store): State<Arc<Store>>,
    Path((reply_id, user_id)): Path<(String, String)>,
    Json(data): Json<NewComment>,
) -> Result<Json<ReplyCreated>, Error> {
    data.validate()?;
    let reply_id: ReplyId = reply_id.parse()?;
    let user_id: UserId = user_id.parse()?;
    let comment_reply_id = store
        .posts
        .add_reply(reply_id, CommentReply::new(user_id, data.content))
        .await?;
    Ok(Json(ReplyCreated { comment_reply_id }))
}

pub async fn delete_comment_reply(
    State(store): State<Arc<Store>>,
    Path((reply_id, comment_reply_id)): Path<(String, String)>,
) -> Result<Json<&'static str>, Error> {
    let reply_id: ReplyId = reply_id.parse()?;
    let comment_reply_id: CommentReplyId = comment_reply_id.parse()?;
    store.posts.remove_reply(reply_id, comment_reply_id).await?;
    Ok(Json("Comment reply was removed from the comment successfully."))
}
