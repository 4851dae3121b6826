use std::collections::BTreeMap;

use agora_api::{
    Comment, CommentReply, CommentReplyId, CommentReplyView, CommentView, Error as ApiError,
    EventId, Post, PostId, PostSummary, PostView, ReplyId, UserId,
};
use tokio::sync::RwLock;

use crate::store::Store;

/// Posts and their two comment levels, every node addressable by its own id.
///
/// Comments live in their own index with a back-reference to the post they
/// belong to; level-2 replies stay embedded in their comment. Lookups always
/// go container first, then item, so "post missing" and "comment missing"
/// stay separate answers. Level-2 ids are not in the comment index at all,
/// which is what keeps a reply from ever being treated as a comment.
pub struct PostArena(RwLock<Arena>);

#[derive(Default)]
struct Arena {
    posts: BTreeMap<PostId, PostSlot>,
    comments: BTreeMap<ReplyId, CommentSlot>,
    next_seq: u64,
}

struct PostSlot {
    author: UserId,
    seq: u64,
    post: Post,
}

struct CommentSlot {
    post: PostId,
    seq: u64,
    comment: Comment,
}

impl PostArena {
    pub fn new() -> PostArena {
        PostArena(RwLock::new(Arena::default()))
    }

    pub async fn add_post(&self, author: UserId, post: Post) -> PostId {
        let mut arena = self.0.write().await;
        let id = post.post_id;
        let seq = arena.next_seq;
        arena.next_seq += 1;
        arena.posts.insert(id, PostSlot { author, seq, post });
        id
    }

    /// Scoped to the author: someone else's post id answers "not found", it
    /// never deletes. Dropping the post drops its whole comment subtree.
    pub async fn remove_post(&self, author: UserId, post_id: PostId) -> Result<(), ApiError> {
        let mut arena = self.0.write().await;
        let authored = arena
            .posts
            .get(&post_id)
            .map_or(false, |slot| slot.author == author);
        if !authored {
            return Err(ApiError::PostNotFound(post_id));
        }
        arena.posts.remove(&post_id);
        arena.comments.retain(|_, slot| slot.post != post_id);
        Ok(())
    }

    /// Likes toggle: present pulls, absent pushes. Returns the resulting
    /// list of likers.
    pub async fn toggle_like(&self, post_id: PostId, user: UserId) -> Result<Vec<UserId>, ApiError> {
        let mut arena = self.0.write().await;
        match arena.posts.get_mut(&post_id) {
            None => Err(ApiError::PostNotFound(post_id)),
            Some(slot) => {
                if !crate::store::pull(&mut slot.post.liked_by, &user) {
                    slot.post.liked_by.push(user);
                }
                Ok(slot.post.liked_by.clone())
            }
        }
    }

    pub async fn add_comment(&self, post_id: PostId, comment: Comment) -> Result<ReplyId, ApiError> {
        let mut arena = self.0.write().await;
        if !arena.posts.contains_key(&post_id) {
            return Err(ApiError::PostNotFound(post_id));
        }
        let id = comment.reply_id;
        let seq = arena.next_seq;
        arena.next_seq += 1;
        arena.comments.insert(
            id,
            CommentSlot {
                post: post_id,
                seq,
                comment,
            },
        );
        Ok(id)
    }

    /// Two stages on purpose: the post has to exist before we even look at
    /// the comment index, and the comment has to belong to that post.
    pub async fn remove_comment(&self, post_id: PostId, reply_id: ReplyId) -> Result<(), ApiError> {
        let mut arena = self.0.write().await;
        if !arena.posts.contains_key(&post_id) {
            return Err(ApiError::PostNotFound(post_id));
        }
        match arena.comments.get(&reply_id) {
            Some(slot) if slot.post == post_id => (),
            _ => return Err(ApiError::CommentNotFound(reply_id)),
        }
        arena.comments.remove(&reply_id);
        Ok(())
    }

    pub async fn add_reply(
        &self,
        reply_id: ReplyId,
        reply: CommentReply,
    ) -> Result<CommentReplyId, ApiError> {
        let mut arena = self.0.write().await;
        match arena.comments.get_mut(&reply_id) {
            None => Err(ApiError::CommentNotFound(reply_id)),
            Some(slot) => {
                let id = reply.comment_reply_id;
                slot.comment.replies.push(reply);
                Ok(id)
            }
        }
    }

    pub async fn remove_reply(
        &self,
        reply_id: ReplyId,
        comment_reply_id: CommentReplyId,
    ) -> Result<(), ApiError> {
        let mut arena = self.0.write().await;
        let slot = match arena.comments.get_mut(&reply_id) {
            None => return Err(ApiError::CommentNotFound(reply_id)),
            Some(slot) => slot,
        };
        let before = slot.comment.replies.len();
        slot.comment
            .replies
            .retain(|r| r.comment_reply_id != comment_reply_id);
        if slot.comment.replies.len() == before {
            return Err(ApiError::CommentReplyNotFound(comment_reply_id));
        }
        Ok(())
    }

    /// One post with its comments in posting order.
    pub async fn snapshot(&self, post_id: PostId) -> Option<(UserId, Post, Vec<Comment>)> {
        let arena = self.0.read().await;
        let slot = arena.posts.get(&post_id)?;
        let mut comments: Vec<&CommentSlot> = arena
            .comments
            .values()
            .filter(|c| c.post == post_id)
            .collect();
        comments.sort_by_key(|c| c.seq);
        Some((
            slot.author,
            slot.post.clone(),
            comments.into_iter().map(|c| c.comment.clone()).collect(),
        ))
    }

    pub async fn all(&self) -> Vec<(UserId, Post, Vec<Comment>)> {
        self.collect(|_| true).await
    }

    pub async fn by_author(&self, author: UserId) -> Vec<(UserId, Post, Vec<Comment>)> {
        self.collect(|slot| slot.author == author).await
    }

    pub async fn for_events(&self, events: &[EventId]) -> Vec<(UserId, Post, Vec<Comment>)> {
        self.collect(|slot| events.contains(&slot.post.event_id)).await
    }

    async fn collect(&self, filter: impl Fn(&PostSlot) -> bool) -> Vec<(UserId, Post, Vec<Comment>)> {
        let arena = self.0.read().await;
        let mut posts: Vec<&PostSlot> = arena.posts.values().filter(|s| filter(s)).collect();
        posts.sort_by_key(|s| s.seq);
        posts
            .into_iter()
            .map(|slot| {
                let mut comments: Vec<&CommentSlot> = arena
                    .comments
                    .values()
                    .filter(|c| c.post == slot.post.post_id)
                    .collect();
                comments.sort_by_key(|c| c.seq);
                (
                    slot.author,
                    slot.post.clone(),
                    comments.into_iter().map(|c| c.comment.clone()).collect(),
                )
            })
            .collect()
    }
}

/// Single-post read. Author names at both levels are resolved from the
/// users collection at read time, never from a stored snapshot; a rename
/// shows up on the next read and a deleted author resolves to no name at
/// all rather than a stale one.
pub async fn post_view(store: &Store, post_id: PostId) -> Result<PostView, ApiError> {
    let (author, post, comments) = store
        .posts
        .snapshot(post_id)
        .await
        .ok_or(ApiError::PostNotFound(post_id))?;

    store
        .users
        .read_with(|users| {
            let name_of = |id: &UserId| users.get(id).map(|u| u.name.clone());
            let replies = comments
                .into_iter()
                .map(|c| CommentView {
                    reply_id: c.reply_id,
                    content: c.content,
                    author_name: name_of(&c.author_id),
                    author_id: c.author_id,
                    posted_datetime: c.posted_datetime,
                    replies: c
                        .replies
                        .into_iter()
                        .map(|r| CommentReplyView {
                            comment_reply_id: r.comment_reply_id,
                            content: r.content,
                            author_name: name_of(&r.author_id),
                            author_id: r.author_id,
                            posted_datetime: r.posted_datetime,
                        })
                        .collect(),
                })
                .collect();
            Ok(PostView {
                post_author_name: name_of(&author),
                post,
                replies,
            })
        })
        .await
}

/// Listing rows: the post author resolves, comment subtrees ship raw.
pub async fn summarize(
    store: &Store,
    rows: Vec<(UserId, Post, Vec<Comment>)>,
) -> Vec<PostSummary> {
    store
        .users
        .read_with(|users| {
            rows.into_iter()
                .map(|(author, post, replies)| PostSummary {
                    post_author_name: users.get(&author).map(|u| u.name.clone()),
                    post,
                    replies,
                })
                .collect()
        })
        .await
}
