use agora_api::{Error as ApiError, EventId, InterestedUser, Org, OrgId, UserId};

use crate::store::{add_to_set, pull, Store, UpdateResult};

/// How far a paired write got. The subject side (the user document) is
/// written first and is never rolled back when the object side fails, so a
/// failed second write leaves a half-applied edge behind. Re-running the
/// inverse operation clears it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DualWrite {
    FullyApplied,
    PartiallyApplied(RelationSide),
    Failed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RelationSide {
    Subject,
}

impl DualWrite {
    /// Classifies a finished pair. The caller has already bailed out when
    /// the subject did not match, so only the object side can be missing
    /// here.
    pub fn of(subject: UpdateResult, object: UpdateResult) -> DualWrite {
        if object.matched {
            DualWrite::FullyApplied
        } else if subject.modified {
            DualWrite::PartiallyApplied(RelationSide::Subject)
        } else {
            DualWrite::Failed
        }
    }
}

pub async fn follow_org(store: &Store, org: OrgId, user: UserId) -> Result<(), ApiError> {
    let subject = store
        .users
        .update_one(user, |u| add_to_set(&mut u.following_orgs, org))
        .await;
    if !subject.matched {
        return Err(ApiError::UserNotFound(user));
    }
    let object = store
        .orgs
        .update_one(org, |o| add_to_set(&mut o.followers, user))
        .await;
    if let DualWrite::PartiallyApplied(side) = DualWrite::of(subject, object) {
        tracing::warn!(%org, %user, ?side, "follow left a half-applied edge");
    }
    if !object.matched {
        return Err(ApiError::OrgNotFound(org));
    }
    if !object.modified {
        return Err(ApiError::AlreadyFollowingOrg);
    }
    Ok(())
}

pub async fn unfollow_org(store: &Store, org: OrgId, user: UserId) -> Result<(), ApiError> {
    let subject = store
        .users
        .update_one(user, |u| pull(&mut u.following_orgs, &org))
        .await;
    if !subject.matched {
        return Err(ApiError::UserNotFound(user));
    }
    let object = store
        .orgs
        .update_one(org, |o| pull(&mut o.followers, &user))
        .await;
    if let DualWrite::PartiallyApplied(side) = DualWrite::of(subject, object) {
        tracing::warn!(%org, %user, ?side, "unfollow left a half-applied edge");
    }
    if !object.matched {
        return Err(ApiError::OrgNotFound(org));
    }
    if !object.modified {
        return Err(ApiError::NotFollowingOrg);
    }
    Ok(())
}

pub async fn join_event(store: &Store, event: EventId, user: UserId) -> Result<(), ApiError> {
    let subject = store
        .users
        .update_one(user, |u| add_to_set(&mut u.interested_event_history, event))
        .await;
    if !subject.matched {
        return Err(ApiError::UserNotFound(user));
    }
    // The display name is read after the subject write, and the snapshot it
    // feeds is matched by user id only, so a later rename neither blocks the
    // join nor rewrites the event document.
    let name = match store.users.find_one(user).await {
        Some(u) => u.name,
        None => return Err(ApiError::UserNotFound(user)),
    };
    let object = store
        .events
        .update_one(event, |e| {
            if e.users_interested.iter().any(|i| i.user_id == user) {
                return false;
            }
            e.users_interested.push(InterestedUser {
                user_id: user,
                name,
            });
            true
        })
        .await;
    if let DualWrite::PartiallyApplied(side) = DualWrite::of(subject, object) {
        tracing::warn!(%event, %user, ?side, "event join left a half-applied edge");
    }
    if !object.matched {
        return Err(ApiError::EventNotFound(event));
    }
    if !object.modified {
        return Err(ApiError::AlreadyJoinedEvent);
    }
    Ok(())
}

pub async fn leave_event(store: &Store, event: EventId, user: UserId) -> Result<(), ApiError> {
    let subject = store
        .users
        .update_one(user, |u| pull(&mut u.interested_event_history, &event))
        .await;
    if !subject.matched {
        return Err(ApiError::UserNotFound(user));
    }
    let object = store
        .events
        .update_one(event, |e| {
            let before = e.users_interested.len();
            e.users_interested.retain(|i| i.user_id != user);
            e.users_interested.len() != before
        })
        .await;
    if let DualWrite::PartiallyApplied(side) = DualWrite::of(subject, object) {
        tracing::warn!(%event, %user, ?side, "event leave left a half-applied edge");
    }
    if !object.matched {
        return Err(ApiError::EventNotFound(event));
    }
    if !object.modified {
        return Err(ApiError::NotJoinedEvent);
    }
    Ok(())
}

/// Cascade for org deletion: pulls the org out of every member's
/// `following_orgs`. Members whose user document is gone are only logged,
/// the org itself is already deleted at this point.
pub async fn scrub_org_from_members(store: &Store, org: OrgId, doc: &Org) {
    let members = doc.member_ids();
    let missing = store
        .users
        .update_many(&members, |u| {
            pull(&mut u.following_orgs, &org);
        })
        .await;
    if !missing.is_empty() {
        tracing::warn!(%org, ?missing, "org members without user documents during cascade");
    }
}
