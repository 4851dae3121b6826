use std::sync::Arc;

use agora_api::{
    Credentials, Error as ApiError, EventSummary, NewUser, NotifsPatch, OrgHeader, Session, User,
    UserId, UserPatch,
};
use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{error::Error, store::Store};

pub async fn register(
    State(store): State<Arc<Store>>,
    Json(data): Json<NewUser>,
) -> Result<(StatusCode, Json<Session>), Error> {
    data.validate()?;
    let hash = bcrypt::hash(&data.password, bcrypt::DEFAULT_COST).context("hashing password")?;
    let user = User::new(data.name, data.email, hash, data.age);
    let session = Session {
        user_id: user.user_id,
        name: user.name.clone(),
    };
    let email = user.login.email.clone();
    let inserted = store
        .users
        .insert_one_unique(user.user_id, user, |u| u.login.email == email)
        .await;
    if !inserted {
        return Err(ApiError::EmailAlreadyRegistered(email).into());
    }
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(
    State(store): State<Arc<Store>>,
    Json(data): Json<Credentials>,
) -> Result<Json<Session>, Error> {
    data.validate()?;
    let email = data.email.to_lowercase();
    let found = store
        .users
        .read_with(|users| {
            users
                .values()
                .find(|u| u.login.email == email)
                .map(|u| (u.user_id, u.name.clone(), u.login.password.clone()))
        })
        .await;
    let (user_id, name, hash) = found.ok_or(ApiError::EmailNotFound(email))?;
    if !bcrypt::verify(&data.password, &hash).context("verifying password")? {
        return Err(ApiError::IncorrectPassword.into());
    }
    Ok(Json(Session { user_id, name }))
}

pub async fn get_user(
    State(store): State<Arc<Store>>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, Error> {
    let user_id: UserId = user_id.parse()?;
    let user = store
        .users
        .find_one(user_id)
        .await
        .ok_or(ApiError::UserNotFound(user_id))?;
    Ok(Json(user))
}

/// Orgs the user follows, joined through the forward edge on the user
/// document. An unknown user comes out the same as one following nothing.
pub async fn user_orgs(
    State(store): State<Arc<Store>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<OrgHeader>>, Error> {
    let user_id: UserId = user_id.parse()?;
    let following = store
        .users
        .find_one(user_id)
        .await
        .map(|u| u.following_orgs)
        .unwrap_or_default();
    let orgs = store
        .orgs
        .read_with(|orgs| {
            following
                .iter()
                .filter_map(|id| orgs.get(id))
                .map(|o| OrgHeader {
                    org_id: o.org_id,
                    name: o.name.clone(),
                    shorthand: o.shorthand.clone(),
                })
                .collect()
        })
        .await;
    Ok(Json(orgs))
}

pub async fn attended_events(
    State(store): State<Arc<Store>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<EventSummary>>, Error> {
    let user_id: UserId = user_id.parse()?;
    let user = store
        .users
        .find_one(user_id)
        .await
        .ok_or(ApiError::UserNotFound(user_id))?;
    let events = store
        .events
        .read_with(|events| {
            user.interested_event_history
                .iter()
                .filter_map(|id| events.get(id))
                .map(|e| EventSummary {
                    event_id: e.event_id,
                    title: e.title.clone(),
                    category: e.category.clone(),
                })
                .collect()
        })
        .await;
    Ok(Json(events))
}

pub async fn edit_user(
    State(store): State<Arc<Store>>,
    Path(user_id): Path<String>,
    Json(data): Json<UserPatch>,
) -> Result<Json<&'static str>, Error> {
    data.validate()?;
    let user_id: UserId = user_id.parse()?;
    let result = store
        .users
        .update_one(user_id, |u| {
            u.name = data.name;
            u.age = data.age;
            true
        })
        .await;
    if !result.matched {
        return Err(ApiError::UserNotFound(user_id).into());
    }
    Ok(Json("Profile updated for user."))
}

pub async fn update_notifs(
    State(store): State<Arc<Store>>,
    Path(user_id): Path<String>,
    Json(data): Json<NotifsPatch>,
) -> Result<Json<&'static str>, Error> {
    let user_id: UserId = user_id.parse()?;
    let result = store
        .users
        .update_one(user_id, |u| {
            u.email_notifs.new_event_by_org = data.new_event_by_org;
            u.email_notifs.new_post_for_event = data.new_post_for_event;
            u.email_notifs.upcoming_events = data.upcoming_events;
            true
        })
        .await;
    if !result.matched {
        return Err(ApiError::UserNotFound(user_id).into());
    }
    Ok(Json("Notification preferences updated."))
}
