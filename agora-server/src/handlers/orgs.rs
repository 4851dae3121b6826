use std::sync::Arc;

use agora_api::{
    Error as ApiError, Member, NewOrg, NewRating, Org, OrgCreated, OrgId, OrgPatch, OrgView,
    UserId,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    error::Error,
    ratings, relations,
    store::{add_to_set, Store},
};

pub async fn create_org(
    State(store): State<Arc<Store>>,
    Json(data): Json<NewOrg>,
) -> Result<(StatusCode, Json<OrgCreated>), Error> {
    data.validate()?;
    let org = Org::new(data);
    let (org_id, owner) = (org.org_id, org.owner);
    store.orgs.insert_one(org_id, org).await;
    let result = store
        .users
        .update_one(owner, |u| add_to_set(&mut u.following_orgs, org_id))
        .await;
    if !result.matched {
        tracing::warn!(%org_id, %owner, "org created by unknown user");
    }
    Ok((StatusCode::CREATED, Json(OrgCreated { org_id })))
}

pub async fn list_orgs(State(store): State<Arc<Store>>) -> Result<Json<Vec<Org>>, Error> {
    Ok(Json(store.orgs.find_all(|_| true).await))
}

pub async fn get_org(
    State(store): State<Arc<Store>>,
    Path(org_id): Path<String>,
) -> Result<Json<OrgView>, Error> {
    let org_id: OrgId = org_id.parse()?;
    let org = store
        .orgs
        .find_one(org_id)
        .await
        .ok_or(ApiError::OrgNotFound(org_id))?;
    let events = store
        .events
        .read_with(|events| {
            org.events
                .iter()
                .filter_map(|id| events.get(id).cloned())
                .collect()
        })
        .await;
    Ok(Json(OrgView::assemble(org, events)))
}

/// Owner, contributors and followers as one deduplicated name list. Members
/// whose user document is gone are skipped.
pub async fn org_members(
    State(store): State<Arc<Store>>,
    Path(org_id): Path<String>,
) -> Result<Json<Vec<Member>>, Error> {
    let org_id: OrgId = org_id.parse()?;
    let org = store
        .orgs
        .find_one(org_id)
        .await
        .ok_or(ApiError::OrgNotFound(org_id))?;
    let members = store
        .users
        .read_with(|users| {
            org.member_ids()
                .into_iter()
                .filter_map(|id| users.get(&id))
                .map(|u| Member {
                    name: u.name.clone(),
                })
                .collect()
        })
        .await;
    Ok(Json(members))
}

pub async fn orgs_owned_by(
    State(store): State<Arc<Store>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Org>>, Error> {
    let user_id: UserId = user_id.parse()?;
    Ok(Json(store.orgs.find_all(|o| o.owner == user_id).await))
}

/// Reverse-edge listing: answered from org follower lists, not from the
/// user document's forward edges.
pub async fn orgs_followed_by(
    State(store): State<Arc<Store>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Org>>, Error> {
    let user_id: UserId = user_id.parse()?;
    Ok(Json(
        store
            .orgs
            .find_all(|o| o.followers.contains(&user_id))
            .await,
    ))
}

pub async fn update_org(
    State(store): State<Arc<Store>>,
    Path(org_id): Path<String>,
    Json(data): Json<OrgPatch>,
) -> Result<Json<&'static str>, Error> {
    data.validate()?;
    let org_id: OrgId = org_id.parse()?;
    let result = store
        .orgs
        .update_one(org_id, |o| {
            if let Some(name) = data.name {
                o.name = name;
            }
            if let Some(shorthand) = data.shorthand {
                o.shorthand = shorthand;
            }
            if let Some(bio) = data.bio {
                o.bio = bio;
            }
            if let Some(email) = data.email {
                o.contact_info.email = email;
            }
            o.last_active = Utc::now();
            true
        })
        .await;
    if !result.matched {
        return Err(ApiError::OrgNotFound(org_id).into());
    }
    Ok(Json("Org updated successfully."))
}

pub async fn delete_org(
    State(store): State<Arc<Store>>,
    Path(org_id): Path<String>,
) -> Result<Json<&'static str>, Error> {
    let org_id: OrgId = org_id.parse()?;
    let org = store
        .orgs
        .delete_one(org_id)
        .await
        .ok_or(ApiError::OrgNotFound(org_id))?;
    relations::scrub_org_from_members(&store, org_id, &org).await;
    Ok(Json("Org deleted."))
}

pub async fn follow_org(
    State(store): State<Arc<Store>>,
    Path((org_id, user_id)): Path<(String, String)>,
) -> Result<Json<&'static str>, Error> {
    let org_id: OrgId = org_id.parse()?;
    let user_id: UserId = user_id.parse()?;
    relations::follow_org(&store, org_id, user_id).await?;
    Ok(Json("User is now following the org."))
}

pub async fn unfollow_org(
    State(store): State<Arc<Store>>,
    Path((org_id, user_id)): Path<(String, String)>,
) -> Result<Json<&'static str>, Error> {
    let org_id: OrgId = org_id.parse()?;
    let user_id: UserId = user_id.parse()?;
    relations::unfollow_org(&store, org_id, user_id).await?;
    Ok(Json("User is no longer following the org."))
}

pub async fn rate_org(
    State(store): State<Arc<Store>>,
    Path((org_id, user_id)): Path<(String, String)>,
    Json(data): Json<NewRating>,
) -> Result<Json<&'static str>, Error> {
    let org_id: OrgId = org_id.parse()?;
    let user_id: UserId = user_id.parse()?;
    ratings::rate_org(&store, org_id, user_id, data.value).await?;
    Ok(Json("Updated Rating"))
}

pub async fn unrate_org(
    State(store): State<Arc<Store>>,
    Path((org_id, user_id)): Path<(String, String)>,
) -> Result<Json<&'static str>, Error> {
    let org_id: OrgId = org_id.parse()?;
    let user_id: UserId = user_id.parse()?;
    ratings::unrate_org(&store, org_id, user_id).await?;
    Ok(Json("Removed Rating"))
}
