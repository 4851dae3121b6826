use std::sync::Arc;

use agora_api::{
    Error as ApiError, Event, EventCreated, EventId, EventPatch, HostedEvent, NewEvent, UserId,
    Visibility,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    error::Error,
    notify::Notifier,
    relations,
    store::{add_to_set, Store},
};

pub async fn create_event(
    State(store): State<Arc<Store>>,
    State(notifier): State<Notifier>,
    Json(data): Json<NewEvent>,
) -> Result<(StatusCode, Json<EventCreated>), Error> {
    data.validate()?;
    // the interest snapshot needs the creator's current name, so the creator
    // has to exist up front
    let creator = store
        .users
        .find_one(data.created_by)
        .await
        .ok_or(ApiError::UserNotFound(data.created_by))?;
    let event = Event::new(data, creator.name);
    let event_id = event.event_id;
    store.events.insert_one(event_id, event.clone()).await;

    store
        .users
        .update_one(event.created_by, |u| {
            u.hosted_events.push(event_id);
            add_to_set(&mut u.interested_event_history, event_id);
            true
        })
        .await;
    let org = store
        .orgs
        .update_one(event.belongs_to_org, |o| {
            o.last_active = Utc::now();
            add_to_set(&mut o.events, event_id)
        })
        .await;
    if !org.matched {
        tracing::warn!(%event_id, org = %event.belongs_to_org, "event created for unknown org");
    }

    notifier.spawn_new_event(&store, &event);
    Ok((StatusCode::CREATED, Json(EventCreated { event_id })))
}

/// Public events only; private ones are reachable by id but never listed.
pub async fn list_events(State(store): State<Arc<Store>>) -> Result<Json<Vec<Event>>, Error> {
    Ok(Json(
        store
            .events
            .find_all(|e| e.visibility == Visibility::Public)
            .await,
    ))
}

pub async fn get_event(
    State(store): State<Arc<Store>>,
    Path(event_id): Path<String>,
) -> Result<Json<Event>, Error> {
    let event_id: EventId = event_id.parse()?;
    let event = store
        .events
        .find_one(event_id)
        .await
        .ok_or(ApiError::EventNotFound(event_id))?;
    Ok(Json(event))
}

pub async fn user_events(
    State(store): State<Arc<Store>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<HostedEvent>>, Error> {
    let user_id: UserId = user_id.parse()?;
    let events = store
        .events
        .read_with(|events| {
            events
                .values()
                .filter(|e| e.created_by == user_id)
                .map(|e| HostedEvent {
                    event_id: e.event_id,
                    title: e.title.clone(),
                    category: e.category.clone(),
                    users_interested: e.users_interested.clone(),
                })
                .collect()
        })
        .await;
    Ok(Json(events))
}

pub async fn update_event(
    State(store): State<Arc<Store>>,
    Path(event_id): Path<String>,
    Json(data): Json<EventPatch>,
) -> Result<Json<&'static str>, Error> {
    data.validate()?;
    let event_id: EventId = event_id.parse()?;
    let result = store
        .events
        .update_one(event_id, |e| {
            if let Some(title) = data.title {
                e.title = title;
            }
            if let Some(description) = data.description {
                e.description = description;
            }
            if let Some(category) = data.category {
                e.category = category;
            }
            if let Some(location) = data.location {
                e.location = location;
            }
            if let Some(start) = data.event_start_datetime {
                e.event_start_datetime = start;
            }
            if let Some(end) = data.event_end_datetime {
                e.event_end_datetime = end;
            }
            if let Some(capacity) = data.capacity {
                e.capacity = capacity;
            }
            if let Some(visibility) = data.visibility {
                e.visibility = visibility;
            }
            true
        })
        .await;
    if !result.matched {
        return Err(ApiError::EventNotFound(event_id).into());
    }
    Ok(Json("Event updated successfully."))
}

/// Deletes the event document only. Interest history entries and org event
/// lists keep the dangling id; readers drop ids they cannot resolve.
pub async fn delete_event(
    State(store): State<Arc<Store>>,
    Path(event_id): Path<String>,
) -> Result<Json<&'static str>, Error> {
    let event_id: EventId = event_id.parse()?;
    store
        .events
        .delete_one(event_id)
        .await
        .ok_or(ApiError::EventNotFound(event_id))?;
    Ok(Json("Event deleted."))
}

pub async fn follow_event(
    State(store): State<Arc<Store>>,
    Path((event_id, user_id)): Path<(String, String)>,
) -> Result<Json<&'static str>, Error> {
    let event_id: EventId = event_id.parse()?;
    let user_id: UserId = user_id.parse()?;
    relations::join_event(&store, event_id, user_id).await?;
    Ok(Json("User is now following the event."))
}

pub async fn unfollow_event(
    State(store): State<Arc<Store>>,
    Path((event_id, user_id)): Path<(String, String)>,
) -> Result<Json<&'static str>, Error> {
    let event_id: EventId = event_id.parse()?;
    let user_id: UserId = user_id.parse()?;
    relations::leave_event(&store, event_id, user_id).await?;
    Ok(Json("User is no longer following the event."))
}
