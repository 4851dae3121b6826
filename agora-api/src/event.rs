use std::{fmt, str::FromStr};

use chrono::Utc;

use crate::{Error, ObjectId, OrgId, Time, UserId, STUB_OID};

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
pub struct EventId(pub ObjectId);

impl EventId {
    pub fn stub() -> EventId {
        EventId(STUB_OID)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EventId {
    type Err = Error;

    fn from_str(s: &str) -> Result<EventId, Error> {
        Ok(EventId(s.parse()?))
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_id: EventId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub event_start_datetime: Time,
    pub event_end_datetime: Time,
    /// None means unlimited.
    pub capacity: Option<u32>,
    /// Display names here are snapshots taken when the user joined; they are
    /// deliberately not refreshed when the user renames. Comment authors
    /// elsewhere resolve live instead.
    pub users_interested: Vec<InterestedUser>,
    pub visibility: Visibility,
    pub belongs_to_org: OrgId,
    pub created_by: UserId,
    pub created_datetime: Time,
}

impl Event {
    /// The creator starts out interested in their own event, under the name
    /// they carried at creation time.
    pub fn new(data: NewEvent, creator_name: String) -> Event {
        Event {
            event_id: EventId(ObjectId::new()),
            title: data.title,
            description: data.description,
            category: data.category,
            location: data.location,
            event_start_datetime: data.event_start_datetime,
            event_end_datetime: data.event_end_datetime,
            capacity: data.capacity,
            users_interested: vec![InterestedUser {
                user_id: data.created_by,
                name: creator_name,
            }],
            visibility: data.visibility,
            belongs_to_org: data.belongs_to_org,
            created_by: data.created_by,
            created_datetime: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestedUser {
    pub user_id: UserId,
    pub name: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub location: String,
    pub event_start_datetime: Time,
    pub event_end_datetime: Time,
    #[serde(default)]
    pub capacity: Option<u32>,
    pub visibility: Visibility,
    pub belongs_to_org: OrgId,
    pub created_by: UserId,
}

impl NewEvent {
    // See comments on other `validate` functions throughout agora-api
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.title)?;
        crate::validate_string(&self.description)?;
        crate::validate_string(&self.category)?;
        crate::validate_string(&self.location)?;
        crate::require_nonempty("title", &self.title)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub event_start_datetime: Option<Time>,
    pub event_end_datetime: Option<Time>,
    pub capacity: Option<Option<u32>>,
    pub visibility: Option<Visibility>,
}

impl EventPatch {
    // See comments on other `validate` functions throughout agora-api
    pub fn validate(&self) -> Result<(), Error> {
        for s in [
            &self.title,
            &self.description,
            &self.category,
            &self.location,
        ]
        .into_iter()
        .flatten()
        {
            crate::validate_string(s)?;
        }
        if let Some(title) = &self.title {
            crate::require_nonempty("title", title)?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCreated {
    pub event_id: EventId,
}

/// Projection used by the attended-events listing.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub event_id: EventId,
    pub title: String,
    pub category: String,
}

/// Projection used by the created-events listing, interest snapshots
/// included.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostedEvent {
    pub event_id: EventId,
    pub title: String,
    pub category: String,
    pub users_interested: Vec<InterestedUser>,
}
