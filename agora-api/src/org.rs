use std::{fmt, str::FromStr};

use chrono::Utc;

use crate::{Error, Event, EventId, ObjectId, Time, UserId, STUB_OID};

pub const RATING_MIN: f64 = 1.0;
pub const RATING_MAX: f64 = 5.0;

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
pub struct OrgId(pub ObjectId);

impl OrgId {
    pub fn stub() -> OrgId {
        OrgId(STUB_OID)
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for OrgId {
    type Err = Error;

    fn from_str(s: &str) -> Result<OrgId, Error> {
        Ok(OrgId(s.parse()?))
    }
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Org {
    pub org_id: OrgId,
    pub name: String,
    pub shorthand: String,
    pub bio: String,
    pub contact_info: ContactInfo,
    pub owner: UserId,
    pub contributors: Vec<UserId>,
    pub followers: Vec<UserId>,
    pub events: Vec<EventId>,
    pub ratings: Ratings,
    pub last_active: Time,
    pub date_created: Time,
}

impl Org {
    pub fn new(data: NewOrg) -> Org {
        let now = Utc::now();
        Org {
            org_id: OrgId(ObjectId::new()),
            name: data.name,
            shorthand: data.shorthand,
            bio: data.bio,
            contact_info: ContactInfo {
                email: data.email,
                ..ContactInfo::default()
            },
            owner: data.owner,
            contributors: Vec::new(),
            // the owner starts out following their own org
            followers: vec![data.owner],
            events: Vec::new(),
            ratings: Ratings::default(),
            last_active: now,
            date_created: now,
        }
    }

    /// Owner, contributors and followers, deduplicated, owner first.
    pub fn member_ids(&self) -> Vec<UserId> {
        let mut ids = vec![self.owner];
        for id in self.contributors.iter().chain(self.followers.iter()) {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub email: String,
    pub twitter: String,
    pub discord: String,
    pub phone_number: String,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub rated_by: UserId,
    pub value: f64,
}

/// At most one rating per user, in first-rated order.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct Ratings(Vec<Rating>);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Upsert {
    Inserted,
    Updated,
}

impl Ratings {
    /// Overwrites the user's rating in place, or appends a fresh entry.
    pub fn set(&mut self, rated_by: UserId, value: f64) -> Upsert {
        match self.0.iter_mut().find(|r| r.rated_by == rated_by) {
            Some(r) => {
                r.value = value;
                Upsert::Updated
            }
            None => {
                self.0.push(Rating { rated_by, value });
                Upsert::Inserted
            }
        }
    }

    pub fn remove(&mut self, rated_by: UserId) -> bool {
        match self.0.iter().position(|r| r.rated_by == rated_by) {
            Some(i) => {
                self.0.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, rated_by: UserId) -> Option<f64> {
        self.0.iter().find(|r| r.rated_by == rated_by).map(|r| r.value)
    }

    /// Recomputed on every call; an empty list averages to 0, which callers
    /// can tell apart from a real zero only by checking `len`.
    pub fn average(&self) -> f64 {
        if self.0.is_empty() {
            return 0.0;
        }
        self.0.iter().map(|r| r.value).sum::<f64>() / self.0.len() as f64
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rating> {
        self.0.iter()
    }
}

/// Rounds to one decimal the way the clients always have, then bounds-checks
/// the rounded value.
pub fn normalize_rating(value: f64) -> Result<f64, Error> {
    let rounded = (value * 10.0).round() / 10.0;
    if !(RATING_MIN..=RATING_MAX).contains(&rounded) {
        return Err(Error::RatingOutOfBounds(value));
    }
    Ok(rounded)
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrg {
    pub name: String,
    pub shorthand: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub email: String,
    pub owner: UserId,
}

impl NewOrg {
    // See comments on other `validate` functions throughout agora-api
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.name)?;
        crate::validate_string(&self.shorthand)?;
        crate::validate_string(&self.bio)?;
        crate::validate_string(&self.email)?;
        crate::require_nonempty("name", &self.name)?;
        crate::require_nonempty("shorthand", &self.shorthand)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgPatch {
    pub name: Option<String>,
    pub shorthand: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
}

impl OrgPatch {
    // See comments on other `validate` functions throughout agora-api
    pub fn validate(&self) -> Result<(), Error> {
        for s in [&self.name, &self.shorthand, &self.bio, &self.email]
            .into_iter()
            .flatten()
        {
            crate::validate_string(s)?;
        }
        if let Some(name) = &self.name {
            crate::require_nonempty("name", name)?;
        }
        if let Some(shorthand) = &self.shorthand {
            crate::require_nonempty("shorthand", shorthand)?;
        }
        Ok(())
    }
}

/// Body of a rate request. Rounding and bounds checks happen server-side,
/// the raw value travels as-is.
#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewRating {
    pub value: f64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgCreated {
    pub org_id: OrgId,
}

/// Org document with its event ids swapped for the event documents, plus the
/// derived average. `events` would collide under flatten, hence the copy.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgView {
    pub org_id: OrgId,
    pub name: String,
    pub shorthand: String,
    pub bio: String,
    pub contact_info: ContactInfo,
    pub owner: UserId,
    pub contributors: Vec<UserId>,
    pub followers: Vec<UserId>,
    pub events: Vec<Event>,
    pub ratings: Ratings,
    pub average_rating: f64,
    pub last_active: Time,
    pub date_created: Time,
}

impl OrgView {
    pub fn assemble(org: Org, events: Vec<Event>) -> OrgView {
        OrgView {
            org_id: org.org_id,
            name: org.name,
            shorthand: org.shorthand,
            bio: org.bio,
            contact_info: org.contact_info,
            owner: org.owner,
            contributors: org.contributors,
            followers: org.followers,
            events,
            average_rating: org.ratings.average(),
            ratings: org.ratings,
            last_active: org.last_active,
            date_created: org.date_created,
        }
    }
}

/// One line of the org lists shown on user pages.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgHeader {
    pub org_id: OrgId,
    pub name: String,
    pub shorthand: String,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Member {
    pub name: String,
}
