use agora_api::{normalize_rating, Error as ApiError, OrgId, Upsert, UserId};

use crate::store::Store;

/// Upserts this user's rating for the org. The value is rounded to one
/// decimal and bounds-checked before the org is even looked up, so an
/// out-of-range value never touches the store.
pub async fn rate_org(
    store: &Store,
    org: OrgId,
    user: UserId,
    value: f64,
) -> Result<Upsert, ApiError> {
    let value = normalize_rating(value)?;
    let mut outcome = Upsert::Inserted;
    let result = store
        .orgs
        .update_one(org, |o| {
            outcome = o.ratings.set(user, value);
            true
        })
        .await;
    if !result.matched {
        return Err(ApiError::OrgNotFound(org));
    }
    Ok(outcome)
}

pub async fn unrate_org(store: &Store, org: OrgId, user: UserId) -> Result<(), ApiError> {
    let result = store.orgs.update_one(org, |o| o.ratings.remove(user)).await;
    if !result.matched {
        return Err(ApiError::OrgNotFound(org));
    }
    if !result.modified {
        return Err(ApiError::NoRatingFound);
    }
    Ok(())
}
