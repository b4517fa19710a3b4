use tracing::instrument;

use super::dto::{Profile, ReferrerInfo};
use crate::{
    error::{AppError, AppResult},
    store::UserStore,
};

#[instrument(skip(store))]
pub async fn get_profile(store: &dyn UserStore, user_id: i64) -> AppResult<Profile> {
    let user = store.find_by_id(user_id).await?.ok_or(AppError::NotFound)?;

    let referred_by = match user.referred_by_id {
        Some(parent_id) => store
            .find_by_id(parent_id)
            .await?
            .map(|p| ReferrerInfo {
                email: p.email,
                referral_code: p.referral_code,
            }),
        None => None,
    };
    let direct_referral_count = store.count_children(user.id).await?;

    Ok(Profile {
        id: user.public_id,
        email: user.email,
        referral_code: user.referral_code,
        created_at: user.created_at,
        referred_by,
        direct_referral_count,
    })
}
