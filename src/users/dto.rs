use std::collections::BTreeMap;

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::store::User;

/// One ancestor or descendant, tagged with its distance from the viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeMember {
    pub id: Uuid,
    pub email: String,
    pub referral_code: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub level: u32,
}

impl TreeMember {
    pub fn from_user(u: User, level: u32) -> Self {
        Self {
            id: u.public_id,
            email: u.email,
            referral_code: u.referral_code,
            created_at: u.created_at,
            level,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UplineResponse {
    pub upline: Vec<TreeMember>,
    pub total_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelStat {
    pub level: u32,
    pub count: usize,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Downline {
    pub downline: Vec<TreeMember>,
    pub downline_by_level: BTreeMap<u32, Vec<TreeMember>>,
    pub total_count: usize,
    pub level_stats: Vec<LevelStat>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferrerInfo {
    pub email: String,
    pub referral_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub referral_code: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub referred_by: Option<ReferrerInfo>,
    pub direct_referral_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: Profile,
}
