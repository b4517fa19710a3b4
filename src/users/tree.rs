//! Upline and downline traversal over the `referred_by_id` forest.
//!
//! Both walks stop after [`MAX_DEPTH`] levels. Registration can never
//! produce a cycle, so the cap only matters when the stored parent
//! pointers are corrupt; a truncated answer is returned instead of
//! looping.

use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use super::dto::{Downline, LevelStat, TreeMember};
use crate::store::{StoreResult, UserStore};

pub const MAX_DEPTH: u32 = 10;

/// Ancestors of `user_id`, nearest first. Level 1 is the direct referrer.
///
/// A parent id with no matching row ends the chain silently. An unknown
/// `user_id` yields an empty chain.
#[instrument(skip(store))]
pub async fn get_upline(store: &dyn UserStore, user_id: i64) -> StoreResult<Vec<TreeMember>> {
    let mut upline = Vec::new();
    let Some(start) = store.find_by_id(user_id).await? else {
        return Ok(upline);
    };

    let mut next = start.referred_by_id;
    let mut level = 1;
    while let Some(parent_id) = next {
        if level > MAX_DEPTH {
            warn!(user_id, "upline hit depth cap; parent chain may be cyclic");
            break;
        }
        let Some(parent) = store.find_by_id(parent_id).await? else {
            warn!(user_id, parent_id, "dangling parent reference in upline");
            break;
        };
        next = parent.referred_by_id;
        upline.push(TreeMember::from_user(parent, level));
        level += 1;
    }

    debug!(user_id, count = upline.len(), "upline resolved");
    Ok(upline)
}

/// Descendants of `user_id`, breadth-first.
///
/// One store round-trip per level. Within a level, children are grouped
/// by the position of their parent in the previous level, then by
/// creation time.
#[instrument(skip(store))]
pub async fn get_downline(store: &dyn UserStore, user_id: i64) -> StoreResult<Downline> {
    let mut out = Downline::default();
    let mut frontier = vec![user_id];

    for level in 1..=MAX_DEPTH {
        if frontier.is_empty() {
            break;
        }

        let mut children = store.children_of_many(&frontier).await?;
        let position: HashMap<i64, usize> = frontier
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();
        // stable: keeps created_at order among siblings
        children.sort_by_key(|c| {
            c.referred_by_id
                .and_then(|p| position.get(&p).copied())
                .unwrap_or(usize::MAX)
        });

        let mut next = Vec::with_capacity(children.len());
        let mut members = Vec::with_capacity(children.len());
        for child in children {
            next.push(child.id);
            members.push(TreeMember::from_user(child, level));
        }

        if !members.is_empty() {
            out.level_stats.push(LevelStat {
                level,
                count: members.len(),
            });
            out.downline.extend(members.iter().cloned());
            out.downline_by_level.insert(level, members);
        }
        frontier = next;
    }

    if !frontier.is_empty() {
        debug!(user_id, "downline stopped at depth cap");
    }
    out.total_count = out.downline.len();
    debug!(user_id, total = out.total_count, levels = out.level_stats.len(), "downline resolved");
    Ok(out)
}
