use crate::traits::Selector;
use domain::{AlertError, Community, CommunityId, Invoker, OriginCandidate, RoleId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

// 从操作者持有的版主角色推断其代表的社区
// 恰好一个匹配 -> 直接解析；零个 -> NoOriginFound；
// 两个以上 -> 挂起在 selector 上等操作者选，取消则 OriginUnresolved 且无副作用
pub async fn resolve_origin(
    selector: &dyn Selector,
    invoker: &Invoker,
    held_roles: &BTreeSet<RoleId>,
    candidates: &[OriginCandidate],
    alert_receiving: &[Community],
) -> Result<Community, AlertError> {
    let by_id: BTreeMap<&CommunityId, &Community> =
        alert_receiving.iter().map(|c| (&c.id, c)).collect();

    let mut matches: Vec<&Community> = Vec::new();
    for candidate in candidates {
        if !held_roles.contains(&candidate.moderator_role) {
            continue;
        }
        match by_id.get(&candidate.community) {
            Some(community) => {
                if !matches.iter().any(|m| m.id == community.id) {
                    matches.push(community);
                }
            }
            None => warn!(
                community = candidate.community.as_str(),
                "Origin candidate references a community that does not receive alerts"
            ),
        }
    }

    match matches.len() {
        0 => Err(AlertError::NoOriginFound),
        1 => Ok(matches[0].clone()),
        _ => {
            let options: Vec<Community> = matches.into_iter().cloned().collect();
            info!(
                invoker = invoker.user.as_str(),
                choices = options.len(),
                "Origin is ambiguous; asking the operator"
            );
            let chosen = selector
                .present_choices(invoker, &options)
                .await
                .map_err(|e| AlertError::Selector(e.to_string()))?;
            match chosen {
                Some(id) => options
                    .into_iter()
                    .find(|c| c.id == id)
                    .ok_or(AlertError::OriginUnresolved),
                None => Err(AlertError::OriginUnresolved),
            }
        }
    }
}
