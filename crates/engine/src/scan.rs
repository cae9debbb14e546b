use crate::probe::probe;
use crate::traits::Membership;
use domain::{ActorId, Community, ScanOutcome, ScanResult};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_SCAN_DEADLINE: Duration = Duration::from_secs(10);

// 并发探测所有被监控社区并聚合结果
// 结果恒为每个社区一条：失败记 Unreachable，deadline 到点还没回来的也记
// Unreachable 而不是继续等，总耗时与联邦规模无关
pub async fn scan(
    membership: &Arc<dyn Membership>,
    monitored: &[Community],
    actor: &ActorId,
    deadline: Duration,
) -> ScanResult {
    let mut pending: FuturesUnordered<_> = monitored
        .iter()
        .map(|community| {
            let membership = Arc::clone(membership);
            let community = community.clone();
            let actor = actor.clone();
            async move {
                let outcome = probe(membership.as_ref(), &community, &actor).await;
                (community, outcome)
            }
        })
        .collect();

    let mut result = ScanResult::new();
    let deadline_sleep = tokio::time::sleep(deadline);
    tokio::pin!(deadline_sleep);

    while !pending.is_empty() {
        tokio::select! {
            Some((community, outcome)) = pending.next() => {
                debug!(community = community.id.as_str(), outcome = %outcome, "Probe finished");
                result.record(community, outcome);
            }
            _ = &mut deadline_sleep => {
                warn!(
                    outstanding = pending.len(),
                    "Scan deadline ({:?}) elapsed; marking outstanding probes unreachable",
                    deadline
                );
                break;
            }
        }
    }

    for community in monitored {
        if !result.contains(&community.id) {
            result.record(community.clone(), ScanOutcome::Unreachable);
        }
    }
    result
}
