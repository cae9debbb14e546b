use crate::traits::Membership;
use domain::{ActorId, Community, ScanOutcome};
use tracing::warn;

// 探测单个社区，只读且从不报错：平台失败一律折叠成 Unreachable
pub async fn probe(membership: &dyn Membership, community: &Community, actor: &ActorId) -> ScanOutcome {
    match membership.is_member(community, actor).await {
        Ok(true) => ScanOutcome::Present,
        Ok(false) => ScanOutcome::Absent,
        Err(e) => {
            warn!(
                community = community.id.as_str(),
                "Membership probe failed: {:#}", e
            );
            ScanOutcome::Unreachable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{monitored, FakeMembership, ProbeBehavior};

    #[tokio::test]
    async fn maps_membership_to_outcomes() {
        let membership = FakeMembership::new([
            ("!a:fed", ProbeBehavior::Member),
            ("!b:fed", ProbeBehavior::NotMember),
            ("!c:fed", ProbeBehavior::Fail),
        ]);
        let actor = ActorId::new("1234").unwrap();

        let a = probe(&membership, &monitored("!a:fed", "A"), &actor).await;
        let b = probe(&membership, &monitored("!b:fed", "B"), &actor).await;
        let c = probe(&membership, &monitored("!c:fed", "C"), &actor).await;

        assert_eq!(a, ScanOutcome::Present);
        assert_eq!(b, ScanOutcome::Absent);
        assert_eq!(c, ScanOutcome::Unreachable);
    }
}
