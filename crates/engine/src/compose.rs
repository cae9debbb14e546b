use domain::{AlertMessage, AlertReport, ScanOutcome, ScanResult};

// 把扫描结果和报告元数据渲染成所有目标共用的一条警报
// 纯函数：无 I/O、无时钟，相同输入必得相同输出（扫描结果按社区 id 序迭代）
// 提及集只含检测到目标的社区的 location 角色，notify-all 由分发器按目标追加
pub fn compose(report: &AlertReport, scan: ScanResult) -> AlertMessage {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("**New alert** raised from {}.", report.origin.name));
    lines.push(format!("Flagged user ID: `{}`", report.actor));
    lines.push(format!("Reason: {}", report.reason));

    let present: Vec<String> = scan
        .with_outcome(ScanOutcome::Present)
        .map(|c| c.name.clone())
        .collect();
    if present.is_empty() {
        // "没检测到"本身就是要传达的信息
        lines.push("The flagged user was **not detected** in any monitored community.".to_string());
    } else {
        lines.push(format!("Detected in: **{}**", present.join(", ")));
    }

    let unreachable: Vec<String> = scan
        .with_outcome(ScanOutcome::Unreachable)
        .map(|c| c.name.clone())
        .collect();
    if !unreachable.is_empty() {
        lines.push(format!(
            "Caveat: the scan got no answer from {} - the user may or may not be there.",
            unreachable.join(", ")
        ));
    }

    let scanned: Vec<String> = scan.entries().map(|e| e.community.name.clone()).collect();
    if !scanned.is_empty() {
        lines.push(format!("Communities scanned: {}", scanned.join(", ")));
    }

    let mut message = AlertMessage {
        body: lines.join("\n"),
        mentions: Vec::new(),
        attachment: report.attachment.clone(),
    };
    for community in scan.with_outcome(ScanOutcome::Present) {
        if let Some(alerts) = &community.alerts {
            message.push_mention(alerts.location_role.clone());
        }
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{alerting_monitored, monitored};
    use domain::{ActorId, AttachmentRef, RoleId};

    fn report() -> AlertReport {
        AlertReport {
            actor: ActorId::new("145582654857805825").unwrap(),
            reason: "ban evasion".to_string(),
            attachment: Some(AttachmentRef::new("mxc://fed/screenshot")),
            origin: alerting_monitored("!f1:fed", "F1"),
        }
    }

    fn scenario_scan() -> ScanResult {
        let mut scan = ScanResult::new();
        scan.record(alerting_monitored("!a:fed", "A"), ScanOutcome::Present);
        scan.record(monitored("!b:fed", "B"), ScanOutcome::Absent);
        scan.record(monitored("!c:fed", "C"), ScanOutcome::Unreachable);
        scan
    }

    #[test]
    fn detection_lists_communities_and_mentions_location_roles() {
        let message = compose(&report(), scenario_scan());

        assert!(message.body.contains("Detected in: **A**"));
        assert!(message.body.contains("no answer from C"));
        assert!(!message.body.contains("not detected"));
        assert!(message.body.contains("Communities scanned: A, B, C"));
        assert_eq!(message.mentions, vec![RoleId::new("@a-mods")]);
        assert_eq!(
            message.attachment,
            Some(AttachmentRef::new("mxc://fed/screenshot"))
        );
    }

    #[test]
    fn zero_detections_state_it_explicitly_and_mention_nobody() {
        let mut scan = ScanResult::new();
        scan.record(alerting_monitored("!a:fed", "A"), ScanOutcome::Absent);
        scan.record(monitored("!b:fed", "B"), ScanOutcome::Absent);

        let message = compose(&report(), scan);
        assert!(message
            .body
            .contains("**not detected** in any monitored community"));
        assert!(message.mentions.is_empty());
    }

    #[test]
    fn unreachable_does_not_trigger_a_mention() {
        let mut scan = ScanResult::new();
        scan.record(alerting_monitored("!a:fed", "A"), ScanOutcome::Unreachable);

        let message = compose(&report(), scan);
        assert!(message.mentions.is_empty());
        assert!(message.body.contains("no answer from A"));
    }

    #[test]
    fn compose_is_deterministic() {
        let first = compose(&report(), scenario_scan());
        let second = compose(&report(), scenario_scan());
        assert_eq!(first, second);
    }

    #[test]
    fn reason_and_actor_always_appear() {
        let message = compose(&report(), ScanResult::new());
        assert!(message.body.contains("145582654857805825"));
        assert!(message.body.contains("ban evasion"));
        assert!(message.body.contains("raised from F1"));
    }

    #[test]
    fn monitored_only_present_community_is_named_but_not_mentioned() {
        let mut scan = ScanResult::new();
        scan.record(monitored("!b:fed", "B"), ScanOutcome::Present);

        let message = compose(&report(), scan);
        assert!(message.body.contains("Detected in: **B**"));
        assert!(message.mentions.is_empty());
    }
}
