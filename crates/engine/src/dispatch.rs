use crate::traits::Messenger;
use domain::{AlertMessage, Community, DeliveryReport};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

// 并发地向每个接收警报的社区频道各投递一份
// 每个目标的提及集 = 合成集 + 该社区自己 opt-in 的 notify-all 角色
// 投递相互独立：失败记入报告，不阻塞、不中止、不重试（每目标至多一次）
pub async fn broadcast(
    messenger: &Arc<dyn Messenger>,
    message: &AlertMessage,
    destinations: &[Community],
) -> DeliveryReport {
    let sends = destinations.iter().filter_map(|community| {
        let alerts = match &community.alerts {
            Some(alerts) => alerts.clone(),
            None => return None,
        };
        let mut mentions = message.mentions.clone();
        if let Some(role) = &alerts.notify_all_role {
            if !mentions.contains(role) {
                mentions.push(role.clone());
            }
        }
        let messenger = Arc::clone(messenger);
        let id = community.id.clone();
        let body = message.body.clone();
        let attachment = message.attachment.clone();
        Some(async move {
            match messenger
                .send_message(&alerts.channel, &body, &mentions, attachment.as_ref())
                .await
            {
                Ok(()) => Ok(id),
                Err(e) => {
                    warn!(community = id.as_str(), "Alert delivery failed: {:#}", e);
                    Err((id, format!("{:#}", e)))
                }
            }
        })
    });

    let mut report = DeliveryReport::default();
    for outcome in join_all(sends).await {
        match outcome {
            Ok(id) => report.delivered.push(id),
            Err(failure) => report.failed.push(failure),
        }
    }
    info!("{}", report.summary());
    report
}
