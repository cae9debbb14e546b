use crate::compose::compose;
use crate::dispatch::broadcast;
use crate::origin::resolve_origin;
use crate::scan::{scan, DEFAULT_SCAN_DEADLINE};
use crate::traits::{Membership, Messenger, Selector};
use domain::{AlertError, AlertReport, AlertTrigger, AppCommand, DeliveryReport};
use registry::{CommunityRegistry, RegistryError};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 完整的警报流程：来源解析 -> 成员扫描 -> 合成 -> 广播，严格按此顺序
// 并发调用之间只共享这些只读句柄
pub struct AlertPipeline {
    registry: Arc<dyn CommunityRegistry>,
    membership: Arc<dyn Membership>,
    messenger: Arc<dyn Messenger>,
    selector: Arc<dyn Selector>,
    scan_deadline: Duration,
}

impl AlertPipeline {
    pub fn new(
        registry: Arc<dyn CommunityRegistry>,
        membership: Arc<dyn Membership>,
        messenger: Arc<dyn Messenger>,
        selector: Arc<dyn Selector>,
    ) -> Self {
        Self {
            registry,
            membership,
            messenger,
            selector,
            scan_deadline: DEFAULT_SCAN_DEADLINE,
        }
    }

    pub fn with_scan_deadline(mut self, deadline: Duration) -> Self {
        self.scan_deadline = deadline;
        self
    }

    // 跑完一次警报。只有整管线级的前置失败（坏输入/注册表读不到/来源
    // 未解析）以 Err 返回，单社区的探测与投递失败是报告里的数据
    pub async fn raise(&self, command: AppCommand) -> Result<DeliveryReport, AlertError> {
        let AppCommand::RaiseAlert {
            actor,
            reason,
            attachment,
            trigger,
        } = command;

        if reason.trim().is_empty() {
            return Err(AlertError::InvalidInput(
                "A reason for the alert is required.".to_string(),
            ));
        }

        // 注册表读取全部前置：读不到就在任何探测/发送之前终止
        let monitored = self.registry.monitored().map_err(registry_err)?;
        let receiving = self.registry.alert_receiving().map_err(registry_err)?;

        let origin = match trigger {
            AlertTrigger::Operator {
                invoker,
                held_roles,
            } => {
                let candidates = self.registry.origin_candidates().map_err(registry_err)?;
                resolve_origin(
                    self.selector.as_ref(),
                    &invoker,
                    &held_roles,
                    &candidates,
                    &receiving,
                )
                .await?
            }
            AlertTrigger::External { origin } => receiving
                .iter()
                .find(|c| c.id == origin)
                .cloned()
                .ok_or_else(|| {
                    AlertError::InvalidInput(format!(
                        "'{}' is not a configured alert-receiving community",
                        origin
                    ))
                })?,
        };

        info!(
            actor = actor.as_str(),
            origin = origin.name.as_str(),
            monitored = monitored.len(),
            "Raising alert"
        );

        let scan_result = scan(&self.membership, &monitored, &actor, self.scan_deadline).await;
        let report = AlertReport {
            actor,
            reason,
            attachment,
            origin,
        };
        let message = compose(&report, scan_result);
        Ok(broadcast(&self.messenger, &message, &receiving).await)
    }
}

fn registry_err(e: RegistryError) -> AlertError {
    AlertError::Registry(e.to_string())
}
