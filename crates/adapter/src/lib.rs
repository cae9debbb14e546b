mod commands;
mod driver;
mod handlers;
mod platform;
mod selection;

pub use driver::BotConfig;

use domain::{AlertError, AppCommand, DeliveryReport};
use driver::BotDriver;
use registry::CommunityRegistry;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::info;

// 排队的一次调用 + 结果回传通道（HTTP 触发侧 await resp）
pub struct CommandEnvelope {
    pub cmd: AppCommand,
    pub resp: oneshot::Sender<Result<DeliveryReport, AlertError>>,
}

/// 运行 Matrix 驱动直到 cancel token 触发
// 恢复 bot 会话、响应 !alert 聊天指令、消费外部提交的指令信封
pub async fn start(
    config: BotConfig,
    registry: Arc<dyn CommunityRegistry>,
    rx_cmd: mpsc::Receiver<CommandEnvelope>,
    cancel_token: CancellationToken,
) -> anyhow::Result<()> {
    info!("Initializing Matrix driver as {}", config.user_id);
    BotDriver::new(config).run(registry, rx_cmd, cancel_token).await
}
