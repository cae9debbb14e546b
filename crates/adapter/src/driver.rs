use anyhow::Result;
use engine::AlertPipeline;
use matrix_sdk::{
    config::SyncSettings,
    matrix_auth::{MatrixSession, MatrixSessionTokens},
    ruma::{events::room::message::OriginalSyncRoomMessageEvent, OwnedUserId},
    Client, Room, SessionMeta,
};
use registry::CommunityRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::handlers::{handle_room_message, HandlerContext};
use crate::platform::{MatrixMembership, MatrixMessenger};
use crate::selection::{MatrixSelector, PendingSelections};
use crate::CommandEnvelope;

#[derive(Clone)]
pub struct BotConfig {
    pub homeserver_url: String,
    pub user_id: OwnedUserId,
    pub access_token: String,
    pub device_id: String,
    // 桥接 Ghost 用户 ID 模板，如 "@_bridge_{id}:fed.example"
    pub user_template: String,
    pub command_prefix: String,
    pub scan_deadline: Duration,
}

pub struct BotDriver {
    config: BotConfig,
}

impl BotDriver {
    pub fn new(config: BotConfig) -> Self {
        Self { config }
    }

    pub async fn run(
        &self,
        registry: Arc<dyn CommunityRegistry>,
        mut rx_cmd: mpsc::Receiver<CommandEnvelope>,
        cancel_token: CancellationToken,
    ) -> Result<()> {
        // --- 1. Client 初始化 ---
        let client = Client::builder()
            .homeserver_url(&self.config.homeserver_url)
            .build()
            .await?;

        let session = MatrixSession {
            meta: SessionMeta {
                user_id: self.config.user_id.clone(),
                device_id: self.config.device_id.clone().into(),
            },
            tokens: MatrixSessionTokens {
                access_token: self.config.access_token.clone(),
                refresh_token: None,
            },
        };
        client.matrix_auth().restore_session(session).await?;
        info!("Matrix client logged in as {}", self.config.user_id);

        // --- 2. 管线装配 ---
        let pending = PendingSelections::new();
        let membership = Arc::new(MatrixMembership::new(
            client.clone(),
            self.config.user_template.clone(),
        ));
        let messenger = Arc::new(MatrixMessenger::new(client.clone()));
        let selector = Arc::new(MatrixSelector::new(client.clone(), pending.clone()));
        let pipeline = Arc::new(
            AlertPipeline::new(registry.clone(), membership, messenger, selector)
                .with_scan_deadline(self.config.scan_deadline),
        );

        // --- 3. 任务：外部指令信封 ---
        let cmd_handle = {
            let pipeline = pipeline.clone();
            let cmd_cancel_token = cancel_token.clone();

            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        envelope = rx_cmd.recv() => {
                            let CommandEnvelope { cmd, resp } = match envelope {
                                Some(e) => e,
                                None => break,
                            };
                            // 每次调用一个任务：并发警报互不共享，
                            // 也不会排在挂起的消歧后面
                            let pipeline = pipeline.clone();
                            tokio::spawn(async move {
                                let result = pipeline.raise(cmd).await;
                                if let Err(ref e) = result {
                                    error!("Alert invocation failed: {}", e);
                                }
                                let _ = resp.send(result);
                            });
                        },
                        _ = cmd_cancel_token.cancelled() => break,
                    }
                }
            })
        };

        // --- 4. 任务：Sync Loop & 聊天指令 ---
        let ctx = HandlerContext {
            pipeline,
            registry,
            pending,
            command_prefix: self.config.command_prefix.clone(),
            bot_user: self.config.user_id.clone(),
        };
        client.add_event_handler(
            move |ev: OriginalSyncRoomMessageEvent, room: Room, c: Client| {
                let ctx = ctx.clone();
                async move {
                    if let Err(e) = handle_room_message(ev, room, c, ctx).await {
                        error!("Message handling failed: {:?}", e);
                    }
                }
            },
        );

        info!("Starting Matrix sync loop...");
        let mut sync_token: Option<String> = None;
        let sync_cancel_token = cancel_token.clone();
        let sync_client = client.clone();

        let sync_handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    sync_result = async {
                        let mut settings = SyncSettings::default().timeout(Duration::from_secs(30));
                        if let Some(ref token) = sync_token {
                            settings = settings.token(token);
                        }
                        sync_client.sync_once(settings).await
                    } => {
                        match sync_result {
                            Ok(response) => {
                                sync_token = Some(response.next_batch);
                            }
                            Err(e) => {
                                error!("Matrix sync failed: {:?}. Retrying...", e);
                                if sync_cancel_token.is_cancelled() {
                                    break;
                                }
                                tokio::time::sleep(Duration::from_secs(5)).await;
                            }
                        }
                    },
                    _ = sync_cancel_token.cancelled() => break,
                }
            }
        });

        // --- 5. 优雅退出 ---
        cancel_token.cancelled().await;
        let _ = tokio::join!(cmd_handle, sync_handle);
        Ok(())
    }
}
