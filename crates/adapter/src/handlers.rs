use crate::commands::parse_alert_command;
use crate::selection::PendingSelections;
use anyhow::Result;
use chrono::Utc;
use domain::{AlertTrigger, AppCommand, ChannelId, Invoker, RoleId};
use engine::AlertPipeline;
use matrix_sdk::ruma::events::room::member::MembershipState;
use matrix_sdk::ruma::events::room::message::{
    MessageType, OriginalSyncRoomMessageEvent, RoomMessageEventContent,
};
use matrix_sdk::ruma::{OwnedUserId, RoomId, UserId};
use matrix_sdk::{Client, Room};
use registry::CommunityRegistry;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, info, warn};

const REGISTRY_FAILURE_REPLY: &str =
    "Your command was received, but the community registry could not be read. \
     No alert was raised.";

#[derive(Clone)]
pub struct HandlerContext {
    pub pipeline: Arc<AlertPipeline>,
    pub registry: Arc<dyn CommunityRegistry>,
    pub pending: PendingSelections,
    pub command_prefix: String,
    pub bot_user: OwnedUserId,
}

pub async fn handle_room_message(
    event: OriginalSyncRoomMessageEvent,
    room: Room,
    client: Client,
    ctx: HandlerContext,
) -> Result<()> {
    if event.sender == ctx.bot_user {
        return Ok(());
    }
    let body = match &event.content.msgtype {
        MessageType::Text(text) => text.body.clone(),
        _ => return Ok(()),
    };

    // 对挂起消歧提示的回复优先于一切
    if ctx.pending.try_resolve(room.room_id(), &event.sender, &body) {
        return Ok(());
    }

    let parsed = match parse_alert_command(&ctx.command_prefix, &body) {
        Some(parsed) => parsed,
        None => return Ok(()),
    };

    info!(
        "{} invoked by {} in {} at {}",
        ctx.command_prefix,
        event.sender,
        room.room_id(),
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );

    // 只能从接收警报社区的警报频道发起
    let receiving = match ctx.registry.alert_receiving() {
        Ok(receiving) => receiving,
        Err(e) => {
            error!("Registry read failed during command handling: {}", e);
            reply(&room, REGISTRY_FAILURE_REPLY).await;
            return Ok(());
        }
    };
    let room_is_alert_channel = receiving.iter().any(|c| {
        c.alerts
            .as_ref()
            .map(|a| a.channel.as_str() == room.room_id().as_str())
            .unwrap_or(false)
    });
    if !room_is_alert_channel {
        reply(
            &room,
            "Alerts can only be raised from an alert-receiving community's alert channel.",
        )
        .await;
        return Ok(());
    }

    let alert = match parsed {
        Ok(alert) => alert,
        Err(corrective) => {
            reply(&room, &corrective).await;
            return Ok(());
        }
    };

    let candidates = match ctx.registry.origin_candidates() {
        Ok(candidates) => candidates,
        Err(e) => {
            error!("Registry read failed during command handling: {}", e);
            reply(&room, REGISTRY_FAILURE_REPLY).await;
            return Ok(());
        }
    };
    let held_roles = held_roles(
        &client,
        &event.sender,
        candidates.iter().map(|c| &c.moderator_role),
    )
    .await;

    let invoker = Invoker {
        user: event.sender.to_string(),
        channel: ChannelId::new(room.room_id().as_str()),
    };
    let cmd = AppCommand::RaiseAlert {
        actor: alert.actor,
        reason: alert.reason,
        attachment: alert.attachment,
        trigger: AlertTrigger::Operator {
            invoker,
            held_roles,
        },
    };

    // 管线必须跑在 sync 任务之外：挂起的消歧要靠 sync loop 本身来解除
    let pipeline = ctx.pipeline.clone();
    let sender = event.sender.clone();
    tokio::spawn(async move {
        let text = match pipeline.raise(cmd).await {
            Ok(report) => report.summary(),
            Err(e) => format!("No alert was raised: {}", e),
        };
        reply(&room, &format!("{}: {}", sender, text)).await;
    });

    Ok(())
}

async fn reply(room: &Room, text: &str) {
    if let Err(e) = room
        .send(RoomMessageEventContent::text_plain(text))
        .await
    {
        warn!("Failed to reply in {}: {:#}", room.room_id(), e);
    }
}

// 持有版主角色 = 是该角色 staff 房间的 joined 成员
// 查询失败只当作未持有，不中断指令处理
pub async fn held_roles<'a>(
    client: &Client,
    operator: &UserId,
    roles: impl Iterator<Item = &'a RoleId>,
) -> BTreeSet<RoleId> {
    let mut held = BTreeSet::new();
    for role in roles {
        let room_id = match RoomId::parse(role.as_str()) {
            Ok(id) => id,
            Err(_) => {
                warn!(role = role.as_str(), "Moderator role is not a room id");
                continue;
            }
        };
        let staff_room = match client.get_room(&room_id) {
            Some(room) => room,
            None => continue,
        };
        match staff_room.get_member(operator).await {
            Ok(Some(member)) if member.membership() == &MembershipState::Join => {
                held.insert(role.clone());
            }
            Ok(_) => {}
            Err(e) => {
                warn!(role = role.as_str(), "Role membership lookup failed: {:#}", e);
            }
        }
    }
    held
}
