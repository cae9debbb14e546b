use anyhow::{Context, Result};
use async_trait::async_trait;
use domain::{Community, CommunityId, Invoker};
use engine::Selector;
use matrix_sdk::ruma::events::room::message::RoomMessageEventContent;
use matrix_sdk::ruma::{OwnedRoomId, OwnedUserId, RoomId, UserId};
use matrix_sdk::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::info;

struct PendingChoice {
    options: Vec<CommunityId>,
    tx: oneshot::Sender<Option<CommunityId>>,
}

// 进行中的来源消歧续体，按 (房间, 操作者) 索引
// sync loop 收到回复时解除；整表 drop 则所有等待者都被取消
#[derive(Clone, Default)]
pub struct PendingSelections {
    inner: Arc<Mutex<HashMap<(OwnedRoomId, OwnedUserId), PendingChoice>>>,
}

impl PendingSelections {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(
        &self,
        room: OwnedRoomId,
        user: OwnedUserId,
        options: Vec<CommunityId>,
    ) -> oneshot::Receiver<Option<CommunityId>> {
        let (tx, rx) = oneshot::channel();
        self.inner
            .lock()
            .unwrap()
            .insert((room, user), PendingChoice { options, tx });
        rx
    }

    // 把一条消息喂给挂起表。返回 true 表示它解除（或取消）了某个挂起的
    // 选择，后续处理应当跳过这条消息
    pub fn try_resolve(&self, room: &RoomId, user: &UserId, reply: &str) -> bool {
        let key = (room.to_owned(), user.to_owned());
        let mut table = self.inner.lock().unwrap();
        let pending = match table.remove(&key) {
            Some(p) => p,
            None => return false,
        };

        let reply = reply.trim();
        if reply.eq_ignore_ascii_case("cancel") {
            let _ = pending.tx.send(None);
            return true;
        }
        match reply.parse::<usize>() {
            Ok(n) if (1..=pending.options.len()).contains(&n) => {
                let chosen = pending.options[n - 1].clone();
                let _ = pending.tx.send(Some(chosen));
                true
            }
            // 无关聊天：放回去，选择继续挂起
            _ => {
                table.insert(key, pending);
                false
            }
        }
    }
}

// 在发起房间里以编号列表给出来源选项，挂起直到操作者回复
// 这里没有超时：等人，或者等关机把它取消
pub struct MatrixSelector {
    client: Client,
    pending: PendingSelections,
}

impl MatrixSelector {
    pub fn new(client: Client, pending: PendingSelections) -> Self {
        Self { client, pending }
    }
}

#[async_trait]
impl Selector for MatrixSelector {
    async fn present_choices(
        &self,
        invoker: &Invoker,
        candidates: &[Community],
    ) -> Result<Option<CommunityId>> {
        let room_id = RoomId::parse(invoker.channel.as_str())
            .with_context(|| format!("invalid room id '{}'", invoker.channel))?;
        let room = self
            .client
            .get_room(&room_id)
            .with_context(|| format!("bot is not in room '{}'", room_id))?;
        let user_id = UserId::parse(&invoker.user)
            .with_context(|| format!("invalid invoker id '{}'", invoker.user))?;

        let options: Vec<CommunityId> = candidates.iter().map(|c| c.id.clone()).collect();
        // 先注册再发提示，手快的回复才不会漏掉
        let rx = self
            .pending
            .register(room_id.clone(), user_id.clone(), options);

        let mut lines = vec![format!(
            "{}: I wasn't able to automatically determine which community is raising \
             this alert. Reply with the number, or `cancel`:",
            invoker.user
        )];
        for (i, candidate) in candidates.iter().enumerate() {
            lines.push(format!("{}. {}", i + 1, candidate.name));
        }
        room.send(RoomMessageEventContent::text_markdown(lines.join("\n")))
            .await
            .context("failed to send the origin prompt")?;

        match rx.await {
            Ok(choice) => Ok(choice),
            // 挂起期间驱动关闭了，效果等同取消
            Err(_) => {
                info!(invoker = invoker.user.as_str(), "Origin prompt abandoned");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> (OwnedRoomId, OwnedUserId) {
        (
            RoomId::parse("!staff:fed.example").unwrap(),
            UserId::parse("@lux:fed.example").unwrap(),
        )
    }

    fn options() -> Vec<CommunityId> {
        vec![CommunityId::new("!f1:fed"), CommunityId::new("!nascar:fed")]
    }

    #[tokio::test]
    async fn numeric_reply_resumes_with_that_community() {
        let pending = PendingSelections::new();
        let (room, user) = key();
        let rx = pending.register(room.clone(), user.clone(), options());

        assert!(pending.try_resolve(&room, &user, "2"));
        assert_eq!(rx.await.unwrap(), Some(CommunityId::new("!nascar:fed")));
    }

    #[tokio::test]
    async fn cancel_resumes_with_nothing() {
        let pending = PendingSelections::new();
        let (room, user) = key();
        let rx = pending.register(room.clone(), user.clone(), options());

        assert!(pending.try_resolve(&room, &user, "CANCEL"));
        assert_eq!(rx.await.unwrap(), None);
    }

    #[tokio::test]
    async fn chatter_and_out_of_range_numbers_leave_it_suspended() {
        let pending = PendingSelections::new();
        let (room, user) = key();
        let _rx = pending.register(room.clone(), user.clone(), options());

        assert!(!pending.try_resolve(&room, &user, "hmm let me think"));
        assert!(!pending.try_resolve(&room, &user, "3"));
        assert!(!pending.try_resolve(&room, &user, "0"));
        assert!(pending.try_resolve(&room, &user, "1"));
    }

    #[tokio::test]
    async fn replies_from_other_users_or_rooms_are_ignored() {
        let pending = PendingSelections::new();
        let (room, user) = key();
        let _rx = pending.register(room.clone(), user.clone(), options());

        let other_user = UserId::parse("@someone:fed.example").unwrap();
        assert!(!pending.try_resolve(&room, &other_user, "1"));
    }
}
