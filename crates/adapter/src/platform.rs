use anyhow::{Context, Result};
use async_trait::async_trait;
use domain::{ActorId, AttachmentRef, ChannelId, Community, RoleId};
use engine::{Membership, Messenger};
use matrix_sdk::ruma::events::room::member::MembershipState;
use matrix_sdk::ruma::events::room::message::RoomMessageEventContent;
use matrix_sdk::ruma::{OwnedUserId, RoomId, UserId};
use matrix_sdk::Client;

// 把 Ghost 模板（如 "@_bridge_{id}:fed.example"）展开成
// 被举报用户在 Matrix 侧出现的 ID
pub fn bridged_user_id(template: &str, actor: &ActorId) -> Result<OwnedUserId> {
    let expanded = template.replace("{id}", actor.as_str());
    UserId::parse(&expanded)
        .with_context(|| format!("user template expanded to invalid id '{}'", expanded))
}

// 对社区主房间做成员探测
// 每次探测单查一个成员而不是缓存名单：联邦房间巨大、结果必须是当下的
pub struct MatrixMembership {
    client: Client,
    user_template: String,
}

impl MatrixMembership {
    pub fn new(client: Client, user_template: String) -> Self {
        Self {
            client,
            user_template,
        }
    }
}

#[async_trait]
impl Membership for MatrixMembership {
    async fn is_member(&self, community: &Community, actor: &ActorId) -> Result<bool> {
        let room_id = RoomId::parse(community.id.as_str())
            .with_context(|| format!("community '{}' has an invalid room id", community.id))?;
        let room = self
            .client
            .get_room(&room_id)
            .with_context(|| format!("bot is not installed in community '{}'", community.name))?;
        let target = bridged_user_id(&self.user_template, actor)?;

        let member = room
            .get_member(&target)
            .await
            .with_context(|| format!("member lookup failed in '{}'", community.name))?;
        Ok(matches!(
            member.map(|m| m.membership().clone()),
            Some(MembershipState::Join)
        ))
    }
}

// 向警报频道投递渲染好的警报
// 提及角色作为配置的字面量前置到正文，附件引用原样追加
pub struct MatrixMessenger {
    client: Client,
}

impl MatrixMessenger {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

pub fn render_message(body: &str, mentions: &[RoleId], attachment: Option<&AttachmentRef>) -> String {
    let mut text = String::new();
    if !mentions.is_empty() {
        let pings: Vec<&str> = mentions.iter().map(RoleId::as_str).collect();
        text.push_str(&pings.join(" "));
        text.push('\n');
    }
    text.push_str(body);
    if let Some(attachment) = attachment {
        text.push_str("\nAttachment: ");
        text.push_str(attachment.as_str());
    }
    text
}

#[async_trait]
impl Messenger for MatrixMessenger {
    async fn send_message(
        &self,
        channel: &ChannelId,
        body: &str,
        mentions: &[RoleId],
        attachment: Option<&AttachmentRef>,
    ) -> Result<()> {
        let room_id = RoomId::parse(channel.as_str())
            .with_context(|| format!("invalid alert channel id '{}'", channel))?;
        let room = self
            .client
            .get_room(&room_id)
            .with_context(|| format!("bot is not in alert channel '{}'", channel))?;

        room.send(RoomMessageEventContent::text_markdown(render_message(
            body, mentions, attachment,
        )))
        .await
        .with_context(|| format!("send to '{}' failed", channel))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_expands_to_a_ghost_mxid() {
        let actor = ActorId::new("145582654857805825").unwrap();
        let id = bridged_user_id("@_bridge_{id}:fed.example", &actor).unwrap();
        assert_eq!(id.as_str(), "@_bridge_145582654857805825:fed.example");
    }

    #[test]
    fn bad_template_is_an_error() {
        let actor = ActorId::new("42").unwrap();
        assert!(bridged_user_id("no-placeholder-no-server", &actor).is_err());
    }

    #[test]
    fn rendering_prepends_pings_and_appends_attachment() {
        let text = render_message(
            "body line",
            &[RoleId::new("@f1-mods"), RoleId::new("@all")],
            Some(&AttachmentRef::new("mxc://fed/x")),
        );
        assert_eq!(text, "@f1-mods @all\nbody line\nAttachment: mxc://fed/x");
    }

    #[test]
    fn rendering_without_extras_is_just_the_body() {
        assert_eq!(render_message("body", &[], None), "body");
    }
}
