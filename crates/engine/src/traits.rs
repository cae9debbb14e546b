use anyhow::Result;
use async_trait::async_trait;
use domain::{ActorId, AttachmentRef, ChannelId, Community, CommunityId, Invoker, RoleId};

// 平台成员查询端口，每次探测一个只读请求
#[async_trait]
pub trait Membership: Send + Sync {
    // 可失败；prober 把所有失败映射为 Unreachable，单个坏社区不能中断扫描
    async fn is_member(&self, community: &Community, actor: &ActorId) -> Result<bool>;
}

// 平台发消息端口，广播分发器用
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(
        &self,
        channel: &ChannelId,
        body: &str,
        mentions: &[RoleId],
        attachment: Option<&AttachmentRef>,
    ) -> Result<()>;
}

// 交互选择端口：管线唯一的挂起点，等人、无内部超时
#[async_trait]
pub trait Selector: Send + Sync {
    // None = 操作者取消
    async fn present_choices(
        &self,
        invoker: &Invoker,
        candidates: &[Community],
    ) -> Result<Option<CommunityId>>;
}
