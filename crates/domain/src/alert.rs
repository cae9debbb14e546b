use crate::models::{ActorId, AttachmentRef, Community, CommunityId, RoleId};
use serde::{Deserialize, Serialize};

// 一次警报调用的人工输入，来源解析完成后构建一次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertReport {
    pub actor: ActorId,
    pub reason: String,
    pub attachment: Option<AttachmentRef>,
    pub origin: Community, // 以哪个接收警报的社区名义发出
}

// 渲染完成的警报，每个目标频道各投递一份
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub body: String,
    // 按渲染顺序、去重；分发时再按目标追加 notify-all 角色
    pub mentions: Vec<RoleId>,
    pub attachment: Option<AttachmentRef>,
}

impl AlertMessage {
    pub fn push_mention(&mut self, role: RoleId) {
        if !self.mentions.contains(&role) {
            self.mentions.push(role);
        }
    }
}

// 一次广播的记账：哪些目标收到了、哪些失败了；失败不重试
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub delivered: Vec<CommunityId>,
    pub failed: Vec<(CommunityId, String)>,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }

    // 回复给操作者的一行摘要
    pub fn summary(&self) -> String {
        if self.attempted() == 0 {
            return "No communities are configured to receive alerts.".to_string();
        }
        if self.failed.is_empty() {
            return format!(
                "Alert delivered to {} of {} communities.",
                self.delivered.len(),
                self.attempted()
            );
        }
        let failed: Vec<&str> = self.failed.iter().map(|(id, _)| id.as_str()).collect();
        format!(
            "Alert delivered to {} of {} communities. Failed: {}",
            self.delivered.len(),
            self.attempted(),
            failed.join(", ")
        )
    }
}
