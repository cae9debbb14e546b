use crate::models::{ActorId, AttachmentRef, CommunityId, Invoker, RoleId};
use std::collections::BTreeSet;

// 警报调用的入口方式
#[derive(Debug, Clone)]
pub enum AlertTrigger {
    // 人工操作者：来源由其持有的版主角色解析（必要时交互消歧）
    Operator {
        invoker: Invoker,
        held_roles: BTreeSet<RoleId>,
    },
    // 外部事件（如封禁钩子）已知来源，跳过来源解析
    External { origin: CommunityId },
}

#[derive(Debug, Clone)]
pub enum AppCommand {
    RaiseAlert {
        actor: ActorId,
        reason: String,
        attachment: Option<AttachmentRef>,
        trigger: AlertTrigger,
    },
}
