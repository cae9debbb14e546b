use serde::{Deserialize, Serialize};
use std::fmt;

// 被举报用户的平台 ID（纯数字雪花），绝不是显示名
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(s: impl Into<String>) -> Result<Self, String> {
        let s = s.into();
        if s.is_empty() {
            return Err("The user ID is empty.".to_string());
        }
        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(
                "That doesn't look like a user ID. Remember that this needs to be a user \
                 *ID* - a big number, not text."
                    .to_string(),
            );
        }
        if s.len() > 20 {
            return Err("The user ID is too long to be a valid ID.".to_string());
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! opaque_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

opaque_id!(CommunityId);
opaque_id!(ChannelId);
// 角色引用：提及角色是直接渲染进消息的字面量，版主角色由适配层解释
opaque_id!(RoleId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertConfig {
    pub channel: ChannelId,
    pub location_role: RoleId,   // 检测到目标用户时 ping
    pub notify_all_role: Option<RoleId>, // 每条警报都 ping（社区自行 opt-in）
    // 全联邦内必须唯一地映射到一个社区
    pub moderator_role: Option<RoleId>,
}

// 联邦中的一个节点，可以被监控、接收警报，或两者皆是
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    pub id: CommunityId,
    pub name: String,
    pub monitored: bool,
    pub alerts: Option<AlertConfig>,
}

impl Community {
    pub fn receives_alerts(&self) -> bool {
        self.alerts.is_some()
    }
}

impl fmt::Display for Community {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// (社区, 版主角色) 对，用于推断操作者代表哪个社区
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginCandidate {
    pub community: CommunityId,
    pub moderator_role: RoleId,
}

// 证据附件引用，原样透传到投递
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentRef(String);

impl AttachmentRef {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// 发起警报的操作者（消歧提示按此路由回去）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoker {
    pub user: String,
    pub channel: ChannelId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_id_accepts_snowflakes() {
        let id = ActorId::new("145582654857805825").unwrap();
        assert_eq!(id.as_str(), "145582654857805825");
    }

    #[test]
    fn actor_id_rejects_names_and_garbage() {
        assert!(ActorId::new("luxpiggy").is_err());
        assert!(ActorId::new("1234x5").is_err());
        assert!(ActorId::new("").is_err());
        assert!(ActorId::new("123456789012345678901").is_err());
    }
}
