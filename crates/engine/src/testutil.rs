// 引擎测试共用的平台端口假实现

use crate::traits::{Membership, Messenger, Selector};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use domain::{
    ActorId, AlertConfig, AttachmentRef, ChannelId, Community, CommunityId, Invoker, RoleId,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn monitored(id: &str, name: &str) -> Community {
    Community {
        id: CommunityId::new(id),
        name: name.to_string(),
        monitored: true,
        alerts: None,
    }
}

pub fn alerting(id: &str, name: &str) -> Community {
    let tag = name.to_lowercase();
    Community {
        id: CommunityId::new(id),
        name: name.to_string(),
        monitored: false,
        alerts: Some(AlertConfig {
            channel: ChannelId::new(format!("!{}-alerts:fed", tag)),
            location_role: RoleId::new(format!("@{}-mods", tag)),
            notify_all_role: Some(RoleId::new(format!("@{}-all", tag))),
            moderator_role: Some(RoleId::new(format!("!{}-staff:fed", tag))),
        }),
    }
}

pub fn alerting_monitored(id: &str, name: &str) -> Community {
    let mut community = alerting(id, name);
    community.monitored = true;
    community
}

#[derive(Clone, Copy)]
pub enum ProbeBehavior {
    Member,
    NotMember,
    Fail,
    Hang,
}

pub struct FakeMembership {
    behaviors: HashMap<String, ProbeBehavior>,
    calls: AtomicUsize,
}

impl FakeMembership {
    pub fn new<const N: usize>(entries: [(&str, ProbeBehavior); N]) -> Self {
        Self {
            behaviors: entries
                .into_iter()
                .map(|(id, b)| (id.to_string(), b))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Membership for FakeMembership {
    async fn is_member(&self, community: &Community, _actor: &ActorId) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviors.get(community.id.as_str()) {
            Some(ProbeBehavior::Member) => Ok(true),
            Some(ProbeBehavior::NotMember) | None => Ok(false),
            Some(ProbeBehavior::Fail) => Err(anyhow!("permission denied")),
            Some(ProbeBehavior::Hang) => {
                futures::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel: ChannelId,
    pub body: String,
    pub mentions: Vec<RoleId>,
    pub attachment: Option<AttachmentRef>,
}

#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<SentMessage>>,
    failing_channels: HashSet<String>,
}

impl RecordingMessenger {
    pub fn failing_on<const N: usize>(channels: [&str; N]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing_channels: channels.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(
        &self,
        channel: &ChannelId,
        body: &str,
        mentions: &[RoleId],
        attachment: Option<&AttachmentRef>,
    ) -> Result<()> {
        if self.failing_channels.contains(channel.as_str()) {
            return Err(anyhow!("send refused"));
        }
        self.sent.lock().unwrap().push(SentMessage {
            channel: channel.clone(),
            body: body.to_string(),
            mentions: mentions.to_vec(),
            attachment: attachment.cloned(),
        });
        Ok(())
    }
}

pub enum SelectorScript {
    // 测试断言 selector 根本不会被问到
    Unreachable,
    Choose(CommunityId),
    Cancel,
    Fail,
}

pub struct ScriptedSelector {
    script: SelectorScript,
    presented: AtomicUsize,
    last_choice_count: AtomicUsize,
}

impl ScriptedSelector {
    pub fn new(script: SelectorScript) -> Self {
        Self {
            script,
            presented: AtomicUsize::new(0),
            last_choice_count: AtomicUsize::new(0),
        }
    }

    pub fn presented(&self) -> usize {
        self.presented.load(Ordering::SeqCst)
    }

    pub fn last_choice_count(&self) -> usize {
        self.last_choice_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Selector for ScriptedSelector {
    async fn present_choices(
        &self,
        _invoker: &Invoker,
        candidates: &[Community],
    ) -> Result<Option<CommunityId>> {
        self.presented.fetch_add(1, Ordering::SeqCst);
        self.last_choice_count.store(candidates.len(), Ordering::SeqCst);
        match &self.script {
            SelectorScript::Unreachable => panic!("selector must not be consulted"),
            SelectorScript::Choose(id) => Ok(Some(id.clone())),
            SelectorScript::Cancel => Ok(None),
            SelectorScript::Fail => Err(anyhow!("prompt could not be delivered")),
        }
    }
}
