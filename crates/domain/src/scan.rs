use crate::models::{Community, CommunityId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanOutcome {
    Present,
    Absent,
    // 探测失败（权限/限流/社区离线），等于"没扫到"而不是 Absent
    Unreachable,
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanOutcome::Present => "present",
            ScanOutcome::Absent => "absent",
            ScanOutcome::Unreachable => "unreachable",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEntry {
    pub community: Community,
    pub outcome: ScanOutcome,
}

// 每个被监控社区恰好一条结果，每次警报重新生成
// BTreeMap 保证迭代顺序稳定，下游渲染才可确定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    entries: BTreeMap<CommunityId, ScanEntry>,
}

impl ScanResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, community: Community, outcome: ScanOutcome) {
        self.entries
            .insert(community.id.clone(), ScanEntry { community, outcome });
    }

    pub fn contains(&self, id: &CommunityId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn outcome_of(&self, id: &CommunityId) -> Option<ScanOutcome> {
        self.entries.get(id).map(|e| e.outcome)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ScanEntry> {
        self.entries.values()
    }

    pub fn with_outcome(&self, outcome: ScanOutcome) -> impl Iterator<Item = &Community> {
        self.entries
            .values()
            .filter(move |e| e.outcome == outcome)
            .map(|e| &e.community)
    }

    pub fn any_present(&self) -> bool {
        self.entries
            .values()
            .any(|e| e.outcome == ScanOutcome::Present)
    }
}
