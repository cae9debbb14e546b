use crate::{CommunityRegistry, RegistryError};
use domain::{AlertConfig, Community, CommunityId, OriginCandidate};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default)]
    community: Vec<CommunityEntry>,
}

#[derive(Deserialize)]
struct CommunityEntry {
    id: CommunityId,
    name: String,
    #[serde(default)]
    monitored: bool,
    #[serde(default = "default_enabled")]
    enabled: bool,
    alerts: Option<AlertConfig>,
}

fn default_enabled() -> bool {
    true
}

// 整个联邦 = 启动时加载的一张不可变表
// 要么加载成功且所有视图可用，要么启动直接失败
#[derive(Debug)]
pub struct StaticRegistry {
    communities: Vec<Community>,
}

impl StaticRegistry {
    // path 不带扩展名，遵循 config crate 的文件源约定
    pub fn load(path: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?
            .try_deserialize()
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;

        let registry = Self::from_entries(file.community)?;
        info!(
            monitored = registry.communities.iter().filter(|c| c.monitored).count(),
            alert_receiving = registry
                .communities
                .iter()
                .filter(|c| c.receives_alerts())
                .count(),
            "Community registry loaded from {}",
            path
        );
        Ok(registry)
    }

    #[doc(hidden)]
    pub fn from_toml_str(toml: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?
            .try_deserialize()
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;
        Self::from_entries(file.community)
    }

    fn from_entries(entries: Vec<CommunityEntry>) -> Result<Self, RegistryError> {
        let enabled = entries.into_iter().filter(|e| e.enabled);
        let communities: Vec<Community> = enabled
            .map(|e| Community {
                id: e.id,
                name: e.name,
                monitored: e.monitored,
                alerts: e.alerts,
            })
            .collect();
        Self::validate(&communities)?;
        Ok(Self { communities })
    }

    fn validate(communities: &[Community]) -> Result<(), RegistryError> {
        let mut seen_ids = BTreeMap::new();
        let mut seen_mod_roles = BTreeMap::new();

        for community in communities {
            if !community.monitored && !community.receives_alerts() {
                return Err(RegistryError::Invalid(format!(
                    "community '{}' is neither monitored nor alert-receiving",
                    community.id
                )));
            }
            if let Some(previous) = seen_ids.insert(&community.id, &community.name) {
                return Err(RegistryError::Invalid(format!(
                    "community id '{}' is used by both '{}' and '{}'",
                    community.id, previous, community.name
                )));
            }
            if let Some(role) = community.alerts.as_ref().and_then(|a| a.moderator_role.as_ref()) {
                if let Some(previous) = seen_mod_roles.insert(role, &community.name) {
                    return Err(RegistryError::Invalid(format!(
                        "moderator role '{}' maps to both '{}' and '{}'; \
                         the role-to-community mapping must be unique",
                        role, previous, community.name
                    )));
                }
            }
        }
        Ok(())
    }
}

impl CommunityRegistry for StaticRegistry {
    fn monitored(&self) -> Result<Vec<Community>, RegistryError> {
        Ok(self
            .communities
            .iter()
            .filter(|c| c.monitored)
            .cloned()
            .collect())
    }

    fn alert_receiving(&self) -> Result<Vec<Community>, RegistryError> {
        Ok(self
            .communities
            .iter()
            .filter(|c| c.receives_alerts())
            .cloned()
            .collect())
    }

    fn origin_candidates(&self) -> Result<Vec<OriginCandidate>, RegistryError> {
        Ok(self
            .communities
            .iter()
            .filter_map(|c| {
                let role = c.alerts.as_ref()?.moderator_role.as_ref()?;
                Some(OriginCandidate {
                    community: c.id.clone(),
                    moderator_role: role.clone(),
                })
            })
            .collect())
    }
}
