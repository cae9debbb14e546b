mod table;

pub use table::StaticRegistry;

use domain::{Community, OriginCandidate};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("community registry unavailable: {0}")]
    Unavailable(String),
    // 读到了但结构不合法
    #[error("community registry is misconfigured: {0}")]
    Invalid(String),
}

/// 联邦社区配置的只读视图
// 单次警报调用期间视为一致，警报管线从不写回
pub trait CommunityRegistry: Send + Sync {
    fn monitored(&self) -> Result<Vec<Community>, RegistryError>;

    fn alert_receiving(&self) -> Result<Vec<Community>, RegistryError>;

    // 版主角色 -> 社区 的来源解析表（角色到社区是单射）
    fn origin_candidates(&self) -> Result<Vec<OriginCandidate>, RegistryError>;
}
