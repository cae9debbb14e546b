use thiserror::Error;

// 终止整次警报调用的错误
// 单个探测/单次投递的失败不走这里，它们在各自组件内转成数据
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // 操作者没有任何映射到社区的版主角色
    #[error("none of your roles identify an alert-raising community")]
    NoOriginFound,

    // 消歧被取消，没选出社区
    #[error("origin selection was cancelled; no alert was raised")]
    OriginUnresolved,

    // 消歧提示本身发送失败
    #[error("could not present the origin choices: {0}")]
    Selector(String),

    // 注册表完全读不到，在任何探测/发送之前就终止
    #[error("community registry unavailable: {0}")]
    Registry(String),
}
