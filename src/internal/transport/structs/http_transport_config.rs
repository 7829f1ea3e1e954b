use std::time::Duration;

use url::Url;

/// 默认 User-Agent
pub const DEFAULT_USER_AGENT: &str = concat!("resumable_transfer/", env!("CARGO_PKG_VERSION"));

/// 默认连接超时：10 秒
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// 默认读超时：10 秒内收不到任何数据即判定失败
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP 传输的配置，由 [`HttpTransportBuilder`](super::HttpTransportBuilder) 逐项填写。
#[derive(Clone)]
pub struct HttpTransportConfig {
    /// 相对地址的基准；为 `None` 时只接受完整地址
    pub base_url: Option<Url>,
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// 两次读取之间允许的最长间隔
    pub read_timeout: Duration,
    /// 整个请求（含响应体）的总时限；`None` 为不限制，大文件下载通常不设
    pub timeout: Option<Duration>,
    pub http1_only: bool,
    /// (用户名, 密码)，用于 Basic 认证
    pub(crate) basic_auth: Option<(String, String)>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            timeout: None,
            http1_only: false,
            basic_auth: None,
        }
    }
}

/// 防止 debug 泄漏账号
impl std::fmt::Debug for HttpTransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransportConfig")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("user_agent", &self.user_agent)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("timeout", &self.timeout)
            .field("http1_only", &self.http1_only)
            .field("basic_auth", &self.basic_auth.as_ref().map(|_| "<hidden>"))
            .finish()
    }
}
