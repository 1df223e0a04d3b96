//! 客户端配置模块
//!
//! `ClientConfig` 在会话建立时构造一次，此后由所有调用共享只读。
//! setter 只应在第一次调用之前使用。

use crate::error::{Result, RpcError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const DEF_RETRY_COUNT: u32 = 3;
const DEF_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const DEF_SCAN_BATCH_SIZE: usize = 100;
const DEF_IGNORE_TRUNCATION: bool = true;
const DEF_TRUNCATION_AS_WARNING: bool = false;
const DEF_METADATA_RELOAD_PERIOD: Duration = Duration::from_secs(10);
// 512MB - 1，保证能放进 i32 帧长度
const DEF_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024 - 1;

const DEF_BASE_DELAY_MS: u64 = 100;
const DEF_MULTIPLIER: u32 = 2;
const DEF_MAX_DELAY_MS: u64 = 10_000;

/// host:port 地址
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostAndPort {
    pub host: String,
    pub port: u16,
}

impl HostAndPort {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl FromStr for HostAndPort {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| RpcError::invalid_endpoint(s, "缺少端口"))?;

        // IPv6 地址需要使用方括号包裹，如 [::1]:2379
        let host = match host.strip_prefix('[') {
            Some(inner) => inner
                .strip_suffix(']')
                .ok_or_else(|| RpcError::invalid_endpoint(s, "IPv6 地址缺少 `]`"))?,
            None if host.contains(':') => {
                return Err(RpcError::invalid_endpoint(s, "IPv6 地址必须用方括号包裹"));
            }
            None => host,
        };
        if host.is_empty() {
            return Err(RpcError::invalid_endpoint(s, "主机名为空"));
        }

        let port: u16 = port
            .parse()
            .map_err(|e| RpcError::invalid_endpoint(s, format!("端口非法: {}", e)))?;
        if port == 0 {
            return Err(RpcError::invalid_endpoint(s, "端口不能为 0"));
        }

        Ok(HostAndPort::new(host, port))
    }
}

impl fmt::Display for HostAndPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// 解析逗号分隔的地址列表，保持输入顺序
pub fn parse_endpoints(endpoints: &str) -> Result<Vec<HostAndPort>> {
    if endpoints.trim().is_empty() {
        return Err(RpcError::config("地址列表为空"));
    }
    endpoints.split(',').map(str::parse).collect()
}

/// 退避策略类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffKind {
    /// 指数退避：base * multiplier^n，不超过 max
    Exponential {
        #[serde(default = "default_base_delay_ms")]
        base_delay_ms: u64,
        #[serde(default = "default_multiplier")]
        multiplier: u32,
        #[serde(default = "default_max_delay_ms")]
        max_delay_ms: u64,
    },
    /// 固定延迟
    Fixed { delay_ms: u64 },
    /// 立即重试
    #[serde(rename = "none")]
    NoBackoff,
}

fn default_base_delay_ms() -> u64 {
    DEF_BASE_DELAY_MS
}

fn default_multiplier() -> u32 {
    DEF_MULTIPLIER
}

fn default_max_delay_ms() -> u64 {
    DEF_MAX_DELAY_MS
}

impl Default for BackoffKind {
    fn default() -> Self {
        BackoffKind::Exponential {
            base_delay_ms: DEF_BASE_DELAY_MS,
            multiplier: DEF_MULTIPLIER,
            max_delay_ms: DEF_MAX_DELAY_MS,
        }
    }
}

/// 客户端配置
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    retry_count: u32,
    timeout: Duration,
    backoff: BackoffKind,
    scan_batch_size: usize,
    ignore_truncation_errors: bool,
    truncation_as_warning: bool,
    metadata_reload_period: Duration,
    max_frame_size: usize,
    endpoints: Vec<HostAndPort>,
}

impl ClientConfig {
    /// 从逗号分隔的地址串创建默认配置
    ///
    /// # 示例
    /// ```rust
    /// use flare_rpc_client::ClientConfig;
    ///
    /// let config = ClientConfig::create_default("pd1:2379,pd2:2379").unwrap();
    /// assert_eq!(config.retry_count(), 3);
    /// assert_eq!(config.endpoints().len(), 2);
    /// ```
    pub fn create_default(endpoints: &str) -> Result<Self> {
        Ok(Self {
            retry_count: DEF_RETRY_COUNT,
            timeout: DEF_TIMEOUT,
            backoff: BackoffKind::default(),
            scan_batch_size: DEF_SCAN_BATCH_SIZE,
            ignore_truncation_errors: DEF_IGNORE_TRUNCATION,
            truncation_as_warning: DEF_TRUNCATION_AS_WARNING,
            metadata_reload_period: DEF_METADATA_RELOAD_PERIOD,
            max_frame_size: DEF_MAX_FRAME_SIZE,
            endpoints: parse_endpoints(endpoints)?,
        })
    }

    /// 从 TOML 文本加载配置，缺省字段使用默认值
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ClientConfigFile = toml::from_str(content)?;
        file.into_config()
    }

    /// 从 TOML 文件加载配置
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.endpoints.is_empty() {
            return Err(RpcError::config("地址列表为空"));
        }
        if self.timeout.is_zero() {
            return Err(RpcError::config("timeout 必须大于 0"));
        }
        if self.max_frame_size == 0 {
            return Err(RpcError::config("max_frame_size 必须大于 0"));
        }
        if self.scan_batch_size == 0 {
            return Err(RpcError::config("scan_batch_size 必须大于 0"));
        }
        if let BackoffKind::Exponential { multiplier: 0, .. } = self.backoff {
            return Err(RpcError::config("指数退避的 multiplier 必须大于 0"));
        }
        Ok(())
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn backoff(&self) -> BackoffKind {
        self.backoff
    }

    pub fn scan_batch_size(&self) -> usize {
        self.scan_batch_size
    }

    pub fn ignore_truncation_errors(&self) -> bool {
        self.ignore_truncation_errors
    }

    pub fn truncation_as_warning(&self) -> bool {
        self.truncation_as_warning
    }

    pub fn metadata_reload_period(&self) -> Duration {
        self.metadata_reload_period
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    pub fn endpoints(&self) -> &[HostAndPort] {
        &self.endpoints
    }

    /// 设置重试次数（不含首次调用）
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// 设置单次调用超时
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 设置退避策略
    pub fn with_backoff(mut self, backoff: BackoffKind) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_scan_batch_size(mut self, scan_batch_size: usize) -> Self {
        self.scan_batch_size = scan_batch_size;
        self
    }

    pub fn with_ignore_truncation_errors(mut self, ignore: bool) -> Self {
        self.ignore_truncation_errors = ignore;
        self
    }

    pub fn with_truncation_as_warning(mut self, as_warning: bool) -> Self {
        self.truncation_as_warning = as_warning;
        self
    }

    /// 设置元数据刷新周期
    pub fn with_metadata_reload_period(mut self, period: Duration) -> Self {
        self.metadata_reload_period = period;
        self
    }

    /// 设置最大帧大小（字节）
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }
}

/// 配置文件中的地址，可以是逗号分隔的字符串或数组
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EndpointList {
    Csv(String),
    List(Vec<String>),
}

/// 配置文件格式
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClientConfigFile {
    endpoints: EndpointList,
    retry_count: Option<u32>,
    timeout_secs: Option<u64>,
    scan_batch_size: Option<usize>,
    ignore_truncation_errors: Option<bool>,
    truncation_as_warning: Option<bool>,
    metadata_reload_period_secs: Option<u64>,
    max_frame_size: Option<usize>,
    backoff: Option<BackoffKind>,
}

impl ClientConfigFile {
    fn into_config(self) -> Result<ClientConfig> {
        let csv = match self.endpoints {
            EndpointList::Csv(s) => s,
            EndpointList::List(list) => list.join(","),
        };

        let mut config = ClientConfig::create_default(&csv)?;
        if let Some(v) = self.retry_count {
            config = config.with_retry_count(v);
        }
        if let Some(v) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(v));
        }
        if let Some(v) = self.scan_batch_size {
            config = config.with_scan_batch_size(v);
        }
        if let Some(v) = self.ignore_truncation_errors {
            config = config.with_ignore_truncation_errors(v);
        }
        if let Some(v) = self.truncation_as_warning {
            config = config.with_truncation_as_warning(v);
        }
        if let Some(v) = self.metadata_reload_period_secs {
            config = config.with_metadata_reload_period(Duration::from_secs(v));
        }
        if let Some(v) = self.max_frame_size {
            config = config.with_max_frame_size(v);
        }
        if let Some(v) = self.backoff {
            config = config.with_backoff(v);
        }

        config.validate()?;
        Ok(config)
    }
}
