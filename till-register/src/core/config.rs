use std::time::Duration;

/// 收银台配置 - 所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (本地订单缓存、日志) |
/// | STORE_URL | http://localhost:54321/rest/v1 | 远程存储地址 |
/// | STORE_API_KEY | (空) | 远程存储 API key |
/// | STORE_TIMEOUT_MS | 10000 | 远程请求超时(毫秒) |
/// | LOG_LEVEL | info | 日志级别 |
/// | CURRENCY_SYMBOL | € | 货币符号 |
/// | ORDER_SYNC_DEBOUNCE_MS | 500 | 订单同步防抖(毫秒) |
/// | INACTIVITY_TIMEOUT_MS | 15000 | 无操作自动保存(毫秒) |
/// | AUTOSAVE_NOTICE_MS | 3000 | 自动保存提示时长(毫秒) |
/// | ORDER_POLL_MS | 5000 | 订单轮询周期(毫秒) |
/// | TABLE_POLL_MS | 10000 | 桌台轮询周期(毫秒) |
/// | MENU_POLL_MS | 60000 | 菜单轮询周期(毫秒) |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/till STORE_URL=https://db.example.com/rest/v1 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct RegisterConfig {
    /// 工作目录，存储本地订单缓存和日志
    pub work_dir: String,
    pub store_url: String,
    pub store_api_key: String,
    pub store_timeout_ms: u64,
    pub log_level: String,
    pub currency_symbol: String,
    pub order_sync_debounce_ms: u64,
    pub inactivity_timeout_ms: u64,
    pub autosave_notice_ms: u64,
    pub order_poll_ms: u64,
    pub table_poll_ms: u64,
    pub menu_poll_ms: u64,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_ms(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl RegisterConfig {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: env_or("WORK_DIR", "./data"),
            store_url: env_or("STORE_URL", "http://localhost:54321/rest/v1"),
            store_api_key: env_or("STORE_API_KEY", ""),
            store_timeout_ms: env_ms("STORE_TIMEOUT_MS", 10_000),
            log_level: env_or("LOG_LEVEL", "info"),
            currency_symbol: env_or("CURRENCY_SYMBOL", shared::money::DEFAULT_CURRENCY_SYMBOL),
            order_sync_debounce_ms: env_ms("ORDER_SYNC_DEBOUNCE_MS", 500),
            inactivity_timeout_ms: env_ms("INACTIVITY_TIMEOUT_MS", 15_000),
            autosave_notice_ms: env_ms("AUTOSAVE_NOTICE_MS", 3_000),
            order_poll_ms: env_ms("ORDER_POLL_MS", 5_000),
            table_poll_ms: env_ms("TABLE_POLL_MS", 10_000),
            menu_poll_ms: env_ms("MENU_POLL_MS", 60_000),
        }
    }

    /// 使用自定义工作目录覆盖配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config
    }

    /// 本地订单缓存文件路径
    pub fn cache_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.work_dir).join("orders.redb")
    }

    /// 日志目录
    pub fn log_dir(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.work_dir).join("logs")
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn order_sync_debounce(&self) -> Duration {
        Duration::from_millis(self.order_sync_debounce_ms)
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_millis(self.inactivity_timeout_ms)
    }

    pub fn autosave_notice(&self) -> Duration {
        Duration::from_millis(self.autosave_notice_ms)
    }

    pub fn order_poll(&self) -> Duration {
        Duration::from_millis(self.order_poll_ms)
    }

    pub fn table_poll(&self) -> Duration {
        Duration::from_millis(self.table_poll_ms)
    }

    pub fn menu_poll(&self) -> Duration {
        Duration::from_millis(self.menu_poll_ms)
    }
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
