//! 分发器配置
//!
//! 仅定义配置结构与默认值；从文件或环境变量加载配置由宿主进程负责。
//!
use bon::Builder;
use serde::Deserialize;
use std::time::Duration;

/// 通知分发配置
#[derive(Clone, Debug, Default, Builder, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// 处理器未显式指定桶时使用的默认桶
    #[builder(into)]
    pub default_bucket: Option<String>,
    /// 订阅失败后的重连策略
    #[builder(default)]
    pub retry: RetryPolicy,
}

/// 重新订阅的退避策略：有界指数退避，重试次数不设上限
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// 首次重连前的等待
    pub initial_backoff: Duration,
    /// 等待时间上限
    pub max_backoff: Duration,
    /// 每次连续失败后的放大倍数
    pub multiplier: f64,
}

impl RetryPolicy {
    /// 失败后立即重连，不做等待
    pub const fn immediate() -> Self {
        Self {
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// 第 `attempt` 次连续失败后的等待时间（`attempt` 从 1 开始，0 表示无需等待）
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 || self.initial_backoff.is_zero() {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let base = self.initial_backoff.as_secs_f64() * self.multiplier.max(1.0).powi(exponent);
        let clamped = base.min(self.max_backoff.as_secs_f64()).max(0.0);

        // 上限接近 Duration::MAX 时浮点秒数可能无法再转换回 Duration
        Duration::try_from_secs_f64(clamped)
            .map(|delay| delay.min(self.max_backoff))
            .unwrap_or(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}
