//! # 过期会话清理任务

use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use super::session_store::SessionStore;
use crate::error::Result;
use crate::logging::{LogComponent, LogStage};
use crate::{lerror, linfo};

/// 定期删除过期会话
pub struct SessionSweepTask {
    sessions: Arc<SessionStore>,
    interval: Duration,
}

impl SessionSweepTask {
    #[must_use]
    pub const fn new(sessions: Arc<SessionStore>, interval: Duration) -> Self {
        Self { sessions, interval }
    }

    /// 启动清理循环（不会返回）
    pub async fn start(&self) {
        linfo!(
            "system",
            LogStage::BackgroundTask,
            LogComponent::SessionSweeper,
            "sweeper_start",
            &format!(
                "Starting expired session sweeper, interval: {}s",
                self.interval.as_secs()
            )
        );

        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            if let Err(err) = self.sweep_once().await {
                lerror!(
                    "system",
                    LogStage::BackgroundTask,
                    LogComponent::SessionSweeper,
                    "sweep_fail",
                    &format!("Failed to sweep expired sessions: {err}")
                );
            }
        }
    }

    /// 执行一次清理，返回删除条数
    pub async fn sweep_once(&self) -> Result<u64> {
        let removed = self.sessions.delete_expired().await?;
        if removed > 0 {
            linfo!(
                "system",
                LogStage::BackgroundTask,
                LogComponent::SessionSweeper,
                "sweep_done",
                &format!("Removed {removed} expired session(s)")
            );
        }
        Ok(removed)
    }

    /// 在后台运行
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.start().await })
    }
}
