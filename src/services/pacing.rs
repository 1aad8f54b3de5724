use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::debug;

/// 两次下载之间的等待结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaceOutcome {
    Elapsed,
    Interrupted,
}

/// 下载节流：每完成一个分卷后等待固定间隔，避免触发站点限流
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    interval: Duration,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// 等待一个间隔；收到中断信号时提前返回
    pub async fn wait(&self, shutdown: Option<&mut watch::Receiver<bool>>) -> PaceOutcome {
        if self.interval.is_zero() {
            return PaceOutcome::Elapsed;
        }
        debug!("⏳ 等待 {} 秒后继续", self.interval.as_secs_f32());

        let Some(shutdown) = shutdown else {
            sleep(self.interval).await;
            return PaceOutcome::Elapsed;
        };
        if *shutdown.borrow() {
            return PaceOutcome::Interrupted;
        }

        let delay = sleep(self.interval);
        tokio::pin!(delay);
        loop {
            tokio::select! {
                _ = &mut delay => return PaceOutcome::Elapsed,
                changed = shutdown.changed() => match changed {
                    Ok(()) if *shutdown.borrow() => return PaceOutcome::Interrupted,
                    Ok(()) => {}
                    // 发送端已经释放，不会再有中断信号
                    Err(_) => {
                        (&mut delay).await;
                        return PaceOutcome::Elapsed;
                    }
                },
            }
        }
    }
}
