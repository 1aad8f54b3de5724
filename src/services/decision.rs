//! 失败决策通道 - 业务能力层
//!
//! 下载失败后向操作员（或固定策略）询问：重试、跳过还是中止。

use async_trait::async_trait;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use crate::models::{RunDecision, WorkItem};
use crate::utils::truncate_text;

/// 决策通道
///
/// 调用会阻塞到有答复为止，编排器在此期间不做任何其他事情。
#[async_trait]
pub trait DecisionChannel: Send {
    async fn decide(&mut self, item: &WorkItem, reason: &str, retryable: bool) -> RunDecision;
}

/// 固定策略：无人值守时每次失败都给出同样的答复
#[derive(Debug, Clone, Copy)]
pub struct FixedPolicy(pub RunDecision);

#[async_trait]
impl DecisionChannel for FixedPolicy {
    async fn decide(&mut self, item: &WorkItem, reason: &str, _retryable: bool) -> RunDecision {
        info!("🤖 {} 失败 ({})，按策略{}", item, truncate_text(reason, 80), self.0);
        self.0
    }
}

#[async_trait]
impl<T: DecisionChannel + ?Sized> DecisionChannel for Box<T> {
    async fn decide(&mut self, item: &WorkItem, reason: &str, retryable: bool) -> RunDecision {
        (**self).decide(item, reason, retryable).await
    }
}

/// 终端交互提示
///
/// 输入流结束或读取出错时视为中止。
pub struct ConsolePrompt<R, W> {
    reader: R,
    writer: W,
}

impl ConsolePrompt<BufReader<io::Stdin>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R, W> ConsolePrompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    async fn show(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.flush().await
    }

    async fn ask(&mut self, item: &WorkItem, reason: &str, retryable: bool) -> io::Result<RunDecision> {
        let hint = if retryable {
            "可以重试"
        } else {
            "重试大概率仍会失败"
        };
        self.show(&format!("\n❌ {} 下载失败: {} ({})\n", item, reason, hint))
            .await?;

        loop {
            self.show("   [r] 重试  [s] 跳过 (回车)  [a] 中止 > ").await?;

            let mut line = String::new();
            if self.reader.read_line(&mut line).await? == 0 {
                self.show("\n").await?;
                return Ok(RunDecision::Abort);
            }

            match RunDecision::from_operator_input(&line) {
                Some(decision) => return Ok(decision),
                None => self.show(&format!("   无法识别的输入: {}\n", line.trim())).await?,
            }
        }
    }
}

#[async_trait]
impl<R, W> DecisionChannel for ConsolePrompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn decide(&mut self, item: &WorkItem, reason: &str, retryable: bool) -> RunDecision {
        match self.ask(item, reason, retryable).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!("⚠️ 无法读取操作员输入，按中止处理: {}", e);
                RunDecision::Abort
            }
        }
    }
}
