use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use part_harvest::utils::logging;
use part_harvest::{App, Cli, Config};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            if tracing::dispatcher::has_been_set() {
                error!("❌ 运行失败: {:#}", e);
            } else {
                eprintln!("❌ 运行失败: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    // 加载配置：默认值 → 环境变量 → 命令行
    let config = cli.apply(Config::from_env()?);

    // 初始化日志
    logging::init(&config.log_file, config.verbose_logging)?;

    // 初始化并运行应用
    let app = App::initialize(config).await?;
    let report = app.run().await?;

    Ok(ExitCode::from(report.exit_code()))
}
