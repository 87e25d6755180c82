//! 规则流水线命令行入口
//!
//! 默认评估 10..=50（步长 2），结果以 `|` 拼接后输出到标准输出。

use anyhow::Result;
use clap::Parser;
use pipeline_shared::config::AppConfig;
use pipeline_shared::observability;
use rule_pipeline::cli::{Cli, CommandRunner};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 统一加载配置：从 config/{service_name}.toml 加载，命令行参数优先
    let mut config = AppConfig::load("rule-pipeline").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });
    cli.apply(&mut config);

    observability::init(&config.observability)?;

    let runner = CommandRunner::new(config.sequence);
    let output = runner.execute(cli.format, cli.trace)?;
    println!("{}", output);

    Ok(())
}
