//! CLI 命令定义与执行
//!
//! 命令行参数优先于配置文件；未指定的参数使用配置中的值。

use clap::{Parser, ValueEnum};
use pipeline_shared::config::{AppConfig, SequenceConfig};
use tracing::info;

use crate::builtins::{join_with, prefixed};
use crate::driver::SequenceDriver;
use crate::error::Result;
use crate::predefined::PredefinedPlugins;

/// 规则流水线命令行工具
///
/// 使用预定义的整除插件评估数值区间并输出结果。
#[derive(Parser, Debug)]
#[command(name = "rule-pipeline")]
#[command(version, about = "可插拔规则流水线序列生成工具")]
pub struct Cli {
    /// 起始值
    #[arg(long, allow_negative_numbers = true)]
    pub start: Option<i64>,

    /// 结束值（包含）
    #[arg(long, allow_negative_numbers = true)]
    pub end: Option<i64>,

    /// 步长（正整数）
    #[arg(long, allow_negative_numbers = true)]
    pub step: Option<i64>,

    /// 结果分隔符
    #[arg(long)]
    pub separator: Option<String>,

    /// 无规则命中时默认标签的前缀
    #[arg(long)]
    pub default_prefix: Option<String>,

    /// 输出格式
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// 在 JSON 输出中附带评估追踪
    #[arg(long)]
    pub trace: bool,

    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

/// 输出格式
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// 拼接后的单行字符串
    Text,
    /// 每个数值的详细评估结果
    Json,
}

impl Cli {
    /// 用命令行参数覆盖配置
    pub fn apply(&self, config: &mut AppConfig) {
        let sequence = &mut config.sequence;
        if let Some(start) = self.start {
            sequence.start = start;
        }
        if let Some(end) = self.end {
            sequence.end = end;
        }
        if let Some(step) = self.step {
            sequence.step = step;
        }
        if let Some(separator) = &self.separator {
            sequence.separator = separator.clone();
        }
        if let Some(prefix) = &self.default_prefix {
            sequence.default_prefix = prefix.clone();
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
    }
}

/// 命令执行器
pub struct CommandRunner {
    sequence: SequenceConfig,
}

impl CommandRunner {
    pub fn new(sequence: SequenceConfig) -> Self {
        Self { sequence }
    }

    fn driver(&self) -> SequenceDriver {
        let plugin = PredefinedPlugins::divisibility(&self.sequence.separator);

        SequenceDriver::new(&[plugin])
            .with_default_output(prefixed(self.sequence.default_prefix.as_str()))
            .with_result_formatter(join_with(self.sequence.separator.as_str()))
    }

    /// 生成拼接后的结果字符串
    pub fn run_text(&self) -> Result<String> {
        let SequenceConfig {
            start, end, step, ..
        } = self.sequence;
        info!(start, end, step, "Running sequence");

        self.driver().run(start, end, step)
    }

    /// 生成每个数值的评估结果（JSON）
    pub fn run_json(&self, trace: bool) -> Result<String> {
        let SequenceConfig {
            start, end, step, ..
        } = self.sequence;
        info!(start, end, step, trace, "Running sequence with detailed output");

        let mut driver = self.driver();
        if trace {
            driver = driver.with_trace();
        }
        let results = driver.evaluate_all(start, end, step)?;
        Ok(serde_json::to_string_pretty(&results)?)
    }

    pub fn execute(&self, format: OutputFormat, trace: bool) -> Result<String> {
        match format {
            OutputFormat::Text => self.run_text(),
            OutputFormat::Json => self.run_json(trace),
        }
    }
}
