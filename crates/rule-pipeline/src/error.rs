//! 规则流水线错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("无效的步长: {0}（步长必须为正整数）")]
    InvalidStep(i64),

    #[error("序列范围溢出: start={start}, end={end}, step={step}")]
    RangeOverflow { start: i64, end: i64, step: i64 },

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
