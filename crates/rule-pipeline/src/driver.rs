//! 序列驱动
//!
//! 按步长遍历数值区间，逐个调用单值评估器，最后交给结果格式化器生成最终字符串。
//! 序列长度为 `ceil((end - start + 1) / step)`，区间为空时长度为 0。

use crate::builtins::{space_join, stringify};
use crate::error::{PipelineError, Result};
use crate::evaluator::NumberEvaluator;
use crate::models::{EvaluationContext, EvaluationResult, Number};
use crate::plugin::{AggregatedPlugins, DefaultOutput, Plugin, ResultFormatter};
use tracing::{info, instrument};

/// 序列驱动
pub struct SequenceDriver {
    plugins: AggregatedPlugins,
    default_output: DefaultOutput,
    result_formatter: ResultFormatter,
    context: EvaluationContext,
    evaluator: NumberEvaluator,
}

impl SequenceDriver {
    /// 使用默认输出（数值本身）和默认格式化器（空格拼接）
    pub fn new(plugins: &[Plugin]) -> Self {
        Self {
            plugins: AggregatedPlugins::from_plugins(plugins),
            default_output: stringify(),
            result_formatter: space_join(),
            context: EvaluationContext::none(),
            evaluator: NumberEvaluator::new(),
        }
    }

    pub fn with_default_output(mut self, default_output: DefaultOutput) -> Self {
        self.default_output = default_output;
        self
    }

    pub fn with_result_formatter(mut self, result_formatter: ResultFormatter) -> Self {
        self.result_formatter = result_formatter;
        self
    }

    pub fn with_context(mut self, context: EvaluationContext) -> Self {
        self.context = context;
        self
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.evaluator = self.evaluator.with_trace();
        self
    }

    pub fn plugins(&self) -> &AggregatedPlugins {
        &self.plugins
    }

    /// 逐个评估区间内的数值，返回详细结果
    pub fn evaluate_all(
        &self,
        start: Number,
        end: Number,
        step: Number,
    ) -> Result<Vec<EvaluationResult>> {
        let numbers = sequence_numbers(start, end, step)?;

        Ok(numbers
            .into_iter()
            .map(|num| {
                self.evaluator.execute(
                    num,
                    &self.plugins.rule_group_selectors,
                    &self.plugins.rule_selectors,
                    &self.default_output,
                    &self.context,
                )
            })
            .collect())
    }

    /// 运行流水线并格式化结果
    #[instrument(skip(self))]
    pub fn run(&self, start: Number, end: Number, step: Number) -> Result<String> {
        let labels: Vec<String> = self
            .evaluate_all(start, end, step)?
            .into_iter()
            .map(|result| result.label)
            .collect();

        info!(count = labels.len(), "Sequence evaluated");
        Ok((self.result_formatter)(&labels))
    }
}

/// 计算序列长度
///
/// 步长必须为正；`end - start + 1` 溢出时返回 `RangeOverflow`。
pub fn sequence_length(start: Number, end: Number, step: Number) -> Result<usize> {
    if step <= 0 {
        return Err(PipelineError::InvalidStep(step));
    }

    let overflow = || PipelineError::RangeOverflow { start, end, step };
    let span = end
        .checked_sub(start)
        .and_then(|diff| diff.checked_add(1))
        .ok_or_else(overflow)?;

    if span <= 0 {
        return Ok(0);
    }

    let length = span / step + Number::from(span % step != 0);
    usize::try_from(length).map_err(|_| overflow())
}

/// 生成序列：`start + i * step`，`i` 取 `[0, length)`
pub fn sequence_numbers(start: Number, end: Number, step: Number) -> Result<Vec<Number>> {
    let length = sequence_length(start, end, step)?;

    (0..length)
        .map(|index| {
            Number::try_from(index)
                .ok()
                .and_then(|i| i.checked_mul(step))
                .and_then(|offset| start.checked_add(offset))
                .ok_or(PipelineError::RangeOverflow { start, end, step })
        })
        .collect()
}

/// 运行流水线
///
/// `default_output` 缺省为数值本身，`result_formatter` 缺省为空格拼接。
/// 插件自带的结果格式化器只参与聚合，不替代这里的 `result_formatter`。
pub fn run(
    start: Number,
    end: Number,
    step: Number,
    plugins: &[Plugin],
    default_output: Option<DefaultOutput>,
    result_formatter: Option<ResultFormatter>,
) -> Result<String> {
    let mut driver = SequenceDriver::new(plugins);
    if let Some(default_output) = default_output {
        driver = driver.with_default_output(default_output);
    }
    if let Some(result_formatter) = result_formatter {
        driver = driver.with_result_formatter(result_formatter);
    }
    driver.run(start, end, step)
}
