//! 常用谓词、装饰器、转换器与格式化器

use crate::models::{
    EvaluationContext, Evaluator, Number, ResultTransformer, Rule, RuleDecorator,
};
use crate::plugin::{DefaultOutput, ResultFormatter};
use std::sync::Arc;

/// 能被 `divisor` 整除；`divisor` 为 0 时永不成立
pub fn divisible_by(divisor: Number) -> Evaluator {
    Arc::new(move |num: Number, _: &EvaluationContext| divisor != 0 && num % divisor == 0)
}

pub fn always() -> Evaluator {
    Arc::new(|_: Number, _: &EvaluationContext| true)
}

pub fn never() -> Evaluator {
    Arc::new(|_: Number, _: &EvaluationContext| false)
}

/// 覆盖规则优先级
pub fn with_priority(priority: i32) -> RuleDecorator {
    Arc::new(move |rule: Rule| rule.priority(priority))
}

/// 改写规则输出
pub fn map_output<F>(f: F) -> RuleDecorator
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    Arc::new(move |rule: Rule| {
        let output = f(&rule.output);
        rule.with_output(output)
    })
}

pub fn uppercase() -> ResultTransformer {
    Arc::new(|output: &str, _: Number, _: &EvaluationContext| output.to_uppercase())
}

/// 在输出后追加数值，如 `Fizz-12`
pub fn append_number(separator: impl Into<String>) -> ResultTransformer {
    let separator = separator.into();
    Arc::new(move |output: &str, num: Number, _: &EvaluationContext| {
        format!("{}{}{}", output, separator, num)
    })
}

pub fn wrap(prefix: impl Into<String>, suffix: impl Into<String>) -> ResultTransformer {
    let (prefix, suffix) = (prefix.into(), suffix.into());
    Arc::new(move |output: &str, _: Number, _: &EvaluationContext| {
        format!("{}{}{}", prefix, output, suffix)
    })
}

pub fn join_with(separator: impl Into<String>) -> ResultFormatter {
    let separator = separator.into();
    Arc::new(move |results: &[String]| results.join(&separator))
}

/// 默认格式化器：单个空格拼接
pub fn space_join() -> ResultFormatter {
    join_with(" ")
}

/// 默认输出：数值本身
pub fn stringify() -> DefaultOutput {
    Arc::new(|num| num.to_string())
}

pub fn prefixed(prefix: impl Into<String>) -> DefaultOutput {
    let prefix = prefix.into();
    Arc::new(move |num| format!("{}{}", prefix, num))
}
