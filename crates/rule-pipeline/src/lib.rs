//! 规则流水线
//!
//! 对数值区间逐个评估可插拔规则，生成带标签的结果并格式化为一个字符串：
//! - 规则、规则集与带标签分组模型
//! - 插件聚合（分组选择器、规则选择器、格式化器）
//! - 优先级排序、相邻去重、首个命中生效的单值评估
//! - 装饰器与输出转换器
//! - AND / OR 规则组合器

pub mod builtins;
pub mod cli;
pub mod combinator;
pub mod driver;
pub mod error;
pub mod evaluator;
pub mod models;
pub mod operators;
pub mod plugin;
pub mod predefined;

pub use combinator::{RuleCombinator, evaluate_rule_combinator};
pub use driver::{SequenceDriver, run, sequence_length, sequence_numbers};
pub use error::{PipelineError, Result};
pub use evaluator::{DEFAULT_TAG, NumberEvaluator, evaluate, order_rules};
pub use models::{
    EvaluationContext, EvaluationResult, Evaluator, Number, ResultTransformer, Rule,
    RuleDecorator, RuleEvent, RuleFilter, RuleId, RuleSet, SelectBehavior, TaggedRuleGroup,
};
pub use operators::LogicalOperator;
pub use plugin::{
    AggregatedPlugins, DefaultOutput, Plugin, ResultFormatter, RuleGroupModifier,
    RuleGroupSelector, RuleSelector,
};
pub use predefined::{DivisibilityRules, PredefinedPlugins};
