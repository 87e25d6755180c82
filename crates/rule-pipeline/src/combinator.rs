//! 规则组合器
//!
//! 以 AND / OR 组合多条规则的匹配结果（短路求值）。
//! 组合器不会自动参与评估流程，需要通过 `into_evaluator` 接入某条规则的谓词。

use crate::models::{EvaluationContext, Evaluator, Number, Rule};
use crate::operators::LogicalOperator;
use std::sync::Arc;

/// 规则组合器
#[derive(Debug, Clone)]
pub struct RuleCombinator {
    pub operator: LogicalOperator,
    pub rules: Vec<Rule>,
}

impl RuleCombinator {
    pub fn new(operator: LogicalOperator, rules: Vec<Rule>) -> Self {
        Self { operator, rules }
    }

    pub fn and(rules: Vec<Rule>) -> Self {
        Self::new(LogicalOperator::And, rules)
    }

    pub fn or(rules: Vec<Rule>) -> Self {
        Self::new(LogicalOperator::Or, rules)
    }

    /// 转换为规则谓词
    pub fn into_evaluator(self) -> Evaluator {
        Arc::new(move |num: Number, context: &EvaluationContext| {
            evaluate_rule_combinator(&self, num, context)
        })
    }
}

/// 评估组合器
///
/// 成员规则在过滤器放行且谓词成立时视为命中；成员规则的回调不会触发。
/// 空 AND 为真，空 OR 为假。
pub fn evaluate_rule_combinator(
    combinator: &RuleCombinator,
    num: Number,
    context: &EvaluationContext,
) -> bool {
    let member_matches = |rule: &Rule| rule.passes_filter(num) && rule.matches(num, context);

    match combinator.operator {
        // AND: 遇到不匹配立即返回
        LogicalOperator::And => combinator.rules.iter().all(member_matches),
        // OR: 遇到匹配立即返回
        LogicalOperator::Or => combinator.rules.iter().any(member_matches),
    }
}
