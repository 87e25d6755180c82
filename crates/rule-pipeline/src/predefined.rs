//! 预定义插件集合
//!
//! 提供开箱即用的插件，命令行默认运行的就是这里的整除插件。

use crate::builtins::{divisible_by, join_with, uppercase};
use crate::combinator::RuleCombinator;
use crate::models::{EvaluationContext, Number, Rule, RuleSet, TaggedRuleGroup};
use crate::plugin::Plugin;

/// 整除插件使用的规则
///
/// 同一组规则同时被分组选择器和规则选择器引用，分组标签依赖规则标识保持一致。
#[derive(Debug, Clone)]
pub struct DivisibilityRules {
    pub fizz_buzz: Rule,
    pub fizz: Rule,
    pub buzz: Rule,
}

impl DivisibilityRules {
    pub fn new() -> Self {
        let fizz = Rule::new("Fizz").with_evaluator(divisible_by(3)).priority(1);
        let buzz = Rule::new("Buzz").with_evaluator(divisible_by(5)).priority(1);
        let fizz_buzz = Rule::new("FizzBuzz")
            .with_evaluator(RuleCombinator::and(vec![fizz.clone(), buzz.clone()]).into_evaluator());

        Self {
            fizz_buzz,
            fizz,
            buzz,
        }
    }

    /// 规则集中的顺序；实际评估顺序由优先级决定
    pub fn all(&self) -> Vec<Rule> {
        vec![self.fizz.clone(), self.buzz.clone(), self.fizz_buzz.clone()]
    }
}

impl Default for DivisibilityRules {
    fn default() -> Self {
        Self::new()
    }
}

/// 预定义插件集合
pub struct PredefinedPlugins;

impl PredefinedPlugins {
    /// 整除插件
    ///
    /// - 规则选择器：能被 3 或 5 整除时返回包含 FizzBuzz / Fizz / Buzz 的规则集
    /// - 分组选择器：所有规则归入 `Divisible`；10 的倍数额外在最前面返回 `Decade`
    ///   分组（包含 Buzz 与 FizzBuzz，输出转为大写）
    /// - 结果格式化器：以 `separator` 拼接
    pub fn divisibility(separator: &str) -> Plugin {
        let rules = DivisibilityRules::new();

        let group_rules = rules.clone();
        let set_rules = rules;
        let set_condition =
            RuleCombinator::or(vec![set_rules.fizz.clone(), set_rules.buzz.clone()])
                .into_evaluator();

        Plugin::new()
            .group_selector(move |num: Number, _: &EvaluationContext| {
                let mut groups = Vec::with_capacity(2);
                if num % 10 == 0 {
                    groups.push(
                        TaggedRuleGroup::new(
                            "Decade",
                            vec![group_rules.buzz.clone(), group_rules.fizz_buzz.clone()],
                        )
                        .with_transformer(uppercase()),
                    );
                }
                groups.push(TaggedRuleGroup::new("Divisible", group_rules.all()));
                groups
            })
            .rule_selector(move |_: Number, _: &EvaluationContext| {
                vec![RuleSet::with_condition(set_condition.clone(), set_rules.all())]
            })
            .result_formatter({
                let formatter = join_with(separator);
                move |results: &[String]| formatter(results)
            })
    }
}
