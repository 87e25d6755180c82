//! 单值评估器
//!
//! 对一个数值依次执行：收集分组与规则集、按条件筛选规则集、规则排序去重、
//! 首个命中规则生效、应用装饰器与输出转换器，最终生成带标签的结果。

use crate::models::{EvaluationContext, EvaluationResult, Number, Rule, RuleSet, TaggedRuleGroup};
use crate::plugin::{DefaultOutput, RuleGroupSelector, RuleSelector};
use tracing::{debug, trace};

/// 命中规则不属于任何分组时使用的标签
pub const DEFAULT_TAG: &str = "Default";

/// 单值评估器
pub struct NumberEvaluator {
    /// 是否记录详细评估追踪
    trace_enabled: bool,
}

impl NumberEvaluator {
    pub fn new() -> Self {
        Self {
            trace_enabled: false,
        }
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    /// 评估单个数值
    ///
    /// 选择器或谓词中的 panic 不做拦截，直接终止整个运行。
    pub fn execute(
        &self,
        num: Number,
        group_selectors: &[RuleGroupSelector],
        rule_selectors: &[RuleSelector],
        default_output: &DefaultOutput,
        context: &EvaluationContext,
    ) -> EvaluationResult {
        let mut result = EvaluationResult::new(num);

        let matching_groups: Vec<TaggedRuleGroup> = group_selectors
            .iter()
            .flat_map(|selector| selector(num, context))
            .collect();
        let rule_sets: Vec<RuleSet> = rule_selectors
            .iter()
            .flat_map(|selector| selector(num, context))
            .collect();

        self.record(&mut result, || {
            format!(
                "{}: 收集到 {} 个分组, {} 个规则集",
                num,
                matching_groups.len(),
                rule_sets.len()
            )
        });

        for (index, rule_set) in rule_sets.iter().enumerate() {
            if !rule_set.is_active(num, context) {
                self.record(&mut result, || format!("rule_sets[{}]: 条件不成立, 跳过", index));
                continue;
            }

            if let Some(label) =
                self.evaluate_rule_set(num, index, rule_set, &matching_groups, context, &mut result)
            {
                debug!(num, rule_set = index, label = %label, "Rule matched");
                result.label = label;
                result.matched = true;
                result.rule_set_index = Some(index);
                return result;
            }
        }

        let label = default_output(num);
        self.record(&mut result, || format!("{}: 无规则命中, 使用默认输出 {}", num, label));
        debug!(num, label = %label, "No rule matched, using default output");
        result.label = label;
        result
    }

    /// 评估规则集中的规则，返回首个命中规则生成的标签
    fn evaluate_rule_set(
        &self,
        num: Number,
        index: usize,
        rule_set: &RuleSet,
        matching_groups: &[TaggedRuleGroup],
        context: &EvaluationContext,
        result: &mut EvaluationResult,
    ) -> Option<String> {
        for rule in order_rules(&rule_set.rules) {
            if !rule.passes_filter(num) {
                self.record(result, || {
                    format!("rule_sets[{}]: 规则 {} 被过滤", index, rule.output)
                });
                continue;
            }

            if !rule.matches(num, context) {
                trace!(num, rule_id = %rule.id(), "Rule not matched");
                continue;
            }

            rule.fire_events(num);

            let groups: Vec<&TaggedRuleGroup> = matching_groups
                .iter()
                .filter(|group| group.contains(rule.id()))
                .collect();

            let decorated = groups
                .iter()
                .flat_map(|group| group.decorators.iter())
                .fold(rule.clone(), |current, decorator| decorator(current));

            let tag = groups.first().map_or(DEFAULT_TAG, |group| group.tag.as_str());

            let body = groups
                .iter()
                .filter_map(|group| group.result_transformer.as_ref())
                .fold(decorated.output.clone(), |output, transformer| {
                    transformer(&output, num, context)
                });

            self.record(result, || {
                format!(
                    "rule_sets[{}]: 规则 {} 命中 (分组 {}, 标签 {})",
                    index,
                    rule.output,
                    groups.len(),
                    tag
                )
            });

            result.rule_id = Some(rule.id());
            result.tag = Some(tag.to_string());
            return Some(format!("[{}: {}]", tag, body));
        }

        None
    }

    fn record(&self, result: &mut EvaluationResult, line: impl FnOnce() -> String) {
        if self.trace_enabled {
            result.evaluation_trace.push(line());
        }
    }
}

impl Default for NumberEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// 按优先级升序稳定排序，并移除与前一条相同标识的规则（仅相邻去重）
pub fn order_rules(rules: &[Rule]) -> Vec<&Rule> {
    let mut ordered: Vec<&Rule> = rules.iter().collect();
    ordered.sort_by_key(|rule| rule.priority);
    ordered.dedup_by_key(|rule| rule.id());
    ordered
}

/// 评估单个数值，返回标签
pub fn evaluate(
    num: Number,
    group_selectors: &[RuleGroupSelector],
    rule_selectors: &[RuleSelector],
    default_output: &DefaultOutput,
    context: &EvaluationContext,
) -> String {
    NumberEvaluator::new()
        .execute(num, group_selectors, rule_selectors, default_output, context)
        .label
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn not_divisible() -> DefaultOutput {
        Arc::new(|n: Number| format!("NotDivisible-{}", n))
    }

    fn rule_selector(sets: impl Fn(Number) -> Vec<RuleSet> + Send + Sync + 'static) -> RuleSelector {
        Arc::new(move |n: Number, _: &EvaluationContext| sets(n))
    }

    fn group_selector(groups: Vec<TaggedRuleGroup>) -> RuleGroupSelector {
        Arc::new(move |_: Number, _: &EvaluationContext| groups.clone())
    }

    fn eval(num: Number, groups: &[RuleGroupSelector], rules: &[RuleSelector]) -> String {
        evaluate(num, groups, rules, &not_divisible(), &EvaluationContext::none())
    }

    #[test]
    fn test_multiple_of_three_fizz() {
        let selector = rule_selector(|n| {
            if n % 3 == 0 {
                vec![RuleSet::always(vec![Rule::new("Fizz").when(|_, _| true)])]
            } else {
                Vec::new()
            }
        });

        assert_eq!(eval(12, &[], &[selector.clone()]), "[Default: Fizz]");
        assert_eq!(eval(13, &[], &[selector]), "NotDivisible-13");
    }

    #[test]
    fn test_no_selectors_falls_back_to_default() {
        assert_eq!(eval(7, &[], &[]), "NotDivisible-7");
    }

    #[test]
    fn test_inactive_rule_set_is_skipped() {
        let selector = rule_selector(|_| {
            vec![RuleSet::new(|_, _| false, vec![Rule::new("Never").when(|_, _| true)])]
        });
        assert_eq!(eval(3, &[], &[selector]), "NotDivisible-3");
    }

    #[test]
    fn test_rule_without_evaluator_never_matches() {
        let selector = rule_selector(|_| vec![RuleSet::always(vec![Rule::new("Malformed")])]);
        assert_eq!(eval(3, &[], &[selector]), "NotDivisible-3");
    }

    #[test]
    fn test_priority_order() {
        let low = Rule::new("R2").when(|_, _| true).priority(2);
        let high = Rule::new("R1").when(|_, _| true).priority(1);
        let selector = rule_selector(move |_| vec![RuleSet::always(vec![low.clone(), high.clone()])]);

        assert_eq!(eval(5, &[], &[selector]), "[Default: R1]");
    }

    #[test]
    fn test_stable_sort_keeps_original_order_on_ties() {
        let first = Rule::new("First").when(|_, _| true);
        let second = Rule::new("Second").when(|_, _| true);
        let selector = rule_selector(move |_| vec![RuleSet::always(vec![first.clone(), second.clone()])]);

        assert_eq!(eval(5, &[], &[selector]), "[Default: First]");
    }

    #[test]
    fn test_order_rules_removes_adjacent_duplicates_only() {
        let a = Rule::new("A");
        let b = Rule::new("B");

        let adjacent = vec![a.clone(), a.clone(), b.clone()];
        let ids: Vec<_> = order_rules(&adjacent).iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![a.id(), b.id()]);

        let separated = vec![a.clone(), b.clone(), a.clone()];
        assert_eq!(order_rules(&separated).len(), 3);

        // 不同规则即使内容相同也不会被去重
        let lookalikes = vec![Rule::new("A"), Rule::new("A")];
        assert_eq!(order_rules(&lookalikes).len(), 2);
    }

    #[test]
    fn test_adjacent_duplicate_evaluated_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let miss = Rule::new("Miss").when(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            false
        });
        let selector = rule_selector(move |_| vec![RuleSet::always(vec![miss.clone(), miss.clone()])]);

        assert_eq!(eval(4, &[], &[selector]), "NotDivisible-4");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_filter_skips_rule() {
        let blocked = Rule::new("Blocked").when(|_, _| true).filter(|n| n > 100);
        let fallback = Rule::new("Allowed").when(|_, _| true).priority(5);
        let selector =
            rule_selector(move |_| vec![RuleSet::always(vec![blocked.clone(), fallback.clone()])]);

        assert_eq!(eval(5, &[], &[selector.clone()]), "[Default: Allowed]");
        assert_eq!(eval(500, &[], &[selector]), "[Default: Blocked]");
    }

    #[test]
    fn test_first_matching_rule_set_wins() {
        let selector = rule_selector(|_| {
            vec![
                RuleSet::always(vec![Rule::new("Miss").when(|_, _| false)]),
                RuleSet::always(vec![Rule::new("Second").when(|_, _| true)]),
                RuleSet::always(vec![Rule::new("Third").when(|_, _| true)]),
            ]
        });
        let extra = rule_selector(|_| vec![RuleSet::always(vec![Rule::new("Later").when(|_, _| true)])]);

        assert_eq!(eval(1, &[], &[selector, extra]), "[Default: Second]");
    }

    #[test]
    fn test_events_fire_in_order_for_winner_only() {
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let (first, second, loser) = (log.clone(), log.clone(), log.clone());

        let winner = Rule::new("Win")
            .when(|_, _| true)
            .on_match(move |n| first.lock().push(format!("a{}", n)))
            .on_match(move |n| second.lock().push(format!("b{}", n)));
        let other = Rule::new("Lose")
            .when(|_, _| true)
            .priority(1)
            .on_match(move |n| loser.lock().push(format!("lose{}", n)));
        let selector =
            rule_selector(move |_| vec![RuleSet::always(vec![other.clone(), winner.clone()])]);

        eval(9, &[], &[selector]);
        assert_eq!(*log.lock(), vec!["a9".to_string(), "b9".to_string()]);
    }

    #[test]
    fn test_tag_from_first_group() {
        let fizz = Rule::new("Fizz").when(|_, _| true);
        let groups = vec![
            TaggedRuleGroup::new("Unrelated", vec![Rule::new("Other")]),
            TaggedRuleGroup::new("Primary", vec![fizz.clone()]),
            TaggedRuleGroup::new("Secondary", vec![fizz.clone()]),
        ];
        let selector = rule_selector(move |_| vec![RuleSet::always(vec![fizz.clone()])]);

        assert_eq!(eval(3, &[group_selector(groups)], &[selector]), "[Primary: Fizz]");
    }

    #[test]
    fn test_group_with_lookalike_rule_does_not_tag() {
        let fizz = Rule::new("Fizz").when(|_, _| true);
        let groups = vec![TaggedRuleGroup::new("Tagged", vec![Rule::new("Fizz")])];
        let selector = rule_selector(move |_| vec![RuleSet::always(vec![fizz.clone()])]);

        assert_eq!(eval(3, &[group_selector(groups)], &[selector]), "[Default: Fizz]");
    }

    #[test]
    fn test_decorator_fold_order() {
        let fizz = Rule::new("Fizz").when(|_, _| true);
        let groups = vec![
            TaggedRuleGroup::new("G1", vec![fizz.clone()])
                .decorate(|rule| {
                    let output = format!("D1({})", rule.output);
                    rule.with_output(output)
                })
                .decorate(|rule| {
                    let output = format!("D2({})", rule.output);
                    rule.with_output(output)
                }),
            TaggedRuleGroup::new("G2", vec![fizz.clone()]).decorate(|rule| {
                let output = format!("D3({})", rule.output);
                rule.with_output(output)
            }),
        ];
        let shared = fizz.clone();
        let selector = rule_selector(move |_| vec![RuleSet::always(vec![shared.clone()])]);

        assert_eq!(
            eval(3, &[group_selector(groups)], &[selector]),
            "[G1: D3(D2(D1(Fizz)))]"
        );
        // 装饰器不修改原规则
        assert_eq!(fizz.output, "Fizz");
    }

    #[test]
    fn test_transformer_fold_order() {
        let fizz = Rule::new("Fizz").when(|_, _| true);
        let groups = vec![
            TaggedRuleGroup::new("T", vec![fizz.clone()])
                .transform(|output, n, _| format!("T1({},{})", output, n)),
            TaggedRuleGroup::new("U", vec![fizz.clone()])
                .transform(|output, n, _| format!("T2({},{})", output, n)),
        ];
        let selector = rule_selector(move |_| vec![RuleSet::always(vec![fizz.clone()])]);

        assert_eq!(
            eval(6, &[group_selector(groups)], &[selector]),
            "[T: T2(T1(Fizz,6),6)]"
        );
    }

    #[test]
    fn test_transformers_apply_after_decorators() {
        let fizz = Rule::new("Fizz").when(|_, _| true);
        let groups = vec![
            TaggedRuleGroup::new("G", vec![fizz.clone()])
                .transform(|output, _, _| output.to_lowercase())
                .decorate(|rule| rule.with_output("Decorated")),
        ];
        let selector = rule_selector(move |_| vec![RuleSet::always(vec![fizz.clone()])]);

        assert_eq!(eval(3, &[group_selector(groups)], &[selector]), "[G: decorated]");
    }

    #[test]
    fn test_rule_own_transformer_is_not_applied() {
        let fizz = Rule::new("Fizz")
            .when(|_, _| true)
            .transform(|_, _, _| "ignored".to_string());
        let selector = rule_selector(move |_| vec![RuleSet::always(vec![fizz.clone()])]);

        assert_eq!(eval(3, &[], &[selector]), "[Default: Fizz]");
    }

    #[test]
    fn test_context_reaches_predicates_and_transformers() {
        let ctx = EvaluationContext::new(serde_json::json!({ "threshold": 10, "suffix": "!" }));
        let big = Rule::new("Big").when(|n, ctx| {
            ctx.get_field("threshold")
                .and_then(|v| v.as_i64())
                .is_some_and(|threshold| n > threshold)
        });
        let groups = vec![TaggedRuleGroup::new("Size", vec![big.clone()]).transform(|output, _, ctx| {
            let suffix = ctx.get_field("suffix").and_then(|v| v.as_str()).unwrap_or("");
            format!("{}{}", output, suffix)
        })];
        let selector = rule_selector(move |_| vec![RuleSet::always(vec![big.clone()])]);
        let default = not_divisible();

        let groups = [group_selector(groups)];
        let rules = [selector];
        assert_eq!(evaluate(11, &groups, &rules, &default, &ctx), "[Size: Big!]");
        assert_eq!(evaluate(9, &groups, &rules, &default, &ctx), "NotDivisible-9");
    }

    #[test]
    fn test_execute_reports_details_and_trace() {
        let fizz = Rule::new("Fizz").when(|n, _| n % 3 == 0);
        let id = fizz.id();
        let selector = rule_selector(move |_| {
            vec![
                RuleSet::new(|_, _| false, Vec::new()),
                RuleSet::always(vec![fizz.clone()]),
            ]
        });
        let evaluator = NumberEvaluator::new().with_trace();

        let result = evaluator.execute(
            9,
            &[],
            &[selector.clone()],
            &not_divisible(),
            &EvaluationContext::none(),
        );
        assert!(result.matched);
        assert_eq!(result.label, "[Default: Fizz]");
        assert_eq!(result.rule_id, Some(id));
        assert_eq!(result.tag.as_deref(), Some(DEFAULT_TAG));
        assert_eq!(result.rule_set_index, Some(1));
        assert_eq!(result.evaluation_trace.len(), 3);

        let miss = NumberEvaluator::new().execute(
            10,
            &[],
            &[selector],
            &not_divisible(),
            &EvaluationContext::none(),
        );
        assert!(!miss.matched);
        assert_eq!(miss.label, "NotDivisible-10");
        assert!(miss.evaluation_trace.is_empty());
    }

    #[test]
    fn test_repeated_evaluation_is_deterministic() {
        let a = Rule::new("A").when(|n, _| n % 2 == 0).priority(3);
        let b = Rule::new("B").when(|n, _| n % 4 == 0).priority(1);
        let selector = rule_selector(move |_| vec![RuleSet::always(vec![a.clone(), b.clone()])]);
        let rules = [selector];

        let first = eval(8, &[], &rules);
        for _ in 0..10 {
            assert_eq!(eval(8, &[], &rules), first);
        }
        assert_eq!(first, "[Default: B]");
    }
}
