//! 插件与插件聚合
//!
//! 插件是一组选择器、修饰器和格式化函数；聚合器按插件顺序、再按插件内顺序展开这些函数。

use crate::models::{EvaluationContext, Number, RuleSet, TaggedRuleGroup};
use std::fmt;
use std::sync::Arc;

/// 规则分组选择器
pub type RuleGroupSelector =
    Arc<dyn Fn(Number, &EvaluationContext) -> Vec<TaggedRuleGroup> + Send + Sync>;

/// 规则集选择器
pub type RuleSelector = Arc<dyn Fn(Number, &EvaluationContext) -> Vec<RuleSet> + Send + Sync>;

/// 规则分组修饰器（保留接口，当前评估流程不调用）
pub type RuleGroupModifier = Arc<
    dyn Fn(Vec<TaggedRuleGroup>, &EvaluationContext) -> Vec<TaggedRuleGroup> + Send + Sync,
>;

/// 结果格式化器：将全部标签合并为最终字符串
pub type ResultFormatter = Arc<dyn Fn(&[String]) -> String + Send + Sync>;

/// 默认输出：无规则命中时的标签
pub type DefaultOutput = Arc<dyn Fn(Number) -> String + Send + Sync>;

/// 插件
#[derive(Clone, Default)]
pub struct Plugin {
    pub rule_group_selectors: Vec<RuleGroupSelector>,
    pub rule_selectors: Vec<RuleSelector>,
    pub rule_group_modifiers: Vec<RuleGroupModifier>,
    pub result_formatters: Vec<ResultFormatter>,
}

impl Plugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group_selector<F>(mut self, selector: F) -> Self
    where
        F: Fn(Number, &EvaluationContext) -> Vec<TaggedRuleGroup> + Send + Sync + 'static,
    {
        self.rule_group_selectors.push(Arc::new(selector));
        self
    }

    pub fn rule_selector<F>(mut self, selector: F) -> Self
    where
        F: Fn(Number, &EvaluationContext) -> Vec<RuleSet> + Send + Sync + 'static,
    {
        self.rule_selectors.push(Arc::new(selector));
        self
    }

    pub fn group_modifier<F>(mut self, modifier: F) -> Self
    where
        F: Fn(Vec<TaggedRuleGroup>, &EvaluationContext) -> Vec<TaggedRuleGroup>
            + Send
            + Sync
            + 'static,
    {
        self.rule_group_modifiers.push(Arc::new(modifier));
        self
    }

    pub fn result_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&[String]) -> String + Send + Sync + 'static,
    {
        self.result_formatters.push(Arc::new(formatter));
        self
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("rule_group_selectors", &self.rule_group_selectors.len())
            .field("rule_selectors", &self.rule_selectors.len())
            .field("rule_group_modifiers", &self.rule_group_modifiers.len())
            .field("result_formatters", &self.result_formatters.len())
            .finish()
    }
}

/// 聚合后的插件函数
///
/// 每个列表都是各插件对应字段的顺序拼接，不去重。
#[derive(Clone, Default)]
pub struct AggregatedPlugins {
    pub rule_group_selectors: Vec<RuleGroupSelector>,
    pub rule_selectors: Vec<RuleSelector>,
    pub rule_group_modifiers: Vec<RuleGroupModifier>,
    pub result_formatters: Vec<ResultFormatter>,
}

impl AggregatedPlugins {
    pub fn from_plugins(plugins: &[Plugin]) -> Self {
        let mut aggregated = Self::default();

        for plugin in plugins {
            aggregated
                .rule_group_selectors
                .extend(plugin.rule_group_selectors.iter().cloned());
            aggregated
                .rule_selectors
                .extend(plugin.rule_selectors.iter().cloned());
            aggregated
                .rule_group_modifiers
                .extend(plugin.rule_group_modifiers.iter().cloned());
            aggregated
                .result_formatters
                .extend(plugin.result_formatters.iter().cloned());
        }

        aggregated
    }
}

impl fmt::Debug for AggregatedPlugins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregatedPlugins")
            .field("rule_group_selectors", &self.rule_group_selectors.len())
            .field("rule_selectors", &self.rule_selectors.len())
            .field("rule_group_modifiers", &self.rule_group_modifiers.len())
            .field("result_formatters", &self.result_formatters.len())
            .finish()
    }
}
