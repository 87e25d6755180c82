//! 规则流水线领域模型

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// 被评估的数值
pub type Number = i64;

/// 规则匹配谓词
pub type Evaluator = Arc<dyn Fn(Number, &EvaluationContext) -> bool + Send + Sync>;

/// 规则过滤器，返回 false 时跳过该规则
pub type RuleFilter = Arc<dyn Fn(Number) -> bool + Send + Sync>;

/// 规则命中时触发的回调
pub type RuleEvent = Arc<dyn Fn(Number) + Send + Sync>;

/// 输出转换器：(上一步输出, 数值, 上下文) -> 新输出
pub type ResultTransformer = Arc<dyn Fn(&str, Number, &EvaluationContext) -> String + Send + Sync>;

/// 规则装饰器：接收规则并返回新的规则值
pub type RuleDecorator = Arc<dyn Fn(Rule) -> Rule + Send + Sync>;

/// 规则标识
///
/// 同一规则被多个分组或规则集引用时共享同一个标识，分组归属与相邻去重都按标识比较。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(Uuid);

impl RuleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RuleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 规则定义
///
/// `clone()` 保留标识；`Rule::new` 总是分配新标识。
#[derive(Clone)]
pub struct Rule {
    id: RuleId,
    pub output: String,
    /// 未设置时规则永不匹配
    pub evaluator: Option<Evaluator>,
    pub events: Vec<RuleEvent>,
    pub filter: Option<RuleFilter>,
    pub priority: i32,
    /// 规则自身的转换器，标签生成时不参与，仅供装饰器读取
    pub result_transformer: Option<ResultTransformer>,
}

impl Rule {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            id: RuleId::new(),
            output: output.into(),
            evaluator: None,
            events: Vec::new(),
            filter: None,
            priority: 0,
            result_transformer: None,
        }
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    /// 设置匹配谓词
    pub fn when<F>(self, evaluator: F) -> Self
    where
        F: Fn(Number, &EvaluationContext) -> bool + Send + Sync + 'static,
    {
        self.with_evaluator(Arc::new(evaluator))
    }

    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(Number) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// 追加命中回调，按追加顺序触发
    pub fn on_match<F>(mut self, event: F) -> Self
    where
        F: Fn(Number) + Send + Sync + 'static,
    {
        self.events.push(Arc::new(event));
        self
    }

    pub fn transform<F>(mut self, transformer: F) -> Self
    where
        F: Fn(&str, Number, &EvaluationContext) -> String + Send + Sync + 'static,
    {
        self.result_transformer = Some(Arc::new(transformer));
        self
    }

    /// 替换输出，保留标识
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// 过滤器是否放行（未设置过滤器时总是放行）
    pub fn passes_filter(&self, num: Number) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter(num))
    }

    /// 匹配谓词是否成立（未设置谓词时返回 false）
    pub fn matches(&self, num: Number, context: &EvaluationContext) -> bool {
        self.evaluator
            .as_ref()
            .is_some_and(|evaluator| evaluator(num, context))
    }

    pub(crate) fn fire_events(&self, num: Number) {
        for event in &self.events {
            event(num);
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("output", &self.output)
            .field("priority", &self.priority)
            .field("has_evaluator", &self.evaluator.is_some())
            .field("has_filter", &self.filter.is_some())
            .field("events", &self.events.len())
            .finish()
    }
}

/// 分组选择方式（保留字段，当前评估流程不读取）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectBehavior {
    #[default]
    All,
    First,
    Last,
}

impl fmt::Display for SelectBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::First => write!(f, "first"),
            Self::Last => write!(f, "last"),
        }
    }
}

/// 带标签的规则分组
///
/// 为其中的规则附加标签、装饰器和输出转换器。
#[derive(Clone)]
pub struct TaggedRuleGroup {
    pub tag: String,
    pub rules: Vec<Rule>,
    pub select_behavior: SelectBehavior,
    pub decorators: Vec<RuleDecorator>,
    pub result_transformer: Option<ResultTransformer>,
}

impl TaggedRuleGroup {
    pub fn new(tag: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            tag: tag.into(),
            rules,
            select_behavior: SelectBehavior::default(),
            decorators: Vec::new(),
            result_transformer: None,
        }
    }

    pub fn select_behavior(mut self, behavior: SelectBehavior) -> Self {
        self.select_behavior = behavior;
        self
    }

    /// 追加装饰器，按追加顺序应用
    pub fn decorate<F>(self, decorator: F) -> Self
    where
        F: Fn(Rule) -> Rule + Send + Sync + 'static,
    {
        self.with_decorator(Arc::new(decorator))
    }

    pub fn with_decorator(mut self, decorator: RuleDecorator) -> Self {
        self.decorators.push(decorator);
        self
    }

    pub fn transform<F>(self, transformer: F) -> Self
    where
        F: Fn(&str, Number, &EvaluationContext) -> String + Send + Sync + 'static,
    {
        self.with_transformer(Arc::new(transformer))
    }

    pub fn with_transformer(mut self, transformer: ResultTransformer) -> Self {
        self.result_transformer = Some(transformer);
        self
    }

    /// 分组是否包含该规则（按标识比较）
    pub fn contains(&self, id: RuleId) -> bool {
        self.rules.iter().any(|rule| rule.id() == id)
    }
}

impl fmt::Debug for TaggedRuleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaggedRuleGroup")
            .field("tag", &self.tag)
            .field("rules", &self.rules)
            .field("select_behavior", &self.select_behavior)
            .field("decorators", &self.decorators.len())
            .field("has_transformer", &self.result_transformer.is_some())
            .finish()
    }
}

/// 规则集：条件成立时其中的规则才参与评估
#[derive(Clone)]
pub struct RuleSet {
    pub condition: Evaluator,
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new<F>(condition: F, rules: Vec<Rule>) -> Self
    where
        F: Fn(Number, &EvaluationContext) -> bool + Send + Sync + 'static,
    {
        Self::with_condition(Arc::new(condition), rules)
    }

    pub fn with_condition(condition: Evaluator, rules: Vec<Rule>) -> Self {
        Self { condition, rules }
    }

    /// 条件恒为真的规则集
    pub fn always(rules: Vec<Rule>) -> Self {
        Self::new(|_, _| true, rules)
    }

    pub fn is_active(&self, num: Number, context: &EvaluationContext) -> bool {
        (self.condition)(num, context)
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

/// 评估上下文
///
/// 由调用方提供的任意 JSON 数据，默认为 `null`（无上下文），原样传给每个谓词和转换器。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationContext {
    data: Value,
}

impl EvaluationContext {
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    /// 无上下文
    pub fn none() -> Self {
        Self::default()
    }

    /// 从 JSON 对象创建
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let data: Value = serde_json::from_str(json)?;
        Ok(Self { data })
    }

    pub fn is_none(&self) -> bool {
        self.data.is_null()
    }

    /// 获取字段值（支持点号分隔的路径，如 "limits.max" 或 "labels.0"）
    pub fn get_field(&self, path: &str) -> Option<&Value> {
        let mut current = &self.data;

        for part in path.split('.') {
            match current {
                Value::Object(map) => {
                    current = map.get(part)?;
                }
                Value::Array(arr) => {
                    let index: usize = part.parse().ok()?;
                    current = arr.get(index)?;
                }
                _ => return None,
            }
        }

        Some(current)
    }

    /// 获取底层数据
    pub fn data(&self) -> &Value {
        &self.data
    }
}

impl From<Value> for EvaluationContext {
    fn from(data: Value) -> Self {
        Self::new(data)
    }
}

/// 单个数值的评估结果
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub number: Number,
    pub label: String,
    pub matched: bool,
    pub rule_id: Option<RuleId>,
    pub tag: Option<String>,
    pub rule_set_index: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub evaluation_trace: Vec<String>,
}

impl EvaluationResult {
    pub fn new(number: Number) -> Self {
        Self {
            number,
            label: String::new(),
            matched: false,
            rule_id: None,
            tag: None,
            rule_set_index: None,
            evaluation_trace: Vec::new(),
        }
    }
}
