/// Expression trees
///
/// A tree is an arena of nodes addressed by index. Each tree gets a unique
/// id when it is created, so a node is identified across the whole process by
/// `(tree id, node index)`; that pair keys the per-query `StateBin`.

// Module declarations
pub mod builder;
pub mod functions;
pub mod operators;
pub mod pattern;
pub mod system;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use regex::Regex;
use crate::core::{CompareOp, DataType, ProviderRecord, QueryError, Value};
use crate::executor::planner::QueryPlan;
use crate::provider::materialize::materialize_column;
use crate::state::{BinKey, QueryState};

pub use builder::{ExpressionBuilder, Scope};
pub use functions::Function;
pub use operators::{ArithmeticOp, LogicalOp};
pub use system::SystemVariable;

pub type NodeId = usize;

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

fn next_tree_id() -> u64 {
    NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Pattern operand of a MATCH node.
#[derive(Debug, Clone)]
pub enum PatternSource {
    /// Pattern was constant and compiled once
    Compiled(Regex),
    /// Compiled per row; `like` patterns are rewritten first
    Dynamic { pattern: NodeId, like: bool },
}

#[derive(Debug, Clone)]
pub enum Node {
    Constant(Value),
    Column(usize),
    Variable(String),
    System(SystemVariable),
    Negate(NodeId),
    Not(NodeId),
    Arithmetic {
        op: ArithmeticOp,
        left: NodeId,
        right: NodeId,
    },
    Concat {
        left: NodeId,
        right: NodeId,
    },
    Logical {
        op: LogicalOp,
        left: NodeId,
        right: NodeId,
    },
    Compare {
        op: CompareOp,
        left: NodeId,
        right: NodeId,
    },
    Match {
        operand: NodeId,
        pattern: PatternSource,
        negated: bool,
    },
    AnyList {
        op: CompareOp,
        left: NodeId,
        items: Vec<NodeId>,
    },
    /// Candidates come from a one-column subquery, materialized once per
    /// query execution
    AnySubquery {
        op: CompareOp,
        left: NodeId,
        plan: Arc<QueryPlan>,
        convert_to: Option<DataType>,
    },
    Convert {
        operand: NodeId,
        target: DataType,
        format: Option<NodeId>,
    },
    Function {
        function: Function,
        args: Vec<NodeId>,
    },
}

#[derive(Debug, Clone)]
pub struct Expression {
    id: u64,
    nodes: Vec<Node>,
    types: Vec<DataType>,
    root: NodeId,
}

impl Expression {
    fn empty() -> Self {
        Self {
            id: next_tree_id(),
            nodes: Vec::new(),
            types: Vec::new(),
            root: 0,
        }
    }

    fn single(node: Node, data_type: DataType) -> Self {
        let mut expr = Self::empty();
        expr.nodes.push(node);
        expr.types.push(data_type);
        expr
    }

    #[must_use]
    pub fn constant(value: Value) -> Self {
        let data_type = value.data_type();
        Self::single(Node::Constant(value), data_type)
    }

    #[must_use]
    pub fn column(ordinal: usize, data_type: DataType) -> Self {
        Self::single(Node::Column(ordinal), data_type)
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.types[self.root]
    }

    /// The folded value if the whole tree reduced to a constant.
    #[must_use]
    pub fn constant_value(&self) -> Option<&Value> {
        match &self.nodes[self.root] {
            Node::Constant(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.constant_value().is_some()
    }

    /// Column ordinal if the tree is a bare column reference.
    #[must_use]
    pub fn as_column(&self) -> Option<usize> {
        match self.nodes[self.root] {
            Node::Column(ordinal) => Some(ordinal),
            _ => None,
        }
    }

    pub fn evaluate(&self, state: &mut QueryState, record: &ProviderRecord) -> Result<Value, QueryError> {
        self.eval(self.root, state, record)
    }

    pub fn evaluate_bool(&self, state: &mut QueryState, record: &ProviderRecord) -> Result<bool, QueryError> {
        operators::expect_bool(&self.evaluate(state, record)?)
    }

    fn eval_bool(&self, id: NodeId, state: &mut QueryState, record: &ProviderRecord) -> Result<bool, QueryError> {
        operators::expect_bool(&self.eval(id, state, record)?)
    }

    fn eval(&self, id: NodeId, state: &mut QueryState, record: &ProviderRecord) -> Result<Value, QueryError> {
        match &self.nodes[id] {
            Node::Constant(v) => Ok(v.clone()),
            Node::Column(ordinal) => record
                .columns
                .get(*ordinal)
                .cloned()
                .ok_or_else(|| QueryError::ColumnNotFound(format!("#{}", ordinal + 1))),
            Node::Variable(name) => state.variables.value(name),
            Node::System(var) => var.evaluate(state, record),
            Node::Negate(operand) => operators::negate(&self.eval(*operand, state, record)?),
            Node::Not(operand) => Ok(Value::Boolean(!self.eval_bool(*operand, state, record)?)),
            Node::Arithmetic { op, left, right } => {
                let l = self.eval(*left, state, record)?;
                let r = self.eval(*right, state, record)?;
                operators::arithmetic(*op, &l, &r)
            }
            Node::Concat { left, right } => {
                let l = self.eval(*left, state, record)?;
                let r = self.eval(*right, state, record)?;
                Ok(Value::String(format!("{}{}", l.to_text(state.culture(), None)?, r.to_text(state.culture(), None)?)))
            }
            Node::Logical { op, left, right } => {
                let l = self.eval_bool(*left, state, record)?;
                let result = match op {
                    LogicalOp::And => l && self.eval_bool(*right, state, record)?,
                    LogicalOp::Or => l || self.eval_bool(*right, state, record)?,
                };
                Ok(Value::Boolean(result))
            }
            Node::Compare { op, left, right } => {
                let l = self.eval(*left, state, record)?;
                let r = self.eval(*right, state, record)?;
                Ok(Value::Boolean(state.comparer.test(*op, &l, &r)?))
            }
            Node::Match { operand, pattern: source, negated } => {
                let text = self.eval(*operand, state, record)?.to_text(state.culture(), None)?;
                let matched = match source {
                    PatternSource::Compiled(regex) => pattern::is_match(regex, &text, &state.comparer),
                    PatternSource::Dynamic { pattern: pattern_node, like } => {
                        let regex = self.dynamic_pattern(id, *pattern_node, *like, state, record)?;
                        pattern::is_match(&regex, &text, &state.comparer)
                    }
                };
                Ok(Value::Boolean(matched != *negated))
            }
            Node::AnyList { op, left, items } => {
                let l = self.eval(*left, state, record)?;
                for item in items {
                    let candidate = self.eval(*item, state, record)?;
                    if state.comparer.test(*op, &l, &candidate)? {
                        return Ok(Value::Boolean(true));
                    }
                }
                Ok(Value::Boolean(false))
            }
            Node::AnySubquery { op, left, plan, convert_to } => {
                let l = self.eval(*left, state, record)?;
                let key = BinKey { tree: self.id, node: id };
                let cached = state.bin.get::<Arc<Vec<Value>>>(key).cloned();
                let candidates = match cached {
                    Some(values) => values,
                    None => {
                        let values = Arc::new(materialize_column(plan, state, *convert_to)?);
                        state.bin.insert(key, Arc::clone(&values));
                        values
                    }
                };
                for candidate in candidates.iter() {
                    if state.comparer.test(*op, &l, candidate)? {
                        return Ok(Value::Boolean(true));
                    }
                }
                Ok(Value::Boolean(false))
            }
            Node::Convert { operand, target, format } => {
                let value = self.eval(*operand, state, record)?;
                let format = match format {
                    Some(f) => Some(self.eval(*f, state, record)?.to_text(state.culture(), None)?),
                    None => None,
                };
                value.convert(*target, state.culture(), format.as_deref())
            }
            Node::Function { function, args } => {
                let values = args
                    .iter()
                    .map(|a| self.eval(*a, state, record))
                    .collect::<Result<Vec<_>, _>>()?;
                function.evaluate(&values, state, record)
            }
        }
    }

    /// Compiles a per-row pattern, reusing the last compilation while the
    /// pattern text stays the same.
    fn dynamic_pattern(
        &self,
        id: NodeId,
        pattern: NodeId,
        like: bool,
        state: &mut QueryState,
        record: &ProviderRecord,
    ) -> Result<Regex, QueryError> {
        let text = self.eval(pattern, state, record)?.to_text(state.culture(), None)?;
        let key = BinKey { tree: self.id, node: id };
        if let Some((last, regex)) = state.bin.get::<(String, Regex)>(key) {
            if *last == text {
                return Ok(regex.clone());
            }
        }
        let source = if like { pattern::like_to_regex(&text) } else { text.clone() };
        let regex = pattern::compile(&source, &state.comparer)?;
        state.bin.insert(key, (text, regex.clone()));
        Ok(regex)
    }
}
