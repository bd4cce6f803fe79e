use crate::core::{Column, CompareOp, DataType, ProviderRecord, QueryError};
use crate::executor::planner::Planner;
use crate::parser::{AnyTarget, BinaryOp, Expr, UnaryOp};
use crate::state::QueryState;
use super::functions::{conversion_target, Function};
use super::operators::{ArithmeticOp, LogicalOp};
use super::pattern;
use super::system::SystemVariable;
use super::{Expression, Node, NodeId, PatternSource};

/// Columns visible to an expression, plus the names the source can be
/// qualified with.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub columns: Vec<Column>,
    pub aliases: Vec<String>,
}

impl Scope {
    #[must_use]
    pub const fn new(columns: Vec<Column>, aliases: Vec<String>) -> Self {
        Self { columns, aliases }
    }

    pub fn resolve(&self, qualifier: Option<&str>, name: &str) -> Result<usize, QueryError> {
        if let Some(q) = qualifier {
            if !self.aliases.iter().any(|a| a.eq_ignore_ascii_case(q)) {
                return Err(QueryError::ColumnNotFound(format!("{q}.{name}")));
            }
        }
        let mut matches = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name.eq_ignore_ascii_case(name))
            .map(|(i, _)| i);
        match (matches.next(), matches.next()) {
            (Some(i), None) => Ok(i),
            (Some(_), Some(_)) => Err(QueryError::AmbiguousColumn(name.to_string())),
            (None, _) => Err(QueryError::ColumnNotFound(name.to_string())),
        }
    }
}

/// Turns a parsed expression into a typed tree: resolves columns and
/// variables, inserts conversion nodes, rejects impossible conversions and
/// folds constant subtrees.
pub struct ExpressionBuilder<'a> {
    planner: &'a Planner<'a>,
    scope: &'a Scope,
    expr: Expression,
    constant: Vec<bool>,
}

impl<'a> ExpressionBuilder<'a> {
    pub fn build(planner: &'a Planner<'a>, scope: &'a Scope, source: &Expr) -> Result<Expression, QueryError> {
        let mut builder = Self {
            planner,
            scope,
            expr: Expression::empty(),
            constant: Vec::new(),
        };
        let root = builder.node(source)?;
        builder.expr.root = root;
        Ok(builder.expr)
    }

    /// Builds and converts the result to `target`.
    pub fn build_as(
        planner: &'a Planner<'a>,
        scope: &'a Scope,
        source: &Expr,
        target: DataType,
    ) -> Result<Expression, QueryError> {
        let mut builder = Self {
            planner,
            scope,
            expr: Expression::empty(),
            constant: Vec::new(),
        };
        let root = builder.node(source)?;
        let root = builder.coerce(root, target)?;
        builder.expr.root = root;
        Ok(builder.expr)
    }

    fn data_type(&self, id: NodeId) -> DataType {
        self.expr.types[id]
    }

    fn is_constant(&self, id: NodeId) -> bool {
        self.constant[id]
    }

    fn push(&mut self, node: Node, data_type: DataType, constant: bool) -> NodeId {
        let id = self.expr.nodes.len();
        let folded = constant && !matches!(node, Node::Constant(_));
        self.expr.nodes.push(node);
        self.expr.types.push(data_type);
        self.constant.push(constant);
        if folded {
            self.fold(id);
        }
        id
    }

    // Evaluates a constant subtree once. Failures leave the subtree alone so
    // they surface per row at run time.
    fn fold(&mut self, id: NodeId) {
        let mut state = QueryState::detached(self.planner.comparer().clone());
        match self.expr.eval(id, &mut state, &ProviderRecord::default()) {
            Ok(value) => self.expr.nodes[id] = Node::Constant(value),
            Err(e) => log::debug!("constant folding skipped: {e}"),
        }
    }

    /// Wraps `id` in a conversion node unless it already has kind `target`.
    fn coerce(&mut self, id: NodeId, target: DataType) -> Result<NodeId, QueryError> {
        let source = self.data_type(id);
        if source == target {
            return Ok(id);
        }
        source.check_conversion(target)?;
        let constant = self.is_constant(id);
        Ok(self.push(
            Node::Convert {
                operand: id,
                target,
                format: None,
            },
            target,
            constant,
        ))
    }

    /// Two sides the comparer can order directly, converting one side when
    /// the kinds differ and neither is a string.
    fn comparable(&mut self, left: NodeId, right: NodeId) -> Result<(NodeId, NodeId), QueryError> {
        let (lt, rt) = (self.data_type(left), self.data_type(right));
        if lt == rt || lt == DataType::String || rt == DataType::String || (lt.is_numeric() && rt.is_numeric()) {
            return Ok((left, right));
        }
        if rt.can_convert_to(lt) {
            Ok((left, self.coerce(right, lt)?))
        } else if lt.can_convert_to(rt) {
            Ok((self.coerce(left, rt)?, right))
        } else {
            Err(QueryError::ParseTimeConversion { from: rt, to: lt })
        }
    }

    fn node(&mut self, source: &Expr) -> Result<NodeId, QueryError> {
        match source {
            Expr::Literal(v) => Ok(self.push(Node::Constant(v.clone()), v.data_type(), true)),
            Expr::Column { qualifier, name } => {
                let ordinal = self.scope.resolve(qualifier.as_deref(), name)?;
                let data_type = self.scope.columns[ordinal].data_type;
                Ok(self.push(Node::Column(ordinal), data_type, false))
            }
            Expr::Variable(name) => {
                let data_type = self
                    .planner
                    .variable_type(name)
                    .ok_or_else(|| QueryError::VariableNotDeclared(name.clone()))?;
                Ok(self.push(Node::Variable(name.clone()), data_type, false))
            }
            Expr::SystemVariable(name) => {
                let var = SystemVariable::from_name(name)
                    .ok_or_else(|| QueryError::VariableNotDeclared(format!("@@{name}")))?;
                Ok(self.push(Node::System(var), var.data_type(), false))
            }
            Expr::Unary { op, operand } => {
                let x = self.node(operand)?;
                let constant = self.is_constant(x);
                match op {
                    UnaryOp::Negate => {
                        let data_type = self.data_type(x);
                        if !data_type.is_numeric() {
                            return Err(QueryError::TypeMismatch(format!("cannot negate {data_type}")));
                        }
                        Ok(self.push(Node::Negate(x), data_type, constant))
                    }
                    UnaryOp::Not => {
                        let x = self.coerce(x, DataType::Boolean)?;
                        Ok(self.push(Node::Not(x), DataType::Boolean, constant))
                    }
                }
            }
            Expr::Binary { op, left, right } => {
                let l = self.node(left)?;
                let r = self.node(right)?;
                self.binary(*op, l, r)
            }
            Expr::Like { operand, pattern, negated } => self.pattern(operand, pattern, *negated, true),
            Expr::Match { operand, pattern, negated } => self.pattern(operand, pattern, *negated, false),
            Expr::Any { op, left, target } => {
                let l = self.node(left)?;
                match target {
                    AnyTarget::List(items) => self.any_list(*op, l, items),
                    AnyTarget::Subquery(query) => self.any_subquery(*op, l, query),
                }
            }
            Expr::Function { name, args } => self.function(name, args),
        }
    }

    fn binary(&mut self, op: BinaryOp, l: NodeId, r: NodeId) -> Result<NodeId, QueryError> {
        let constant = self.is_constant(l) && self.is_constant(r);
        let (lt, rt) = (self.data_type(l), self.data_type(r));

        let arithmetic = match op {
            BinaryOp::Add => ArithmeticOp::Add,
            BinaryOp::Subtract => ArithmeticOp::Subtract,
            BinaryOp::Multiply => ArithmeticOp::Multiply,
            BinaryOp::Divide => ArithmeticOp::Divide,
            BinaryOp::Modulo => ArithmeticOp::Modulo,
            BinaryOp::And | BinaryOp::Or => {
                let l = self.coerce(l, DataType::Boolean)?;
                let r = self.coerce(r, DataType::Boolean)?;
                let op = if op == BinaryOp::And { LogicalOp::And } else { LogicalOp::Or };
                return Ok(self.push(Node::Logical { op, left: l, right: r }, DataType::Boolean, constant));
            }
            BinaryOp::Compare(cmp) => {
                let (l, r) = self.comparable(l, r)?;
                return Ok(self.push(Node::Compare { op: cmp, left: l, right: r }, DataType::Boolean, constant));
            }
        };

        // '+' with a string operand concatenates
        if arithmetic == ArithmeticOp::Add && (lt == DataType::String || rt == DataType::String) {
            let l = self.coerce(l, DataType::String)?;
            let r = self.coerce(r, DataType::String)?;
            return Ok(self.push(Node::Concat { left: l, right: r }, DataType::String, constant));
        }

        let target = match (lt, rt) {
            (DataType::Integer, DataType::Integer) => DataType::Integer,
            (a, b) if a.is_numeric() && b.is_numeric() => DataType::Float,
            (a, DataType::String) if a.is_numeric() => a,
            (DataType::String, b) if b.is_numeric() => b,
            _ => {
                return Err(QueryError::TypeMismatch(format!(
                    "operator {} is not defined for {lt} and {rt}",
                    arithmetic.symbol()
                )));
            }
        };
        let l = self.coerce(l, target)?;
        let r = self.coerce(r, target)?;
        Ok(self.push(Node::Arithmetic { op: arithmetic, left: l, right: r }, target, constant))
    }

    fn pattern(&mut self, operand: &Expr, pattern: &Expr, negated: bool, like: bool) -> Result<NodeId, QueryError> {
        let operand = self.node(operand)?;
        let operand = self.coerce(operand, DataType::String)?;
        let p = self.node(pattern)?;
        let p = self.coerce(p, DataType::String)?;
        let constant = self.is_constant(operand) && self.is_constant(p);

        let source = match &self.expr.nodes[p] {
            Node::Constant(value) => {
                let text = value.to_text(self.planner.comparer().culture(), None)?;
                let regex_source = if like { pattern::like_to_regex(&text) } else { text };
                PatternSource::Compiled(pattern::compile(&regex_source, self.planner.comparer())?)
            }
            _ => PatternSource::Dynamic { pattern: p, like },
        };
        Ok(self.push(
            Node::Match {
                operand,
                pattern: source,
                negated,
            },
            DataType::Boolean,
            constant,
        ))
    }

    fn any_list(&mut self, op: CompareOp, left: NodeId, items: &[Expr]) -> Result<NodeId, QueryError> {
        let lt = self.data_type(left);
        let mut constant = self.is_constant(left);
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            let id = self.node(item)?;
            let it = self.data_type(id);
            let compatible = it == lt || it == DataType::String || lt == DataType::String || (it.is_numeric() && lt.is_numeric());
            let id = if compatible { id } else { self.coerce(id, lt)? };
            constant &= self.is_constant(id);
            ids.push(id);
        }
        Ok(self.push(Node::AnyList { op, left, items: ids }, DataType::Boolean, constant))
    }

    fn any_subquery(&mut self, op: CompareOp, left: NodeId, query: &crate::parser::SelectQuery) -> Result<NodeId, QueryError> {
        let plan = self.planner.plan_subquery(query)?;
        let columns = plan.columns();
        if columns.len() != 1 {
            return Err(QueryError::SubqueryColumnCount(columns.len()));
        }
        let lt = self.data_type(left);
        let column_type = columns[0].data_type;
        let convert_to = if column_type == lt {
            None
        } else {
            column_type.check_conversion(lt)?;
            Some(lt)
        };
        Ok(self.push(
            Node::AnySubquery {
                op,
                left,
                plan,
                convert_to,
            },
            DataType::Boolean,
            false,
        ))
    }

    fn function(&mut self, name: &str, args: &[Expr]) -> Result<NodeId, QueryError> {
        if let Some((target, accepts_format)) = conversion_target(name) {
            let max = if accepts_format { 2 } else { 1 };
            if args.is_empty() || args.len() > max {
                return Err(QueryError::ArgumentCount {
                    name: name.to_uppercase(),
                    expected: if max == 1 { "1".to_string() } else { "1 to 2".to_string() },
                    actual: args.len(),
                });
            }
            let operand = self.node(&args[0])?;
            self.data_type(operand).check_conversion(target)?;
            let format = match args.get(1) {
                Some(f) => {
                    let f = self.node(f)?;
                    Some(self.coerce(f, DataType::String)?)
                }
                None => None,
            };
            let constant = self.is_constant(operand) && format.map_or(true, |f| self.is_constant(f));
            return Ok(self.push(Node::Convert { operand, target, format }, target, constant));
        }

        let function = Function::from_name(name).ok_or_else(|| QueryError::UnknownFunction(name.to_string()))?;
        let mut ids = Vec::with_capacity(args.len());
        for arg in args {
            ids.push(self.node(arg)?);
        }
        let arg_types: Vec<DataType> = ids.iter().map(|id| self.data_type(*id)).collect();
        let (params, result) = function.signature(&arg_types)?;
        let mut constant = function.is_deterministic();
        for (id, param) in ids.iter_mut().zip(params) {
            *id = self.coerce(*id, param)?;
            constant &= self.is_constant(*id);
        }
        Ok(self.push(Node::Function { function, args: ids }, result, constant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Comparer, Value};
    use crate::parser::parse_commands;
    use crate::parser::{Command, SelectItem};
    use crate::state::SessionState;
    use std::path::PathBuf;

    fn session() -> SessionState {
        SessionState::new(PathBuf::from("."), Comparer::default()).unwrap()
    }

    fn scope() -> Scope {
        Scope::new(
            vec![
                Column::new("Name", DataType::String),
                Column::new("Length", DataType::Integer),
                Column::new("LastWriteTime", DataType::DateTime),
                Column::new("Flag", DataType::Boolean),
            ],
            vec!["d".to_string()],
        )
    }

    // Parses `SELECT <text>` and returns the first select-list expression.
    fn expr(text: &str) -> Expr {
        match parse_commands(&format!("SELECT {text}")).unwrap().remove(0) {
            Command::Select(mut q) => match q.items.remove(0) {
                SelectItem::Expr { expr, .. } => expr,
                SelectItem::Wildcard => panic!("wildcard"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    fn build(session: &SessionState, text: &str) -> Result<Expression, QueryError> {
        let planner = Planner::new(session);
        let scope = scope();
        ExpressionBuilder::build(&planner, &scope, &expr(text))
    }

    #[test]
    fn test_constant_folding() {
        let session = session();
        let e = build(&session, "1 + 2 * 3").unwrap();
        assert_eq!(e.constant_value(), Some(&Value::Integer(7)));
        let e = build(&session, "UPPER('a') + 'b'").unwrap();
        assert_eq!(e.constant_value(), Some(&Value::String("Ab".into())));
    }

    #[test]
    fn test_non_constant_nodes() {
        let session = session();
        assert!(!build(&session, "Length + 1").unwrap().is_constant());
        assert!(!build(&session, "NOW()").unwrap().is_constant());
        assert!(!build(&session, "Name LIKE 'a%'").unwrap().is_constant());
        assert!(build(&session, "'abc' LIKE 'a%'").unwrap().is_constant());
    }

    #[test]
    fn test_mixed_numeric_inserts_conversion() {
        let session = session();
        let e = build(&session, "Length + 0.5").unwrap();
        assert_eq!(e.data_type(), DataType::Float);
        let mut state = QueryState::new(&session);
        let record = ProviderRecord::new(vec![
            Value::String("a".into()),
            Value::Integer(2),
            Value::String(String::new()),
            Value::Boolean(false),
        ]);
        assert_eq!(e.evaluate(&mut state, &record).unwrap(), Value::Float(2.5));
    }

    #[test]
    fn test_structural_conversion_rejected_at_build() {
        let session = session();
        assert!(matches!(
            build(&session, "TO_FLOAT(Flag)"),
            Err(QueryError::ParseTimeConversion { from: DataType::Boolean, to: DataType::Float })
        ));
        assert!(matches!(
            build(&session, "LastWriteTime = 5"),
            Err(QueryError::ParseTimeConversion { .. })
        ));
        assert!(matches!(build(&session, "Flag + 1"), Err(QueryError::TypeMismatch(_))));
    }

    #[test]
    fn test_failed_fold_is_deferred() {
        let session = session();
        let e = build(&session, "TO_INT('abc')").unwrap();
        assert!(!e.is_constant());
    }

    #[test]
    fn test_column_resolution() {
        let session = session();
        assert!(build(&session, "d.Name").is_ok());
        assert!(matches!(build(&session, "x.Name"), Err(QueryError::ColumnNotFound(_))));
        assert!(matches!(build(&session, "Size"), Err(QueryError::ColumnNotFound(_))));

        let dup = Scope::new(vec![Column::new("a", DataType::String), Column::new("A", DataType::String)], Vec::new());
        assert!(matches!(dup.resolve(None, "a"), Err(QueryError::AmbiguousColumn(_))));
    }

    #[test]
    fn test_variables_typed_from_session() {
        let session = session();
        assert!(matches!(build(&session, "@missing"), Err(QueryError::VariableNotDeclared(_))));
        session.variables.declare("@n", DataType::Integer).unwrap();
        let e = build(&session, "@n * 2").unwrap();
        assert_eq!(e.data_type(), DataType::Integer);
        assert!(!e.is_constant());
    }

    #[test]
    fn test_function_arguments() {
        let session = session();
        assert!(matches!(build(&session, "REPLACE(Name)"), Err(QueryError::ArgumentCount { .. })));
        assert!(matches!(build(&session, "NOPE(1)"), Err(QueryError::UnknownFunction(_))));
        let e = build(&session, "SUBSTR(Name, '2')").unwrap();
        assert_eq!(e.data_type(), DataType::String);
    }
}
