/// Query planning
///
/// Turns a parsed SELECT into a `QueryPlan`: a tree of typed expressions and
/// stage descriptions. A plan is inert; `QueryPlan::build` creates a fresh
/// provider chain for each execution.

use std::sync::Arc;
use crate::core::{Column, Comparer, DataType, QueryError, Value};
use crate::expression::{Expression, ExpressionBuilder, Scope};
use crate::parser::{
    DirectoryOrder, Expr, OrderItem, OrderKey, SelectItem, SelectQuery, SortOrder, SourceKind, SourceRef,
    VariableDecl,
};
use crate::provider::{
    DirectoryProvider, FilterProvider, MemoryProvider, ProjectionProvider, Provider, ProviderFactory,
    SortProvider, TextProvider, TopProvider, ViewProvider,
};
use crate::state::{SessionState, Variables, ViewSource};

#[derive(Debug)]
pub enum QueryPlan {
    Directory {
        path: Expression,
        recursive: bool,
        order: Option<DirectoryOrder>,
        aliases: Vec<String>,
    },
    Text {
        path: Expression,
        aliases: Vec<String>,
    },
    Memory {
        columns: Vec<Column>,
        rows: Vec<Vec<Value>>,
    },
    Native {
        name: String,
        factory: Arc<dyn ProviderFactory>,
        aliases: Vec<String>,
    },
    Filter {
        input: Box<QueryPlan>,
        predicate: Expression,
    },
    Projection {
        input: Box<QueryPlan>,
        columns: Vec<Column>,
        items: Vec<Expression>,
    },
    Sort {
        input: Box<QueryPlan>,
        keys: Vec<(Expression, SortOrder)>,
    },
    Top {
        input: Box<QueryPlan>,
        limit: u64,
    },
    View {
        name: String,
        parameters: Vec<VariableDecl>,
        arguments: Vec<Expression>,
        body: Box<QueryPlan>,
        aliases: Vec<String>,
    },
}

impl QueryPlan {
    #[must_use]
    pub fn columns(&self) -> Vec<Column> {
        match self {
            Self::Directory { .. } => DirectoryProvider::schema(),
            Self::Text { .. } => TextProvider::schema(),
            Self::Memory { columns, .. } | Self::Projection { columns, .. } => columns.clone(),
            Self::Native { factory, .. } => factory.columns(),
            Self::Filter { input, .. } | Self::Sort { input, .. } | Self::Top { input, .. } => input.columns(),
            Self::View { body, .. } => body.columns(),
        }
    }

    /// Creates an uninitialized provider chain for one execution.
    pub fn build(&self) -> Result<Box<dyn Provider>, QueryError> {
        let provider: Box<dyn Provider> = match self {
            Self::Directory {
                path,
                recursive,
                order,
                aliases,
            } => Box::new(DirectoryProvider::new(path.clone(), *recursive, *order, aliases.clone())),
            Self::Text { path, aliases } => Box::new(TextProvider::new(path.clone(), aliases.clone())),
            Self::Memory { columns, rows } => Box::new(MemoryProvider::new(columns.clone(), rows.clone())),
            Self::Native { name, factory, .. } => {
                log::debug!("creating native view {name}");
                factory.create()?
            }
            Self::Filter { input, predicate } => Box::new(FilterProvider::new(input.build()?, predicate.clone())),
            Self::Projection { input, columns, items } => {
                Box::new(ProjectionProvider::new(input.build()?, columns.clone(), items.clone()))
            }
            Self::Sort { input, keys } => Box::new(SortProvider::new(input.build()?, keys.clone())),
            Self::Top { input, limit } => Box::new(TopProvider::new(input.build()?, *limit)),
            Self::View {
                name,
                parameters,
                arguments,
                body,
                aliases,
            } => Box::new(ViewProvider::new(
                name.clone(),
                parameters.clone(),
                arguments.clone(),
                body.build()?,
                aliases.clone(),
            )),
        };
        Ok(provider)
    }
}

/// Plans queries against a session. Variables are typed from `variables`,
/// which is the session scope or, inside a parameterized view, a fork of it
/// holding the parameters.
pub struct Planner<'a> {
    session: &'a SessionState,
    variables: Variables,
    // Views being expanded, lower-cased
    expanding: Vec<String>,
}

impl<'a> Planner<'a> {
    #[must_use]
    pub fn new(session: &'a SessionState) -> Self {
        Self {
            session,
            variables: session.variables.share(),
            expanding: Vec::new(),
        }
    }

    #[must_use]
    pub const fn comparer(&self) -> &Comparer {
        self.session.comparer()
    }

    #[must_use]
    pub fn variable_type(&self, name: &str) -> Option<DataType> {
        self.variables.data_type(name)
    }

    /// Plans a standalone expression with no columns in scope.
    pub fn plan_expression(&self, expr: &Expr) -> Result<Expression, QueryError> {
        ExpressionBuilder::build(self, &Scope::default(), expr)
    }

    pub fn plan_subquery(&self, query: &SelectQuery) -> Result<Arc<QueryPlan>, QueryError> {
        Ok(Arc::new(self.plan_select(query)?))
    }

    pub fn plan_select(&self, query: &SelectQuery) -> Result<QueryPlan, QueryError> {
        let (mut plan, scope) = match &query.from {
            Some(source) => self.plan_source(source)?,
            // SELECT without FROM yields a single row
            None => (
                QueryPlan::Memory {
                    columns: Vec::new(),
                    rows: vec![Vec::new()],
                },
                Scope::default(),
            ),
        };

        if let Some(filter) = &query.filter {
            let predicate = ExpressionBuilder::build_as(self, &scope, filter, DataType::Boolean)?;
            if predicate.constant_value() != Some(&Value::Boolean(true)) {
                plan = QueryPlan::Filter {
                    input: Box::new(plan),
                    predicate,
                };
            }
        }

        let (columns, items) = self.select_list(&query.items, &scope)?;
        let (keys, after_projection) = self.order_keys(&query.order_by, &scope, &columns, &items)?;

        let mut sort_output = None;
        if !keys.is_empty() {
            if after_projection {
                sort_output = Some(keys);
            } else {
                plan = QueryPlan::Sort {
                    input: Box::new(plan),
                    keys,
                };
            }
        }
        plan = QueryPlan::Projection {
            input: Box::new(plan),
            columns,
            items,
        };
        if let Some(keys) = sort_output {
            plan = QueryPlan::Sort {
                input: Box::new(plan),
                keys,
            };
        }
        if let Some(limit) = query.top {
            plan = QueryPlan::Top {
                input: Box::new(plan),
                limit,
            };
        }
        Ok(plan)
    }

    fn plan_source(&self, source: &SourceRef) -> Result<(QueryPlan, Scope), QueryError> {
        let aliases: Vec<String> = source.alias.iter().cloned().collect();
        match &source.kind {
            SourceKind::Directory { path, recursive, order } => {
                let path = ExpressionBuilder::build_as(self, &Scope::default(), path, DataType::String)?;
                let scope = Scope::new(DirectoryProvider::schema(), aliases.clone());
                let plan = QueryPlan::Directory {
                    path,
                    recursive: *recursive,
                    order: *order,
                    aliases,
                };
                Ok((plan, scope))
            }
            SourceKind::Text { path } => {
                let path = ExpressionBuilder::build_as(self, &Scope::default(), path, DataType::String)?;
                let scope = Scope::new(TextProvider::schema(), aliases.clone());
                Ok((QueryPlan::Text { path, aliases }, scope))
            }
            SourceKind::Subquery(query) => {
                let plan = self.plan_select(query)?;
                let scope = Scope::new(plan.columns(), aliases);
                Ok((plan, scope))
            }
            SourceKind::View { name, arguments } => self.plan_view(name, arguments, source.alias.as_deref()),
        }
    }

    fn plan_view(&self, name: &str, arguments: &[Expr], alias: Option<&str>) -> Result<(QueryPlan, Scope), QueryError> {
        let key = name.to_lowercase();
        if self.expanding.contains(&key) {
            return Err(QueryError::ViewRecursion(name.to_string()));
        }
        let view = self
            .session
            .views
            .get(name)
            .ok_or_else(|| QueryError::ViewNotFound(name.to_string()))?;
        if arguments.len() != view.parameters.len() {
            return Err(QueryError::ViewArgumentCount {
                name: view.name.clone(),
                expected: view.parameters.len(),
                actual: arguments.len(),
            });
        }

        let mut aliases = vec![view.name.clone()];
        aliases.extend(alias.map(str::to_string));

        match &view.source {
            ViewSource::Native(factory) => {
                let scope = Scope::new(factory.columns(), aliases.clone());
                let plan = QueryPlan::Native {
                    name: view.name.clone(),
                    factory: Arc::clone(factory),
                    aliases,
                };
                Ok((plan, scope))
            }
            ViewSource::Query(query) => {
                let empty = Scope::default();
                let arguments = view
                    .parameters
                    .iter()
                    .zip(arguments)
                    .map(|(p, a)| ExpressionBuilder::build_as(self, &empty, a, p.data_type))
                    .collect::<Result<Vec<_>, _>>()?;

                let variables = if view.parameters.is_empty() {
                    self.variables.share()
                } else {
                    let scoped = self.variables.fork();
                    for parameter in &view.parameters {
                        scoped.redeclare(&parameter.name, parameter.data_type);
                    }
                    scoped
                };
                let mut expanding = self.expanding.clone();
                expanding.push(key);
                let nested = Planner {
                    session: self.session,
                    variables,
                    expanding,
                };
                let body = nested.plan_select(query)?;

                let scope = Scope::new(body.columns(), aliases.clone());
                let plan = QueryPlan::View {
                    name: view.name.clone(),
                    parameters: view.parameters.clone(),
                    arguments,
                    body: Box::new(body),
                    aliases,
                };
                Ok((plan, scope))
            }
        }
    }

    fn select_list(&self, items: &[SelectItem], scope: &Scope) -> Result<(Vec<Column>, Vec<Expression>), QueryError> {
        let mut columns = Vec::new();
        let mut expressions = Vec::new();
        for item in items {
            match item {
                SelectItem::Wildcard => {
                    for (ordinal, column) in scope.columns.iter().enumerate() {
                        columns.push(column.clone());
                        expressions.push(Expression::column(ordinal, column.data_type));
                    }
                }
                SelectItem::Expr { expr, alias } => {
                    let expression = ExpressionBuilder::build(self, scope, expr)?;
                    let name = match alias {
                        Some(alias) => alias.clone(),
                        None => default_name(expr, scope, columns.len() + 1),
                    };
                    columns.push(Column::new(name, expression.data_type()));
                    expressions.push(expression);
                }
            }
        }
        Ok((columns, expressions))
    }

    /// Sort keys, preferably over the select list (aliases and ordinals).
    /// When a key only makes sense over the source columns, every key is
    /// planned against the source and the sort runs before the projection.
    fn order_keys(
        &self,
        order_by: &[OrderItem],
        scope: &Scope,
        columns: &[Column],
        items: &[Expression],
    ) -> Result<(Vec<(Expression, SortOrder)>, bool), QueryError> {
        if order_by.is_empty() {
            return Ok((Vec::new(), true));
        }

        let output = Scope::new(columns.to_vec(), Vec::new());
        let over_output = sort_keys(order_by, |key| match key {
            OrderKey::Ordinal(n) => ordinal(*n, columns.len()).map(|i| Expression::column(i, columns[i].data_type)),
            OrderKey::Expr(expr) => ExpressionBuilder::build(self, &output, expr),
        });

        match over_output {
            Ok(keys) => Ok((keys, true)),
            Err(QueryError::ColumnNotFound(_) | QueryError::AmbiguousColumn(_)) => {
                let keys = sort_keys(order_by, |key| match key {
                    OrderKey::Ordinal(n) => ordinal(*n, items.len()).map(|i| items[i].clone()),
                    OrderKey::Expr(expr) => ExpressionBuilder::build(self, scope, expr),
                })?;
                Ok((keys, false))
            }
            Err(e) => Err(e),
        }
    }
}

fn sort_keys(
    order_by: &[OrderItem],
    mut key: impl FnMut(&OrderKey) -> Result<Expression, QueryError>,
) -> Result<Vec<(Expression, SortOrder)>, QueryError> {
    let mut keys = Vec::with_capacity(order_by.len());
    for item in order_by {
        keys.push((key(&item.key)?, item.order));
    }
    Ok(keys)
}

// 1-based select-list position to index
fn ordinal(n: usize, len: usize) -> Result<usize, QueryError> {
    if n == 0 || n > len {
        return Err(QueryError::ColumnNotFound(format!("#{n}")));
    }
    Ok(n - 1)
}

fn default_name(expr: &Expr, scope: &Scope, position: usize) -> String {
    match expr {
        Expr::Column { qualifier, name } => scope
            .resolve(qualifier.as_deref(), name)
            .map_or_else(|_| name.clone(), |i| scope.columns[i].name.clone()),
        Expr::SystemVariable(name) => name.clone(),
        Expr::Variable(name) => name.trim_start_matches('@').to_string(),
        _ => format!("Column{position}"),
    }
}
