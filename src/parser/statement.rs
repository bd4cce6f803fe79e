use crate::core::{CompareOp, DataType, Value};

/// One executable statement of a query batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// USE <expr>: changes the current directory
    Use(Expr),
    Declare(Vec<VariableDecl>),
    Set {
        name: String,
        value: Expr,
    },
    CreateView {
        name: String,
        parameters: Vec<VariableDecl>,
        query: SelectQuery,
    },
    AlterView {
        name: String,
        parameters: Vec<VariableDecl>,
        query: SelectQuery,
    },
    DropView {
        name: String,
    },
    Select(SelectQuery),
}

impl Command {
    /// Short statement kind for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Use(_) => "USE",
            Self::Declare(_) => "DECLARE",
            Self::Set { .. } => "SET",
            Self::CreateView { .. } => "CREATE VIEW",
            Self::AlterView { .. } => "ALTER VIEW",
            Self::DropView { .. } => "DROP VIEW",
            Self::Select(_) => "SELECT",
        }
    }
}

/// `@name TYPE` as written in DECLARE and view parameter lists.
/// The name keeps its leading `@`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDecl {
    pub name: String,
    pub data_type: DataType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub top: Option<u64>,
    pub items: Vec<SelectItem>,
    /// None for `SELECT <exprs>` without FROM
    pub from: Option<SourceRef>,
    pub filter: Option<Expr>,
    pub order_by: Vec<OrderItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Wildcard,
    Expr {
        expr: Expr,
        alias: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub key: OrderKey,
    pub order: SortOrder,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderKey {
    /// 1-based position in the select list
    Ordinal(usize),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceRef {
    pub kind: SourceKind,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    /// DIR(<pattern> [, RECURSIVE] [, NAME|WRITETIME [ASC|DESC]])
    Directory {
        path: Expr,
        recursive: bool,
        order: Option<DirectoryOrder>,
    },
    /// TEXT(<pattern>)
    Text { path: Expr },
    Subquery(Box<SelectQuery>),
    View { name: String, arguments: Vec<Expr> },
}

/// Explicit listing order for the directory source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryOrder {
    Name(SortOrder),
    WriteTime(SortOrder),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Column {
        qualifier: Option<String>,
        name: String,
    },
    /// `@name`, stored with the `@`
    Variable(String),
    /// `@@name`, stored without the `@@`
    SystemVariable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Like {
        operand: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },
    Match {
        operand: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },
    /// `left <op> ANY (...)`; `IN` parses to `= ANY`
    Any {
        op: CompareOp,
        left: Box<Expr>,
        target: AnyTarget,
    },
    Function {
        name: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column {
            qualifier: None,
            name: name.into(),
        }
    }

    pub fn string(text: impl Into<String>) -> Self {
        Self::Literal(Value::String(text.into()))
    }

    pub fn binary(op: BinaryOp, left: Self, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(operand: Self) -> Self {
        Self::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnyTarget {
    List(Vec<Expr>),
    Subquery(Box<SelectQuery>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    And,
    Or,
    Compare(CompareOp),
}

impl BinaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Compare(op) => op.symbol(),
        }
    }
}
