use std::fmt;
use std::rc::Rc;

use crate::frontend::{Identifier, block::Block, position::Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
            BinaryOp::Concat => "..",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "~=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    Len,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "not ",
            UnaryOp::Len => "#",
        }
    }
}

/// One entry of a table constructor.
#[derive(Debug, Clone)]
pub enum TableField {
    Positional(Expression),
    Named { name: Identifier, value: Expression },
    Keyed { key: Expression, value: Expression },
}

/// Parameters and body shared by every closure created from one `function` literal.
#[derive(Debug)]
pub struct FunctionBody {
    pub name: String,
    pub parameters: Vec<Identifier>,
    pub is_vararg: bool,
    pub body: Block,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub enum Expression {
    Nil,
    Boolean {
        value: bool,
    },
    Integer {
        value: i64,
    },
    Float {
        value: f64,
    },
    String {
        value: Rc<str>,
    },
    Vararg {
        position: Position,
    },
    Identifier {
        name: Identifier,
        position: Position,
    },
    Function(Rc<FunctionBody>),
    Table {
        fields: Vec<TableField>,
        position: Position,
    },
    Unary {
        operator: UnaryOp,
        right: Box<Expression>,
        position: Position,
    },
    Binary {
        left: Box<Expression>,
        operator: BinaryOp,
        right: Box<Expression>,
        position: Position,
    },
    Index {
        left: Box<Expression>,
        index: Box<Expression>,
        position: Position,
    },
    Call {
        function: Box<Expression>,
        arguments: Vec<Expression>,
        position: Position,
    },
    MethodCall {
        object: Box<Expression>,
        method: Identifier,
        arguments: Vec<Expression>,
        position: Position,
    },
    /// `( e )`: truncates a multi-valued expression to one value.
    Paren {
        expression: Box<Expression>,
    },
}

// Operator chains nest as deep as they are long; unlink them without
// recursing once per node.
impl Drop for Expression {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.take_children(&mut pending);
        while let Some(mut child) = pending.pop() {
            child.take_children(&mut pending);
        }
    }
}

impl Expression {
    fn take_children(&mut self, out: &mut Vec<Expression>) {
        fn take(slot: &mut Box<Expression>) -> Expression {
            std::mem::replace(slot.as_mut(), Expression::Nil)
        }

        match self {
            Expression::Unary { right, .. } => out.push(take(right)),
            Expression::Binary { left, right, .. } => {
                out.push(take(left));
                out.push(take(right));
            }
            Expression::Index { left, index, .. } => {
                out.push(take(left));
                out.push(take(index));
            }
            Expression::Call {
                function,
                arguments,
                ..
            } => {
                out.push(take(function));
                out.append(arguments);
            }
            Expression::MethodCall {
                object, arguments, ..
            } => {
                out.push(take(object));
                out.append(arguments);
            }
            Expression::Paren { expression } => out.push(take(expression)),
            _ => {}
        }
    }

    /// Calls and `...` may produce any number of values.
    pub fn is_multi_valued(&self) -> bool {
        matches!(
            self,
            Expression::Call { .. } | Expression::MethodCall { .. } | Expression::Vararg { .. }
        )
    }

    pub fn is_call(&self) -> bool {
        matches!(self, Expression::Call { .. } | Expression::MethodCall { .. })
    }

    /// Valid left-hand side of an assignment.
    pub fn is_assignable(&self) -> bool {
        matches!(self, Expression::Identifier { .. } | Expression::Index { .. })
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Nil => write!(f, "nil"),
            Expression::Boolean { value } => write!(f, "{}", value),
            Expression::Integer { value } => write!(f, "{}", value),
            Expression::Float { value } => write!(f, "{:?}", value),
            Expression::String { value } => write!(f, "{:?}", value),
            Expression::Vararg { .. } => write!(f, "..."),
            Expression::Identifier { name, .. } => write!(f, "{}", name),
            Expression::Function(body) => {
                write!(f, "function({}", body.parameters.join(", "))?;
                if body.is_vararg {
                    if !body.parameters.is_empty() {
                        write!(f, ", ")?;
                    }
                    write!(f, "...")?;
                }
                write!(f, ") {} end", body.body)
            }
            Expression::Table { fields, .. } => {
                write!(f, "{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match field {
                        TableField::Positional(value) => write!(f, "{}", value)?,
                        TableField::Named { name, value } => write!(f, "{} = {}", name, value)?,
                        TableField::Keyed { key, value } => write!(f, "[{}] = {}", key, value)?,
                    }
                }
                write!(f, "}}")
            }
            Expression::Unary {
                operator, right, ..
            } => write!(f, "({}{})", operator.symbol(), right),
            Expression::Binary {
                left,
                operator,
                right,
                ..
            } => write!(f, "({} {} {})", left, operator.symbol(), right),
            Expression::Index { left, index, .. } => write!(f, "{}[{}]", left, index),
            Expression::Call {
                function,
                arguments,
                ..
            } => {
                write!(f, "{}(", function)?;
                write_list(f, arguments)?;
                write!(f, ")")
            }
            Expression::MethodCall {
                object,
                method,
                arguments,
                ..
            } => {
                write!(f, "{}:{}(", object, method)?;
                write_list(f, arguments)?;
                write!(f, ")")
            }
            Expression::Paren { expression } => write!(f, "({})", expression),
        }
    }
}
