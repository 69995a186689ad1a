use std::fmt;
use std::rc::Rc;

use crate::frontend::{
    Identifier,
    block::Block,
    expression::{Expression, FunctionBody},
};

#[derive(Debug, Clone)]
pub enum Statement {
    Local {
        names: Vec<Identifier>,
        values: Vec<Expression>,
    },
    LocalFunction {
        name: Identifier,
        function: Rc<FunctionBody>,
    },
    /// Plain and compound targets; `function a.b:c() end` lands here too.
    Assign {
        targets: Vec<Expression>,
        values: Vec<Expression>,
    },
    /// A call evaluated for its side effects.
    Expression {
        expression: Expression,
    },
    Return {
        values: Vec<Expression>,
    },
    Break,
    If {
        branches: Vec<(Expression, Block)>,
        alternative: Option<Block>,
    },
    While {
        condition: Expression,
        body: Block,
    },
    Repeat {
        body: Block,
        condition: Expression,
    },
    NumericFor {
        variable: Identifier,
        start: Expression,
        limit: Expression,
        step: Option<Expression>,
        body: Block,
    },
    GenericFor {
        names: Vec<Identifier>,
        expressions: Vec<Expression>,
        body: Block,
    },
    Do {
        body: Block,
    },
}

fn join(items: &[Expression]) -> String {
    items
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Local { names, values } if values.is_empty() => {
                write!(f, "local {}", names.join(", "))
            }
            Statement::Local { names, values } => {
                write!(f, "local {} = {}", names.join(", "), join(values))
            }
            Statement::LocalFunction { name, function } => {
                write!(
                    f,
                    "local function {}({}) {} end",
                    name,
                    function.parameters.join(", "),
                    function.body
                )
            }
            Statement::Assign { targets, values } => {
                write!(f, "{} = {}", join(targets), join(values))
            }
            Statement::Expression { expression } => write!(f, "{}", expression),
            Statement::Return { values } if values.is_empty() => write!(f, "return"),
            Statement::Return { values } => write!(f, "return {}", join(values)),
            Statement::Break => write!(f, "break"),
            Statement::If {
                branches,
                alternative,
            } => {
                for (i, (condition, block)) in branches.iter().enumerate() {
                    let keyword = if i == 0 { "if" } else { " elseif" };
                    write!(f, "{} {} then {}", keyword, condition, block)?;
                }
                if let Some(alternative) = alternative {
                    write!(f, " else {}", alternative)?;
                }
                write!(f, " end")
            }
            Statement::While { condition, body } => {
                write!(f, "while {} do {} end", condition, body)
            }
            Statement::Repeat { body, condition } => {
                write!(f, "repeat {} until {}", body, condition)
            }
            Statement::NumericFor {
                variable,
                start,
                limit,
                step,
                body,
            } => {
                write!(f, "for {} = {}, {}", variable, start, limit)?;
                if let Some(step) = step {
                    write!(f, ", {}", step)?;
                }
                write!(f, " do {} end", body)
            }
            Statement::GenericFor {
                names,
                expressions,
                body,
            } => write!(
                f,
                "for {} in {} do {} end",
                names.join(", "),
                join(expressions),
                body
            ),
            Statement::Do { body } => write!(f, "do {} end", body),
        }
    }
}
