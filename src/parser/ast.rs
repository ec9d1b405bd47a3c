use std::fmt;

/*
Statements and expressions are tagged-variant trees, immutable once parsed.
Each parent uniquely owns its children (`Box`), and a `Program` owns its
statements outright — there is no sharing and no interior mutability at this
layer, unlike the runtime `Object`/`Environment` model downstream.
*/

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Let {
        name: String,
        value: Expression,
    },
    Return {
        value: Expression,
    },
    Expression(Expression),
    /// A brace-delimited sequence of statements; carries its own `let` scope
    /// at evaluation time but is not itself a scope boundary for parsing.
    Block(Vec<Statement>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    IntegerLiteral(i64),
    StringLiteral(String),
    BooleanLiteral(bool),
    Identifier(String),
    Prefix {
        operator: String,
        right: Box<Expression>,
    },
    Infix {
        operator: String,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    If {
        condition: Box<Expression>,
        consequence: Vec<Statement>,
        alternative: Option<Vec<Statement>>,
    },
    FunctionLiteral {
        parameters: Vec<String>,
        body: Vec<Statement>,
    },
    Call {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
    ArrayLiteral(Vec<Expression>),
    Index {
        left: Box<Expression>,
        index: Box<Expression>,
    },
    /// Ordered to preserve source order for display, not just map semantics.
    HashLiteral(Vec<(Expression, Expression)>),
    NamespaceLiteral(Vec<Statement>),
    Dot {
        left: Box<Expression>,
        /// The right side of `.` must be an identifier; storing it as a
        /// plain `String` (rather than a general `Expression`) makes that
        /// restriction a type-level fact instead of a runtime check.
        field: String,
    },
}

/// Used only to render `Function::inspect()`'s body — approximate
/// re-source-ification, not a parser round-trip guarantee.
fn fmt_block(stmts: &[Statement], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, stmt) in stmts.iter().enumerate() {
        if i > 0 {
            writeln!(f)?;
        }
        write!(f, "{}", stmt)?;
    }
    Ok(())
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { name, value } => write!(f, "let {} = {};", name, value),
            Statement::Return { value } => write!(f, "return {};", value),
            Statement::Expression(expr) => write!(f, "{}", expr),
            Statement::Block(stmts) => fmt_block(stmts, f),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::IntegerLiteral(v) => write!(f, "{}", v),
            Expression::StringLiteral(s) => write!(f, "{}", s),
            Expression::BooleanLiteral(v) => write!(f, "{}", v),
            Expression::Identifier(name) => write!(f, "{}", name),
            Expression::Prefix { operator, right } => write!(f, "({}{})", operator, right),
            Expression::Infix {
                operator,
                left,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if {} {{ ", condition)?;
                fmt_block(consequence, f)?;
                write!(f, " }}")?;
                if let Some(alt) = alternative {
                    write!(f, " else {{ ")?;
                    fmt_block(alt, f)?;
                    write!(f, " }}")?;
                }
                Ok(())
            }
            Expression::FunctionLiteral { parameters, body } => {
                write!(f, "fn({}) {{ ", parameters.join(", "))?;
                fmt_block(body, f)?;
                write!(f, " }}")
            }
            Expression::Call {
                function,
                arguments,
            } => {
                let args: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", function, args.join(", "))
            }
            Expression::ArrayLiteral(elements) => {
                let parts: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Expression::Index { left, index } => write!(f, "({}[{}])", left, index),
            Expression::HashLiteral(pairs) => {
                let parts: Vec<String> =
                    pairs.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Expression::NamespaceLiteral(body) => {
                write!(f, "namespace {{ ")?;
                fmt_block(body, f)?;
                write!(f, " }}")
            }
            Expression::Dot { left, field } => write!(f, "{}.{}", left, field),
        }
    }
}
