use std::collections::HashMap;

use crate::lexer::Lexer;
use crate::parser::ast::{Expression, Program, Statement};
use crate::token::{Token, TokenKind};

/*
A Pratt parser: prefix and infix parse functions are looked up by the
current/peek token kind and invoked with a precedence ceiling. Binding power
climbs strictly left to right, matching spec order:

  LOWEST < OR < AND < EQUALS < LESSGREATER < SUM < PRODUCT < PREFIX < CALL
  < INDEX < DOT

Tokens absent from the table act as LOWEST, which is what lets
`parse_expression` stop cleanly at statement boundaries.
*/
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
enum Precedence {
    Lowest,
    Or,
    And,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
    Dot,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    use TokenKind::*;
    match kind {
        Or => Precedence::Or,
        And => Precedence::And,
        Eq | NotEq => Precedence::Equals,
        Lt | Gt | Leq | Geq => Precedence::LessGreater,
        Plus | Minus => Precedence::Sum,
        Slash | Asterisk => Precedence::Product,
        LParen => Precedence::Call,
        LBracket => Precedence::Index,
        Dot => Precedence::Dot,
        _ => Precedence::Lowest,
    }
}

type PrefixFn = fn(&mut Parser) -> Option<Expression>;
type InfixFn = fn(&mut Parser, Expression) -> Option<Expression>;

pub struct Parser {
    lexer: Lexer,
    cur_token: Token,
    peek_token: Token,
    errors: Vec<String>,
    prefix_fns: HashMap<TokenKind, PrefixFn>,
    infix_fns: HashMap<TokenKind, InfixFn>,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let cur_token = lexer.next_token();
        let peek_token = lexer.next_token();

        let mut prefix_fns: HashMap<TokenKind, PrefixFn> = HashMap::new();
        prefix_fns.insert(TokenKind::Ident, Parser::parse_identifier);
        prefix_fns.insert(TokenKind::Int, Parser::parse_integer_literal);
        prefix_fns.insert(TokenKind::String, Parser::parse_string_literal);
        prefix_fns.insert(TokenKind::True, Parser::parse_boolean_literal);
        prefix_fns.insert(TokenKind::False, Parser::parse_boolean_literal);
        prefix_fns.insert(TokenKind::Bang, Parser::parse_prefix_expression);
        prefix_fns.insert(TokenKind::Minus, Parser::parse_prefix_expression);
        prefix_fns.insert(TokenKind::LParen, Parser::parse_grouped_expression);
        prefix_fns.insert(TokenKind::If, Parser::parse_if_expression);
        prefix_fns.insert(TokenKind::Function, Parser::parse_function_literal);
        prefix_fns.insert(TokenKind::LBracket, Parser::parse_array_literal);
        prefix_fns.insert(TokenKind::LBrace, Parser::parse_hash_literal);
        prefix_fns.insert(TokenKind::Namespace, Parser::parse_namespace_literal);

        let mut infix_fns: HashMap<TokenKind, InfixFn> = HashMap::new();
        for kind in [
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Slash,
            TokenKind::Asterisk,
            TokenKind::Eq,
            TokenKind::NotEq,
            TokenKind::Lt,
            TokenKind::Gt,
            TokenKind::Leq,
            TokenKind::Geq,
            TokenKind::And,
            TokenKind::Or,
        ] {
            infix_fns.insert(kind, Parser::parse_infix_expression as InfixFn);
        }
        infix_fns.insert(TokenKind::LParen, Parser::parse_call_expression);
        infix_fns.insert(TokenKind::LBracket, Parser::parse_index_expression);
        infix_fns.insert(TokenKind::Dot, Parser::parse_dot_expression);

        Self {
            lexer,
            cur_token,
            peek_token,
            errors: Vec::new(),
            prefix_fns,
            infix_fns,
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    fn next_token(&mut self) {
        std::mem::swap(&mut self.cur_token, &mut self.peek_token);
        self.peek_token = self.lexer.next_token();
    }

    fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur_token.kind == kind
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek_token.kind == kind
    }

    fn peek_precedence(&self) -> Precedence {
        precedence_of(self.peek_token.kind)
    }

    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek_is(kind) {
            self.next_token();
            true
        } else {
            self.peek_error(kind);
            false
        }
    }

    fn peek_error(&mut self, expected: TokenKind) {
        self.errors.push(format!(
            "expected next token to be {}, got {} instead",
            expected, self.peek_token.kind
        ));
    }

    fn no_prefix_parse_fn_error(&mut self, kind: TokenKind) {
        self.errors
            .push(format!("no prefix parse function for {} found", kind));
    }

    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        while !self.cur_is(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.next_token();
        }
        Program { statements }
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.cur_token.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Statement> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur_token.literal.clone();

        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }

        Some(Statement::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }

        Some(Statement::Return { value })
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let expr = self.parse_expression(Precedence::Lowest)?;

        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }

        Some(Statement::Expression(expr))
    }

    fn parse_block_statement(&mut self) -> Vec<Statement> {
        let mut statements = Vec::new();
        self.next_token();

        while !self.cur_is(TokenKind::RBrace) && !self.cur_is(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.next_token();
        }

        statements
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let prefix = self.prefix_fns.get(&self.cur_token.kind).copied();
        let mut left = match prefix {
            Some(prefix_fn) => prefix_fn(self)?,
            None => {
                self.no_prefix_parse_fn_error(self.cur_token.kind);
                return None;
            }
        };

        while !self.peek_is(TokenKind::Semicolon) && precedence < self.peek_precedence() {
            let infix = self.infix_fns.get(&self.peek_token.kind).copied();
            let infix_fn = match infix {
                Some(f) => f,
                None => return Some(left),
            };
            self.next_token();
            left = infix_fn(self, left)?;
        }

        Some(left)
    }

    fn parse_identifier(&mut self) -> Option<Expression> {
        Some(Expression::Identifier(self.cur_token.literal.clone()))
    }

    fn parse_integer_literal(&mut self) -> Option<Expression> {
        match self.cur_token.literal.parse::<i64>() {
            Ok(value) => Some(Expression::IntegerLiteral(value)),
            Err(_) => {
                self.errors.push(format!(
                    "could not parse {:?} as integer",
                    self.cur_token.literal
                ));
                None
            }
        }
    }

    fn parse_string_literal(&mut self) -> Option<Expression> {
        Some(Expression::StringLiteral(self.cur_token.literal.clone()))
    }

    fn parse_boolean_literal(&mut self) -> Option<Expression> {
        Some(Expression::BooleanLiteral(self.cur_is(TokenKind::True)))
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        let operator = self.cur_token.literal.clone();
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::Prefix {
            operator,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        let operator = self.cur_token.literal.clone();
        let precedence = precedence_of(self.cur_token.kind);
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Some(Expression::Infix {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        Some(expr)
    }

    fn parse_if_expression(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let consequence = self.parse_block_statement();

        let alternative = if self.peek_is(TokenKind::Else) {
            self.next_token();
            if !self.expect_peek(TokenKind::LBrace) {
                return None;
            }
            Some(self.parse_block_statement())
        } else {
            None
        };

        Some(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function_literal(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        let parameters = self.parse_function_parameters()?;

        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_statement();

        Some(Expression::FunctionLiteral { parameters, body })
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<String>> {
        let mut identifiers = Vec::new();

        if self.peek_is(TokenKind::RParen) {
            self.next_token();
            return Some(identifiers);
        }

        self.next_token();
        identifiers.push(self.cur_token.literal.clone());

        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            identifiers.push(self.cur_token.literal.clone());
        }

        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }

        Some(identifiers)
    }

    fn parse_call_expression(&mut self, function: Expression) -> Option<Expression> {
        let arguments = self.parse_expression_list(TokenKind::RParen)?;
        Some(Expression::Call {
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expression>> {
        let mut list = Vec::new();

        if self.peek_is(end) {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(end) {
            return None;
        }

        Some(list)
    }

    fn parse_array_literal(&mut self) -> Option<Expression> {
        let elements = self.parse_expression_list(TokenKind::RBracket)?;
        Some(Expression::ArrayLiteral(elements))
    }

    fn parse_index_expression(&mut self, left: Expression) -> Option<Expression> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenKind::RBracket) {
            return None;
        }

        Some(Expression::Index {
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    fn parse_hash_literal(&mut self) -> Option<Expression> {
        let mut pairs = Vec::new();

        while !self.peek_is(TokenKind::RBrace) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;

            if !self.expect_peek(TokenKind::Colon) {
                return None;
            }

            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;

            pairs.push((key, value));

            if !self.peek_is(TokenKind::RBrace) && !self.expect_peek(TokenKind::Comma) {
                return None;
            }
        }

        if !self.expect_peek(TokenKind::RBrace) {
            return None;
        }

        Some(Expression::HashLiteral(pairs))
    }

    fn parse_namespace_literal(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_statement();
        Some(Expression::NamespaceLiteral(body))
    }

    /// The right side of `.` is restricted to an identifier. A non-identifier
    /// right-hand side (e.g. `a.(1 + 2)`) is therefore reported the same way
    /// any other unexpected-peek-token mismatch is: a parse error, not an
    /// evaluator error.
    fn parse_dot_expression(&mut self, left: Expression) -> Option<Expression> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let field = self.cur_token.literal.clone();
        Some(Expression::Dot {
            left: Box::new(left),
            field,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Program {
        let lexer = Lexer::new(input);
        let mut parser = Parser::new(lexer);
        let program = parser.parse_program();
        assert!(
            parser.errors().is_empty(),
            "parser errors: {:?}",
            parser.errors()
        );
        program
    }

    #[test]
    fn parses_let_statements() {
        let program = parse("let x = 5; let y = true; let z = \"hi\";");
        assert_eq!(program.statements.len(), 3);
        match &program.statements[0] {
            Statement::Let { name, value } => {
                assert_eq!(name, "x");
                assert_eq!(*value, Expression::IntegerLiteral(5));
            }
            other => panic!("expected let statement, got {:?}", other),
        }
    }

    #[test]
    fn parses_operator_precedence() {
        let program = parse("5 + 10 * 2 + 15 / 3 * 2 + -10;");
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn parses_and_or_with_correct_precedence() {
        // `&&` binds tighter than `||`, both looser than equality.
        let program = parse("a == b && c || d;");
        let Statement::Expression(expr) = &program.statements[0] else {
            panic!("expected expression statement");
        };
        match expr {
            Expression::Infix { operator, left, .. } => {
                assert_eq!(operator, "||");
                match left.as_ref() {
                    Expression::Infix { operator, .. } => assert_eq!(operator, "&&"),
                    other => panic!("expected && on the left of ||, got {:?}", other),
                }
            }
            other => panic!("expected infix expression, got {:?}", other),
        }
    }

    #[test]
    fn parses_namespace_and_dot_call() {
        let program = parse(
            "let Person = namespace { let new = fn(age) { self() }; }; Person.new(30);",
        );
        assert_eq!(program.statements.len(), 2);
        match &program.statements[1] {
            Statement::Expression(Expression::Call { function, .. }) => match function.as_ref() {
                Expression::Dot { field, .. } => assert_eq!(field, "new"),
                other => panic!("expected dot callee, got {:?}", other),
            },
            other => panic!("expected call statement, got {:?}", other),
        }
    }

    #[test]
    fn dot_with_non_identifier_rhs_is_a_parse_error() {
        let lexer = Lexer::new("a.(1);");
        let mut parser = Parser::new(lexer);
        parser.parse_program();
        assert!(!parser.errors().is_empty());
    }

    #[test]
    fn reports_no_prefix_parse_function_error() {
        let lexer = Lexer::new(")");
        let mut parser = Parser::new(lexer);
        parser.parse_program();
        assert!(parser
            .errors()
            .iter()
            .any(|e| e.contains("no prefix parse function")));
    }
}
