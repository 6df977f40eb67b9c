use crate::sql::lexer::{tokenize, Keyword, Symbol, Token};
use crate::types::error::{DatabaseError, Result};
use crate::types::value::{ColumnType, Value};

/*
 * Grammar (uppercase = keyword tokens):
 *
 *   stmt      := select | insert | update | delete | create | drop
 *   select    := SELECT (* | ident (',' ident)*) FROM ident
 *                [WHERE condition] [ORDER BY ident [ASC|DESC]] [LIMIT NUMBER]
 *   insert    := INSERT INTO ident VALUES '(' literal (',' literal)* ')'
 *   update    := UPDATE ident SET ident '=' literal (',' ident '=' literal)*
 *                [WHERE condition]
 *   delete    := DELETE FROM ident [WHERE condition]
 *   create    := CREATE TABLE ident '(' coldef (',' coldef)* ')'
 *   coldef    := ident (INT|TEXT)
 *   drop      := DROP TABLE ident
 *   condition := and_cond (OR and_cond)*
 *   and_cond  := predicate (AND predicate)*
 *   predicate := ident op literal
 *   op        := '=' | '!=' | '<>' | '<' | '>' | '<=' | '>='
 *   literal   := NUMBER | STRING
 *
 * A trailing ';' is optional. AND binds tighter than OR.
 */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Pred {
        column: String,
        op: CompareOp,
        value: Value,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    All,
    Columns(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    pub columns: Projection,
    pub table: String,
    pub where_clause: Option<Condition>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    pub table: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStmt {
    pub table: String,
    pub assignments: Vec<(String, Value)>,
    pub where_clause: Option<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStmt {
    pub table: String,
    pub where_clause: Option<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStmt {
    pub table: String,
    pub columns: Vec<(String, ColumnType)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStmt {
    pub table: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectStmt),
    Insert(InsertStmt),
    Update(UpdateStmt),
    Delete(DeleteStmt),
    CreateTable(CreateTableStmt),
    DropTable(DropTableStmt),
}

/// Tokenize and parse a single SQL statement.
pub fn parse(sql: &str) -> Result<Statement> {
    let tokens = tokenize(sql)?;
    Parser::new(tokens).parse()
}

/// Recursive-descent parser over the token stream.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(mut self) -> Result<Statement> {
        let stmt = match self.peek() {
            Token::Keyword(Keyword::Select) => Statement::Select(self.parse_select()?),
            Token::Keyword(Keyword::Insert) => Statement::Insert(self.parse_insert()?),
            Token::Keyword(Keyword::Update) => Statement::Update(self.parse_update()?),
            Token::Keyword(Keyword::Delete) => Statement::Delete(self.parse_delete()?),
            Token::Keyword(Keyword::Create) => Statement::CreateTable(self.parse_create()?),
            Token::Keyword(Keyword::Drop) => Statement::DropTable(self.parse_drop()?),
            Token::Eof => return Err(DatabaseError::UnexpectedEof),
            other => {
                return Err(unexpected("a statement keyword", other));
            }
        };
        self.match_symbol(Symbol::Semicolon);
        match self.peek() {
            Token::Eof => Ok(stmt),
            other => Err(unexpected("end of statement", other)),
        }
    }

    // ── statements ───────────────────────────────────────────────────

    fn parse_select(&mut self) -> Result<SelectStmt> {
        self.expect_keyword(Keyword::Select)?;
        let columns = if self.match_symbol(Symbol::Star) {
            Projection::All
        } else {
            let mut cols = vec![self.expect_ident()?];
            while self.match_symbol(Symbol::Comma) {
                cols.push(self.expect_ident()?);
            }
            Projection::Columns(cols)
        };
        self.expect_keyword(Keyword::From)?;
        let table = self.expect_ident()?;
        let where_clause = self.parse_where_opt()?;
        let order_by = self.parse_order_by_opt()?;
        let limit = self.parse_limit_opt()?;
        Ok(SelectStmt {
            columns,
            table,
            where_clause,
            order_by,
            limit,
        })
    }

    fn parse_insert(&mut self) -> Result<InsertStmt> {
        self.expect_keyword(Keyword::Insert)?;
        self.expect_keyword(Keyword::Into)?;
        let table = self.expect_ident()?;
        self.expect_keyword(Keyword::Values)?;
        self.expect_symbol(Symbol::LParen)?;
        let mut values = vec![self.parse_literal()?];
        while self.match_symbol(Symbol::Comma) {
            values.push(self.parse_literal()?);
        }
        self.expect_symbol(Symbol::RParen)?;
        Ok(InsertStmt { table, values })
    }

    fn parse_update(&mut self) -> Result<UpdateStmt> {
        self.expect_keyword(Keyword::Update)?;
        let table = self.expect_ident()?;
        self.expect_keyword(Keyword::Set)?;
        let mut assignments = vec![self.parse_assignment()?];
        while self.match_symbol(Symbol::Comma) {
            assignments.push(self.parse_assignment()?);
        }
        let where_clause = self.parse_where_opt()?;
        Ok(UpdateStmt {
            table,
            assignments,
            where_clause,
        })
    }

    fn parse_delete(&mut self) -> Result<DeleteStmt> {
        self.expect_keyword(Keyword::Delete)?;
        self.expect_keyword(Keyword::From)?;
        let table = self.expect_ident()?;
        let where_clause = self.parse_where_opt()?;
        Ok(DeleteStmt {
            table,
            where_clause,
        })
    }

    fn parse_create(&mut self) -> Result<CreateTableStmt> {
        self.expect_keyword(Keyword::Create)?;
        self.expect_keyword(Keyword::Table)?;
        let table = self.expect_ident()?;
        self.expect_symbol(Symbol::LParen)?;
        let mut columns = vec![self.parse_coldef()?];
        while self.match_symbol(Symbol::Comma) {
            columns.push(self.parse_coldef()?);
        }
        self.expect_symbol(Symbol::RParen)?;
        Ok(CreateTableStmt { table, columns })
    }

    fn parse_drop(&mut self) -> Result<DropTableStmt> {
        self.expect_keyword(Keyword::Drop)?;
        self.expect_keyword(Keyword::Table)?;
        let table = self.expect_ident()?;
        Ok(DropTableStmt { table })
    }

    // ── clauses ──────────────────────────────────────────────────────

    fn parse_where_opt(&mut self) -> Result<Option<Condition>> {
        if self.match_keyword(Keyword::Where) {
            Ok(Some(self.parse_condition()?))
        } else {
            Ok(None)
        }
    }

    fn parse_condition(&mut self) -> Result<Condition> {
        let mut terms = vec![self.parse_and_cond()?];
        while self.match_keyword(Keyword::Or) {
            terms.push(self.parse_and_cond()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Condition::Or(terms)
        })
    }

    fn parse_and_cond(&mut self) -> Result<Condition> {
        let mut terms = vec![self.parse_predicate()?];
        while self.match_keyword(Keyword::And) {
            terms.push(self.parse_predicate()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Condition::And(terms)
        })
    }

    fn parse_predicate(&mut self) -> Result<Condition> {
        let column = self.expect_ident()?;
        let op = self.parse_op()?;
        let value = self.parse_literal()?;
        Ok(Condition::Pred { column, op, value })
    }

    fn parse_op(&mut self) -> Result<CompareOp> {
        let op = match self.peek() {
            Token::Symbol(Symbol::Eq) => CompareOp::Eq,
            Token::Symbol(Symbol::Neq) => CompareOp::Neq,
            Token::Symbol(Symbol::Lt) => CompareOp::Lt,
            Token::Symbol(Symbol::Gt) => CompareOp::Gt,
            Token::Symbol(Symbol::Le) => CompareOp::Le,
            Token::Symbol(Symbol::Ge) => CompareOp::Ge,
            other => return Err(unexpected("a comparison operator", other)),
        };
        self.advance();
        Ok(op)
    }

    fn parse_order_by_opt(&mut self) -> Result<Option<OrderBy>> {
        if !self.match_keyword(Keyword::Order) {
            return Ok(None);
        }
        self.expect_keyword(Keyword::By)?;
        let column = self.expect_ident()?;
        let descending = if self.match_keyword(Keyword::Desc) {
            true
        } else {
            self.match_keyword(Keyword::Asc);
            false
        };
        Ok(Some(OrderBy { column, descending }))
    }

    fn parse_limit_opt(&mut self) -> Result<Option<usize>> {
        if !self.match_keyword(Keyword::Limit) {
            return Ok(None);
        }
        match self.peek().clone() {
            Token::Number(n) if n >= 0 => {
                self.advance();
                Ok(Some(n as usize))
            }
            other => Err(unexpected("a non-negative LIMIT count", &other)),
        }
    }

    fn parse_assignment(&mut self) -> Result<(String, Value)> {
        let column = self.expect_ident()?;
        self.expect_symbol(Symbol::Eq)?;
        let value = self.parse_literal()?;
        Ok((column, value))
    }

    fn parse_coldef(&mut self) -> Result<(String, ColumnType)> {
        let name = self.expect_ident()?;
        let column_type = match self.peek() {
            Token::Keyword(Keyword::Int) => ColumnType::Int,
            Token::Keyword(Keyword::Text) => ColumnType::Text,
            other => return Err(unexpected("a column type (INT or TEXT)", other)),
        };
        self.advance();
        Ok((name, column_type))
    }

    fn parse_literal(&mut self) -> Result<Value> {
        let value = match self.peek() {
            Token::Number(n) => Value::Integer(*n),
            Token::String(s) => Value::Text(s.clone()),
            other => return Err(unexpected("a literal value", other)),
        };
        self.advance();
        Ok(value)
    }

    // ── token-stream helpers ─────────────────────────────────────────

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        match self.peek() {
            Token::Keyword(found) if *found == keyword => {
                self.advance();
                Ok(())
            }
            other => Err(unexpected(&keyword.to_string(), other)),
        }
    }

    fn expect_symbol(&mut self, symbol: Symbol) -> Result<()> {
        match self.peek() {
            Token::Symbol(found) if *found == symbol => {
                self.advance();
                Ok(())
            }
            other => Err(unexpected(&format!("'{}'", symbol), other)),
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.peek() {
            Token::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(unexpected("an identifier", other)),
        }
    }

    fn match_keyword(&mut self, keyword: Keyword) -> bool {
        if matches!(self.peek(), Token::Keyword(found) if *found == keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_symbol(&mut self, symbol: Symbol) -> bool {
        if matches!(self.peek(), Token::Symbol(found) if *found == symbol) {
            self.advance();
            true
        } else {
            false
        }
    }
}

fn unexpected(expected: &str, found: &Token) -> DatabaseError {
    match found {
        Token::Eof => DatabaseError::UnexpectedEof,
        other => DatabaseError::UnexpectedToken {
            expected: expected.to_string(),
            found: other.to_string(),
        },
    }
}
