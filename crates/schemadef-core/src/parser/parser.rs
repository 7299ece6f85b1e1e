//! DDL parser implementation.

use tracing::debug;

use super::error::ParseError;
use crate::ast::{
    AlterAction, AlterColumnChange, AlterTableStatement, ColumnConstraint, ColumnConstraintDef,
    ColumnDef, ColumnPosition, CreateIndexStatement, CreateTableStatement, CreateViewStatement,
    DropIndexStatement, DropStatement, ForeignKeyRef, Fragment, Ident, IndexedColumn,
    QualifiedName, ReferentialAction, Statement, TableConstraint, TableConstraintDef, TypeName,
};
use crate::dialect::{Dialect, UnknownStatementPolicy};
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};

/// DDL parser.
pub struct Parser<'a> {
    input: &'a str,
    dialect: Dialect,
    lexer: Lexer<'a>,
    current: Token,
    previous: Token,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given input.
    #[must_use]
    pub fn new(input: &'a str, dialect: Dialect) -> Self {
        let mut lexer = Lexer::new(input).with_hash_comments(dialect.profile().hash_comments);
        let current = lexer.next_token();
        Self {
            input,
            dialect,
            lexer,
            current,
            previous: Token::new(TokenKind::Eof, Span::new(0, 0)),
        }
    }

    /// Parses every statement in the input.
    ///
    /// Statements are separated by semicolons; empty statements are skipped.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` locating the first malformed statement.
    pub fn parse_statements(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        loop {
            while self.check(&TokenKind::Semicolon) {
                self.advance();
            }
            if self.current.is_eof() {
                break;
            }
            let start = self.current.span.start;
            let statement = self
                .parse_statement()
                .map_err(|e| e.with_location(self.input, start))?;
            statements.push(statement);
        }
        Ok(statements)
    }

    /// Parses a single statement and its terminator.
    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let first = self.current.clone();
        let statement = match first.as_keyword() {
            Some(Keyword::Create) => self.parse_create(&first)?,
            Some(Keyword::Drop) => self.parse_drop(&first)?,
            Some(Keyword::Alter) => self.parse_alter(&first)?,
            _ => self.parse_unknown(&first)?,
        };
        self.expect_statement_end()?;
        Ok(statement)
    }

    // ================================================================
    // CREATE
    // ================================================================

    fn parse_create(&mut self, first: &Token) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Create)?;

        let or_replace = if self.check_keyword(Keyword::Or) {
            self.advance();
            self.expect_keyword(Keyword::Replace)?;
            true
        } else {
            false
        };
        if self.check_keyword(Keyword::Temporary) || self.check_keyword(Keyword::Temp) {
            self.advance();
        }
        let unique = if self.check_keyword(Keyword::Unique) {
            self.advance();
            true
        } else {
            false
        };

        match self.current.as_keyword() {
            Some(Keyword::Table) if !unique && !or_replace => Ok(Statement::CreateTable(
                self.parse_create_table(first.span.start)?,
            )),
            Some(Keyword::Index) if !or_replace => Ok(Statement::CreateIndex(
                self.parse_create_index(first.span.start, unique)?,
            )),
            Some(Keyword::View) if !unique => Ok(Statement::CreateView(
                self.parse_create_view(first.span.start, or_replace)?,
            )),
            _ => self.parse_unknown(first),
        }
    }

    fn parse_create_table(&mut self, start: usize) -> Result<CreateTableStatement, ParseError> {
        self.expect_keyword(Keyword::Table)?;
        let if_not_exists = self.parse_if_not_exists()?;
        let name = self.parse_qualified_name()?;
        self.expect(&TokenKind::LeftParen)?;

        let mut columns = Vec::new();
        let mut constraints = Vec::new();
        loop {
            if self.is_table_constraint_start(false) {
                constraints.push(self.parse_table_constraint()?);
            } else {
                columns.push(self.parse_column_def()?);
            }
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                self.expect(&TokenKind::RightParen)?;
                break;
            }
        }

        self.skip_table_options()?;

        Ok(CreateTableStatement {
            name,
            if_not_exists,
            columns,
            constraints,
            source: self.source_from(start),
        })
    }

    /// Skips trailing table options such as `WITHOUT ROWID` or `ENGINE=InnoDB`.
    fn skip_table_options(&mut self) -> Result<(), ParseError> {
        let start = self.current.span.start;
        while !self.at_statement_end() {
            if let TokenKind::Error(_) = self.current.kind {
                return Err(self.error("table option"));
            }
            self.advance();
        }
        if self.previous.span.end > start {
            debug!(
                options = %&self.input[start..self.previous.span.end],
                "ignoring table options"
            );
        }
        Ok(())
    }

    fn parse_create_index(
        &mut self,
        start: usize,
        unique: bool,
    ) -> Result<CreateIndexStatement, ParseError> {
        self.expect_keyword(Keyword::Index)?;
        let if_not_exists = self.parse_if_not_exists()?;
        let name = self.parse_qualified_name()?;
        self.expect_keyword(Keyword::On)?;
        let table = self.parse_qualified_name()?;
        self.skip_index_method();
        let columns = self.parse_indexed_columns()?;
        self.skip_index_method();

        let predicate = if self.check_keyword(Keyword::Where) {
            self.advance();
            Some(self.collect_until_statement_end()?)
        } else {
            None
        };

        Ok(CreateIndexStatement {
            name,
            table,
            unique,
            if_not_exists,
            columns,
            predicate,
            source: self.source_from(start),
        })
    }

    /// Skips `USING btree` style access method clauses.
    fn skip_index_method(&mut self) {
        if self.check_keyword(Keyword::Using) {
            self.advance();
            if matches!(self.current.kind, TokenKind::Identifier(_)) {
                self.advance();
            }
        }
    }

    fn parse_create_view(
        &mut self,
        start: usize,
        or_replace: bool,
    ) -> Result<CreateViewStatement, ParseError> {
        self.expect_keyword(Keyword::View)?;
        self.parse_if_not_exists()?;
        let name = self.parse_qualified_name()?;
        self.expect_keyword(Keyword::As)?;
        let query = self.collect_until_statement_end()?;
        if query.is_empty() {
            return Err(self.error("view query"));
        }

        Ok(CreateViewStatement {
            name,
            or_replace,
            query,
            source: self.source_from(start),
        })
    }

    // ================================================================
    // Column and constraint definitions
    // ================================================================

    fn is_table_constraint_start(&self, in_alter: bool) -> bool {
        match self.current.as_keyword() {
            Some(
                Keyword::Constraint
                | Keyword::Primary
                | Keyword::Unique
                | Keyword::Foreign
                | Keyword::Check,
            ) => true,
            Some(Keyword::Index) => in_alter || self.dialect.profile().inline_indexes,
            Some(Keyword::Key) => self.dialect.profile().inline_indexes,
            _ => false,
        }
    }

    fn parse_table_constraint(&mut self) -> Result<TableConstraintDef, ParseError> {
        let mut name = None;
        if self.check_keyword(Keyword::Constraint) {
            self.advance();
            if !self.is_table_constraint_start(true) {
                name = Some(self.expect_identifier()?);
            }
        }

        let kind = match self.current.as_keyword() {
            Some(Keyword::Primary) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                let columns = self.parse_indexed_columns()?;
                self.skip_conflict_clause()?;
                TableConstraint::PrimaryKey(columns)
            }
            Some(Keyword::Unique) => {
                self.advance();
                if self.check_keyword(Keyword::Key) || self.check_keyword(Keyword::Index) {
                    self.advance();
                }
                if !self.check(&TokenKind::LeftParen) {
                    let index_name = self.expect_identifier()?;
                    name = name.or(Some(index_name));
                }
                let columns = self.parse_indexed_columns()?;
                self.skip_conflict_clause()?;
                TableConstraint::Unique(columns)
            }
            Some(Keyword::Foreign) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                if !self.check(&TokenKind::LeftParen) {
                    let index_name = self.expect_identifier()?;
                    name = name.or(Some(index_name));
                }
                let columns = self.parse_identifier_list()?;
                let reference = self.parse_references()?;
                TableConstraint::ForeignKey { columns, reference }
            }
            Some(Keyword::Check) => {
                self.advance();
                TableConstraint::Check(self.parse_parenthesized_fragment()?)
            }
            Some(Keyword::Index | Keyword::Key) => {
                self.advance();
                if !self.check(&TokenKind::LeftParen) {
                    name = Some(self.expect_identifier()?);
                }
                let columns = self.parse_indexed_columns()?;
                self.skip_index_method();
                TableConstraint::Index(columns)
            }
            _ => return Err(self.error("table constraint")),
        };

        Ok(TableConstraintDef { name, kind })
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef, ParseError> {
        let name = self.expect_identifier()?;
        let data_type = if matches!(self.current.kind, TokenKind::Identifier(_)) {
            Some(self.parse_type_name()?)
        } else {
            None
        };

        let mut constraints = Vec::new();
        while let Some(constraint) = self.parse_column_constraint()? {
            constraints.push(constraint);
        }

        Ok(ColumnDef {
            name,
            data_type,
            constraints,
        })
    }

    /// Parses a type clause: words, optional `(args)`, more words, `[]`.
    fn parse_type_name(&mut self) -> Result<TypeName, ParseError> {
        let mut ty = TypeName::default();
        self.parse_type_words(&mut ty.words, true)?;

        if self.check(&TokenKind::LeftParen) {
            ty.args = self.parse_type_args()?;
            self.parse_type_words(&mut ty.suffix, false)?;
        }

        while self.check(&TokenKind::LeftBracket) {
            self.advance();
            if matches!(self.current.kind, TokenKind::Number(_)) {
                self.advance();
            }
            self.expect(&TokenKind::RightBracket)?;
            ty.array = true;
        }

        Ok(ty)
    }

    fn parse_type_words(&mut self, words: &mut Vec<String>, first: bool) -> Result<(), ParseError> {
        loop {
            match &self.current.kind {
                TokenKind::Identifier(word) => {
                    let word = word.to_ascii_lowercase();
                    self.advance();
                    if word == "charset" {
                        self.expect_identifier()?;
                    } else {
                        words.push(word);
                    }
                }
                TokenKind::Keyword(Keyword::With) if !(first && words.is_empty()) => {
                    self.advance();
                    words.push("with".to_string());
                }
                // MySQL `CHARACTER SET name` does not change the column type.
                TokenKind::Keyword(Keyword::Set)
                    if words.last().is_some_and(|w| w == "character") =>
                {
                    self.advance();
                    words.pop();
                    self.expect_identifier()?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// Parses `(a, b, ...)` after a type name, keeping each argument's text.
    fn parse_type_args(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect(&TokenKind::LeftParen)?;
        let mut args = Vec::new();
        let mut arg_start: Option<usize> = None;
        let mut depth = 0usize;
        loop {
            match &self.current.kind {
                TokenKind::RightParen if depth == 0 => {
                    self.push_arg(&mut args, arg_start.take());
                    self.advance();
                    return Ok(args);
                }
                TokenKind::Comma if depth == 0 => {
                    self.push_arg(&mut args, arg_start.take());
                    self.advance();
                }
                TokenKind::Eof | TokenKind::Error(_) => return Err(self.error("')'")),
                kind => {
                    if *kind == TokenKind::LeftParen {
                        depth += 1;
                    } else if *kind == TokenKind::RightParen {
                        depth -= 1;
                    }
                    arg_start.get_or_insert(self.current.span.start);
                    self.advance();
                }
            }
        }
    }

    fn push_arg(&self, args: &mut Vec<String>, start: Option<usize>) {
        if let Some(start) = start {
            args.push(self.input[start..self.previous.span.end].trim().to_string());
        }
    }

    fn parse_column_constraint(&mut self) -> Result<Option<ColumnConstraintDef>, ParseError> {
        let name = if self.check_keyword(Keyword::Constraint) {
            self.advance();
            Some(self.expect_identifier()?)
        } else {
            None
        };

        let kind = match self.current.as_keyword() {
            Some(Keyword::Primary) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                if self.check_keyword(Keyword::Asc) || self.check_keyword(Keyword::Desc) {
                    self.advance();
                }
                self.skip_conflict_clause()?;
                let autoincrement = self.check_keyword(Keyword::Autoincrement)
                    || self.check_keyword(Keyword::AutoIncrement);
                if autoincrement {
                    self.advance();
                }
                ColumnConstraint::PrimaryKey { autoincrement }
            }
            Some(Keyword::Not) => {
                self.advance();
                self.expect_keyword(Keyword::Null)?;
                self.skip_conflict_clause()?;
                ColumnConstraint::NotNull
            }
            Some(Keyword::Null) => {
                self.advance();
                ColumnConstraint::Null
            }
            Some(Keyword::Unique) => {
                self.advance();
                if self.check_keyword(Keyword::Key) {
                    self.advance();
                }
                self.skip_conflict_clause()?;
                ColumnConstraint::Unique
            }
            Some(Keyword::Check) => {
                self.advance();
                ColumnConstraint::Check(self.parse_parenthesized_fragment()?)
            }
            Some(Keyword::Default) => {
                self.advance();
                ColumnConstraint::Default(self.parse_default_fragment()?)
            }
            Some(Keyword::References) => ColumnConstraint::References(self.parse_references()?),
            Some(Keyword::Autoincrement | Keyword::AutoIncrement) => {
                self.advance();
                ColumnConstraint::Autoincrement
            }
            Some(Keyword::Collate) => {
                self.advance();
                ColumnConstraint::Collate(self.expect_identifier()?)
            }
            _ if name.is_some() => return Err(self.error("column constraint")),
            _ => return Ok(None),
        };

        Ok(Some(ColumnConstraintDef { name, kind }))
    }

    /// Skips SQLite `ON CONFLICT <resolution>`.
    fn skip_conflict_clause(&mut self) -> Result<(), ParseError> {
        if !self.check_keyword(Keyword::On) {
            return Ok(());
        }
        self.advance();
        match &self.current.kind {
            TokenKind::Identifier(word) if word.eq_ignore_ascii_case("conflict") => self.advance(),
            _ => return Err(self.error("CONFLICT")),
        }
        self.expect_identifier()?;
        Ok(())
    }

    fn parse_references(&mut self) -> Result<ForeignKeyRef, ParseError> {
        self.expect_keyword(Keyword::References)?;
        let table = self.parse_qualified_name()?;
        let columns = if self.check(&TokenKind::LeftParen) {
            self.parse_identifier_list()?
        } else {
            vec![]
        };

        let mut on_delete = None;
        let mut on_update = None;
        loop {
            if self.check_keyword(Keyword::On) {
                self.advance();
                if self.check_keyword(Keyword::Delete) {
                    self.advance();
                    on_delete = Some(self.parse_referential_action()?);
                } else {
                    self.expect_keyword(Keyword::Update)?;
                    on_update = Some(self.parse_referential_action()?);
                }
                continue;
            }
            // MATCH / DEFERRABLE / INITIALLY clauses do not change the model.
            let skip = match &self.current.kind {
                TokenKind::Identifier(word) => {
                    let word = word.to_ascii_lowercase();
                    matches!(
                        word.as_str(),
                        "match" | "deferrable" | "initially" | "deferred" | "immediate"
                            | "simple" | "partial"
                    )
                }
                TokenKind::Keyword(Keyword::Full) => true,
                _ => false,
            };
            if !skip {
                break;
            }
            self.advance();
        }

        Ok(ForeignKeyRef {
            table,
            columns,
            on_delete,
            on_update,
        })
    }

    fn parse_referential_action(&mut self) -> Result<ReferentialAction, ParseError> {
        let action = match self.current.as_keyword() {
            Some(Keyword::Cascade) => ReferentialAction::Cascade,
            Some(Keyword::Restrict) => ReferentialAction::Restrict,
            Some(Keyword::Set) => {
                self.advance();
                if self.check_keyword(Keyword::Null) {
                    ReferentialAction::SetNull
                } else if self.check_keyword(Keyword::Default) {
                    ReferentialAction::SetDefault
                } else {
                    return Err(self.error("NULL or DEFAULT"));
                }
            }
            Some(Keyword::No) => {
                self.advance();
                if !self.check_keyword(Keyword::Action) {
                    return Err(self.error("ACTION"));
                }
                ReferentialAction::NoAction
            }
            _ => return Err(self.error("referential action")),
        };
        self.advance();
        Ok(action)
    }

    /// Parses `(col [ASC|DESC], ...)`; MySQL prefix lengths are skipped.
    fn parse_indexed_columns(&mut self) -> Result<Vec<IndexedColumn>, ParseError> {
        self.expect(&TokenKind::LeftParen)?;
        let mut columns = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            if self.check(&TokenKind::LeftParen) {
                self.advance();
                if !matches!(self.current.kind, TokenKind::Number(_)) {
                    return Err(self.error("prefix length"));
                }
                self.advance();
                self.expect(&TokenKind::RightParen)?;
            }
            if self.check_keyword(Keyword::Collate) {
                self.advance();
                self.expect_identifier()?;
            }
            let descending = if self.check_keyword(Keyword::Desc) {
                self.advance();
                true
            } else {
                if self.check_keyword(Keyword::Asc) {
                    self.advance();
                }
                false
            };
            columns.push(IndexedColumn { name, descending });

            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                self.expect(&TokenKind::RightParen)?;
                return Ok(columns);
            }
        }
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<Ident>, ParseError> {
        self.expect(&TokenKind::LeftParen)?;
        let mut idents = vec![self.expect_identifier()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            idents.push(self.expect_identifier()?);
        }
        self.expect(&TokenKind::RightParen)?;
        Ok(idents)
    }

    // ================================================================
    // Fragments
    // ================================================================

    /// Collects `( ... )` and returns the tokens between the parentheses.
    fn parse_parenthesized_fragment(&mut self) -> Result<Fragment, ParseError> {
        let mut tokens = Vec::new();
        self.collect_group(&mut tokens)?;
        tokens.remove(0);
        tokens.pop();
        Ok(Fragment(tokens))
    }

    /// Pushes a balanced parenthesized group, parentheses included.
    fn collect_group(&mut self, tokens: &mut Vec<TokenKind>) -> Result<(), ParseError> {
        if !self.check(&TokenKind::LeftParen) {
            return Err(self.error("'('"));
        }
        let mut depth = 0usize;
        loop {
            match &self.current.kind {
                TokenKind::Eof | TokenKind::Error(_) => return Err(self.error("')'")),
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => depth -= 1,
                _ => {}
            }
            tokens.push(self.current.kind.clone());
            self.advance();
            if depth == 0 {
                return Ok(());
            }
        }
    }

    /// Parses a DEFAULT value: a literal, signed number, function call or
    /// parenthesized expression, optionally followed by `::type` casts.
    fn parse_default_fragment(&mut self) -> Result<Fragment, ParseError> {
        let mut tokens = Vec::new();

        if self.check(&TokenKind::LeftParen) {
            self.collect_group(&mut tokens)?;
        } else {
            if matches!(self.current.kind, TokenKind::Minus | TokenKind::Plus) {
                tokens.push(self.current.kind.clone());
                self.advance();
            }
            match &self.current.kind {
                TokenKind::Number(_)
                | TokenKind::String(_)
                | TokenKind::Blob(_)
                | TokenKind::QuotedIdentifier(_)
                | TokenKind::Keyword(Keyword::Null | Keyword::True | Keyword::False) => {
                    tokens.push(self.current.kind.clone());
                    self.advance();
                }
                TokenKind::Identifier(_) => {
                    tokens.push(self.current.kind.clone());
                    self.advance();
                    if self.check(&TokenKind::LeftParen) {
                        self.collect_group(&mut tokens)?;
                    }
                }
                _ => return Err(self.error("default value")),
            }
        }

        while self.check(&TokenKind::DoubleColon) {
            tokens.push(TokenKind::DoubleColon);
            self.advance();
            let mut words = Vec::new();
            self.parse_type_words(&mut words, true)?;
            if words.is_empty() {
                return Err(self.error("type name"));
            }
            tokens.extend(words.into_iter().map(TokenKind::Identifier));
            if self.check(&TokenKind::LeftParen) {
                self.collect_group(&mut tokens)?;
            }
        }

        Ok(Fragment(tokens))
    }

    /// Collects tokens up to the statement terminator, respecting parentheses.
    fn collect_until_statement_end(&mut self) -> Result<Fragment, ParseError> {
        let mut tokens = Vec::new();
        let mut depth = 0usize;
        loop {
            match &self.current.kind {
                TokenKind::Eof => break,
                TokenKind::Semicolon if depth == 0 => break,
                TokenKind::Error(_) => return Err(self.error("expression")),
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => {
                    if depth == 0 {
                        return Err(self.error("';'"));
                    }
                    depth -= 1;
                }
                _ => {}
            }
            tokens.push(self.current.kind.clone());
            self.advance();
        }
        Ok(Fragment(tokens))
    }

    // ================================================================
    // DROP / ALTER
    // ================================================================

    fn parse_drop(&mut self, first: &Token) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Drop)?;
        match self.current.as_keyword() {
            Some(Keyword::Table) => {
                self.advance();
                let stmt = self.parse_drop_object()?;
                Ok(Statement::DropTable(stmt))
            }
            Some(Keyword::View) => {
                self.advance();
                let stmt = self.parse_drop_object()?;
                Ok(Statement::DropView(stmt))
            }
            Some(Keyword::Index) => {
                self.advance();
                let if_exists = self.parse_if_exists()?;
                let name = self.parse_qualified_name()?;
                let table = if self.check_keyword(Keyword::On) {
                    self.advance();
                    Some(self.parse_qualified_name()?)
                } else {
                    None
                };
                self.skip_drop_behavior();
                Ok(Statement::DropIndex(DropIndexStatement {
                    name,
                    table,
                    if_exists,
                }))
            }
            _ => self.parse_unknown(first),
        }
    }

    fn parse_drop_object(&mut self) -> Result<DropStatement, ParseError> {
        let if_exists = self.parse_if_exists()?;
        let name = self.parse_qualified_name()?;
        self.skip_drop_behavior();
        Ok(DropStatement { name, if_exists })
    }

    fn skip_drop_behavior(&mut self) {
        if self.check_keyword(Keyword::Cascade) || self.check_keyword(Keyword::Restrict) {
            self.advance();
        }
    }

    fn parse_alter(&mut self, first: &Token) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Alter)?;
        if !self.check_keyword(Keyword::Table) {
            return self.parse_unknown(first);
        }
        self.advance();
        self.parse_if_exists()?;
        if self.check_keyword(Keyword::Only) {
            self.advance();
        }
        let name = self.parse_qualified_name()?;

        let mut actions = vec![self.parse_alter_action()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            actions.push(self.parse_alter_action()?);
        }

        Ok(Statement::AlterTable(AlterTableStatement { name, actions }))
    }

    fn parse_alter_action(&mut self) -> Result<AlterAction, ParseError> {
        match self.current.as_keyword() {
            Some(Keyword::Add) => {
                self.advance();
                if self.is_table_constraint_start(true) {
                    return Ok(AlterAction::AddConstraint(self.parse_table_constraint()?));
                }
                self.skip_keyword(Keyword::Column);
                self.parse_if_not_exists()?;
                let column = self.parse_column_def()?;
                let position = self.parse_column_position()?;
                Ok(AlterAction::AddColumn { column, position })
            }
            Some(Keyword::Drop) => {
                self.advance();
                self.parse_alter_drop()
            }
            Some(Keyword::Alter) => {
                self.advance();
                self.skip_keyword(Keyword::Column);
                let column = self.expect_identifier()?;
                let change = self.parse_alter_column_change()?;
                Ok(AlterAction::AlterColumn { column, change })
            }
            Some(Keyword::Modify) => {
                self.advance();
                self.skip_keyword(Keyword::Column);
                let column = self.parse_column_def()?;
                let position = self.parse_column_position()?;
                Ok(AlterAction::ModifyColumn { column, position })
            }
            Some(Keyword::Rename) => {
                self.advance();
                if self.check_keyword(Keyword::To) || self.check_keyword(Keyword::As) {
                    self.advance();
                    return Ok(AlterAction::RenameTable(self.parse_qualified_name()?));
                }
                self.skip_keyword(Keyword::Column);
                let from = self.expect_identifier()?;
                self.expect_keyword(Keyword::To)?;
                let to = self.expect_identifier()?;
                Ok(AlterAction::RenameColumn { from, to })
            }
            _ => Err(self.error("ADD, DROP, ALTER, MODIFY or RENAME")),
        }
    }

    fn parse_alter_drop(&mut self) -> Result<AlterAction, ParseError> {
        match self.current.as_keyword() {
            Some(Keyword::Constraint) => {
                self.advance();
                self.parse_if_exists()?;
                let name = self.expect_identifier()?;
                self.skip_drop_behavior();
                Ok(AlterAction::DropConstraint(name))
            }
            Some(Keyword::Index) => {
                self.advance();
                Ok(AlterAction::DropIndex(self.expect_identifier()?))
            }
            Some(Keyword::Key) if self.dialect.profile().inline_indexes => {
                self.advance();
                Ok(AlterAction::DropIndex(self.expect_identifier()?))
            }
            Some(Keyword::Primary) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                Ok(AlterAction::DropPrimaryKey)
            }
            Some(Keyword::Foreign) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                Ok(AlterAction::DropConstraint(self.expect_identifier()?))
            }
            Some(Keyword::Check) => {
                self.advance();
                Ok(AlterAction::DropConstraint(self.expect_identifier()?))
            }
            _ => {
                self.skip_keyword(Keyword::Column);
                self.parse_if_exists()?;
                let name = self.expect_identifier()?;
                self.skip_drop_behavior();
                Ok(AlterAction::DropColumn(name))
            }
        }
    }

    fn parse_alter_column_change(&mut self) -> Result<AlterColumnChange, ParseError> {
        match self.current.as_keyword() {
            Some(Keyword::Type) => {
                self.advance();
                Ok(AlterColumnChange::SetType(self.parse_type_name()?))
            }
            Some(Keyword::Set) => {
                self.advance();
                match self.current.as_keyword() {
                    Some(Keyword::Not) => {
                        self.advance();
                        self.expect_keyword(Keyword::Null)?;
                        Ok(AlterColumnChange::SetNotNull)
                    }
                    Some(Keyword::Default) => {
                        self.advance();
                        Ok(AlterColumnChange::SetDefault(self.parse_default_fragment()?))
                    }
                    Some(Keyword::Data) => {
                        self.advance();
                        self.expect_keyword(Keyword::Type)?;
                        Ok(AlterColumnChange::SetType(self.parse_type_name()?))
                    }
                    _ => Err(self.error("NOT NULL, DEFAULT or DATA TYPE")),
                }
            }
            Some(Keyword::Drop) => {
                self.advance();
                match self.current.as_keyword() {
                    Some(Keyword::Not) => {
                        self.advance();
                        self.expect_keyword(Keyword::Null)?;
                        Ok(AlterColumnChange::DropNotNull)
                    }
                    Some(Keyword::Default) => {
                        self.advance();
                        Ok(AlterColumnChange::DropDefault)
                    }
                    _ => Err(self.error("NOT NULL or DEFAULT")),
                }
            }
            _ => Err(self.error("TYPE, SET or DROP")),
        }
    }

    fn parse_column_position(&mut self) -> Result<Option<ColumnPosition>, ParseError> {
        if self.check_keyword(Keyword::First) {
            self.advance();
            return Ok(Some(ColumnPosition::First));
        }
        if self.check_keyword(Keyword::After) {
            self.advance();
            return Ok(Some(ColumnPosition::After(self.expect_identifier()?)));
        }
        Ok(None)
    }

    // ================================================================
    // Statements without a grammar
    // ================================================================

    /// Handles a statement this parser has no grammar for, per the dialect's
    /// policy. Passed-through statements are scanned up to their terminator,
    /// treating `BEGIN ... END` and `CASE ... END` as nested blocks so
    /// trigger bodies stay in one piece.
    fn parse_unknown(&mut self, first: &Token) -> Result<Statement, ParseError> {
        if self.dialect.profile().unknown_statements == UnknownStatementPolicy::Reject {
            return Err(ParseError::unexpected(
                "CREATE TABLE, CREATE INDEX, CREATE VIEW, DROP or ALTER TABLE",
                first.kind.clone(),
                first.span,
            ));
        }

        let mut depth = 0usize;
        loop {
            match &self.current.kind {
                TokenKind::Eof => break,
                TokenKind::Semicolon if depth == 0 => break,
                TokenKind::Error(_) => return Err(self.error("statement")),
                TokenKind::Keyword(Keyword::Begin | Keyword::Case)
                    if self.current.span.start != first.span.start =>
                {
                    depth += 1;
                }
                TokenKind::Keyword(Keyword::End) => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.advance();
        }

        let source = self.source_from(first.span.start);
        debug!(statement = %source, "passing through unrecognized statement");
        Ok(Statement::Opaque(source))
    }

    // ================================================================
    // Helpers
    // ================================================================

    fn parse_if_not_exists(&mut self) -> Result<bool, ParseError> {
        if self.check_keyword(Keyword::If) {
            self.advance();
            self.expect_keyword(Keyword::Not)?;
            self.expect_keyword(Keyword::Exists)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn parse_if_exists(&mut self) -> Result<bool, ParseError> {
        if self.check_keyword(Keyword::If) {
            self.advance();
            self.expect_keyword(Keyword::Exists)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn parse_qualified_name(&mut self) -> Result<QualifiedName, ParseError> {
        let first = self.expect_identifier()?;
        if self.check(&TokenKind::Dot) {
            self.advance();
            let name = self.expect_identifier()?;
            Ok(QualifiedName {
                schema: Some(first),
                name,
            })
        } else {
            Ok(QualifiedName {
                schema: None,
                name: first,
            })
        }
    }

    fn source_from(&self, start: usize) -> String {
        let end = self.previous.span.end.max(start);
        self.input[start..end].to_string()
    }

    fn at_statement_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Semicolon | TokenKind::Eof)
    }

    fn expect_statement_end(&mut self) -> Result<(), ParseError> {
        match self.current.kind {
            TokenKind::Semicolon => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(self.error("';'")),
        }
    }

    /// Builds an error for the current token, surfacing lexer errors as is.
    fn error(&self, expected: &str) -> ParseError {
        match &self.current.kind {
            TokenKind::Error(message) => ParseError::new(message.clone(), self.current.span),
            TokenKind::Eof => ParseError::unexpected_eof(expected, self.current.span),
            kind => ParseError::unexpected(expected, kind.clone(), self.current.span),
        }
    }

    fn advance(&mut self) {
        self.previous = core::mem::replace(&mut self.current, self.lexer.next_token());
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current.kind == kind
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(&self.current.kind, TokenKind::Keyword(kw) if *kw == keyword)
    }

    fn skip_keyword(&mut self, keyword: Keyword) {
        if self.check_keyword(keyword) {
            self.advance();
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            let expected = kind.symbol().map_or_else(|| format!("{kind:?}"), |s| format!("'{s}'"));
            Err(self.error(&expected))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), ParseError> {
        if self.check_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(keyword.as_str()))
        }
    }

    /// Accepts bare, quoted, and non-reserved keyword identifiers.
    fn expect_identifier(&mut self) -> Result<Ident, ParseError> {
        let ident = match &self.current.kind {
            TokenKind::Identifier(name) => Ident::new(name.clone()),
            TokenKind::QuotedIdentifier(name) => Ident::quoted(name.clone()),
            TokenKind::Keyword(kw) if kw.is_non_reserved() => {
                Ident::new(&self.input[self.current.span.start..self.current.span.end])
            }
            _ => return Err(self.error("identifier")),
        };
        self.advance();
        Ok(ident)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(dialect: Dialect, sql: &str) -> Vec<Statement> {
        Parser::new(sql, dialect).parse_statements().unwrap()
    }

    fn parse_one(sql: &str) -> Statement {
        let mut statements = parse(Dialect::Sqlite, sql);
        assert_eq!(statements.len(), 1);
        statements.remove(0)
    }

    fn parse_err(dialect: Dialect, sql: &str) -> ParseError {
        Parser::new(sql, dialect).parse_statements().unwrap_err()
    }

    #[test]
    fn test_empty_input() {
        assert!(parse(Dialect::Sqlite, "").is_empty());
        assert!(parse(Dialect::Sqlite, " ;; -- nothing\n").is_empty());
    }

    #[test]
    fn test_create_table_keeps_source() {
        let sql = "CREATE TABLE users (\n  id integer NOT NULL,\n  name text,\n  age integer\n);\n";
        let Statement::CreateTable(table) = parse_one(sql) else {
            panic!("expected CREATE TABLE");
        };
        assert_eq!(table.name.name, Ident::new("users"));
        assert_eq!(table.columns.len(), 3);
        assert_eq!(
            table.source,
            "CREATE TABLE users (\n  id integer NOT NULL,\n  name text,\n  age integer\n)"
        );
        assert_eq!(
            table.columns[0].constraints[0].kind,
            ColumnConstraint::NotNull
        );
        assert!(table.columns[1].constraints.is_empty());
    }

    #[test]
    fn test_quoted_table_names() {
        let Statement::CreateTable(double) = parse_one("CREATE TABLE \"test_table\" (id integer)")
        else {
            panic!("expected CREATE TABLE");
        };
        let Statement::CreateTable(backtick) = parse_one("CREATE TABLE `test_table` (id integer)")
        else {
            panic!("expected CREATE TABLE");
        };
        assert_eq!(double.name.name, Ident::quoted("test_table"));
        assert_eq!(backtick.name.name, Ident::quoted("test_table"));
    }

    #[test]
    fn test_column_types() {
        let Statement::CreateTable(table) = parse_one(
            "CREATE TABLE t (a varchar(255), b numeric(10, 2), c double precision, \
             d timestamp with time zone, e integer[], f)",
        ) else {
            panic!("expected CREATE TABLE");
        };
        let types: Vec<Option<TypeName>> =
            table.columns.iter().map(|c| c.data_type.clone()).collect();
        assert_eq!(
            types[0],
            Some(TypeName {
                words: vec!["varchar".into()],
                args: vec!["255".into()],
                ..TypeName::default()
            })
        );
        assert_eq!(types[1].as_ref().unwrap().args, vec!["10", "2"]);
        assert_eq!(
            types[2].as_ref().unwrap().words,
            vec!["double", "precision"]
        );
        assert_eq!(
            types[3].as_ref().unwrap().words,
            vec!["timestamp", "with", "time", "zone"]
        );
        assert!(types[4].as_ref().unwrap().array);
        assert_eq!(types[5], None);
    }

    #[test]
    fn test_column_constraints() {
        let Statement::CreateTable(table) = parse_one(
            "CREATE TABLE t (\
               id integer PRIMARY KEY AUTOINCREMENT, \
               email text CONSTRAINT email_key UNIQUE NOT NULL, \
               score integer DEFAULT -1 CHECK (score >= -1), \
               owner integer REFERENCES users (id) ON DELETE SET NULL, \
               name text COLLATE nocase DEFAULT ('x')\
             )",
        ) else {
            panic!("expected CREATE TABLE");
        };
        assert_eq!(
            table.columns[0].constraints[0].kind,
            ColumnConstraint::PrimaryKey {
                autoincrement: true
            }
        );
        assert_eq!(
            table.columns[1].constraints[0].name,
            Some(Ident::new("email_key"))
        );
        assert_eq!(
            table.columns[2].constraints[0].kind,
            ColumnConstraint::Default(Fragment(vec![
                TokenKind::Minus,
                TokenKind::Number("1".into())
            ]))
        );
        let ColumnConstraint::References(fk) = &table.columns[3].constraints[0].kind else {
            panic!("expected REFERENCES");
        };
        assert_eq!(fk.table.name, Ident::new("users"));
        assert_eq!(fk.on_delete, Some(ReferentialAction::SetNull));
        assert_eq!(
            table.columns[4].constraints[0].kind,
            ColumnConstraint::Collate(Ident::new("nocase"))
        );
    }

    #[test]
    fn test_table_constraints() {
        let Statement::CreateTable(table) = parse_one(
            "CREATE TABLE t (a integer, b integer, \
             PRIMARY KEY (a, b), \
             CONSTRAINT b_unique UNIQUE (b), \
             FOREIGN KEY (b) REFERENCES other (id) ON UPDATE CASCADE, \
             CHECK (a > 0))",
        ) else {
            panic!("expected CREATE TABLE");
        };
        assert_eq!(table.constraints.len(), 4);
        assert!(matches!(
            &table.constraints[0].kind,
            TableConstraint::PrimaryKey(cols) if cols.len() == 2
        ));
        assert_eq!(table.constraints[1].name, Some(Ident::new("b_unique")));
        assert!(matches!(
            &table.constraints[2].kind,
            TableConstraint::ForeignKey { reference, .. }
                if reference.on_update == Some(ReferentialAction::Cascade)
        ));
        assert!(matches!(&table.constraints[3].kind, TableConstraint::Check(_)));
    }

    #[test]
    fn test_mysql_inline_keys() {
        let statements = parse(
            Dialect::Mysql,
            "CREATE TABLE t (id int(11) unsigned NOT NULL AUTO_INCREMENT, name varchar(10), \
             PRIMARY KEY (id), UNIQUE KEY name_uq (name), KEY name_idx (name(5))) \
             ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;",
        );
        let Statement::CreateTable(table) = &statements[0] else {
            panic!("expected CREATE TABLE");
        };
        let id_type = table.columns[0].data_type.as_ref().unwrap();
        assert_eq!(id_type.words, vec!["int"]);
        assert_eq!(id_type.suffix, vec!["unsigned"]);
        assert_eq!(table.constraints[1].name, Some(Ident::new("name_uq")));
        assert!(matches!(&table.constraints[2].kind, TableConstraint::Index(_)));
        assert!(table.source.ends_with("DEFAULT CHARSET=utf8mb4"));
    }

    #[test]
    fn test_key_is_a_column_outside_mysql() {
        let Statement::CreateTable(table) = parse_one("CREATE TABLE kv (key text, value text)")
        else {
            panic!("expected CREATE TABLE");
        };
        assert_eq!(table.columns[0].name, Ident::new("key"));
    }

    #[test]
    fn test_create_index() {
        let Statement::CreateIndex(index) = parse_one(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_name ON users (name DESC, age) WHERE age > 0",
        ) else {
            panic!("expected CREATE INDEX");
        };
        assert!(index.unique);
        assert!(index.if_not_exists);
        assert_eq!(index.table.name, Ident::new("users"));
        assert!(index.columns[0].descending);
        assert!(!index.columns[1].descending);
        assert_eq!(index.predicate.as_ref().map(|p| p.0.len()), Some(3));
    }

    #[test]
    fn test_create_view() {
        let Statement::CreateView(view) =
            parse_one("CREATE VIEW `view_users` AS select id from users where age = 1;")
        else {
            panic!("expected CREATE VIEW");
        };
        assert_eq!(view.name.name, Ident::quoted("view_users"));
        assert_eq!(view.query.0.len(), 8);
        assert_eq!(
            view.source,
            "CREATE VIEW `view_users` AS select id from users where age = 1"
        );
    }

    #[test]
    fn test_drop_statements() {
        let statements = parse(
            Dialect::Mysql,
            "DROP TABLE IF EXISTS users; DROP VIEW v; DROP INDEX i ON users;",
        );
        assert!(matches!(&statements[0], Statement::DropTable(d) if d.if_exists));
        assert!(matches!(&statements[1], Statement::DropView(_)));
        assert!(matches!(&statements[2], Statement::DropIndex(d) if d.table.is_some()));
    }

    #[test]
    fn test_alter_table_actions() {
        let statements = parse(
            Dialect::Postgres,
            "ALTER TABLE users ADD COLUMN email text NOT NULL, \
             ALTER COLUMN age TYPE bigint, ALTER COLUMN age SET NOT NULL, \
             ALTER COLUMN name DROP DEFAULT, DROP COLUMN legacy, \
             DROP CONSTRAINT users_pkey, ADD CONSTRAINT users_pkey PRIMARY KEY (id), \
             RENAME COLUMN a TO b;",
        );
        let Statement::AlterTable(alter) = &statements[0] else {
            panic!("expected ALTER TABLE");
        };
        assert_eq!(alter.actions.len(), 8);
        assert!(matches!(&alter.actions[0], AlterAction::AddColumn { position: None, .. }));
        assert!(matches!(
            &alter.actions[1],
            AlterAction::AlterColumn {
                change: AlterColumnChange::SetType(_),
                ..
            }
        ));
        assert!(matches!(&alter.actions[4], AlterAction::DropColumn(c) if c.value == "legacy"));
        assert!(matches!(&alter.actions[6], AlterAction::AddConstraint(_)));
        assert!(matches!(&alter.actions[7], AlterAction::RenameColumn { .. }));
    }

    #[test]
    fn test_mysql_alter_positions() {
        let statements = parse(
            Dialect::Mysql,
            "ALTER TABLE t ADD COLUMN b int AFTER a; \
             ALTER TABLE t MODIFY COLUMN c text FIRST; \
             ALTER TABLE t DROP FOREIGN KEY t_fk, DROP PRIMARY KEY, DROP INDEX i;",
        );
        let Statement::AlterTable(add) = &statements[0] else {
            panic!("expected ALTER TABLE");
        };
        assert!(matches!(
            &add.actions[0],
            AlterAction::AddColumn {
                position: Some(ColumnPosition::After(a)),
                ..
            } if a.value == "a"
        ));
        let Statement::AlterTable(modify) = &statements[1] else {
            panic!("expected ALTER TABLE");
        };
        assert!(matches!(
            &modify.actions[0],
            AlterAction::ModifyColumn {
                position: Some(ColumnPosition::First),
                ..
            }
        ));
        let Statement::AlterTable(drops) = &statements[2] else {
            panic!("expected ALTER TABLE");
        };
        assert_eq!(
            drops.actions,
            vec![
                AlterAction::DropConstraint(Ident::new("t_fk")),
                AlterAction::DropPrimaryKey,
                AlterAction::DropIndex(Ident::new("i")),
            ]
        );
    }

    #[test]
    fn test_default_with_cast() {
        let Statement::CreateTable(table) = parse_one(
            "CREATE TABLE t (a text DEFAULT 'x'::character varying, b timestamp DEFAULT now())",
        ) else {
            panic!("expected CREATE TABLE");
        };
        let ColumnConstraint::Default(a) = &table.columns[0].constraints[0].kind else {
            panic!("expected DEFAULT");
        };
        assert_eq!(a.0.len(), 4);
        let ColumnConstraint::Default(b) = &table.columns[1].constraints[0].kind else {
            panic!("expected DEFAULT");
        };
        assert_eq!(b.0.len(), 3);
    }

    #[test]
    fn test_hash_is_postgres_operator_and_mysql_comment() {
        let statements = parse(
            Dialect::Postgres,
            "CREATE TABLE t (a integer, b integer, CHECK (a # b = 0));",
        );
        let Statement::CreateTable(table) = &statements[0] else {
            panic!("expected CREATE TABLE");
        };
        let TableConstraint::Check(check) = &table.constraints[0].kind else {
            panic!("expected CHECK");
        };
        assert!(check.0.contains(&TokenKind::BitXor));

        let statements = parse(
            Dialect::Mysql,
            "# users\nCREATE TABLE t (a int); # trailing\n",
        );
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_sqlite_passes_through_triggers() {
        let statements = parse(
            Dialect::Sqlite,
            "CREATE TABLE t (id integer);\n\
             CREATE TRIGGER t_ai AFTER INSERT ON t BEGIN\n  \
               UPDATE t SET id = CASE WHEN id > 0 THEN id ELSE 0 END;\n  \
               DELETE FROM t WHERE id < 0;\nEND;\n\
             CREATE TABLE u (id integer);",
        );
        assert_eq!(statements.len(), 3);
        let Statement::Opaque(trigger) = &statements[1] else {
            panic!("expected pass-through statement");
        };
        assert!(trigger.starts_with("CREATE TRIGGER t_ai"));
        assert!(trigger.ends_with("END"));
    }

    #[test]
    fn test_postgres_rejects_unknown_statements() {
        let err = parse_err(
            Dialect::Postgres,
            "CREATE TABLE t (id integer);\nINSERT INTO t VALUES (1);",
        );
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 1);
        assert_eq!(err.statement_start, 29);
        assert_eq!(err.found, Some(TokenKind::Keyword(Keyword::Insert)));
    }

    #[test]
    fn test_unterminated_quoted_identifier() {
        let err = parse_err(Dialect::Sqlite, "CREATE TABLE \"users (id integer);");
        assert_eq!(err.message, "Unterminated quoted identifier");
        assert_eq!((err.line, err.column), (1, 14));
    }

    #[test]
    fn test_error_position_inside_statement() {
        let err = parse_err(
            Dialect::Sqlite,
            "CREATE TABLE a (id integer);\nCREATE TABLE b (\n  id integer,\n  ,\n);",
        );
        assert_eq!((err.line, err.column), (4, 3));
        assert!(err.to_string().ends_with("at line 4, column 3"));
    }

    #[test]
    fn test_missing_terminator() {
        let err = parse_err(Dialect::Sqlite, "DROP TABLE a b;");
        assert_eq!(err.expected.as_deref(), Some("';'"));
    }
}
