//! Token types for the DDL lexer.

use super::Span;

/// SQL keywords recognised by the lexer.
///
/// Only words that steer the DDL grammar are listed; everything else is an
/// [`TokenKind::Identifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Queries
    Select,
    From,
    Where,
    Order,
    By,
    Group,
    Having,
    Limit,
    Offset,
    Distinct,
    All,
    Join,
    Inner,
    Left,
    Right,
    Full,
    Outer,
    Cross,
    On,
    Using,
    Union,
    Intersect,
    Except,
    With,

    // Data manipulation
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,

    // Data definition
    Create,
    Drop,
    Alter,
    Table,
    Index,
    View,
    Trigger,
    Schema,
    Temporary,
    Temp,
    If,
    Exists,
    Or,
    Replace,
    Add,
    Column,
    Modify,
    Rename,
    To,
    After,
    First,
    Type,
    Data,
    Only,

    // Constraints
    Primary,
    Key,
    Foreign,
    References,
    Unique,
    Check,
    Default,
    Constraint,
    Cascade,
    Restrict,
    No,
    Action,
    Autoincrement,
    /// MySQL `AUTO_INCREMENT`.
    AutoIncrement,
    Collate,

    // Operators and literals
    And,
    Not,
    In,
    Between,
    Like,
    Is,
    Null,
    True,
    False,
    Asc,
    Desc,

    // Expressions and blocks
    As,
    Case,
    When,
    Then,
    Else,
    End,
    Cast,
    Begin,
}

impl Keyword {
    /// Attempts to parse a keyword from a string (case-insensitive).
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SELECT" => Some(Self::Select),
            "FROM" => Some(Self::From),
            "WHERE" => Some(Self::Where),
            "ORDER" => Some(Self::Order),
            "BY" => Some(Self::By),
            "GROUP" => Some(Self::Group),
            "HAVING" => Some(Self::Having),
            "LIMIT" => Some(Self::Limit),
            "OFFSET" => Some(Self::Offset),
            "DISTINCT" => Some(Self::Distinct),
            "ALL" => Some(Self::All),
            "JOIN" => Some(Self::Join),
            "INNER" => Some(Self::Inner),
            "LEFT" => Some(Self::Left),
            "RIGHT" => Some(Self::Right),
            "FULL" => Some(Self::Full),
            "OUTER" => Some(Self::Outer),
            "CROSS" => Some(Self::Cross),
            "ON" => Some(Self::On),
            "USING" => Some(Self::Using),
            "UNION" => Some(Self::Union),
            "INTERSECT" => Some(Self::Intersect),
            "EXCEPT" => Some(Self::Except),
            "WITH" => Some(Self::With),
            "INSERT" => Some(Self::Insert),
            "INTO" => Some(Self::Into),
            "VALUES" => Some(Self::Values),
            "UPDATE" => Some(Self::Update),
            "SET" => Some(Self::Set),
            "DELETE" => Some(Self::Delete),
            "CREATE" => Some(Self::Create),
            "DROP" => Some(Self::Drop),
            "ALTER" => Some(Self::Alter),
            "TABLE" => Some(Self::Table),
            "INDEX" => Some(Self::Index),
            "VIEW" => Some(Self::View),
            "TRIGGER" => Some(Self::Trigger),
            "SCHEMA" => Some(Self::Schema),
            "TEMPORARY" => Some(Self::Temporary),
            "TEMP" => Some(Self::Temp),
            "IF" => Some(Self::If),
            "EXISTS" => Some(Self::Exists),
            "OR" => Some(Self::Or),
            "REPLACE" => Some(Self::Replace),
            "ADD" => Some(Self::Add),
            "COLUMN" => Some(Self::Column),
            "MODIFY" => Some(Self::Modify),
            "RENAME" => Some(Self::Rename),
            "TO" => Some(Self::To),
            "AFTER" => Some(Self::After),
            "FIRST" => Some(Self::First),
            "TYPE" => Some(Self::Type),
            "DATA" => Some(Self::Data),
            "ONLY" => Some(Self::Only),
            "PRIMARY" => Some(Self::Primary),
            "KEY" => Some(Self::Key),
            "FOREIGN" => Some(Self::Foreign),
            "REFERENCES" => Some(Self::References),
            "UNIQUE" => Some(Self::Unique),
            "CHECK" => Some(Self::Check),
            "DEFAULT" => Some(Self::Default),
            "CONSTRAINT" => Some(Self::Constraint),
            "CASCADE" => Some(Self::Cascade),
            "RESTRICT" => Some(Self::Restrict),
            "NO" => Some(Self::No),
            "ACTION" => Some(Self::Action),
            "AUTOINCREMENT" => Some(Self::Autoincrement),
            "AUTO_INCREMENT" => Some(Self::AutoIncrement),
            "COLLATE" => Some(Self::Collate),
            "AND" => Some(Self::And),
            "NOT" => Some(Self::Not),
            "IN" => Some(Self::In),
            "BETWEEN" => Some(Self::Between),
            "LIKE" => Some(Self::Like),
            "IS" => Some(Self::Is),
            "NULL" => Some(Self::Null),
            "TRUE" => Some(Self::True),
            "FALSE" => Some(Self::False),
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            "AS" => Some(Self::As),
            "CASE" => Some(Self::Case),
            "WHEN" => Some(Self::When),
            "THEN" => Some(Self::Then),
            "ELSE" => Some(Self::Else),
            "END" => Some(Self::End),
            "CAST" => Some(Self::Cast),
            "BEGIN" => Some(Self::Begin),
            _ => None,
        }
    }

    /// Returns the keyword as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::From => "FROM",
            Self::Where => "WHERE",
            Self::Order => "ORDER",
            Self::By => "BY",
            Self::Group => "GROUP",
            Self::Having => "HAVING",
            Self::Limit => "LIMIT",
            Self::Offset => "OFFSET",
            Self::Distinct => "DISTINCT",
            Self::All => "ALL",
            Self::Join => "JOIN",
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Full => "FULL",
            Self::Outer => "OUTER",
            Self::Cross => "CROSS",
            Self::On => "ON",
            Self::Using => "USING",
            Self::Union => "UNION",
            Self::Intersect => "INTERSECT",
            Self::Except => "EXCEPT",
            Self::With => "WITH",
            Self::Insert => "INSERT",
            Self::Into => "INTO",
            Self::Values => "VALUES",
            Self::Update => "UPDATE",
            Self::Set => "SET",
            Self::Delete => "DELETE",
            Self::Create => "CREATE",
            Self::Drop => "DROP",
            Self::Alter => "ALTER",
            Self::Table => "TABLE",
            Self::Index => "INDEX",
            Self::View => "VIEW",
            Self::Trigger => "TRIGGER",
            Self::Schema => "SCHEMA",
            Self::Temporary => "TEMPORARY",
            Self::Temp => "TEMP",
            Self::If => "IF",
            Self::Exists => "EXISTS",
            Self::Or => "OR",
            Self::Replace => "REPLACE",
            Self::Add => "ADD",
            Self::Column => "COLUMN",
            Self::Modify => "MODIFY",
            Self::Rename => "RENAME",
            Self::To => "TO",
            Self::After => "AFTER",
            Self::First => "FIRST",
            Self::Type => "TYPE",
            Self::Data => "DATA",
            Self::Only => "ONLY",
            Self::Primary => "PRIMARY",
            Self::Key => "KEY",
            Self::Foreign => "FOREIGN",
            Self::References => "REFERENCES",
            Self::Unique => "UNIQUE",
            Self::Check => "CHECK",
            Self::Default => "DEFAULT",
            Self::Constraint => "CONSTRAINT",
            Self::Cascade => "CASCADE",
            Self::Restrict => "RESTRICT",
            Self::No => "NO",
            Self::Action => "ACTION",
            Self::Autoincrement => "AUTOINCREMENT",
            Self::AutoIncrement => "AUTO_INCREMENT",
            Self::Collate => "COLLATE",
            Self::And => "AND",
            Self::Not => "NOT",
            Self::In => "IN",
            Self::Between => "BETWEEN",
            Self::Like => "LIKE",
            Self::Is => "IS",
            Self::Null => "NULL",
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Asc => "ASC",
            Self::Desc => "DESC",
            Self::As => "AS",
            Self::Case => "CASE",
            Self::When => "WHEN",
            Self::Then => "THEN",
            Self::Else => "ELSE",
            Self::End => "END",
            Self::Cast => "CAST",
            Self::Begin => "BEGIN",
        }
    }

    /// Returns true if the keyword may also be used as a plain identifier,
    /// e.g. a column called `key` or `type`.
    #[must_use]
    pub const fn is_non_reserved(&self) -> bool {
        matches!(
            self,
            Self::Key
                | Self::Action
                | Self::No
                | Self::First
                | Self::After
                | Self::Column
                | Self::Data
                | Self::Type
                | Self::Temp
                | Self::Temporary
                | Self::Replace
                | Self::Rename
                | Self::To
                | Self::Modify
                | Self::Add
                | Self::Only
                | Self::Restrict
                | Self::Cascade
                | Self::Begin
                | Self::Trigger
                | Self::Schema
                | Self::View
                | Self::Full
                | Self::Left
                | Self::Right
                | Self::Offset
                | Self::Cast
                | Self::If
                | Self::Values
                | Self::Set
        )
    }
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    /// Numeric literal, kept as written (e.g. `42`, `3.14`, `1e10`).
    Number(String),
    /// String literal with quotes removed and escapes resolved.
    String(String),
    /// Blob literal hex digits (e.g. `X'CAFE'` holds `CAFE`).
    Blob(String),

    // Identifiers and keywords
    /// Bare identifier, as written.
    Identifier(String),
    /// Identifier written in double quotes or backticks, unescaped.
    QuotedIdentifier(String),
    /// SQL keyword.
    Keyword(Keyword),

    // Operators
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// =
    Eq,
    /// != or <>
    NotEq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,
    /// ||
    Concat,
    /// &
    BitAnd,
    /// |
    BitOr,
    /// ~
    BitNot,
    /// #, exclusive or in PostgreSQL
    BitXor,
    /// <<
    LeftShift,
    /// >>
    RightShift,

    // Delimiters
    /// (
    LeftParen,
    /// )
    RightParen,
    /// [
    LeftBracket,
    /// ]
    RightBracket,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,
    /// :
    Colon,
    /// ::
    DoubleColon,
    /// ?
    Question,
    /// @
    At,

    // Special
    /// End of input
    Eof,
    /// Invalid input, with a description of the problem.
    Error(String),
}

impl TokenKind {
    /// Returns the operator or delimiter spelling, if this kind has a fixed one.
    #[must_use]
    pub const fn symbol(&self) -> Option<&'static str> {
        let s = match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Concat => "||",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitNot => "~",
            Self::BitXor => "#",
            Self::LeftShift => "<<",
            Self::RightShift => ">>",
            Self::LeftParen => "(",
            Self::RightParen => ")",
            Self::LeftBracket => "[",
            Self::RightBracket => "]",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Dot => ".",
            Self::Colon => ":",
            Self::DoubleColon => "::",
            Self::Question => "?",
            Self::At => "@",
            _ => return None,
        };
        Some(s)
    }
}

/// A token with its span in the source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The location in the source code.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is an EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns the keyword if this is a keyword token.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }
}
