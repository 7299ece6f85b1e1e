//! Identifier, type and expression normalization.
//!
//! Every function here is pure: the same input always produces the same
//! canonical output, so two spellings of one schema compare equal once they
//! have been through the normalizer.

use crate::ast::{DataType, Fragment, Ident, QualifiedName, TypeName};
use crate::dialect::{CaseFolding, Dialect};
use crate::lexer::{Keyword, TokenKind};

/// Folds an identifier according to the dialect's case rules.
#[must_use]
pub fn identifier(dialect: Dialect, ident: &Ident) -> String {
    match dialect.profile().case_folding {
        CaseFolding::LowerAll => ident.value.to_lowercase(),
        CaseFolding::LowerUnquoted if !ident.quoted => ident.value.to_lowercase(),
        CaseFolding::LowerUnquoted | CaseFolding::Preserve => ident.value.clone(),
    }
}

/// Canonical object name. The dialect's default schema is dropped, any other
/// schema is kept as a `schema.` prefix.
#[must_use]
pub fn qualified_name(dialect: Dialect, name: &QualifiedName) -> String {
    let object = identifier(dialect, &name.name);
    match &name.schema {
        Some(schema) => {
            let schema = identifier(dialect, schema);
            if dialect.profile().default_schema == Some(schema.as_str()) {
                object
            } else {
                format!("{schema}.{object}")
            }
        }
        None => object,
    }
}

/// A normalized column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedType {
    /// Canonical type.
    pub data_type: DataType,
    /// The spelling was a serial pseudo-type, so the column autoincrements.
    pub serial: bool,
}

/// Maps a written type clause to its canonical descriptor.
#[must_use]
pub fn data_type(dialect: Dialect, ty: &TypeName) -> NormalizedType {
    let (base, serial) = dialect.resolve_type_name(&ty.words.join(" "));

    let integer = matches!(
        base.as_str(),
        "tinyint" | "smallint" | "mediumint" | "integer" | "bigint"
    );
    let args: &[String] = if integer && dialect.profile().ignore_integer_width {
        &[]
    } else {
        &ty.args
    };

    let known = if ty.suffix.is_empty() && !ty.array {
        known_type(&base, args)
    } else {
        None
    };

    let data_type = known.unwrap_or_else(|| {
        let mut text = base.clone();
        if !args.is_empty() {
            text.push('(');
            text.push_str(&args.join(","));
            text.push(')');
        }
        for word in &ty.suffix {
            text.push(' ');
            text.push_str(word);
        }
        if ty.array {
            text.push_str("[]");
        }
        DataType::Custom(text)
    });

    NormalizedType { data_type, serial }
}

fn known_type(base: &str, args: &[String]) -> Option<DataType> {
    let numbers: Vec<u32> = args
        .iter()
        .map(|arg| arg.parse().ok())
        .collect::<Option<_>>()?;
    let precision = |n: u32| u16::try_from(n).ok();

    let data_type = match (base, numbers.as_slice()) {
        ("smallint", []) => DataType::Smallint,
        ("integer", []) => DataType::Integer,
        ("bigint", []) => DataType::Bigint,
        ("real", []) => DataType::Real,
        ("double precision", []) => DataType::Double,
        ("numeric", []) => DataType::Numeric {
            precision: None,
            scale: None,
        },
        ("numeric", [p]) => DataType::Numeric {
            precision: Some(precision(*p)?),
            scale: None,
        },
        ("numeric", [p, s]) => DataType::Numeric {
            precision: Some(precision(*p)?),
            scale: Some(precision(*s)?),
        },
        ("char", []) => DataType::Char(None),
        ("char", [n]) => DataType::Char(Some(*n)),
        ("varchar", []) => DataType::Varchar(None),
        ("varchar", [n]) => DataType::Varchar(Some(*n)),
        ("text", []) => DataType::Text,
        ("blob", []) => DataType::Blob,
        ("date", []) => DataType::Date,
        ("time", []) => DataType::Time,
        ("timestamp", []) => DataType::Timestamp {
            with_time_zone: false,
        },
        ("timestamp with time zone", []) => DataType::Timestamp {
            with_time_zone: true,
        },
        ("datetime", []) => DataType::Datetime,
        ("boolean", []) => DataType::Boolean,
        _ => return None,
    };
    Some(data_type)
}

/// Renders a token fragment with canonical spacing, upper-case keywords and
/// minimally quoted identifiers.
#[must_use]
pub fn fragment(dialect: Dialect, fragment: &Fragment) -> String {
    render_tokens(dialect, &fragment.0)
}

/// Normalizes an expression: redundant outer parentheses and `::type` casts
/// are removed before rendering.
#[must_use]
pub fn expression(dialect: Dialect, fragment: &Fragment) -> String {
    let tokens = strip_casts(&fragment.0);
    render_tokens(dialect, unwrap_parens(&tokens))
}

/// A normalized column default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDefault {
    /// Canonical default expression; `None` when it is `NULL`.
    pub expression: Option<String>,
    /// The default draws from a sequence (`nextval(...)`).
    pub autoincrement: bool,
}

/// Normalizes a DEFAULT clause.
#[must_use]
pub fn default_value(dialect: Dialect, fragment: &Fragment) -> NormalizedDefault {
    let tokens = strip_casts(&fragment.0);
    let tokens = unwrap_parens(&tokens);

    match tokens {
        [] | [TokenKind::Keyword(Keyword::Null)] => NormalizedDefault {
            expression: None,
            autoincrement: false,
        },
        [TokenKind::Identifier(function), TokenKind::LeftParen, ..]
            if function.eq_ignore_ascii_case("nextval") =>
        {
            NormalizedDefault {
                expression: None,
                autoincrement: true,
            }
        }
        _ => NormalizedDefault {
            expression: Some(render_tokens(dialect, tokens)),
            autoincrement: false,
        },
    }
}

/// Returns true if `tokens` is a single parenthesized group.
fn is_wrapped(tokens: &[TokenKind]) -> bool {
    if tokens.len() < 2
        || tokens[0] != TokenKind::LeftParen
        || tokens[tokens.len() - 1] != TokenKind::RightParen
    {
        return false;
    }
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            TokenKind::LeftParen => depth += 1,
            TokenKind::RightParen => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i != tokens.len() - 1 {
                    return false;
                }
            }
            _ => {}
        }
    }
    true
}

fn unwrap_parens(mut tokens: &[TokenKind]) -> &[TokenKind] {
    while is_wrapped(tokens) {
        tokens = &tokens[1..tokens.len() - 1];
    }
    tokens
}

/// Multi-word type names a cast may spell out.
const CAST_TYPE_PHRASES: &[&[&str]] = &[
    &["character", "varying"],
    &["double", "precision"],
    &["bit", "varying"],
    &["timestamp", "with", "time", "zone"],
    &["timestamp", "without", "time", "zone"],
    &["time", "with", "time", "zone"],
    &["time", "without", "time", "zone"],
];

/// Drops `::type` casts, including type arguments and array brackets.
fn strip_casts(tokens: &[TokenKind]) -> Vec<TokenKind> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i] == TokenKind::DoubleColon {
            i = cast_end(tokens, i + 1);
        } else {
            out.push(tokens[i].clone());
            i += 1;
        }
    }
    out
}

/// Index just past the type name of a cast starting at `start`.
fn cast_end(tokens: &[TokenKind], start: usize) -> usize {
    let is_name = |t: Option<&TokenKind>| {
        matches!(t, Some(TokenKind::Identifier(_) | TokenKind::QuotedIdentifier(_)))
    };
    if !is_name(tokens.get(start)) {
        return start;
    }
    let mut i = start + 1;
    while tokens.get(i) == Some(&TokenKind::Dot) && is_name(tokens.get(i + 1)) {
        i += 2;
    }

    let mut words: Vec<String> = tokens[i - 1..i].iter().filter_map(type_word).collect();
    loop {
        if tokens.get(i) == Some(&TokenKind::LeftParen) {
            i = group_end(tokens, i);
            continue;
        }
        let next = tokens.get(i).and_then(type_word);
        if let (false, Some(word)) = (words.is_empty(), next) {
            words.push(word);
            if is_type_phrase_prefix(&words) {
                i += 1;
                continue;
            }
            words.pop();
        }
        break;
    }

    while tokens.get(i) == Some(&TokenKind::LeftBracket)
        && tokens.get(i + 1) == Some(&TokenKind::RightBracket)
    {
        i += 2;
    }
    i
}

fn type_word(token: &TokenKind) -> Option<String> {
    match token {
        TokenKind::Identifier(word) => Some(word.to_ascii_lowercase()),
        TokenKind::Keyword(Keyword::With) => Some("with".to_string()),
        _ => None,
    }
}

fn is_type_phrase_prefix(words: &[String]) -> bool {
    CAST_TYPE_PHRASES.iter().any(|phrase| {
        phrase.len() >= words.len() && phrase.iter().zip(words).all(|(a, b)| *a == b)
    })
}

/// Index just past the parenthesized group opening at `open`.
fn group_end(tokens: &[TokenKind], open: usize) -> usize {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token {
            TokenKind::LeftParen => depth += 1,
            TokenKind::RightParen => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
    }
    tokens.len()
}

fn render_tokens(dialect: Dialect, tokens: &[TokenKind]) -> String {
    let mut out = String::new();
    let mut previous: Option<&TokenKind> = None;
    let mut glue_next = false;

    for token in tokens {
        if let Some(prev) = previous {
            if !glue_next && needs_space(prev, token) {
                out.push(' ');
            }
        }
        // A minus that does not follow an operand is a sign.
        glue_next = *token == TokenKind::Minus && !previous.is_some_and(ends_operand);
        out.push_str(&render_token(dialect, token));
        previous = Some(token);
    }
    out
}

fn ends_operand(token: &TokenKind) -> bool {
    matches!(
        token,
        TokenKind::Number(_)
            | TokenKind::String(_)
            | TokenKind::Blob(_)
            | TokenKind::Identifier(_)
            | TokenKind::QuotedIdentifier(_)
            | TokenKind::RightParen
            | TokenKind::RightBracket
            | TokenKind::Keyword(Keyword::Null | Keyword::True | Keyword::False | Keyword::End)
    )
}

fn needs_space(previous: &TokenKind, current: &TokenKind) -> bool {
    if matches!(
        current,
        TokenKind::Comma
            | TokenKind::RightParen
            | TokenKind::Dot
            | TokenKind::DoubleColon
            | TokenKind::LeftBracket
            | TokenKind::RightBracket
    ) {
        return false;
    }
    if matches!(
        previous,
        TokenKind::LeftParen | TokenKind::Dot | TokenKind::DoubleColon | TokenKind::LeftBracket
    ) {
        return false;
    }
    // Function call.
    !(*current == TokenKind::LeftParen
        && matches!(
            previous,
            TokenKind::Identifier(_) | TokenKind::QuotedIdentifier(_)
        ))
}

fn render_token(dialect: Dialect, token: &TokenKind) -> String {
    match token {
        TokenKind::Number(n) => n.to_ascii_lowercase(),
        TokenKind::String(s) => format!("'{}'", s.replace('\'', "''")),
        TokenKind::Blob(hex) => format!("X'{hex}'"),
        TokenKind::Identifier(name) => render_identifier(dialect, &Ident::new(name.clone())),
        TokenKind::QuotedIdentifier(name) => {
            render_identifier(dialect, &Ident::quoted(name.clone()))
        }
        TokenKind::Keyword(kw) => kw.as_str().to_string(),
        TokenKind::Eof | TokenKind::Error(_) => String::new(),
        other => other.symbol().unwrap_or_default().to_string(),
    }
}

/// Renders a folded identifier, quoting it only when a bare spelling would
/// not read back as the same name.
fn render_identifier(dialect: Dialect, ident: &Ident) -> String {
    let name = identifier(dialect, ident);
    if needs_quotes(dialect, &name) {
        dialect.quote_identifier(&name)
    } else {
        name
    }
}

/// Returns true if `name` must be quoted to survive re-parsing unchanged.
#[must_use]
pub fn needs_quotes(dialect: Dialect, name: &str) -> bool {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    let folds = dialect.profile().case_folding == CaseFolding::LowerUnquoted
        && name.chars().any(|c| c.is_ascii_uppercase());
    !valid_start || !valid_rest || folds || Keyword::from_str(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn fragment_of(sql: &str) -> Fragment {
        let mut tokens: Vec<TokenKind> = Lexer::new(sql)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect();
        tokens.pop();
        Fragment(tokens)
    }

    fn type_of(words: &[&str], args: &[&str]) -> TypeName {
        TypeName {
            words: words.iter().map(|w| (*w).to_string()).collect(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
            ..TypeName::default()
        }
    }

    #[test]
    fn test_identifier_folding() {
        let bare = Ident::new("Users");
        let quoted = Ident::quoted("Users");
        assert_eq!(identifier(Dialect::Sqlite, &bare), "users");
        assert_eq!(identifier(Dialect::Sqlite, &quoted), "users");
        assert_eq!(identifier(Dialect::Postgres, &bare), "users");
        assert_eq!(identifier(Dialect::Postgres, &quoted), "Users");
        assert_eq!(identifier(Dialect::Mysql, &bare), "Users");
    }

    #[test]
    fn test_default_schema_is_dropped() {
        let name = QualifiedName {
            schema: Some(Ident::new("public")),
            name: Ident::new("users"),
        };
        assert_eq!(qualified_name(Dialect::Postgres, &name), "users");
        let other = QualifiedName {
            schema: Some(Ident::new("audit")),
            name: Ident::new("events"),
        };
        assert_eq!(qualified_name(Dialect::Postgres, &other), "audit.events");
    }

    #[test]
    fn test_type_synonyms() {
        let int = data_type(Dialect::Sqlite, &type_of(&["int"], &[]));
        let integer = data_type(Dialect::Sqlite, &type_of(&["integer"], &[]));
        assert_eq!(int, integer);
        assert_eq!(int.data_type, DataType::Integer);

        assert_eq!(
            data_type(Dialect::Postgres, &type_of(&["character", "varying"], &["255"])).data_type,
            DataType::Varchar(Some(255))
        );
        assert_eq!(
            data_type(Dialect::Postgres, &type_of(&["timestamptz"], &[])).data_type,
            DataType::Timestamp {
                with_time_zone: true
            }
        );
        assert_eq!(
            data_type(Dialect::Postgres, &type_of(&["decimal"], &["10", "2"])).data_type,
            DataType::Numeric {
                precision: Some(10),
                scale: Some(2)
            }
        );
    }

    #[test]
    fn test_varchar_length_is_significant() {
        assert_ne!(
            data_type(Dialect::Sqlite, &type_of(&["varchar"], &["255"])),
            data_type(Dialect::Sqlite, &type_of(&["varchar"], &["100"]))
        );
    }

    #[test]
    fn test_serial_implies_autoincrement() {
        let serial = data_type(Dialect::Postgres, &type_of(&["bigserial"], &[]));
        assert_eq!(serial.data_type, DataType::Bigint);
        assert!(serial.serial);
    }

    #[test]
    fn test_mysql_integer_width_ignored() {
        assert_eq!(
            data_type(Dialect::Mysql, &type_of(&["int"], &["11"])).data_type,
            DataType::Integer
        );
        assert_eq!(
            data_type(Dialect::Mysql, &type_of(&["tinyint"], &["1"])).data_type,
            data_type(Dialect::Mysql, &type_of(&["boolean"], &[])).data_type
        );
        let unsigned = TypeName {
            suffix: vec!["unsigned".into()],
            ..type_of(&["int"], &["10"])
        };
        assert_eq!(
            data_type(Dialect::Mysql, &unsigned).data_type,
            DataType::Custom("integer unsigned".into())
        );
    }

    #[test]
    fn test_custom_types() {
        let array = TypeName {
            array: true,
            ..type_of(&["text"], &[])
        };
        assert_eq!(
            data_type(Dialect::Postgres, &array).data_type,
            DataType::Custom("text[]".into())
        );
        assert_eq!(
            data_type(Dialect::Postgres, &type_of(&["jsonb"], &[])).data_type,
            DataType::Custom("jsonb".into())
        );
    }

    #[test]
    fn test_fragment_spacing_and_case() {
        let a = fragment_of("select  id,name FROM Users where ( age>=-1 )");
        let b = fragment_of("SELECT id , name\n  from users WHERE (age >= - 1)");
        assert_eq!(fragment(Dialect::Sqlite, &a), fragment(Dialect::Sqlite, &b));
        assert_eq!(
            fragment(Dialect::Sqlite, &a),
            "SELECT id, name FROM users WHERE (age >= -1)"
        );
    }

    #[test]
    fn test_fragment_quoting_is_minimal() {
        let quoted = fragment_of("select `id` from `users`");
        assert_eq!(fragment(Dialect::Sqlite, &quoted), "SELECT id FROM users");
        let keyword = fragment_of("select \"order\" from t");
        assert_eq!(fragment(Dialect::Postgres, &keyword), "SELECT \"order\" FROM t");
        let upper = fragment_of("select \"Name\" from t");
        assert_eq!(fragment(Dialect::Postgres, &upper), "SELECT \"Name\" FROM t");
    }

    #[test]
    fn test_function_calls_and_strings() {
        let f = fragment_of("lower( name ) = 'it''s'");
        assert_eq!(fragment(Dialect::Sqlite, &f), "lower(name) = 'it''s'");
    }

    #[test]
    fn test_default_values() {
        let plain = default_value(Dialect::Postgres, &fragment_of("('x'::character varying)"));
        assert_eq!(plain.expression.as_deref(), Some("'x'"));

        let null = default_value(Dialect::Sqlite, &fragment_of("NULL"));
        assert_eq!(null.expression, None);

        let sequence = default_value(
            Dialect::Postgres,
            &fragment_of("nextval('users_id_seq'::regclass)"),
        );
        assert!(sequence.autoincrement);
        assert_eq!(sequence.expression, None);

        let negative = default_value(Dialect::Sqlite, &fragment_of("(-1)"));
        assert_eq!(negative.expression.as_deref(), Some("-1"));
    }

    #[test]
    fn test_casts_end_at_the_type_name() {
        let cases = [
            ("x::int foo", "x foo"),
            ("'a'::character varying = b", "'a' = b"),
            ("now()::timestamp with time zone", "now()"),
            ("x::numeric(10,2) + 1", "x + 1"),
            ("tags::text[] = y", "tags = y"),
            ("x::pg_catalog.int4 > 0", "x > 0"),
            ("created::timestamp without time zone < now()", "created < now()"),
        ];
        for (input, normalized) in cases {
            assert_eq!(
                expression(Dialect::Postgres, &fragment_of(input)),
                normalized,
                "{input}"
            );
        }
    }

    #[test]
    fn test_expression_unwraps_parens() {
        assert_eq!(
            expression(Dialect::Postgres, &fragment_of("((age > 0))")),
            "age > 0"
        );
        assert_eq!(
            expression(Dialect::Postgres, &fragment_of("(a > 0) AND (b > 0)")),
            "(a > 0) AND (b > 0)"
        );
    }
}
