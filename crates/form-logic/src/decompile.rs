use crate::error::LogicError;
use crate::field::LogicField;
use crate::lexer::{Token, TokenKind, lex, unquote};
use crate::operator::OperatorCode;

/// Reads an expression string back into editable rows.
///
/// An empty or absent expression yields one blank row so an editor always has
/// something to show.
pub fn decompile(expression: &str) -> Result<Vec<LogicField>, LogicError> {
    let fields = parse(expression)?;
    if fields.is_empty() {
        Ok(vec![LogicField::default()])
    } else {
        Ok(fields)
    }
}

/// Like [`decompile`], but an empty expression yields no rows.
pub fn parse(expression: &str) -> Result<Vec<LogicField>, LogicError> {
    let tokens = lex(expression);
    if tokens.is_empty() {
        return Ok(Vec::new());
    }
    if let Some(token) = tokens
        .iter()
        .find(|token| token.kind == TokenKind::Error && expression[token.span.clone()].starts_with('"'))
    {
        return Err(LogicError::UnterminatedString {
            position: token.span.start,
        });
    }

    let mut fields = Vec::new();
    for (clause_start, clause) in split_on(&tokens, TokenKind::AndAnd, 0) {
        let mut terms = Vec::new();
        for (start, segment) in split_on(clause, TokenKind::OrOr, clause_start) {
            if segment.is_empty() {
                return Err(LogicError::EmptyCondition { position: start });
            }
            terms.push(parse_term(expression, segment)?);
        }
        fields.push(regroup(terms));
    }
    Ok(fields)
}

struct Term {
    name: String,
    operator: OperatorCode,
    operand: String,
}

impl Term {
    fn into_field(self) -> LogicField {
        if self.operator.is_multi_value() {
            LogicField::multi(self.name, self.operator, [self.operand])
        } else {
            LogicField::new(self.name, self.operator, self.operand)
        }
    }

    fn same_group(&self, field: &LogicField) -> bool {
        field.operator == Some(self.operator) && field.name == self.name
    }
}

fn split_on(tokens: &[Token], separator: TokenKind, mut start: usize) -> Vec<(usize, &[Token])> {
    let mut segments = Vec::new();
    let mut from = 0;
    for (idx, token) in tokens.iter().enumerate() {
        if token.kind == separator {
            segments.push((start, &tokens[from..idx]));
            start = token.span.end;
            from = idx + 1;
        }
    }
    segments.push((start, &tokens[from..]));
    segments
}

fn parse_term(source: &str, tokens: &[Token]) -> Result<Term, LogicError> {
    let unrecognized = || LogicError::UnrecognizedCondition {
        condition: slice(source, tokens).to_string(),
    };
    let Some((first, rest)) = tokens.split_first() else {
        return Err(unrecognized());
    };
    let next = rest.first().map(|token| token.kind);

    match (first.kind, next) {
        (TokenKind::EmptyFn | TokenKind::NotEmptyFn, Some(TokenKind::LParen)) => {
            let [_, arg, close] = rest else {
                return Err(unrecognized());
            };
            if close.kind != TokenKind::RParen {
                return Err(unrecognized());
            }
            let operator = if first.kind == TokenKind::EmptyFn {
                OperatorCode::Empty
            } else {
                OperatorCode::NotEmpty
            };
            Ok(Term {
                name: var_name(source, arg).ok_or_else(unrecognized)?,
                operator,
                operand: String::new(),
            })
        }
        (TokenKind::ContainsFn, Some(TokenKind::LParen)) => {
            let [_, arg, comma, value @ .., close] = rest else {
                return Err(unrecognized());
            };
            if comma.kind != TokenKind::Comma
                || close.kind != TokenKind::RParen
                || !is_operand(value)
            {
                return Err(unrecognized());
            }
            Ok(Term {
                name: var_name(source, arg).ok_or_else(unrecognized)?,
                operator: OperatorCode::Contains,
                operand: operand(source, value),
            })
        }
        (TokenKind::Var | TokenKind::EmptyFn | TokenKind::ContainsFn, Some(kind))
            if kind.is_comparison() =>
        {
            let value = &rest[1..];
            if !is_operand(value) {
                return Err(unrecognized());
            }
            let operator =
                OperatorCode::from_token(&source[rest[0].span.clone()]).ok_or_else(unrecognized)?;
            Ok(Term {
                name: var_name(source, first).ok_or_else(unrecognized)?,
                operator,
                operand: operand(source, value),
            })
        }
        _ => Err(unrecognized()),
    }
}

// Equality alternatives on the same field and operator collapse into one
// `values` list, including those that repeat the primary condition.
fn regroup(terms: Vec<Term>) -> LogicField {
    let mut terms = terms.into_iter();
    let Some(first) = terms.next() else {
        return LogicField::default();
    };
    let mut primary = first.into_field();
    let mut alternatives: Vec<LogicField> = Vec::new();

    for term in terms {
        if term.operator.is_multi_value() {
            if term.same_group(&primary) {
                primary.values.push(term.operand);
                continue;
            }
            if let Some(group) = alternatives.iter_mut().find(|alt| term.same_group(alt)) {
                group.values.push(term.operand);
                continue;
            }
        }
        alternatives.push(term.into_field());
    }

    primary.or = alternatives;
    primary
}

fn var_name(source: &str, token: &Token) -> Option<String> {
    match token.kind {
        TokenKind::Var | TokenKind::EmptyFn | TokenKind::ContainsFn => source[token.span.clone()]
            .strip_prefix('$')
            .map(ToString::to_string),
        _ => None,
    }
}

// A second `$name` or function call after the operator means two conditions
// ran together without `&&`/`||`.
fn is_operand(tokens: &[Token]) -> bool {
    !tokens.is_empty() && !tokens.iter().any(|token| token.kind.is_reference())
}

fn operand(source: &str, tokens: &[Token]) -> String {
    match tokens {
        [single] if single.kind == TokenKind::Str => unquote(&source[single.span.clone()]),
        _ => slice(source, tokens).to_string(),
    }
}

fn slice<'a>(source: &'a str, tokens: &[Token]) -> &'a str {
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => &source[first.span.start..last.span.end],
        _ => "",
    }
}
