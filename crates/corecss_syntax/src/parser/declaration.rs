use crate::errors::{ParseError, ParseResult};
use crate::parser::validate::{validate_any, validate_block};
use crate::stylesheet::Declaration;
use crate::tokenizer::{Token, TokenType};
use corecss_shared::byte_stream::Location;

/// Parses a `;` separated declaration list, like the content of a rule set block or a style
/// attribute.
///
/// Empty declarations are skipped silently. An invalid declaration is reported and skipped,
/// parsing continues with the next one.
///
/// Blocks that mix declarations with other content (like `@page` in CSS 3 Paged Media) need to
/// extract the declarations themselves and use [`parse_declaration`] directly.
pub fn parse_declaration_list<I>(tokens: I) -> (Vec<Declaration>, Vec<ParseError>)
where
    I: IntoIterator<Item = Token>,
{
    log::trace!("parse_declaration_list");

    let mut parts = Vec::new();
    let mut part: Vec<Token> = Vec::new();
    for token in tokens {
        match token.token_type {
            TokenType::Semicolon => {
                if !part.is_empty() {
                    parts.push(std::mem::take(&mut part));
                }
            }
            // skip white space at the start of a declaration
            TokenType::Whitespace if part.is_empty() => {}
            _ => part.push(token),
        }
    }
    if !part.is_empty() {
        parts.push(part);
    }

    let mut declarations = Vec::new();
    let mut errors = Vec::new();
    for part in parts {
        match parse_declaration(part) {
            Ok(declaration) => declarations.push(declaration),
            Err(e) => {
                log::debug!("dropping declaration: {e}");
                errors.push(e);
            }
        }
    }

    (declarations, errors)
}

/// Parses a single declaration: `property S* ':' S* value`.
///
/// The tokens should stop before the `;` or `}` that ends the declaration.
pub fn parse_declaration(tokens: Vec<Token>) -> ParseResult<Declaration> {
    log::trace!("parse_declaration");

    let mut tokens = tokens.into_iter();

    let Some(name_token) = tokens.next() else {
        return Err(ParseError::at(Location::default(), "expected a property name"));
    };
    let TokenType::Ident(name) = &name_token.token_type else {
        return Err(ParseError::new(
            &name_token,
            format!("expected a property name, got {}", name_token.type_name()),
        ));
    };
    // CSS syntax is case-insensitive
    let name = name.to_ascii_lowercase();

    let mut last = name_token.clone();
    let colon = loop {
        match tokens.next() {
            Some(token) if token.token_type == TokenType::Colon => break token,
            Some(token) if token.is_whitespace() => last = token,
            Some(token) => {
                let reason = format!("expected ':', got {}", token.type_name());
                return Err(ParseError::new(&token, reason));
            }
            None => return Err(ParseError::new(&last, "expected ':'")),
        }
    };

    let value = parse_value(tokens)?;
    let Some(first) = value.first() else {
        return Err(ParseError::new(&colon, "expected a property value"));
    };
    let value_location = first.location.clone();

    Ok(Declaration {
        name,
        value: Token::new_values(value, value_location),
        location: name_token.location,
    })
}

/// Validates a property value and returns its tokens, with white space removed at the start
/// and end but not in the middle.
pub fn parse_value<I>(tokens: I) -> ParseResult<Vec<Token>>
where
    I: IntoIterator<Item = Token>,
{
    let mut content: Vec<Token> = Vec::new();

    for token in tokens {
        if content.is_empty() && token.is_whitespace() {
            continue;
        }

        match &token.token_type {
            TokenType::Block(inner) => validate_block(inner, "property value")?,
            _ => validate_any(&token, "property value")?,
        }
        content.push(token);
    }

    while content.last().is_some_and(Token::is_whitespace) {
        content.pop();
    }

    Ok(content)
}
