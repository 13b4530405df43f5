use crate::errors::{ParseError, ParseResult};
use crate::parser::declaration::parse_declaration_list;
use crate::parser::validate::validate_any;
use crate::stylesheet::RuleSet;
use crate::tokenizer::{Token, TokenType};

/// Parses a rule set: a selector followed by a declaration block.
///
/// `first_token` is the first token of the rule set, already read by the caller to tell it
/// apart from an at-rule. `tokens` is consumed up to and including the `{}` block.
///
/// Either the selector is valid for the core grammar or the whole rule set is dropped (the
/// error is returned). Errors in declarations only drop those declarations; they are returned
/// next to the rule set. A selector can be valid here but not for CSS 2.1 or another level.
pub fn parse_ruleset<I>(
    first_token: Token,
    tokens: &mut I,
) -> ParseResult<(RuleSet, Vec<ParseError>)>
where
    I: Iterator<Item = Token>,
{
    log::trace!("parse_ruleset");

    let location = first_token.location.clone();
    let mut selector_parts: Vec<Token> = Vec::new();

    for token in std::iter::once(first_token).chain(tokens.by_ref()) {
        if !matches!(token.token_type, TokenType::Block(_)) {
            selector_parts.push(token);
            continue;
        }

        // validate once the whole selector is read, so the block is always consumed
        for selector_token in &selector_parts {
            validate_any(selector_token, "selector")?;
        }

        let start = selector_parts
            .first()
            .map_or_else(|| token.location.clone(), |t| t.location.clone());
        let selector = Token::new_selector(selector_parts, start);

        let (declarations, errors) = parse_declaration_list(token.into_content());

        let ruleset = RuleSet {
            selector,
            declarations,
            location,
        };
        return Ok((ruleset, errors));
    }

    Err(match selector_parts.last() {
        Some(last) => ParseError::new(last, "no declaration block found for ruleset"),
        None => ParseError::at(location, "no declaration block found for ruleset"),
    })
}
