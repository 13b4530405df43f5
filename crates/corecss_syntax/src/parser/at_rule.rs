use crate::errors::{ParseError, ParseResult};
use crate::parser::validate::validate_any;
use crate::stylesheet::{AtRule, Rule};
use crate::tokenizer::{Token, TokenType};

/// Interprets at-rules for a stylesheet parser.
///
/// The parser tries its handlers in order for every at-rule. A handler that returns `Ok(true)`
/// claims the rule; the chain stops there. It may have added the rule (or something built from
/// it) to `rules`, or errors to `errors`. Returning an error also claims the rule, the error
/// is added to the list. Rules nobody claims are dropped with an "unknown at-rule" error.
///
/// `rules` holds the rules parsed so far, so a handler can check placement constraints (for
/// instance `@import` only being allowed before any other rule but `@charset`).
pub trait AtRuleHandler {
    fn parse_at_rule(
        &self,
        rule: &AtRule,
        rules: &mut Vec<Rule>,
        errors: &mut Vec<ParseError>,
    ) -> ParseResult<bool>;
}

impl<F> AtRuleHandler for F
where
    F: Fn(&AtRule, &mut Vec<Rule>, &mut Vec<ParseError>) -> ParseResult<bool>,
{
    fn parse_at_rule(
        &self,
        rule: &AtRule,
        rules: &mut Vec<Rule>,
        errors: &mut Vec<ParseError>,
    ) -> ParseResult<bool> {
        self(rule, rules, errors)
    }
}

/// The core grammar only knows about `@charset`. It has to be the very first thing in the
/// stylesheet, with a single double-quoted string as head and no body.
#[derive(Clone, Copy, Debug, Default)]
pub struct CharsetHandler;

impl AtRuleHandler for CharsetHandler {
    fn parse_at_rule(
        &self,
        rule: &AtRule,
        rules: &mut Vec<Rule>,
        _errors: &mut Vec<ParseError>,
    ) -> ParseResult<bool> {
        if rule.at_keyword != "@charset" {
            return Ok(false);
        }

        // 1:1 assumes a byte order mark was skipped when reading the stream
        if rule.location.position() != (1, 1) {
            return Err(ParseError::new(
                rule.keyword_token(),
                "@charset rule not at the beginning of the stylesheet",
            ));
        }

        let valid = rule.body.is_none()
            && matches!(
                rule.head.as_slice(),
                [token] if matches!(token.token_type, TokenType::QuotedString(_))
                    && token.raw.starts_with('"')
            );
        if !valid {
            return Err(ParseError::new(rule.keyword_token(), "invalid @charset rule"));
        }

        rules.push(Rule::AtRule(rule.clone()));
        Ok(true)
    }
}

/// Reads an at-rule: the at-keyword, the head up to `{` or `;`, and the `{}` block if any.
///
/// `tokens` is consumed just enough for one at-rule. The head is validated against the core
/// grammar, the body is not (see [`AtRule`]).
pub fn read_at_rule<I>(at_keyword_token: Token, tokens: &mut I) -> ParseResult<AtRule>
where
    I: Iterator<Item = Token>,
{
    log::trace!("read_at_rule");

    let TokenType::AtKeyword(keyword) = &at_keyword_token.token_type else {
        return Err(ParseError::new(
            &at_keyword_token,
            format!("expected an at-keyword, got {}", at_keyword_token.type_name()),
        ));
    };
    // CSS syntax is case-insensitive
    let at_keyword = format!("@{}", keyword.to_ascii_lowercase());

    let mut head: Vec<Token> = Vec::new();
    let mut skipped: Option<Token> = None;

    for token in tokens.by_ref() {
        match token.token_type {
            TokenType::Block(_) | TokenType::Semicolon => {
                for head_token in &head {
                    validate_any(head_token, "at-rule head")?;
                }

                let body = matches!(token.token_type, TokenType::Block(_)).then_some(token);
                return Ok(AtRule {
                    at_keyword,
                    head,
                    body,
                    location: at_keyword_token.location.clone(),
                    keyword: at_keyword_token,
                });
            }
            // white space right after the at-keyword is dropped, later white space is kept
            TokenType::Whitespace if head.is_empty() => skipped = Some(token),
            _ => head.push(token),
        }
    }

    let subject = head.last().or(skipped.as_ref()).unwrap_or(&at_keyword_token);
    Err(ParseError::new(subject, "incomplete at-rule"))
}
