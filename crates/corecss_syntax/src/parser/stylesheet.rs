use crate::errors::{ParseError, ParseResult};
use crate::parser::at_rule::read_at_rule;
use crate::parser::rule::parse_ruleset;
use crate::stylesheet::{AtRule, Rule};
use crate::tokenizer::{Token, TokenType};
use crate::CoreParser;

impl CoreParser {
    /// Parses the top level statements of a stylesheet from grouped tokens.
    ///
    /// An invalid statement is dropped and its error collected; parsing resumes right after it.
    pub fn parse_rules<I>(&self, tokens: I) -> (Vec<Rule>, Vec<ParseError>)
    where
        I: IntoIterator<Item = Token>,
    {
        log::trace!("parse_rules");

        let mut rules = Vec::new();
        let mut errors = Vec::new();

        let mut tokens = tokens.into_iter();
        while let Some(token) = tokens.next() {
            let result = match token.token_type {
                TokenType::Whitespace | TokenType::Cdo | TokenType::Cdc => continue,
                TokenType::AtKeyword(_) => read_at_rule(token, &mut tokens)
                    .and_then(|rule| self.dispatch_at_rule(rule, &mut rules, &mut errors)),
                _ => parse_ruleset(token, &mut tokens).map(|(ruleset, declaration_errors)| {
                    rules.push(Rule::RuleSet(ruleset));
                    errors.extend(declaration_errors);
                }),
            };

            if let Err(e) = result {
                log::debug!("dropping rule: {e}");
                errors.push(e);
            }
        }

        (rules, errors)
    }

    fn dispatch_at_rule(
        &self,
        rule: AtRule,
        rules: &mut Vec<Rule>,
        errors: &mut Vec<ParseError>,
    ) -> ParseResult<()> {
        for handler in &self.handlers {
            if handler.parse_at_rule(&rule, rules, errors)? {
                return Ok(());
            }
        }

        Err(ParseError::new(
            rule.keyword_token(),
            format!("unknown at-rule: {}", rule.at_keyword),
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ErrorKind, ParseError, ParseResult};
    use crate::stylesheet::{AtRule, Rule};
    use crate::CoreParser;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn rules_in_order() {
        let stylesheet =
            CoreParser::default().parse_stylesheet("<!-- a { b: c } --> @charset \"x\"; d {}");

        assert_eq!(stylesheet.rules.len(), 2);
        assert!(matches!(stylesheet.rules[0], Rule::RuleSet(_)));
        assert!(matches!(stylesheet.rules[1], Rule::RuleSet(_)));

        assert_eq!(stylesheet.errors.len(), 1);
        assert_eq!(
            stylesheet.errors[0].reason,
            "@charset rule not at the beginning of the stylesheet"
        );
        assert_eq!(stylesheet.errors[0].location.position(), (1, 21));
    }

    #[test]
    fn unknown_at_rule_is_reported() {
        let stylesheet = CoreParser::default().parse_stylesheet("@Import \"foo.css\";\na { b: c }");

        assert_eq!(stylesheet.rules.len(), 1);
        assert_eq!(stylesheet.errors.len(), 1);

        let error = &stylesheet.errors[0];
        assert_eq!(error.reason, "unknown at-rule: @import");
        assert_eq!(error.kind, ErrorKind::Structural);
        assert_eq!(error.subject.as_ref().map(|t| t.raw.as_str()), Some("@Import"));
        assert_eq!(error.location.position(), (1, 1));
    }

    #[test]
    fn handlers_are_tried_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));

        let first_seen = Rc::clone(&seen);
        let first = move |rule: &AtRule,
                          _: &mut Vec<Rule>,
                          _: &mut Vec<ParseError>|
              -> ParseResult<bool> {
            first_seen.borrow_mut().push(format!("first {}", rule.at_keyword));
            Ok(rule.at_keyword == "@media")
        };
        let second_seen = Rc::clone(&seen);
        let second = move |rule: &AtRule,
                           rules: &mut Vec<Rule>,
                           _: &mut Vec<ParseError>|
              -> ParseResult<bool> {
            second_seen.borrow_mut().push(format!("second {}", rule.at_keyword));
            rules.push(Rule::AtRule(rule.clone()));
            Ok(true)
        };

        let parser = CoreParser::builder()
            .at_rule_handler(first)
            .at_rule_handler(second)
            .build();
        let stylesheet = parser.parse_stylesheet("@media print { a { b: c } } @page { x: y }");

        assert!(stylesheet.errors.is_empty());
        assert_eq!(stylesheet.rules.len(), 1);
        assert_eq!(stylesheet.rules[0].at_keyword(), Some("@page"));
        assert_eq!(
            *seen.borrow(),
            vec!["first @media", "first @page", "second @page"]
        );
    }

    #[test]
    fn handler_errors_drop_the_rule() {
        let handler = |rule: &AtRule,
                       _: &mut Vec<Rule>,
                       errors: &mut Vec<ParseError>|
         -> ParseResult<bool> {
            if rule.at_keyword != "@page" {
                return Ok(false);
            }
            errors.push(ParseError::new(rule.keyword_token(), "ignored declaration"));
            Err(ParseError::new(rule.keyword_token(), "broken @page"))
        };

        let parser = CoreParser::builder().at_rule_handler(handler).build();
        let stylesheet = parser.parse_stylesheet("@page { x: y } a { b: c }");

        assert_eq!(stylesheet.rules.len(), 1);
        let reasons: Vec<&str> = stylesheet.errors.iter().map(|e| e.reason.as_str()).collect();
        assert_eq!(reasons, vec!["ignored declaration", "broken @page"]);
    }

    #[test]
    fn failing_handler_ends_the_chain() {
        let second_called = Rc::new(Cell::new(false));

        let first = |rule: &AtRule, _: &mut Vec<Rule>, _: &mut Vec<ParseError>| {
            if rule.at_keyword != "@media" {
                return Ok(false);
            }
            Err(ParseError::new(rule.keyword_token(), "broken @media"))
        };
        let called = Rc::clone(&second_called);
        let second = move |rule: &AtRule,
                           rules: &mut Vec<Rule>,
                           _: &mut Vec<ParseError>|
              -> ParseResult<bool> {
            called.set(true);
            rules.push(Rule::AtRule(rule.clone()));
            Ok(rule.at_keyword == "@media")
        };

        let parser = CoreParser::builder()
            .at_rule_handler(first)
            .at_rule_handler(second)
            .build();
        let stylesheet = parser.parse_stylesheet("@media print { a { b: c } }");

        assert!(!second_called.get());
        assert!(stylesheet.rules.is_empty());
        let reasons: Vec<&str> = stylesheet.errors.iter().map(|e| e.reason.as_str()).collect();
        assert_eq!(reasons, vec!["broken @media"]);
        assert_eq!(stylesheet.errors[0].location.position(), (1, 1));
    }

    #[test]
    fn broken_rules_do_not_stop_parsing() {
        let stylesheet =
            CoreParser::default().parse_stylesheet("a] { b: c } @foo ) ; d { e: f; g } h");

        let reasons: Vec<&str> = stylesheet.errors.iter().map(|e| e.reason.as_str()).collect();
        assert_eq!(
            reasons,
            vec![
                "unmatched ] token in selector",
                "unmatched ) token in at-rule head",
                "expected ':'",
                "no declaration block found for ruleset",
            ]
        );
        assert_eq!(stylesheet.rules.len(), 1);
    }
}
