use crate::errors::{ErrorKind, ParseError, ParseResult};
use crate::tokenizer::{Token, TokenType};

/// Checks a single token against the `any` production. Functions, parenthesized and bracketed
/// groups are checked recursively, with the container type as context of their content.
///
/// `context` only ends up in the error message: "unexpected ATKEYWORD token in selector".
pub fn validate_any(token: &Token, context: &str) -> ParseResult<()> {
    match &token.token_type {
        TokenType::FunctionCall { content, .. }
        | TokenType::Paren(content)
        | TokenType::Bracket(content) => {
            for child in content {
                validate_any(child, token.type_name())?;
            }
            Ok(())
        }
        TokenType::Whitespace
        | TokenType::Ident(_)
        | TokenType::Dimension { .. }
        | TokenType::Percentage(_)
        | TokenType::Number(_)
        | TokenType::Url(_)
        | TokenType::Delim(_)
        | TokenType::QuotedString(_)
        | TokenType::Hash(_)
        | TokenType::Colon
        | TokenType::UnicodeRange(_) => Ok(()),
        TokenType::RCurly | TokenType::RParen | TokenType::RBracket => Err(ParseError::with_kind(
            ErrorKind::Unmatched,
            token,
            format!("unmatched {} token in {}", token.type_name(), context),
        )),
        _ => Err(ParseError::with_kind(
            ErrorKind::Unexpected,
            token,
            format!("unexpected {} token in {}", token.type_name(), context),
        )),
    }
}

/// Checks the content of a `{}` block against the `block` production: `any` tokens plus `;`,
/// at-keywords and nested blocks.
pub fn validate_block(tokens: &[Token], context: &str) -> ParseResult<()> {
    for token in tokens {
        match &token.token_type {
            TokenType::Block(content) => validate_block(content, context)?,
            TokenType::Semicolon | TokenType::AtKeyword(_) => {}
            _ => validate_any(token, context)?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize_str;
    use corecss_shared::byte_stream::Location;
    use test_case::test_case;

    fn validate_all(css: &str, context: &str) -> ParseResult<()> {
        for token in tokenize_str(css, Location::default()) {
            validate_any(&token, context)?;
        }
        Ok(())
    }

    #[test_case("a b.c #d > e[f=\"g\"]"; "selector tokens")]
    #[test_case("12px 50% 1.5 url(x.png) U+0-7F"; "numeric and url tokens")]
    #[test_case("rgb(1, 2, 3) (a:b) [c]"; "containers")]
    #[test_case("f(g(h[i]))"; "nested containers")]
    fn any_accepts(css: &str) {
        assert_eq!(validate_all(css, "selector"), Ok(()));
    }

    #[test_case("@media", ErrorKind::Unexpected, "unexpected ATKEYWORD token in selector")]
    #[test_case(";", ErrorKind::Unexpected, "unexpected ; token in selector")]
    #[test_case("{}", ErrorKind::Unexpected, "unexpected { token in selector")]
    #[test_case("}", ErrorKind::Unmatched, "unmatched } token in selector")]
    #[test_case("a )", ErrorKind::Unmatched, "unmatched ) token in selector")]
    #[test_case("<!--", ErrorKind::Unexpected, "unexpected CDO token in selector")]
    #[test_case("'bad\n", ErrorKind::Unexpected, "unexpected BAD_STRING token in selector")]
    fn any_rejects(css: &str, kind: ErrorKind, reason: &str) {
        let error = validate_all(css, "selector").unwrap_err();
        assert_eq!(error.kind, kind);
        assert_eq!(error.reason, reason);
    }

    #[test]
    fn any_uses_container_as_context() {
        let error = validate_all("f(a; b)", "property value").unwrap_err();
        assert_eq!(error.reason, "unexpected ; token in FUNCTION");

        let error = validate_all("(a ])", "property value").unwrap_err();
        assert_eq!(error.reason, "unmatched ] token in (");

        let error = validate_all("[{}]", "property value").unwrap_err();
        assert_eq!(error.reason, "unexpected { token in [");
        assert_eq!(error.location.position(), (1, 2));
    }

    #[test]
    fn block_accepts_semicolons_and_at_keywords() {
        let tokens = tokenize_str("a; @b c { d; { e } } f(g)", Location::default());
        assert_eq!(validate_block(&tokens, "property value"), Ok(()));
    }

    #[test]
    fn block_rejects_invalid_nested_token() {
        let tokens = tokenize_str("a { b f(@c) }", Location::default());
        let error = validate_block(&tokens, "property value").unwrap_err();
        assert_eq!(error.reason, "unexpected ATKEYWORD token in FUNCTION");
        assert_eq!(error.kind, ErrorKind::Unexpected);
    }
}
