use corecss_shared::byte_stream::Location;
use corecss_syntax::parser::parse_declaration_list;
use corecss_syntax::stylesheet::{Rule, Stylesheet};
use corecss_syntax::tokenizer::{tokenize_str, Token, TokenType};
use corecss_syntax::{parse_style_attr, parse_stylesheet, CoreParser, ErrorKind};
use serde::Deserialize;
use std::fs;
use test_case::test_case;

#[derive(Debug, Deserialize)]
struct Root {
    tests: Vec<Test>,
}

#[derive(Debug, Deserialize)]
struct Test {
    description: String,
    input: String,
    rules: Vec<String>,
    errors: Vec<Error>,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Error {
    reason: String,
    line: usize,
    column: usize,
}

fn css_of(tokens: &[Token]) -> String {
    tokens.iter().map(Token::as_css).collect()
}

/// Renders a rule in a compact form that is easy to write down in the fixtures
fn summarize(rule: &Rule) -> String {
    match rule {
        Rule::AtRule(at_rule) => {
            let mut summary = at_rule.at_keyword.clone();
            let head = css_of(&at_rule.head);
            if !head.trim().is_empty() {
                summary.push(' ');
                summary.push_str(head.trim());
            }
            if let Some(body) = &at_rule.body {
                summary.push(' ');
                summary.push_str(&body.as_css());
            }
            summary
        }
        Rule::RuleSet(ruleset) => {
            let selector = ruleset.selector.as_css();
            let mut summary = if selector.trim().is_empty() {
                "{".to_string()
            } else {
                format!("{} {{", selector.trim())
            };
            for declaration in &ruleset.declarations {
                let value = css_of(declaration.values());
                summary.push_str(&format!(" {}: {};", declaration.name, value));
            }
            summary.push_str(" }");
            summary
        }
    }
}

fn assert_stylesheet(test: &Test, stylesheet: &Stylesheet) {
    let rules: Vec<String> = stylesheet.rules.iter().map(summarize).collect();
    assert_eq!(rules, test.rules, "rules of: {}", test.description);

    let errors: Vec<Error> = stylesheet
        .errors
        .iter()
        .map(|e| Error {
            reason: e.reason.clone(),
            line: e.line(),
            column: e.column(),
        })
        .collect();
    assert_eq!(errors, test.errors, "errors of: {}", test.description);
}

#[test]
fn core_grammar_fixtures() {
    let contents = fs::read_to_string("tests/data/core_grammar.json").unwrap();
    let root: Root = serde_json::from_str(&contents).unwrap();
    assert!(!root.tests.is_empty());

    for test in &root.tests {
        assert_stylesheet(test, &parse_stylesheet(&test.input));

        // the byte entry point behaves the same on plain utf-8
        let parser = CoreParser::default();
        assert_stylesheet(test, &parser.parse_stylesheet_bytes(test.input.as_bytes()));
    }
}

const NOT_FIRST: &str = "@charset rule not at the beginning of the stylesheet";

#[test_case("@charset \"UTF-8\";", 1, &[] ; "charset at the start")]
#[test_case("/* x */@charset \"UTF-8\";", 0, &[NOT_FIRST] ; "charset after a comment")]
#[test_case("a{}@charset \"UTF-8\";", 1, &[NOT_FIRST] ; "charset after a rule")]
#[test_case("@charset UTF-8;", 0, &["invalid @charset rule"] ; "charset without quotes")]
#[test_case("@charset \"a\" \"x\";", 0, &["invalid @charset rule"] ; "charset with two strings")]
#[test_case("a { b: red;; c: ; d: 1px }", 1, &["expected a property value"] ; "declaration errors")]
#[test_case("@foo bar;", 0, &["unknown at-rule: @foo"] ; "unknown at-rule")]
#[test_case("@foo bar", 0, &["incomplete at-rule"] ; "incomplete at-rule")]
#[test_case("@foo (]); a {}", 1, &["unmatched ] token in ("] ; "invalid at-rule head")]
fn scenarios(css: &str, rule_count: usize, reasons: &[&str]) {
    let stylesheet = parse_stylesheet(css);

    assert_eq!(stylesheet.rules.len(), rule_count);
    let actual: Vec<&str> = stylesheet.errors.iter().map(|e| e.reason.as_str()).collect();
    assert_eq!(actual, reasons);
}

#[test]
fn missing_block_in_token_stream() {
    // a token stream from a tokenizer that leaves an unterminated `{` ungrouped
    let tokens = vec![
        Token::new(TokenType::Ident("foo".into()), Location::new(1, 1, 0), "foo"),
        Token::new(TokenType::Whitespace, Location::new(1, 4, 3), " "),
        Token::new(TokenType::LCurly, Location::new(1, 5, 4), "{"),
        Token::new(TokenType::Whitespace, Location::new(1, 6, 5), " "),
        Token::new(TokenType::Ident("bar".into()), Location::new(1, 7, 6), "bar"),
    ];

    let (rules, errors) = CoreParser::default().parse_rules(tokens);
    assert!(rules.is_empty());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].reason, "no declaration block found for ruleset");
    assert_eq!(errors[0].kind, ErrorKind::Structural);
}

#[test_case("color: red;", "color", "red" ; "simple")]
#[test_case("Color:red", "color", "red" ; "no white space")]
#[test_case("  MARGIN  :  0   auto  ;  ", "margin", "0   auto" ; "interior white space kept")]
#[test_case("font: 12px/1 \"A\", serif", "font", "12px/1 \"A\", serif" ; "delimiters and strings")]
#[test_case("background:url( 'a b.png' )", "background", "url( 'a b.png' )" ; "quoted url")]
fn single_declaration(css: &str, name: &str, value: &str) {
    let (declarations, errors) = parse_declaration_list(tokenize_str(css, Location::default()));

    assert!(errors.is_empty());
    assert_eq!(declarations.len(), 1);
    assert_eq!(declarations[0].name, name);
    assert_eq!(css_of(declarations[0].values()), value);
    assert!(!declarations[0].values()[0].is_whitespace());
}

#[test_case("@charset \"a\";" ; "lower case")]
#[test_case("@Charset \"a\";" ; "header case")]
#[test_case("@CHARSET \"a\";" ; "upper case")]
fn at_keyword_case_does_not_matter(css: &str) {
    let stylesheet = parse_stylesheet(css);

    assert!(stylesheet.errors.is_empty());
    assert_eq!(stylesheet.rules.len(), 1);
    assert_eq!(stylesheet.rules[0].at_keyword(), Some("@charset"));
}

#[test_case("a { }" ; "white space only")]
#[test_case("a {}" ; "empty")]
#[test_case("a { ;;; }" ; "separators only")]
fn empty_declaration_block(css: &str) {
    let stylesheet = parse_stylesheet(css);

    assert!(stylesheet.errors.is_empty());
    let Some(Rule::RuleSet(ruleset)) = stylesheet.rules.first() else {
        unreachable!("expected a rule set");
    };
    assert!(ruleset.declarations.is_empty());
}

#[test]
fn empty_selector() {
    let stylesheet = parse_stylesheet("{ color: red }");

    assert!(stylesheet.errors.is_empty());
    let Some(Rule::RuleSet(ruleset)) = stylesheet.rules.first() else {
        unreachable!("expected a rule set");
    };
    assert!(ruleset.selector.content().is_empty());
    assert_eq!(ruleset.selector.type_name(), "SELECTOR");
    assert_eq!(ruleset.declarations.len(), 1);
}

#[test]
fn every_statement_is_accounted_for() {
    let css = "a { b: c } @foo; d ] { } @charset \"x\"; e { f: g } @bar { } h";
    let stylesheet = parse_stylesheet(css);

    // seven statements: two rule sets kept, five dropped with one error each
    assert_eq!(stylesheet.rules.len(), 2);
    assert_eq!(stylesheet.errors.len(), 5);

    let columns: Vec<usize> = stylesheet.errors.iter().map(|e| e.column()).collect();
    assert_eq!(columns, vec![12, 20, 26, 51, 60]);
}

#[test]
fn style_attribute() {
    let (declarations, errors) = parse_style_attr("color: red; ; background: url(a.png) ; width");

    let names: Vec<&str> = declarations.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["color", "background"]);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].reason, "expected ':'");
    assert_eq!(errors[0].to_string(), "Parse error at 1:40, expected ':'");
}
