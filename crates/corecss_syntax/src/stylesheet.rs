use crate::errors::ParseError;
use crate::tokenizer::Token;
use corecss_shared::byte_stream::Location;

/// A parsed stylesheet: the rules in source order and the errors that dropped other rules
/// or declarations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
    pub errors: Vec<ParseError>,
}

impl Stylesheet {
    #[must_use]
    pub fn new(rules: Vec<Rule>, errors: Vec<ParseError>) -> Self {
        Self { rules, errors }
    }
}

/// A top level statement
#[derive(Clone, Debug, PartialEq)]
pub enum Rule {
    AtRule(AtRule),
    RuleSet(RuleSet),
}

impl Rule {
    #[must_use]
    pub fn location(&self) -> &Location {
        match self {
            Rule::AtRule(rule) => &rule.location,
            Rule::RuleSet(rule) => &rule.location,
        }
    }

    /// The at-keyword of at-rules, `None` for rule sets
    #[must_use]
    pub fn at_keyword(&self) -> Option<&str> {
        match self {
            Rule::AtRule(rule) => Some(rule.at_keyword.as_str()),
            Rule::RuleSet(_) => None,
        }
    }
}

/// An unparsed at-rule.
///
/// The head was validated against the core grammar but the body was not, as the body might
/// contain declarations. An error in one of those should only drop that declaration, not the
/// whole rule as an error in the head does. Handlers interpreting the rule validate the body
/// themselves.
#[derive(Clone, Debug, PartialEq)]
pub struct AtRule {
    /// Lower-cased at-keyword, including the `@`: `@page`
    pub at_keyword: String,
    /// Tokens up to the `{` or `;`, without the white space right after the keyword
    pub head: Vec<Token>,
    /// The `{` block, or `None` when the rule ends with `;`
    pub body: Option<Token>,
    /// The at-keyword token as found in the source
    pub keyword: Token,
    /// Location of the at-keyword
    pub location: Location,
}

impl AtRule {
    #[must_use]
    pub fn line(&self) -> usize {
        self.location.line
    }

    #[must_use]
    pub fn column(&self) -> usize {
        self.location.column
    }

    /// The at-keyword token, used as the subject of errors about the whole rule
    #[must_use]
    pub fn keyword_token(&self) -> &Token {
        &self.keyword
    }
}

/// A selector followed by a declaration block
#[derive(Clone, Debug, PartialEq)]
pub struct RuleSet {
    /// Synthetic selector container, possibly empty
    pub selector: Token,
    /// Valid declarations in source order
    pub declarations: Vec<Declaration>,
    /// Location of the first token of the rule set
    pub location: Location,
}

/// A `name: value` pair
#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    /// Lower-cased property name
    pub name: String,
    /// Synthetic values container. Never starts or ends with white space.
    pub value: Token,
    /// Location of the property name
    pub location: Location,
}

impl Declaration {
    /// The value tokens
    #[must_use]
    pub fn values(&self) -> &[Token] {
        self.value.content()
    }
}
