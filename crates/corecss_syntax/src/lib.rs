//! Parser for the CSS core syntax: the grammar common to all CSS levels.
//!
//! Input is split in at-rules and rule sets, rule set blocks are split in declarations, and every
//! token sequence is validated against the core `any`/`block`/`value` productions. Nothing is
//! known about specific properties or selectors. At-rules other than `@charset` are left to
//! [`AtRuleHandler`]s registered by a level specific layer.
//!
//! Invalid input never aborts parsing: a broken rule or declaration is dropped and reported as a
//! [`ParseError`] next to the valid results.

use crate::parser_config::{Context, ParserConfig};
use crate::stylesheet::{Declaration, Stylesheet};
use crate::tokenizer::{tokenize_grouped, tokenize_str, Tokenizer};

use corecss_shared::byte_stream::ByteStream;

pub mod errors;
pub mod parser;
pub mod parser_config;
pub mod stylesheet;
pub mod tokenizer;
mod unicode;
pub mod walker;

pub use errors::{ErrorKind, ParseError, ParseResult};
pub use parser::{AtRuleHandler, CharsetHandler};

/// Result of [`CoreParser::parse`], depending on the configured context
#[derive(Clone, Debug, PartialEq)]
pub enum ParseOutput {
    Stylesheet(Stylesheet),
    StyleAttribute {
        declarations: Vec<Declaration>,
        errors: Vec<ParseError>,
    },
}

/// The core grammar parser. Holds no parse state, only the configuration and the at-rule
/// handler chain, so one parser can be used for any number of inputs.
pub struct CoreParser {
    /// Handlers tried in order for every at-rule. The charset handler is always last.
    handlers: Vec<Box<dyn AtRuleHandler>>,
    /// The parser configuration as given
    config: ParserConfig,
}

impl Default for CoreParser {
    fn default() -> Self {
        ParserBuilder::default().build()
    }
}

impl CoreParser {
    #[must_use]
    pub fn builder() -> ParserBuilder {
        ParserBuilder::default()
    }

    #[must_use]
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses a stylesheet given as a string
    #[must_use]
    pub fn parse_stylesheet(&self, css: &str) -> Stylesheet {
        log::debug!("parsing stylesheet {}", self.source_name());

        let tokens = tokenize_str(css, self.config.location.clone());
        let (rules, errors) = self.parse_rules(tokens);

        Stylesheet::new(rules, self.filter_errors(errors))
    }

    /// Parses a stylesheet given as bytes. The encoding is detected from a byte order mark, or
    /// guessed from the content.
    #[must_use]
    pub fn parse_stylesheet_bytes(&self, bytes: &[u8]) -> Stylesheet {
        log::debug!("parsing stylesheet bytes {}", self.source_name());

        let mut stream = ByteStream::default();
        stream.read_from_bytes(bytes);

        let tokens = tokenize_grouped(Tokenizer::new(&mut stream, self.config.location.clone()));
        let (rules, errors) = self.parse_rules(tokens);

        Stylesheet::new(rules, self.filter_errors(errors))
    }

    /// Parses the content of a `style` attribute (of an HTML element): a declaration list
    /// without selector or braces.
    #[must_use]
    pub fn parse_style_attr(&self, css: &str) -> (Vec<Declaration>, Vec<ParseError>) {
        log::debug!("parsing style attribute {}", self.source_name());

        let tokens = tokenize_str(css, self.config.location.clone());
        let (declarations, errors) = parser::parse_declaration_list(tokens);

        (declarations, self.filter_errors(errors))
    }

    /// Parses the given string according to the configured context
    #[must_use]
    pub fn parse(&self, css: &str) -> ParseOutput {
        match self.config.context {
            Context::Stylesheet => ParseOutput::Stylesheet(self.parse_stylesheet(css)),
            Context::StyleAttribute => {
                let (declarations, errors) = self.parse_style_attr(css);
                ParseOutput::StyleAttribute { declarations, errors }
            }
        }
    }

    fn filter_errors(&self, errors: Vec<ParseError>) -> Vec<ParseError> {
        if self.config.ignore_errors {
            for e in &errors {
                log::debug!("ignoring error: {e}");
            }
            return Vec::new();
        }

        errors
    }

    fn source_name(&self) -> &str {
        self.config.source.as_deref().unwrap_or("<inline>")
    }
}

/// Builds a [`CoreParser`]. Level specific layers register their at-rule handlers here, most
/// specific first; the core `@charset` handler is appended by [`ParserBuilder::build`].
#[derive(Default)]
pub struct ParserBuilder {
    config: ParserConfig,
    handlers: Vec<Box<dyn AtRuleHandler>>,
}

impl ParserBuilder {
    #[must_use]
    pub fn config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds a handler to the chain. Handlers are tried in the order they were added.
    #[must_use]
    pub fn at_rule_handler(mut self, handler: impl AtRuleHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    #[must_use]
    pub fn build(mut self) -> CoreParser {
        self.handlers.push(Box::new(CharsetHandler));

        CoreParser {
            handlers: self.handlers,
            config: self.config,
        }
    }
}

/// Parses a stylesheet with a default parser, which only handles `@charset`
#[must_use]
pub fn parse_stylesheet(css: &str) -> Stylesheet {
    CoreParser::default().parse_stylesheet(css)
}

/// Parses a `style` attribute with a default parser
#[must_use]
pub fn parse_style_attr(css: &str) -> (Vec<Declaration>, Vec<ParseError>) {
    CoreParser::default().parse_style_attr(css)
}
