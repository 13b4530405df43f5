//! Recursive descent parser for the CSS 2.1 core syntax.
//!
//! The parser works on grouped tokens (see [`crate::tokenizer::tokenize_grouped`]) and knows
//! nothing about specific properties, selectors or at-rules other than `@charset`. At-rules are
//! handed to a chain of [`AtRuleHandler`]s so level specific parsers can interpret them.
//!
//! ```text
//! stylesheet  : [ CDO | CDC | S | statement ]*;
//! statement   : ruleset | at-rule;
//! at-rule     : ATKEYWORD S* any* [ block | ';' S* ];
//! block       : '{' S* [ any | block | ATKEYWORD S* | ';' S* ]* '}' S*;
//! ruleset     : selector? '{' S* declaration? [ ';' S* declaration? ]* '}' S*;
//! declaration : property S* ':' S* value;
//! value       : [ any | block | ATKEYWORD S* ]+;
//! any         : [ IDENT | NUMBER | PERCENTAGE | DIMENSION | STRING | DELIM | URI | HASH
//!               | UNICODE-RANGE | ':' | FUNCTION any* ')' | '(' any* ')' | '[' any* ']' ] S*;
//! ```

pub mod at_rule;
pub mod declaration;
pub mod rule;
pub mod stylesheet;
pub mod validate;

pub use at_rule::{read_at_rule, AtRuleHandler, CharsetHandler};
pub use declaration::{parse_declaration, parse_declaration_list, parse_value};
pub use rule::parse_ruleset;
pub use validate::{validate_any, validate_block};
