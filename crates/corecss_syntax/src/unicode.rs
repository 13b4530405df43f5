// note: code points used by the tokenizer when decoding escapes

#[allow(clippy::module_name_repetitions)]
pub struct UnicodeChar;

impl UnicodeChar {
    pub const NULL: char = '\u{0000}';
    pub const FORM_FEED: char = '\u{000C}';
    pub const MAX_ALLOWED: char = '\u{10FFFF}';
    pub const REPLACEMENT_CHARACTER: char = '\u{FFFD}';
}

/// CSS white space: space, tab, line feed, carriage return and form feed. Unlike
/// `char::is_whitespace` this does not include other unicode spaces.
pub(crate) fn is_css_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | UnicodeChar::FORM_FEED)
}
