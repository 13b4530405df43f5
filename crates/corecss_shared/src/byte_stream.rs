use std::cell::RefCell;
use std::char::REPLACEMENT_CHARACTER;
use std::fmt;
use std::fmt::{Debug, Formatter};

pub const CHAR_LF: char = '\u{000A}';
pub const CHAR_CR: char = '\u{000D}';

/// Encoding defines the way the buffer stream is read, as what defines a "character".
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Encoding {
    /// Stream is of single byte ASCII chars (0-255)
    ASCII,
    /// Stream is of UTF8 characters
    UTF8,
    /// Stream consists of 16-bit UTF characters (Little Endian)
    UTF16LE,
    /// Stream consists of 16-bit UTF characters (Big Endian)
    UTF16BE,
}

/// Defines a single character/element in the stream. This is either a UTF8 character, or
/// a surrogate characters since these cannot be stored in a single char.
///
/// Eof is denoted as a separate element, so is Empty to indicate that the buffer is empty but
/// not yet closed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Character {
    /// Standard UTF character
    Ch(char),
    /// Surrogate character (since they cannot be stored in char)
    Surrogate(u16),
    /// Stream buffer empty and closed
    StreamEnd,
    /// Stream buffer empty (but not closed)
    StreamEmpty,
}

use Character::{Ch, StreamEmpty, StreamEnd, Surrogate};

/// Converts the given character to a char. Surrogate and EOF characters are converted to 0x0000
impl From<Character> for char {
    fn from(c: Character) -> Self {
        match c {
            Ch(c) => c,
            Surrogate(..) | StreamEmpty | StreamEnd => 0x0000 as char,
        }
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Ch(ch) => write!(f, "{ch}"),
            Surrogate(surrogate) => write!(f, "U+{surrogate:04X}"),
            StreamEnd => write!(f, "StreamEnd"),
            StreamEmpty => write!(f, "StreamEmpty"),
        }
    }
}

impl Character {
    /// Returns true when the character is a whitespace
    #[must_use]
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Ch(c) if c.is_whitespace())
    }

    /// Returns true when the character is a numerical
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Ch(c) if c.is_ascii_digit())
    }

    /// Returns true when the character is a hexadecimal digit
    #[must_use]
    pub fn is_hex_digit(&self) -> bool {
        matches!(self, Ch(c) if c.is_ascii_hexdigit())
    }
}

/// Configuration structure for a bytestream.
pub struct Config {
    /// Treat any CRLF pairs as a single LF
    pub cr_lf_as_one: bool,
    /// Replace any CR (without a pairing LF) with LF
    pub replace_cr_as_lf: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cr_lf_as_one: true,
            replace_cr_as_lf: true,
        }
    }
}

pub struct ByteStream {
    /// Actual buffer stream in u8 bytes
    buffer: Vec<u8>,
    /// Current position in the stream
    buffer_pos: RefCell<usize>,
    /// True when no more data will be added to the buffer
    closed: bool,
    /// Current encoding
    encoding: Encoding,
    /// Configuration for the stream
    config: Config,
}

/// Generic stream trait
pub trait Stream {
    /// Read current character
    fn read(&self) -> Character;
    /// Read current character and advance to next
    fn read_and_next(&self) -> Character;
    /// Look ahead in the stream
    fn look_ahead(&self, offset: usize) -> Character;
    /// Advance with 1 character
    fn next(&self);
    /// Advance with offset characters
    fn next_n(&self, offset: usize);
    /// Unread the current character
    fn prev(&self);
    /// Unread n characters
    fn prev_n(&self, n: usize);
    /// Seek to a specific position in bytes
    fn seek_bytes(&self, offset: usize);
    /// Tell the current position in bytes
    fn tell_bytes(&self) -> usize;
    /// Resets the stream back to the start position
    fn reset_stream(&self);
    /// Closes the stream (no more data can be added)
    fn close(&mut self);
    /// Returns true when the stream is closed
    fn closed(&self) -> bool;
    /// Returns true when the stream is empty (but still open)
    fn exhausted(&self) -> bool;
    /// Returns true when the stream is closed and empty
    fn eof(&self) -> bool;
}

impl Default for ByteStream {
    fn default() -> Self {
        Self::new(Encoding::UTF8, None)
    }
}

impl Stream for ByteStream {
    fn read(&self) -> Character {
        let (ch, _) = self.read_with_length();
        ch
    }

    fn read_and_next(&self) -> Character {
        let (ch, len) = self.read_with_length();

        {
            let mut pos = self.buffer_pos.borrow_mut();
            *pos += len;
        }

        // Make sure we skip the CR if it is followed by a LF
        if self.config.cr_lf_as_one && ch == Ch(CHAR_CR) && self.read() == Ch(CHAR_LF) {
            self.next();
            return Ch(CHAR_LF);
        }

        // Replace CR with LF if it is not followed by a LF
        if self.config.replace_cr_as_lf && ch == Ch(CHAR_CR) {
            return Ch(CHAR_LF);
        }

        ch
    }

    /// Looks ahead in the stream. CR/LF folding is applied the same way `read_and_next` does,
    /// so a lookahead always sees what a later read will return.
    fn look_ahead(&self, offset: usize) -> Character {
        if self.buffer.is_empty() {
            return if self.closed { StreamEnd } else { StreamEmpty };
        }

        let original_pos = *self.buffer_pos.borrow();

        self.next_n(offset);
        let ch = self.read();

        *self.buffer_pos.borrow_mut() = original_pos;

        if self.config.replace_cr_as_lf && ch == Ch(CHAR_CR) {
            return Ch(CHAR_LF);
        }

        ch
    }

    fn next(&self) {
        self.next_n(1);
    }

    fn next_n(&self, offset: usize) {
        for _ in 0..offset {
            let ch = self.read_and_next();
            if matches!(ch, StreamEnd | StreamEmpty) {
                return;
            }
        }
    }

    fn prev(&self) {
        self.prev_n(1);
    }

    fn prev_n(&self, n: usize) {
        for _ in 0..n {
            self.move_back();

            if self.config.cr_lf_as_one && self.read() == Ch(CHAR_LF) {
                let pos = self.tell_bytes();
                self.move_back();
                if self.read() != Ch(CHAR_CR) {
                    self.seek_bytes(pos);
                }
            }
        }
    }

    fn seek_bytes(&self, offset: usize) {
        *self.buffer_pos.borrow_mut() = offset;
    }

    fn tell_bytes(&self) -> usize {
        *self.buffer_pos.borrow()
    }

    fn reset_stream(&self) {
        *self.buffer_pos.borrow_mut() = 0;
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn closed(&self) -> bool {
        self.closed
    }

    /// Returns true when the buffer is empty. Note that it does not check if the stream is
    /// closed. Use `closed` for that.
    fn exhausted(&self) -> bool {
        *self.buffer_pos.borrow() >= self.buffer.len()
    }

    fn eof(&self) -> bool {
        self.closed() && self.exhausted()
    }
}

impl ByteStream {
    /// Create a new default empty input stream
    #[must_use]
    pub fn new(encoding: Encoding, config: Option<Config>) -> Self {
        Self {
            config: config.unwrap_or_default(),
            buffer_pos: RefCell::new(0),
            buffer: Vec::new(),
            closed: false,
            encoding,
        }
    }

    /// Returns the encoding the stream is currently decoded with
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Populates the current buffer with the contents of the given string s
    pub fn read_from_str(&mut self, s: &str) {
        self.buffer = Vec::from(s.as_bytes());
        self.encoding = Encoding::UTF8;
        self.reset_stream();
    }

    /// Populates the buffer with raw bytes and detects their encoding. A byte order mark is
    /// skipped so the first character of the content is read at the start of the stream.
    ///
    /// Content in any other encoding than UTF-8, UTF-16 or plain ASCII is transcoded to UTF-8
    /// first, so every byte of the source ends up as exactly one character.
    pub fn read_from_bytes(&mut self, bytes: &[u8]) {
        self.buffer = bytes.to_vec();

        let guess = self.guess_encoding();
        let bom_len = if guess == encoding_rs::UTF_8 && self.buffer.starts_with(b"\xEF\xBB\xBF") {
            3
        } else if (guess == encoding_rs::UTF_16LE && self.buffer.starts_with(b"\xFF\xFE"))
            || (guess == encoding_rs::UTF_16BE && self.buffer.starts_with(b"\xFE\xFF"))
        {
            2
        } else {
            0
        };
        self.buffer.drain(..bom_len);

        self.encoding = match self.stream_encoding(guess) {
            Some(encoding) => encoding,
            None => {
                log::debug!("transcoding stream from {} to UTF-8", guess.name());

                let (decoded, had_errors) = guess.decode_without_bom_handling(&self.buffer);
                if had_errors {
                    log::warn!("stream is not valid {}, invalid bytes are replaced", guess.name());
                }
                let decoded = decoded.into_owned();
                self.buffer = decoded.into_bytes();

                Encoding::UTF8
            }
        };

        self.close();
        self.reset_stream();
    }

    /// Returns the content of the stream as it is read: decoded, without byte order mark and
    /// with line endings folded. The read position is left untouched.
    #[must_use]
    pub fn decoded_text(&self) -> String {
        let pos = self.tell_bytes();
        self.reset_stream();

        let mut text = String::with_capacity(self.buffer.len());
        while let Ch(c) = self.read_and_next() {
            text.push(c);
        }

        self.seek_bytes(pos);
        text
    }

    /// Detect the given encoding from stream analysis. Encodings the stream cannot read
    /// directly are reported as UTF-8, which is what [`ByteStream::read_from_bytes`]
    /// transcodes them to.
    #[must_use]
    pub fn detect_encoding(&self) -> Encoding {
        let guess = self.guess_encoding();
        self.stream_encoding(guess).unwrap_or(Encoding::UTF8)
    }

    /// Guesses the encoding of the buffer: a byte order mark first, then content analysis
    fn guess_encoding(&self) -> &'static encoding_rs::Encoding {
        let mut buf = self.buffer.as_slice();

        // Check for BOM
        if buf.starts_with(b"\xEF\xBB\xBF") {
            return encoding_rs::UTF_8;
        } else if buf.starts_with(b"\xFF\xFE") {
            return encoding_rs::UTF_16LE;
        } else if buf.starts_with(b"\xFE\xFF") {
            return encoding_rs::UTF_16BE;
        }

        // Cap the buffer size we will check to max 64KB
        const MAX_BUF_SIZE: usize = 64 * 1024;
        let mut complete = true;
        if buf.len() > MAX_BUF_SIZE {
            buf = &buf[..MAX_BUF_SIZE];
            complete = false;
        }

        let mut encoding_detector = chardetng::EncodingDetector::new();
        encoding_detector.feed(buf, complete);

        encoding_detector.guess(None, true)
    }

    /// Maps a guessed encoding on one the stream reads natively, if any
    fn stream_encoding(&self, encoding: &'static encoding_rs::Encoding) -> Option<Encoding> {
        if encoding == encoding_rs::UTF_8 {
            Some(Encoding::UTF8)
        } else if encoding == encoding_rs::UTF_16BE {
            Some(Encoding::UTF16BE)
        } else if encoding == encoding_rs::UTF_16LE {
            Some(Encoding::UTF16LE)
        } else if encoding == encoding_rs::WINDOWS_1252 && self.buffer.is_ascii() {
            Some(Encoding::ASCII)
        } else {
            None
        }
    }

    /// Read the character and return it together with the number of bytes the character took
    fn read_with_length(&self) -> (Character, usize) {
        let buf_pos = *self.buffer_pos.borrow();
        if buf_pos >= self.buffer.len() {
            if self.closed {
                return (StreamEnd, 0);
            }
            return (StreamEmpty, 0);
        }

        match self.encoding {
            Encoding::ASCII => (Ch(self.buffer[buf_pos] as char), 1),
            Encoding::UTF8 => {
                let first_byte = self.buffer[buf_pos];
                let Some(width) = utf8_char_width(first_byte) else {
                    // stray continuation byte or invalid lead byte
                    return (Ch(REPLACEMENT_CHARACTER), 1);
                };

                let Some(b) = self.buffer.get(buf_pos..buf_pos + width) else {
                    return (Ch(REPLACEMENT_CHARACTER), 1);
                };
                // only the lead byte is consumed of a broken sequence, so the bytes after it
                // are read as characters of their own
                if !b[1..].iter().all(|&byte| byte & 0b1100_0000 == 0b1000_0000) {
                    return (Ch(REPLACEMENT_CHARACTER), 1);
                }

                let ch = match width {
                    1 => u32::from(b[0]),
                    2 => (u32::from(b[0]) & 0x1F) << 6 | (u32::from(b[1]) & 0x3F),
                    3 => {
                        (u32::from(b[0]) & 0x0F) << 12
                            | (u32::from(b[1]) & 0x3F) << 6
                            | (u32::from(b[2]) & 0x3F)
                    }
                    _ => {
                        (u32::from(b[0]) & 0x07) << 18
                            | (u32::from(b[1]) & 0x3F) << 12
                            | (u32::from(b[2]) & 0x3F) << 6
                            | (u32::from(b[3]) & 0x3F)
                    }
                };

                if (0xD800..=0xDFFF).contains(&ch) {
                    (Surrogate(ch as u16), width)
                } else {
                    (char::from_u32(ch).map_or(Ch(REPLACEMENT_CHARACTER), Ch), width)
                }
            }
            Encoding::UTF16LE | Encoding::UTF16BE => {
                if buf_pos + 1 >= self.buffer.len() {
                    return (Ch(REPLACEMENT_CHARACTER), 1);
                }

                let pair = [self.buffer[buf_pos], self.buffer[buf_pos + 1]];
                let code_unit = if self.encoding == Encoding::UTF16LE {
                    u16::from_le_bytes(pair)
                } else {
                    u16::from_be_bytes(pair)
                };

                if (0xD800..=0xDFFF).contains(&code_unit) {
                    (Surrogate(code_unit), 2)
                } else {
                    (char::from_u32(u32::from(code_unit)).map_or(Ch(REPLACEMENT_CHARACTER), Ch), 2)
                }
            }
        }
    }

    /// Moves back a single character in the stream
    fn move_back(&self) {
        let mut pos = self.buffer_pos.borrow_mut();

        match self.encoding {
            Encoding::ASCII => *pos = pos.saturating_sub(1),
            Encoding::UTF8 => {
                while *pos > 0 {
                    *pos -= 1;
                    if self.buffer[*pos] & 0b1100_0000 != 0b1000_0000 {
                        break;
                    }
                }
            }
            Encoding::UTF16LE | Encoding::UTF16BE => *pos = pos.saturating_sub(2),
        }
    }
}

/// Location holds the start position of the given element in the data source
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Location {
    /// Line number, starting with 1
    pub line: usize,
    /// Column number, starting with 1
    pub column: usize,
    /// Character offset, starting with 0
    pub offset: usize,
}

impl Default for Location {
    /// Default to line 1, column 1
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

impl Location {
    /// Create a new Location
    #[must_use]
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }

    /// Line and column as a tuple, handy for comparisons
    #[must_use]
    pub fn position(&self) -> (usize, usize) {
        (self.line, self.column)
    }
}

impl Debug for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{})", self.line, self.column)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// LocationHandler is a wrapper that will deal with line/column locations in the stream
pub struct LocationHandler {
    /// The start offset of the location. Normally this is 1:1, but can be different in case of
    /// inline streams
    pub start_location: Location,
    /// The current location of the stream, relative to the start location
    pub cur_location: Location,
}

impl LocationHandler {
    /// Create a new LocationHandler. Start_location can be set in case the stream is
    /// not starting at 1:1
    #[must_use]
    pub fn new(start_location: Location) -> Self {
        Self {
            start_location,
            cur_location: Location::default(),
        }
    }

    /// Returns the absolute location: the current location shifted by the start location.
    /// Only the first line is shifted by the start column.
    #[must_use]
    pub fn current(&self) -> Location {
        let column = if self.cur_location.line == 1 {
            self.start_location.column + self.cur_location.column - 1
        } else {
            self.cur_location.column
        };

        Location::new(
            self.start_location.line + self.cur_location.line - 1,
            column,
            self.start_location.offset + self.cur_location.offset,
        )
    }

    /// Will increase the current location based on the given character
    pub fn inc(&mut self, ch: Character) {
        match ch {
            Ch(CHAR_LF) => {
                self.cur_location.line += 1;
                self.cur_location.column = 1;
                self.cur_location.offset += 1;
            }
            Ch(_) | Surrogate(_) => {
                self.cur_location.column += 1;
                self.cur_location.offset += 1;
            }
            StreamEnd | StreamEmpty => {}
        }
    }
}

/// Returns the width of the UTF8 character starting with the given byte, or `None` when the
/// byte cannot start a character
#[inline]
fn utf8_char_width(first_byte: u8) -> Option<usize> {
    match first_byte {
        0x00..=0x7F => Some(1),
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_stream() {
        let mut stream = ByteStream::new(Encoding::UTF8, None);
        assert!(stream.exhausted());
        assert!(!stream.eof());

        stream.read_from_str("f游놓f");
        stream.close();
        assert!(!stream.eof());
        assert_eq!(stream.read_and_next(), Ch('f'));
        assert_eq!(stream.read_and_next(), Ch('游'));
        assert_eq!(stream.read_and_next(), Ch('놓'));
        assert_eq!(stream.read_and_next(), Ch('f'));
        assert!(stream.eof());
        assert!(matches!(stream.read_and_next(), StreamEnd));
    }

    #[test]
    fn test_look_ahead() {
        let mut stream = ByteStream::default();
        stream.read_from_str("abc");
        stream.close();

        assert_eq!(stream.look_ahead(0), Ch('a'));
        assert_eq!(stream.look_ahead(2), Ch('c'));
        assert_eq!(stream.look_ahead(3), StreamEnd);
        assert_eq!(stream.read(), Ch('a'));

        stream.next_n(2);
        assert_eq!(stream.read(), Ch('c'));
        stream.prev();
        assert_eq!(stream.read(), Ch('b'));
    }

    #[test]
    fn test_crlf() {
        let mut stream = ByteStream::default();
        stream.read_from_str("a\r\nb\rc");
        stream.close();

        assert_eq!(stream.read_and_next(), Ch('a'));
        assert_eq!(stream.look_ahead(0), Ch('\n'));
        assert_eq!(stream.read_and_next(), Ch('\n'));
        assert_eq!(stream.read_and_next(), Ch('b'));
        assert_eq!(stream.read_and_next(), Ch('\n'));
        assert_eq!(stream.read_and_next(), Ch('c'));
        assert!(stream.eof());
    }

    #[test]
    fn test_bom_is_skipped() {
        let mut stream = ByteStream::default();
        stream.read_from_bytes(b"\xEF\xBB\xBF@charset");

        assert_eq!(stream.encoding(), Encoding::UTF8);
        assert_eq!(stream.read_and_next(), Ch('@'));
    }

    #[test]
    fn test_utf16() {
        let mut stream = ByteStream::default();
        stream.read_from_bytes(b"\xFF\xFEa\x00{\x00");

        assert_eq!(stream.encoding(), Encoding::UTF16LE);
        assert_eq!(stream.read_and_next(), Ch('a'));
        assert_eq!(stream.read_and_next(), Ch('{'));
        assert!(stream.eof());
    }

    #[test]
    fn test_decoded_text() {
        let mut stream = ByteStream::default();
        stream.read_from_bytes(b"\xFE\xFF\x00a\x00\r\x00\n\x00\xE9");
        stream.next();

        assert_eq!(stream.decoded_text(), "a\n\u{e9}");
        assert_eq!(stream.read_and_next(), Ch(CHAR_LF));

        let mut stream = ByteStream::default();
        stream.read_from_bytes(b"\xEF\xBB\xBFa{}");
        assert_eq!(stream.decoded_text(), "a{}");
    }

    #[test]
    fn test_invalid_utf8_does_not_swallow_ascii() {
        let mut stream = ByteStream::new(Encoding::UTF8, None);
        stream.buffer = b"x\xE9;\x80}\xC3".to_vec();
        stream.close();

        assert_eq!(stream.read_and_next(), Ch('x'));
        assert_eq!(stream.read_and_next(), Ch(REPLACEMENT_CHARACTER));
        assert_eq!(stream.read_and_next(), Ch(';'));
        assert_eq!(stream.read_and_next(), Ch(REPLACEMENT_CHARACTER));
        assert_eq!(stream.read_and_next(), Ch('}'));
        // truncated sequence at the end of the buffer
        assert_eq!(stream.read_and_next(), Ch(REPLACEMENT_CHARACTER));
        assert!(stream.eof());
    }

    #[test]
    fn test_latin1_is_transcoded() {
        let mut stream = ByteStream::default();
        stream.read_from_bytes(b"a { b: x\xE9; c: d }");

        assert_eq!(stream.encoding(), Encoding::UTF8);
        stream.next_n(7);
        assert_eq!(stream.read_and_next(), Ch('x'));
        assert!(matches!(stream.read_and_next(), Ch(c) if !c.is_ascii()));
        assert_eq!(stream.read_and_next(), Ch(';'));
        assert_eq!(stream.read_and_next(), Ch(' '));
    }

    #[test]
    fn test_location_handler() {
        let mut handler = LocationHandler::new(Location::new(3, 10, 0));
        assert_eq!(handler.current().position(), (3, 10));

        handler.inc(Ch('a'));
        assert_eq!(handler.current().position(), (3, 11));

        handler.inc(Ch('\n'));
        handler.inc(Ch('b'));
        assert_eq!(handler.current().position(), (4, 2));
        assert_eq!(handler.current().offset, 3);
    }
}
