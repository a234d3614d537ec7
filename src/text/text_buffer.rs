use std::io::Read;

use crate::result::IonResult;

/// Text input staged for the reader's parsers.
///
/// The entire input is buffered before parsing begins and a trailing newline is appended, so
/// every token — including one at the very end of the input — is followed by a terminator
/// character. This keeps the nom parsers free of end-of-input special cases.
pub(crate) struct TextBuffer {
    text: String,
    offset: usize,
    lines_consumed: usize,
}

impl TextBuffer {
    pub fn from_string(mut text: String) -> TextBuffer {
        text.push('\n');
        TextBuffer {
            text,
            offset: 0,
            lines_consumed: 0,
        }
    }

    pub fn from_source<R: Read>(mut source: R) -> IonResult<TextBuffer> {
        let mut text = String::new();
        source.read_to_string(&mut text)?;
        Ok(TextBuffer::from_string(text))
    }

    /// The unparsed portion of the input.
    pub fn remaining_text(&self) -> &str {
        &self.text[self.offset..]
    }

    /// Marks `number_of_bytes` of the remaining text as parsed.
    pub fn consume(&mut self, number_of_bytes: usize) {
        let consumed = &self.text[self.offset..self.offset + number_of_bytes];
        self.lines_consumed += consumed.matches('\n').count();
        self.offset += number_of_bytes;
    }

    /// The number of bytes that have been consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// A one-based line number for error messages.
    pub fn line_number(&self) -> usize {
        self.lines_consumed + 1
    }
}

#[cfg(test)]
mod text_buffer_tests {
    use super::*;

    #[test]
    fn consume_tracks_offset_and_lines() {
        let mut buffer = TextBuffer::from_string("foo\nbar".to_string());
        assert_eq!(buffer.line_number(), 1);
        buffer.consume(4);
        assert_eq!(buffer.line_number(), 2);
        assert_eq!(buffer.remaining_text(), "bar\n");
        buffer.consume(3);
        assert_eq!(buffer.offset(), 7);
    }

    #[test]
    fn sentinel_newline_is_appended() {
        let buffer = TextBuffer::from_string("1".to_string());
        assert_eq!(buffer.remaining_text(), "1\n");
    }
}
