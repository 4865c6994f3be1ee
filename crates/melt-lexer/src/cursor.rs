/// Character cursor over Melt source text.
///
/// Tracks the current byte offset while handing out `char`s, so token spans
/// are always byte ranges into the original UTF-8 string.
pub(crate) struct Cursor<'src> {
    source: &'src str,
    pos: u32,
    chars: std::str::Chars<'src>,
}

impl<'src> Cursor<'src> {
    pub(crate) fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            chars: source.chars(),
        }
    }

    /// The current character, without consuming it.
    pub(crate) fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    /// The character after the current one.
    pub(crate) fn peek_next(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next()
    }

    /// Consume the current character and advance the position.
    pub(crate) fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos += c.len_utf8() as u32;
        Some(c)
    }

    /// Current byte position in the source text.
    pub(crate) fn pos(&self) -> u32 {
        self.pos
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.peek().is_none()
    }

    /// Advance while the predicate holds for the current character.
    pub(crate) fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }
            self.advance();
        }
    }

    /// Source text between two byte offsets previously returned by `pos()`.
    pub(crate) fn slice(&self, start: u32, end: u32) -> &'src str {
        &self.source[start as usize..end as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_tracks_byte_offsets() {
        let mut cursor = Cursor::new("\u{00E9}a");
        assert_eq!(cursor.advance(), Some('\u{00E9}'));
        assert_eq!(cursor.pos(), 2);
        assert_eq!(cursor.advance(), Some('a'));
        assert_eq!(cursor.pos(), 3);
        assert!(cursor.is_eof());
        assert_eq!(cursor.advance(), None);
    }

    #[test]
    fn lookahead_does_not_consume() {
        let cursor = Cursor::new("ab");
        assert_eq!(cursor.peek(), Some('a'));
        assert_eq!(cursor.peek_next(), Some('b'));
        assert_eq!(cursor.pos(), 0);
    }

    #[test]
    fn eat_while_and_slice() {
        let mut cursor = Cursor::new("    record");
        cursor.eat_while(|c| c == ' ');
        assert_eq!(cursor.pos(), 4);
        assert_eq!(cursor.slice(4, 10), "record");
    }
}
