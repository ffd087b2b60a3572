//! Position coordinate mapping
//!
//! tree-sitter reports rows and byte columns into the UTF-8 source, while the
//! Language Server Protocol counts characters in UTF-16 code units. This module
//! converts between the two without ever clamping a forward conversion: a byte
//! column the line cannot hold is an error, so callers drop the span instead of
//! reporting a wrong location.

use thiserror::Error;
use tower_lsp::lsp_types::{Position, Range};

/// Errors produced when a byte coordinate cannot be mapped to an LSP position
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    /// The requested line does not exist in the source
    #[error("line {line} is out of range (source has {line_count} lines)")]
    LineOutOfRange { line: usize, line_count: usize },

    /// The requested byte column is past the end of the line
    #[error("byte column {column} exceeds length {line_len} of line {line}")]
    ColumnOutOfRange {
        line: usize,
        column: usize,
        line_len: usize,
    },

    /// The requested byte column falls inside a multi-byte character
    #[error("byte column {column} on line {line} is not on a character boundary")]
    NotCharBoundary { line: usize, column: usize },

    /// The computed coordinate does not fit the protocol's u32 range
    #[error("coordinate {value} exceeds the u32 range")]
    Overflow { value: usize },
}

pub type PositionResult<T> = Result<T, PositionError>;

fn to_u32(value: usize) -> PositionResult<u32> {
    u32::try_from(value).map_err(|_| PositionError::Overflow { value })
}

fn line_text(source: &str, line: usize) -> PositionResult<&str> {
    source
        .split('\n')
        .nth(line)
        .ok_or_else(|| PositionError::LineOutOfRange {
            line,
            line_count: source.split('\n').count(),
        })
}

/// Convert a (line, byte column) pair into an LSP position.
///
/// The target line is decoded one character at a time, adding that character's
/// UTF-16 length until the byte column is reached. Characters outside the basic
/// multilingual plane take two UTF-16 units even though they are four bytes long.
pub fn position_to_utf16(source: &str, byte_line: usize, byte_column: usize) -> PositionResult<Position> {
    let text = line_text(source, byte_line)?;

    if byte_column > text.len() {
        return Err(PositionError::ColumnOutOfRange {
            line: byte_line,
            column: byte_column,
            line_len: text.len(),
        });
    }

    let mut consumed = 0;
    let mut units = 0;
    for ch in text.chars() {
        if consumed >= byte_column {
            break;
        }
        consumed += ch.len_utf8();
        units += ch.len_utf16();
    }

    if consumed != byte_column {
        return Err(PositionError::NotCharBoundary {
            line: byte_line,
            column: byte_column,
        });
    }

    Ok(Position {
        line: to_u32(byte_line)?,
        character: to_u32(units)?,
    })
}

/// Convert a tree-sitter point into an LSP position
pub fn point_to_position(source: &str, point: tree_sitter::Point) -> PositionResult<Position> {
    position_to_utf16(source, point.row, point.column)
}

/// Convert a byte offset into `source` into an LSP position
pub fn byte_offset_to_position(source: &str, byte_offset: usize) -> PositionResult<Position> {
    let before = source.get(..byte_offset).ok_or_else(|| PositionError::ColumnOutOfRange {
        line: source.matches('\n').count(),
        column: byte_offset,
        line_len: source.len(),
    })?;
    let line = before.matches('\n').count();
    let line_start = before.rfind('\n').map_or(0, |index| index + 1);
    position_to_utf16(source, line, byte_offset - line_start)
}

/// Number of UTF-16 code units needed to encode `text`
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Convert a UTF-16 column within a single line into a byte offset.
///
/// Columns past the end of the line resolve to the line's length, matching the
/// protocol rule that an overlong character offset means "end of line".
pub fn utf16_to_byte_offset(line: &str, utf16_column: usize) -> usize {
    let mut units = 0;
    for (index, ch) in line.char_indices() {
        if units >= utf16_column {
            return index;
        }
        units += ch.len_utf16();
    }
    line.len()
}

/// Convert an LSP position into a byte offset into `source`.
///
/// Returns `None` when the line does not exist.
pub fn position_to_byte_offset(source: &str, position: Position) -> Option<usize> {
    let mut line_start = 0;
    for (index, line) in source.split('\n').enumerate() {
        if index == position.line as usize {
            return Some(line_start + utf16_to_byte_offset(line, position.character as usize));
        }
        line_start += line.len() + 1;
    }
    None
}

/// Snap a client position onto the document.
///
/// Overlong columns move to the end of the line and a column inside a
/// surrogate pair moves past it. Returns `None` when the line does not exist.
pub fn clamp_position(source: &str, position: Position) -> Option<Position> {
    let offset = position_to_byte_offset(source, position)?;
    byte_offset_to_position(source, offset).ok()
}

fn position_le(a: Position, b: Position) -> bool {
    (a.line, a.character) <= (b.line, b.character)
}

/// Check whether two ranges overlap.
///
/// Ranges are half-open, so ranges that merely touch do not intersect. A
/// collapsed range (a cursor) intersects any range that contains it, including
/// its end points, so a cursor placed right before `var(` still selects it.
pub fn ranges_intersect(a: Range, b: Range) -> bool {
    if a.start == a.end {
        return position_le(b.start, a.start) && position_le(a.start, b.end);
    }
    if b.start == b.end {
        return position_le(a.start, b.start) && position_le(b.start, a.end);
    }
    !position_le(a.end, b.start) && !position_le(b.end, a.start)
}

/// Check whether a cursor at `position` is on `range`, end excluded
pub fn range_contains_position(range: Range, position: Position) -> bool {
    position_le(range.start, position) && !position_le(range.end, position)
}

/// Check whether `inner` lies completely within `outer`
pub fn range_contains(outer: Range, inner: Range) -> bool {
    position_le(outer.start, inner.start) && position_le(inner.end, outer.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32, character: u32) -> Position {
        Position { line, character }
    }

    fn range(sl: u32, sc: u32, el: u32, ec: u32) -> Range {
        Range {
            start: pos(sl, sc),
            end: pos(el, ec),
        }
    }

    #[test]
    fn test_ascii_columns_are_unchanged() {
        let source = ".button { color: var(--color); }";
        assert_eq!(position_to_utf16(source, 0, 17).unwrap(), pos(0, 17));
        assert_eq!(position_to_utf16(source, 0, 0).unwrap(), pos(0, 0));
        assert_eq!(position_to_utf16(source, 0, source.len()).unwrap(), pos(0, source.len() as u32));
    }

    #[test]
    fn test_surrogate_pair_shifts_by_one() {
        let plain = "/* ab */ color: var(--x);";
        let emoji = "/* 🎨 */ color: var(--x);";
        let plain_col = plain.find("var").unwrap();
        let emoji_col = emoji.find("var").unwrap();

        let plain_pos = position_to_utf16(plain, 0, plain_col).unwrap();
        let emoji_pos = position_to_utf16(emoji, 0, emoji_col).unwrap();

        // "ab" is two UTF-16 units, the emoji is also two units but four bytes
        assert_eq!(emoji_col, plain_col + 2);
        assert_eq!(plain_pos.character, emoji_pos.character);

        // One surrogate-pair character in place of one BMP character adds exactly one unit
        let single = "/* a */ color: var(--x);";
        let single_pos = position_to_utf16(single, 0, single.find("var").unwrap()).unwrap();
        let with_emoji = "/* 🎨 */ color: var(--x);";
        let with_emoji_pos = position_to_utf16(with_emoji, 0, with_emoji.find("var").unwrap()).unwrap();
        assert_eq!(with_emoji_pos.character, single_pos.character + 1);
    }

    #[test]
    fn test_multibyte_bmp_characters_count_one_unit() {
        let source = "é: var(--x)";
        let column = source.find("var").unwrap();
        assert_eq!(column, 4);
        assert_eq!(position_to_utf16(source, 0, column).unwrap(), pos(0, 3));
    }

    #[test]
    fn test_second_line() {
        let source = "a {\n  🎨 --x: 1;\n}";
        let line = "  🎨 --x: 1;";
        let column = line.find("--x").unwrap();
        assert_eq!(position_to_utf16(source, 1, column).unwrap(), pos(1, 5));
    }

    #[test]
    fn test_column_overflow_is_an_error() {
        let source = "abc\ndef";
        assert_eq!(
            position_to_utf16(source, 0, 4),
            Err(PositionError::ColumnOutOfRange { line: 0, column: 4, line_len: 3 })
        );
    }

    #[test]
    fn test_missing_line_is_an_error() {
        let source = "abc";
        assert!(matches!(
            position_to_utf16(source, 3, 0),
            Err(PositionError::LineOutOfRange { line: 3, .. })
        ));
    }

    #[test]
    fn test_column_inside_character_is_an_error() {
        let source = "🎨x";
        assert_eq!(
            position_to_utf16(source, 0, 2),
            Err(PositionError::NotCharBoundary { line: 0, column: 2 })
        );
    }

    #[test]
    fn test_reverse_conversions() {
        let line = "a🎨b";
        assert_eq!(utf16_len(line), 4);
        assert_eq!(utf16_to_byte_offset(line, 0), 0);
        assert_eq!(utf16_to_byte_offset(line, 1), 1);
        assert_eq!(utf16_to_byte_offset(line, 3), 5);
        assert_eq!(utf16_to_byte_offset(line, 99), line.len());

        let source = "x\na🎨b";
        assert_eq!(position_to_byte_offset(source, pos(1, 3)), Some(7));
        assert_eq!(position_to_byte_offset(source, pos(5, 0)), None);
    }

    #[test]
    fn test_clamp_position() {
        let source = "x\na🎨b";
        assert_eq!(clamp_position(source, pos(1, 99)), Some(pos(1, 4)));
        assert_eq!(clamp_position(source, pos(1, 2)), Some(pos(1, 3)));
        assert_eq!(clamp_position(source, pos(0, 1)), Some(pos(0, 1)));
        assert_eq!(clamp_position(source, pos(2, 0)), None);
    }

    #[test]
    fn test_range_contains_position() {
        let call = range(0, 4, 0, 10);
        assert!(range_contains_position(call, pos(0, 4)));
        assert!(range_contains_position(call, pos(0, 9)));
        assert!(!range_contains_position(call, pos(0, 10)));
        assert!(!range_contains_position(call, pos(0, 3)));
        assert!(range_contains_position(range(0, 4, 2, 0), pos(1, 50)));
    }

    #[test]
    fn test_byte_offset_to_position() {
        let source = "{\n  \"🎨\": {\n    \"x\": 1\n  }\n}";
        let offset = source.find("\"x\"").unwrap();
        assert_eq!(byte_offset_to_position(source, offset).unwrap(), pos(2, 4));

        let offset = source.find(": {").unwrap();
        assert_eq!(byte_offset_to_position(source, offset).unwrap(), pos(1, 6));
        assert!(byte_offset_to_position(source, source.len() + 1).is_err());
    }

    #[test]
    fn test_ranges_intersect() {
        assert!(ranges_intersect(range(0, 0, 0, 5), range(0, 3, 0, 7)));
        assert!(!ranges_intersect(range(0, 0, 0, 5), range(0, 5, 0, 10)));
        assert!(ranges_intersect(range(0, 0, 1, 0), range(0, 5, 0, 10)));
        assert!(!ranges_intersect(range(2, 0, 2, 4), range(0, 0, 1, 9)));
    }

    #[test]
    fn test_cursor_intersects_inclusive() {
        let call = range(1, 4, 1, 20);
        assert!(ranges_intersect(range(1, 4, 1, 4), call));
        assert!(ranges_intersect(range(1, 10, 1, 10), call));
        assert!(ranges_intersect(range(1, 20, 1, 20), call));
        assert!(!ranges_intersect(range(1, 21, 1, 21), call));
        assert!(ranges_intersect(call, range(1, 10, 1, 10)));
    }

    #[test]
    fn test_range_contains() {
        assert!(range_contains(range(0, 0, 0, 30), range(0, 10, 0, 20)));
        assert!(!range_contains(range(0, 10, 0, 20), range(0, 0, 0, 30)));
    }
}
