use crate::position::{LineMap, Position};
use crate::span::Span;

#[test]
fn test_line_map_simple() {
    let source = "line1\nline2\nline3";
    let map = LineMap::build(source);

    assert_eq!(map.line_count(), 3);
    assert_eq!(map.offset_to_position(0, source), Position::new(0, 0));
    assert_eq!(map.offset_to_position(4, source), Position::new(0, 4));
    assert_eq!(map.offset_to_position(6, source), Position::new(1, 0));
    assert_eq!(map.offset_to_position(12, source), Position::new(2, 0));
}

#[test]
fn test_line_map_mixed_line_endings() {
    let source = "a\r\nb\rc\nd";
    let map = LineMap::build(source);

    assert_eq!(map.line_count(), 4);
    assert_eq!(map.line_start(1), Some(3));
    assert_eq!(map.line_start(2), Some(5));
    assert_eq!(map.line_start(3), Some(7));
    assert_eq!(map.offset_to_position(5, source), Position::new(2, 0));
}

#[test]
fn test_position_to_offset_roundtrip() {
    let source = "enum E {\n    A = 1,\n    B\n}";
    let map = LineMap::build(source);

    for offset in [0u32, 5, 9, 13, 20, 25] {
        let position = map.offset_to_position(offset, source);
        assert_eq!(map.position_to_offset(position, source), Some(offset));
    }
}

#[test]
fn test_position_to_offset_clamps_to_line_end() {
    let source = "ab\ncd";
    let map = LineMap::build(source);

    assert_eq!(map.position_to_offset(Position::new(0, 40), source), Some(2));
    assert_eq!(map.position_to_offset(Position::new(7, 0), source), None);
}

#[test]
fn test_utf16_columns() {
    // 'é' is two bytes in UTF-8 and one UTF-16 unit; '😀' is four and two.
    let source = "é😀x";
    let map = LineMap::build(source);

    assert_eq!(map.offset_to_position(2, source), Position::new(0, 1));
    assert_eq!(map.offset_to_position(6, source), Position::new(0, 3));
    assert_eq!(map.position_to_offset(Position::new(0, 3), source), Some(6));
}

#[test]
fn test_range_of_span() {
    let source = "x\n  Member = 3";
    let map = LineMap::build(source);
    let range = map.range_of(Span::new(4, 10), source);

    assert_eq!(range.start, Position::new(1, 2));
    assert_eq!(range.end, Position::new(1, 8));
}

#[test]
fn test_span_helpers() {
    let span = Span::new(3, 7);
    assert_eq!(span.len(), 4);
    assert!(span.contains(3));
    assert!(!span.contains(7));
    assert_eq!(span.to(Span::new(1, 4)), Span::new(1, 7));
    assert_eq!(span.text("0123456789"), Some("3456"));
    assert!(Span::at(5).is_empty());
}
