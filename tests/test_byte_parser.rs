use phylocount::parser::byte_parser::ConsumeMode::{Exclusive, Inclusive};
use phylocount::parser::byte_parser::{ByteParser, CommentStyle, ConsumeMode};

const NESTED: CommentStyle = CommentStyle {
    nested: true,
    hashmark: true,
};

#[test]
fn test_skip_whitespace() {
    let mut parser = ByteParser::for_str(" \r  \t\n \t x y");
    parser.skip_whitespace();
    assert_eq!(parser.peek(), Some(b'x'));

    parser.next_byte(); // skip x
    parser.skip_whitespace();
    assert_eq!(parser.peek(), Some(b'y'));
}

#[test]
fn test_skip_comment() {
    let mut parser = ByteParser::for_str("[Following tree is tiny] ((A:1,B:1):1,C:2)");
    assert!(parser.skip_comment(CommentStyle::default()).unwrap());
    assert_eq!(parser.next_byte(), Some(b' '));
    assert_eq!(parser.next_byte(), Some(b'('));
    assert!(!parser.skip_comment(CommentStyle::default()).unwrap());
}

#[test]
fn test_skip_nested_comment() {
    let mut parser = ByteParser::for_str("[a [b] c]X");
    assert!(parser.skip_comment(NESTED).unwrap());
    assert_eq!(parser.peek(), Some(b'X'));

    let mut parser = ByteParser::for_str("[a [b] c]X");
    assert!(parser.skip_comment(CommentStyle::default()).unwrap());
    assert_eq!(parser.peek(), Some(b' '));
}

#[test]
fn test_hashmark_comment() {
    let mut parser = ByteParser::for_str("# to the end of the line\n(A,B);");
    parser.skip_comment_and_whitespace(CommentStyle::default()).unwrap();
    assert_eq!(parser.peek(), Some(b'('));

    let style = CommentStyle {
        nested: false,
        hashmark: false,
    };
    let mut parser = ByteParser::for_str("#A");
    assert!(!parser.skip_comment(style).unwrap());
    assert_eq!(parser.peek(), Some(b'#'));
}

#[test]
fn test_unclosed_comment() {
    let mut parser = ByteParser::for_str("[never [closed]");
    let err = parser.skip_comment(NESTED).unwrap_err();
    assert_eq!(err.code(), 6);
}

#[test]
fn test_skip_comment_and_whitespace() {
    let mut parser = ByteParser::for_str("[Go] \n[Keep going]   \t ['...']\n[One more to go]  END!");
    parser
        .skip_comment_and_whitespace(CommentStyle::default())
        .expect("Failed to skip comments.");
    assert_eq!(parser.next_byte(), Some(b'E'));
}

#[test]
fn test_consume_if() {
    let mut parser = ByteParser::for_str(";;");
    assert!(parser.consume_if(b';'));
    assert!(!parser.consume_if(b','));
    assert_eq!(parser.position(), 1);
}

#[test]
fn test_consume_until_inclusive() {
    let mut parser = ByteParser::for_str("consume a CAN of beans");
    parser.consume_until(b'C', Inclusive);
    assert_eq!(parser.peek(), Some(b'A'));
    assert_eq!(parser.position(), 11);
}

#[test]
fn test_consume_until_exclusive() {
    let mut parser = ByteParser::for_str("consume a CAN of beans");
    parser.consume_until(b'C', Exclusive);
    assert_eq!(parser.peek(), Some(b'C'));
    assert_eq!(parser.position(), 10);
}

#[test]
fn test_consume_until_any() {
    let mut parser = ByteParser::for_str("yummy! eat Apples\n");
    let targets = [b'B', b'A', b'n', b'a', b'\n', b'@'];
    assert_eq!(parser.consume_until_any(&targets, ConsumeMode::Inclusive), Some(b'a'));
    assert_eq!(parser.position(), 9);
    assert_eq!(parser.consume_until_any(&targets, ConsumeMode::Exclusive), Some(b'A'));
    assert_eq!(parser.position(), 11);

    let mut parser = ByteParser::for_str("leek soup, hmm");
    assert!(parser.consume_until_any(&targets, Inclusive).is_none());
    assert!(parser.is_eof());
}

#[test]
fn test_context() {
    let mut parser = ByteParser::for_str("(A,B);");
    parser.next_byte();
    assert_eq!(parser.get_context_as_string(3), "A,B");
    assert_eq!(parser.position(), 1);
}
