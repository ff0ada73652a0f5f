//! Constants for parsing and writing Newick strings.

/// Opens a child list
pub(crate) const LPAREN: u8 = b'(';
/// Closes a child list
pub(crate) const RPAREN: u8 = b')';
/// Separates siblings
pub(crate) const COMMA: u8 = b',';
/// Starts an edge length
pub(crate) const COLON: u8 = b':';
/// Terminates a tree
pub(crate) const SEMICOLON: u8 = b';';
/// Closes a comment; comments are opened by `[`
pub(crate) const RBRACKET: u8 = b']';
/// Quotes a name
pub(crate) const QUOTE: u8 = b'\'';
/// Alternative quote for names
pub(crate) const DBLQUOTE: u8 = b'"';
/// Stands for a space in unquoted names
pub(crate) const UNDERSCORE: u8 = b'_';

/// Characters that cannot appear in unquoted names (besides whitespace)
pub(crate) const NEED_QUOTE_FOR: &[u8] = b"'(),;:[]";

/// Characters that parse fine inside a name but are quoted when writing,
/// since they would open a quote, start a `#` comment or become a space
pub(crate) const QUOTE_WHEN_WRITING: &[u8] = b"\"#_";

/// Characters ending an edge length (besides whitespace)
pub(crate) const EDGE_LENGTH_DELIMITERS: &[u8] = b",);[";

/// Characters that end a name after a stray quote in relaxed mode
/// (besides whitespace and EOF)
pub(crate) const NAME_END_AFTER_QUOTE: &[u8] = b"():;,";
