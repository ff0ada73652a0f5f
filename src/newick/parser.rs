//! Structs and logic to parse Newick strings.
//!
//! This module provides the [NewickParser] struct, which offers methods
//! to parse files or single strings, as well as lazy parsing via a
//! [NewickIterator].
//!
//! The parser is a small state machine over the structural characters
//! `(`, `,`, `)`, `:` and `;`. Everything else at a node position is read as
//! a name. Each transition is reported to a [TreeBuilder].

use crate::config::NewickConfig;
use crate::model::phylogeny::Phylogeny;
use crate::model::tree_builder::{PhylogenyBuilder, TreeBuilder};
use crate::newick::defs::{
    COLON, COMMA, DBLQUOTE, EDGE_LENGTH_DELIMITERS, LPAREN, NAME_END_AFTER_QUOTE, NEED_QUOTE_FOR, QUOTE,
    RBRACKET, RPAREN, SEMICOLON, UNDERSCORE,
};
use crate::parser::byte_parser::{ByteParser, CommentStyle};
use crate::parser::byte_source::ByteSource;
use crate::parser::parsing_error::{ParsingError, ParsingErrorType};

/// Where the state machine stands relative to the current node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParsingState {
    /// Nothing of the current node has been read yet
    BeforeNode,
    /// The child list of the current node was closed, a name may follow
    WithinNode,
    /// The edge length of the current node was read
    AfterNode,
    /// The terminating `;` was read
    ParseEnd,
}

// =#========================================================================#=
// NEWICK PARSER
// =#========================================================================$=
/// Parser (configuration) for Newick trees of arbitrary degree.
///
/// Generic over [TreeBuilder] (construction).
///
/// # Construction
/// * [`new(tree_builder)`](Self::new) - generic constructor
/// * [`default()`](Self::default) - builds [Phylogeny] trees
/// * [`from_config(config)`](NewickParser::from_config)
///
/// # Configuration
/// * [`with_nested_comments(bool)`](Self::with_nested_comments)
///     - `[a [b] c]` is one comment instead of `[a [b]` followed by ` c]`
/// * [`with_hashmark_comments(bool)`](Self::with_hashmark_comments)
///     - `#` comments out the rest of the line (on by default)
/// * [`with_relaxed_names(bool)`](Self::with_relaxed_names)
///     - Tolerates stray quotes inside quoted names and nodes named twice
///
/// # Parsing
/// * [`parse_tree`](Self::parse_tree) - Parse single tree
/// * [`parse_all`](Self::parse_all) - Parse all trees eagerly
/// * [`into_iter`](Self::into_iter) - Parse trees lazily
///
/// # Example
/// ```
/// use phylocount::model::IndexedTree;
/// use phylocount::newick::NewickParser;
/// use phylocount::parser::byte_parser::ByteParser;
///
/// let input = "((A_meleagrides:1.0,A_vulturinum:1.0):0.5,(N_meleagris:1.0,G_plumifera:1.0):0.5);";
/// let mut byte_parser = ByteParser::for_str(input);
/// let mut newick_parser = NewickParser::default();
///
/// let tree = newick_parser.parse_tree(&mut byte_parser).unwrap();
/// assert_eq!(tree.num_leaves(), 4);
/// assert_eq!(tree.name(0), Some("A meleagrides"));
/// ```
#[derive(Debug)]
pub struct NewickParser<T: TreeBuilder> {
    tree_builder: T,
    comments: CommentStyle,
    relaxed_names: bool,
}

// ============================================================================
// Construction & Configuration, Deconstruction (pub)
// ============================================================================
impl<T: TreeBuilder> NewickParser<T> {
    /// Creates a new [NewickParser] with the given tree builder,
    /// `#` comments and relaxed names.
    pub fn new(tree_builder: T) -> Self {
        Self {
            tree_builder,
            comments: CommentStyle::default(),
            relaxed_names: true,
        }
    }

    /// Configures whether `[...]` comments nest.
    pub fn with_nested_comments(mut self, nested: bool) -> Self {
        self.comments.nested = nested;
        self
    }

    /// Configures whether `#` starts a comment running to the end of the line.
    pub fn with_hashmark_comments(mut self, hashmark: bool) -> Self {
        self.comments.hashmark = hashmark;
        self
    }

    /// Configures relaxed name handling.
    ///
    /// In relaxed mode, a quote inside a quoted name only ends the name if
    /// followed by whitespace, EOF or one of `():;,`; otherwise it is kept as
    /// a literal quote. A node named twice gets both names joined instead of
    /// failing.
    pub fn with_relaxed_names(mut self, relaxed: bool) -> Self {
        self.relaxed_names = relaxed;
        self
    }
}

impl NewickParser<PhylogenyBuilder> {
    /// Creates a new [NewickParser] for [Phylogeny] configured from the
    /// `[newick]` section of the configuration.
    pub fn from_config(config: &NewickConfig) -> Self {
        Self::default()
            .with_nested_comments(config.nested_comments)
            .with_hashmark_comments(config.hashmark_comments)
            .with_relaxed_names(config.relaxed_names)
    }

    /// Parses exactly one tree from a string.
    ///
    /// Trailing whitespace and comments after the `;` are ignored.
    pub fn parse_str(&mut self, newick: &str) -> Result<Phylogeny, ParsingError> {
        let mut byte_parser = ByteParser::for_str(newick);
        byte_parser.skip_comment_and_whitespace(self.comments)?;
        self.parse_tree(&mut byte_parser)
    }
}

impl Default for NewickParser<PhylogenyBuilder> {
    fn default() -> Self {
        Self::new(PhylogenyBuilder::new())
    }
}

// ============================================================================
// API Parsing (pub)
// ============================================================================
impl<T: TreeBuilder> NewickParser<T> {
    /// Consumes the parser and returns an iterator over trees from the byte source.
    ///
    /// The parser can be retrieved again via [NewickIterator::into_parser].
    ///
    /// # Arguments
    /// * `byte_parser` - A byte parser with underlying source containing only
    ///   Newick strings, except for whitespace and comments.
    pub fn into_iter<B: ByteSource>(self, byte_parser: ByteParser<B>) -> NewickIterator<B, T> {
        NewickIterator {
            byte_parser,
            parser: self,
            done: false,
        }
    }

    /// Parses all Newick trees from the byte source until EOF.
    ///
    /// # Returns
    /// * `Ok(Vec<T::Tree>)` - All parsed trees
    /// * `Err(ParsingError)` - If any tree fails to parse
    pub fn parse_all<B: ByteSource>(
        &mut self,
        mut byte_parser: ByteParser<B>,
    ) -> Result<Vec<T::Tree>, ParsingError> {
        let mut trees = Vec::new();
        loop {
            byte_parser.skip_comment_and_whitespace(self.comments)?;
            if byte_parser.is_eof() {
                byte_parser.check_stream()?;
                break;
            }
            trees.push(self.parse_tree(&mut byte_parser)?);
        }
        Ok(trees)
    }

    /// Parses a single Newick tree from the given [ByteParser].
    ///
    /// Reads up to and including the terminating `;`.
    ///
    /// # Errors
    /// A [ParsingError] whose [code](ParsingError::code) tells what went
    /// wrong, positioned where it went wrong.
    pub fn parse_tree<B: ByteSource>(
        &mut self,
        parser: &mut ByteParser<B>,
    ) -> Result<T::Tree, ParsingError> {
        self.tree_builder.init_next();
        let mut level = 0usize;
        let mut state = ParsingState::BeforeNode;

        loop {
            parser.skip_comment_and_whitespace(self.comments)?;
            let Some(c) = parser.peek() else {
                break;
            };

            match c {
                LPAREN => {
                    if state != ParsingState::BeforeNode {
                        return Err(ParsingError::from_parser(ParsingErrorType::UnexpectedOpenParen, parser));
                    }
                    parser.next_byte();
                    self.tree_builder.start_children();
                    level += 1;
                }
                COMMA => {
                    if level == 0 {
                        return Err(ParsingError::from_parser(ParsingErrorType::CommaAtRootLevel, parser));
                    }
                    if state == ParsingState::ParseEnd {
                        return Err(ParsingError::from_parser(ParsingErrorType::UnexpectedComma, parser));
                    }
                    parser.next_byte();
                    self.tree_builder.next_child();
                    state = ParsingState::BeforeNode;
                }
                RPAREN => {
                    if level == 0 {
                        return Err(ParsingError::from_parser(ParsingErrorType::TooManyCloseParens, parser));
                    }
                    if state == ParsingState::ParseEnd {
                        return Err(ParsingError::from_parser(ParsingErrorType::UnexpectedCloseParen, parser));
                    }
                    parser.next_byte();
                    level -= 1;
                    self.tree_builder.end_children();
                    state = ParsingState::WithinNode;
                }
                COLON => {
                    if !matches!(state, ParsingState::BeforeNode | ParsingState::WithinNode) {
                        return Err(ParsingError::from_parser(ParsingErrorType::UnexpectedColon, parser));
                    }
                    parser.next_byte();
                    let length = self.parse_edge_length(parser)?;
                    self.tree_builder.set_length(length);
                    state = ParsingState::AfterNode;
                }
                SEMICOLON => {
                    if level != 0 {
                        return Err(ParsingError::from_parser(ParsingErrorType::PrematureSemicolon, parser));
                    }
                    parser.next_byte();
                    return self
                        .tree_builder
                        .end_tree()
                        .map_err(|kind| ParsingError::from_parser(kind, parser));
                }
                RBRACKET => {
                    return Err(ParsingError::from_parser(ParsingErrorType::UnmatchedBracket, parser));
                }
                _ => {
                    if !matches!(state, ParsingState::BeforeNode | ParsingState::WithinNode) {
                        return Err(ParsingError::from_parser(ParsingErrorType::UnexpectedName, parser));
                    }
                    let name = self.parse_name(parser);
                    self.tree_builder
                        .set_name(name, self.relaxed_names)
                        .map_err(|kind| ParsingError::from_parser(kind, parser))?;
                    state = ParsingState::WithinNode;
                }
            }
        }

        parser.check_stream()?;
        Err(ParsingError::missing_semicolon(parser))
    }
}

// ============================================================================
// Parsing
// ============================================================================
impl<T: TreeBuilder> NewickParser<T> {
    /// Parses a (possibly quoted) name, expecting the parser at its first byte.
    ///
    /// - Unquoted: read until whitespace or a reserved character,
    ///   `_` becomes a space
    /// - Quoted with `'` or `"`: a doubled quote is a literal quote
    fn parse_name<B: ByteSource>(&self, parser: &mut ByteParser<B>) -> String {
        let mut bytes = Vec::new();

        match parser.peek() {
            Some(quote @ (QUOTE | DBLQUOTE)) => {
                parser.next_byte();
                while let Some(b) = parser.next_byte() {
                    if b != quote {
                        bytes.push(b);
                        continue;
                    }
                    match parser.peek() {
                        Some(next) if next == quote => {
                            parser.next_byte();
                            bytes.push(quote);
                        }
                        Some(next) if self.relaxed_names && !ends_name_after_quote(next) => {
                            bytes.push(quote);
                        }
                        _ => break,
                    }
                }
            }
            _ => {
                while let Some(b) = parser.peek() {
                    if b.is_ascii_whitespace() || NEED_QUOTE_FOR.contains(&b) {
                        break;
                    }
                    parser.next_byte();
                    bytes.push(if b == UNDERSCORE { b' ' } else { b });
                }
            }
        }

        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Parses the edge length following a `:`.
    ///
    /// An empty length is 0; `NaN`, `Inf`, `+Inf` and `-Inf` are accepted
    /// as literals.
    fn parse_edge_length<B: ByteSource>(&self, parser: &mut ByteParser<B>) -> Result<f64, ParsingError> {
        parser.skip_comment_and_whitespace(self.comments)?;

        let mut bytes = Vec::new();
        while let Some(b) = parser.peek() {
            if b.is_ascii_whitespace() || EDGE_LENGTH_DELIMITERS.contains(&b) {
                break;
            }
            bytes.push(b);
            parser.next_byte();
        }

        let text = String::from_utf8_lossy(&bytes);
        match text.as_ref() {
            "" => Ok(0.0),
            "NaN" => Ok(f64::NAN),
            "Inf" | "+Inf" => Ok(f64::INFINITY),
            "-Inf" => Ok(f64::NEG_INFINITY),
            _ => text
                .parse::<f64>()
                .map_err(|_| ParsingError::invalid_edge_length(parser, text.to_string())),
        }
    }
}

/// Whether a stray quote followed by `next` closes a name in relaxed mode.
fn ends_name_after_quote(next: u8) -> bool {
    next.is_ascii_whitespace() || NAME_END_AFTER_QUOTE.contains(&next)
}

// =#========================================================================#=
// NEWICK ITERATOR (lazy parser)
// =#========================================================================$=
/// Iterator to parse Newick trees.
///
/// Created by [NewickParser::into_iter()].
/// Yields `Result<T::Tree, ParsingError>` for each tree and stops after
/// the first error.
pub struct NewickIterator<B, T>
where
    B: ByteSource,
    T: TreeBuilder,
{
    parser: NewickParser<T>,
    byte_parser: ByteParser<B>,
    done: bool,
}

impl<B, T> NewickIterator<B, T>
where
    B: ByteSource,
    T: TreeBuilder,
{
    /// Consumes the iterator and returns the underlying [NewickParser].
    pub fn into_parser(self) -> NewickParser<T> {
        self.parser
    }
}

impl<B, T> Iterator for NewickIterator<B, T>
where
    B: ByteSource,
    T: TreeBuilder,
{
    type Item = Result<T::Tree, ParsingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        // Skip to the next tree, stop quietly at EOF
        let comments = self.parser.comments;
        if let Err(e) = self.byte_parser.skip_comment_and_whitespace(comments) {
            self.done = true;
            return Some(Err(e));
        }
        if self.byte_parser.is_eof() {
            self.done = true;
            return self.byte_parser.check_stream().err().map(Err);
        }

        let result = self.parser.parse_tree(&mut self.byte_parser);
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IndexedTree;

    fn parse(input: &str) -> Result<Phylogeny, ParsingError> {
        NewickParser::default().parse_str(input)
    }

    fn code_of(input: &str) -> u32 {
        parse(input).unwrap_err().code()
    }

    fn strict_code_of(input: &str) -> u32 {
        let mut parser = NewickParser::default().with_relaxed_names(false);
        parser.parse_str(input).unwrap_err().code()
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(code_of("(A,B)(C);"), 1);
        assert_eq!(code_of("A,B;"), 2);
        assert_eq!(code_of("(A,B));"), 4);
        assert_eq!(code_of("(A,B)[open;"), 6);
        assert_eq!(code_of("(A:1 :2,B);"), 7);
        assert_eq!(code_of("((A,B);"), 8);
        assert_eq!(strict_code_of("(A B,C);"), 9);
        assert_eq!(code_of("(A:1 B,C);"), 10);
        assert_eq!(code_of("(A,B)"), 11);
        assert_eq!(code_of("(A,);"), 12);
        assert_eq!(code_of("(A,B]);"), 13);
        assert_eq!(code_of("(A:x,B);"), 99);
        assert_eq!(code_of("(A:1:2,B);"), 99);
    }

    #[test]
    fn test_quoted_names() {
        let tree = parse("('it''s',\"say \"\"hi\"\"\",'a_b');").unwrap();
        assert_eq!(tree.name(0), Some("it's"));
        assert_eq!(tree.name(1), Some("say \"hi\""));
        assert_eq!(tree.name(2), Some("a_b"));
    }

    #[test]
    fn test_relaxed_stray_quote() {
        let tree = parse("('O'Brien',B);").unwrap();
        assert_eq!(tree.name(0), Some("O'Brien"));

        // Strict mode ends the name at the stray quote, leaving `Brien` as a
        // second name for the same node
        assert_eq!(strict_code_of("('O'Brien',B);"), 9);
    }

    #[test]
    fn test_relaxed_joins_double_names() {
        let tree = parse("(A B,C);").unwrap();
        assert_eq!(tree.name(0), Some("A && B"));
    }

    #[test]
    fn test_edge_length_literals() {
        let tree = parse("(A:NaN,B:Inf,C:-Inf,D:,E:+Inf);").unwrap();
        assert!(tree.length(0).is_nan());
        assert_eq!(tree.length(1), f64::INFINITY);
        assert_eq!(tree.length(2), f64::NEG_INFINITY);
        assert_eq!(tree.length(3), 0.0);
        assert_eq!(tree.length(4), f64::INFINITY);
    }

    #[test]
    fn test_comments_between_tokens() {
        let tree = parse("[head]( A[x]:[y] 1.5 [z], B # tail\n );").unwrap();
        assert_eq!(tree.num_leaves(), 2);
        assert_eq!(tree.length(0), 1.5);
    }

    #[test]
    fn test_hashmark_off_keeps_hash_in_names() {
        let mut parser = NewickParser::default().with_hashmark_comments(false);
        let tree = parser.parse_str("(A#1,B);").unwrap();
        assert_eq!(tree.name(0), Some("A#1"));
    }

    #[test]
    fn test_nested_comments() {
        let mut parser = NewickParser::default().with_nested_comments(true);
        let tree = parser.parse_str("(A[a [b] c],B);").unwrap();
        assert_eq!(tree.num_leaves(), 2);

        // Without nesting, ` c]` is left over
        assert_eq!(strict_code_of("(A[a [b] c],B);"), 9);
        assert_eq!(code_of("(A[a [b] c],B);"), 13);
    }

    #[test]
    fn test_iterator_yields_all_trees() {
        let input = "(A,B);\n[between]\n(C,(D,E));\n";
        let parser = NewickParser::default();
        let trees: Vec<_> = parser
            .into_iter(ByteParser::for_str(input))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(trees.len(), 2);
        assert_eq!(trees[1].num_leaves(), 3);
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let parser = NewickParser::default();
        let mut iter = parser.into_iter(ByteParser::for_str("(A,B);(C,D;(E,F);"));
        assert!(iter.next().unwrap().is_ok());
        assert!(iter.next().unwrap().is_err());
        assert!(iter.next().is_none());
    }
}
