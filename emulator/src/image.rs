//! Program images.
//!
//! An image is a flat byte sequence loaded at address 0. It either comes verbatim from a binary
//! file, or from a hex listing:
//!
//! ```text
//! ; comments start with `;` or `#`
//! 05 ff 0a        ; bytes, with or without a `0x` prefix
//! @20 0x01, 0x80  ; `@` moves the load cursor
//! ```
//!
//! Bytes that are never written are zero.

#![allow(
    unused_assignments,
    reason = "Looks like miette error derive generates this"
)]

use std::str::FromStr;

use miette::{Diagnostic, SourceSpan};
use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while1},
    character::complete::{char, multispace1, not_line_ending, one_of},
    combinator::{map, map_res, recognize, value},
    multi::many0_count,
    sequence::{pair, preceded},
    IResult, Offset,
};
use thiserror::Error;
use tracing::debug;

use crate::constants::{Address, Word, MEMORY_SIZE};
use crate::runtime::{Memory, MemoryError};

#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ImageError {
    #[error("image of {len} bytes is larger than the memory ({} bytes)", MEMORY_SIZE)]
    TooLarge { len: usize },

    #[error("invalid syntax")]
    #[diagnostic(help("expected a byte like `ff` or `0x1f`, or an origin like `@20`"))]
    Syntax {
        #[label("here")]
        span: SourceSpan,
    },

    #[error("program does not fit in memory")]
    Overflow {
        #[label("this byte would land past the last address")]
        span: SourceSpan,
    },
}

/// A program, ready to be loaded in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    bytes: Vec<Word>,
}

impl Image {
    /// Wrap a raw byte sequence
    ///
    /// # Errors
    ///
    /// Fails if the sequence is larger than the memory
    pub fn from_bytes(bytes: Vec<Word>) -> Result<Self, ImageError> {
        if bytes.len() > MEMORY_SIZE {
            return Err(ImageError::TooLarge { len: bytes.len() });
        }

        Ok(Self { bytes })
    }

    /// Parse a hex listing
    ///
    /// # Errors
    ///
    /// Fails on invalid syntax, or if a byte would land past the end of memory
    #[tracing::instrument(skip(source))]
    pub fn parse_hex(source: &str) -> Result<Self, ImageError> {
        let mut bytes = Vec::new();
        let mut cursor = 0;

        let mut rest = skip_separators(source);
        while !rest.is_empty() {
            let start = source.offset(rest);
            let (next, item) = parse_item(rest).map_err(|_| ImageError::Syntax {
                span: (start, token_len(rest)).into(),
            })?;
            let span: SourceSpan = (start, rest.offset(next)).into();

            match item {
                Item::Origin(address) => {
                    debug!(address, "Moving load cursor");
                    cursor = usize::from(address);
                }
                Item::Byte(byte) => {
                    if cursor >= MEMORY_SIZE {
                        return Err(ImageError::Overflow { span });
                    }

                    if bytes.len() <= cursor {
                        bytes.resize(cursor + 1, 0);
                    }
                    bytes[cursor] = byte;
                    cursor += 1;
                }
            }

            rest = skip_separators(next);
        }

        debug!(len = bytes.len(), "Parsed hex image");
        Ok(Self { bytes })
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[Word] {
        &self.bytes
    }

    /// The image without its trailing zero padding
    #[must_use]
    pub fn code(&self) -> &[Word] {
        let end = self
            .bytes
            .iter()
            .rposition(|&byte| byte != 0)
            .map_or(0, |last| last + 1);
        &self.bytes[..end]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// A fresh memory bank with the image at address 0
    ///
    /// # Errors
    ///
    /// Never fails for an image built by this module, as they always fit
    pub fn to_memory(&self) -> Result<Memory, MemoryError> {
        Memory::with_image(&self.bytes)
    }
}

impl FromStr for Image {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Item {
    Origin(Address),
    Byte(Word),
}

fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

/// Parse a byte, with an optional `0x` prefix
fn parse_byte(input: &str) -> IResult<&str, Word> {
    map_res(
        alt((
            preceded(tag_no_case("0x"), take_while1(is_hex_digit)),
            take_while1(is_hex_digit),
        )),
        |digits: &str| Word::from_str_radix(digits, 16),
    )(input)
}

fn parse_origin(input: &str) -> IResult<&str, Address> {
    preceded(char('@'), parse_byte)(input)
}

fn parse_item(input: &str) -> IResult<&str, Item> {
    alt((
        map(parse_origin, Item::Origin),
        map(parse_byte, Item::Byte),
    ))(input)
}

fn parse_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(one_of(";#"), not_line_ending))(input)
}

fn skip_separators(input: &str) -> &str {
    let res: IResult<&str, ()> = value(
        (),
        many0_count(alt((multispace1, tag(","), parse_comment))),
    )(input);

    // Every branch consumes input, so this never fails
    res.map_or(input, |(rest, ())| rest)
}

/// Length of the token starting the input, to underline it in errors
fn token_len(input: &str) -> usize {
    input
        .find(|c: char| c.is_whitespace() || c == ',')
        .unwrap_or(input.len())
        .max(1)
}
