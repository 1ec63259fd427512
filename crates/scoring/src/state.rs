//! Checkpoint state text
//!
//! State is a flat sequence of whitespace-delimited numbers. Each scoring
//! object writes its records in a fixed order and reads them back in the same
//! order, so one reader is shared by every object restoring from a file.

// standard library
use std::io::Write;

// crate modules
use crate::error::{Error, Result};

// nom parser combinators
use nom::character::complete::{self, multispace0};
use nom::number::complete::double;
use nom::sequence::preceded;
use nom::IResult;

/// Write a float so that it reads back bit-identical
///
/// Uses the shortest representation that round-trips, in exponent form to
/// keep very small or large values compact.
///
/// ```rust
/// # use egstools_scoring::write_float;
/// let mut buffer = Vec::new();
/// write_float(&mut buffer, 0.1).unwrap();
/// assert_eq!(String::from_utf8(buffer).unwrap(), "1e-1");
/// ```
pub fn write_float<W: Write + ?Sized>(writer: &mut W, value: f64) -> Result<()> {
    write!(writer, "{value:e}")?;
    Ok(())
}

/// Token reader over checkpoint state text
///
/// ```rust
/// # use egstools_scoring::StateReader;
/// let mut reader = StateReader::new("3 1000\n  -1 2.5e-3 ");
///
/// assert_eq!(reader.read_usize().unwrap(), 3);
/// assert_eq!(reader.read_u64().unwrap(), 1000);
/// assert_eq!(reader.read_i64().unwrap(), -1);
/// assert_eq!(reader.read_f64().unwrap(), 2.5e-3);
/// assert!(reader.is_exhausted());
/// ```
#[derive(Debug, Clone)]
pub struct StateReader<'a> {
    remaining: &'a str,
}

impl<'a> StateReader<'a> {
    /// Start reading from the beginning of `text`
    pub fn new(text: &'a str) -> Self {
        Self { remaining: text }
    }

    /// Read the next token as a float
    pub fn read_f64(&mut self) -> Result<f64> {
        self.next_token(float_token, "a float")
    }

    /// Read the next token as an unsigned 64-bit integer
    pub fn read_u64(&mut self) -> Result<u64> {
        self.next_token(preceded(multispace0, complete::u64), "an unsigned integer")
    }

    /// Read the next token as a signed 64-bit integer
    pub fn read_i64(&mut self) -> Result<i64> {
        self.next_token(preceded(multispace0, complete::i64), "a signed integer")
    }

    /// Read the next token as a count or index
    pub fn read_usize(&mut self) -> Result<usize> {
        let value = self.read_u64()?;
        usize::try_from(value).map_err(|_| Error::ParseError {
            expected: "an index",
            found: value.to_string(),
        })
    }

    /// True once only whitespace is left
    pub fn is_exhausted(&self) -> bool {
        self.remaining.trim().is_empty()
    }

    /// Text that has not been consumed yet
    pub fn remaining(&self) -> &'a str {
        self.remaining
    }

    fn next_token<T, P>(&mut self, mut parser: P, expected: &'static str) -> Result<T>
    where
        P: FnMut(&'a str) -> IResult<&'a str, T>,
    {
        if self.is_exhausted() {
            return Err(Error::EndOfState(expected));
        }

        match parser(self.remaining) {
            // a number must be followed by whitespace or the end of the text
            Ok((rest, value)) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
                self.remaining = rest;
                Ok(value)
            }
            _ => Err(Error::ParseError {
                expected,
                found: first_token(self.remaining).to_string(),
            }),
        }
    }
}

/// Float in any form `write_float` may produce, including `inf` and `NaN`
fn float_token(i: &str) -> IResult<&str, f64> {
    preceded(multispace0, double)(i)
}

fn first_token(i: &str) -> &str {
    i.split_whitespace().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0)]
    #[case(-0.0)]
    #[case(1.0 / 3.0)]
    #[case(6.02214076e23)]
    #[case(4.9e-324)]
    #[case(f64::MAX)]
    #[case(f64::INFINITY)]
    fn floats_read_back_exactly(#[case] value: f64) {
        let mut buffer = Vec::new();
        write_float(&mut buffer, value).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let mut reader = StateReader::new(&text);
        assert_eq!(reader.read_f64().unwrap().to_bits(), value.to_bits());
    }

    #[test]
    fn end_of_state() {
        let mut reader = StateReader::new("12  \n ");
        assert_eq!(reader.read_u64().unwrap(), 12);
        assert!(matches!(reader.read_f64(), Err(Error::EndOfState(_))));
    }

    #[rstest]
    #[case("abc 1")]
    #[case("1.5 2")]
    #[case("-4")]
    #[case("12abc")]
    fn invalid_unsigned(#[case] text: &str) {
        let mut reader = StateReader::new(text);
        assert!(matches!(reader.read_u64(), Err(Error::ParseError { .. })));
    }

    #[test]
    fn failed_reads_do_not_advance() {
        let mut reader = StateReader::new("x 7");
        assert!(reader.read_i64().is_err());
        assert_eq!(reader.remaining(), "x 7");
    }
}
