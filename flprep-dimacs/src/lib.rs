//! Strict DIMACS CNF parser and writer for the flprep preprocessor.
//!
//! The parser requires a `p cnf <vars> <clauses>` header before the first clause and checks every
//! literal against the declared variable count and the number of clauses against the declared
//! clause count.

use std::{borrow::Borrow, io};

use flprep_formula::{CnfFormula, Lit, Var};

use anyhow::Error;
use thiserror::Error;

/// Possible errors while parsing a DIMACS CNF formula.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("line {line}: Unexpected character in DIMACS CNF input: '{unexpected}'")]
    UnexpectedInput { line: usize, unexpected: char },
    #[error("line {line}: Expected 'c' or 'p' before the first clause")]
    MissingHeader { line: usize },
    #[error("line {line}: Invalid header syntax: {header}")]
    InvalidHeader { line: usize, header: String },
    #[error("line {line}: Literal exceeds the variable count {var_count} given in the header")]
    LiteralTooLarge { line: usize, var_count: usize },
    #[error("line {line}: Zero after '-'")]
    NegatedZero { line: usize },
    #[error("line {line}: Unterminated clause")]
    UnterminatedClause { line: usize },
    #[error("line {line}: More than the {header_clause_count} clauses given in the header")]
    TooManyClauses {
        line: usize,
        header_clause_count: usize,
    },
    #[error("Formula has {clause_count} clauses while the header specifies {header_clause_count} clauses")]
    ClauseCount {
        clause_count: usize,
        header_clause_count: usize,
    },
    #[error("Parser invoked after a previous error")]
    PreviousError,
}

/// Variable and clause count of a DIMACS CNF header.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DimacsHeader {
    pub var_count: usize,
    pub clause_count: usize,
}

/// Parser for DIMACS CNF files.
///
/// Input can be fed in arbitrary chunks, a chunk may end in the middle of a literal or header.
pub struct DimacsParser {
    formula: CnfFormula,
    partial_clause: Vec<Lit>,
    header: Option<DimacsHeader>,

    line_number: usize,
    clause_count: usize,
    partial_lit: usize,
    negate_next_lit: bool,

    in_lit: bool,
    in_comment_or_header: bool,
    in_header: bool,
    start_of_line: bool,
    error: bool,

    header_line: Vec<u8>,
}

impl Default for DimacsParser {
    fn default() -> DimacsParser {
        DimacsParser::new()
    }
}

impl DimacsParser {
    pub fn new() -> DimacsParser {
        DimacsParser {
            formula: CnfFormula::new(),
            partial_clause: vec![],
            header: None,

            line_number: 1,
            clause_count: 0,
            partial_lit: 0,
            negate_next_lit: false,

            in_lit: false,
            in_comment_or_header: false,
            in_header: false,
            start_of_line: true,
            error: false,

            header_line: vec![],
        }
    }

    /// Parse a complete input and check it against its header.
    ///
    /// The variable count of the returned formula is the one declared in the header, even when
    /// some variables do not occur.
    pub fn parse(input: impl io::Read) -> Result<CnfFormula, Error> {
        use io::BufRead;

        let mut buffer = io::BufReader::new(input);
        let mut parser = Self::new();

        loop {
            let data = buffer.fill_buf()?;
            if data.is_empty() {
                break;
            }
            parser.parse_chunk(data)?;
            let len = data.len();
            buffer.consume(len);
        }
        parser.eof()?;
        parser.check_header()?;

        Ok(parser.into_formula())
    }

    /// Parse a chunk of input.
    ///
    /// After the last chunk call [`eof`](DimacsParser::eof). Once an error was returned, all
    /// further calls fail with [`ParserError::PreviousError`].
    pub fn parse_chunk(&mut self, chunk: &[u8]) -> Result<(), ParserError> {
        if self.error {
            return Err(ParserError::PreviousError);
        }
        for &byte in chunk.iter() {
            if byte == b'\n' {
                self.line_number += 1;
            }
            match byte {
                b'\n' | b'\r' if self.in_comment_or_header => {
                    if self.in_header {
                        self.in_header = false;
                        self.parse_header_line()?;
                    }
                    self.in_comment_or_header = false;
                    self.start_of_line = true
                }
                _ if self.in_comment_or_header => {
                    if self.in_header {
                        self.header_line.push(byte);
                    }
                }
                b'0'..=b'9' => {
                    let var_count = self.declared_var_count()?;
                    self.in_lit = true;
                    self.partial_lit = self.partial_lit * 10 + (byte - b'0') as usize;

                    // var_count is bounded by Var::max_count(), so this check also rules out
                    // overflowing partial_lit.
                    if self.partial_lit > var_count {
                        return self.fail(ParserError::LiteralTooLarge {
                            line: self.line_number,
                            var_count,
                        });
                    }

                    self.start_of_line = false
                }
                b'-' if !self.negate_next_lit && !self.in_lit => {
                    self.declared_var_count()?;
                    self.negate_next_lit = true;
                    self.start_of_line = false
                }
                b' ' | b'\t' | b'\n' | b'\r' if !self.negate_next_lit || self.in_lit => {
                    self.finish_literal()?;
                    self.start_of_line = byte == b'\n' || byte == b'\r';
                }
                b'c' if self.start_of_line => {
                    self.in_comment_or_header = true;
                }
                b'p' if self.start_of_line && self.header.is_none() => {
                    self.in_comment_or_header = true;
                    self.in_header = true;
                    self.header_line.push(b'p');
                }
                _ => {
                    return self.fail(ParserError::UnexpectedInput {
                        line: self.line_number,
                        unexpected: byte as char,
                    });
                }
            }
        }

        Ok(())
    }

    /// Finish parsing the input.
    ///
    /// Does not compare the clause count against the header, see
    /// [`check_header`](DimacsParser::check_header).
    pub fn eof(&mut self) -> Result<(), ParserError> {
        if self.error {
            return Err(ParserError::PreviousError);
        }

        if self.in_header {
            self.in_header = false;
            self.parse_header_line()?;
        }

        self.finish_literal()?;

        if self.negate_next_lit || !self.partial_clause.is_empty() {
            return self.fail(ParserError::UnterminatedClause {
                line: self.line_number,
            });
        }

        if self.header.is_none() {
            return self.fail(ParserError::MissingHeader {
                line: self.line_number,
            });
        }

        Ok(())
    }

    /// Verifies that the number of parsed clauses matches the header.
    pub fn check_header(&self) -> Result<(), ParserError> {
        if let Some(header) = self.header {
            if self.clause_count != header.clause_count {
                return Err(ParserError::ClauseCount {
                    clause_count: self.clause_count,
                    header_clause_count: header.clause_count,
                });
            }
        }

        Ok(())
    }

    /// The parsed header, if one was seen yet.
    pub fn header(&self) -> Option<DimacsHeader> {
        self.header
    }

    /// Number of clauses parsed so far.
    pub fn clause_count(&self) -> usize {
        self.clause_count
    }

    /// The parsed formula.
    pub fn into_formula(self) -> CnfFormula {
        self.formula
    }

    fn declared_var_count(&mut self) -> Result<usize, ParserError> {
        match self.header {
            Some(header) => Ok(header.var_count),
            None => self.fail(ParserError::MissingHeader {
                line: self.line_number,
            }),
        }
    }

    fn finish_literal(&mut self) -> Result<(), ParserError> {
        if self.in_lit {
            if self.partial_lit == 0 {
                if self.negate_next_lit {
                    return self.fail(ParserError::NegatedZero {
                        line: self.line_number,
                    });
                }
                if let Some(header) = self.header {
                    if self.clause_count == header.clause_count {
                        return self.fail(ParserError::TooManyClauses {
                            line: self.line_number,
                            header_clause_count: header.clause_count,
                        });
                    }
                }
                self.formula.add_clause(&self.partial_clause);
                self.partial_clause.clear();
                self.clause_count += 1;
            } else {
                self.partial_clause
                    .push(Var::from_dimacs(self.partial_lit as isize).lit(!self.negate_next_lit));
            }
        }
        self.negate_next_lit = false;
        self.in_lit = false;
        self.partial_lit = 0;
        Ok(())
    }

    fn parse_header_line(&mut self) -> Result<(), ParserError> {
        let header_line = String::from_utf8_lossy(&self.header_line).into_owned();
        self.header_line.clear();

        let mut header_values = header_line.split_whitespace();

        if header_values.next() != Some("p") || header_values.next() != Some("cnf") {
            return self.invalid_header(header_line);
        }

        let mut counts = [0usize; 2];
        for count in counts.iter_mut() {
            *count = match header_values
                .next()
                .and_then(|value| str::parse(value).ok())
            {
                None => return self.invalid_header(header_line),
                Some(value) => value,
            };
        }
        let [var_count, clause_count] = counts;

        if header_values.next().is_some() || var_count > Var::max_count() {
            return self.invalid_header(header_line);
        }

        self.header = Some(DimacsHeader {
            var_count,
            clause_count,
        });

        self.formula.set_var_count(var_count);

        Ok(())
    }

    fn invalid_header<T>(&mut self, header_line: String) -> Result<T, ParserError> {
        self.fail(ParserError::InvalidHeader {
            line: self.line_number,
            header: header_line,
        })
    }

    fn fail<T>(&mut self, error: ParserError) -> Result<T, ParserError> {
        self.error = true;
        Err(error)
    }
}

/// Write a DIMACS CNF header.
pub fn write_dimacs_header(target: &mut impl io::Write, header: DimacsHeader) -> io::Result<()> {
    writeln!(
        target,
        "p cnf {var_count} {clause_count}",
        var_count = header.var_count,
        clause_count = header.clause_count
    )
}

/// Write clauses as headerless DIMACS CNF, one zero terminated clause per line.
pub fn write_dimacs_clauses(
    target: &mut impl io::Write,
    clauses: impl IntoIterator<Item = impl IntoIterator<Item = impl Borrow<Lit>>>,
) -> io::Result<()> {
    for clause in clauses.into_iter() {
        for lit in clause.into_iter() {
            itoa::write(&mut *target, lit.borrow().to_dimacs())?;
            target.write_all(b" ")?;
        }
        target.write_all(b"0\n")?;
    }
    Ok(())
}

/// Write a formula as DIMACS CNF, using the formula's variable count for the header.
pub fn write_dimacs(target: &mut impl io::Write, formula: &CnfFormula) -> io::Result<()> {
    write_dimacs_header(
        &mut *target,
        DimacsHeader {
            var_count: formula.var_count(),
            clause_count: formula.len(),
        },
    )?;
    write_dimacs_clauses(&mut *target, formula.iter())
}
