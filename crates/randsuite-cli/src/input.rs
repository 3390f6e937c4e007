//! Reading a bit sequence from disk.

use std::io::Read;
use std::str::FromStr;

use randsuite_tests::{BitOrder, BitSequence, Error};

use crate::commands::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// ASCII when the file holds only `0`, `1` and whitespace, binary otherwise.
    Auto,
    Ascii,
    /// Raw bytes, unpacked MSB first.
    Binary,
}

impl FromStr for InputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "auto" => Ok(Self::Auto),
            "ascii" => Ok(Self::Ascii),
            "binary" => Ok(Self::Binary),
            other => Err(Error::Configuration(format!(
                "unknown input format '{other}' (expected auto, ascii or binary)"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub format: InputFormat,
    pub reverse: bool,
    /// Leading bits to drop.
    pub offset: usize,
    /// Maximum bits kept after the offset.
    pub limit: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            format: InputFormat::Auto,
            reverse: false,
            offset: 0,
            limit: None,
        }
    }
}

fn looks_like_ascii(data: &[u8]) -> bool {
    data.iter().any(|&b| b == b'0' || b == b'1')
        && data
            .iter()
            .all(|&b| b == b'0' || b == b'1' || b.is_ascii_whitespace())
}

/// Decode raw file contents into a sequence.
pub fn decode(data: &[u8], options: &LoadOptions) -> Result<BitSequence, Error> {
    let ascii = match options.format {
        InputFormat::Auto => looks_like_ascii(data),
        InputFormat::Ascii => true,
        InputFormat::Binary => false,
    };
    let order = if options.reverse {
        BitOrder::Reversed
    } else {
        BitOrder::AsGiven
    };

    let sequence = if ascii {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::InvalidInput(format!("input is not valid text: {e}")))?;
        BitSequence::from_ascii(text, order)?
    } else {
        let sequence = BitSequence::from_bytes(data);
        if order == BitOrder::Reversed {
            let mut bits = sequence.as_slice().to_vec();
            bits.reverse();
            BitSequence::new(bits)?
        } else {
            sequence
        }
    };
    log::debug!(
        "decoded {} bits as {}",
        sequence.len(),
        if ascii { "ascii" } else { "binary" }
    );
    window(sequence, options.offset, options.limit)
}

fn window(sequence: BitSequence, offset: usize, limit: Option<usize>) -> Result<BitSequence, Error> {
    if offset == 0 && limit.is_none_or(|l| l >= sequence.len()) {
        return Ok(sequence);
    }
    let n = sequence.len();
    if offset > n {
        return Err(Error::Configuration(format!(
            "offset {offset} is past the end of a {n}-bit sequence"
        )));
    }
    let end = limit.map_or(n, |l| offset.saturating_add(l).min(n));
    if limit.is_some_and(|l| offset.saturating_add(l) > n) {
        log::warn!("only {} bits available after offset {offset}", n - offset);
    }
    BitSequence::new(sequence.as_slice()[offset..end].to_vec())
}

/// Read and decode the file at `path`; `-` reads standard input.
pub fn load(path: &str, options: &LoadOptions) -> Result<BitSequence, CliError> {
    let data = if path == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf).map(|_| buf)
    } else {
        std::fs::read(path)
    }
    .map_err(|source| CliError::Io {
        path: path.to_string(),
        source,
    })?;
    Ok(decode(&data, options)?)
}
