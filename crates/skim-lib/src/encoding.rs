//! DNA symbol encoding
//!
//! Nucleotides map to 2 bits in lexicographic order:
//! - A (65/97)  -> 00
//! - C (67/99)  -> 01
//! - G (71/103) -> 10
//! - T (84/116) -> 11
//!
//! Besides the four nucleotides, reads may carry IUPAC ambiguity codes,
//! the mask symbol `X` and the gap symbols `-` and `*`. Those never enter a
//! hash; any other byte is an input error.

use thiserror::Error;

/// Error type for encoding operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The byte is neither a nucleotide nor a recognised ambiguity, mask or gap symbol
    #[error("Unrecognised sequence symbol {symbol:?} at position {position}")]
    InvalidSymbol {
        /// Offending byte
        symbol: char,
        /// Position of the byte in the sequence
        position: usize,
    },
}

/// Classification of a single sequence byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// A nucleotide with its 2-bit code
    Base(u8),
    /// Ambiguity code, mask or gap: breaks every hash window spanning it
    Ambiguous,
}

/// Classify a sequence byte, or `None` if the byte is not a sequence symbol at all
#[inline]
pub const fn classify_symbol(symbol: u8) -> Option<Symbol> {
    match symbol {
        b'A' | b'a' => Some(Symbol::Base(0b00)),
        b'C' | b'c' => Some(Symbol::Base(0b01)),
        b'G' | b'g' => Some(Symbol::Base(0b10)),
        b'T' | b't' => Some(Symbol::Base(0b11)),
        b'N' | b'n' | b'R' | b'r' | b'Y' | b'y' | b'M' | b'm' | b'K' | b'k' | b'S' | b's'
        | b'W' | b'w' | b'B' | b'b' | b'D' | b'd' | b'H' | b'h' | b'V' | b'v' | b'X' | b'x'
        | b'-' | b'*' => Some(Symbol::Ambiguous),
        _ => None,
    }
}

/// Complement of a sequence symbol.
///
/// IUPAC codes map onto their complementary code; `N`, `S`, `W`, masks and
/// gaps are their own complement. Case is preserved.
#[inline]
pub const fn complement_symbol(symbol: u8) -> u8 {
    match symbol {
        b'A' => b'T',
        b'a' => b't',
        b'C' => b'G',
        b'c' => b'g',
        b'G' => b'C',
        b'g' => b'c',
        b'T' => b'A',
        b't' => b'a',
        b'R' => b'Y',
        b'r' => b'y',
        b'Y' => b'R',
        b'y' => b'r',
        b'K' => b'M',
        b'k' => b'm',
        b'M' => b'K',
        b'm' => b'k',
        b'B' => b'V',
        b'b' => b'v',
        b'V' => b'B',
        b'v' => b'b',
        b'D' => b'H',
        b'd' => b'h',
        b'H' => b'D',
        b'h' => b'd',
        other => other,
    }
}

/// Reverse complement of a sequence
pub fn reverse_complement(sequence: &[u8]) -> Vec<u8> {
    sequence.iter().rev().map(|&s| complement_symbol(s)).collect()
}

/// Validate that every byte of a sequence is a recognised symbol
///
/// # Errors
/// Returns [`EncodingError::InvalidSymbol`] for the first unrecognised byte
pub fn validate_sequence(sequence: &[u8]) -> Result<(), EncodingError> {
    match sequence.iter().position(|&s| classify_symbol(s).is_none()) {
        Some(position) => Err(EncodingError::InvalidSymbol {
            symbol: sequence[position] as char,
            position,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_symbol() {
        assert_eq!(classify_symbol(b'g'), Some(Symbol::Base(0b10)));
        assert_eq!(classify_symbol(b'N'), Some(Symbol::Ambiguous));
        assert_eq!(classify_symbol(b'x'), Some(Symbol::Ambiguous));
        assert_eq!(classify_symbol(b'*'), Some(Symbol::Ambiguous));
        assert_eq!(classify_symbol(b'-'), Some(Symbol::Ambiguous));

        assert_eq!(classify_symbol(b'U'), None);
        assert_eq!(classify_symbol(b' '), None);
        assert_eq!(classify_symbol(b'1'), None);
    }

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement(b"ACGTT"), b"AACGT".to_vec());
        assert_eq!(reverse_complement(b"AcgN"), b"NcgT".to_vec());
        assert_eq!(reverse_complement(b"RYKMBVDH"), b"DHBVKMRY".to_vec());
        assert_eq!(reverse_complement(b"A*-X"), b"X-*T".to_vec());
        assert!(reverse_complement(b"").is_empty());
    }

    #[test]
    fn test_validate_sequence() {
        assert!(validate_sequence(b"ACGTNnacgt-*X").is_ok());
        assert_eq!(
            validate_sequence(b"ACGU"),
            Err(EncodingError::InvalidSymbol { symbol: 'U', position: 3 })
        );
    }
}
