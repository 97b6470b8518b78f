//! Bit-level nom helpers for the fixed-width fields of the header.
use nom::{bits::complete::take, IResult};

/// A byte slice plus the index of the next unread bit in its first byte.
/// This is the input type nom's bit parsers work on; `nom::bits::bits`
/// converts a byte parser's input into it and back again.
///
/// Reading the QR flag and the opcode out of `0b1000_1000` leaves
/// ```text
/// ([0b1000_1000, ...], 5)
///         ^
/// ```
pub type BitInput<'a> = (&'a [u8], usize);

/// Take 4 bits, most significant first. Used for OPCODE and RCODE.
pub fn take_nibble(i: BitInput) -> IResult<BitInput, u8> {
    take(4u8)(i)
}

/// Take 16 bits as a big-endian number.
pub fn take_u16(i: BitInput) -> IResult<BitInput, u16> {
    take_bits(i, 16)
}

/// Takes n bits (n <= 16) and returns them as a number.
pub fn take_bits(i: BitInput, n: u8) -> IResult<BitInput, u16> {
    take(n)(i)
}

/// Takes one bit as a flag.
pub fn take_bit(i: BitInput) -> IResult<BitInput, bool> {
    let (i, bit): (BitInput, u8) = take(1u8)(i)?;
    Ok((i, bit != 0))
}
