//! Packing and unpacking of bit masks.

use arrow_buffer::bit_util;
use ragged_buffer::Buffer;

#[inline]
fn bit_position(i: usize, lsb_order: bool) -> usize {
    if lsb_order { i } else { (i / 8) * 8 + (7 - i % 8) }
}

/// Bit `i` of `mask`.
#[inline]
pub fn get_bit(mask: &[u8], i: usize, lsb_order: bool) -> bool {
    bit_util::get_bit(mask, bit_position(i, lsb_order))
}

/// Unpack the first `length` bits of `mask`.
pub fn unpack_bits(mask: &[u8], length: usize, lsb_order: bool) -> Vec<bool> {
    (0..length)
        .map(|i| get_bit(mask, i, lsb_order))
        .collect()
}

/// Pack booleans into bytes, eight per byte.
pub fn pack_bits(bits: &[bool], lsb_order: bool) -> Buffer<u8> {
    let mut bytes = vec![0u8; bit_util::ceil(bits.len(), 8)];
    for (i, bit) in bits.iter().enumerate() {
        if *bit {
            bit_util::set_bit(&mut bytes, bit_position(i, lsb_order));
        }
    }
    Buffer::from(bytes)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bit_orders() {
        let bits = [true, false, false, true, true, false, false, false, true];
        let lsb = pack_bits(&bits, true);
        assert_eq!(lsb.as_slice(), &[0b0001_1001, 0b0000_0001]);
        let msb = pack_bits(&bits, false);
        assert_eq!(msb.as_slice(), &[0b1001_1000, 0b1000_0000]);
        assert_eq!(unpack_bits(&lsb, bits.len(), true), bits);
        assert_eq!(unpack_bits(&msb, bits.len(), false), bits);
    }
}
