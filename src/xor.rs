/// XOR two blocks of equal, compile-time known, size.
pub fn xor_blocks<const N: usize>(block_a: &[u8; N], block_b: &[u8; N]) -> [u8; N] {
    let mut out = *block_a;
    out.iter_mut().zip(block_b).for_each(|(a, b)| *a ^= b);
    out
}
