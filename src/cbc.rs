// AES-128 in CBC mode.
//
// Encryption chains each plaintext block into the next:
//
//                  C_i = E(C_{i-1} ⊕ P_i),    C_0 = IV
//
// and decryption undoes it:
//
//                  P_i = D(C_i) ⊕ C_{i-1}.
//
// Neither function pads or unpads; inputs must be whole blocks.
use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Block};

use crate::xor_blocks;

pub const BLOCK_SIZE: usize = 16;

pub fn encrypt_aes_128_cbc(
    plaintext: &[u8],
    key: &[u8; BLOCK_SIZE],
    iv: &[u8; BLOCK_SIZE],
) -> Vec<u8> {
    debug_assert_eq!(plaintext.len() % BLOCK_SIZE, 0);
    let cipher = Aes128::new(GenericArray::from_slice(key));

    let mut ciphertext = Vec::with_capacity(plaintext.len());
    let mut last_block = *iv;
    for plaintext_block in plaintext.chunks_exact(BLOCK_SIZE) {
        let message_buf = xor_blocks(&to_block(plaintext_block), &last_block);
        let mut block = Block::from(message_buf);
        cipher.encrypt_block(&mut block);
        last_block = to_block(&block);
        ciphertext.extend_from_slice(&last_block);
    }
    ciphertext
}

pub fn decrypt_aes_128_cbc(
    ciphertext: &[u8],
    key: &[u8; BLOCK_SIZE],
    iv: &[u8; BLOCK_SIZE],
) -> Vec<u8> {
    debug_assert_eq!(ciphertext.len() % BLOCK_SIZE, 0);
    let cipher = Aes128::new(GenericArray::from_slice(key));

    let mut message = Vec::with_capacity(ciphertext.len());
    let mut last_block = *iv;
    for ciphertext_block in ciphertext.chunks_exact(BLOCK_SIZE) {
        let ciphertext_buf = to_block(ciphertext_block);
        let mut block = Block::from(ciphertext_buf);
        cipher.decrypt_block(&mut block);
        message.extend_from_slice(&xor_blocks(&to_block(&block), &last_block));
        last_block = ciphertext_buf;
    }
    message
}

fn to_block(bytes: &[u8]) -> [u8; BLOCK_SIZE] {
    let mut block = [0u8; BLOCK_SIZE];
    block.copy_from_slice(bytes);
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    // NIST SP 800-38A, F.2.1 CBC-AES128.Encrypt
    const KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";
    const IV: &str = "000102030405060708090a0b0c0d0e0f";
    const PLAINTEXT: &str = concat!(
        "6bc1bee22e409f96e93d7e117393172a",
        "ae2d8a571e03ac9c9eb76fac45af8e51",
        "30c81c46a35ce411e5fbc1191a0a52ef",
        "f69f2445df4f9b17ad2b417be66c3710",
    );
    const CIPHERTEXT: &str = concat!(
        "7649abac8119b246cee98e9b12e9197d",
        "5086cb9b507219ee95db113a917678b2",
        "73bed6b8e3c1743b7116e69e22229516",
        "3ff1caa1681fac09120eca307586e1a7",
    );

    fn hex_array(hex_str: &str) -> [u8; BLOCK_SIZE] {
        hex::decode(hex_str).unwrap().try_into().unwrap()
    }

    #[test]
    fn encrypt_aes_128_cbc_matches_nist_vector() {
        let plaintext = hex::decode(PLAINTEXT).unwrap();

        let ciphertext = encrypt_aes_128_cbc(&plaintext, &hex_array(KEY), &hex_array(IV));

        assert_eq!(ciphertext, hex::decode(CIPHERTEXT).unwrap());
    }

    #[test]
    fn decrypt_aes_128_cbc_matches_nist_vector() {
        let ciphertext = hex::decode(CIPHERTEXT).unwrap();

        let plaintext = decrypt_aes_128_cbc(&ciphertext, &hex_array(KEY), &hex_array(IV));

        assert_eq!(plaintext, hex::decode(PLAINTEXT).unwrap());
    }

    #[test]
    fn decrypt_then_encrypt_returns_original_ciphertext() {
        let key: [u8; 16] = *b"YELLOW SUBMARINE";
        let iv = [0u8; 16];
        let ciphertext = hex::decode(CIPHERTEXT).unwrap();

        let plaintext = decrypt_aes_128_cbc(&ciphertext, &key, &iv);
        let new_ciphertext = encrypt_aes_128_cbc(&plaintext, &key, &iv);

        assert_eq!(new_ciphertext, ciphertext);
    }

    #[test]
    fn encrypt_aes_128_cbc_chains_identical_blocks_to_different_ciphertext() {
        let key: [u8; 16] = *b"YELLOW SUBMARINE";
        let plaintext = [0x41u8; 32];

        let ciphertext = encrypt_aes_128_cbc(&plaintext, &key, &[0u8; 16]);

        assert_ne!(ciphertext[..16], ciphertext[16..]);
    }
}
