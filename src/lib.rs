mod attack;
mod cbc;
mod config;
mod error;
mod oracle;
mod pkcs7;
mod remote;
pub mod server;
mod xor;

pub use attack::{cbc_padding_oracle_attack, PaddingOracleAttack};
pub use cbc::{decrypt_aes_128_cbc, encrypt_aes_128_cbc, BLOCK_SIZE};
pub use config::{AttackConfig, ConfigError};
pub use error::AttackError;
pub use oracle::{OracleError, OracleService, PaddingOracle};
pub use pkcs7::{
    is_pkcs7_padded, is_pkcs7_padded_constant_time, pkcs7_pad, pkcs7_unpad, PaddingError,
};
pub use remote::RemoteOracle;
pub use server::spawn_server;
pub use xor::xor_blocks;
