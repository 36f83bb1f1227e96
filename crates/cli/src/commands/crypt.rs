//! encrypt and decrypt commands - Stream transforms of stdin to stdout
//!
//! Uses AES-256-GCM with a key derived from the given passphrase by SHA-256.
//! The random 12-byte nonce is written ahead of the ciphertext.

use aes_gcm::{
    Aes256Gcm, KeyInit, Nonce,
    aead::{Aead, OsRng, rand_core::RngCore},
};
use async_trait::async_trait;
use clap::Parser;
use sha2::{Digest, Sha256};

use swiftly_core::{Error, Result};

use super::{parse_args, schema_for};
use crate::controller::Controller;
use crate::registry::{Command, CommandDescriptor};

const NONCE_SIZE: usize = 12;

/// Arguments of the encrypt and decrypt commands
#[derive(Parser, Debug)]
pub struct CryptArgs {
    /// Passphrase the key is derived from
    pub key: String,
}

fn cipher(passphrase: &str) -> Result<Aes256Gcm> {
    let key = Sha256::digest(passphrase.as_bytes());
    Aes256Gcm::new_from_slice(&key).map_err(|e| Error::General(format!("Cipher init failed: {e}")))
}

/// Encrypt `plaintext`, returning the nonce followed by the ciphertext
pub fn encrypt(passphrase: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let ciphertext = cipher(passphrase)?
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| Error::command(format!("Encryption failed: {e}")))?;

    let mut data = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    data.extend_from_slice(&nonce_bytes);
    data.extend_from_slice(&ciphertext);
    Ok(data)
}

/// Reverse [`encrypt`]
pub fn decrypt(passphrase: &str, data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < NONCE_SIZE {
        return Err(Error::command("Decryption failed: input is too short"));
    }
    let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
    cipher(passphrase)?
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| Error::command("Decryption failed: wrong key or corrupt input"))
}

pub struct EncryptCommand;

#[async_trait]
impl Command for EncryptCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            name: "encrypt",
            usage: "encrypt [options] <key>",
            about: "Encrypts standard input using the <key> given and writes \
                    the result to standard output.",
        }
    }

    fn schema(&self) -> clap::Command {
        schema_for::<CryptArgs>(self.descriptor())
    }

    async fn invoke(&self, controller: &Controller, args: Vec<String>) -> Result<()> {
        let context = controller.context();
        let Some(args) = parse_args::<CryptArgs>(self, context, &args)? else {
            return Ok(());
        };

        let data = encrypt(&args.key, &context.io.read_stdin()?)?;
        context.io.with_stdout(|out| out.write_all(&data))?;
        Ok(())
    }
}

pub struct DecryptCommand;

#[async_trait]
impl Command for DecryptCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            name: "decrypt",
            usage: "decrypt [options] <key>",
            about: "Decrypts standard input using the <key> given and writes \
                    the result to standard output. The input must have been \
                    produced by the encrypt command.",
        }
    }

    fn schema(&self) -> clap::Command {
        schema_for::<CryptArgs>(self.descriptor())
    }

    async fn invoke(&self, controller: &Controller, args: Vec<String>) -> Result<()> {
        let context = controller.context();
        let Some(args) = parse_args::<CryptArgs>(self, context, &args)? else {
            return Ok(());
        };

        let data = decrypt(&args.key, &context.io.read_stdin()?)?;
        context.io.with_stdout(|out| out.write_all(&data))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_layout() {
        let data = encrypt("secret", b"hello").unwrap();
        // nonce + plaintext + 16-byte tag
        assert_eq!(data.len(), NONCE_SIZE + 5 + 16);
        assert_eq!(decrypt("secret", &data).unwrap(), b"hello");
    }

    #[test]
    fn test_nonce_is_random() {
        let a = encrypt("secret", b"hello").unwrap();
        let b = encrypt("secret", b"hello").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key() {
        let data = encrypt("secret", b"hello").unwrap();
        let err = decrypt("other", &data).unwrap_err();
        assert!(err.is_described());
        assert!(err.to_string().contains("wrong key"));
    }

    #[test]
    fn test_short_input() {
        assert!(decrypt("secret", b"short").is_err());
    }
}
