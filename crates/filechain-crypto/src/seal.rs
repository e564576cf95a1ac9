use sha2::{Digest, Sha256};

/// A block's canonical encoding split around its nonce.
///
/// The encoding is `head ++ decimal(nonce) ++ tail`. The hasher state after
/// `head` is kept, so each mining attempt only hashes the nonce and the tail.
#[derive(Clone)]
pub struct SealTemplate {
    head: Sha256,
    tail: Vec<u8>,
}

impl SealTemplate {
    pub fn new(head: &[u8], tail: impl Into<Vec<u8>>) -> Self {
        let mut state = Sha256::new();
        state.update(head);
        Self {
            head: state,
            tail: tail.into(),
        }
    }

    /// Lowercase hex digest of the encoding with `nonce` spliced in.
    pub fn digest(&self, nonce: u64) -> String {
        let mut hasher = self.head.clone();
        hasher.update(nonce.to_string().as_bytes());
        hasher.update(&self.tail);
        hex::encode(hasher.finalize())
    }
}

impl std::fmt::Debug for SealTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealTemplate")
            .field("tail_len", &self.tail.len())
            .finish()
    }
}
