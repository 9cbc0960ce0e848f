use sha2::{Digest, Sha256};

pub trait Hasher {
    type Digest;
    fn reset(&mut self);
    fn update(&mut self, input: &[u8]);
    fn finalize_reset(&mut self) -> Self::Digest;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Sha256Digest(pub [u8; 32]);

pub struct Sha256Hasher {
    inner: Sha256,
}

impl Sha256Hasher {
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    pub fn digest(input: &[u8]) -> Sha256Digest {
        let mut hasher = Self::new();
        hasher.update(input);
        hasher.finalize_reset()
    }
}

impl Default for Sha256Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Sha256Hasher {
    type Digest = Sha256Digest;

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn update(&mut self, input: &[u8]) {
        self.inner.update(input);
    }

    fn finalize_reset(&mut self) -> Self::Digest {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&self.inner.finalize_reset());
        Sha256Digest(digest)
    }
}
