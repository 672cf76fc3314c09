//! Hash algorithm implementations

use super::StreamingHasher;
use md5::{Digest as Md5Digest, Md5};
use sha1::{Digest as Sha1Digest, Sha1};

/// SHA1 streaming hasher
pub(super) struct Sha1Hasher {
    hasher: Sha1,
}

impl Sha1Hasher {
    pub(super) fn new() -> Self {
        Self {
            hasher: Sha1::new(),
        }
    }
}

impl StreamingHasher for Sha1Hasher {
    fn update(&mut self, data: &[u8]) {
        Sha1Digest::update(&mut self.hasher, data);
    }

    fn finalize(self: Box<Self>) -> String {
        format!("{:x}", Sha1Digest::finalize(self.hasher))
    }
}

/// MD5 streaming hasher
pub(super) struct Md5Hasher {
    hasher: Md5,
}

impl Md5Hasher {
    pub(super) fn new() -> Self {
        Self { hasher: Md5::new() }
    }
}

impl StreamingHasher for Md5Hasher {
    fn update(&mut self, data: &[u8]) {
        Md5Digest::update(&mut self.hasher, data);
    }

    fn finalize(self: Box<Self>) -> String {
        format!("{:x}", Md5Digest::finalize(self.hasher))
    }
}

/// CRC32 streaming hasher
pub(super) struct Crc32Hasher {
    hasher: crc32fast::Hasher,
}

impl Crc32Hasher {
    pub(super) fn new() -> Self {
        Self {
            hasher: crc32fast::Hasher::new(),
        }
    }
}

impl StreamingHasher for Crc32Hasher {
    fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    fn finalize(self: Box<Self>) -> String {
        format!("{:08x}", self.hasher.finalize())
    }
}
