use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::{convert::TryFrom, fmt::Display, fs::File, io, path::Path};

#[derive(PartialEq, Eq, Clone, Copy, Debug, clap::ArgEnum)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    fn hex_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha384 => 96,
            HashAlgorithm::Sha512 => 128,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }
}

/// A `--hash=<alg>:<hex>` pin on a requirement line
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Checksum {
    pub algorithm: HashAlgorithm,
    pub digest: Vec<u8>,
}

impl Checksum {
    /// Parse `<alg>:<hex>`
    pub fn from_pip_str(s: &str) -> Result<Self> {
        let (alg, digest) = match s.split_once(':') {
            Some(x) => x,
            None => bail!("Malformed hash {}: expecting <algorithm>:<digest>", s),
        };
        let algorithm = match alg {
            "sha256" => HashAlgorithm::Sha256,
            "sha384" => HashAlgorithm::Sha384,
            "sha512" => HashAlgorithm::Sha512,
            other => bail!("Unsupported hash algorithm {}", other),
        };
        if digest.len() != algorithm.hex_len() {
            bail!("Malformed {} digest: bad length", algorithm.name())
        }
        let digest = hex::decode(digest).context(format!("Malformed {} digest", algorithm.name()))?;
        Ok(Checksum { algorithm, digest })
    }

    pub fn from_read(algorithm: HashAlgorithm, mut r: impl io::Read) -> Result<Self> {
        let digest = match algorithm {
            HashAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                io::copy(&mut r, &mut hasher)?;
                hasher.finalize().to_vec()
            }
            HashAlgorithm::Sha384 => {
                let mut hasher = Sha384::new();
                io::copy(&mut r, &mut hasher)?;
                hasher.finalize().to_vec()
            }
            HashAlgorithm::Sha512 => {
                let mut hasher = Sha512::new();
                io::copy(&mut r, &mut hasher)?;
                hasher.finalize().to_vec()
            }
        };
        Ok(Checksum { algorithm, digest })
    }

    pub fn from_file(algorithm: HashAlgorithm, path: &Path) -> Result<Self> {
        let file = File::open(path).context(format!(
            "Failed to open {} for computing checksum",
            path.display()
        ))?;
        Self::from_read(algorithm, file)
    }

    pub fn cmp_file(&self, path: &Path) -> Result<bool> {
        let actual = Self::from_file(self.algorithm, path)?;
        Ok(actual.digest == self.digest)
    }
}

impl TryFrom<&str> for Checksum {
    type Error = anyhow::Error;
    fn try_from(s: &str) -> Result<Self> {
        Self::from_pip_str(s)
    }
}

impl Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.algorithm.name())?;
        f.write_str(":")?;
        f.write_str(&hex::encode(&self.digest))
    }
}
