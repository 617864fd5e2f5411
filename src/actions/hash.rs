use crate::{
    error, success,
    types::{config::HashFile, Checksum},
};

use anyhow::{bail, Context, Result};
use console::style;

pub fn hash(args: &HashFile) -> Result<()> {
    if let Some(expected) = &args.verify {
        return verify(args, expected);
    }

    for file in &args.files {
        let checksum = Checksum::from_file(args.algorithm, file)?;
        // Ready to paste after a requirement
        println!("--hash={}  # {}", checksum, file.display());
    }
    Ok(())
}

fn verify(args: &HashFile, expected: &str) -> Result<()> {
    let checksum = Checksum::from_pip_str(expected)
        .context(format!("Invalid checksum {}", style(expected).bold()))?;

    let mut mismatch = 0;
    for file in &args.files {
        if checksum.cmp_file(file)? {
            success!("{} matches", file.display());
        } else {
            error!("{} does not match {}", style(file.display()).bold(), checksum);
            mismatch += 1;
        }
    }

    if mismatch > 0 {
        bail!("{} file(s) failed verification", mismatch);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::HashAlgorithm;
    use std::fs;

    #[test]
    fn test_verify() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.whl");
        let other = dir.path().join("other.whl");
        fs::write(&empty, "").unwrap();
        fs::write(&other, "wheel").unwrap();

        let mut args = HashFile {
            files: vec![empty.clone()],
            algorithm: HashAlgorithm::Sha256,
            verify: Some(
                "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
                    .to_string(),
            ),
        };
        assert!(hash(&args).is_ok());

        args.files.push(other);
        assert!(hash(&args).is_err());

        args.verify = Some("md5:d41d8cd98f00b204e9800998ecf8427e".to_string());
        assert!(hash(&args).is_err());

        args.verify = None;
        args.files = vec![empty];
        assert!(hash(&args).is_ok());
    }
}
