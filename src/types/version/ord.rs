use super::{PkgVersion, PreRelease};
use std::cmp::{max, Ord, Ordering};

/// Sort key of the pre-release part. A dev release without pre or post part
/// sorts before every pre-release of the same release segment.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum PreKey {
    DevOnly,
    Pre(PreRelease, u64),
    Final,
}

fn pre_key(v: &PkgVersion) -> PreKey {
    match (&v.pre, v.post, v.dev) {
        (Some((kind, num)), _, _) => PreKey::Pre(*kind, *num),
        (None, None, Some(_)) => PreKey::DevOnly,
        _ => PreKey::Final,
    }
}

/// No dev part sorts after any dev part
fn dev_key(v: &PkgVersion) -> (bool, u64) {
    (v.dev.is_none(), v.dev.unwrap_or(0))
}

/// The PEP 440 ordering
/// Check https://peps.python.org/pep-0440/#summary-of-permitted-suffixes-and-relative-ordering
impl Ord for PkgVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.epoch.cmp(&other.epoch) {
            Ordering::Equal => (),
            ord => return ord,
        }

        // Trailing zeros are insignificant, so pad the shorter one
        let max_len = max(self.release.len(), other.release.len());
        for i in 0..max_len {
            let this = self.release.get(i).copied().unwrap_or(0);
            let that = other.release.get(i).copied().unwrap_or(0);
            match this.cmp(&that) {
                Ordering::Equal => (),
                ord => return ord,
            }
        }

        pre_key(self)
            .cmp(&pre_key(other))
            .then_with(|| self.post.cmp(&other.post))
            .then_with(|| dev_key(self).cmp(&dev_key(other)))
            .then_with(|| self.local.cmp(&other.local))
    }
}

impl PartialOrd for PkgVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PkgVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PkgVersion {}
