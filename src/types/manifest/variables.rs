use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Expand `${VAR}` references. Variables that `lookup` doesn't know are left untouched.
pub fn fill_variables(line: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    lazy_static! {
        static ref EXPANSION: Regex = Regex::new(r"\$\{([A-Z0-9_]+)\}").unwrap();
    }

    let res = EXPANSION.replace_all(line, |caps: &Captures| {
        match lookup(&caps[1]) {
            Some(value) => value,
            None => caps[0].to_string(),
        }
    });

    res.to_string()
}

pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fill_variables() {
        let lookup = |name: &str| match name {
            "INDEX_TOKEN" => Some("s3cret".to_string()),
            "PY_3" => Some("3.11".to_string()),
            _ => None,
        };
        let tests = vec![
            ("aiohttp>=3.8", "aiohttp>=3.8"),
            (
                "--index-url https://${INDEX_TOKEN}@pypi.example.com/simple",
                "--index-url https://s3cret@pypi.example.com/simple",
            ),
            ("-r ${UNKNOWN}/base.txt", "-r ${UNKNOWN}/base.txt"),
            ("foo; python_version == \"${PY_3}\"", "foo; python_version == \"3.11\""),
            // Lowercase names are not variables
            ("${lower}", "${lower}"),
            ("$INDEX_TOKEN", "$INDEX_TOKEN"),
        ];

        for (input, output) in tests {
            assert_eq!(fill_variables(input, lookup), output);
        }
    }
}
