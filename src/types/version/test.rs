#[cfg(test)]
mod test {
    use super::super::PkgVersion;
    use std::cmp::Ordering::*;
    use std::convert::TryFrom;

    #[test]
    fn pkg_ver_ord() {
        let source = vec![
            ("1.1.1", Less, "1.1.2"),
            ("1.0", Less, "1.1"),
            ("1.2", Less, "1.11"),
            ("1.0", Equal, "1.0.0"),
            ("1.0", Equal, "1.0.0.0"),
            ("1.0", Equal, "v1.0"),
            ("1!0.1", Greater, "2023.1"),
            ("1.0.dev0", Less, "1.0a1"),
            ("1.0a1", Less, "1.0a2"),
            ("1.0a2", Less, "1.0b1"),
            ("1.0b1", Less, "1.0rc1"),
            ("1.0rc1", Less, "1.0"),
            ("1.0a1.dev1", Less, "1.0a1"),
            ("1.0a1", Less, "1.0a1.post1"),
            ("1.0", Less, "1.0.post0.dev0"),
            ("1.0.post1.dev0", Less, "1.0.post1"),
            ("1.0.post1", Less, "1.0.post2"),
            ("1.0.post2", Less, "1.1.dev0"),
            ("1.0", Less, "1.0+local"),
            ("1.0+abc", Less, "1.0+1"),
            ("1.0+1", Less, "1.0+1.1"),
            ("1.0+abc.5", Less, "1.0+abc.7"),
            ("1.0-1", Equal, "1.0.post1"),
            ("2024.1.0b1", Greater, "2023.12.1"),
            ("0.3.3b2", Less, "0.3.3"),
        ];

        for e in source {
            println!("Comparing {} vs {}", e.0, e.2);
            assert_eq!(
                PkgVersion::try_from(e.0)
                    .unwrap()
                    .cmp(&PkgVersion::try_from(e.2).unwrap()),
                e.1
            );
        }
    }

    #[test]
    fn pkg_ver_sort() {
        let mut versions: Vec<PkgVersion> = vec!["1.0", "1.0.dev0", "1.0rc1", "0.9", "1.0.post1", "1.0a1"]
            .into_iter()
            .map(|v| PkgVersion::try_from(v).unwrap())
            .collect();
        versions.sort();
        let sorted: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
        assert_eq!(
            sorted,
            vec!["0.9", "1.0.dev0", "1.0a1", "1.0rc1", "1.0", "1.0.post1"]
        );
    }
}
