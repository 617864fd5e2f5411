use super::{LocalSegment, PkgVersion, PreRelease};

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::*,
    combinator::{map, map_res, opt, value},
    error::context,
    multi::separated_list1,
    sequence::*,
    IResult,
};

fn number(i: &str) -> IResult<&str, u64> {
    map_res(digit1, |s: &str| s.parse::<u64>())(i)
}

fn separator(i: &str) -> IResult<&str, char> {
    one_of("-_.")(i)
}

fn pre_release_tag(i: &str) -> IResult<&str, PreRelease> {
    // Longer spellings go first so that they are not eaten by their abbreviations
    alt((
        value(PreRelease::Alpha, tag_no_case("alpha")),
        value(PreRelease::Alpha, tag_no_case("a")),
        value(PreRelease::Beta, tag_no_case("beta")),
        value(PreRelease::Beta, tag_no_case("b")),
        value(PreRelease::Rc, tag_no_case("preview")),
        value(PreRelease::Rc, tag_no_case("pre")),
        value(PreRelease::Rc, tag_no_case("rc")),
        value(PreRelease::Rc, tag_no_case("c")),
    ))(i)
}

fn pre_release(i: &str) -> IResult<&str, (PreRelease, u64)> {
    let (i, _) = opt(separator)(i)?;
    let (i, kind) = pre_release_tag(i)?;
    let (i, _) = opt(separator)(i)?;
    let (i, num) = opt(number)(i)?;
    Ok((i, (kind, num.unwrap_or(0))))
}

fn explicit_post_release(i: &str) -> IResult<&str, u64> {
    let (i, _) = opt(separator)(i)?;
    let (i, _) = alt((tag_no_case("post"), tag_no_case("rev"), tag_no_case("r")))(i)?;
    let (i, _) = opt(separator)(i)?;
    let (i, num) = opt(number)(i)?;
    Ok((i, num.unwrap_or(0)))
}

fn post_release(i: &str) -> IResult<&str, u64> {
    alt((explicit_post_release, preceded(char('-'), number)))(i)
}

fn dev_release(i: &str) -> IResult<&str, u64> {
    let (i, _) = opt(separator)(i)?;
    let (i, _) = tag_no_case("dev")(i)?;
    let (i, _) = opt(separator)(i)?;
    let (i, num) = opt(number)(i)?;
    Ok((i, num.unwrap_or(0)))
}

fn local_segment(i: &str) -> IResult<&str, LocalSegment> {
    map(alphanumeric1, |s: &str| {
        if s.chars().all(|c| c.is_ascii_digit()) {
            match s.parse() {
                Ok(n) => LocalSegment::Number(n),
                Err(_) => LocalSegment::Alphabetic(s.to_owned()),
            }
        } else {
            LocalSegment::Alphabetic(s.to_ascii_lowercase())
        }
    })(i)
}

fn local_label(i: &str) -> IResult<&str, Vec<LocalSegment>> {
    preceded(char('+'), separated_list1(separator, local_segment))(i)
}

/// Use `nom` to parse a PEP 440 version. Trailing input is left to the caller.
pub fn parse_version(i: &str) -> IResult<&str, PkgVersion> {
    let (i, _) = opt(one_of("vV"))(i)?;
    let (i, epoch) = opt(terminated(number, char('!')))(i)?;
    let (i, release) = context("parsing release segment", separated_list1(char('.'), number))(i)?;
    let (i, pre) = opt(pre_release)(i)?;
    let (i, post) = opt(post_release)(i)?;
    let (i, dev) = opt(dev_release)(i)?;
    let (i, local) = opt(local_label)(i)?;

    let res = PkgVersion {
        epoch: epoch.unwrap_or(0),
        release,
        pre,
        post,
        dev,
        local: local.unwrap_or_default(),
    };

    Ok((i, res))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_version_rest() {
        let tests = vec![
            ("1.0.*", ".*"),
            ("2.31.0,<3", ",<3"),
            ("1.2 ; python_version", " ; python_version"),
            ("3.8.1)", ")"),
        ];

        for (input, rest) in tests {
            let (i, _) = parse_version(input).unwrap();
            assert_eq!(i, rest);
        }
    }

    #[test]
    fn test_pre_release_tag() {
        let tests = vec![
            ("alpha", PreRelease::Alpha),
            ("A", PreRelease::Alpha),
            ("beta", PreRelease::Beta),
            ("preview", PreRelease::Rc),
            ("RC", PreRelease::Rc),
            ("c", PreRelease::Rc),
        ];

        for (input, kind) in tests {
            assert_eq!(pre_release_tag(input), Ok(("", kind)));
        }
    }
}
