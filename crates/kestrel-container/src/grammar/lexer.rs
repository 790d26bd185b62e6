//! `nom` primitives for dependency reference strings.
//!
//! Dotted paths are segments of `[a-zA-Z0-9_-]+` joined by single dots; a
//! leading, trailing, or doubled dot never matches.

use kestrel_common::types::DependencyKind;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::char,
    combinator::{all_consuming, opt, recognize, value},
    multi::separated_list1,
    sequence::{preceded, terminated},
};

const fn is_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Parses a dotted path such as `db.primary-pool`.
pub fn dotted_path(input: &str) -> IResult<&str, &str> {
    recognize(separated_list1(char('.'), take_while1(is_segment_char))).parse(input)
}

/// Parses the `<category>::` prefix.
pub fn category(input: &str) -> IResult<&str, DependencyKind> {
    terminated(
        alt((
            value(DependencyKind::Config, tag("config")),
            value(DependencyKind::Environment, tag("environment")),
            value(DependencyKind::Factory, tag("factory")),
            value(DependencyKind::Helper, tag("helper")),
            value(DependencyKind::Service, tag("service")),
        )),
        tag(kestrel_common::constants::REFERENCE_SEPARATOR),
    )
    .parse(input)
}

/// `<path>[><prop>]`, the whole input.
pub fn path_with_prop(input: &str) -> IResult<&str, (&str, Option<&str>)> {
    all_consuming((dotted_path, opt(preceded(char('>'), dotted_path)))).parse(input)
}

/// `<path>[:class]`, the whole input.
pub fn path_with_class(input: &str) -> IResult<&str, (&str, bool)> {
    let (rest, (path, class)) =
        all_consuming((dotted_path, opt(tag(":class")))).parse(input)?;
    Ok((rest, (path, class.is_some())))
}

/// `<path>`, the whole input.
pub fn path_only(input: &str) -> IResult<&str, &str> {
    all_consuming(dotted_path).parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_path_single_segment() {
        assert_eq!(dotted_path("db"), Ok(("", "db")));
    }

    #[test]
    fn dotted_path_stops_before_trailing_dot() {
        assert_eq!(dotted_path("db.pool."), Ok((".", "db.pool")));
    }

    #[test]
    fn dotted_path_rejects_leading_dot() {
        assert!(dotted_path("..db").is_err());
        assert!(dotted_path(".db").is_err());
    }

    #[test]
    fn category_consumes_separator() {
        assert_eq!(category("helper::x"), Ok(("x", DependencyKind::Helper)));
        assert!(category("helper:x").is_err());
        assert!(category("widget::x").is_err());
    }

    #[test]
    fn path_with_prop_splits_on_arrow() {
        assert_eq!(
            path_with_prop("db.main>host.name"),
            Ok(("", ("db.main", Some("host.name"))))
        );
        assert_eq!(path_with_prop("db"), Ok(("", ("db", None))));
        assert!(path_with_prop("db>").is_err());
        assert!(path_with_prop("db>>x").is_err());
    }

    #[test]
    fn path_with_class_reads_suffix() {
        assert_eq!(path_with_class("a.b:class"), Ok(("", ("a.b", true))));
        assert_eq!(path_with_class("a.b"), Ok(("", ("a.b", false))));
        assert!(path_with_class("a.b:klass").is_err());
    }

    #[test]
    fn path_only_requires_full_match() {
        assert_eq!(path_only("a.b"), Ok(("", "a.b")));
        assert!(path_only("a.b c").is_err());
    }
}
