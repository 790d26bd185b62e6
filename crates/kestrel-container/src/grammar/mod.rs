//! Dependency reference grammar built on `nom`.
//!
//! A reference is `<category>::<body>` with category one of `config`,
//! `environment`, `factory`, `helper`, `service`:
//!
//! | reference                | token                                   |
//! |--------------------------|-----------------------------------------|
//! | `config::db>host`        | `Config { name: "db", prop: "host" }`   |
//! | `environment::PORT`      | `Environment { prop: "PORT" }`          |
//! | `factory::conn.pool`     | `Factory { name: "conn.pool" }`         |
//! | `helper::fmt>date`       | `Helper { name: "fmt", prop: "date" }`  |
//! | `service::db.pool`       | `Service { inject_class: false, .. }`   |
//! | `service::db.pool:class` | `Service { inject_class: true, .. }`    |
//!
//! Anything that does not start with a known `<category>::` prefix is a
//! literal and becomes [`Dependency::Static`]. A known prefix followed by a
//! malformed body is an error.

pub mod lexer;
pub mod token;

use kestrel_common::error::{KestrelError, Result};
use kestrel_common::types::DependencyKind;

use self::token::Dependency;

/// Parses a dependency reference string.
///
/// # Errors
///
/// Returns [`KestrelError::InvalidDependency`] naming the input verbatim
/// when the category is recognised but its body is malformed.
pub fn parse_reference(input: &str) -> Result<Dependency> {
    let Ok((body, kind)) = lexer::category(input) else {
        return Ok(Dependency::Static(input.into()));
    };
    if body.is_empty() || body.contains(['\n', '\r']) {
        return Ok(Dependency::Static(input.into()));
    }

    let invalid = || KestrelError::InvalidDependency {
        kind,
        input: body.to_owned(),
    };

    let dependency = match kind {
        DependencyKind::Config | DependencyKind::Helper => {
            let (_, (name, prop)) = lexer::path_with_prop(body).map_err(|_| invalid())?;
            let name = name.to_owned();
            let prop = prop.unwrap_or_default().to_owned();
            if kind == DependencyKind::Config {
                Dependency::Config { name, prop }
            } else {
                Dependency::Helper { name, prop }
            }
        }
        DependencyKind::Environment => {
            let (_, prop) = lexer::path_only(body).map_err(|_| invalid())?;
            Dependency::Environment {
                prop: prop.to_owned(),
            }
        }
        DependencyKind::Factory => {
            let (_, name) = lexer::path_only(body).map_err(|_| invalid())?;
            Dependency::Factory {
                name: name.to_owned(),
            }
        }
        DependencyKind::Service => {
            let (_, (service, inject_class)) =
                lexer::path_with_class(body).map_err(|_| invalid())?;
            Dependency::Service {
                service: service.to_owned(),
                inject_class,
            }
        }
    };
    Ok(dependency)
}

/// Formats one raw DI argument: strings are parsed, anything else is static.
///
/// # Errors
///
/// Propagates [`parse_reference`] failures for string arguments.
pub fn format_argument(argument: &serde_json::Value) -> Result<Dependency> {
    match argument {
        serde_json::Value::String(raw) => parse_reference(raw),
        other => Ok(Dependency::Static(other.clone())),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_config_with_prop() {
        let dep = parse_reference("config::a.b>c.d").expect("should parse");
        assert_eq!(
            dep,
            Dependency::Config {
                name: "a.b".into(),
                prop: "c.d".into()
            }
        );
    }

    #[test]
    fn parse_config_without_prop() {
        let dep = parse_reference("config::db").expect("should parse");
        assert_eq!(
            dep,
            Dependency::Config {
                name: "db".into(),
                prop: String::new()
            }
        );
    }

    #[test]
    fn parse_environment() {
        let dep = parse_reference("environment::DATABASE_URL").expect("should parse");
        assert_eq!(
            dep,
            Dependency::Environment {
                prop: "DATABASE_URL".into()
            }
        );
    }

    #[test]
    fn parse_factory() {
        let dep = parse_reference("factory::a.b").expect("should parse");
        assert_eq!(dep, Dependency::Factory { name: "a.b".into() });
    }

    #[test]
    fn parse_helper_with_prop() {
        let dep = parse_reference("helper::a.b>c").expect("should parse");
        assert_eq!(
            dep,
            Dependency::Helper {
                name: "a.b".into(),
                prop: "c".into()
            }
        );
    }

    #[test]
    fn parse_service_instance_and_class() {
        assert_eq!(
            parse_reference("service::a.b").expect("should parse"),
            Dependency::Service {
                service: "a.b".into(),
                inject_class: false
            }
        );
        assert_eq!(
            parse_reference("service::a.b:class").expect("should parse"),
            Dependency::Service {
                service: "a.b".into(),
                inject_class: true
            }
        );
    }

    #[test]
    fn unknown_category_is_static() {
        for raw in ["hello", "widget::x", "service:x", "", "http://example.com"] {
            let dep = parse_reference(raw).expect("should parse");
            assert_eq!(dep, Dependency::Static(raw.into()), "input {raw:?}");
        }
    }

    #[test]
    fn empty_body_is_static() {
        let dep = parse_reference("service::").expect("should parse");
        assert_eq!(dep, Dependency::Static("service::".into()));
    }

    #[test]
    fn malformed_bodies_are_category_errors() {
        let cases = [
            ("config::..a", DependencyKind::Config, "..a"),
            ("environment::A B", DependencyKind::Environment, "A B"),
            ("factory::a>b", DependencyKind::Factory, "a>b"),
            ("helper::a>", DependencyKind::Helper, "a>"),
            ("service::a:instance", DependencyKind::Service, "a:instance"),
        ];
        for (raw, expected_kind, expected_input) in cases {
            let err = parse_reference(raw).expect_err(raw);
            match err {
                KestrelError::InvalidDependency { kind, input } => {
                    assert_eq!(kind, expected_kind, "input {raw}");
                    assert_eq!(input, expected_input, "input {raw}");
                }
                other => panic!("unexpected error for {raw}: {other}"),
            }
        }
    }

    #[test]
    fn parsing_is_deterministic() {
        let first = parse_reference("config::a.b>c").expect("should parse");
        let second = parse_reference("config::a.b>c").expect("should parse");
        assert_eq!(first, second);
    }

    #[test]
    fn non_string_arguments_are_static() {
        let value = json!({ "retries": 3 });
        assert_eq!(
            format_argument(&value).expect("should format"),
            Dependency::Static(value)
        );
        assert_eq!(
            format_argument(&json!(false)).expect("should format"),
            Dependency::Static(json!(false))
        );
    }

    #[test]
    fn string_arguments_are_parsed() {
        assert_eq!(
            format_argument(&json!("factory::x")).expect("should format"),
            Dependency::Factory { name: "x".into() }
        );
    }
}
