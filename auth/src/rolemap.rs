//! Structural validation of role mapping rules.
//!
//! Expanding a role map into effective roles at login time happens elsewhere;
//! this module only guarantees that every rule can be evaluated.

use regex::Regex;

use keystone_types::{Error, Result, RoleMapping, roles::WILDCARD};

/// How a rule's remote side is matched.
#[derive(Debug, Clone)]
pub enum RemotePattern {
    /// `*`, matches any remote role.
    Wildcard,
    Literal(String),
    /// A pattern containing `*`, compiled to an anchored expression.
    Glob(Regex),
    /// A `^...$` regular expression.
    Regex(Regex),
}

impl RemotePattern {
    fn parse(remote: &str) -> Result<Self> {
        if remote == WILDCARD {
            return Ok(Self::Wildcard);
        }
        if remote.starts_with('^') && remote.ends_with('$') {
            let re = Regex::new(remote).map_err(|e| {
                Error::bad_parameter(format!(
                    "failed to parse 'remote' parameter for role_map: {e}"
                ))
            })?;
            return Ok(Self::Regex(re));
        }
        if remote.contains('*') {
            let pattern = remote
                .split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join("(.*)");
            let re = Regex::new(&format!("^{pattern}$")).map_err(|e| {
                Error::bad_parameter(format!(
                    "failed to parse 'remote' parameter for role_map: {e}"
                ))
            })?;
            return Ok(Self::Glob(re));
        }
        Ok(Self::Literal(remote.to_string()))
    }
}

/// A role mapping rule that passed validation.
#[derive(Debug, Clone)]
pub struct ParsedRoleMapping {
    pub remote: String,
    pub pattern: RemotePattern,
    pub local: Vec<String>,
}

/// Validated rules, in their original order.
#[derive(Debug, Clone, Default)]
pub struct ParsedRoleMap {
    rules: Vec<ParsedRoleMapping>,
}

impl ParsedRoleMap {
    pub fn rules(&self) -> &[ParsedRoleMapping] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Checks every rule of a role map and returns the parsed representation.
///
/// Errors name the offending rule by index.
pub fn parse_role_map(role_map: &[RoleMapping]) -> Result<ParsedRoleMap> {
    let mut rules: Vec<ParsedRoleMapping> = Vec::with_capacity(role_map.len());

    for (i, mapping) in role_map.iter().enumerate() {
        if mapping.remote.is_empty() {
            return Err(Error::bad_parameter(format!(
                "role_map[{i}]: missing 'remote' parameter"
            )));
        }
        let pattern = RemotePattern::parse(&mapping.remote)
            .map_err(|e| Error::bad_parameter(format!("role_map[{i}]: {e}")))?;

        if mapping.local.is_empty() {
            return Err(Error::bad_parameter(format!(
                "role_map[{i}]: missing 'local' parameter"
            )));
        }
        for local in &mapping.local {
            if local.is_empty() {
                return Err(Error::bad_parameter(format!(
                    "role_map[{i}]: empty 'local' role name"
                )));
            }
            if local == WILDCARD {
                return Err(Error::bad_parameter(format!(
                    "role_map[{i}]: wildcard value is not supported for 'local' roles"
                )));
            }
        }
        if rules.iter().any(|rule| rule.remote == mapping.remote) {
            return Err(Error::bad_parameter(format!(
                "role_map[{i}]: remote role {:?} match is already specified",
                mapping.remote
            )));
        }

        rules.push(ParsedRoleMapping {
            remote: mapping.remote.clone(),
            pattern,
            local: mapping.local.clone(),
        });
    }

    Ok(ParsedRoleMap { rules })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(remote: &str, local: &[&str]) -> RoleMapping {
        RoleMapping::new(remote, local.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_empty_role_map_is_valid() {
        assert!(parse_role_map(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_patterns_are_classified() {
        let parsed = parse_role_map(&[
            mapping("*", &["guest"]),
            mapping("admin", &["admin"]),
            mapping("dev-*", &["dev"]),
            mapping("^ops-(.*)$", &["ops"]),
        ])
        .unwrap();

        let kinds: Vec<_> = parsed
            .rules()
            .iter()
            .map(|rule| match rule.pattern {
                RemotePattern::Wildcard => "wildcard",
                RemotePattern::Literal(_) => "literal",
                RemotePattern::Glob(_) => "glob",
                RemotePattern::Regex(_) => "regex",
            })
            .collect();
        assert_eq!(kinds, vec!["wildcard", "literal", "glob", "regex"]);
    }

    #[test]
    fn test_glob_is_anchored_and_escaped() {
        let parsed = parse_role_map(&[mapping("dev.*", &["dev"])]).unwrap();
        let RemotePattern::Glob(re) = &parsed.rules()[0].pattern else {
            panic!("expected glob");
        };
        assert!(re.is_match("dev.team"));
        assert!(!re.is_match("devXteam"));
        assert!(!re.is_match("my-dev.team"));
    }

    #[test]
    fn test_missing_remote_rejected() {
        let err = parse_role_map(&[mapping("admin", &["a"]), mapping("", &["b"])]).unwrap_err();
        assert!(err.is_bad_parameter());
        assert!(err.to_string().starts_with("role_map[1]"));
    }

    #[test]
    fn test_missing_local_rejected() {
        assert!(parse_role_map(&[mapping("admin", &[])]).is_err());
        assert!(parse_role_map(&[mapping("admin", &[""])]).is_err());
    }

    #[test]
    fn test_wildcard_local_rejected() {
        assert!(parse_role_map(&[mapping("admin", &["*"])]).is_err());
    }

    #[test]
    fn test_duplicate_remote_rejected() {
        let err =
            parse_role_map(&[mapping("admin", &["a"]), mapping("admin", &["b"])]).unwrap_err();
        assert!(err.to_string().contains("already specified"));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let err = parse_role_map(&[mapping("^admin($", &["a"])]).unwrap_err();
        assert!(err.is_bad_parameter());
    }
}
