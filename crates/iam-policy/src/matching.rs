//! Action and resource pattern matching for policy statements.

/// Matches `action` against each pattern in `patterns`, tried in order:
/// `"*"`, exact equality, then `<service>:*`.
pub fn match_action(patterns: &[String], action: &str) -> bool {
    patterns.iter().any(|pattern| {
        if pattern == "*" {
            return true;
        }
        if pattern == action {
            return true;
        }
        if let Some(service_prefix) = pattern.strip_suffix(":*") {
            return action.starts_with(&format!("{service_prefix}:"));
        }
        false
    })
}

/// Matches `resource` against each pattern in `patterns`, tried in order:
/// `"*"`, exact equality, then ARN segment matching.
pub fn match_resource(patterns: &[String], resource: &str) -> bool {
    patterns.iter().any(|pattern| {
        pattern == "*" || pattern == resource || match_arn_pattern(pattern, resource)
    })
}

/// Splits `pattern` and `arn` on `:` and requires an equal segment count;
/// each segment matches if it equals the resource segment exactly, or
/// contains a `*` that glob-matches it (a bare `"*"` segment is the
/// special case of a glob with nothing either side). A single `*` per
/// segment is all this supports: `"instance/*"` matches `"instance/i"`,
/// but nested wildcards beyond one per segment are not evaluated as a
/// glob chain.
fn match_arn_pattern(pattern: &str, arn: &str) -> bool {
    let pattern_parts: Vec<&str> = pattern.split(':').collect();
    let arn_parts: Vec<&str> = arn.split(':').collect();

    if pattern_parts.len() != arn_parts.len() {
        return false;
    }

    pattern_parts
        .iter()
        .zip(arn_parts.iter())
        .all(|(p, a)| segment_matches(p, a))
}

/// Matches a single ARN segment. `"*"` or a pattern segment containing
/// `*` is treated as a prefix/suffix glob around the first `*`; a segment
/// with no `*` must equal the resource segment exactly.
fn segment_matches(pattern_segment: &str, resource_segment: &str) -> bool {
    match pattern_segment.split_once('*') {
        Some((prefix, suffix)) => {
            resource_segment.starts_with(prefix) && resource_segment.ends_with(suffix)
        }
        None => pattern_segment == resource_segment,
    }
}
