//! Shallow, admission-time validation shared by the user and policy
//! services.

/// Validates a username: 3-32 chars, `[A-Za-z0-9_-]`.
pub fn validate_user_name(name: &str) -> bool {
    let len = name.chars().count();
    if !(3..=32).contains(&len) {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Validates an email address with a pragmatic (not RFC 5322-exhaustive)
/// pattern: a non-empty local part and a domain part containing a dot.
pub fn validate_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    let Some((domain_name, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    if domain_name.is_empty() || tld.len() < 2 {
        return false;
    }
    let local_ok = local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    let domain_ok = domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    local_ok && domain_ok
}

/// Shallow admission-time validation for a policy document: the document
/// must contain the literal `statement` key and either `allow` or `deny`
/// as an effect value, matched case-insensitively. The wire format
/// accepts both the lowercase field names the engine's own documents use
/// (`"statement"`, `"effect"`, ...) and the capitalized, AWS-IAM-shaped
/// variant (`"Statement"`, `"Effect"`, ...); a case-sensitive check here
/// would admit one spelling and reject a document the engine can still
/// parse, or vice versa. The policy engine performs the fuller structural
/// parse at evaluation time.
pub fn validate_policy_document(policy_doc: &str) -> bool {
    let lower = policy_doc.to_ascii_lowercase();
    lower.contains("\"statement\"") && (lower.contains("\"allow\"") || lower.contains("\"deny\""))
}
