//! Parses and formats the `Authorization: Signature keyId="...",...` header
//! shared by both HTTP surfaces.

use onix_types::AuthHeader;

use crate::error::AuthError;

const FIXED_HEADERS: [&str; 3] = ["(created)", "(expires)", "digest"];

/// Finds `attr="value"` within a comma-separated `Signature ...` header and
/// returns the unquoted value.
fn find_attr<'a>(raw: &'a str, attr: &str) -> Option<&'a str> {
    let needle = format!("{attr}=\"");
    let start = raw.find(&needle)? + needle.len();
    let rest = &raw[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

/// Parses a `Signature keyId="sub|unique|algo",algorithm="...",created="...",
/// expires="...",headers="...",signature="..."` header value.
///
/// Fails with `INVALID_AUTH_HEADER` when `keyId` is absent or does not split
/// into exactly three `|`-separated, whitespace-trimmed components.
pub fn parse(raw: &str) -> Result<AuthHeader, AuthError> {
    let key_id_raw = find_attr(raw, "keyId")
        .ok_or_else(|| AuthError::invalid_auth_header("missing keyId attribute"))?;

    let parts: Vec<&str> = key_id_raw.split('|').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(AuthError::invalid_auth_header(format!(
            "keyId must have exactly 3 '|'-separated components, got {}",
            parts.len()
        )));
    }
    let (subscriber_id, unique_key_id, algorithm_from_key_id) = (parts[0], parts[1], parts[2]);

    let algorithm = find_attr(raw, "algorithm").unwrap_or(algorithm_from_key_id);

    let created = find_attr(raw, "created")
        .ok_or_else(|| AuthError::invalid_auth_header("missing created attribute"))?
        .parse::<i64>()
        .map_err(|_| AuthError::invalid_auth_header("created is not a valid unix timestamp"))?;

    let expires = find_attr(raw, "expires")
        .ok_or_else(|| AuthError::invalid_auth_header("missing expires attribute"))?
        .parse::<i64>()
        .map_err(|_| AuthError::invalid_auth_header("expires is not a valid unix timestamp"))?;

    let signature = find_attr(raw, "signature")
        .ok_or_else(|| AuthError::invalid_auth_header("missing signature attribute"))?
        .to_string();

    Ok(AuthHeader {
        key_id: format!("{subscriber_id}|{unique_key_id}|{algorithm}"),
        algorithm: algorithm.to_string(),
        created,
        expires,
        headers: FIXED_HEADERS.iter().map(|s| s.to_string()).collect(),
        signature,
    })
}

/// Formats an [`AuthHeader`] back into wire form.
pub fn format(header: &AuthHeader) -> String {
    format!(
        "Signature keyId=\"{}\",algorithm=\"{}\",created=\"{}\",expires=\"{}\",headers=\"{}\",signature=\"{}\"",
        header.key_id,
        header.algorithm,
        header.created,
        header.expires,
        FIXED_HEADERS.join(" "),
        header.signature,
    )
}
