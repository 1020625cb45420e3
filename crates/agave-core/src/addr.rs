// Remote address parsing.

use crate::error::CoreError;

/// Split `"host:port"` / `"[v6]:port"` into its parts.
///
/// The host is returned as written (no DNS, no IP validation) so sensors
/// behind proxies that rewrite the peer address still produce events.
pub fn split_host_port(addr: &str) -> Result<(String, u16), CoreError> {
    let malformed = |reason: String| CoreError::MalformedAddress {
        addr: addr.to_owned(),
        reason,
    };

    let (host, port) = if let Some(rest) = addr.strip_prefix('[') {
        let (host, after) = rest
            .split_once(']')
            .ok_or_else(|| malformed("missing ']' in address".into()))?;
        let port = after
            .strip_prefix(':')
            .ok_or_else(|| malformed("missing port in address".into()))?;
        (host, port)
    } else {
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| malformed("missing port in address".into()))?;
        if host.contains(':') {
            return Err(malformed("too many colons in address".into()));
        }
        if host.contains(['[', ']']) {
            return Err(malformed("unexpected bracket in address".into()));
        }
        (host, port)
    };

    let port: u16 = port
        .parse()
        .map_err(|e| malformed(format!("invalid port {port:?}: {e}")))?;

    Ok((host.to_owned(), port))
}
