/// Gateway used when none is configured
pub const DEFAULT_IPFS_GATEWAY: &str = "https://gateway.pinata.cloud/ipfs/";

/// Rewrite an `ipfs://` URI onto an HTTP gateway; other URIs pass through
pub fn resolve_ipfs(uri: &str, gateway: &str) -> String {
    match uri.strip_prefix("ipfs://") {
        Some(cid) => {
            let cid = cid.strip_prefix("ipfs/").unwrap_or(cid);
            if gateway.ends_with('/') {
                format!("{}{}", gateway, cid)
            } else {
                format!("{}/{}", gateway, cid)
            }
        }
        None => uri.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_ipfs() {
        assert_eq!(
            resolve_ipfs("ipfs://bafkcid", DEFAULT_IPFS_GATEWAY),
            "https://gateway.pinata.cloud/ipfs/bafkcid"
        );
        assert_eq!(
            resolve_ipfs("ipfs://ipfs/bafkcid", "https://ipfs.io/ipfs"),
            "https://ipfs.io/ipfs/bafkcid"
        );
        assert_eq!(resolve_ipfs("https://x.y/z.png", DEFAULT_IPFS_GATEWAY), "https://x.y/z.png");
    }
}
