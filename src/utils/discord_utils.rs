use tracing::warn;

//Accepts either a bare invite code or a full invite URL; the code is the
//trailing path segment either way.
pub fn extract_invite_code(discord_server: &str) -> Option<String> {
    let trimmed = discord_server.trim();
    if trimmed.is_empty() {
        return None;
    }

    let code = trimmed.rsplit('/').next().unwrap_or_default();
    if code.is_empty() {
        return None;
    }

    Some(code.to_string())
}

//Best effort only. Any failure degrades to "no invite data"; a profile
//render never depends on Discord being reachable.
pub async fn fetch_invite(api_url: &str, code: &str) -> Option<serde_json::Value> {
    let response = reqwest::get(format!("{}/invites/{}?with_counts=true", api_url, code)).await;

    if let Err(error) = response {
        warn!("Failed to fetch discord invite: {}", error);
        return None;
    }

    let response = response.unwrap();

    let status = response.status();

    if !status.is_success() {
        warn!("Discord invite lookup returned {}", status);
        return None;
    }

    match response.json::<serde_json::Value>().await {
        Err(error) => {
            warn!("Failed to parse discord invite response: {}", error);
            None
        }
        Ok(invite) => Some(invite),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_codes_pass_through() {
        assert_eq!(extract_invite_code("abc123").as_deref(), Some("abc123"));
    }

    #[test]
    fn full_urls_yield_the_trailing_segment() {
        assert_eq!(
            extract_invite_code("https://discord.gg/abc123").as_deref(),
            Some("abc123")
        );
        assert_eq!(
            extract_invite_code("  https://discord.com/invite/xyz  ").as_deref(),
            Some("xyz")
        );
    }

    #[test]
    fn empty_input_yields_no_code() {
        assert_eq!(extract_invite_code(""), None);
        assert_eq!(extract_invite_code("   "), None);
        assert_eq!(extract_invite_code("https://discord.gg/"), None);
    }
}
