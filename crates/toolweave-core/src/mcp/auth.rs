//! Request headers derived from connection credentials

use base64::Engine;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde::Deserialize;

use super::connection::{McpAuth, McpConnection};
use super::error::{McpError, McpResult};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

fn header_value(value: &str) -> McpResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| McpError::Auth(format!("invalid header value: {}", e)))
}

fn insert(headers: &mut HeaderMap, name: &str, value: &str) -> McpResult<()> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| McpError::Auth(format!("invalid header name '{}': {}", name, e)))?;
    headers.insert(name, header_value(value)?);
    Ok(())
}

/// Exchange client credentials for an access token (RFC 6749 §4.4)
async fn client_credentials_token(
    http: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    scopes: &[String],
) -> McpResult<String> {
    let scope = scopes.join(" ");
    let mut form = vec![
        ("grant_type", "client_credentials"),
        ("client_id", client_id),
        ("client_secret", client_secret),
    ];
    if !scope.is_empty() {
        form.push(("scope", scope.as_str()));
    }

    let response = http.post(token_url).form(&form).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(McpError::Auth(format!("token endpoint returned {}: {}", status, body)));
    }

    let token: TokenResponse = response.json().await?;
    Ok(token.access_token)
}

/// Build the headers every request to this connection must carry
///
/// Static headers are applied first so credentials cannot be overridden by
/// them.
pub async fn connection_headers(
    connection: &McpConnection,
    http: &reqwest::Client,
) -> McpResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &connection.headers {
        insert(&mut headers, name, value)?;
    }

    match &connection.auth {
        McpAuth::None => {}
        McpAuth::ApiKey { header, key } => insert(&mut headers, header, key)?,
        McpAuth::Basic { username, password } => {
            let encoded = base64::engine::general_purpose::STANDARD
                .encode(format!("{}:{}", username, password));
            headers.insert(AUTHORIZATION, header_value(&format!("Basic {}", encoded))?);
        }
        McpAuth::Bearer { token } => {
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", token))?);
        }
        McpAuth::OAuth2ClientCredentials {
            token_url,
            client_id,
            client_secret,
            scopes,
        } => {
            let token =
                client_credentials_token(http, token_url, client_id, client_secret, scopes).await?;
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", token))?);
        }
        other @ (McpAuth::PrivateKeyJwt { .. } | McpAuth::MutualTls { .. }) => {
            return Err(McpError::UnsupportedAuth(other.kind().to_string()));
        }
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http() -> reqwest::Client {
        reqwest::Client::new()
    }

    #[tokio::test]
    async fn test_api_key_and_custom_headers() {
        let conn = McpConnection::http("jira", "https://example.com/mcp")
            .with_header("X-Tenant", "acme")
            .with_auth(McpAuth::ApiKey {
                header: "X-API-Key".to_string(),
                key: "k-123".to_string(),
            });

        let headers = connection_headers(&conn, &http()).await.unwrap();
        assert_eq!(headers.get("x-tenant").unwrap(), "acme");
        assert_eq!(headers.get("x-api-key").unwrap(), "k-123");
    }

    #[tokio::test]
    async fn test_basic_auth() {
        let conn = McpConnection::http("jira", "https://example.com/mcp").with_auth(McpAuth::Basic {
            username: "user".to_string(),
            password: "pass".to_string(),
        });

        let headers = connection_headers(&conn, &http()).await.unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Basic dXNlcjpwYXNz");
    }

    #[tokio::test]
    async fn test_unsupported_auth() {
        let conn = McpConnection::http("jira", "https://example.com/mcp").with_auth(McpAuth::MutualTls {
            cert_path: "/tmp/c.pem".to_string(),
            key_path: "/tmp/k.pem".to_string(),
        });

        let err = connection_headers(&conn, &http()).await.unwrap_err();
        assert!(matches!(err, McpError::UnsupportedAuth(kind) if kind == "mutual_tls"));
    }
}
