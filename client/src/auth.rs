use anyhow::{Context, Result, bail};

/// Default Showdown login server
pub const LOGIN_URL: &str = "https://play.pokemonshowdown.com/api/login";

/// Exchange credentials and a challstr for a login assertion
pub async fn get_assertion(
    login_url: &str,
    username: &str,
    password: &str,
    challstr: &str,
) -> Result<String> {
    let client = reqwest::Client::new();

    let params = [
        ("name", username),
        ("pass", password),
        ("challstr", challstr),
    ];

    let response = client
        .post(login_url)
        .form(&params)
        .send()
        .await
        .context("Failed to send login request")?;
    let body = response.text().await?;

    parse_login_response(&body)
}

fn parse_login_response(body: &str) -> Result<String> {
    // Response is prefixed with "]"
    let json_str = body.strip_prefix(']').unwrap_or(body);
    let json: serde_json::Value =
        serde_json::from_str(json_str).context("Failed to parse login response")?;

    let assertion = json
        .get("assertion")
        .and_then(|v| v.as_str())
        .context("Login response missing assertion")?;

    if let Some(error) = assertion.strip_prefix(";;") {
        bail!("{error}");
    }
    if json.get("actionsuccess").and_then(|v| v.as_bool()) == Some(false) {
        bail!("login server rejected the credentials");
    }
    Ok(assertion.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_response() {
        let body = r#"]{"actionsuccess":true,"assertion":"abc,def"}"#;
        assert_eq!(parse_login_response(body).unwrap(), "abc,def");
    }

    #[test]
    fn test_parse_login_response_error() {
        let body = r#"]{"actionsuccess":true,"assertion":";;Wrong password."}"#;
        let err = parse_login_response(body).unwrap_err();
        assert_eq!(err.to_string(), "Wrong password.");

        assert!(parse_login_response("]{}").is_err());
        assert!(parse_login_response("not json").is_err());
    }
}
