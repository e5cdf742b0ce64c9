use serde::Deserialize;

use super::{display_option, parse, Session};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
}

#[derive(Debug, Deserialize)]
struct UserProfile {
    username: String,
    full_name: Option<String>,
    email: Option<String>,
    disabled: bool,
}

pub async fn login(session: &Session, username: &str, password: &str) -> anyhow::Result<()> {
    let response = session
        .client()
        .post(session.url("/token"))
        .form(&[("username", username), ("password", password)])
        .send()
        .await?;
    let token: TokenResponse = parse(response).await?;
    println!("Logged in as {}", username);
    println!();
    println!("  Token ({}): {}", token.token_type, token.access_token);
    println!();
    println!("export AGRIMOVE_TOKEN={}", token.access_token);
    Ok(())
}

pub async fn register(
    session: &Session,
    username: &str,
    password: &str,
    full_name: Option<String>,
    email: Option<String>,
) -> anyhow::Result<()> {
    let mut form = vec![
        ("username", username.to_string()),
        ("password", password.to_string()),
        ("confirm_password", password.to_string()),
    ];
    if let Some(full_name) = full_name {
        form.push(("full_name", full_name));
    }
    if let Some(email) = email {
        form.push(("email", email));
    }
    let response = session
        .client()
        .post(session.url("/register"))
        .form(&form)
        .send()
        .await?;
    let profile: UserProfile = parse(response).await?;
    println!("Registered {}. Log in with `agrimove login`.", profile.username);
    Ok(())
}

pub async fn whoami(session: &Session) -> anyhow::Result<()> {
    let response = session.get("/users/me")?.send().await?;
    let profile: UserProfile = parse(response).await?;
    println!("  Username:  {}", profile.username);
    println!("  Full name: {}", display_option(&profile.full_name));
    println!("  Email:     {}", display_option(&profile.email));
    println!("  Disabled:  {}", profile.disabled);
    Ok(())
}
