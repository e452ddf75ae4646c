use super::progress::Spinner;
use super::{prompts, Session};
use crate::output::Output;
use crate::AuthCommands;
use chrono::Utc;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use owo_colors::OwoColorize;
use serde_json::json;
use traktarr_api::{AuthProvider, OAuthClient, TokenAuth, TokenInfo};

pub async fn run_auth(cmd: AuthCommands, output: &Output) -> Result<()> {
    let session = Session::load()?;
    match cmd {
        AuthCommands::Login { code } => login(&session, code, output).await,
        AuthCommands::Status => status(&session, output),
        AuthCommands::Logout => logout(&session, output).await,
        AuthCommands::Refresh => refresh(&session, output).await,
    }
}

/// Device flow unless `code` is given; an empty code means "prompt for it".
pub async fn login(session: &Session, code: Option<String>, output: &Output) -> Result<()> {
    let oauth = session.oauth()?;
    let token = match code {
        Some(code) => login_with_code(&oauth, code, output).await?,
        None => login_with_device(&oauth, output).await?,
    };
    save_token(&session.auth, &token, output)
}

async fn login_with_device(oauth: &OAuthClient, output: &Output) -> Result<TokenInfo> {
    let device = oauth
        .request_device_code()
        .await
        .map_err(|e| eyre!("Failed to request a Trakt device code: {}", e))?;

    if output.is_human() {
        output.println("");
        output.println(format!(
            "{} Open {} and enter the code {}",
            "→".bright_blue(),
            device.verification_url.bright_white(),
            device.user_code.bold().bright_green()
        ));
        output.println("");
    } else {
        output.json(&json!({
            "type": "device_code",
            "verification_url": device.verification_url,
            "user_code": device.user_code,
            "expires_in": device.expires_in,
        }));
    }

    let spinner = Spinner::start("Waiting for approval...");
    let result = oauth.wait_for_device_token(&device).await;
    spinner.finish();
    result.map_err(|e| eyre!("Trakt device authorization failed: {}", e))
}

async fn login_with_code(oauth: &OAuthClient, code: String, output: &Output) -> Result<TokenInfo> {
    let code = if code.trim().is_empty() {
        // Only the browser round trip needs the state value
        let state = format!("{:x}", Utc::now().timestamp_millis());
        let url = oauth
            .authorization_url(&state)
            .map_err(|e| eyre!("Failed to build the authorization URL: {}", e))?;
        output.info(format!("Authorize traktarr at: {}", url));
        prompts::prompt_string("Authorization code", None)?
    } else {
        code
    };

    oauth
        .exchange_code(&code)
        .await
        .map_err(|e| eyre!("Trakt code exchange failed: {}", e))
}

fn save_token(auth: &TokenAuth, token: &TokenInfo, output: &Output) -> Result<()> {
    auth.save(token)
        .map_err(|e| eyre!("Failed to save Trakt tokens: {}", e))?;
    output.success("Trakt authentication successful!");
    output.println(format!(
        "  Access token expires at: {}",
        token.expires_at.to_rfc3339().bright_green()
    ));
    Ok(())
}

fn status(session: &Session, output: &Output) -> Result<()> {
    let authenticated = session.auth.is_authenticated();
    let expires_at = session.auth.token_info().map(|t| t.expires_at);

    if !output.is_human() {
        output.json(&json!({
            "authenticated": authenticated,
            "expires_at": expires_at.map(|e| e.to_rfc3339()),
        }));
        return Ok(());
    }

    match (authenticated, expires_at) {
        (true, Some(expires)) => {
            output.success(format!("Signed in to Trakt (token expires {})", expires.to_rfc3339()))
        }
        (false, Some(expires)) => output.warn(format!(
            "Stored Trakt token expired at {}. Run `traktarr auth refresh` or `traktarr auth login`.",
            expires.to_rfc3339()
        )),
        _ => output.warn("Not signed in. Run `traktarr auth login`."),
    }
    Ok(())
}

async fn logout(session: &Session, output: &Output) -> Result<()> {
    let oauth = session.oauth()?;
    session
        .auth
        .logout(&oauth)
        .await
        .map_err(|e| eyre!("Failed to clear Trakt tokens: {}", e))?;
    output.success("Signed out of Trakt");
    Ok(())
}

async fn refresh(session: &Session, output: &Output) -> Result<()> {
    let oauth = session.oauth()?;
    let spinner = Spinner::start("Refreshing Trakt token...");
    let result = session.auth.refresh(&oauth).await;
    spinner.finish();
    let token = result.map_err(|e| eyre!("Token refresh failed: {}", e))?;
    output.success(format!(
        "Refreshed Trakt token (expires {})",
        token.expires_at.to_rfc3339()
    ));
    Ok(())
}
