use anyhow::{Context, Result, bail};
use serde_json::json;
use std::io::{self, BufRead, IsTerminal, Write};

use larder_core::session::{Credential, SessionSource};

use crate::client::{RecipeServiceClient, is_auth_rejection};
use crate::config::Config;
use crate::session_file::FileSession;

/// Verifies a bearer token against the profile endpoint and stores it.
/// Without an argument the token is read from stdin.
pub(crate) async fn cmd_auth_token(
    config: &Config,
    token: Option<String>,
    json: bool,
) -> Result<()> {
    let token = match token {
        Some(t) => t,
        None => read_token()?,
    };
    let Some(credential) = Credential::new(token.trim()) else {
        bail!("Token must not be empty");
    };

    let client = RecipeServiceClient::new(&config.api_base_url.value)?;
    let user = match client.fetch_profile(&credential).await {
        Ok(user) => user,
        Err(e) if is_auth_rejection(&e) => bail!("The service rejected this token"),
        Err(e) => return Err(e).context("Failed to verify token"),
    };

    let path = config.session_path();
    FileSession::save(&path, &credential, Some(&user))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&json!({ "user": user }))?);
    } else {
        println!("Logged in as {} (@{})", user.name, user.username);
    }
    Ok(())
}

pub(crate) fn cmd_auth_status(config: &Config, json: bool) -> Result<()> {
    let session = FileSession::load(&config.session_path())?;
    let logged_in = session.credential().is_some();
    let user = session.current_user();

    if json {
        let out = json!({
            "logged_in": logged_in,
            "user": user,
            "session_file": session.path(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match (logged_in, user) {
        (true, Some(u)) => println!("Logged in as {} (@{})", u.name, u.username),
        (true, None) => println!("Logged in (profile unknown)"),
        (false, _) => println!("Not logged in"),
    }
    println!("Session file: {}", session.path().display());
    Ok(())
}

pub(crate) fn cmd_auth_logout(config: &Config, json: bool) -> Result<()> {
    let removed = FileSession::clear(&config.session_path())?;
    if json {
        println!("{}", json!({ "logged_out": removed }));
    } else if removed {
        println!("Logged out");
    } else {
        println!("No session to remove");
    }
    Ok(())
}

fn read_token() -> Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!("Paste your API token: ");
        io::stderr().flush()?;
    }
    let line = stdin.lock().lines().next().context("No token given")??;
    Ok(line)
}
