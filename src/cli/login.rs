use chrono::Utc;
use clap::{arg, Arg, Command};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::context::Context;

pub fn args() -> Command {
    Command::new("login")
        .about("sign in with email and password")
        .arg_required_else_help(true)
        .arg(arg!(<EMAIL> "account email"))
        .arg(
            Arg::new("password")
                .long("password")
                .env("ARION_PASSWORD")
                .hide_env_values(true)
                .help("password, read from stdin when omitted"),
        )
}

pub fn logout_args() -> Command {
    Command::new("logout").about("sign out and forget the stored session")
}

async fn read_password() -> anyhow::Result<String> {
    eprint!("password: ");

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub async fn handlers(model_match: &clap::ArgMatches, context: &mut Context) -> anyhow::Result<()> {
    let email = model_match
        .get_one::<String>("EMAIL")
        .ok_or_else(|| anyhow::anyhow!("email expected"))?
        .trim()
        .to_lowercase();

    let password = match model_match.get_one::<String>("password") {
        Some(password) => password.clone(),
        None => read_password().await?,
    };

    let session = context
        .auth_client()?
        .sign_in_with_password(&email, &password)
        .await?;

    context.profile.endpoint = Some(context.endpoint.clone());
    context.profile.auth_url = context.auth_url.clone();
    context.profile.anon_key = context.anon_key.clone();
    context.profile.email = Some(email);
    context.profile.store_session(&session, Utc::now());
    context.profile.save()?;

    tracing::info!("logged in as {}", context.profile.email.as_deref().unwrap_or_default());

    Ok(())
}

pub async fn logout(_model_match: &clap::ArgMatches, context: &mut Context) -> anyhow::Result<()> {
    sign_out(context).await
}

/// Revokes the session at the auth backend (best effort) and clears it locally.
pub async fn sign_out(context: &mut Context) -> anyhow::Result<()> {
    if let Some(access_token) = context.profile.access_token.clone() {
        match context.auth_client() {
            Ok(auth) => {
                if let Err(err) = auth.sign_out(&access_token).await {
                    tracing::warn!("sign out at auth backend failed: {}", err);
                }
            }
            Err(err) => tracing::warn!("skipping remote sign out: {}", err),
        }
    }

    context.profile.clear_session();
    context.profile.save()?;

    tracing::info!("logged out");

    Ok(())
}
