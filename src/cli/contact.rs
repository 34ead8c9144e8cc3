use arion_core::ContactRequestMessage;
use clap::{arg, Arg, Command};

use crate::context::Context;

pub fn args() -> Command {
    Command::new("contact")
        .about("send a message to the Arion Flow team")
        .arg(arg!(<NAME> "your name"))
        .arg(arg!(<EMAIL> "reply address"))
        .arg(arg!(<MESSAGE> "message"))
        .arg(Arg::new("company").long("company").help("company name"))
        .arg_required_else_help(true)
}

pub async fn handlers(model_match: &clap::ArgMatches, context: &mut Context) -> anyhow::Result<()> {
    let field = |name: &str| {
        model_match
            .get_one::<String>(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("{} expected", name.to_lowercase()))
    };

    let message = ContactRequestMessage {
        name: field("NAME")?,
        email: field("EMAIL")?,
        company: model_match.get_one::<String>("company").cloned(),
        message: field("MESSAGE")?,
    };

    context.anonymous_client()?.submit_contact(&message).await?;

    tracing::info!("message sent");

    Ok(())
}
