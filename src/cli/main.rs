use clap::{Arg, Command};

mod contact;
mod context;
mod dashboard;
mod gpu;
mod login;
mod order;
mod org;
mod profile;
mod table;
mod user;

use context::Context;

fn cli() -> Command {
    Command::new("arion")
        .about("GPU workspaces on demand")
        .version("0.1.1")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .env("ARION_ENDPOINT")
                .help("Arion Flow API endpoint"),
        )
        .arg(
            Arg::new("auth-url")
                .long("auth-url")
                .env("SUPABASE_URL")
                .help("auth backend url"),
        )
        .arg(
            Arg::new("anon-key")
                .long("anon-key")
                .env("SUPABASE_ANON_KEY")
                .hide_env_values(true)
                .help("auth backend public key"),
        )
        .subcommand(contact::args())
        .subcommand(dashboard::args())
        .subcommand(gpu::args())
        .subcommand(login::args())
        .subcommand(login::logout_args())
        .subcommand(order::args())
        .subcommand(org::args())
        .subcommand(user::args())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let matches = cli().get_matches();

    let mut context = Context::load(&matches)?;

    match matches.subcommand() {
        Some(("contact", submatches)) => Ok(contact::handlers(submatches, &mut context).await?),
        Some(("dashboard", submatches)) => Ok(dashboard::handlers(submatches, &mut context).await?),
        Some(("gpu", submatches)) => Ok(gpu::handlers(submatches, &mut context).await?),
        Some(("login", submatches)) => Ok(login::handlers(submatches, &mut context).await?),
        Some(("logout", submatches)) => Ok(login::logout(submatches, &mut context).await?),
        Some(("order", submatches)) => Ok(order::handlers(submatches, &mut context).await?),
        Some(("org", submatches)) => Ok(org::handlers(submatches, &mut context).await?),
        Some(("user", submatches)) => Ok(user::handlers(submatches, &mut context).await?),
        _ => unreachable!(), // If all subcommands are defined above, anything else is unreachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn test_order_create_parses() {
        let matches = cli()
            .try_get_matches_from([
                "arion",
                "--endpoint",
                "http://localhost:3000",
                "order",
                "create",
                "training",
                "--datacenter",
                "EU-RO-1",
                "--gpu",
                "Enterprise",
            ])
            .unwrap();

        let (_, order_match) = matches.subcommand().unwrap();
        let (_, create_match) = order_match.subcommand().unwrap();

        assert_eq!(create_match.get_one::<i32>("storage"), Some(&100));
        assert!(cli()
            .try_get_matches_from(["arion", "order", "create", "x", "--datacenter", "AP-JP-1", "--gpu", "A40"])
            .is_err());
    }
}
