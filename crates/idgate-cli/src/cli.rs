use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "idgate")]
#[command(about = "idgate authorization core: inspect keys and run the login flow")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "IDGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, env = "IDGATE_LOG", default_value = "info")]
    pub log_level: String,

    /// PEM-encoded RSA private key used to sign ID tokens (a fresh key is
    /// generated when omitted)
    #[arg(long, global = true, env = "IDGATE_SIGNING_KEY")]
    pub signing_key: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the public key set as JSON
    Keys,
    /// Run a login, code exchange and refresh against in-memory stores
    Demo(DemoArgs),
}

#[derive(clap::Args)]
pub struct DemoArgs {
    /// Request the offline access scope and exercise the refresh flow
    #[arg(long)]
    pub offline: bool,

    /// Client identifier to register
    #[arg(long, default_value = "example-app")]
    pub client_id: String,

    /// Redirect URL to register for the client
    #[arg(long, default_value = "http://127.0.0.1:5555/callback")]
    pub redirect_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_demo_offline() {
        let cli = Cli::try_parse_from(["idgate", "demo", "--offline"]).unwrap();
        match cli.command {
            Commands::Demo(args) => {
                assert!(args.offline);
                assert_eq!(args.client_id, "example-app");
            }
            Commands::Keys => panic!("expected demo"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "idgate",
            "keys",
            "--config",
            "idgate.toml",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Keys));
        assert_eq!(cli.config, Some(PathBuf::from("idgate.toml")));
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["idgate"]).is_err());
    }
}
