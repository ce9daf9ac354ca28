use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "orpheus")]
#[command(version)]
#[command(about = "Conversational DevOps assistant with cloud, shell and GitHub tools.", long_about = None)]
pub struct Cli {
    /// Operations document embedded verbatim in the system directive
    #[arg(long, default_value = "config.yml")]
    pub operations: PathBuf,

    /// Optional TOML settings file
    #[arg(long, default_value = "orpheus.toml")]
    pub settings: PathBuf,

    /// Send a single message, print the answer and exit
    #[arg(short, long)]
    pub message: Option<String>,

    /// Log at info level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["orpheus"]).unwrap();
        assert_eq!(cli.operations, PathBuf::from("config.yml"));
        assert_eq!(cli.settings, PathBuf::from("orpheus.toml"));
        assert!(cli.message.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_one_shot_flags() {
        let cli = Cli::try_parse_from([
            "orpheus",
            "--operations",
            "ops/prod.yml",
            "-m",
            "list my repos",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.operations, PathBuf::from("ops/prod.yml"));
        assert_eq!(cli.message.as_deref(), Some("list my repos"));
        assert!(cli.verbose);
    }
}
