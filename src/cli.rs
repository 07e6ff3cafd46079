use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lease-quote", version, about = "Lease quote calculator")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the quote server (default)
    Start,

    /// Test configuration file validity
    Test,

    /// Price a quote file offline and print the option summaries
    Calc {
        /// Quote as JSON
        quote: PathBuf,

        /// Rate factor table as JSON (defaults to the one stored in the database)
        #[arg(short, long)]
        rates: Option<PathBuf>,

        /// TCO settings as JSON (defaults to the ones stored in the database)
        #[arg(short, long)]
        tco_settings: Option<PathBuf>,

        /// Partner commission in percent
        #[arg(long, default_value = "0")]
        commission: f64,
    },

    /// Rate factor table management
    Rates {
        #[command(subcommand)]
        action: RatesCommands,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum RatesCommands {
    /// Import a rate table JSON file into the database
    Import {
        file: PathBuf,

        /// Name recorded in the update log
        #[arg(short, long, default_value = "cli")]
        actor: String,
    },

    /// Print the stored rate table
    Show,
}

impl Cli {
    /// Get the command to execute, defaulting to Start if none provided
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_start() {
        let cli = Cli {
            config: PathBuf::from("config.toml"),
            command: None,
        };

        assert!(matches!(cli.get_command(), Commands::Start));
    }

    #[test]
    fn test_cli_parsing_calc() {
        let args = vec![
            "lease-quote",
            "calc",
            "quote.json",
            "--rates",
            "rates.json",
            "--commission",
            "4.5",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.get_command() {
            Commands::Calc {
                quote,
                rates,
                tco_settings,
                commission,
            } => {
                assert_eq!(quote, PathBuf::from("quote.json"));
                assert_eq!(rates, Some(PathBuf::from("rates.json")));
                assert!(tco_settings.is_none());
                assert_eq!(commission, 4.5);
            }
            _ => panic!("Expected Calc command"),
        }
    }

    #[test]
    fn test_cli_parsing_rates_import() {
        let args = vec!["lease-quote", "-c", "prod.toml", "rates", "import", "rates.json"];
        let cli = Cli::try_parse_from(args).unwrap();

        assert_eq!(cli.config, PathBuf::from("prod.toml"));
        match cli.get_command() {
            Commands::Rates {
                action: RatesCommands::Import { file, actor },
            } => {
                assert_eq!(file, PathBuf::from("rates.json"));
                assert_eq!(actor, "cli");
            }
            _ => panic!("Expected Rates Import command"),
        }
    }

    #[test]
    fn test_calc_requires_quote_file() {
        let args = vec!["lease-quote", "calc"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
