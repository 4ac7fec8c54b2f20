//! # check_beanstalk_age
//!
//! Monitoring plugin reporting how long the oldest ready job in each selected
//! beanstalkd tube has been waiting. Prints one status line on stdout and exits
//! with the standard code (0 OK, 1 WARNING, 2 CRITICAL, 3 UNKNOWN).

use anyhow::Context;
use beanstalk_check::logging::{init_logging, LogFormat};
use beanstalk_check::{
    run_check, system, CheckConfig, CheckStatus, SelectorToken, ServerAddress, ThresholdSpec,
    TracingSink, PLUGIN_SHORT_NAME,
};
use clap::Parser;
use std::process;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Parser, Debug)]
#[command(name = "check_beanstalk_age")]
#[command(about = "Check the age of the oldest ready job in beanstalkd tubes")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(after_help = "\
Tube selectors are applied in order. A leading '!' excludes, a leading '~'
(after any '!') matches the rest as a regular expression:

  -t jobs              check only the 'jobs' tube
  -t '!~^tmp'          check every tube except those starting with 'tmp'
  -t '~mail' -t '!mail_bulk'
                       check tubes containing 'mail', except 'mail_bulk'

Thresholds use standard range syntax in seconds; '-w 60' warns above 60s.")]
struct Cli {
    /// Server host[:port], or absolute path of a unix socket
    #[arg(short = 'H', long)]
    hostname: String,

    /// Server port (overrides any port in --hostname)
    #[arg(short, long)]
    port: Option<u16>,

    /// Tube selector; repeat to build the set of tubes to check
    #[arg(
        short,
        long = "tube",
        value_name = "SELECTOR",
        allow_hyphen_values = true
    )]
    tubes: Vec<String>,

    /// Warning range for job age in seconds
    #[arg(short, long, value_name = "RANGE", allow_hyphen_values = true)]
    warning: Option<String>,

    /// Critical range for job age in seconds
    #[arg(short, long, value_name = "RANGE", allow_hyphen_values = true)]
    critical: Option<String>,

    /// Verbose diagnostics on stderr (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Attempts per tube when the peeked job keeps getting reserved
    #[arg(long, default_value_t = system::DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Connect timeout in seconds
    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = system::DEFAULT_CONNECT_TIMEOUT.as_secs()
    )]
    timeout: u64,

    /// Diagnostic log format (text, json)
    #[arg(long, default_value = "text")]
    log_format: LogFormat,
}

fn build_config(cli: &Cli) -> anyhow::Result<CheckConfig> {
    let address = ServerAddress::resolve(&cli.hostname, cli.port).context("invalid --hostname")?;

    let selectors = cli
        .tubes
        .iter()
        .map(|raw| SelectorToken::parse(raw))
        .collect::<Result<Vec<_>, _>>()
        .context("invalid --tube")?;

    let thresholds = ThresholdSpec::parse(cli.warning.as_deref(), cli.critical.as_deref())
        .context("invalid threshold")?;

    let config = CheckConfig::new(address)
        .with_selectors(selectors)
        .with_thresholds(thresholds)
        .with_max_attempts(cli.max_attempts)
        .with_connect_timeout(Duration::from_secs(cli.timeout));
    config.validate()?;

    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);
    debug!(cli = ?cli, "Parsed command line");

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            println!("{PLUGIN_SHORT_NAME} {} - {:#}", CheckStatus::Unknown, e);
            process::exit(CheckStatus::Unknown.exit_code());
        }
    };

    let overall = run_check(&config, &TracingSink).await;
    println!("{}", overall.render());
    process::exit(overall.status.exit_code());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("check_beanstalk_age").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_hostname_is_required() {
        assert!(Cli::try_parse_from(["check_beanstalk_age"]).is_err());
    }

    #[test]
    fn test_repeated_tubes_keep_order() {
        let cli = parse(&[
            "-H", "localhost", "-t", "!~log", "-t", "jobs", "--tube", "~^mail",
        ]);
        let config = build_config(&cli).unwrap();
        let rendered: Vec<String> = config.selectors.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["!~log", "jobs", "~^mail"]);
    }

    #[test]
    fn test_port_and_thresholds() {
        let cli = parse(&[
            "-H", "queue", "-p", "11400", "-w", "10", "-c", "30", "-vv",
        ]);
        assert_eq!(cli.verbose, 2);

        let config = build_config(&cli).unwrap();
        assert_eq!(config.address, ServerAddress::Tcp("queue:11400".to_string()));
        assert_eq!(config.thresholds.classify(40.0), CheckStatus::Critical);
        assert_eq!(config.max_attempts, 5);
    }

    #[test]
    fn test_bad_selector_and_threshold_are_rejected() {
        let cli = parse(&["-H", "localhost", "-t", "~(broken"]);
        assert!(build_config(&cli).is_err());

        let cli = parse(&["-H", "localhost", "-w", "soon"]);
        assert!(build_config(&cli).is_err());

        let cli = parse(&["-H", "localhost", "--max-attempts", "0"]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_negative_range_start_is_accepted() {
        let cli = parse(&["-H", "localhost", "-c", "-5:30"]);
        assert_eq!(cli.critical.as_deref(), Some("-5:30"));
        assert!(build_config(&cli).is_ok());
    }
}
