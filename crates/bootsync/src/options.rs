use anyhow::{Context, Result, bail};
use edera_bootsync_settings::TIMEOUT_DISABLED;
use jaarg::alloc::ParseMapResult;
use jaarg::{
    ErrorUsageWriter, ErrorUsageWriterContext, HelpWriter, HelpWriterContext, Opt, Opts,
    StandardErrorUsageWriter, StandardFullHelpWriter,
};
use log::{error, info};

/// Default configuration file path.
const DEFAULT_CONFIG_PATH: &str = "/etc/bootsync/bootsync.toml";

/// The value accepted by --set-timeout to disable the timeout.
const TIMEOUT_DISABLED_NAME: &str = "disabled";

/// The operation bootsync performs after loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Only reconcile the boot configuration and wait for regeneration.
    Sync,
    /// Print the full titles of all menu entries.
    ListEntries,
    /// Print the titles of the top-level menu entries.
    ListSimpleEntries,
    /// Print the default entry.
    GetDefaultEntry,
    /// Change the default entry.
    SetDefaultEntry(String),
    /// Print the timeout.
    GetTimeout,
    /// Change the timeout.
    SetTimeout(i32),
    /// Print the graphics mode.
    GetGfxmode,
}

/// The parsed options of bootsync.
#[derive(Debug)]
pub struct BootsyncOptions {
    /// Path to a configuration file to load.
    pub config: String,
    /// Enables debug logging.
    pub debug: bool,
    /// The operation to perform.
    pub action: Action,
}

/// The default bootsync options.
impl Default for BootsyncOptions {
    fn default() -> Self {
        Self {
            config: DEFAULT_CONFIG_PATH.to_string(),
            debug: false,
            action: Action::Sync,
        }
    }
}

/// Parses a timeout given on the command line. `disabled` is accepted for the disabled value.
fn parse_timeout(value: &str) -> Result<i32> {
    if value == TIMEOUT_DISABLED_NAME {
        return Ok(TIMEOUT_DISABLED);
    }
    value
        .parse::<i32>()
        .context("set-timeout must be a number or 'disabled'")
}

/// The options parser mechanism for bootsync.
impl BootsyncOptions {
    /// Produces [BootsyncOptions] from the arguments of the process.
    pub fn parse() -> Result<Self> {
        // All the options for the bootsync executable.
        const OPTIONS: Opts<&str> = Opts::new(&[
            Opt::help_flag("help", &["--help"]).help_text("Display bootsync help"),
            Opt::flag("debug", &["-d", "--debug"]).help_text("Enable debug logging"),
            Opt::value("config", &["--config"], "PATH")
                .help_text("Path to bootsync configuration file"),
            Opt::flag("list-entries", &["--list-entries"])
                .help_text("List the full titles of all menu entries"),
            Opt::flag("list-simple-entries", &["--list-simple-entries"])
                .help_text("List the titles of the top-level menu entries"),
            Opt::flag("get-default-entry", &["--get-default-entry"])
                .help_text("Print the default entry"),
            Opt::value("set-default-entry", &["--set-default-entry"], "TITLE")
                .help_text("Set the default entry to a top-level entry"),
            Opt::flag("get-timeout", &["--get-timeout"]).help_text("Print the boot menu timeout"),
            Opt::value("set-timeout", &["--set-timeout"], "SECONDS")
                .help_text("Set the boot menu timeout, or 'disabled'"),
            Opt::flag("get-gfxmode", &["--get-gfxmode"]).help_text("Print the graphics mode"),
        ]);

        // Skip the first argument, which is the path to our executable.
        let args = std::env::args().skip(1).collect::<Vec<_>>();

        // Parse the OPTIONS into a map using jaarg.
        let parsed = match OPTIONS.parse_map(
            "bootsync",
            args.iter(),
            |program_name| {
                let ctx = HelpWriterContext {
                    options: &OPTIONS,
                    program_name,
                };
                info!("{}", StandardFullHelpWriter::new(ctx));
            },
            |program_name, error| {
                let ctx = ErrorUsageWriterContext {
                    options: &OPTIONS,
                    program_name,
                    error,
                };
                error!("{}", StandardErrorUsageWriter::new(ctx));
            },
        ) {
            ParseMapResult::Map(map) => map,
            ParseMapResult::ExitSuccess => std::process::exit(0),
            ParseMapResult::ExitFailure => std::process::exit(1),
        };

        Self::produce(parsed)
    }

    /// Produces [BootsyncOptions] from the `parsed` option names and values.
    pub fn produce<K: AsRef<str>>(parsed: impl IntoIterator<Item = (K, String)>) -> Result<Self> {
        // Use the default value of bootsync options and have the raw options be parsed into it.
        let mut result = Self::default();
        let mut action = None;

        for (key, value) in parsed {
            let key = key.as_ref();
            let selected = match key {
                "debug" => {
                    result.debug = true;
                    continue;
                }

                "config" => {
                    result.config = value;
                    continue;
                }

                "list-entries" => Action::ListEntries,
                "list-simple-entries" => Action::ListSimpleEntries,
                "get-default-entry" => Action::GetDefaultEntry,
                "set-default-entry" => Action::SetDefaultEntry(value),
                "get-timeout" => Action::GetTimeout,
                "set-timeout" => Action::SetTimeout(parse_timeout(&value)?),
                "get-gfxmode" => Action::GetGfxmode,

                _ => bail!("unknown option: --{key}"),
            };

            // Only a single action can run per invocation.
            if action.replace(selected).is_some() {
                bail!("only one action can be specified, --{key} conflicts");
            }
        }

        result.action = action.unwrap_or(Action::Sync);
        Ok(result)
    }
}
