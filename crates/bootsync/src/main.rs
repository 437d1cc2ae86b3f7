use anyhow::{Context, Result};
use bootsync::config;
use bootsync::executor::local::LocalExecutor;
use bootsync::logger;
use bootsync::options::{Action, BootsyncOptions};
use bootsync::probe;
use bootsync::service::LogNotifier;
use bootsync::{BootService, Sources, Synchronizer};
use log::error;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

/// Performs the requested `action` against the loaded `service`.
fn perform(service: &BootService, action: &Action) -> Result<()> {
    match action {
        Action::Sync => {}

        Action::ListEntries => {
            for title in service.entry_titles()? {
                println!("{}", title);
            }
        }

        Action::ListSimpleEntries => {
            for title in service.simple_entry_titles()? {
                println!("{}", title);
            }
        }

        Action::GetDefaultEntry => println!("{}", service.default_entry()),

        Action::SetDefaultEntry(title) => service
            .set_default_entry(title)
            .context("unable to set default entry")?,

        Action::GetTimeout => println!("{}", service.timeout()),

        Action::SetTimeout(timeout) => service
            .set_timeout(*timeout)
            .context("unable to set timeout")?,

        Action::GetGfxmode => println!("{}", service.gfxmode()),
    }
    Ok(())
}

/// Run bootsync, returning an error if one occurs.
fn run(options: &BootsyncOptions) -> Result<()> {
    // Load the configuration of bootsync.
    // At this point, the configuration has been validated and the specified
    // version is checked to ensure compatibility.
    let config = config::loader::load(Path::new(&options.config))?;

    // The executor performs all writes and regenerations on this machine.
    let executor = Arc::new(LocalExecutor::new(&config).context("unable to configure executor")?);

    // Detect the display resolution, unless the configuration pins it.
    let probe = probe::from_config(&config.display);

    // Load the boot configuration. Any failure here leaves nothing safe to serve.
    let synchronizer = Synchronizer::load(
        &Sources::from(&config.paths),
        config.theme.main_file.clone(),
        executor,
        probe.as_ref(),
    )
    .context("unable to load boot configuration")?;

    let service = BootService::new(synchronizer, Arc::new(LogNotifier));

    // Always wait for the regeneration worker, even if the action failed.
    let result = perform(&service, &options.action);
    service
        .shutdown()
        .context("unable to finish boot configuration regeneration")?;
    result
}

/// The main entrypoint of bootsync.
fn main() -> ExitCode {
    if let Err(error) = logger::init() {
        eprintln!("{:#}", error);
        return ExitCode::FAILURE;
    }

    // Parse the options to the bootsync executable.
    let options = match BootsyncOptions::parse().context("unable to parse options") {
        Ok(options) => options,
        Err(error) => {
            error!("{:#}", error);
            return ExitCode::FAILURE;
        }
    };
    logger::set_debug(options.debug);

    // Run bootsync, then handle the error.
    if let Err(error) = run(&options) {
        // Print an error trace.
        error!("bootsync encountered an error");
        for (index, stack) in error.chain().enumerate() {
            error!("[{}]: {}", index, stack);
        }
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
