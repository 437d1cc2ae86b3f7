use crate::executor::Executor;
use anyhow::{Context, Result, bail};
use edera_bootsync_config::{Resolution, RootConfiguration};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Suffix of the temporary file written next to a file that is being replaced.
const TEMPORARY_SUFFIX: &str = ".bootsync-new";

/// Executes regeneration requests directly on the local machine.
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    /// The settings file to write.
    settings: PathBuf,
    /// The cache record to write.
    cache: PathBuf,
    /// The command line that regenerates the boot menu, already split into arguments.
    generate: Vec<String>,
    /// The command line template that renders the theme background.
    theme_background: Option<String>,
}

impl LocalExecutor {
    /// Creates a [LocalExecutor] from the `config`, validating the configured commands.
    pub fn new(config: &RootConfiguration) -> Result<Self> {
        let generate = split_command(&config.generate.command)
            .context("invalid boot configuration generation command")?;

        Ok(Self {
            settings: PathBuf::from(&config.paths.settings),
            cache: PathBuf::from(&config.paths.cache),
            generate,
            theme_background: config.generate.theme_background.clone(),
        })
    }
}

/// Splits `command` into arguments using shell quoting rules.
fn split_command(command: &str) -> Result<Vec<String>> {
    let Some(arguments) = shlex::split(command) else {
        bail!("unable to parse command line: {}", command);
    };

    if arguments.is_empty() {
        bail!("command line is empty");
    }
    Ok(arguments)
}

/// Runs `arguments` as a command and waits for it to exit successfully.
fn run(arguments: &[String]) -> Result<()> {
    let Some((program, arguments)) = arguments.split_first() else {
        bail!("command line is empty");
    };

    debug!("running {} {:?}", program, arguments);
    let status = Command::new(program)
        .args(arguments)
        .status()
        .with_context(|| format!("unable to run {}", program))?;

    if !status.success() {
        bail!("{} exited with {}", program, status);
    }
    Ok(())
}

/// Replaces the file at `path` with `content`. The content is written to a temporary file in
/// the same directory first, so readers see either the old or the new file in full.
fn write_replace(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("unable to create directory {}", parent.display()))?;
    }

    let mut temporary = path.as_os_str().to_os_string();
    temporary.push(TEMPORARY_SUFFIX);
    let temporary = PathBuf::from(temporary);

    fs::write(&temporary, content)
        .with_context(|| format!("unable to write {}", temporary.display()))?;
    fs::rename(&temporary, path)
        .with_context(|| format!("unable to replace {}", path.display()))?;
    Ok(())
}

impl Executor for LocalExecutor {
    fn write_settings(&self, content: &str) -> Result<()> {
        write_replace(&self.settings, content)
    }

    fn write_cache(&self, content: &str) -> Result<()> {
        write_replace(&self.cache, content)
    }

    fn generate_boot_config(&self) -> Result<()> {
        run(&self.generate)
    }

    fn generate_theme_background(&self, resolution: Resolution) -> Result<()> {
        let Some(template) = &self.theme_background else {
            debug!("no theme background command configured, skipping");
            return Ok(());
        };

        // Stamp the resolution into the command before splitting it.
        let command = template
            .replace("$width", &resolution.width.to_string())
            .replace("$height", &resolution.height.to_string());
        let arguments =
            split_command(&command).context("invalid theme background command")?;

        info!("generating theme background for {}", resolution);
        run(&arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor(directory: &Path, command: &str, theme_background: Option<&str>) -> LocalExecutor {
        let mut config = RootConfiguration::default();
        config.paths.settings = directory.join("grub").to_string_lossy().into_owned();
        config.paths.cache = directory
            .join("cache/bootsync/grub2.toml")
            .to_string_lossy()
            .into_owned();
        config.generate.command = command.to_string();
        config.generate.theme_background = theme_background.map(str::to_string);
        LocalExecutor::new(&config).expect("executor should be created")
    }

    #[test]
    fn writes_files_and_creates_directories() {
        let directory = tempfile::tempdir().expect("tempdir should be created");
        let executor = executor(directory.path(), "true", None);

        executor
            .write_settings("GRUB_TIMEOUT=\"5\"\n")
            .expect("settings should be written");
        executor
            .write_cache("needs-update = false\n")
            .expect("cache should be written");

        let settings = fs::read_to_string(directory.path().join("grub")).expect("settings exist");
        assert_eq!(settings, "GRUB_TIMEOUT=\"5\"\n");
        let cache = fs::read_to_string(directory.path().join("cache/bootsync/grub2.toml"))
            .expect("cache exists");
        assert_eq!(cache, "needs-update = false\n");
        assert!(!directory.path().join("grub.bootsync-new").exists());
    }

    #[test]
    fn rejects_empty_or_unbalanced_commands() {
        let mut config = RootConfiguration::default();
        config.generate.command = "   ".to_string();
        assert!(LocalExecutor::new(&config).is_err());
        config.generate.command = "grub-mkconfig -o \"/boot".to_string();
        assert!(LocalExecutor::new(&config).is_err());
    }

    #[test]
    fn reports_failing_generation() {
        let directory = tempfile::tempdir().expect("tempdir should be created");
        assert!(executor(directory.path(), "true", None).generate_boot_config().is_ok());
        assert!(executor(directory.path(), "false", None).generate_boot_config().is_err());
    }

    #[test]
    fn stamps_theme_background_resolution() {
        let directory = tempfile::tempdir().expect("tempdir should be created");
        let marker = directory.path().join("background-1920-1080");
        let template = format!(
            "touch '{}'",
            directory
                .path()
                .join("background-$width-$height")
                .to_string_lossy()
        );
        let executor = executor(directory.path(), "true", Some(&template));
        executor
            .generate_theme_background(Resolution::new(1920, 1080))
            .expect("theme background should be generated");
        assert!(marker.exists());
    }

    #[test]
    fn missing_theme_background_command_is_skipped() {
        let directory = tempfile::tempdir().expect("tempdir should be created");
        let executor = executor(directory.path(), "true", None);
        assert!(executor.generate_theme_background(Resolution::DEFAULT).is_ok());
    }
}
