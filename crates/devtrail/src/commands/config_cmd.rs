//! Config subcommand handlers.

use std::path::Path;

use devtrail_config::{TokenSource, parse_backend};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, Profile, TokenStore};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain | OutputFormat::Csv => {
                    toml::to_string_pretty(&cfg).map_err(|e| CliError::Render(e.to_string()))?
                }
                format => output::render_single(format, &cfg, |_| String::new())?,
            };
            output::print_output(out.trim_end(), global.quiet);

            let name = config::active_profile_name(global, &cfg);
            let source = match global.token {
                Some(_) => Some(TokenSource::Flag),
                None => TokenStore::for_profile(&name, cfg.profile(&name)).source(),
            };
            output::print_status(&access_line(&name, source.as_ref()), global.quiet);
            Ok(())
        }

        // ── Init ────────────────────────────────────────────────────
        ConfigCommand::Init {
            backend,
            name,
            token_env,
            export_dir,
            force,
        } => {
            parse_backend(&backend)?;
            let profile = Profile {
                backend,
                token_env,
                export_dir,
                ..Profile::default()
            };
            let path = config::config_path();
            init_at(&path, &name, profile, force)?;

            output::print_status(
                &format!("✓ Profile '{name}' written to {}", path.display()),
                global.quiet,
            );
            Ok(())
        }
    }
}

/// Add a profile to the config file at `path`.
///
/// Only the file's own contents are rewritten: environment overrides are not
/// persisted, and a file that fails to parse is left untouched.
fn init_at(path: &Path, name: &str, profile: Profile, force: bool) -> Result<(), CliError> {
    let mut cfg = config::load_config_file_from(path)?;
    init_profile(&mut cfg, name, profile, force)?;
    config::save_config_to(&cfg, path)?;
    Ok(())
}

/// Insert `profile` under `name`, making it the default when it is the first.
fn init_profile(cfg: &mut Config, name: &str, profile: Profile, force: bool) -> Result<(), CliError> {
    if cfg.profiles.contains_key(name) && !force {
        return Err(CliError::Validation {
            field: "name".into(),
            reason: format!("profile '{name}' already exists (use --force to replace it)"),
        });
    }
    if cfg.profiles.is_empty() {
        cfg.default_profile = Some(name.to_owned());
    }
    cfg.profiles.insert(name.to_owned(), profile);
    Ok(())
}

/// `admin` when a token is available, `guest` otherwise.
fn access_line(profile: &str, source: Option<&TokenSource>) -> String {
    match source {
        Some(source) => format!("Profile '{profile}': admin (token from {source})"),
        None => format!("Profile '{profile}': guest (no access token)"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn first_profile_becomes_default() {
        let mut cfg = Config {
            default_profile: None,
            ..Config::default()
        };
        init_profile(&mut cfg, "lab", Profile::default(), false).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("lab"));
    }

    #[test]
    fn existing_profile_needs_force() {
        let mut cfg = Config::default();
        init_profile(&mut cfg, "lab", Profile::default(), false).unwrap();
        assert!(init_profile(&mut cfg, "lab", Profile::default(), false).is_err());
        assert!(init_profile(&mut cfg, "lab", Profile::default(), true).is_ok());
    }

    #[test]
    fn init_keeps_existing_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "default_profile = \"lab\"\n\n[profiles.lab]\nbackend = \"http://lab.local\"\n",
        )
        .unwrap();

        let other = Profile {
            backend: "http://other.local".into(),
            ..Profile::default()
        };
        init_at(&path, "other", other, false).unwrap();

        let cfg = config::load_config_file_from(&path).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("lab"));
        assert!(cfg.profiles.contains_key("lab"));
        assert!(cfg.profiles.contains_key("other"));
    }

    #[test]
    fn init_refuses_to_rewrite_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let original = "[defaults]\ntimeout = \"ten\"\n\n[profiles.lab]\nbackend = \"http://lab.local\"\n";
        std::fs::write(&path, original).unwrap();

        let result = init_at(&path, "other", Profile::default(), false);

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn access_line_reports_admin_or_guest() {
        assert!(access_line("default", Some(&TokenSource::Keyring)).contains("admin"));
        assert!(access_line("default", None).contains("guest"));
    }
}
