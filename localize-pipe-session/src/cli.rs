//! `localize-pipe` command-line front end

use crate::config::{CONFIG_FILE_NAME, LocalizePipeConfig};
use crate::controller::{ControllerTimings, OperationController};
use crate::error::{SessionError, SessionResult};
use crate::providers::{FixedScope, StaticSettings};
use crate::state::ControllerState;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use localize_pipe::{
    FilesystemLayout, ScanScope, StringsXmlScanner, canonical_locale_tag, group_rows,
};
use localize_pipe_mt::sizing::{guide_lines, storage_warning};
use localize_pipe_mt::{
    MockBackend, MockMode, ModelCheckStatus, ProviderType, PullStatus, check_model, pull_model,
    recommended_model_id, recommended_size,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

fn project_arg() -> Arg {
    Arg::new("project")
        .long("project")
        .short('p')
        .help("Project root directory")
        .value_parser(value_parser!(PathBuf))
        .default_value(".")
}

fn module_arg() -> Arg {
    Arg::new("module")
        .long("module")
        .help("Limit the scan to one module (e.g. feature:settings)")
}

fn locale_arg() -> Arg {
    Arg::new("locale")
        .long("locale")
        .short('l')
        .help("Locale to diff even without a locale file (repeatable)")
        .action(ArgAction::Append)
}

fn model_arg() -> Arg {
    Arg::new("model")
        .long("model")
        .help("Ollama model (default: from config)")
}

pub fn build_cli() -> Command {
    Command::new("localize-pipe")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Scan, translate and write Android and Compose strings.xml resources")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Enable debug logging")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Config file (default: <project>/localize-pipe.toml)")
                .global(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .subcommand(
            Command::new("scan")
                .about("List strings that are missing or untranslated")
                .arg(project_arg())
                .arg(module_arg())
                .arg(locale_arg())
                .arg(
                    Arg::new("include-identical")
                        .long("include-identical")
                        .help("Also report translations identical to the base text")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print rows as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("translate")
                .about("Translate pending rows and write them back")
                .arg(project_arg())
                .arg(module_arg())
                .arg(locale_arg())
                .arg(
                    Arg::new("mock")
                        .long("mock")
                        .short('m')
                        .help("Use the mock backend instead of the configured provider")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Remove a key from every locale file")
                .arg(Arg::new("key").long("key").short('k').required(true).help("String key"))
                .arg(project_arg())
                .arg(module_arg()),
        )
        .subcommand(
            Command::new("add-language")
                .about("Create empty locale files in every resource root")
                .arg(
                    Arg::new("locale")
                        .long("locale")
                        .short('l')
                        .required(true)
                        .help("Locale tag (e.g. fr, pt-BR, zh-Hant)"),
                )
                .arg(project_arg())
                .arg(module_arg()),
        )
        .subcommand(
            Command::new("check-model")
                .about("Check whether the Ollama model is installed")
                .arg(model_arg()),
        )
        .subcommand(
            Command::new("pull-model")
                .about("Download the Ollama model")
                .arg(model_arg()),
        )
        .subcommand(
            Command::new("models")
                .about("Show the TranslateGemma sizing guide")
                .arg(
                    Arg::new("ram")
                        .long("ram")
                        .help("System RAM in GB, used for the recommendation")
                        .value_parser(value_parser!(u64)),
                )
                .arg(
                    Arg::new("disk")
                        .long("disk")
                        .help("Free disk space in GB, used for a storage warning")
                        .value_parser(value_parser!(u64)),
                ),
        )
}

/// Everything a project subcommand needs
struct ProjectContext {
    controller: OperationController,
    module: Option<String>,
}

fn load_config(matches: &ArgMatches, project: &Path) -> SessionResult<LocalizePipeConfig> {
    let path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| project.join(CONFIG_FILE_NAME));
    debug!("Loading config from {}", path.display());
    Ok(LocalizePipeConfig::load(&path)?)
}

fn project_context(
    matches: &ArgMatches,
    sub: &ArgMatches,
    configure: impl FnOnce(LocalizePipeConfig) -> StaticSettings,
) -> SessionResult<ProjectContext> {
    let project = sub
        .get_one::<PathBuf>("project")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    if !project.is_dir() {
        return Err(SessionError::ProjectMissing(project));
    }
    let settings = configure(load_config(matches, &project)?);
    let module = sub.get_one::<String>("module").cloned();

    // No file watcher in a one-shot run, so rescans need no debounce
    let controller = OperationController::with_timings(
        StringsXmlScanner::new(FilesystemLayout::new(project)),
        Arc::new(settings),
        Arc::new(FixedScope(module.clone())),
        ControllerTimings {
            debounce: Duration::ZERO,
            follow_up: Duration::ZERO,
        },
    );
    Ok(ProjectContext { controller, module })
}

impl ProjectContext {
    fn request_locales(&self, sub: &ArgMatches) {
        if let Some(locales) = sub.get_many::<String>("locale") {
            self.controller.set_requested_locales(locales.cloned().collect());
        }
    }

    async fn initial_scan(&self) {
        if self.module.is_some() {
            self.controller.set_scan_scope(ScanScope::CurrentModule);
        } else {
            self.controller.rescan_now();
        }
        self.controller.wait_until_idle().await;
    }

    /// Print every new status message
    fn echo_messages(&self) {
        let last = Mutex::new(None::<String>);
        self.controller.subscribe(move |state: &ControllerState| {
            let Some(message) = &state.last_message else {
                return;
            };
            let mut last = last.lock().unwrap_or_else(|e| e.into_inner());
            if last.as_deref() != Some(message.as_str()) {
                eprintln!("{}", message);
                *last = Some(message.clone());
            }
        });
    }
}

fn print_state(state: &ControllerState) {
    let groups = group_rows(&state.rows);
    if groups.is_empty() {
        println!("✅ {}", state.last_message.as_deref().unwrap_or("No untranslated strings found"));
        return;
    }
    for group in &groups {
        let module = group.module_name.as_deref().unwrap_or("-");
        println!("{} [{}] \"{}\"", group.key, module, group.base_text);
        for row in &group.rows {
            let detail = row
                .localized_text
                .as_deref()
                .map(|text| format!(" \"{}\"", text))
                .unwrap_or_default();
            println!("   {:<10} {}{}", row.status.as_str(), row.locale_tag, detail);
        }
    }
    println!();
    println!(
        "{} keys, {} rows, locales: {}",
        groups.len(),
        state.rows.len(),
        state.detected_locales.iter().cloned().collect::<Vec<_>>().join(", ")
    );
}

async fn run_scan(matches: &ArgMatches, sub: &ArgMatches) -> SessionResult<()> {
    let include_identical = sub.get_flag("include-identical");
    let context = project_context(matches, sub, |mut config| {
        if include_identical {
            config.scan.include_identical_to_base = true;
        }
        StaticSettings::new(config)
    })?;
    context.request_locales(sub);
    context.initial_scan().await;

    let state = context.controller.state();
    if sub.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&state.rows)?);
    } else {
        print_state(&state);
    }
    Ok(())
}

async fn run_translate(matches: &ArgMatches, sub: &ArgMatches) -> SessionResult<()> {
    let use_mock = sub.get_flag("mock");
    let context = project_context(matches, sub, |config| {
        let settings = StaticSettings::new(config);
        if use_mock {
            settings.with_backend(Arc::new(MockBackend::new(MockMode::Suffix)))
        } else {
            settings
        }
    })?;
    context.request_locales(sub);
    context.echo_messages();
    context.initial_scan().await;
    context.controller.translate_pending();
    context.controller.wait_until_idle().await;
    context.controller.flush_listeners().await;
    Ok(())
}

async fn run_delete(matches: &ArgMatches, sub: &ArgMatches) -> SessionResult<()> {
    let key = sub
        .get_one::<String>("key")
        .cloned()
        .unwrap_or_default();
    let context = project_context(matches, sub, StaticSettings::new)?;
    context.initial_scan().await;

    let targets: Vec<_> = context
        .controller
        .state()
        .delete_targets
        .iter()
        .filter(|target| target.key == key)
        .cloned()
        .collect();
    if targets.is_empty() {
        return Err(SessionError::KeyNotFound(key));
    }

    context.echo_messages();
    for target in targets {
        context.controller.delete_translations(target);
        context.controller.wait_until_idle().await;
    }
    context.controller.flush_listeners().await;
    Ok(())
}

async fn run_add_language(matches: &ArgMatches, sub: &ArgMatches) -> SessionResult<()> {
    let raw = sub
        .get_one::<String>("locale")
        .cloned()
        .unwrap_or_default();
    if canonical_locale_tag(&raw).is_none() {
        return Err(SessionError::InvalidLocale(raw));
    }
    let context = project_context(matches, sub, StaticSettings::new)?;
    context.initial_scan().await;

    context.echo_messages();
    let targets = context.controller.state().language_add_targets.clone();
    context.controller.add_language(targets, &raw);
    context.controller.wait_until_idle().await;
    context.controller.flush_listeners().await;
    Ok(())
}

fn ollama_target(matches: &ArgMatches, sub: &ArgMatches) -> SessionResult<(String, String, u64)> {
    let config = load_config(matches, Path::new("."))?;
    let model = sub
        .get_one::<String>("model")
        .cloned()
        .unwrap_or_else(|| config.translation.ollama_model.clone());
    Ok((
        config.translation.ollama_base_url,
        model,
        config.translation.request_timeout_seconds,
    ))
}

async fn run_check_model(matches: &ArgMatches, sub: &ArgMatches) -> SessionResult<()> {
    let (base_url, model, timeout) = ollama_target(matches, sub)?;
    let result = check_model(&base_url, &model, timeout).await;
    let marker = if result.status == ModelCheckStatus::Available { "✅" } else { "❌" };
    println!("{} {}", marker, result.message);
    Ok(())
}

async fn run_pull_model(matches: &ArgMatches, sub: &ArgMatches) -> SessionResult<()> {
    let (base_url, model, timeout) = ollama_target(matches, sub)?;
    let result = pull_model(&base_url, &model, timeout, |progress| {
        match progress.fraction {
            Some(fraction) => eprintln!("{} ({:.0}%)", progress.status, fraction * 100.0),
            None => eprintln!("{}", progress.status),
        }
        true
    })
    .await;
    let marker = if result.status == PullStatus::Pulled { "✅" } else { "❌" };
    println!("{} {}", marker, result.message);
    Ok(())
}

fn run_models(matches: &ArgMatches, sub: &ArgMatches) -> SessionResult<()> {
    let config = load_config(matches, Path::new("."))?;
    for line in guide_lines() {
        println!("{}", line);
    }

    let size = recommended_size(sub.get_one::<u64>("ram").copied());
    println!();
    println!(
        "Recommended: {} ({} / {})",
        size.short_label(),
        recommended_model_id(ProviderType::Ollama, size),
        recommended_model_id(ProviderType::HuggingFace, size)
    );
    let active = config.translation.active_model();
    if let Some(warning) = storage_warning(active, sub.get_one::<u64>("disk").copied()) {
        println!("⚠️  {}", warning);
    }
    Ok(())
}

/// Dispatch a parsed command line
pub async fn run(matches: &ArgMatches) -> SessionResult<()> {
    match matches.subcommand() {
        Some(("scan", sub)) => run_scan(matches, sub).await,
        Some(("translate", sub)) => run_translate(matches, sub).await,
        Some(("delete", sub)) => run_delete(matches, sub).await,
        Some(("add-language", sub)) => run_add_language(matches, sub).await,
        Some(("check-model", sub)) => run_check_model(matches, sub).await,
        Some(("pull-model", sub)) => run_pull_model(matches, sub).await,
        Some(("models", sub)) => run_models(matches, sub),
        _ => Ok(()),
    }
}
