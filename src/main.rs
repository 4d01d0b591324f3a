mod client;
mod clipboard;
mod config;
mod form;
mod logging;
mod menu;
mod render;
mod tui;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use client::MenuClient;
use config::{ConfigFile, ResolvedConfig};
use form::{FormController, FormInput, UNKNOWN_SERVER_ERROR};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "menuadvisor",
    about = "Turn the ingredients you have into a menu and a shopping list",
    long_about = None,
)]
struct Args {
    /// Profile to use from config file
    #[arg(short, long, env = "MENUADVISOR_PROFILE")]
    profile: Option<String>,

    /// Override the menu server base URL
    #[arg(long, env = "MENUADVISOR_ENDPOINT")]
    endpoint: Option<String>,

    /// Ingredients on hand, comma separated (skips the TUI and prints the menu)
    #[arg(short, long)]
    ingredients: Option<String>,

    /// Extra budget for buying more ingredients
    #[arg(short, long, allow_hyphen_values = true)]
    budget: Option<String>,

    /// Free-form preference, e.g. "vegetarian, quick"
    #[arg(long)]
    preference: Option<String>,

    /// Write a default config file to ~/.config/menuadvisor/config.toml and exit
    #[arg(long)]
    init: bool,

    /// List available profiles and exit
    #[arg(long)]
    profiles: bool,

    /// Generate shell completions and print to stdout (bash, zsh, fish, elvish)
    #[arg(long, value_name = "SHELL")]
    completions: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // ── --init ────────────────────────────────────────────────────────────────
    if args.init {
        let path = ConfigFile::write_default_if_missing()?;
        println!("Config written to: {}", path.display());
        println!("Edit it, then run: menuadvisor");
        return Ok(());
    }

    // ── --completions ─────────────────────────────────────────────────────────
    if let Some(shell_name) = &args.completions {
        return generate_completions(shell_name);
    }

    let file = ConfigFile::load()?;

    // ── --profiles ────────────────────────────────────────────────────────────
    if args.profiles {
        print_profiles(&file);
        return Ok(());
    }

    let resolved = ResolvedConfig::resolve(&file, args.profile.as_deref(), args.endpoint.as_deref());

    // Logging is best-effort: a read-only state dir must not block the app
    match logging::init() {
        Ok(path) => info!(
            log = %path.display(),
            profile = %resolved.profile_name,
            endpoint = %resolved.endpoint,
            "menuadvisor starting"
        ),
        Err(e) => eprintln!("  warning: logging disabled: {e:#}"),
    }

    let client = MenuClient::new(resolved.endpoint.clone(), resolved.request_timeout)?;

    match args.ingredients {
        Some(ingredients) => {
            let input = FormInput {
                ingredients,
                budget: args.budget.unwrap_or_default(),
                preference: args.preference.unwrap_or_default(),
            };
            run_plain(input, &client).await;
            Ok(())
        }
        None => tui::run(resolved, client).await,
    }
}

// ── Plain mode ────────────────────────────────────────────────────────────────

/// One submit, printed to stdout. Exits non-zero when no menu came back.
async fn run_plain(input: FormInput, client: &MenuClient) {
    let mut form = FormController::new(input);
    form.submit(client).await;

    if let Some(menu) = form.menu() {
        println!();
        for line in ui::plain_lines(&render::render_menu(menu, |_| false)) {
            println!("{line}");
        }
        return;
    }
    eprintln!("  ✗ {}", form.error().unwrap_or(UNKNOWN_SERVER_ERROR));
    std::process::exit(1);
}

// ── Profiles ──────────────────────────────────────────────────────────────────

fn print_profiles(file: &ConfigFile) {
    let mut entries: Vec<(&String, &config::Profile)> = file.profiles.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    println!();
    println!("  Profiles");
    for (name, profile) in entries {
        let marker = if *name == file.default_profile { " ←" } else { "" };
        println!("  {name}{marker}");
        println!("    endpoint  {}", profile.endpoint);
        match profile.request_timeout_secs.filter(|s| *s > 0) {
            Some(secs) => println!("    timeout   {secs}s"),
            None => println!("    timeout   none"),
        }
        println!();
    }
}

// ── Shell completions ─────────────────────────────────────────────────────────

fn generate_completions(shell_name: &str) -> Result<()> {
    use clap_complete::{Shell, generate};

    let shell: Shell = match shell_name.to_lowercase().as_str() {
        "bash"    => Shell::Bash,
        "zsh"     => Shell::Zsh,
        "fish"    => Shell::Fish,
        "elvish"  => Shell::Elvish,
        _ => {
            eprintln!("Unknown shell: {shell_name}");
            eprintln!("Supported: bash, zsh, fish, elvish");
            std::process::exit(1);
        }
    };

    let mut cmd = Args::command();
    generate(shell, &mut cmd, "menuadvisor", &mut std::io::stdout());
    Ok(())
}
