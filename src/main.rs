use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::Result;
use opsie_rbac::authz::{loader, AuthzState};
use opsie_rbac::{settings, web};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "opsie-rbac",
    version,
    about = "Role-based authorization for the developer portal scaffolder"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the authorization API (default)
    Serve,
    /// Evaluate a single permission check
    Check {
        /// Identity reference, e.g. user:default/alice (anonymous if omitted)
        #[arg(short, long)]
        identity: Option<String>,
        /// Permission name, e.g. scaffolder.action.execute
        permission: String,
        /// Optional resource name, e.g. a template
        #[arg(short, long)]
        resource: Option<String>,
    },
    /// Print which of the given templates an identity may see
    Templates {
        #[arg(short, long)]
        identity: Option<String>,
        templates: Vec<String>,
    },
    /// List configured role assignments and template access
    Roles,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let settings = settings::Settings::load(&cli.config)?;
    tracing::debug!(?settings, "Loaded configuration");

    let state = match &settings.authz.policies_dir {
        Some(dir) => loader::load_policies(dir)?,
        None => {
            tracing::info!("No policies directory configured, using built-in policy");
            loader::builtin_state()?
        }
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            tracing::info!(
                identities = ?state.resolver.table().identities(),
                "Initializing RBAC permission policy"
            );
            web::serve(&settings, Arc::new(state)).await?;
        }
        Command::Check {
            identity,
            permission,
            resource,
        } => {
            let role = state.resolver.resolve(identity.as_deref());
            let (decision, rule) = state
                .engine
                .evaluate(&role, &permission, resource.as_deref());
            println!("{decision}\trole={role}\trule={rule}");
        }
        Command::Templates {
            identity,
            templates,
        } => {
            let role = state.resolver.resolve(identity.as_deref());
            for template in state.engine.template_filter(&role).apply(templates) {
                println!("{template}");
            }
        }
        Command::Roles => print_roles(&state),
    }
    Ok(())
}

fn print_roles(state: &AuthzState) {
    let table = state.resolver.table();
    println!("fallback identity: {}", state.resolver.fallback_identity());
    println!("default role: {}", state.resolver.default_role());
    println!();
    for identity in table.identities() {
        if let Some(role) = table.get(identity) {
            println!("{identity}\t{role}");
        }
    }
    println!();
    for role in state.engine.templates().roles() {
        let patterns = state.engine.templates().patterns(role);
        if patterns.is_empty() {
            println!("{role}\t(no templates)");
        } else {
            println!("{role}\t{}", patterns.join(", "));
        }
    }
}
