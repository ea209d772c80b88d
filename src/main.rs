use std::io;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use geodash::config::AppConfig;
use geodash::features::{FeatureError, auth, dashboard, projects, sites, users};
use geodash::net::types::{Identity, Role};
use geodash::net::{ApiClient, ApiError};
use geodash::routes::guard::{GuardOutcome, guard_route};
use geodash::routes::{NavigationLog, Route, nav_links};
use geodash::state::SessionStore;
use geodash::state::storage::{FileStorage, StorageError};
use geodash::util::wkt::{Coordinate, ManualRow};
use serde::Serialize;
use time::OffsetDateTime;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("session storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error("not logged in; run `geodash login` first")]
    NotLoggedIn,
    #[error("{0} requires the admin role")]
    AdminRequired(&'static str),
    #[error("the backend rejected the session; log in again")]
    SessionRejected,
    #[error("no user with id {0}")]
    UnknownUser(i64),
    #[error("JSON failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "geodash", about = "Projects and sites dashboard client")]
struct Cli {
    #[arg(long, env = "GEODASH_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "GEODASH_STATE_FILE")]
    state_file: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "GEODASH_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "GEODASH_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Whoami,
    Dashboard,
    Projects(ProjectsCommand),
    Sites(SitesCommand),
    Users(UsersCommand),
    Session(SessionCommand),
}

#[derive(Args, Debug)]
struct ProjectsCommand {
    #[command(subcommand)]
    command: ProjectsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProjectsSubcommand {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Update {
        project_id: i64,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Delete {
        project_id: i64,
    },
}

#[derive(Args, Debug)]
struct SitesCommand {
    #[command(subcommand)]
    command: SitesSubcommand,
}

#[derive(Args, Debug)]
struct GeometryArgs {
    /// Manual vertex as `LAT,LNG`; repeat for each vertex.
    #[arg(long = "coord", conflicts_with = "ring")]
    coords: Vec<String>,

    /// Drawn ring as GeoJSON `[[lng, lat], ...]`.
    #[arg(long)]
    ring: Option<String>,
}

#[derive(Subcommand, Debug)]
enum SitesSubcommand {
    List {
        #[arg(long)]
        project_id: Option<i64>,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        project_id: Option<i64>,
        #[command(flatten)]
        geometry: GeometryArgs,
    },
    Update {
        site_id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        project_id: i64,
        #[command(flatten)]
        geometry: GeometryArgs,
    },
    Delete {
        site_id: i64,
    },
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    List,
    SetRole { user_id: i64, role: Role },
    ToggleRole { user_id: i64 },
}

#[derive(Args, Debug)]
struct SessionCommand {
    #[command(subcommand)]
    command: SessionSubcommand,
}

#[derive(Subcommand, Debug)]
enum SessionSubcommand {
    /// Keep the session open and run the idle timer against stdin activity.
    Watch,
}

struct CliContext {
    api: ApiClient,
    session: SessionStore,
    nav: Arc<NavigationLog>,
    idle_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(url) = &cli.api_url {
        config = config.with_api_base_url(url);
    }
    if let Some(path) = cli.state_file {
        config.state_file = path;
    }

    let storage = Arc::new(FileStorage::open(&config.state_file)?);
    debug!(path = %storage.path().display(), "session storage opened");
    let session = SessionStore::new(storage, config.idle_timeout);
    session.initialize();
    let nav = Arc::new(NavigationLog::new());
    let api = ApiClient::new(&config, session.clone(), nav.clone())?;
    let ctx = CliContext { api, session, nav, idle_secs: config.idle_timeout.as_secs() };

    let result = run(&ctx, cli.command).await;
    ctx.session.teardown();
    result
}

async fn run(ctx: &CliContext, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login { email, password } => {
            let identity = auth::login(&ctx.api, &email, &password).await?;
            print_identity(&identity);
            Ok(())
        }
        Command::Register { name, email, password } => {
            let identity = auth::register(&ctx.api, &name, &email, &password).await?;
            print_identity(&identity);
            Ok(())
        }
        Command::Logout => {
            auth::logout(&ctx.session, ctx.nav.as_ref());
            println!("logged out");
            Ok(())
        }
        Command::Whoami => {
            let identity = guarded(ctx, Route::Dashboard)?;
            print_identity(&identity);
            Ok(())
        }
        Command::Dashboard => {
            guarded(ctx, Route::Dashboard)?;
            let summary = dashboard::load(&ctx.api).await?;
            finish(ctx)?;
            print_dashboard(&summary);
            Ok(())
        }
        Command::Projects(command) => run_projects(ctx, command).await,
        Command::Sites(command) => run_sites(ctx, command).await,
        Command::Users(command) => run_users(ctx, command).await,
        Command::Session(command) => match command.command {
            SessionSubcommand::Watch => run_watch(ctx).await,
        },
    }
}

async fn run_projects(ctx: &CliContext, command: ProjectsCommand) -> Result<(), CliError> {
    guarded(ctx, Route::Projects)?;
    match command.command {
        ProjectsSubcommand::List { search } => {
            let all = projects::list(&ctx.api).await?;
            finish(ctx)?;
            let now = OffsetDateTime::now_utc();
            for project in projects::filter(&all, search.as_deref().unwrap_or_default()) {
                println!(
                    "{:>5}  {:<28} {:>3} sites {:>10.2} km²  updated {}  (created {})",
                    project.id,
                    project.name,
                    project.sites.len(),
                    project.area_sqkm(),
                    projects::time_ago(project.updated_at.as_deref(), now),
                    projects::format_timestamp(project.created_at.as_deref()),
                );
            }
            Ok(())
        }
        ProjectsSubcommand::Create { name, description } => {
            let created = projects::create(&ctx.api, &name, &description).await?;
            finish(ctx)?;
            print_json(&created)
        }
        ProjectsSubcommand::Update { project_id, name, description } => {
            let updated = projects::update(&ctx.api, project_id, &name, &description).await?;
            finish(ctx)?;
            print_json(&updated)
        }
        ProjectsSubcommand::Delete { project_id } => {
            projects::delete(&ctx.api, project_id).await?;
            finish(ctx)?;
            println!("deleted project {project_id}");
            Ok(())
        }
    }
}

async fn run_sites(ctx: &CliContext, command: SitesCommand) -> Result<(), CliError> {
    guarded(ctx, Route::Map)?;
    match command.command {
        SitesSubcommand::List { project_id } => {
            let all = sites::list(&ctx.api).await?;
            finish(ctx)?;
            let shown = match project_id {
                Some(id) => sites::in_project(&all, id),
                None => all.iter().collect(),
            };
            print_json(&shown)
        }
        SitesSubcommand::Create { name, project_id, geometry } => {
            let geometry = site_geometry(geometry)?.unwrap_or(sites::SiteGeometry::Manual(Vec::new()));
            let created = sites::create(&ctx.api, &name, project_id, &geometry).await?;
            finish(ctx)?;
            print_json(&created)
        }
        SitesSubcommand::Update { site_id, name, project_id, geometry } => {
            let geometry = site_geometry(geometry)?;
            let updated = sites::update(&ctx.api, site_id, &name, project_id, geometry.as_ref()).await?;
            finish(ctx)?;
            print_json(&updated)
        }
        SitesSubcommand::Delete { site_id } => {
            sites::delete(&ctx.api, site_id).await?;
            finish(ctx)?;
            println!("deleted site {site_id}");
            Ok(())
        }
    }
}

async fn run_users(ctx: &CliContext, command: UsersCommand) -> Result<(), CliError> {
    let acting = guarded(ctx, Route::Users)?;
    let all = users::list(&ctx.api).await?;
    finish(ctx)?;
    match command.command {
        UsersSubcommand::List => {
            for user in &all {
                let marker = if users::can_change_role(&acting, user) { "" } else { "  (you)" };
                println!("{:>5}  {:<24} {:<28} {}{marker}", user.id, user.name, user.email, user.role);
            }
            Ok(())
        }
        UsersSubcommand::SetRole { user_id, role } => {
            let target = all.iter().find(|u| u.id == user_id).ok_or(CliError::UnknownUser(user_id))?;
            let updated = users::set_role(&ctx.api, &acting, target, role).await?;
            finish(ctx)?;
            print_json(&updated.map(|u| u.user))
        }
        UsersSubcommand::ToggleRole { user_id } => {
            let target = all.iter().find(|u| u.id == user_id).ok_or(CliError::UnknownUser(user_id))?;
            let updated = users::toggle_role(&ctx.api, &acting, target).await?;
            finish(ctx)?;
            print_json(&updated.map(|u| u.user))
        }
    }
}

async fn run_watch(ctx: &CliContext) -> Result<(), CliError> {
    guarded(ctx, Route::Dashboard)?;
    let mut updates = ctx.session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprintln!(
        "watching session; idle prompt after {}s without input. Any line counts as activity; \
         `continue` dismisses the prompt, `logout` ends the session.",
        ctx.idle_secs
    );

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if !snapshot.is_authenticated() {
                    println!("signed out");
                    break;
                }
                if snapshot.idle_prompt_visible {
                    println!("You've been inactive. Type `continue` to stay logged in or `logout`.");
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match line.trim() {
                    "continue" => {
                        if ctx.session.continue_session() {
                            println!("session continued");
                        }
                    }
                    "logout" => {
                        auth::logout(&ctx.session, ctx.nav.as_ref());
                        println!("logged out");
                        break;
                    }
                    _ => {
                        if !ctx.session.reset_idle_timer() && ctx.session.snapshot().idle_prompt_visible {
                            println!("Type `continue` or `logout`.");
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// Apply the route guard for `route` and hand back the principal.
fn guarded(ctx: &CliContext, route: Route) -> Result<Identity, CliError> {
    let snapshot = ctx.session.snapshot();
    match guard_route(route, &snapshot, |identity| identity.cloned()) {
        GuardOutcome::Render(Some(identity)) => Ok(identity),
        GuardOutcome::Redirect(Route::Dashboard) => Err(CliError::AdminRequired(route.title())),
        GuardOutcome::Render(None) | GuardOutcome::Redirect(_) | GuardOutcome::Waiting => Err(CliError::NotLoggedIn),
    }
}

/// Fail when the backend rejected the session during the command.
fn finish(ctx: &CliContext) -> Result<(), CliError> {
    if ctx.nav.take().contains(&Route::Login) {
        return Err(CliError::SessionRejected);
    }
    Ok(())
}

fn site_geometry(args: GeometryArgs) -> Result<Option<sites::SiteGeometry>, CliError> {
    if let Some(ring) = args.ring {
        let pairs: Vec<[f64; 2]> = serde_json::from_str(&ring)?;
        return Ok(Some(sites::SiteGeometry::Drawn(pairs.into_iter().map(Coordinate::from).collect())));
    }
    if args.coords.is_empty() {
        return Ok(None);
    }
    let rows = args
        .coords
        .iter()
        .map(|raw| {
            let (lat, lng) = raw.split_once(',').unwrap_or((raw.as_str(), ""));
            ManualRow::new(lat, lng)
        })
        .collect();
    Ok(Some(sites::SiteGeometry::Manual(rows)))
}

fn print_identity(identity: &Identity) {
    println!("{} <{}> role={}", identity.name, identity.email, identity.role);
    let links: Vec<&str> = nav_links(Some(identity)).into_iter().map(Route::path).collect();
    println!("menu: {}", links.join(" "));
}

fn print_dashboard(summary: &dashboard::DashboardSummary) {
    if summary.is_empty() {
        println!("No projects yet. Add some from the map.");
        return;
    }
    println!("{:<28} {:>12} {:>6} {:>7}", "project", "area km²", "sites", "share");
    for ((area, sites), share) in summary.area.iter().zip(&summary.sites).zip(&summary.shares) {
        println!("{:<28} {:>12.2} {:>6} {:>6.1}%", area.name, area.value, sites.value, share.percent);
    }
    println!("{:<28} {:>12.2} {:>6}", "total", summary.total_area_sqkm, summary.total_sites);
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
