//! cragbook - climbing logbook CLI
//!
//! Start a session, log climbs as you go, and finish to save the session to
//! the backend. Between invocations the open session lives in a local draft
//! file, so nothing is lost if a save fails.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/cragbook/config.toml (~/.config/cragbook/config.toml)
//! - Draft: $XDG_DATA_HOME/cragbook/active_session.json
//! - Logs and cached name: $XDG_STATE_HOME/cragbook/

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cragbook_core::analytics::{
    daily_summaries, ordered_pyramid, profile_stats, session_summaries, Dashboard,
    DashboardSection, LiveSummary, PyramidRow, RECENT_SESSIONS,
};
use cragbook_core::format::{
    format_elapsed, format_grade_opt, format_relative_time, format_session_date,
};
use cragbook_core::logging::{self, Console};
use cragbook_core::{
    AscentType, ClimbId, ClimbInput, Config, Discipline, DraftLock, FinishOutcome,
    GradeRegistry, GradeScale, HttpBackend, LocalStore, PersistenceGateway, SessionController,
    SessionState,
};

#[derive(Parser, Debug)]
#[command(name = "cragbook")]
#[command(about = "Climbing logbook - log sessions, see your grade pyramid")]
#[command(version)]
struct Args {
    /// Mirror warnings to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a new session (checks the backend is reachable)
    Start {
        /// Display name (default: the last name used)
        #[arg(short, long)]
        user: Option<String>,

        /// bouldering or sport
        #[arg(short, long, default_value = "bouldering")]
        discipline: Discipline,

        /// Gym (required for bouldering)
        #[arg(short, long, default_value = "")]
        gym: String,
    },

    /// Log a climb in the open session
    Log {
        /// Grade label from the session's scale
        grade: String,

        /// attempt, send or flash
        #[arg(short, long, default_value = "send")]
        ascent: AscentType,

        /// Free-text notes (beta, conditions, video link)
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Delete a climb from the open session by id
    Delete { id: ClimbId },

    /// Show the open session
    Show,

    /// Save the open session to the backend and close it
    Finish {
        /// Session name (default: "<gym> - <discipline>")
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Close the open session without saving
    Discard,

    /// List grade scales
    Grades {
        #[arg(short, long)]
        discipline: Option<Discipline>,

        #[arg(short, long)]
        gym: Option<String>,
    },

    /// Show logbook stats from the backend
    Stats {
        #[arg(short, long)]
        user: Option<String>,

        /// Gym whose scale orders the pyramid
        #[arg(short, long)]
        gym: Option<String>,

        /// Export format (json)
        #[arg(long)]
        export: Option<String>,
    },

    /// List saved sessions
    History {
        #[arg(short, long)]
        user: Option<String>,

        /// Group by day instead of listing sessions
        #[arg(long)]
        daily: bool,

        /// Export format (json)
        #[arg(long)]
        export: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;
    let console = if args.verbose {
        Console::Warnings
    } else {
        Console::Off
    };
    let _log_guard = match logging::init(&config.logging, console) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: file logging disabled: {}", e);
            None
        }
    };
    tracing::debug!(command = ?args.command, "cragbook invoked");

    let registry =
        GradeRegistry::from_config(&config.grades.scales).context("invalid grade scales")?;
    let store = LocalStore::from_xdg();

    match args.command {
        Command::Start {
            user,
            discipline,
            gym,
        } => {
            let _lock = lock_draft(&store)?;
            let mut controller = load_controller(&store, registry)?;
            cmd_start(&config, &store, &mut controller, user, discipline, &gym).await
        }
        Command::Log {
            grade,
            ascent,
            notes,
        } => {
            let _lock = lock_draft(&store)?;
            let mut controller = load_controller(&store, registry)?;
            cmd_log(&store, &mut controller, grade, ascent, notes)
        }
        Command::Delete { id } => {
            let _lock = lock_draft(&store)?;
            let mut controller = load_controller(&store, registry)?;
            cmd_delete(&store, &mut controller, id)
        }
        Command::Show => cmd_show(&load_controller(&store, registry)?),
        Command::Finish { name } => {
            let _lock = lock_draft(&store)?;
            let mut controller = load_controller(&store, registry)?;
            cmd_finish(&config, &store, &mut controller, name).await
        }
        Command::Discard => {
            let _lock = lock_draft(&store)?;
            cmd_discard(&store, registry)
        }
        Command::Grades { discipline, gym } => cmd_grades(&registry, discipline, gym),
        Command::Stats { user, gym, export } => {
            let draft = peek_draft(&store);
            let user = resolve_user(user, draft.as_ref(), &store)?;
            cmd_stats(&config, &registry, draft.as_ref(), &user, gym, export.as_deref()).await
        }
        Command::History {
            user,
            daily,
            export,
        } => {
            let user = resolve_user(user, peek_draft(&store).as_ref(), &store)?;
            cmd_history(&config, &user, daily, export.as_deref()).await
        }
    }
}

/// Held for the whole command so overlapping runs cannot submit or
/// rewrite the same draft.
fn lock_draft(store: &LocalStore) -> Result<DraftLock> {
    store.lock_draft().map_err(|e| match e {
        cragbook_core::Error::SaveInProgress => anyhow::Error::new(e).context(
            "another cragbook command is using the open session; try again when it finishes",
        ),
        other => anyhow::Error::new(other).context("failed to lock the session draft"),
    })
}

fn load_controller(store: &LocalStore, registry: GradeRegistry) -> Result<SessionController> {
    let draft = store
        .load_draft()
        .with_context(|| format!("failed to read {}", store.draft_path().display()))?;
    Ok(match draft {
        Some(session) => SessionController::with_session(registry, session),
        None => SessionController::new(registry),
    })
}

/// The open session for read-only views; an unreadable draft is skipped
fn peek_draft(store: &LocalStore) -> Option<SessionState> {
    match store.load_draft() {
        Ok(draft) => draft,
        Err(e) => {
            tracing::warn!(path = %store.draft_path().display(), error = %e, "Ignoring unreadable session draft");
            None
        }
    }
}

fn gateway(config: &Config) -> Result<PersistenceGateway<HttpBackend>> {
    let backend = HttpBackend::new(&config.backend).context("invalid backend configuration")?;
    Ok(PersistenceGateway::new(backend))
}

/// Explicit flag, then the open session's climber, then the cached name
fn resolve_user(
    user: Option<String>,
    draft: Option<&SessionState>,
    store: &LocalStore,
) -> Result<String> {
    user.filter(|u| !u.trim().is_empty())
        .or_else(|| draft.map(|s| s.user_name().to_string()))
        .or_else(|| store.load_user_name())
        .context("no user name known yet; pass --user")
}

fn open_session(controller: &SessionController) -> Result<&SessionState> {
    controller
        .session()
        .context("no open session; run `cragbook start` first")
}

async fn cmd_start(
    config: &Config,
    store: &LocalStore,
    controller: &mut SessionController,
    user: Option<String>,
    discipline: Discipline,
    gym: &str,
) -> Result<()> {
    let user = user
        .or_else(|| store.load_user_name())
        .context("no user name known yet; pass --user")?;
    let gateway = gateway(config)?;

    let session = controller
        .start(gateway.backend(), &user, discipline, gym)
        .await
        .context("could not start session")?;

    store.save_user_name(session.user_name())?;
    store.save_draft(session)?;

    match discipline {
        Discipline::Bouldering => println!(
            "Started {} session at {} for {}",
            discipline,
            session.gym(),
            session.user_name()
        ),
        Discipline::SportClimbing => {
            println!("Started {} session for {}", discipline, session.user_name())
        }
    }
    Ok(())
}

fn cmd_log(
    store: &LocalStore,
    controller: &mut SessionController,
    grade: String,
    ascent: AscentType,
    notes: Option<String>,
) -> Result<()> {
    open_session(controller)?;
    let mut input = ClimbInput::new(grade, ascent);
    if let Some(notes) = notes {
        input = input.with_notes(notes);
    }

    let climb = controller.log_climb(input)?;
    println!("#{}  {} / {}", climb.id, climb.grade, climb.ascent_type);

    store.save_draft(open_session(controller)?)?;
    Ok(())
}

fn cmd_delete(store: &LocalStore, controller: &mut SessionController, id: ClimbId) -> Result<()> {
    let grade = open_session(controller)?
        .climb(id)
        .map(|climb| climb.grade.clone());
    match grade {
        Some(grade) => {
            controller.delete_climb(id);
            println!("Removed climb #{} ({})", id, grade);
        }
        None => println!("No climb #{} in this session", id),
    }
    store.save_draft(open_session(controller)?)?;
    Ok(())
}

fn cmd_show(controller: &SessionController) -> Result<()> {
    let session = open_session(controller)?;
    let summary = LiveSummary::from_session(session, controller.registry())?;

    let place = if session.gym().is_empty() {
        session.discipline().to_string()
    } else {
        format!("{} - {}", session.gym(), session.discipline())
    };
    println!("{} ({})", place, session.user_name());
    println!("Elapsed: {}", format_elapsed(summary.elapsed));
    println!();

    if session.is_empty() {
        println!("  No climbs logged yet for this session.");
        return Ok(());
    }

    println!(
        "Climbs: {}  Sends: {}  Flashes: {}  Attempts: {}  Hardest: {}",
        summary.total_climbs,
        summary.sends,
        summary.flashes,
        summary.attempts,
        format_grade_opt(summary.hardest_send.as_deref())
    );
    println!();

    for climb in session.climbs() {
        let notes = climb
            .notes
            .as_deref()
            .map(|n| format!("  \"{}\"", n))
            .unwrap_or_default();
        println!(
            "  {:<6} {:<14} {:<8} {:>8}{}",
            format!("#{}", climb.id),
            climb.grade,
            climb.ascent_type.as_str(),
            format_relative_time(climb.timestamp),
            notes
        );
    }
    println!();

    let scale = controller
        .registry()
        .scale(session.discipline(), session.gym())?;
    print_pyramid(&ordered_pyramid(&summary.pyramid, scale));
    Ok(())
}

async fn cmd_finish(
    config: &Config,
    store: &LocalStore,
    controller: &mut SessionController,
    name: Option<String>,
) -> Result<()> {
    open_session(controller)?;
    let gateway = gateway(config)?;

    match controller.finish(&gateway, name.as_deref()).await {
        Ok(FinishOutcome::Discarded) => {
            store.clear_draft()?;
            println!("No climbs logged; session closed.");
            Ok(())
        }
        Ok(FinishOutcome::Saved(payload)) => {
            store.clear_draft()?;
            println!(
                "Saved \"{}\" with {} climb(s).",
                payload.session_name,
                payload.climbs.len()
            );
            Ok(())
        }
        Err(e) => {
            // The draft on disk is untouched, so `finish` can simply be re-run.
            let kept = controller.session().map_or(0, |s| s.len());
            Err(anyhow::Error::new(e).context(format!(
                "session not saved; {} climb(s) kept, run `cragbook finish` to retry",
                kept
            )))
        }
    }
}

fn cmd_discard(store: &LocalStore, registry: GradeRegistry) -> Result<()> {
    match store.load_draft() {
        Ok(Some(session)) => {
            let mut controller = SessionController::with_session(registry, session);
            let climbs = controller.discard().map_or(0, |s| s.len());
            println!("Discarded session with {} climb(s).", climbs);
        }
        Ok(None) => println!("No open session."),
        Err(e) => {
            tracing::warn!(path = %store.draft_path().display(), error = %e, "Discarding unreadable session draft");
            println!("Discarded unreadable session draft.");
        }
    }
    store.clear_draft()?;
    Ok(())
}

fn cmd_grades(
    registry: &GradeRegistry,
    discipline: Option<Discipline>,
    gym: Option<String>,
) -> Result<()> {
    if let Some(discipline) = discipline {
        let scale = registry.scale(discipline, gym.as_deref().unwrap_or(""))?;
        print_scale(scale);
        return Ok(());
    }

    for gym in registry.bouldering_gyms() {
        print_scale(registry.scale(Discipline::Bouldering, gym)?);
    }
    print_scale(registry.scale(Discipline::SportClimbing, "")?);
    Ok(())
}

fn print_scale(scale: &GradeScale) {
    println!("{}: {}", scale.name(), scale.grades().join(", "));
}

async fn cmd_stats(
    config: &Config,
    registry: &GradeRegistry,
    draft: Option<&SessionState>,
    user: &str,
    gym: Option<String>,
    export: Option<&str>,
) -> Result<()> {
    let gateway = gateway(config)?;
    let dashboard = Dashboard::load(gateway.backend(), user).await;

    let scale = match (&gym, draft) {
        (Some(gym), _) => Some(registry.scale(Discipline::Bouldering, gym)?),
        (None, Some(session)) => registry.scale(session.discipline(), session.gym()).ok(),
        (None, None) => None,
    };
    let rows = match scale {
        Some(scale) => dashboard.pyramid_rows(scale),
        None => dashboard
            .pyramid
            .iter()
            .map(|(grade, &count)| PyramidRow {
                grade: grade.clone(),
                count,
            })
            .collect(),
    };

    // When the server stats are unavailable but history loaded, derive the
    // headline numbers from history instead of showing N/A.
    let local = profile_stats(&dashboard.sessions, registry);
    let use_local = dashboard.is_degraded(DashboardSection::Stats)
        && !dashboard.sessions.is_empty();
    let (total, boulder, sport) = if use_local {
        (
            local.total_sessions as u64,
            format_grade_opt(local.hardest_boulder.as_deref()).to_string(),
            format_grade_opt(local.hardest_sport.as_deref()).to_string(),
        )
    } else {
        (
            dashboard.stats.total_sessions,
            dashboard.stats.hardest_boulder.clone(),
            dashboard.stats.hardest_sport.clone(),
        )
    };
    let recent = dashboard.recent_sessions(RECENT_SESSIONS);

    if export == Some("json") {
        let json = serde_json::json!({
            "user": dashboard.user_name,
            "total_sessions": total,
            "hardest_boulder": boulder,
            "hardest_sport": sport,
            "pyramid": rows.iter().map(|r| serde_json::json!({"grade": r.grade, "count": r.count})).collect::<Vec<_>>(),
            "recent_sessions": recent.iter().map(|s| serde_json::json!({
                "date": s.date.map(|d| d.to_string()),
                "name": s.name,
                "climbs": s.climb_count,
            })).collect::<Vec<_>>(),
            "unavailable": dashboard.degraded.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    } else if let Some(other) = export {
        anyhow::bail!("Unknown export format: {}. Use 'json'", other);
    }

    println!("Logbook for {}", dashboard.user_name);
    println!();
    println!("   Sessions:        {}", total);
    println!("   Hardest boulder: {}", boulder);
    println!("   Hardest sport:   {}", sport);
    println!();

    println!("GRADE PYRAMID");
    print_pyramid(&rows);
    println!();

    println!("RECENT SESSIONS");
    if recent.is_empty() {
        println!("   No sessions yet.");
    }
    for session in &recent {
        println!(
            "   {:<14} {:<28} {} climbs",
            format_session_date(session.date),
            session.name,
            session.climb_count
        );
    }

    if !dashboard.degraded.is_empty() {
        println!();
        let missing: Vec<_> = dashboard.degraded.iter().map(|d| d.as_str()).collect();
        println!("(could not load: {})", missing.join(", "));
    }
    Ok(())
}

async fn cmd_history(
    config: &Config,
    user: &str,
    daily: bool,
    export: Option<&str>,
) -> Result<()> {
    use cragbook_core::Backend;

    let gateway = gateway(config)?;
    let (sessions, unavailable) = match gateway.backend().fetch_sessions(user).await {
        Ok(sessions) => (sessions, false),
        Err(e) => {
            tracing::warn!(user = %user.trim(), error = %e, "Session history unavailable, showing empty list");
            (Vec::new(), true)
        }
    };
    if unavailable && export.is_some() {
        eprintln!("(could not load history)");
    }

    match (export, daily) {
        (Some("json"), true) => {
            let days: Vec<_> = daily_summaries(&sessions)
                .into_iter()
                .map(|d| {
                    serde_json::json!({
                        "date": d.date.to_string(),
                        "sessions": d.sessions,
                        "climbs": d.climbs,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&days)?);
        }
        (Some("json"), false) => {
            let rows: Vec<_> = session_summaries(&sessions)
                .into_iter()
                .map(|s| {
                    serde_json::json!({
                        "date": s.date.map(|d| d.to_string()),
                        "name": s.name,
                        "climbs": s.climb_count,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        (Some(other), _) => anyhow::bail!("Unknown export format: {}. Use 'json'", other),
        (None, true) => {
            for day in daily_summaries(&sessions) {
                println!(
                    "{:<14} {} session(s), {} climb(s)",
                    format_session_date(Some(day.date)),
                    day.sessions,
                    day.climbs
                );
            }
        }
        (None, false) => {
            if sessions.is_empty() && !unavailable {
                println!("No saved sessions for {}.", user.trim());
            }
            for row in session_summaries(&sessions) {
                println!(
                    "{:<14} {:<28} {} climbs",
                    format_session_date(row.date),
                    row.name,
                    row.climb_count
                );
            }
        }
    }
    if unavailable && export.is_none() {
        println!("(could not load history)");
    }
    Ok(())
}

fn print_pyramid(rows: &[PyramidRow]) {
    if rows.is_empty() {
        println!("   No climbs yet.");
        return;
    }
    let width = rows.iter().map(|r| r.grade.len()).max().unwrap_or(0);
    for row in rows {
        println!(
            "   {:>width$} {} {}",
            row.grade,
            "#".repeat(row.count.min(40)),
            row.count,
            width = width
        );
    }
}
