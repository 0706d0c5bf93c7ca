// Werewolf role planner and dealer
//
// Subcommands:
//
// - `roles`  - list the role catalog, optionally scaled for a table size
// - `plan`   - show the distribution and balance verdict for N participants
// - `assign` - deal secret roles to named participants, with optional locks
//
// A custom catalog can be supplied as JSON with `--catalog` or the
// `WEREWOLF_CATALOG` environment variable.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, Level};

use werewolf_roles::telemetry::init_tracing;
use werewolf_roles::{
    BalanceVerdict, Catalog, Distribution, EngineError, GameSession, SessionError,
    UnbalancedPolicy,
};

/// Werewolf party game role planner
#[derive(Parser, Debug)]
#[command(name = "werewolf-roles")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Plan and deal secret roles for a Werewolf party game", long_about = None)]
struct Cli {
    /// Role catalog JSON file (defaults to the built-in catalog)
    #[arg(long, global = true, env = "WEREWOLF_CATALOG")]
    catalog: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the roles of the catalog
    Roles {
        /// Show how many of each role the scaling table gives for this many participants
        #[arg(short, long)]
        players: Option<usize>,
    },

    /// Show the role distribution for a number of participants
    Plan {
        /// Number of participants (8-20)
        count: usize,
    },

    /// Deal roles to participants
    Assign {
        /// Participant name (repeat once per participant)
        #[arg(short, long = "player", required = true)]
        players: Vec<String>,

        /// Pin a role on a participant: NAME=ROLE (e.g. "Alice=seer")
        #[arg(short, long = "lock")]
        locks: Vec<String>,

        /// Seed for a reproducible deal
        #[arg(long)]
        seed: Option<u64>,

        /// Deal even when the distribution is not balanced
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    init_tracing(cli.json_logs, level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let catalog = Arc::new(load_catalog(cli.catalog.as_deref())?);

    match cli.command {
        Command::Roles { players } => roles_cmd(&catalog, players, cli.json),
        Command::Plan { count } => plan_cmd(catalog, count, cli.json),
        Command::Assign {
            players,
            locks,
            seed,
            force,
        } => assign_cmd(catalog, &players, &locks, seed, force, cli.json),
    }
}

fn load_catalog(path: Option<&std::path::Path>) -> Result<Catalog> {
    let catalog = match path {
        Some(path) => Catalog::load(path)?,
        None => Catalog::standard(),
    };
    // A catalog without the mandatory roles cannot plan any game.
    catalog
        .check_integrity()
        .context("role catalog failed validation")?;
    debug!(roles = catalog.len(), "role catalog ready");
    Ok(catalog)
}

fn roles_cmd(catalog: &Catalog, players: Option<usize>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(catalog.roles())?);
        return Ok(());
    }

    if let Some(count) = players {
        println!("Roles for {} participants:", count);
    } else {
        println!("Roles:");
    }
    for role in catalog.roles() {
        let scaled = players
            .map(|count| format!(" x{}", role.scaled_quantity(count)))
            .unwrap_or_default();
        println!(
            "  {:<9} {:<12} {:<10} from {:>2} players{}",
            role.id, role.name, role.team, role.min_players, scaled
        );
        println!("            {}", role.description);
    }
    Ok(())
}

fn plan_cmd(catalog: Arc<Catalog>, count: usize, json: bool) -> Result<()> {
    let session = GameSession::new(catalog)?;
    let plan = session.engine().plan(count)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("Distribution for {} participants:", count);
    print_distribution(session.catalog(), &plan.distribution);
    print_verdict(&plan.verdict);
    Ok(())
}

fn assign_cmd(
    catalog: Arc<Catalog>,
    players: &[String],
    locks: &[String],
    seed: Option<u64>,
    force: bool,
    json: bool,
) -> Result<()> {
    let mut session = GameSession::new(catalog)?;
    for name in players {
        session
            .add_participant(name)
            .with_context(|| format!("cannot add participant '{}'", name))?;
    }

    for lock in locks {
        let (name, role) = lock
            .split_once('=')
            .ok_or_else(|| anyhow!("lock must look like NAME=ROLE, got '{}'", lock))?;
        let participant = session
            .roster()
            .find_by_name(name)
            .map(|participant| participant.id.clone())
            .ok_or_else(|| anyhow!("lock names unknown participant '{}'", name.trim()))?;
        session.lock_role(&participant, &role.trim().to_uppercase())?;
    }

    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let policy = if force {
        UnbalancedPolicy::Proceed
    } else {
        UnbalancedPolicy::Abort
    };

    let verdict = match session.assign_roles(policy, &mut rng) {
        Ok(deal) => deal.plan.verdict.clone(),
        Err(SessionError::Engine(EngineError::Unbalanced { participants })) => {
            let plan = session.engine().plan(participants)?;
            print_verdict(&plan.verdict);
            bail!(
                "the role distribution for {} participants is not balanced; rerun with --force to deal anyway",
                participants
            );
        }
        Err(e) => return Err(e.into()),
    };

    let revealed = session.reveal()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&revealed)?);
        return Ok(());
    }

    if !verdict.is_balanced {
        println!("Dealing an unbalanced distribution (--force)\n");
    }
    println!("Role assignments:");
    for entry in &revealed {
        println!(
            "  {}: {}{}",
            entry.participant.name,
            entry.role_name,
            if entry.locked { " (locked)" } else { "" }
        );
        println!("      {}", entry.description);
    }
    if let Some(assignment) = session.assignment() {
        for participant in assignment.unassigned() {
            println!("  {}: no role left", participant);
        }
    }
    Ok(())
}

fn print_distribution(catalog: &Catalog, distribution: &Distribution) {
    for (id, quantity) in distribution.iter() {
        match catalog.get_role(id.as_str()) {
            Ok(role) => println!("  {} x {} ({}, {})", quantity, role.name, role.id, role.team),
            Err(_) => println!("  {} x {} (not in catalog)", quantity, id),
        }
    }
}

fn print_verdict(verdict: &BalanceVerdict) {
    if verdict.is_balanced {
        println!("\n✓ BALANCED");
    } else {
        println!("\n✗ NOT BALANCED");
    }

    if let Some(issue) = &verdict.issue {
        println!("  {}", issue);
    }
    if let Some(metrics) = &verdict.metrics {
        match metrics.villager_to_werewolf_ratio {
            Some(ratio) => println!(
                "  Villager/werewolf ratio: {:.2} (minimum {:.2})",
                ratio, metrics.min_villager_ratio
            ),
            None => println!("  Villager/werewolf ratio: no werewolves"),
        }
        println!(
            "  Special role ratio: {:.2} (allowed 0.20-0.60)",
            metrics.special_role_ratio
        );
        println!(
            "  {} participants: {} werewolves, {} others ({} neutral), {} special roles",
            metrics.total,
            metrics.werewolf_count,
            metrics.villager_count,
            metrics.neutral_count,
            metrics.special_count
        );
    }
}
