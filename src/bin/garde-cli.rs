#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use garde::{
    config, io,
    model::{Member, MemberId, Role},
    scheduler::{
        detect_conflicts, AssignmentEngine, ConflictKind, EngineOptions, LastAssigned, RankStrategy,
    },
    storage::{JsonStorage, Storage},
    Directory, IdentityResolver, MonthCalendar, PlanRenderer, SelfIdentity, TextSummary,
};
use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::collections::BTreeSet;
use std::path::Path;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// Générateur de gardes primaire/secondaire
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du planning
    #[arg(long, global = true, default_value = "roster.json")]
    roster: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Générer le planning à partir d'un export CSV de sondage
    Plan {
        #[arg(long)]
        csv: String,
        /// Annuaire JSON `{"users": [...]}`
        #[arg(long)]
        directory: Option<String>,
        /// Options moteur (JSON)
        #[arg(long)]
        config: Option<String>,
        /// liste "id1,id2,..." exclue du rôle secondaire
        #[arg(long)]
        newcomers: Option<String>,
        /// fichier, un identifiant par ligne
        #[arg(long)]
        newcomers_file: Option<String>,
        #[arg(long)]
        strategy: Option<RankStrategy>,
        #[arg(long)]
        fallback_strategy: Option<RankStrategy>,
        /// Ne pas mélanger les membres avant la génération
        #[arg(short = 'n', long)]
        no_shuffle: bool,
        /// Graine du mélange (reproductible)
        #[arg(long)]
        seed: Option<u64>,
        /// Dernier primaire de la rotation précédente
        #[arg(long)]
        last_primary: Option<String>,
        /// Dernier secondaire de la rotation précédente
        #[arg(long)]
        last_secondary: Option<String>,
        /// Dossier des exports overrides (primary.json, secondary.json)
        #[arg(long, default_value = ".")]
        out_dir: String,
        #[arg(long)]
        out_csv: Option<String>,
        #[arg(long)]
        fairness_csv: Option<String>,
        /// Affiche les calendriers mensuels
        #[arg(long)]
        calendar: bool,
    },

    /// Vérifier un planning existant contre le sondage
    Check {
        #[arg(long)]
        csv: String,
        #[arg(long)]
        newcomers: Option<String>,
        /// Export CSV des conflits (optionnel)
        #[arg(long)]
        report: Option<String>,
    },

    /// Statistiques d'indisponibilité du sondage
    Stats {
        #[arg(long)]
        csv: String,
    },

    /// Écrire les options par défaut dans un fichier JSON
    DefaultConfig {
        #[arg(long)]
        out: String,
    },
}

fn parse_ids(list: Option<&str>) -> BTreeSet<MemberId> {
    list.map(|l| {
        l.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(MemberId::new)
            .collect()
    })
    .unwrap_or_default()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.roster);

    let code = match cli.cmd {
        Commands::Plan {
            csv,
            directory,
            config: config_path,
            newcomers,
            newcomers_file,
            strategy,
            fallback_strategy,
            no_shuffle,
            seed,
            last_primary,
            last_secondary,
            out_dir,
            out_csv,
            fairness_csv,
            calendar,
        } => {
            let mut input = io::import_poll_csv(&csv)?;

            let mut options = match config_path {
                Some(path) => config::load_options_from_file(path)?,
                None => EngineOptions::default(),
            };
            if let Some(s) = strategy {
                options.strategy = s;
            }
            if let Some(s) = fallback_strategy {
                options.fallback_strategy = s;
            }
            options.newcomers.extend(parse_ids(newcomers.as_deref()));
            if let Some(path) = newcomers_file {
                options.newcomers.extend(io::load_member_list(path)?);
            }

            if !no_shuffle {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                input.members.shuffle(&mut rng);
            }

            let directory = directory.map(Directory::load_json).transpose()?;
            let resolver: &dyn IdentityResolver = match &directory {
                Some(d) => d,
                None => &SelfIdentity,
            };
            let history = LastAssigned {
                primary: last_primary
                    .map(|id| resolver.resolve(&Member::new(id)))
                    .transpose()?,
                secondary: last_secondary
                    .map(|id| resolver.resolve(&Member::new(id)))
                    .transpose()?,
            };

            let handoff = options.handoff;
            let mut engine = AssignmentEngine::new(input, resolver)?
                .with_options(options)?
                .with_history(history);
            let plan = match engine.run() {
                Ok(plan) => plan,
                Err(err) => {
                    eprintln!(
                        "Roster aborted after {} block(s); nothing was written",
                        engine.partial(Role::Primary).len()
                    );
                    return Err(err.into());
                }
            };

            storage.save(&plan)?;
            let out_dir = Path::new(&out_dir);
            io::export_overrides_json(out_dir.join("primary.json"), &plan.primary, handoff)
                .context("writing primary overrides")?;
            io::export_overrides_json(out_dir.join("secondary.json"), &plan.secondary, handoff)
                .context("writing secondary overrides")?;
            if let Some(path) = out_csv {
                io::export_plan_csv(path, &plan)?;
            }
            if let Some(path) = fairness_csv {
                io::export_fairness_csv(path, &plan)?;
            }

            print!("{}", TextSummary.render(&plan));
            if calendar {
                println!("\nPrimary on-call shift\n");
                print!("{}", MonthCalendar::new(Role::Primary).render(&plan));
                println!("Secondary on-call shift\n");
                print!("{}", MonthCalendar::new(Role::Secondary).render(&plan));
            }
            0
        }
        Commands::Check {
            csv: poll,
            newcomers,
            report,
        } => {
            let input = io::import_poll_csv(&poll)?;
            let plan = storage.load()?;
            let mut excluded = parse_ids(newcomers.as_deref());
            excluded.extend(input.members.iter().filter(|m| m.newcomer).map(|m| m.id.clone()));

            let conflicts = detect_conflicts(&input, &plan, &excluded);
            if conflicts.is_empty() {
                println!("OK: no conflicts");
                0
            } else {
                eprintln!("Found {} conflict(s)", conflicts.len());
                if let Some(path) = report {
                    // CSV simple
                    let mut w = csv::Writer::from_path(path)?;
                    w.write_record(["date", "role", "member", "kind"])?;
                    for c in &conflicts {
                        let date = c.date.to_string();
                        let role = c.role.map(|r| r.to_string()).unwrap_or_default();
                        w.write_record([
                            date.as_str(),
                            role.as_str(),
                            c.member.as_ref().map(MemberId::as_str).unwrap_or(""),
                            match c.kind {
                                ConflictKind::Unavailable => "unavailable",
                                ConflictKind::NewcomerAsSecondary => "newcomer",
                                ConflictKind::DoubleAssignment => "double",
                                ConflictKind::ConsecutiveRepeat => "repeat",
                                ConflictKind::Uncovered => "uncovered",
                            },
                        ])?;
                    }
                    w.flush()?;
                }
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        Commands::Stats { csv } => {
            let input = io::import_poll_csv(&csv)?;
            let stats = input.unavailability_stats();
            for m in &input.members {
                println!(
                    "* {}: {} weekday(s) | {} week-end day(s)",
                    m.id,
                    stats.weekdays.get(&m.id).copied().unwrap_or(0),
                    stats.weekends.get(&m.id).copied().unwrap_or(0)
                );
            }
            0
        }
        Commands::DefaultConfig { out } => {
            config::export_options_json(&out, &EngineOptions::default())?;
            println!("Default options written to {out}");
            0
        }
    };

    std::process::exit(code);
}
