use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use dispatch_core::{Engine, EngineError};
use dispatch_store::{FileStorage, dispatch_home};

#[derive(Parser, Debug)]
#[command(name = "dispatch", version, about = "Learned task assignment over a local dataset")]
struct Cli {
    /// Data directory (default: ~/.dispatch)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a user
    AddUser {
        name: String,
    },

    /// Remove a user (cascades to their results and progress)
    RemoveUser {
        user_id: u32,
    },

    /// Add a task
    AddTask {
        kind: String,

        /// Difficulty in [0, 1]
        #[arg(long)]
        complexity: f64,

        /// Budget in hours (> 0)
        #[arg(long)]
        deadline: f64,
    },

    /// Remove a task (cascades to its results and progress)
    RemoveTask {
        task_id: u32,
    },

    /// Assign one task to its best-scoring eligible user
    Assign {
        task_id: u32,
    },

    /// Assign every task with no result and no active assignment
    AssignAll,

    /// Record a progress update for a tracked assignment
    Progress {
        task_id: u32,
        user_id: u32,

        /// Percent complete, 0..=100 (100 completes the assignment)
        percent: u8,

        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Record a completion outcome
    Complete {
        task_id: u32,
        user_id: u32,

        /// Hours spent (> 0)
        #[arg(long)]
        time_taken: f64,

        /// Outcome rating, 1..=5
        #[arg(long)]
        quality: u8,
    },

    /// Refit the model on the recorded outcomes
    Retrain,

    /// Show statistics, discovered skills, and active assignments
    Dashboard,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let dir = match cli.data_dir {
        Some(dir) => dir,
        None => dispatch_home()?,
    };
    let mut engine = Engine::open(FileStorage::open(dir)?)?;

    match cli.command {
        Command::AddUser { name } => {
            let user = engine.add_user(&name)?;
            println!("added user {} (id {})", user.name, user.user_id);
        }

        Command::RemoveUser { user_id } => {
            let user = engine.remove_user(user_id)?;
            println!("removed user {} (id {})", user.name, user.user_id);
        }

        Command::AddTask {
            kind,
            complexity,
            deadline,
        } => {
            let task = engine.add_task(&kind, complexity, deadline)?;
            println!(
                "added task {} (id {}, complexity {}, deadline {}h)",
                task.kind, task.task_id, task.complexity, task.deadline
            );
        }

        Command::RemoveTask { task_id } => {
            let task = engine.remove_task(task_id)?;
            println!("removed task {} (id {})", task.kind, task.task_id);
        }

        Command::Assign { task_id } => {
            report_assignment(&mut engine, task_id)?;
        }

        Command::AssignAll => {
            let outcomes = engine.assign_all_pending()?;
            if outcomes.is_empty() {
                println!("nothing to assign: every task is resolved or in flight");
            }
            for (task_id, assignment) in outcomes {
                print_assignment(task_id, assignment.as_ref(), engine.is_trained());
            }
        }

        Command::Progress {
            task_id,
            user_id,
            percent,
            notes,
        } => {
            let status = engine.record_progress(task_id, user_id, percent, &notes)?;
            println!(
                "task {task_id} / user {user_id}: {percent}% ({})",
                status.as_str()
            );
        }

        Command::Complete {
            task_id,
            user_id,
            time_taken,
            quality,
        } => {
            let summary = engine.record_result(task_id, user_id, time_taken, quality)?;
            println!(
                "completed: {} -> {} in {}h, quality {}/5",
                summary.user_name, summary.task_kind, summary.time_taken, summary.quality
            );
            if let Some(hours) = summary.actual_duration {
                println!("  wall clock: {hours:.2}h from assignment");
            }
            println!(
                "  deadline margin: {:+.1}%",
                summary.deadline_margin_percent
            );
        }

        Command::Retrain => match engine.retrain() {
            Ok(samples) => println!("model trained on {samples} samples"),
            Err(EngineError::InsufficientData(why)) => {
                println!("not trained: {why}");
            }
            Err(e) => return Err(e.into()),
        },

        Command::Dashboard => {
            print_dashboard(&engine);
        }
    }

    Ok(())
}

fn report_assignment(engine: &mut Engine<FileStorage>, task_id: u32) -> Result<()> {
    let trained = engine.is_trained();
    let assignment = engine.assign(task_id)?;
    print_assignment(task_id, assignment.as_ref(), trained);
    Ok(())
}

fn print_assignment(
    task_id: u32,
    assignment: Option<&dispatch_core::Assignment>,
    trained: bool,
) {
    match assignment {
        Some(a) => {
            let confidence = if trained { "model" } else { "cold start, random" };
            println!(
                "task {task_id} -> {} (id {}, score {:.3}, {confidence})",
                a.user_name, a.user_id, a.score
            );
        }
        None => println!("task {task_id}: no eligible user"),
    }
}

fn print_dashboard(engine: &Engine<FileStorage>) {
    let snap = engine.dashboard();

    match &snap.totals {
        Some(t) => {
            println!("completed tasks: {}", t.completed);
            println!("average quality: {:.2}/5", t.mean_quality);
            println!("average time:    {:.1}h", t.mean_time_taken);
        }
        None => println!("no results yet - ready for first assignments"),
    }

    if !snap.user_performance.is_empty() {
        println!("\nuser performance");
        for p in &snap.user_performance {
            println!(
                "  {}: {:.2}/5 quality, {:.1}h avg, {} done",
                p.user_name, p.mean_quality, p.mean_time_taken, p.tasks_done
            );
        }
    }

    if !snap.skills.is_empty() {
        println!("\ndiscovered skills");
        for s in &snap.skills {
            println!(
                "  {} / {}: {:.1}/5 quality, {:.1}h avg ({})",
                s.user_name,
                s.task_kind,
                s.mean_quality,
                s.mean_time_taken,
                s.level.as_str()
            );
        }
    }

    if snap.active.is_empty() {
        println!("\nno active assignments");
    } else {
        println!("\nactive assignments");
        for a in &snap.active {
            println!(
                "  task {}: {} -> {} ({}, started {:.1}h ago)",
                a.task_id,
                a.user_name,
                a.task_kind,
                a.status.as_str(),
                a.hours_elapsed
            );
            if let Some(percent) = a.latest_percent {
                match &a.latest_notes {
                    Some(notes) => println!("    progress: {percent}% - {notes}"),
                    None => println!("    progress: {percent}%"),
                }
            }
        }
    }

    println!(
        "\nmodel: {}",
        if snap.model_trained {
            "trained"
        } else {
            "cold start (random assignment)"
        }
    );
}
