//! Subcommand handlers.

use anyhow::{bail, Context, Result};
use starlog_core::format::{format_cooldown, format_duration_secs, format_relative_time};
use starlog_core::templates::TemplateStore;
use starlog_core::tutorial::TUTORIAL_STEPS;
use starlog_core::{
    AppState, Error, Responses, RewardDraft, RewardState, SessionPatch, TaskDraft, TaskPatch,
    Template, MAX_RATING,
};

use crate::{
    EndArgs, OutputFormat, RewardCommand, SessionCommand, TaskCommand, TemplateCommand,
    TutorialCommand,
};

// ============================================
// Tasks
// ============================================

pub fn task(app: &mut AppState, cmd: TaskCommand) -> Result<()> {
    match cmd {
        TaskCommand::Add {
            name,
            goal,
            description,
        } => {
            let task = app.tasks_mut().add(TaskDraft {
                name,
                goal,
                description,
            })?;
            println!("Added task {} ({})", task.name, task.id);
        }
        TaskCommand::List => {
            let tasks = app.tasks().list();
            if tasks.is_empty() {
                println!("No tasks yet. Create one with 'starlog task add <name>'.");
                return Ok(());
            }
            let now = app.now();
            for task in tasks {
                let mark = if task.is_completed() { "x" } else { " " };
                let sessions = app
                    .sessions()
                    .history()
                    .iter()
                    .filter(|s| s.task_id.as_deref() == Some(task.id.as_str()))
                    .count();
                println!(
                    "[{}] {}  {}  ({} sessions, created {})",
                    mark,
                    task.id,
                    task.name,
                    sessions,
                    format_relative_time(task.created_at, now)
                );
                if let Some(goal) = &task.goal {
                    println!("      goal: {}", goal);
                }
            }
        }
        TaskCommand::Update {
            id,
            name,
            goal,
            description,
        } => {
            let patch = TaskPatch {
                name,
                goal,
                description,
            };
            if !app.tasks_mut().update(&id, patch) {
                return Err(Error::TaskNotFound(id).into());
            }
            println!("Updated task {}", id);
        }
        TaskCommand::Complete { id, result } => {
            let task = app
                .tasks_mut()
                .complete(&id, result.map(serde_json::Value::String))?;
            println!("Completed task {}", task.name);
        }
        TaskCommand::Reopen { id } => {
            let task = app.tasks_mut().reopen(&id)?;
            println!("Reopened task {}", task.name);
        }
        TaskCommand::Remove { id } => {
            if !app.remove_task(&id) {
                return Err(Error::TaskNotFound(id).into());
            }
            println!("Removed task {} and its sessions", id);
        }
        TaskCommand::Clear => {
            let removed = app.clear_tasks();
            println!("Removed {} task(s)", removed.len());
        }
    }
    Ok(())
}

// ============================================
// Sessions
// ============================================

pub fn session(app: &mut AppState, templates: &TemplateStore, cmd: SessionCommand) -> Result<()> {
    match cmd {
        SessionCommand::Start {
            template,
            minutes,
            task,
        } => {
            let template = resolve_template(templates, template.as_deref())?;
            if let Some(task_id) = task.as_deref() {
                if app.task(task_id).is_none() {
                    return Err(Error::TaskNotFound(task_id.to_string()).into());
                }
            }
            if let Some(previous) = app.sessions().active() {
                println!("Discarding active session {}", previous.name);
            }

            let active = app.start_session(&template, minutes, task.as_deref());
            println!(
                "Started {} with template '{}' ({})",
                active.name, active.template_name, active.id
            );
            if let Some(planned) = active.planned_duration_secs {
                println!("Planned length: {}", format_duration_secs(planned as i64));
            }
        }
        SessionCommand::End(args) => {
            let Some(active) = app.sessions().active() else {
                return Err(Error::NoActiveSession.into());
            };
            let responses = parse_responses(&args, &active.questions)?;
            let session = app.end_session(responses).ok_or(Error::NoActiveSession)?;
            println!(
                "Finished {} after {}, earned {} stars",
                session.name,
                format_duration_secs(session.duration),
                session.stars_earned()
            );
            println!("Balance: {} stars", app.available_stars());
        }
        SessionCommand::Cancel => {
            let active = app.cancel_session().ok_or(Error::NoActiveSession)?;
            println!("Cancelled {}", active.name);
        }
        SessionCommand::Status => match app.sessions().active() {
            Some(active) => {
                let elapsed = (app.now() - active.start_time).num_seconds().max(0);
                println!("{} ({})", active.name, active.id);
                println!("  template: {}", active.template_name);
                if let Some(task_id) = &active.task_id {
                    let name = app.task(task_id).map_or("unknown task", |t| t.name.as_str());
                    println!("  task:     {}", name);
                }
                println!("  elapsed:  {}", format_duration_secs(elapsed));
                if let Some(planned) = active.planned_duration_secs {
                    println!("  planned:  {}", format_duration_secs(planned as i64));
                }
                for question in &active.questions {
                    let kind = if question.stars { "rating" } else { "answer" };
                    println!("  [{}] {} ({})", question.id, question.label, kind);
                }
            }
            None => println!("No active session."),
        },
        SessionCommand::List { task } => {
            let now = app.now();
            let sessions: Vec<_> = app
                .sessions()
                .history()
                .iter()
                .filter(|s| task.is_none() || s.task_id == task)
                .collect();
            if sessions.is_empty() {
                println!("No sessions found.");
                return Ok(());
            }
            for s in sessions {
                println!(
                    "{}  {}  {}  {}  {} stars  {}",
                    s.id,
                    s.name,
                    s.template_name,
                    format_duration_secs(s.duration),
                    s.stars_earned(),
                    format_relative_time(s.end_time, now)
                );
                if let Some(notes) = &s.notes {
                    println!("      notes: {}", notes);
                }
            }
        }
        SessionCommand::Note {
            id,
            name,
            notes,
            group,
        } => {
            let patch = SessionPatch {
                name,
                notes,
                group,
                task_id: None,
            };
            if !app.update_session(&id, patch) {
                bail!("session not found: {}", id);
            }
            println!("Updated session {}", id);
        }
        SessionCommand::Clear => {
            app.clear_sessions();
            println!("Cleared session history");
        }
    }
    Ok(())
}

fn resolve_template(templates: &TemplateStore, id: Option<&str>) -> Result<Template> {
    match id {
        Some(id) => Ok(templates.get(id)?),
        None => templates
            .list()?
            .into_iter()
            .next()
            .context("no templates available"),
    }
}

/// Parse `--answer` / `--rating` pairs against the active questions.
fn parse_responses(args: &EndArgs, questions: &[starlog_core::Question]) -> Result<Responses> {
    let mut responses = Responses::new();

    for raw in &args.ratings {
        let (qid, value) = split_pair(raw)?;
        let rating: i64 = value
            .parse()
            .with_context(|| format!("rating for '{}' is not a number: {}", qid, value))?;
        if !(1..=MAX_RATING).contains(&rating) {
            bail!(
                "rating for '{}' must be between 1 and {}, got {}",
                qid,
                MAX_RATING,
                rating
            );
        }
        check_question(qid, questions)?;
        responses.entry(qid.to_string()).or_default().rating = Some(rating);
    }

    for raw in &args.answers {
        let (qid, value) = split_pair(raw)?;
        check_question(qid, questions)?;
        responses.entry(qid.to_string()).or_default().answer = Some(value.to_string());
    }

    Ok(responses)
}

fn split_pair(raw: &str) -> Result<(&str, &str)> {
    raw.split_once('=')
        .with_context(|| format!("expected QUESTION_ID=VALUE, got '{}'", raw))
}

fn check_question(qid: &str, questions: &[starlog_core::Question]) -> Result<()> {
    if !questions.iter().any(|q| q.id == qid) {
        bail!("unknown question id '{}'", qid);
    }
    Ok(())
}

// ============================================
// Rewards
// ============================================

pub fn reward(app: &mut AppState, cmd: RewardCommand) -> Result<()> {
    match cmd {
        RewardCommand::List { format } => {
            let balance = app.available_stars();
            if format == OutputFormat::Json {
                let rows: Vec<_> = app
                    .rewards()
                    .list()
                    .iter()
                    .map(|r| {
                        serde_json::json!({
                            "reward": r,
                            "state": app.reward_state(r),
                            "cooldownRemainingSecs": app.cooldown_remaining(r).num_seconds(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
                return Ok(());
            }

            println!("Balance: {} stars\n", balance);
            for r in app.rewards().list() {
                let state = app.reward_state(r);
                let detail = match state {
                    RewardState::Cooldown => format_cooldown(app.cooldown_remaining(r)),
                    RewardState::Locked => format!("need {} more", r.star_cost - balance),
                    RewardState::Affordable => "available".to_string(),
                };
                println!(
                    "{:>4}  {} {:<20} {:>5} stars  {:<10} {}",
                    r.id, r.emoji, r.name, r.star_cost, state, detail
                );
            }
        }
        RewardCommand::Add {
            name,
            cost,
            emoji,
            description,
        } => {
            let reward = app.add_reward(RewardDraft {
                name,
                emoji,
                description,
                star_cost: cost,
                ..Default::default()
            })?;
            println!(
                "Added reward {} for {} stars ({})",
                reward.name, reward.star_cost, reward.id
            );
        }
        RewardCommand::Buy { id } => {
            let record = app.purchase(&id)?;
            println!(
                "Bought {} for {} stars. Balance: {} stars",
                record.reward_name,
                record.stars_cost,
                app.available_stars()
            );
        }
        RewardCommand::History => {
            let purchases = app.rewards().purchases();
            if purchases.is_empty() {
                println!("No purchases yet.");
                return Ok(());
            }
            let now = app.now();
            for p in purchases {
                println!(
                    "{}  {:<20} {:>5} stars  {}",
                    p.id,
                    p.reward_name,
                    p.stars_cost,
                    format_relative_time(p.purchased_at, now)
                );
            }
        }
    }
    Ok(())
}

// ============================================
// Stats and balance
// ============================================

pub fn stats(app: &AppState, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&app.stats())?);
        return Ok(());
    }

    let Some(stats) = app.stats() else {
        println!("No sessions completed yet.");
        return Ok(());
    };
    println!("Sessions:          {}", stats.total_sessions);
    println!("Average rating:    {:.1}", stats.average_rating);
    println!("Average duration:  {}", stats.format_average_duration());
    println!(
        "Total time:        {}",
        format_duration_secs(stats.total_duration_secs)
    );
    println!("Questions answered: {}", stats.total_answered);
    Ok(())
}

pub fn balance(app: &AppState) -> Result<()> {
    let earned = starlog_core::analytics::total_earned(app.sessions().history());
    let spent = starlog_core::analytics::total_spent(app.rewards().purchases());
    println!("Earned:    {} stars", earned);
    println!("Spent:     {} stars", spent);
    println!("Available: {} stars", app.available_stars());
    Ok(())
}

// ============================================
// Templates
// ============================================

pub fn template(templates: &TemplateStore, cmd: TemplateCommand) -> Result<()> {
    match cmd {
        TemplateCommand::List => {
            for t in templates.list()? {
                println!("{}  {} ({} questions)", t.id, t.name, t.questions.len());
            }
        }
        TemplateCommand::Show { id } => {
            let t = templates.get(&id)?;
            println!("{} ({})", t.name, t.id);
            if !t.description.is_empty() {
                println!("{}", t.description);
            }
            for q in &t.questions {
                let stars = if q.stars { " *" } else { "" };
                println!("  [{}] {} <{}>{}", q.id, q.label, q.kind, stars);
                if let Some(options) = &q.options {
                    println!("      options: {}", options.join(", "));
                }
            }
        }
        TemplateCommand::Add { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let template: Template =
                serde_json::from_str(&content).context("failed to parse template JSON")?;
            let saved = templates.upsert(template)?;
            println!("Saved template {} ({})", saved.name, saved.id);
        }
        TemplateCommand::Delete { id } => {
            let deleted = templates.delete(&id)?;
            println!("Deleted template {}", deleted.name);
        }
    }
    Ok(())
}

// ============================================
// Tutorial
// ============================================

pub fn tutorial(app: &mut AppState, cmd: TutorialCommand) -> Result<()> {
    match cmd {
        TutorialCommand::Status => {}
        TutorialCommand::Start => app.tutorial_mut().start(),
        TutorialCommand::Next => app.tutorial_mut().next_step(),
        TutorialCommand::Skip => app.tutorial_mut().skip(),
        TutorialCommand::Reset => app.tutorial_mut().reset(),
    }

    let tutorial = app.tutorial();
    let state = tutorial.state();
    match tutorial.current_step() {
        Some(step) => {
            println!(
                "Step {}/{}: {}",
                state.current_step_index + 1,
                TUTORIAL_STEPS.len(),
                step.title
            );
            println!("  {}", step.description);
        }
        None if state.skipped => println!("Tutorial skipped."),
        None if state.completed_steps.len() >= TUTORIAL_STEPS.len() => {
            println!("Tutorial complete.")
        }
        None => println!("Tutorial not started."),
    }
    println!(
        "Completed {} of {} steps",
        state.completed_steps.len(),
        TUTORIAL_STEPS.len()
    );
    Ok(())
}
