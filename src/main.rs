use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use mentordesk_core::{AppError, Config, ConfigError, LoadState};
use mentordesk_services::{ApiClient, MentorApi};
use mentordesk_views::{
    deadline_label, MentorDirectory, MentorSort, SyncError, TaskBoard, TaskSort, ALL_CATEGORIES,
};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Parser)]
#[command(name = "mentordesk", about = "Browse mentors and track tasks")]
struct Cli {
    /// Base URL of the MentorDesk API (overrides config and MENTORDESK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List mentors
    Mentors {
        /// Case-insensitive match on profession, specialization or bio
        #[arg(long, default_value = "")]
        search: String,
        /// Exact profession, or "all"
        #[arg(long, default_value = ALL_CATEGORIES)]
        category: String,
        /// popular, rating or followers
        #[arg(long, default_value = "popular")]
        sort: MentorSort,
    },
    /// List tasks
    Tasks {
        /// Case-insensitive match on title or description
        #[arg(long, default_value = "")]
        search: String,
        /// Exact category, or "all"
        #[arg(long, default_value = ALL_CATEGORIES)]
        category: String,
        /// deadline, priority or progress
        #[arg(long, default_value = "deadline")]
        sort: TaskSort,
    },
    /// Follow a mentor
    Follow { mentor_id: String },
    /// Set a task's progress (0-100)
    Progress {
        task_id: String,
        #[arg(allow_hyphen_values = true)]
        value: i64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = mentordesk_core::init() {
        eprintln!("{}", e);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let (config, _) = Config::load_validated(cli.api_url)
        .map_err(|e| AppError::Config(ConfigError::Invalid(format!("{:#}", e))))?;

    let runtime = tokio::runtime::Runtime::new()?;
    let client = ApiClient::new(
        &config.api.base_url,
        Duration::from_secs(config.api.request_timeout_secs),
    )
    .map_err(SyncError::from)?;
    let api: Arc<dyn MentorApi> = Arc::new(client);

    // Long enough for a fetch or write plus the progress debounce.
    let deadline = Duration::from_secs(config.api.request_timeout_secs)
        + config.sync.progress_debounce()
        + Duration::from_secs(1);

    tracing::info!("MentorDesk using {}", config.api.base_url);

    match cli.command {
        Command::Mentors {
            search,
            category,
            sort,
        } => {
            let mut directory = MentorDirectory::new(api, runtime.handle().clone(), config.sync);
            directory.set_search_term(search);
            directory.set_category_filter(category);
            directory.set_sort(sort);
            load_mentors(&mut directory, deadline)?;

            for mentor in directory.visible() {
                println!(
                    "{:<26} {:<24} {:>4.1}  {:>6} followers  {}",
                    mentor.id,
                    mentor.profession,
                    mentor.average_rating,
                    mentor.total_followers,
                    mentor.specialization
                );
            }
        }
        Command::Tasks {
            search,
            category,
            sort,
        } => {
            let mut board = TaskBoard::new(api, runtime.handle().clone(), config.sync);
            board.set_search_term(search);
            board.set_category_filter(category);
            board.set_sort(sort);
            load_tasks(&mut board, deadline)?;

            let now = chrono::Utc::now();
            for task in board.visible() {
                println!(
                    "{:<26} {:<32} {:<12} {:<7} {:>4}  {}",
                    task.id,
                    task.title,
                    task.category,
                    task.priority.as_str(),
                    task.progress.to_string(),
                    deadline_label(task, now)
                );
            }
        }
        Command::Follow { mentor_id } => {
            let mut directory = MentorDirectory::new(api, runtime.handle().clone(), config.sync);
            load_mentors(&mut directory, deadline)?;

            directory.follow(&mentor_id)?;
            wait(&mut directory, MentorDirectory::poll_channel, MentorDirectory::is_settled, deadline)?;
            if let Some(e) = directory.last_error() {
                return Err(e.clone().into());
            }

            if let Some(mentor) = directory.get(&mentor_id) {
                println!("Following {} ({} followers)", mentor.profession, mentor.total_followers);
            }
        }
        Command::Progress { task_id, value } => {
            let mut board = TaskBoard::new(api, runtime.handle().clone(), config.sync);
            load_tasks(&mut board, deadline)?;

            let progress = board.drag_progress(&task_id, value)?;
            wait(&mut board, TaskBoard::poll_channel, TaskBoard::is_settled, deadline)?;
            if let Some(e) = board.last_error() {
                return Err(e.clone().into());
            }

            println!("Progress for {} saved at {}", task_id, progress);
        }
    }

    Ok(())
}

fn load_mentors(directory: &mut MentorDirectory, deadline: Duration) -> Result<(), AppError> {
    directory.mount();
    wait(directory, MentorDirectory::poll_channel, MentorDirectory::is_settled, deadline)?;
    match (directory.load_state(), directory.last_error()) {
        (LoadState::Failed, Some(e)) => Err(e.clone().into()),
        _ => Ok(()),
    }
}

fn load_tasks(board: &mut TaskBoard, deadline: Duration) -> Result<(), AppError> {
    board.mount();
    wait(board, TaskBoard::poll_channel, TaskBoard::is_settled, deadline)?;
    match (board.load_state(), board.last_error()) {
        (LoadState::Failed, Some(e)) => Err(e.clone().into()),
        _ => Ok(()),
    }
}

/// Poll a view from this thread until it has nothing outstanding.
fn wait<V>(
    view: &mut V,
    poll: fn(&mut V) -> usize,
    settled: fn(&V) -> bool,
    deadline: Duration,
) -> Result<(), AppError> {
    let started = Instant::now();
    loop {
        poll(view);
        if settled(view) {
            return Ok(());
        }
        if started.elapsed() > deadline {
            return Err(AppError::Service("Timed out waiting for the server".into()));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
