//! Subcommands and their handlers

use anyhow::{bail, Result};
use clap::Subcommand;
use todo_core::task::{Task, TaskFilter, TaskStatus};
use todo_core::TodoClient;

use crate::forms::{validate_login, validate_signup, SignupForm};
use crate::render;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account and sign in
    Signup {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "TODO_PASSWORD", hide_env_values = true)]
        password: String,
        /// Defaults to --password
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Sign in
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TODO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List tasks
    List {
        #[arg(long, default_value = "all")]
        filter: TaskFilter,
        /// Only tasks whose title or description contains this text
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Add a task
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Change a task's title and description
    Edit {
        id: String,
        title: String,
        /// Keeps the current description when omitted
        #[arg(long)]
        description: Option<String>,
    },
    /// Mark a task completed
    Done { id: String },
    /// Mark a task active again
    Undo { id: String },
    /// Flip a task between active and completed
    Toggle { id: String },
    /// Delete a task
    Delete { id: String },
}

pub async fn run(command: Command, client: &TodoClient) -> Result<()> {
    match command {
        Command::Signup {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
        } => {
            let confirm = confirm_password.unwrap_or_else(|| password.clone());
            validate_signup(&SignupForm {
                first_name: &first_name,
                last_name: &last_name,
                email: &email,
                password: &password,
                confirm_password: &confirm,
            })?;
            let identity = client
                .signup(&first_name, &last_name, &email, &password)
                .await?;
            render::print_identity(&identity);
        }
        Command::Login { email, password } => {
            validate_login(&email, &password)?;
            let identity = client.login(&email, &password).await?;
            render::print_identity(&identity);
        }
        Command::Logout => client.logout().await,
        Command::Whoami => match client.session().identity().await {
            Some(identity) => render::print_identity(&identity),
            None => println!("Not signed in."),
        },
        command => run_task_command(command, client).await?,
    }
    Ok(())
}

async fn run_task_command(command: Command, client: &TodoClient) -> Result<()> {
    if !client.session().is_authenticated().await {
        bail!("Not signed in. Run `todo login` first.");
    }
    let tasks = client.tasks();

    // The initial load after restore may have failed; surface that instead
    // of acting on an empty collection.
    if let Some(error) = tasks.error().await {
        bail!(error);
    }

    match command {
        Command::List { filter, search } => {
            let shown = tasks.filtered(filter, &search).await;
            render::print_tasks(&shown, tasks.counts().await);
        }
        Command::Add { title, description } => {
            if let Some(task) = tasks.create(&title, &description).await? {
                println!("{}", render::task_line(&task));
            }
        }
        Command::Edit {
            id,
            title,
            description,
        } => {
            let description = match description {
                Some(description) => description,
                None => current_description(&id, tasks.get(&id).await)?,
            };
            if let Some(task) = tasks.update(&id, &title, &description).await? {
                println!("{}", render::task_line(&task));
            }
        }
        Command::Done { id } => set_status(client, &id, TaskStatus::Completed).await?,
        Command::Undo { id } => set_status(client, &id, TaskStatus::Active).await?,
        Command::Toggle { id } => match tasks.toggle(&id).await? {
            Some(task) => println!("{}", render::task_line(&task)),
            None => bail!("No task with id {}", id),
        },
        Command::Delete { id } => tasks.remove(&id).await?,
        Command::Signup { .. } | Command::Login { .. } | Command::Logout | Command::Whoami => {}
    }
    Ok(())
}

async fn set_status(client: &TodoClient, id: &str, status: TaskStatus) -> Result<()> {
    if let Some(task) = client.tasks().set_status(id, status).await? {
        println!("{}", render::task_line(&task));
    }
    Ok(())
}

/// Description an edit keeps when none was given. The task must be loaded,
/// otherwise the edit would blank it on the service.
fn current_description(id: &str, loaded: Option<Task>) -> Result<String> {
    match loaded {
        Some(task) => Ok(task.description),
        None => bail!("No task with id {}", id),
    }
}
