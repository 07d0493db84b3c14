use clap::{Parser, Subcommand};

/// StartupMatch: team, gig and startup matching backend
#[derive(Parser)]
#[command(name = "startupmatch", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API and relay server
    Serve {
        /// Port to bind (defaults to PORT)
        #[arg(short, long)]
        port: Option<u16>,
        /// Keep everything in process memory instead of Postgres
        #[arg(long)]
        in_memory: bool,
    },

    /// Apply database migrations and exit
    Migrate,

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Issue session tokens for development and scripting
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Review submitted content
    Moderation {
        #[command(subcommand)]
        command: ModerationCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List all users
    List,
    /// Grant admin rights
    Promote { user_id: String },
    /// Revoke admin rights
    Demote { user_id: String },
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Print a signed bearer token
    Issue {
        /// Subject (user id)
        #[arg(long)]
        sub: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        /// Lifetime in hours
        #[arg(long, default_value = "24")]
        hours: i64,
    },
}

#[derive(Subcommand)]
pub enum ModerationCommands {
    /// List items awaiting review
    Pending,
    /// Set the status of one item
    Set {
        /// team_post | project_gig | startup (URL slugs also accepted)
        kind: String,
        id: String,
        /// pending | approved | rejected
        status: String,
        /// Admin user the change is made as
        #[arg(long)]
        admin: String,
    },
}
