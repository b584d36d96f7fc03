//! # docsync-cli
//!
//! One-shot commands against a document store, printing JSON to stdout.
//!
//! Credentials come from the `DOCSYNC_*` environment variables and can be
//! overridden with flags:
//!
//! ```bash
//! export DOCSYNC_APPLICATION_ID=... DOCSYNC_API_KEY=...
//! docsync save GameScore '{"score": 1337, "playerName": "Sean Plott"}'
//! docsync get GameScore Ed1nuqPvcm --include
//! docsync query GameScore --where '{"score": {"$gte": 1000}}' --order -score --limit 5
//! docsync login cooldude6 'p_n7!-e8'
//! ```

pub mod commands;

use clap::{Parser, Subcommand};
use docsync::ClientConfig;

/// docsync - talk to a REST document store
#[derive(Parser, Debug)]
#[command(name = "docsync")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Server base URL
    #[arg(global = true, long)]
    pub server_url: Option<String>,

    /// Application id
    #[arg(global = true, long)]
    pub app_id: Option<String>,

    /// REST API key
    #[arg(global = true, long)]
    pub api_key: Option<String>,

    /// Session token to send with the request
    #[arg(global = true, long)]
    pub session_token: Option<String>,

    /// Log requests
    #[arg(global = true, short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Read one object
    Get {
        class: String,
        object_id: String,

        /// Expand pointer fields
        #[arg(short, long)]
        include: bool,
    },

    /// Create an object, or update it when --id is given
    Save {
        class: String,

        /// Attributes as a JSON object
        data: String,

        #[arg(long)]
        id: Option<String>,
    },

    /// Delete one object
    Delete { class: String, object_id: String },

    /// Run a query
    Query {
        class: String,

        /// Filter document as JSON
        #[arg(short = 'w', long = "where")]
        filter: Option<String>,

        #[arg(short, long)]
        limit: Option<u32>,

        #[arg(short, long)]
        skip: Option<u32>,

        /// Sort keys, e.g. `-score,name`
        #[arg(short, long, allow_hyphen_values = true)]
        order: Option<String>,

        /// Fields to return, comma-separated
        #[arg(short, long)]
        keys: Option<String>,

        /// Pointer fields to expand, comma-separated
        #[arg(long)]
        include: Option<String>,

        /// Only count matches
        #[arg(short, long)]
        count: bool,
    },

    /// Log in and print the user with its session token
    Login {
        username: String,
        password: String,

        /// Ask for a revocable session
        #[arg(long)]
        revocable: bool,
    },

    /// Create a user
    Signup {
        username: String,
        password: String,

        #[arg(long)]
        email: Option<String>,
    },

    /// Print the user a session token belongs to
    Whoami { token: String },

    /// Send a password reset email
    ResetPassword { email: String },
}

impl Args {
    /// Environment settings with flag overrides applied.
    pub fn config(&self) -> docsync::Result<ClientConfig> {
        self.apply(ClientConfig::from_env())
    }

    fn apply(&self, base: docsync::Result<ClientConfig>) -> docsync::Result<ClientConfig> {
        let mut config = match (base, &self.app_id, &self.api_key) {
            (Ok(config), _, _) => config,
            (Err(_), Some(app_id), Some(api_key)) => ClientConfig::new(app_id, api_key),
            (Err(e), _, _) => return Err(e),
        };
        if let Some(app_id) = &self.app_id {
            config.application_id = app_id.clone();
        }
        if let Some(api_key) = &self.api_key {
            config.api_key = api_key.clone();
        }
        if let Some(server_url) = &self.server_url {
            config.server_url = server_url.clone();
        }
        if let Command::Login {
            revocable: true, ..
        } = self.command
        {
            config.revocable_sessions = true;
        }
        Ok(config)
    }
}
