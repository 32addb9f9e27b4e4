// src/user_cli.rs
use crate::database::{DatabaseConfig, UserRepository};
use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Args)]
pub struct UserCli {
    #[command(subcommand)]
    pub command: UserCommand,

    #[arg(long, default_value = "data/users.db")]
    pub database_path: PathBuf,
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Add a new user
    Add {
        name: String,
        email: String,
        password: String,
    },
    /// List all users
    List,
    /// Remove a user by id
    Remove { id: i64 },
}

pub async fn handle_user_command(cli: UserCli) -> Result<()> {
    let mut db_config = DatabaseConfig::new(cli.database_path.clone());
    db_config.init_pool().await?;
    db_config.migrate().await?;

    let pool = db_config.pool()?;
    let repo = UserRepository::new(pool);

    match cli.command {
        UserCommand::Add {
            name,
            email,
            password,
        } => match repo.create(&name, &email, &password).await {
            Ok(user) => {
                info!("✅ User created successfully:");
                info!("   ID: {}", user.id);
                info!("   Name: {}", user.name);
                info!("   Email: {}", user.email);
            }
            Err(e) => {
                if e.to_string().contains("UNIQUE constraint failed") {
                    error!("❌ Email '{}' already exists", email);
                } else {
                    error!("❌ Failed to create user: {}", e);
                }
            }
        },

        UserCommand::List => {
            let users = repo.list().await?;
            if users.is_empty() {
                info!("No users registered");
            } else {
                for user in users {
                    info!("{:>4}  {} <{}>", user.id, user.name, user.email);
                }
            }
        }

        UserCommand::Remove { id } => {
            if repo.delete(id).await? {
                info!("✅ User {} removed", id);
            } else {
                error!("❌ No user with id {}", id);
            }
        }
    }

    Ok(())
}
