use clap::Subcommand;
use serde_json::json;

use crate::auth;
use crate::cli::utils::{output_empty_collection, output_success};
use crate::cli::OutputFormat;
use crate::database::manager::DatabaseManager;
use crate::database::repository::users;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create an account")]
    Create {
        #[arg(long, help = "Email address, stored lowercased")]
        email: String,

        #[arg(long, help = "Display name")]
        name: String,

        #[arg(long, help = "Password, bcrypt-hashed before storage")]
        password: String,
    },

    #[command(about = "List accounts")]
    List,
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Create { email, name, password } => {
            let pool = DatabaseManager::pool().await?;
            let password_hash = auth::hash_password(&password)?;
            let user = users::create(&pool, &email, &password_hash, &name).await?;

            output_success(
                &output_format,
                &format!("Created account {}", user.email),
                Some(json!({ "id": user.id })),
            )
        }
        UserCommands::List => {
            let pool = DatabaseManager::pool().await?;
            let users = users::list_all(&pool).await?;

            if users.is_empty() {
                return output_empty_collection(&output_format, "users", "No accounts found");
            }

            match output_format {
                OutputFormat::Json => {
                    let users: Vec<_> = users
                        .iter()
                        .map(|user| {
                            json!({
                                "id": user.id,
                                "email": user.email,
                                "name": user.name,
                                "created_at": user.created_at,
                            })
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&json!({ "users": users }))?);
                }
                OutputFormat::Text => {
                    println!("{:<38} {:<30} {:<20} {}", "ID", "EMAIL", "NAME", "CREATED");
                    println!("{}", "-".repeat(100));

                    for user in &users {
                        let created = user.created_at.format("%Y-%m-%d %H:%M").to_string();
                        println!(
                            "{:<38} {:<30} {:<20} {}",
                            user.id, user.email, user.name, created
                        );
                    }
                }
            }

            Ok(())
        }
    }
}
