use std::process;
use user_api::bootstrap::{self, BootstrapError, SeedOutcome};
use user_api::config::Config;

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            let err = BootstrapError::Config(err);
            eprintln!("[init] {err}");
            process::exit(err.exit_code());
        }
    };

    println!("[init] Backend: {}", config.database.backend());
    println!("[init] Database: {}", config.database.display_target());

    match bootstrap::run(&config).await {
        Ok(done) => {
            println!("[init] Database schema initialised successfully.");
            match done.seed {
                SeedOutcome::Created(user) => println!(
                    "[init] Seeded '{}' account (id {}); rotate its password immediately.",
                    user.login, user.id
                ),
                SeedOutcome::UsersPresent => {
                    println!("[init] Users already present; no account seeded.")
                }
            }
        }
        Err(err) => {
            eprintln!("[init] {err}");
            process::exit(err.exit_code());
        }
    }
}
