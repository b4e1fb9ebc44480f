//! Password hashing utility for the catalog API
//!
//! Prints an Argon2id hash using the same parameters as the server
//! (`PASSWORD_HASH_ITERATIONS`, `PASSWORD_HASH_MEMORY_KIB`), for seeding
//! accounts by hand.
//!
//! Usage:
//!   cargo run --bin hash-password
//!   cargo run --bin hash-password "MySecurePassword123!"

use std::env;
use std::io::{self, Write};

use anyhow::{bail, Context};
use catalog_api::auth::PasswordHasher;

fn env_u32(name: &str, default: u32) -> anyhow::Result<u32> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a positive integer")),
        Err(_) => Ok(default),
    }
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let password = match env::args().nth(1) {
        Some(pwd) => pwd,
        None => {
            // Reading from stdin keeps the password out of the process list
            print!("Enter password to hash: ");
            io::stdout().flush()?;

            let mut line = String::new();
            io::stdin().read_line(&mut line)?;
            line.trim().to_string()
        }
    };

    if password.is_empty() {
        bail!("password cannot be empty");
    }
    if password.len() < 8 {
        eprintln!("Warning: password is shorter than 8 characters and will be rejected by the API");
    }

    let iterations = env_u32("PASSWORD_HASH_ITERATIONS", 3)?;
    let memory_kib = env_u32("PASSWORD_HASH_MEMORY_KIB", 19_456)?;
    let hasher = PasswordHasher::new(iterations, memory_kib)?;
    let hash = hasher.hash(&password)?;

    println!("{hash}");
    eprintln!();
    eprintln!("Store it in users.password_hash, for example:");
    eprintln!("UPDATE users SET password_hash = '{hash}' WHERE email = 'admin@example.com';");

    Ok(())
}
