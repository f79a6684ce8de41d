//! Generate a session JWT for calling the API directly
//!
//! Usage:
//!   cargo run --example generate_token -- --secret "your-secret-key" --user-id 2 --username employee1

use chrono::Duration;
use clap::Parser;
use orderdesk_auth::{JwtClaims, JwtValidator};

#[derive(Parser, Debug)]
#[command(name = "generate_token")]
#[command(about = "Generate a session token for the ordering API", long_about = None)]
struct Args {
    /// JWT secret (must match the server's secret)
    #[arg(long, env = "ORDERDESK_JWT_SECRET")]
    secret: String,

    /// Numeric id of the user the token is issued for
    #[arg(long)]
    user_id: i32,

    /// Username of that user
    #[arg(long)]
    username: String,

    /// Token validity in hours (default: 24)
    #[arg(long, default_value = "24")]
    hours: i64,
}

fn main() {
    let args = Args::parse();

    let claims = JwtClaims::session(args.user_id, &args.username, Duration::hours(args.hours));

    match JwtValidator::encode(args.secret.as_bytes(), &claims) {
        Ok(token) => {
            println!("User:      {} (id {})", args.username, args.user_id);
            println!("Valid for: {} hours", args.hours);
            println!("\nToken:\n{}\n", token);
            println!("Usage:");
            println!(
                "  curl -H \"Authorization: Bearer {}\" http://127.0.0.1:8080/api/orders",
                token
            );
        }
        Err(e) => {
            eprintln!("Failed to generate token: {}", e);
            std::process::exit(1);
        }
    }
}
