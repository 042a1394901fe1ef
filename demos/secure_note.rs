//! Secure note example.
//!
//! Stores a note, reads it back and shows how failures are reported.
//!
//! Run with: cargo run --example secure_note -- <item-name> [note text]
//!
//! Settings come from the environment:
//! - OP_ACCOUNT: account shorthand (default: from ~/.op/config)
//! - OP_PASSWORD: password piped to `op signin` (default: prompt)
//! - OP_SIGNIN_URL, OP_EMAIL, OP_SECRET_KEY: sign in without ~/.op/config

use opsession::{Op, OpError, Settings};

#[tokio::main]
async fn main() -> opsession::Result<()> {
    let mut args = std::env::args().skip(1);
    let item = args.next().unwrap_or_else(|| "opsession-demo".to_string());
    let text = args.next();

    let op = match Op::new(Settings::from_env()).await {
        Ok(op) => op,
        Err(e @ OpError::ConfigMissing(_)) => {
            eprintln!("{}", e);
            eprintln!(
                "Set OP_ACCOUNT, OP_SIGNIN_URL, OP_EMAIL and OP_SECRET_KEY to sign in without it."
            );
            return Err(e);
        }
        Err(e) => return Err(e),
    };
    println!("Signed in to {} ({})", op.account(), op.env_var());

    if let Some(text) = text {
        op.set_secure_note(&item, &text).await?;
        println!("Stored '{}'", item);
    }

    match op.get_secure_note(&item).await {
        Ok(note) => println!("{}:\n{}", item, note),
        Err(e) if e.is_not_found() => println!("'{}' does not exist yet", item),
        Err(e) if e.is_session_expired() => {
            eprintln!("Session expired: unset {} and run again", op.env_var());
            return Err(e);
        }
        Err(e) => return Err(e),
    }

    Ok(())
}
