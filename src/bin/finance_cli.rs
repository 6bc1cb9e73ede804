use std::io::{self, BufRead, Write};
use std::sync::Arc;

use authflow::auth::{AuthService, InMemoryCredentialStore};
use authflow::configuration::get_configuration;
use authflow::error::AuthError;
use authflow::quotes::{QuoteClient, DEFAULT_SYMBOLS};
use authflow::telemetry::init_telemetry_with;

const MAX_ATTEMPTS: u32 = 3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 사용자 출력은 stdout, 로그는 stderr 로 분리합니다.
    init_telemetry_with("warn", std::io::stderr);

    let configuration = get_configuration()?;
    let token_settings = configuration.auth.token_settings()?;
    let store = InMemoryCredentialStore::from_settings(&configuration.credentials)?;
    let auth = AuthService::new(Arc::new(store), &token_settings);

    println!("--- OAuth Finance CLI ---");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    for attempt in 1..=MAX_ATTEMPTS {
        print!("Enter your access token (or 'exit'): ");
        io::stdout().flush()?;

        let token = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let token = token.trim();
        if token.eq_ignore_ascii_case("exit") {
            break;
        }

        match auth.resolve_identity(token) {
            Ok(user) => {
                println!("Access granted! Welcome, {}.", user.username);
                println!("Fetching stock prices...");

                let symbols: Vec<String> = DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect();
                let client = QuoteClient::new()?;
                for quote in client.fetch_all(&symbols).await {
                    let price = quote
                        .price
                        .map(|p| format!("{:.2}", p))
                        .unwrap_or_else(|| "None".to_string());
                    println!("Symbol: {:<6} | Price: {}", quote.symbol, price);
                }
                return Ok(());
            }
            Err(e) => {
                if e == AuthError::AccountInactive {
                    println!(
                        "Access denied! Account is inactive. Attempt {}/{}.",
                        attempt, MAX_ATTEMPTS
                    );
                } else {
                    println!("Access denied! Attempt {}/{}.", attempt, MAX_ATTEMPTS);
                }
                if attempt == MAX_ATTEMPTS {
                    println!("Maximum attempts reached.");
                }
            }
        }
    }

    Ok(())
}
