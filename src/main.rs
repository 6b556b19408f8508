use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use chatgate::auth::{AuthFlow, Notice, Phase};
use chatgate::config::ClientConfig;
use chatgate::dialog::{ChatSession, Role};
use chatgate::gateway::{AccountGateway, DialogGateway};

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let config = ClientConfig::from_env().unwrap_or_else(|_| ClientConfig::default());

    eprintln!("💬 chatgate v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.base_url);
    eprintln!("   /signup, /forgot, /cancel during login; /logout, /quit in chat.\n");

    let mut flow = AuthFlow::new(AccountGateway::new(&config)?);
    let mut session = ChatSession::new(DialogGateway::new(&config)?);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let Some(identity) = run_auth(&mut flow, &mut lines).await? else {
            break;
        };
        session.open(&identity).await;
        let mut rendered = render_from(&session, 0);

        let keep_running = loop {
            let Some(input) = prompt("you", &mut lines).await? else {
                session.close(|| {}).await;
                break false;
            };
            match input.as_str() {
                "" => continue,
                "/quit" => {
                    session.close(|| eprintln!("Logged out.")).await;
                    break false;
                }
                "/logout" => {
                    session.close(|| eprintln!("Logged out.")).await;
                    break true;
                }
                _ => {}
            }

            // A bare number picks the matching pending button
            let chosen = input
                .parse::<usize>()
                .ok()
                .and_then(|n| session.buttons().get(n.checked_sub(1)?))
                .map(|b| b.value.clone());
            match chosen {
                Some(value) => session.submit_choice(&value).await,
                None => session.submit_text(&input).await,
            }
            rendered = render_from(&session, rendered);
        };
        if !keep_running {
            break;
        }
    }
    Ok(())
}

/// Drive the credential workflow until a login succeeds. `None` means the
/// user quit or stdin closed.
async fn run_auth(flow: &mut AuthFlow<AccountGateway>, lines: &mut Input) -> Result<Option<String>> {
    loop {
        if let Some(notice) = flow.notice() {
            match notice {
                Notice::Success(msg) => eprintln!("✅ {msg}"),
                Notice::Error(msg) => eprintln!("❌ {msg}"),
            }
            flow.dismiss_notice();
        }

        match flow.phase() {
            Phase::Login => {
                let Some(email) = prompt("email", lines).await? else {
                    return Ok(None);
                };
                match email.as_str() {
                    "" => continue,
                    "/quit" => return Ok(None),
                    "/signup" => {
                        flow.start_signup();
                        continue;
                    }
                    "/forgot" => {
                        flow.start_forgot();
                        continue;
                    }
                    _ => {}
                }
                flow.fields_mut().email = email;
                let Some(password) = prompt("password", lines).await? else {
                    return Ok(None);
                };
                flow.fields_mut().password = password;
                if let Some(identity) = flow.submit().await {
                    return Ok(Some(identity));
                }
            }
            Phase::SignupInitial | Phase::ForgotInitial => {
                let signup = flow.phase() == Phase::SignupInitial;
                let Some(email) = prompt("email", lines).await? else {
                    return Ok(None);
                };
                if email == "/cancel" {
                    flow.cancel();
                    continue;
                }
                flow.fields_mut().email = email;
                if signup {
                    let Some(name) = prompt("name", lines).await? else {
                        return Ok(None);
                    };
                    flow.fields_mut().name = name;
                }
                let Some(password) = prompt("new password", lines).await? else {
                    return Ok(None);
                };
                flow.fields_mut().password = password;
                let Some(confirm) = prompt("confirm password", lines).await? else {
                    return Ok(None);
                };
                flow.fields_mut().confirm_password = confirm;
                flow.submit().await;
            }
            Phase::SignupAwaitingOtp | Phase::ForgotAwaitingOtp => {
                let Some(otp) = prompt("OTP code", lines).await? else {
                    return Ok(None);
                };
                if otp == "/cancel" {
                    flow.cancel();
                    continue;
                }
                flow.fields_mut().otp = otp;
                flow.submit().await;
            }
        }
    }
}

async fn prompt(label: &str, lines: &mut Input) -> Result<Option<String>> {
    eprint!("{label}> ");
    Ok(lines.next_line().await?.map(|line| line.trim().to_string()))
}

/// Print transcript entries from `from` on, plus the pending buttons.
/// Returns the new rendered count.
fn render_from(session: &ChatSession<DialogGateway>, from: usize) -> usize {
    for message in &session.transcript()[from..] {
        // The user's own text was just typed; only echo the model side
        if message.role == Role::Model {
            println!("bot: {}", message.text);
        }
    }
    for (i, button) in session.buttons().iter().enumerate() {
        println!("  [{}] {}", i + 1, button.label);
    }
    session.transcript().len()
}
