//! Interactive session: one command per line, auth state kept for the lifetime
//! of the shell. On a terminal passwords are read without echo; piped input
//! supplies them on the line after the command.

use crate::{
    auth::{AuthController, AuthError, AuthSnapshot},
    catalog::{BookApi, HttpBookApi},
    cli::actions::{catalog, interrupt::Interrupts, recommend},
    config::AppConfig,
    display,
    identity::{CognitoClient, IdentityProvider},
};
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Password};
use secrecy::{ExposeSecret, SecretString};
use std::io::{IsTerminal, Write};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines},
    sync::watch,
    task::JoinHandle,
};
use tracing::info;

const HELP: &str = "\
Commands:
  signup <email> <name>    create an account (password asked next, twice)
  confirm <code>           confirm the pending signup with the emailed code
  login <email>            sign in (password asked next)
  logout                   sign out
  whoami                   show the current session
  book <id>                show one book
  books                    list the catalogue
  recommend <query>        recommend books for a free-text query (Ctrl-C cancels)
  examples                 show example queries
  help                     this text
  quit                     leave the shell (or Ctrl-C at the prompt)";

const PASSWORD_MISMATCH: &str = "Passwords do not match";

#[derive(Debug)]
pub struct Args {
    pub config: AppConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShellCommand {
    Empty,
    Signup { email: String, name: String },
    Confirm { code: String },
    Login { email: String },
    Logout,
    Whoami,
    Book { id: String },
    Books,
    Recommend { query: String },
    Examples,
    Help,
    Quit,
}

/// Where passwords come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PasswordInput {
    /// Hidden prompt on the controlling terminal.
    Terminal,
    /// The next input line(s), for piped input.
    Lines,
}

enum PasswordRead {
    Entered(SecretString),
    Mismatch,
    Closed,
}

/// Parses one input line. The error is a usage message for the user.
pub fn parse_line(line: &str) -> Result<ShellCommand, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(ShellCommand::Empty);
    };
    let rest: Vec<&str> = words.collect();

    match (command.to_lowercase().as_str(), rest.as_slice()) {
        ("signup", [email, name @ ..]) if !name.is_empty() => Ok(ShellCommand::Signup {
            email: (*email).to_string(),
            name: name.join(" "),
        }),
        ("signup", _) => Err("usage: signup <email> <name>".to_string()),
        ("confirm", [code]) => Ok(ShellCommand::Confirm {
            code: (*code).to_string(),
        }),
        ("confirm", _) => Err("usage: confirm <code>".to_string()),
        ("login", [email]) => Ok(ShellCommand::Login {
            email: (*email).to_string(),
        }),
        ("login", _) => Err("usage: login <email>".to_string()),
        ("logout", []) => Ok(ShellCommand::Logout),
        ("whoami", []) => Ok(ShellCommand::Whoami),
        ("book", [id]) => Ok(ShellCommand::Book {
            id: (*id).to_string(),
        }),
        ("book", _) => Err("usage: book <id>".to_string()),
        ("books", []) => Ok(ShellCommand::Books),
        // blank queries are rejected by the recommendation flow itself
        ("recommend", query) => Ok(ShellCommand::Recommend {
            query: query.join(" "),
        }),
        ("examples", []) => Ok(ShellCommand::Examples),
        ("help" | "?", _) => Ok(ShellCommand::Help),
        ("quit" | "exit", _) => Ok(ShellCommand::Quit),
        (other, _) => Err(format!("unknown command: {other} (try `help`)")),
    }
}

/// Run the shell on stdin until `quit`, Ctrl-C at the prompt or end of input.
///
/// # Errors
/// Returns an error if the clients cannot be built or stdin fails.
pub async fn execute(args: Args) -> Result<()> {
    let provider = CognitoClient::new(&args.config)?;
    let api = HttpBookApi::new(&args.config)?;
    let controller = AuthController::new(provider);

    let watcher = watch_phase(controller.subscribe());
    controller.initialize().await;

    let passwords = if std::io::stdin().is_terminal() {
        PasswordInput::Terminal
    } else {
        PasswordInput::Lines
    };
    let mut shell = Shell {
        controller: &controller,
        api: &api,
        passwords,
        interrupts: Interrupts::listen(),
    };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let result = shell.run(&mut lines, &mut std::io::stdout()).await;

    watcher.abort();
    result
}

struct Shell<'a, P, A> {
    controller: &'a AuthController<P>,
    api: &'a A,
    passwords: PasswordInput,
    interrupts: Interrupts,
}

impl<P: IdentityProvider, A: BookApi> Shell<'_, P, A> {
    async fn run<R, W>(&mut self, lines: &mut Lines<R>, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        writeln!(out, "Type `help` for the list of commands.")?;

        loop {
            let phase = self.controller.snapshot().phase();
            write!(out, "libris ({})> ", display::phase_label(phase))?;
            out.flush()?;

            self.interrupts.clear();
            let line = tokio::select! {
                line = lines.next_line() => line?,
                () = self.interrupts.next() => {
                    writeln!(out)?;
                    None
                }
            };
            let Some(line) = line else {
                break;
            };

            let command = match parse_line(&line) {
                Ok(command) => command,
                Err(usage) => {
                    writeln!(out, "{usage}")?;
                    continue;
                }
            };

            if !self.handle(command, lines, out).await? {
                break;
            }
        }

        Ok(())
    }

    /// Runs one command. `false` ends the session.
    async fn handle<R, W>(
        &mut self,
        command: ShellCommand,
        lines: &mut Lines<R>,
        out: &mut W,
    ) -> Result<bool>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let controller = self.controller;
        match command {
            ShellCommand::Empty => {}
            ShellCommand::Quit => return Ok(false),
            ShellCommand::Help => writeln!(out, "{HELP}")?,
            ShellCommand::Examples => recommend::print_examples(out)?,
            ShellCommand::Whoami => {
                writeln!(out, "{}", display::session_summary(&controller.snapshot()))?;
            }
            ShellCommand::Signup { email, name } => {
                let password = match read_password(self.passwords, lines, out, true).await? {
                    PasswordRead::Entered(password) => password,
                    PasswordRead::Mismatch => {
                        writeln!(out, "{PASSWORD_MISMATCH}")?;
                        return Ok(true);
                    }
                    PasswordRead::Closed => return Ok(false),
                };
                match controller.signup(&email, &password, &name).await {
                    Ok(()) if controller.snapshot().needs_confirmation() => {
                        writeln!(out, "Check your email: a verification code was sent to {email}")?;
                    }
                    Ok(()) => writeln!(out, "Account created. Log in with `login {email}`.")?,
                    Err(err) => writeln!(out, "{}", auth_failure("Signup", &err))?,
                }
            }
            ShellCommand::Confirm { code } => match controller.confirm_account(&code).await {
                Ok(()) => writeln!(out, "Account confirmed. Log in to continue.")?,
                Err(err) => writeln!(out, "{}", auth_failure("Confirmation", &err))?,
            },
            ShellCommand::Login { email } => {
                let PasswordRead::Entered(password) =
                    read_password(self.passwords, lines, out, false).await?
                else {
                    return Ok(false);
                };
                match controller.login(&email, &password).await {
                    Ok(()) => writeln!(out, "{}", login_message(&controller.snapshot()))?,
                    Err(err) => writeln!(out, "{}", auth_failure("Login", &err))?,
                }
            }
            ShellCommand::Logout => match controller.logout().await {
                Ok(()) => writeln!(out, "Signed out")?,
                Err(err) => writeln!(out, "{}", auth_failure("Logout", &err))?,
            },
            ShellCommand::Book { id } => {
                let result = catalog::print_book(self.api, &id, out).await;
                report(out, result)?;
            }
            ShellCommand::Books => {
                let result = catalog::print_books(self.api, out).await;
                report(out, result)?;
            }
            ShellCommand::Recommend { query } => {
                let result =
                    recommend::print_recommendations(self.api, &query, &self.interrupts, out).await;
                report(out, result)?;
            }
        }
        Ok(true)
    }
}

fn login_message(snapshot: &AuthSnapshot) -> String {
    match &snapshot.session {
        Some(session) if snapshot.is_authenticated() => {
            format!("Signed in as {} <{}>", session.name, session.email)
        }
        _ => "Sign-in needs an additional step that this client does not support".to_string(),
    }
}

fn auth_failure(action: &str, err: &AuthError) -> String {
    let hint = match err {
        AuthError::Provider(source) => match source.identity_code() {
            Some("UserNotConfirmedException") => " (confirm the account with `confirm <code>`)",
            Some("UsernameExistsException") => " (try `login <email>`)",
            _ => "",
        },
        AuthError::NoPendingEmail => " (sign up first)",
    };
    format!("{action} failed: {err}{hint}")
}

/// Prints a command failure; the session carries on.
fn report<W: Write>(out: &mut W, result: Result<()>) -> Result<()> {
    if let Err(err) = result {
        writeln!(out, "Error: {err}")?;
    }
    Ok(())
}

/// Reads a password, twice when `confirm` is set.
async fn read_password<R, W>(
    input: PasswordInput,
    lines: &mut Lines<R>,
    out: &mut W,
    confirm: bool,
) -> Result<PasswordRead>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    match input {
        PasswordInput::Terminal => {
            // dialoguer re-prompts on a mismatch
            let password = tokio::task::spawn_blocking(move || {
                let theme = ColorfulTheme::default();
                let mut prompt = Password::with_theme(&theme).with_prompt("Password");
                if confirm {
                    prompt = prompt.with_confirmation("Repeat password", PASSWORD_MISMATCH);
                }
                prompt.interact()
            })
            .await??;
            Ok(PasswordRead::Entered(SecretString::from(password)))
        }
        PasswordInput::Lines => {
            let Some(password) = next_secret(lines, out, "password: ").await? else {
                return Ok(PasswordRead::Closed);
            };
            if !confirm {
                return Ok(PasswordRead::Entered(password));
            }
            let Some(repeated) = next_secret(lines, out, "repeat password: ").await? else {
                return Ok(PasswordRead::Closed);
            };
            if password.expose_secret() == repeated.expose_secret() {
                Ok(PasswordRead::Entered(password))
            } else {
                Ok(PasswordRead::Mismatch)
            }
        }
    }
}

async fn next_secret<R, W>(
    lines: &mut Lines<R>,
    out: &mut W,
    label: &str,
) -> Result<Option<SecretString>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(out, "{label}")?;
    out.flush()?;
    Ok(lines.next_line().await?.map(SecretString::from))
}

/// Logs every auth phase transition until the controller goes away.
fn watch_phase(mut receiver: watch::Receiver<AuthSnapshot>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last = receiver.borrow_and_update().phase();
        while receiver.changed().await.is_ok() {
            let phase = receiver.borrow_and_update().phase();
            if phase != last {
                info!("auth phase: {:?} -> {:?}", last, phase);
                last = phase;
            }
        }
    })
}
