//! Interactive credential prompt and one-shot validation.

use std::io::{self, Write};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use sandmirror_api::{ApiError, HttpMapApi};

use crate::error::CliError;

/// Outcome of the credential prompt.
pub enum AuthOutcome {
    /// Credentials validated against the sandbox; the handle carries them.
    Authenticated(HttpMapApi),
    /// The operator left the login empty to back out.
    Declined,
}

/// Prompt for sandbox credentials until they validate or the operator backs
/// out with an empty login.
///
/// Each attempt is probed against the sandbox user-details call; an HTTP
/// rejection means a typo and re-prompts, anything else (network down, bad
/// endpoint) propagates.
pub fn read_auth(sandbox_url: &str) -> Result<AuthOutcome, CliError> {
    loop {
        let login = prompt_line("Login: ")?;
        if login.is_empty() {
            println!("Okay");
            return Ok(AuthOutcome::Declined);
        }
        let password = rpassword::prompt_password("Password: ").map_err(CliError::Prompt)?;
        let api = HttpMapApi::new(sandbox_url)?.with_auth(basic_auth_header(&login, &password));
        match api.user_details() {
            Ok(()) => return Ok(AuthOutcome::Authenticated(api)),
            Err(ApiError::Http { .. }) => {
                println!("You must have mistyped. Please try again.");
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn prompt_line(prompt: &str) -> Result<String, CliError> {
    print!("{prompt}");
    io::stdout().flush().map_err(CliError::Prompt)?;
    let mut line = String::new();
    io::stdin().read_line(&mut line).map_err(CliError::Prompt)?;
    Ok(line.trim().to_owned())
}

fn basic_auth_header(login: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{login}:{password}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_matches_the_rfc_sample() {
        assert_eq!(
            basic_auth_header("Aladdin", "open sesame"),
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
    }
}
