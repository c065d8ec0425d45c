use crate::cli::actions::{Action, LessonsAction};
use anyhow::{Context, Result};

fn required(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .map(String::to_string)
        .with_context(|| format!("missing required argument: --{name}"))
}

fn optional(matches: &clap::ArgMatches, name: &str) -> Option<String> {
    matches.get_one::<String>(name).map(String::to_string)
}

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let (name, sub) = matches.subcommand().context("missing subcommand")?;

    match name {
        "register" => Ok(Action::Register {
            name: required(sub, "name")?,
            email: required(sub, "email")?,
            password: required(sub, "password")?,
            phone: optional(sub, "phone"),
            grade: optional(sub, "grade"),
        }),
        "login" => Ok(Action::Login {
            email: required(sub, "email")?,
            password: required(sub, "password")?,
        }),
        "verify-otp" => Ok(Action::VerifyOtp {
            otp: required(sub, "otp")?,
        }),
        "resend-otp" => Ok(Action::ResendOtp {
            email: optional(sub, "email"),
        }),
        "forgot-password" => Ok(Action::ForgotPassword {
            email: required(sub, "email")?,
        }),
        "reset-password" => Ok(Action::ResetPassword {
            token: optional(sub, "token"),
            password: required(sub, "password")?,
        }),
        "logout" => Ok(Action::Logout),
        "whoami" => Ok(Action::Whoami),
        "lessons" => {
            let (name, sub) = sub.subcommand().context("missing lessons subcommand")?;
            match name {
                "list" => Ok(Action::Lessons(LessonsAction::List {
                    grade: optional(sub, "grade"),
                    unit: optional(sub, "unit"),
                    search: optional(sub, "search"),
                    page: sub.get_one::<u32>("page").copied().unwrap_or(1),
                    limit: sub.get_one::<u32>("limit").copied().unwrap_or(20),
                })),
                "get" => Ok(Action::Lessons(LessonsAction::Get {
                    id: required(sub, "id")?,
                })),
                "delete" => Ok(Action::Lessons(LessonsAction::Delete {
                    id: required(sub, "id")?,
                })),
                unknown => anyhow::bail!("unknown lessons subcommand: {unknown}"),
            }
        }
        unknown => anyhow::bail!("unknown subcommand: {unknown}"),
    }
}
