use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

fn lessons_command() -> Command {
    Command::new("lessons")
        .about("Browse and manage lessons")
        .subcommand_required(true)
        .subcommand(
            Command::new("list")
                .about("List lessons")
                .arg(
                    Arg::new("grade")
                        .long("grade")
                        .help("Filter by grade, for example g2"),
                )
                .arg(Arg::new("unit").long("unit").help("Filter by unit"))
                .arg(Arg::new("search").long("search").help("Full-text filter"))
                .arg(
                    Arg::new("page")
                        .long("page")
                        .help("Page number")
                        .default_value("1")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .help("Page size")
                        .default_value("20")
                        .value_parser(clap::value_parser!(u32)),
                ),
        )
        .subcommand(
            Command::new("get").about("Show one lesson").arg(
                Arg::new("id")
                    .help("Lesson id")
                    .required(true),
            ),
        )
        .subcommand(
            Command::new("delete").about("Delete a lesson").arg(
                Arg::new("id")
                    .help("Lesson id")
                    .required(true),
            ),
        )
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("madrasa")
        .about("Madrasa learning platform client")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("Base URL of the platform API")
                .default_value("https://courses-pj.vercel.app/api")
                .env("MADRASA_API_URL")
                .global(true),
        )
        .arg(
            Arg::new("session-file")
                .long("session-file")
                .help("File holding the persisted session (unset: in-memory only)")
                .env("MADRASA_SESSION_FILE")
                .global(true),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("MADRASA_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(
            Command::new("register")
                .about("Create an account and start OTP verification")
                .arg(
                    Arg::new("name")
                        .short('n')
                        .long("name")
                        .help("Full name, at least three parts")
                        .required(true),
                )
                .arg(
                    Arg::new("email")
                        .short('e')
                        .long("email")
                        .help("Email address")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .help("Password")
                        .required(true),
                )
                .arg(Arg::new("phone").long("phone").help("Mobile number"))
                .arg(Arg::new("grade").long("grade").help("Grade, for example g2")),
        )
        .subcommand(
            Command::new("login")
                .about("Log in and store the session")
                .arg(
                    Arg::new("email")
                        .short('e')
                        .long("email")
                        .help("Email address")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .help("Password")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("verify-otp")
                .about("Confirm the OTP sent after registration")
                .arg(Arg::new("otp").help("One-time code").required(true)),
        )
        .subcommand(
            Command::new("resend-otp")
                .about("Request a fresh OTP")
                .arg(
                    Arg::new("email")
                        .short('e')
                        .long("email")
                        .help("Email address (defaults to the pending one)"),
                ),
        )
        .subcommand(
            Command::new("forgot-password")
                .about("Request a password-reset email")
                .arg(
                    Arg::new("email")
                        .short('e')
                        .long("email")
                        .help("Email address")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("reset-password")
                .about("Complete a password reset")
                .arg(
                    Arg::new("token")
                        .short('t')
                        .long("token")
                        .help("Reset token from the email (unset: reuse the stored one)"),
                )
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .help("New password")
                        .required(true),
                ),
        )
        .subcommand(Command::new("logout").about("Clear the stored session"))
        .subcommand(Command::new("whoami").about("Show the current session"))
        .subcommand(lessons_command())
}
