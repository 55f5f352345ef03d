//! CLI walkthrough over blogstore core.
//!
//! # Responsibility
//! - Open the configured store and run the sample scenario in one scope.
//! - Print query results in a stable, line-oriented format.

use blogstore_core::{
    init_logging, Address, BlogPost, DbError, Keyword, LogLevel, LoggingError, PostRepository,
    RepoError, Session, Store, StoreConfig, User, UserListQuery, UserRepository,
};
use clap::Parser;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "blogstore",
    about = "Runs the users/addresses/posts walkthrough against a SQLite store",
    version
)]
struct Cli {
    /// Store URL, e.g. `sqlite:///:memory:`, `sqlite:///blog.db` or
    /// `sqlite:////tmp/blog.db` (four slashes for an absolute path).
    /// Falls back to BLOGSTORE_DATABASE_URL, then to an in-memory store.
    #[arg(long)]
    database_url: Option<String>,

    /// Log every SQL statement at debug level.
    #[arg(long)]
    echo: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Absolute directory for rolling log files. Logging is off without it.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Print the final users as JSON instead of the walkthrough transcript.
    #[arg(long)]
    json: bool,
}

#[derive(Debug)]
enum CliError {
    Logging(LoggingError),
    Db(DbError),
    Repo(RepoError),
    Output(serde_json::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "logging: {err}"),
            Self::Db(err) => write!(f, "store: {err}"),
            Self::Repo(err) => write!(f, "query: {err}"),
            Self::Output(err) => write!(f, "output: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Output(err) => Some(err),
        }
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_run module=cli status=error error={err}");
            eprintln!("blogstore: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level: LogLevel = cli.log_level.parse()?;
        init_logging(level, log_dir)?;
    }

    let config = match cli.database_url.as_deref() {
        Some(url) => StoreConfig::from_database_url(url)?,
        None => StoreConfig::from_env()?,
    };
    let config = if cli.echo { config.with_echo(true) } else { config };

    let mut store = Store::open(&config)?;
    let json = cli.json;
    store.session_scope(|session| walkthrough(session, json))
}

fn walkthrough(session: &mut Session<'_>, json: bool) -> Result<(), CliError> {
    let users = session.users();
    let posts = session.posts();

    let mut ed = User::new("ed", "Ed Jones", "edsnickname");
    let mut jack = User::new("jack", "Jack Bean", "Jake");
    jack.set_addresses(vec![
        Address::new("jack@google.com"),
        Address::new("j25@yahoo.com"),
    ]);
    users.add_user(&mut ed)?;
    users.add_user(&mut jack)?;
    users.add_users(&mut [
        User::new("wendy", "Wendy Williams", "windy"),
        User::new("mary", "Mary Contrary", "mary"),
        User::new("fred", "Fred Flintstone", "freddy"),
    ])?;

    let fred = users.one_by_name("fred")?;
    if let Some(fred_id) = fred.id {
        users.delete_user(fred_id)?;
    }

    let author = users.one_by_name("wendy")?;
    let mut post = BlogPost::new("Wendy's Blog Post", "This is a test", &author);
    post.add_keyword(Keyword::new("wendy"));
    post.add_keyword(Keyword::new("firstpost"));
    posts.add_post(&mut post)?;

    if json {
        let everyone = users.list_users(&UserListQuery::default())?;
        println!("{}", serde_json::to_string_pretty(&everyone)?);
        return Ok(());
    }

    let by_name = UserListQuery {
        order_by_name: true,
        ..UserListQuery::default()
    };
    for user in users.list_users(&by_name)? {
        println!(
            "{} {}",
            user.name.unwrap_or_default(),
            user.fullname.unwrap_or_default()
        );
    }

    for (name, fullname) in users.names_and_fullnames()? {
        println!(
            "{} {}",
            fullname.unwrap_or_default(),
            name.unwrap_or_default()
        );
    }

    println!("filter_by()");
    print_users(&users.find_by_name("ed")?);

    println!("join on filter");
    for (user, address) in users.users_with_address_email("jack@google.com")? {
        println!("{user}");
        println!("{address}");
    }

    println!("JOIN");
    print_users(&users.users_joined_on_email("jack@google.com")?);

    println!("aliased JOIN");
    let both = users.users_with_both_emails("jack@google.com", "j25@yahoo.com")?;
    for (name, first, second) in both {
        println!("{} {first} {second}", name.unwrap_or_default());
    }

    println!("keyword any()");
    for post in posts.posts_with_keyword("firstpost")? {
        println!("{post}");
    }
    println!("{}", posts.count_posts()?);

    Ok(())
}

fn print_users(users: &[User]) {
    let rendered: Vec<String> = users.iter().map(ToString::to_string).collect();
    println!("[{}]", rendered.join(", "));
}
