use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sprig::areas::repository::Repository;
use sprig::artifacts::objects::commit::Author;
use sprig::commands::plumbing::cat_file::CatFileMode;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sprig",
    version,
    about = "A minimal Git-compatible storage engine",
    long_about = "Stores content-addressed objects, maintains the binary staging index and \
    records commits on the current branch, all in Git's own on-disk formats.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Log filter for diagnostics on stderr (overrides RUST_LOG)"
    )]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
    },
    #[command(
        name = "add",
        about = "Add file contents to the index",
        long_about = "This command stores the content of the given files as blobs and stages them. \
        Directories are expanded to every file beneath them."
    )]
    Add {
        #[arg(index = 1, required = true, help = "The files or directories to stage")]
        paths: Vec<PathBuf>,
    },
    #[command(
        name = "commit",
        about = "Create a new commit with the specified message",
        long_about = "This command records the staged snapshot as a new commit on the current branch."
    )]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
        #[arg(long, env = "GIT_AUTHOR_NAME", help = "The author name")]
        author_name: String,
        #[arg(long, env = "GIT_AUTHOR_EMAIL", help = "The author email")]
        author_email: String,
        #[arg(
            long,
            env = "GIT_AUTHOR_DATE",
            help = "The author date (RFC 2822 or '%Y-%m-%d %H:%M:%S %z'), defaults to now"
        )]
        date: Option<String>,
    },
    #[command(
        name = "status",
        about = "Show the working tree status",
        long_about = "This command lists modified, deleted and untracked files in the short format."
    )]
    Status,
    #[command(
        name = "cat-file",
        about = "Print the content of an object",
        long_about = "This command prints the content, type or size of an object in the repository. \
        The object may be given as HEAD, a branch name or a (possibly abbreviated) object id."
    )]
    CatFile {
        #[arg(short = 'p', group = "mode", help = "Pretty-print the object content")]
        pretty: bool,
        #[arg(short = 't', group = "mode", help = "Print the object type")]
        show_type: bool,
        #[arg(short = 's', group = "mode", help = "Print the object size")]
        size: bool,
        #[arg(index = 1, help = "The object to print")]
        object: String,
    },
    #[command(
        name = "hash-object",
        about = "Hash an object and optionally write it to the object database",
        long_about = "This command hashes a file as a blob and can write it to the object database. \
        It requires the path to the file to be specified."
    )]
    HashObject {
        #[arg(short, long, help = "Write the object to the object database")]
        write: bool,
        #[arg(index = 1)]
        file: PathBuf,
    },
    #[command(
        name = "write-tree",
        about = "Create tree objects from the current index",
        long_about = "This command stores one tree per directory in the index and prints the root tree id."
    )]
    WriteTree,
    #[command(
        name = "ls-files",
        about = "Show the files in the index",
        long_about = "This command lists the staged paths in index order."
    )]
    LsFiles {
        #[arg(short, long, help = "Show mode and object id for each entry")]
        stage: bool,
    },
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_author(name: String, email: String, date: Option<&str>) -> Result<Author> {
    match date {
        Some(date) => {
            let timestamp = Author::parse_date(date)
                .with_context(|| format!("invalid author date '{date}'"))?;
            Ok(Author::new_with_timestamp(name, email, timestamp))
        }
        None => Ok(Author::new(name, email)),
    }
}

/// Open the repository containing `pwd`, searching parent directories
fn open_repository(pwd: &Path) -> Result<Repository> {
    let root = Repository::find_root(pwd).with_context(|| {
        format!(
            "not a repository (or any of the parent directories): {}",
            pwd.display()
        )
    })?;

    Ok(Repository::new(root, Box::new(std::io::stdout()))?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let pwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { path } => {
            let repository = Repository::new(path.unwrap_or(pwd), Box::new(std::io::stdout()))?;
            repository.init()?
        }
        Commands::Add { paths } => {
            let repository = open_repository(&pwd)?;
            let paths = paths.iter().map(|path| pwd.join(path)).collect::<Vec<_>>();
            repository.add(&paths).await?
        }
        Commands::Commit {
            message,
            author_name,
            author_email,
            date,
        } => {
            let repository = open_repository(&pwd)?;
            let author = load_author(author_name, author_email, date.as_deref())?;
            repository.commit(&message, author)?
        }
        Commands::Status => {
            let repository = open_repository(&pwd)?;
            repository.status()?
        }
        Commands::CatFile {
            pretty: _,
            show_type,
            size,
            object,
        } => {
            let repository = open_repository(&pwd)?;
            let mode = match (show_type, size) {
                (true, _) => CatFileMode::Type,
                (_, true) => CatFileMode::Size,
                _ => CatFileMode::Pretty,
            };
            repository.cat_file(&object, mode)?
        }
        Commands::HashObject { write, file } => {
            let root = Repository::find_root(&pwd).unwrap_or_else(|| pwd.clone());
            let repository = Repository::new(root, Box::new(std::io::stdout()))?;
            repository.hash_object(&pwd.join(file), write)?
        }
        Commands::WriteTree => {
            let repository = open_repository(&pwd)?;
            let tree_oid = repository.write_tree()?;
            writeln!(repository.writer(), "{tree_oid}")?
        }
        Commands::LsFiles { stage } => {
            let repository = open_repository(&pwd)?;
            repository.ls_files(stage)?
        }
    }

    Ok(())
}
