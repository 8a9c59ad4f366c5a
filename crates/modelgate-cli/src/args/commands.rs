use clap::Subcommand;
use modelgate_types::Operation;

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Write the default config and create the models directory and ledger")]
    Init,

    #[command(about = "Run the HTTP gateway")]
    Serve {
        #[arg(long, help = "Bind address (overrides server.host)")]
        host: Option<String>,

        #[arg(long, help = "Bind port (overrides server.port)")]
        port: Option<u16>,

        #[arg(long, help = "Load every configured model before accepting requests")]
        preload: bool,
    },

    #[command(about = "Inspect or change per-operation daily limits")]
    Limits {
        #[command(subcommand)]
        command: LimitsCommand,
    },

    #[command(about = "Show today's usage, or past daily records")]
    Usage {
        #[arg(long, value_name = "N", help = "Show the N most recent daily records")]
        history: Option<usize>,

        #[arg(long, help = "Restrict history to one operation")]
        operation: Option<Operation>,
    },

    #[command(about = "List configured models and whether their artifacts exist")]
    Models,
}

#[derive(Subcommand)]
pub enum LimitsCommand {
    #[command(about = "Show the daily limit and caps of every operation")]
    Show,

    #[command(about = "Set an operation's daily limit (0 = unlimited)")]
    Set {
        operation: Operation,
        limit: u64,
    },
}
