use clap::Parser;
use gerrymander_cli::{Cli, run};

fn main() {
    // Reset SIGPIPE to default behavior so that piping into `head` ends
    // the process quietly instead of failing on a broken pipe.
    #[cfg(unix)]
    reset_sigpipe();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(unix)]
fn reset_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}
