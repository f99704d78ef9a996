//! critpath binary entry point.

// CLI binary needs to output to stdout/stderr
#![allow(clippy::print_stdout, clippy::print_stderr)]

use critpath::cli::{
    self, EXIT_CLI, EXIT_OK, exit_code_for, format_check, format_report, render_error, render_ok,
};
use critpath::logging::{TracingConfig, init_tracing};
use critpath::{Settings, check, run};

fn main() {
    // Tracing may be unusable during a panic, so report it directly.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    let tracing_config = TracingConfig {
        format: cli.log_format,
        level: cli.level.into(),
        ..Default::default()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("Failed to initialize tracing: {e}");
        std::process::exit(EXIT_CLI);
    }

    let result = Settings::resolve(&cli).and_then(|settings| {
        if cli.check {
            check(&settings).map(|summary| render_ok(&summary, &format_check(&summary), cli.json))
        } else {
            run(&settings).map(|report| render_ok(&report, &format_report(&report), cli.json))
        }
    });

    let exit_code = match result {
        Ok(()) => EXIT_OK,
        Err(err) => {
            render_error(&err, cli.json);
            exit_code_for(&err)
        }
    };

    std::process::exit(exit_code);
}
