use FabStoich::cli::cli_main::run_interactive_menu;
use log::LevelFilter;
use simplelog::{ColorChoice, Config, SimpleLogger, TermLogger, TerminalMode};

pub fn main() {
    if TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .is_err()
    {
        let _ = SimpleLogger::init(LevelFilter::Info, Config::default());
    }
    run_interactive_menu();
}
