// twig-ast: Twig template syntax tree explorer

use std::fs;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use twig_ast::print::Printer;
use twig_ast::ui::App;
use twig_ast::{parse_with_options, ParseOptions};

#[derive(Parser)]
#[command(name = "twig-ast")]
#[command(about = "Parse a Twig template and explore its syntax tree")]
struct Args {
    /// Template file to parse
    file: PathBuf,

    /// Print the tree as JSON
    #[arg(long, conflicts_with = "print")]
    json: bool,

    /// Print the tree as an indented outline
    #[arg(long)]
    print: bool,

    /// Record syntax errors on the tree instead of failing
    #[arg(long)]
    tolerant: bool,

    /// JSON file with parse options, e.g. {"throwSyntaxErrors": false}
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut options = match &args.config {
        Some(path) => ParseOptions::from_json(&fs::read_to_string(path)?)?,
        None => ParseOptions::default(),
    };
    if args.tolerant {
        options = options.throw_syntax_errors(false);
    }

    let source = fs::read_to_string(&args.file)?;
    tracing::debug!("parsing {} ({} bytes)", args.file.display(), source.len());

    let tree = match parse_with_options(&source, options) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("{}: {}", args.file.display(), e);
            std::process::exit(1);
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tree)?);
        return Ok(());
    }

    if args.print {
        let color = !args.no_color && io::stdout().is_terminal();
        print!("{}", Printer::new().color(color).render(&tree));
        return Ok(());
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&tree);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
