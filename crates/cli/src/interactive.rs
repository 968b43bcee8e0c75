//! Interactive chart explorer

use anyhow::{anyhow, Result};
use console::style;
use flaunch_dash_liquidity::LiquidityView;
use rustyline::{error::ReadlineError, DefaultEditor};

use crate::display::Renderer;

/// Explorer commands
#[derive(Debug, PartialEq)]
pub enum ShellCommand {
    ZoomIn,
    ZoomOut,
    Reset,
    PanLeft,
    PanRight,
    Recenter,

    /// Move the pool to a new current tick
    SetTick(i32),

    /// Toggle following the current tick
    Auto(bool),

    /// Show the values of the bin starting at the tick
    Tooltip(i32),

    /// Print the bin table
    Show,

    Help,
    Exit,

    /// Unknown command
    Unknown(String),
}

impl ShellCommand {
    /// Parse a command string
    pub fn parse(input: &str) -> Self {
        let mut parts = input.split_whitespace();
        let Some(command) = parts.next() else {
            return ShellCommand::Unknown(String::new());
        };
        let arg = parts.next();

        match (command.to_lowercase().as_str(), arg) {
            ("+" | "in" | "zoom-in", None) => ShellCommand::ZoomIn,
            ("-" | "out" | "zoom-out", None) => ShellCommand::ZoomOut,
            ("reset", None) => ShellCommand::Reset,
            ("left" | "h", None) => ShellCommand::PanLeft,
            ("right" | "l", None) => ShellCommand::PanRight,
            ("recenter" | "c", None) => ShellCommand::Recenter,
            ("tick", Some(tick)) => tick
                .parse()
                .map(ShellCommand::SetTick)
                .unwrap_or_else(|_| ShellCommand::Unknown(input.to_string())),
            ("auto", Some("on")) => ShellCommand::Auto(true),
            ("auto", Some("off")) => ShellCommand::Auto(false),
            ("tooltip" | "t", Some(tick)) => tick
                .parse()
                .map(ShellCommand::Tooltip)
                .unwrap_or_else(|_| ShellCommand::Unknown(input.to_string())),
            ("show" | "s", None) => ShellCommand::Show,
            ("help" | "?", None) => ShellCommand::Help,
            ("exit" | "quit" | "q", None) => ShellCommand::Exit,
            _ => ShellCommand::Unknown(input.to_string()),
        }
    }
}

/// Line-based pan/zoom session over a [`LiquidityView`]
pub struct ChartExplorer {
    view: LiquidityView,
    renderer: Renderer,
    editor: DefaultEditor,
    running: bool,
}

impl ChartExplorer {
    pub fn new(view: LiquidityView, renderer: Renderer) -> Result<Self> {
        Ok(Self {
            view,
            renderer,
            editor: DefaultEditor::new()?,
            running: true,
        })
    }

    /// Run until `exit` or end of input
    pub fn run(&mut self) -> Result<()> {
        println!("{}", style("Liquidity chart explorer").bold().cyan());
        println!("Type {} for a list of commands", style("help").green());
        self.print_status();

        while self.running {
            match self.editor.readline(&style("chart> ").green().to_string()) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(line.as_str());
                    if let Err(e) = self.handle_command(ShellCommand::parse(&line)) {
                        println!("{}: {}", style("Error").red().bold(), e);
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("Type {} to quit", style("exit").green());
                }
                Err(ReadlineError::Eof) => {
                    self.running = false;
                }
                Err(err) => {
                    println!("{}: {:?}", style("Error").red().bold(), err);
                    self.running = false;
                }
            }
        }

        let (hits, misses) = self.view.cache_stats();
        println!("Bin cache: {} hits, {} misses", hits, misses);

        Ok(())
    }

    fn handle_command(&mut self, command: ShellCommand) -> Result<()> {
        match command {
            ShellCommand::ZoomIn => self.view.zoom_in(),
            ShellCommand::ZoomOut => self.view.zoom_out(),
            ShellCommand::Reset => self.view.reset_zoom(),
            ShellCommand::PanLeft => self.view.pan_left(),
            ShellCommand::PanRight => self.view.pan_right(),
            ShellCommand::Recenter => self.view.recenter(),
            ShellCommand::SetTick(tick) => {
                if self.view.set_current_tick(tick) {
                    println!("{}", style("Recentered on new tick").yellow());
                }
            }
            ShellCommand::Auto(enabled) => self.view.set_auto_recenter(enabled),
            ShellCommand::Tooltip(tick) => {
                let tooltip = self
                    .view
                    .tooltip(tick)
                    .ok_or_else(|| anyhow!("no bin starts at tick {}", tick))?;
                self.renderer.render_tooltip(&tooltip);
                return Ok(());
            }
            ShellCommand::Show => {
                let report = crate::chart_report(&mut self.view, None);
                return self.renderer.render_chart(&report);
            }
            ShellCommand::Help => {
                self.print_help();
                return Ok(());
            }
            ShellCommand::Exit => {
                self.running = false;
                return Ok(());
            }
            ShellCommand::Unknown(input) => {
                return Err(anyhow!("unknown command: {}", input));
            }
        }

        self.print_status();
        Ok(())
    }

    fn print_status(&mut self) {
        let snapshot = self.view.snapshot();
        println!(
            "{}",
            Renderer::status_line(&snapshot, self.view.auto_recenter_enabled())
        );
    }

    fn print_help(&self) {
        println!("{}", style("Commands:").bold());
        println!("  in, +            zoom in");
        println!("  out, -           zoom out");
        println!("  reset            reset zoom around the current tick");
        println!("  left, right      pan");
        println!("  recenter         center on the current tick");
        println!("  tick <n>         move the current tick");
        println!("  auto on|off      follow the current tick");
        println!("  tooltip <tick>   values of one bin");
        println!("  show             print the bin table");
        println!("  exit             quit");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ShellCommand::parse("in"), ShellCommand::ZoomIn);
        assert_eq!(ShellCommand::parse(" - "), ShellCommand::ZoomOut);
        assert_eq!(ShellCommand::parse("LEFT"), ShellCommand::PanLeft);
        assert_eq!(ShellCommand::parse("tick -1200"), ShellCommand::SetTick(-1200));
        assert_eq!(ShellCommand::parse("auto off"), ShellCommand::Auto(false));
        assert_eq!(ShellCommand::parse("t 120"), ShellCommand::Tooltip(120));
        assert_eq!(ShellCommand::parse("q"), ShellCommand::Exit);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(ShellCommand::parse("tick abc"), ShellCommand::Unknown(_)));
        assert!(matches!(ShellCommand::parse("in 2"), ShellCommand::Unknown(_)));
        assert!(matches!(ShellCommand::parse("auto maybe"), ShellCommand::Unknown(_)));
        assert!(matches!(ShellCommand::parse("fly"), ShellCommand::Unknown(_)));
    }
}
