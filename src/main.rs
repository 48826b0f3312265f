//! Tetrixtui — classic falling-block puzzle game in the terminal.

mod app;
mod game;
mod input;
mod sound;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};

/// Options derived from CLI that affect game behaviour.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub width: u16,
    pub height: u16,
    pub seed: Option<u64>,
    pub sound: bool,
    pub no_menu: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = GameConfig {
        width: args.width.max(4),
        height: args.height.max(4),
        seed: args.seed,
        sound: !args.mute,
        no_menu: args.no_menu,
    };
    let mut app = App::new(&config, theme);
    app.run()?;
    Ok(())
}

/// Classic falling-block puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "tetrixtui",
    version,
    about = "Classic falling-block puzzle in the terminal. Stack tetrominoes and clear full lines to score.",
    long_about = "Tetrixtui is a terminal rendition of the classic falling-block puzzle.\n\n\
        Place falling tetrominoes; complete horizontal lines disappear and score points. \
        Every ten lines the level rises and the pieces fall faster.\n\n\
        CONTROLS (normal):\n  Left/Right  Move    Up        Rotate     Down       Soft drop\n  Enter/Space Hard drop   P          Pause      R          Restart    Q / Esc    Quit\n\n\
        CONTROLS (vim):\n  h/l         Move    k          Rotate     j          Soft drop\n\n\
        Hold a movement key to keep the piece moving. Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Playfield width in columns (grid cells).
    #[arg(long, default_value = "10", value_name = "COLS")]
    pub width: u16,

    /// Playfield height in rows (grid cells).
    #[arg(long, default_value = "20", value_name = "ROWS")]
    pub height: u16,

    /// Seed for the piece sequence (reproducible games).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Disable terminal-bell sound effects.
    #[arg(long)]
    pub mute: bool,

    /// Skip main menu and start game immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
