use anyhow::Context;
use clap::Parser;
use command::{Command, HELP};
use settings::Settings;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use sweeper_core::{
    BattlefieldConfig, CellCount, Coord, Difficulty, Game, GamePhase, RandomMinePlacer,
};

mod command;
mod settings;
mod view;

#[derive(Parser, Debug)]
#[command(version, about = "Minesweeper in the terminal", long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Board preset: easy, medium or hard
    #[arg(short, long)]
    difficulty: Option<Difficulty>,

    /// Custom board rows
    #[arg(long, requires_all = ["columns", "mines"])]
    rows: Option<Coord>,

    /// Custom board columns
    #[arg(long, requires_all = ["rows", "mines"])]
    columns: Option<Coord>,

    /// Custom board mine count
    #[arg(long, requires_all = ["rows", "columns"])]
    mines: Option<CellCount>,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// TOML file with `difficulty`, `seed` and a `[battlefield]` table
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Args {
    fn settings(&self) -> Settings {
        let battlefield = match (self.rows, self.columns, self.mines) {
            (Some(rows), Some(columns), Some(mines)) => {
                Some(BattlefieldConfig::new(rows, columns, mines))
            }
            _ => None,
        };
        Settings {
            difficulty: self.difficulty,
            battlefield,
            seed: self.seed,
        }
    }
}

/// Reads commands from `input` until quit or end of input, drawing the game to `output` after each one.
fn play(
    game: &mut Game,
    config: BattlefieldConfig,
    input: impl BufRead,
    mut output: impl Write,
) -> anyhow::Result<()> {
    // a rejected config is reported through the notice
    let _ = game.start(config);
    draw(game, &mut output)?;

    for line in input.lines() {
        let line = line.context("Could not read command")?;
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                writeln!(output, "{err}")?;
                continue;
            }
        };
        log::debug!("Command: {:?}", command);

        match command {
            Command::Open(coords) => {
                game.dismiss_notice();
                game.open(coords);
            }
            Command::Mark(coords) => {
                game.dismiss_notice();
                game.toggle_mark(coords);
            }
            Command::New => {
                let _ = game.start(config);
            }
            Command::Dump => {
                let json = serde_json::to_string(&game.battlefield().snapshot())?;
                writeln!(output, "{json}")?;
                continue;
            }
            Command::Help => {
                writeln!(output, "{HELP}")?;
                continue;
            }
            Command::Quit => break,
        }
        draw(game, &mut output)?;
        if game.phase() == GamePhase::Over {
            writeln!(output, "Type n for a new game or q to quit.")?;
        }
    }
    Ok(())
}

fn draw(game: &Game, output: &mut impl Write) -> io::Result<()> {
    if !game.battlefield().is_empty() {
        write!(output, "{}", view::render_battlefield(game.battlefield()))?;
    }
    if let Some(notice) = game.notice() {
        writeln!(output, "{}", view::render_notice(notice))?;
    }
    output.flush()
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let file_settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let settings = file_settings.merge(args.settings());
    log::debug!("settings: {:?}", settings);

    let mut game = match settings.seed {
        Some(seed) => Game::with_placer(RandomMinePlacer::from_seed(seed)),
        None => Game::new(),
    };

    let stdin = io::stdin();
    play(
        &mut game,
        settings.battlefield_config(),
        stdin.lock(),
        io::stdout().lock(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use sweeper_core::{FixedMinePlacer, GameResult};

    fn run(mines: &[(Coord, Coord)], config: BattlefieldConfig, script: &str) -> (Game, String) {
        let mut game = Game::with_placer(FixedMinePlacer::new(mines));
        let mut output = Vec::new();
        play(&mut game, config, Cursor::new(script), &mut output).unwrap();
        (game, String::from_utf8(output).unwrap())
    }

    #[test]
    fn plays_to_a_win() {
        let (game, output) = run(
            &[(0, 0)],
            BattlefieldConfig::new(2, 2, 1),
            "o 0 1\no 1 0\no 1 1\n",
        );

        assert_eq!(game.result(), Some(GameResult::Won));
        assert!(output.contains("** Congrats! You win! :) **"));
        assert!(output.contains("  0  *  1"));
    }

    #[test]
    fn plays_to_a_loss_and_quits() {
        let (game, output) = run(
            &[(1, 1)],
            BattlefieldConfig::new(2, 2, 1),
            "m 0 0\no 1 1\nq\no 0 0\n",
        );

        assert_eq!(game.result(), Some(GameResult::Lost));
        assert!(output.contains("!! You lost! !!"));
        assert!(game.battlefield().cell((0, 0)).unwrap().is_marked());
    }

    #[test]
    fn reports_rejected_config() {
        let (game, output) = run(&[], BattlefieldConfig::new(2, 2, 3), "");

        assert_eq!(game.phase(), GamePhase::Idle);
        assert!(output.starts_with("!! Mines count must be at most half"));
    }

    #[test]
    fn reports_bad_commands_and_dumps_json() {
        let (_, output) = run(&[(0, 0)], BattlefieldConfig::new(1, 2, 1), "dig\nj\n");

        assert!(output.contains("Unknown command \"dig\""));
        let json_line = output.lines().last().unwrap();
        let snapshot: serde_json::Value = serde_json::from_str(json_line).unwrap();
        assert_eq!(snapshot[0][1]["danger_rate"], 1);
    }

    #[test]
    fn args_build_custom_board() {
        let args =
            Args::try_parse_from(["sweeper", "--rows", "4", "--columns", "6", "--mines", "3"])
                .unwrap();

        assert_eq!(
            args.settings().battlefield_config(),
            BattlefieldConfig::new(4, 6, 3)
        );
    }

    #[test]
    fn args_require_full_custom_board() {
        assert!(Args::try_parse_from(["sweeper", "--rows", "4"]).is_err());
    }

    #[test]
    fn args_parse_difficulty() {
        let args = Args::try_parse_from(["sweeper", "-d", "medium", "-s", "3"]).unwrap();

        assert_eq!(args.difficulty, Some(Difficulty::Medium));
        assert_eq!(args.seed, Some(3));
    }
}
