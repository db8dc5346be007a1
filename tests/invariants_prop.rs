//! Property tests for engine invariants.
//!
//! - Rotation is all-or-nothing and never moves the anchor.
//! - Collision queries never mutate the grid or the piece.
//! - Clearing rows keeps dimensions, empties exactly the top rows and
//!   preserves the order of surviving rows.
//! - Over a game, score and lines never decrease, level tracks lines and the
//!   gravity interval never grows; the active piece never overlaps the grid.

use proptest::prelude::*;

use blockfall::rules::{can_move, collides, try_rotate};
use blockfall::{Action, Cell, Game, Grid, Mode, Piece, RandomPieceProvider, ShapeKind};

const ROWS: usize = 20;
const COLS: usize = 10;

fn arb_kind() -> impl Strategy<Value = ShapeKind> {
    (0..ShapeKind::ALL.len()).prop_map(|i| ShapeKind::ALL[i])
}

fn arb_row() -> impl Strategy<Value = Vec<Cell>> {
    let random = prop::collection::vec(prop::option::weighted(0.5, arb_kind()), COLS)
        .prop_map(|cells| {
            cells
                .into_iter()
                .map(|c| c.map_or(Cell::Empty, Cell::Filled))
                .collect()
        });
    prop_oneof![
        1 => Just(vec![Cell::Filled(ShapeKind::Z); COLS]),
        3 => random,
    ]
}

fn arb_grid() -> impl Strategy<Value = Grid> {
    prop::collection::vec(arb_row(), ROWS)
        .prop_map(|rows| Grid::from_rows(rows).expect("rows share one width"))
}

fn arb_piece() -> impl Strategy<Value = Piece> {
    (arb_kind(), -2i16..(COLS as i16 + 2), -2i16..(ROWS as i16 + 2), 0usize..4).prop_map(
        |(kind, x, y, turns)| {
            let mut piece = Piece::new_at(kind, x, y);
            for _ in 0..turns {
                piece = piece.rotated();
            }
            piece
        },
    )
}

fn arb_play_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Left),
        Just(Action::Right),
        Just(Action::SoftDown),
        Just(Action::Rotate),
    ]
}

proptest! {
    #[test]
    fn rotation_is_all_or_nothing(grid in arb_grid(), start in arb_piece()) {
        let mut piece = start;
        let rotated = try_rotate(&grid, &mut piece);

        prop_assert_eq!(piece.position, start.position);
        if rotated {
            prop_assert_eq!(piece.offsets, start.rotated().offsets);
            prop_assert!(!collides(&grid, &piece));
        } else {
            prop_assert_eq!(piece, start);
            prop_assert!(collides(&grid, &start.rotated()));
        }
    }

    #[test]
    fn collision_queries_are_pure(
        grid in arb_grid(),
        piece in arb_piece(),
        moves in prop::collection::vec((-2i16..=2, -2i16..=2), 1..16),
    ) {
        let grid_before = grid.clone();
        let first: Vec<bool> = moves.iter().map(|&(dx, dy)| can_move(&grid, &piece, dx, dy)).collect();
        let second: Vec<bool> = moves.iter().map(|&(dx, dy)| can_move(&grid, &piece, dx, dy)).collect();

        prop_assert_eq!(first, second);
        prop_assert_eq!(&grid, &grid_before);
        prop_assert_eq!(collides(&grid, &piece), !can_move(&grid, &piece, 0, 0));
    }

    #[test]
    fn clearing_rows_compacts_downwards(grid in arb_grid()) {
        let survivors: Vec<Vec<Cell>> = grid
            .cells()
            .iter()
            .filter(|row| !row.iter().all(|c| c.is_filled()))
            .cloned()
            .collect();
        let mut cleared_grid = grid.clone();

        let cleared = cleared_grid.clear_full_rows();

        prop_assert_eq!(cleared, ROWS - survivors.len());
        prop_assert_eq!(cleared_grid.rows(), ROWS);
        prop_assert_eq!(cleared_grid.cols(), COLS);
        for y in 0..cleared {
            prop_assert_eq!(cleared_grid.filled_count_in_row(y), 0);
        }
        prop_assert_eq!(&cleared_grid.cells()[cleared..], &survivors[..]);
    }

    #[test]
    fn counters_never_go_backwards(
        seed in any::<u64>(),
        steps in prop::collection::vec((arb_play_action(), 0.0f64..0.6), 1..400),
    ) {
        let mut game = Game::with_provider(Box::new(RandomPieceProvider::seeded(seed)));
        game.tick(0.0, &[Action::Start]);

        let mut previous = (game.score(), game.lines(), game.level(), game.gravity_interval());
        for (action, delta) in steps {
            game.tick(delta, &[action]);

            prop_assert!(game.score() >= previous.0);
            prop_assert!(game.lines() >= previous.1);
            prop_assert!(game.level() >= previous.2);
            prop_assert!(game.gravity_interval() <= previous.3);
            prop_assert_eq!(game.level(), 1 + game.lines() / 10);

            if game.mode != Mode::Playing {
                prop_assert!(game.current_piece.is_none());
                break;
            }
            let piece = game.current_piece.expect("playing without a piece");
            prop_assert!(!collides(&game.grid, &piece));

            previous = (game.score(), game.lines(), game.level(), game.gravity_interval());
        }
    }
}
